use anyhow::Result;
use clap::Parser;

use refit_daemon::app;
use refit_daemon::cli::DaemonCli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = DaemonCli::parse();
    app::run(cli).await
}
