//! Daemon assembly -- configuration, engine connection and run mode.
//!
//! # Startup Order
//!
//! 1. Load `refit.toml` (or defaults) and apply `REFIT_*` overrides
//! 2. Apply CLI flags
//! 3. Validate (a monitor/ignore overlap or an unusable engine host is reported here, once)
//! 4. Initialize logging and, if enabled, the metrics endpoint
//! 5. Connect to the engine and build the `Updater`
//! 6. Run one pass, or run periodically until SIGTERM/SIGINT

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use refit_core::config::RefitConfig;
use refit_updater::{BollardEngine, ContainerEngine, LogNotifier, UpdaterBuilder, UpdaterConfig};

use crate::cli::DaemonCli;
use crate::{logging, metrics_server, runner};

/// Builds the effective configuration from file, environment and flags.
///
/// Without `--config` the defaults are used as the base.
pub async fn load_config(cli: &DaemonCli) -> Result<RefitConfig> {
    let mut config = match &cli.config {
        Some(path) => RefitConfig::from_file(path)
            .await
            .map_err(|e| anyhow::anyhow!("failed to load config: {}", e))?,
        None => RefitConfig::default(),
    };
    config.apply_env_overrides();
    cli.apply_overrides(&mut config);
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;
    UpdaterConfig::from_core(&config)
        .validate()
        .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;
    Ok(config)
}

/// Runs the daemon until its work is done or a shutdown signal arrives.
pub async fn run(cli: DaemonCli) -> Result<()> {
    let config = load_config(&cli).await?;

    if cli.validate {
        println!("configuration is valid");
        return Ok(());
    }

    logging::init_tracing(&config.general)?;
    tracing::info!(host = %config.engine.host, "refit-daemon starting");

    if config.metrics.enabled {
        metrics_server::install_metrics_recorder(&config.metrics)?;
    }

    let engine = Arc::new(
        BollardEngine::connect(&config.engine.host, config.engine.timeout_secs)
            .map_err(|e| anyhow::anyhow!("failed to create engine client: {}", e))?,
    );
    if let Err(e) = engine.ping().await {
        tracing::warn!(error = %e, "engine not reachable yet, passes will fail until it is");
    }

    let mut updater = UpdaterBuilder::new()
        .config(UpdaterConfig::from_core(&config))
        .engine(engine)
        .notifier(LogNotifier)
        .build()
        .map_err(|e| anyhow::anyhow!("failed to build updater: {}", e))?;

    if config.update.run_once {
        let result = runner::run_once(&mut updater).await?;
        tracing::info!(
            monitored = result.monitored,
            updated = result.updated,
            "single pass complete"
        );
        return Ok(());
    }

    let period = Duration::from_secs(config.update.interval_secs);
    let shutdown = async {
        match runner::wait_for_shutdown_signal().await {
            Ok(signal) => tracing::info!(signal, "shutdown signal received"),
            Err(e) => {
                tracing::error!(error = %e, "signal handling unavailable, falling back to ctrl-c");
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!(error = %e, "failed to wait for ctrl-c");
                }
            }
        }
    };
    let passes = runner::run_periodic(&mut updater, period, shutdown).await;

    tracing::info!(passes, "refit-daemon shut down");
    Ok(())
}
