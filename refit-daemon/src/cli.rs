//! CLI argument definitions for refit-daemon.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.
//! Every flag is optional; a flag that is given overrides the config file
//! and `REFIT_*` environment variables.

use std::path::PathBuf;

use clap::Parser;

use refit_core::config::{RefitConfig, parse_name_list};

/// Refit container image auto-update daemon.
///
/// Periodically pulls the image of every monitored running container and
/// replaces containers whose image changed, keeping their configuration.
#[derive(Parser, Debug)]
#[command(name = "refit-daemon")]
#[command(version, about, long_about = None)]
pub struct DaemonCli {
    /// Path to refit.toml configuration file.
    ///
    /// Defaults apply when omitted.
    #[arg(short, long, env = "REFIT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Run a single update pass and exit.
    #[arg(long)]
    pub run_once: bool,

    /// Remove the previous image after a container is updated.
    #[arg(long)]
    pub cleanup: bool,

    /// Engine address (socket path, unix://, tcp:// or http:// URI).
    #[arg(long)]
    pub host: Option<String>,

    /// Seconds between update passes.
    #[arg(long)]
    pub interval: Option<u64>,

    /// Comma-separated container names to monitor (default: all).
    #[arg(long)]
    pub monitor: Option<String>,

    /// Comma-separated container names to ignore.
    #[arg(long)]
    pub ignore: Option<String>,

    /// Registry username for authenticated pulls.
    #[arg(long, env = "REPO_USER")]
    pub registry_user: Option<String>,

    /// Registry password for authenticated pulls.
    #[arg(long, env = "REPO_PASS", hide_env_values = true)]
    pub registry_pass: Option<String>,

    /// Override log level (trace, debug, info, warn, error).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_format: Option<String>,

    /// Validate configuration and exit without contacting the engine.
    #[arg(long)]
    pub validate: bool,
}

impl DaemonCli {
    /// Applies the flags that were given on top of `config`.
    ///
    /// Boolean flags can only switch a setting on.
    pub fn apply_overrides(&self, config: &mut RefitConfig) {
        if self.run_once {
            config.update.run_once = true;
        }
        if self.cleanup {
            config.update.cleanup = true;
        }
        if let Some(host) = &self.host {
            config.engine.host.clone_from(host);
        }
        if let Some(interval) = self.interval {
            config.update.interval_secs = interval;
        }
        if let Some(monitor) = &self.monitor {
            config.update.monitor = parse_name_list(monitor);
        }
        if let Some(ignore) = &self.ignore {
            config.update.ignore = parse_name_list(ignore);
        }
        if let Some(user) = &self.registry_user {
            config.registry.username = Some(user.clone());
        }
        if let Some(pass) = &self.registry_pass {
            config.registry.password = Some(pass.clone());
        }
        if let Some(level) = &self.log_level {
            config.general.log_level.clone_from(level);
        }
        if let Some(format) = &self.log_format {
            config.general.log_format.clone_from(format);
        }
    }
}
