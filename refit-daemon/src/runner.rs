//! Pass scheduling -- single run or periodic loop until shutdown.
//!
//! A pass is always awaited to completion before the next tick is taken,
//! so passes never overlap. Missed ticks are delayed, not burst.

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use refit_updater::{ContainerEngine, Notifier, PassResult, Updater};

/// Runs exactly one pass and returns its result.
pub async fn run_once<E, N>(updater: &mut Updater<E, N>) -> Result<PassResult>
where
    E: ContainerEngine,
    N: Notifier,
{
    updater
        .run_pass()
        .await
        .map_err(|e| anyhow::anyhow!("update pass failed: {}", e))
}

/// Runs a pass immediately and then every `period` until `shutdown` resolves.
///
/// Pass errors are logged and never stop the loop. Shutdown is observed
/// between passes; a pass in progress is not cancelled. Returns the number
/// of passes started.
pub async fn run_periodic<E, N, F>(updater: &mut Updater<E, N>, period: Duration, shutdown: F) -> u64
where
    E: ContainerEngine,
    N: Notifier,
    F: Future<Output = ()>,
{
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    info!(
        host = updater.host(),
        interval_secs = period.as_secs(),
        "periodic updates started"
    );

    let mut passes = 0u64;
    loop {
        tokio::select! {
            biased;
            () = &mut shutdown => {
                info!(passes, "shutdown requested, stopping periodic updates");
                break;
            }
            _ = ticker.tick() => {
                passes += 1;
                if let Err(e) = updater.run_pass().await {
                    error!(error = %e, "update pass failed, retrying at next interval");
                }
            }
        }
    }
    passes
}

/// Waits for SIGTERM or SIGINT and returns the signal name.
pub async fn wait_for_shutdown_signal() -> Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("failed to install SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("failed to install SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}
