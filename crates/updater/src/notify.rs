//! Pass notification.
//!
//! The updater hands one [`PassReport`] to its [`Notifier`] at the end of
//! every pass that computed a scope. A failed notification is logged by the
//! caller and never undoes replacements or counts.

use std::future::Future;

use tokio::sync::mpsc;
use tracing::info;

use crate::error::UpdaterError;
use crate::results::PassReport;

/// Receives the aggregated report at the end of a pass.
pub trait Notifier: Send + Sync + 'static {
    /// Delivers the report.
    fn notify(&self, report: &PassReport) -> impl Future<Output = Result<(), UpdaterError>> + Send;
}

/// Writes the report to the process log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn notify(&self, report: &PassReport) -> Result<(), UpdaterError> {
        info!(
            host = %report.host,
            monitored = report.monitored,
            updated = report.updated,
            replacements = report.replacements.len(),
            "update pass report"
        );
        for record in &report.replacements {
            info!(
                host = %report.host,
                container_name = record.old_container.bare_name(),
                container_id = %record.old_container.id,
                old_image = %record.old_image,
                new_image = %record.new_image,
                "container updated"
            );
        }
        Ok(())
    }
}

/// Forwards reports over a tokio channel.
///
/// Fails when the receiving side has been dropped.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::Sender<PassReport>,
}

impl ChannelNotifier {
    pub fn new(tx: mpsc::Sender<PassReport>) -> Self {
        Self { tx }
    }

    /// Creates a notifier together with its receiving end.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<PassReport>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }
}

impl Notifier for ChannelNotifier {
    async fn notify(&self, report: &PassReport) -> Result<(), UpdaterError> {
        self.tx
            .send(report.clone())
            .await
            .map_err(|e| UpdaterError::Notification(format!("report receiver closed: {e}")))
    }
}
