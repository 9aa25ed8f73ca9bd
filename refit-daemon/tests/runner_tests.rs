//! Pass scheduling tests.
//!
//! Uses paused tokio time so intervals elapse instantly.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use refit_daemon::runner;
use refit_updater::{
    ChannelNotifier, ContainerEngine, ContainerSnapshot, ContainerSpec, EngineStep,
    ImageDescriptor, PullCredentials, Updater, UpdaterBuilder, UpdaterConfig, UpdaterError,
};

/// Engine with no running containers that counts list calls.
#[derive(Default)]
struct IdleEngine {
    lists: AtomicU32,
    fail_list: AtomicBool,
}

impl ContainerEngine for IdleEngine {
    async fn list_running(&self) -> Result<Vec<ContainerSnapshot>, UpdaterError> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(UpdaterError::engine(EngineStep::List, "running", "engine down"));
        }
        Ok(Vec::new())
    }

    async fn inspect_image(&self, _reference: &str) -> Result<Option<ImageDescriptor>, UpdaterError> {
        Ok(None)
    }

    async fn pull_image(
        &self,
        _reference: &str,
        _credentials: Option<&PullCredentials>,
    ) -> Result<Option<ImageDescriptor>, UpdaterError> {
        Ok(None)
    }

    async fn remove_image(&self, _id: &str) -> Result<(), UpdaterError> {
        Ok(())
    }

    async fn create_container(&self, spec: &ContainerSpec) -> Result<String, UpdaterError> {
        Ok(spec.name.clone())
    }

    async fn start_container(&self, _id: &str) -> Result<(), UpdaterError> {
        Ok(())
    }

    async fn stop_container(&self, _id: &str) -> Result<(), UpdaterError> {
        Ok(())
    }

    async fn remove_container(&self, _id: &str) -> Result<(), UpdaterError> {
        Ok(())
    }

    async fn ping(&self) -> Result<(), UpdaterError> {
        Ok(())
    }
}

fn updater(
    engine: &Arc<IdleEngine>,
) -> (
    Updater<IdleEngine, ChannelNotifier>,
    tokio::sync::mpsc::Receiver<refit_updater::PassReport>,
) {
    let (notifier, rx) = ChannelNotifier::channel(64);
    let updater = UpdaterBuilder::new()
        .config(UpdaterConfig::default())
        .engine(Arc::clone(engine))
        .notifier(notifier)
        .build()
        .expect("updater should build");
    (updater, rx)
}

#[tokio::test(start_paused = true)]
async fn test_periodic_runs_immediately_then_every_interval() {
    let engine = Arc::new(IdleEngine::default());
    let (mut updater, mut rx) = updater(&engine);

    // ticks at 0s, 60s, 120s; shutdown at 150s
    let shutdown = tokio::time::sleep(Duration::from_secs(150));
    let passes = runner::run_periodic(&mut updater, Duration::from_secs(60), shutdown).await;

    assert_eq!(passes, 3);
    assert_eq!(engine.lists.load(Ordering::SeqCst), 3);
    assert_eq!(updater.passes_run(), 3);

    let mut reports = 0;
    while rx.try_recv().is_ok() {
        reports += 1;
    }
    assert_eq!(reports, 3);
}

#[tokio::test(start_paused = true)]
async fn test_periodic_survives_failing_passes() {
    let engine = Arc::new(IdleEngine::default());
    engine.fail_list.store(true, Ordering::SeqCst);
    let (mut updater, mut rx) = updater(&engine);

    let shutdown = tokio::time::sleep(Duration::from_secs(25));
    let passes = runner::run_periodic(&mut updater, Duration::from_secs(10), shutdown).await;

    assert_eq!(passes, 3);
    // aborted passes do not notify
    assert!(rx.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_before_first_tick_runs_nothing() {
    let engine = Arc::new(IdleEngine::default());
    let (mut updater, _rx) = updater(&engine);

    let passes = runner::run_periodic(&mut updater, Duration::from_secs(60), async {}).await;

    assert_eq!(passes, 0);
    assert_eq!(engine.lists.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_run_once_returns_pass_result() {
    let engine = Arc::new(IdleEngine::default());
    let (mut updater, mut rx) = updater(&engine);

    let result = runner::run_once(&mut updater).await.expect("pass should succeed");
    assert_eq!(result.monitored, 0);
    assert_eq!(result.updated, 0);
    assert!(rx.recv().await.is_some());
}

#[tokio::test]
async fn test_run_once_surfaces_pass_error() {
    let engine = Arc::new(IdleEngine::default());
    engine.fail_list.store(true, Ordering::SeqCst);
    let (mut updater, _rx) = updater(&engine);

    let err = runner::run_once(&mut updater).await.expect_err("pass should fail");
    assert!(err.to_string().contains("update pass failed"));
}
