//! Container engine abstraction for testability.
//!
//! The [`ContainerEngine`] trait abstracts the bollard Docker API, allowing
//! production code to use [`BollardEngine`] while tests use `MockEngine`.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │     Updater      │
//! └────────┬─────────┘
//!          │
//!          ▼
//!  ┌─────────────────┐
//!  │ContainerEngine  │ (trait)
//!  └─────────────────┘
//!        │     │
//!        ▼     ▼
//!   ┌───────┐ ┌──────┐
//!   │Bollard│ │ Mock │
//!   └───┬───┘ └──────┘
//!       │
//!       ▼
//!   Docker Daemon
//! ```
//!
//! # Examples
//!
//! ```ignore
//! use refit_updater::BollardEngine;
//!
//! let engine = BollardEngine::connect("/var/run/docker.sock", 120)?;
//! let running = engine.list_running().await?;
//! # Ok::<(), refit_updater::UpdaterError>(())
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use bollard::auth::DockerCredentials;
use bollard::container::{
    ListContainersOptions, RemoveContainerOptions, StartContainerOptions, StopContainerOptions,
};
use bollard::errors::Error as DockerError;
use bollard::image::{CreateImageOptions, RemoveImageOptions};
use bollard::models::{ContainerInspectResponse, CreateImageInfo};
use futures::StreamExt;
use tracing::{debug, warn};

use crate::error::{EngineStep, UpdaterError};
use crate::image::ImageDescriptor;
use crate::rebuild::ContainerSpec;
use crate::types::{ContainerSnapshot, PullCredentials};

/// Grace period before the engine kills a container being stopped.
const STOP_TIMEOUT_SECS: i64 = 10;

/// Trait abstracting the container-engine calls an update pass needs.
///
/// The trait is `Send + Sync + 'static`, allowing the engine to be shared
/// through an `Arc` between the updater and its lifecycle manager.
///
/// # Implementations
///
/// - [`BollardEngine`]: Production implementation using the `bollard` library
/// - `MockEngine`: Test implementation that records every call (tests only)
pub trait ContainerEngine: Send + Sync + 'static {
    /// Lists running containers with their inspected configuration.
    ///
    /// Containers are returned in the order the engine listed them.
    fn list_running(
        &self,
    ) -> impl Future<Output = Result<Vec<ContainerSnapshot>, UpdaterError>> + Send;

    /// Inspects a local image by ID or reference.
    ///
    /// Returns `Ok(None)` if the engine does not know the image.
    fn inspect_image(
        &self,
        reference: &str,
    ) -> impl Future<Output = Result<Option<ImageDescriptor>, UpdaterError>> + Send;

    /// Pulls `reference` from its registry and returns the resulting local image.
    ///
    /// Returns `Ok(None)` if the pull completed but the image cannot be found
    /// locally afterwards.
    fn pull_image(
        &self,
        reference: &str,
        credentials: Option<&PullCredentials>,
    ) -> impl Future<Output = Result<Option<ImageDescriptor>, UpdaterError>> + Send;

    /// Removes a local image by ID. Fails if a container still uses it.
    fn remove_image(&self, id: &str) -> impl Future<Output = Result<(), UpdaterError>> + Send;

    /// Creates a container and returns its ID.
    fn create_container(
        &self,
        spec: &ContainerSpec,
    ) -> impl Future<Output = Result<String, UpdaterError>> + Send;

    /// Starts a created container.
    fn start_container(&self, id: &str) -> impl Future<Output = Result<(), UpdaterError>> + Send;

    /// Stops a container with a 10-second grace period.
    fn stop_container(&self, id: &str) -> impl Future<Output = Result<(), UpdaterError>> + Send;

    /// Removes a stopped container.
    fn remove_container(&self, id: &str) -> impl Future<Output = Result<(), UpdaterError>> + Send;

    /// Checks engine connectivity.
    fn ping(&self) -> impl Future<Output = Result<(), UpdaterError>> + Send;
}

/// How to reach the engine, derived from the configured host string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEndpoint {
    /// Unix socket path.
    Socket(String),
    /// Plain HTTP over TCP (`tcp://` or `http://`).
    Http(String),
}

impl EngineEndpoint {
    /// Parses a host string.
    ///
    /// `tcp://` and `http://` select HTTP, `unix://` or a bare path selects a
    /// socket. Any other `<scheme>://`, TLS included, is rejected.
    pub fn parse(host: &str) -> Result<Self, UpdaterError> {
        let host = host.trim();
        let invalid = |reason: String| UpdaterError::Config {
            field: "engine.host".to_owned(),
            reason,
        };

        let Some((scheme, rest)) = host.split_once("://") else {
            if host.is_empty() {
                return Err(invalid("socket path must not be empty".to_owned()));
            }
            return Ok(Self::Socket(host.to_owned()));
        };

        match scheme.to_ascii_lowercase().as_str() {
            "unix" if rest.is_empty() => Err(invalid("socket path must not be empty".to_owned())),
            "unix" => Ok(Self::Socket(rest.to_owned())),
            "tcp" | "http" if rest.is_empty() => {
                Err(invalid(format!("missing address in '{host}'")))
            }
            "tcp" | "http" => Ok(Self::Http(format!("tcp://{rest}"))),
            "https" | "tcps" => Err(invalid(format!("TLS endpoints are not supported: '{host}'"))),
            other => Err(invalid(format!("unsupported scheme '{other}' in '{host}'"))),
        }
    }
}

/// Splits an image reference into the repository and tag the pull API expects.
///
/// References without a tag pull `latest`. Digest references are passed
/// through whole with an empty tag.
pub(crate) fn split_reference(reference: &str) -> (&str, &str) {
    if reference.contains('@') {
        return (reference, "");
    }
    let name_start = reference.rfind('/').map_or(0, |i| i + 1);
    match reference[name_start..].rfind(':') {
        Some(i) => (
            &reference[..name_start + i],
            &reference[name_start + i + 1..],
        ),
        None => (reference, "latest"),
    }
}

fn is_not_found(err: &DockerError) -> bool {
    matches!(
        err,
        DockerError::DockerResponseServerError {
            status_code: 404,
            ..
        }
    )
}

/// Turns one inspection made while listing into a snapshot.
///
/// A container that vanished or cannot be inspected is skipped so the rest of
/// the host is still listed.
fn snapshot_or_skip(
    id: &str,
    inspected: Result<ContainerInspectResponse, DockerError>,
) -> Option<ContainerSnapshot> {
    match inspected {
        Ok(details) => match ContainerSnapshot::from_inspect(details) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!(container_id = %id, error = %e, "unusable inspection result, skipping");
                None
            }
        },
        Err(e) if is_not_found(&e) => {
            warn!(container_id = %id, "container vanished before inspection, skipping");
            None
        }
        Err(e) => {
            warn!(container_id = %id, error = %e, "failed to inspect container, skipping");
            None
        }
    }
}

/// Error reported inside a pull progress message, if any.
///
/// Some engines set only the top-level `error` without `errorDetail`.
fn pull_failure(info: &CreateImageInfo) -> Option<String> {
    info.error_detail
        .as_ref()
        .and_then(|d| d.message.clone())
        .or_else(|| info.error.clone())
}

/// Production engine implementation using `bollard`.
///
/// Internally uses `Arc<bollard::Docker>` for safe sharing across async tasks.
pub struct BollardEngine {
    docker: Arc<bollard::Docker>,
}

impl BollardEngine {
    /// Connects to the engine at `host` (socket path or `tcp://` URI).
    ///
    /// # Errors
    ///
    /// Returns `UpdaterError::Config` for an unusable host string and
    /// `UpdaterError::DockerConnection` if the client cannot be created.
    pub fn connect(host: &str, timeout_secs: u64) -> Result<Self, UpdaterError> {
        let endpoint = EngineEndpoint::parse(host)?;
        let docker = match &endpoint {
            EngineEndpoint::Socket(path) => {
                bollard::Docker::connect_with_socket(path, timeout_secs, bollard::API_DEFAULT_VERSION)
            }
            EngineEndpoint::Http(addr) => {
                bollard::Docker::connect_with_http(addr, timeout_secs, bollard::API_DEFAULT_VERSION)
            }
        }
        .map_err(|e| {
            UpdaterError::DockerConnection(format!("failed to connect to docker at {host}: {e}"))
        })?;

        Ok(Self {
            docker: Arc::new(docker),
        })
    }
}

impl ContainerEngine for BollardEngine {
    async fn list_running(&self) -> Result<Vec<ContainerSnapshot>, UpdaterError> {
        let mut filters = HashMap::new();
        filters.insert("status".to_owned(), vec!["running".to_owned()]);
        let options = ListContainersOptions::<String> {
            all: false,
            filters,
            ..Default::default()
        };

        let summaries = self
            .docker
            .list_containers(Some(options))
            .await
            .map_err(|e| UpdaterError::engine(EngineStep::List, "running containers", e))?;

        let mut snapshots = Vec::with_capacity(summaries.len());
        for summary in summaries {
            let Some(id) = summary.id else {
                continue;
            };
            let inspected = self.docker.inspect_container(&id, None).await;
            snapshots.extend(snapshot_or_skip(&id, inspected));
        }

        debug!(count = snapshots.len(), "listed running containers");
        Ok(snapshots)
    }

    async fn inspect_image(&self, reference: &str) -> Result<Option<ImageDescriptor>, UpdaterError> {
        match self.docker.inspect_image(reference).await {
            Ok(inspect) => Ok(ImageDescriptor::from_inspect(inspect)),
            Err(e) if is_not_found(&e) => Ok(None),
            Err(e) => Err(UpdaterError::engine(EngineStep::InspectImage, reference, e)),
        }
    }

    async fn pull_image(
        &self,
        reference: &str,
        credentials: Option<&PullCredentials>,
    ) -> Result<Option<ImageDescriptor>, UpdaterError> {
        let (from_image, tag) = split_reference(reference);
        let options = CreateImageOptions {
            from_image: from_image.to_owned(),
            tag: tag.to_owned(),
            ..Default::default()
        };
        let credentials = credentials.map(|c| DockerCredentials {
            username: Some(c.username.clone()),
            password: Some(c.password.clone()),
            ..Default::default()
        });

        let mut stream = self.docker.create_image(Some(options), None, credentials);
        while let Some(progress) = stream.next().await {
            let info = progress.map_err(|e| UpdaterError::engine(EngineStep::Pull, reference, e))?;
            if let Some(reason) = pull_failure(&info) {
                return Err(UpdaterError::engine(EngineStep::Pull, reference, reason));
            }
            if let Some(status) = info.status {
                debug!(image = reference, status = %status, "pull progress");
            }
        }

        self.inspect_image(reference).await
    }

    async fn remove_image(&self, id: &str) -> Result<(), UpdaterError> {
        let options = RemoveImageOptions {
            force: false,
            noprune: false,
        };
        self.docker
            .remove_image(id, Some(options), None)
            .await
            .map(|_| ())
            .map_err(|e| UpdaterError::engine(EngineStep::RemoveImage, id, e))
    }

    async fn create_container(&self, spec: &ContainerSpec) -> Result<String, UpdaterError> {
        let (options, config) = spec.to_create_args();
        let response = self
            .docker
            .create_container(Some(options), config)
            .await
            .map_err(|e| UpdaterError::engine(EngineStep::Create, &spec.name, e))?;

        for warning in &response.warnings {
            warn!(container_name = %spec.name, warning = %warning, "engine warning on create");
        }
        Ok(response.id)
    }

    async fn start_container(&self, id: &str) -> Result<(), UpdaterError> {
        self.docker
            .start_container(id, None::<StartContainerOptions<String>>)
            .await
            .map_err(|e| UpdaterError::engine(EngineStep::Start, id, e))
    }

    async fn stop_container(&self, id: &str) -> Result<(), UpdaterError> {
        self.docker
            .stop_container(id, Some(StopContainerOptions { t: STOP_TIMEOUT_SECS }))
            .await
            .map_err(|e| UpdaterError::engine(EngineStep::Stop, id, e))
    }

    async fn remove_container(&self, id: &str) -> Result<(), UpdaterError> {
        self.docker
            .remove_container(id, Some(RemoveContainerOptions::default()))
            .await
            .map_err(|e| UpdaterError::engine(EngineStep::Remove, id, e))
    }

    async fn ping(&self) -> Result<(), UpdaterError> {
        self.docker
            .ping()
            .await
            .map_err(|e| UpdaterError::DockerConnection(format!("ping failed: {e}")))?;
        Ok(())
    }
}

/// 테스트용 Mock 엔진
///
/// 로컬/원격 이미지를 설정할 수 있고, 모든 호출을 `(단계, 대상)` 형태로 기록합니다.
#[cfg(test)]
#[derive(Default)]
pub struct MockEngine {
    containers: tokio::sync::Mutex<Vec<ContainerSnapshot>>,
    /// inspect_image 응답 (ID 또는 참조 -> 이미지)
    local_images: HashMap<String, ImageDescriptor>,
    /// pull_image 응답 (참조 -> 이미지)
    remote_images: HashMap<String, ImageDescriptor>,
    failing_steps: std::collections::HashSet<EngineStep>,
    calls: tokio::sync::Mutex<Vec<(EngineStep, String)>>,
}

#[cfg(test)]
impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_containers(mut self, containers: Vec<ContainerSnapshot>) -> Self {
        self.containers = tokio::sync::Mutex::new(containers);
        self
    }

    /// 로컬 이미지를 등록합니다 (ID와 모든 태그로 조회 가능).
    pub fn with_local_image(mut self, image: ImageDescriptor) -> Self {
        for tag in &image.repo_tags {
            self.local_images.insert(tag.clone(), image.clone());
        }
        self.local_images.insert(image.id.clone(), image);
        self
    }

    /// `reference` pull 시 반환할 이미지를 등록합니다.
    pub fn with_remote_image(mut self, reference: &str, image: ImageDescriptor) -> Self {
        self.remote_images.insert(reference.to_owned(), image);
        self
    }

    /// 해당 단계의 호출이 실패하도록 설정합니다.
    pub fn failing(mut self, step: EngineStep) -> Self {
        self.failing_steps.insert(step);
        self
    }

    /// 기록된 호출 목록을 반환합니다.
    pub async fn calls(&self) -> Vec<(EngineStep, String)> {
        self.calls.lock().await.clone()
    }

    /// 특정 단계의 호출 대상만 반환합니다.
    pub async fn calls_for(&self, step: EngineStep) -> Vec<String> {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|(s, _)| *s == step)
            .map(|(_, target)| target.clone())
            .collect()
    }

    /// 현재 컨테이너 목록을 반환합니다.
    pub async fn containers(&self) -> Vec<ContainerSnapshot> {
        self.containers.lock().await.clone()
    }

    async fn record(&self, step: EngineStep, target: &str) -> Result<(), UpdaterError> {
        self.calls.lock().await.push((step, target.to_owned()));
        if self.failing_steps.contains(&step) {
            return Err(UpdaterError::engine(step, target, "mock failure"));
        }
        Ok(())
    }
}

#[cfg(test)]
impl ContainerEngine for MockEngine {
    async fn list_running(&self) -> Result<Vec<ContainerSnapshot>, UpdaterError> {
        self.record(EngineStep::List, "running containers").await?;
        Ok(self.containers.lock().await.clone())
    }

    async fn inspect_image(&self, reference: &str) -> Result<Option<ImageDescriptor>, UpdaterError> {
        self.record(EngineStep::InspectImage, reference).await?;
        Ok(self.local_images.get(reference).cloned())
    }

    async fn pull_image(
        &self,
        reference: &str,
        _credentials: Option<&PullCredentials>,
    ) -> Result<Option<ImageDescriptor>, UpdaterError> {
        self.record(EngineStep::Pull, reference).await?;
        Ok(self.remote_images.get(reference).cloned())
    }

    async fn remove_image(&self, id: &str) -> Result<(), UpdaterError> {
        self.record(EngineStep::RemoveImage, id).await
    }

    async fn create_container(&self, spec: &ContainerSpec) -> Result<String, UpdaterError> {
        self.record(EngineStep::Create, &spec.name).await?;
        let id = format!("new-{}", spec.name);
        self.containers.lock().await.push(ContainerSnapshot {
            id: id.clone(),
            name: format!("/{}", spec.name),
            image: spec.image.clone(),
            image_id: None,
            cmd: spec.cmd.clone(),
            entrypoint: spec.entrypoint.clone(),
            env: spec.env.clone(),
            labels: spec.labels.clone(),
            host_config: spec.host_config.clone(),
        });
        Ok(id)
    }

    async fn start_container(&self, id: &str) -> Result<(), UpdaterError> {
        self.record(EngineStep::Start, id).await
    }

    async fn stop_container(&self, id: &str) -> Result<(), UpdaterError> {
        self.record(EngineStep::Stop, id).await
    }

    async fn remove_container(&self, id: &str) -> Result<(), UpdaterError> {
        self.record(EngineStep::Remove, id).await?;
        self.containers.lock().await.retain(|c| c.id != id);
        Ok(())
    }

    async fn ping(&self) -> Result<(), UpdaterError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_container() -> ContainerSnapshot {
        ContainerSnapshot {
            id: "abc123def456".to_owned(),
            name: "/web".to_owned(),
            image: "nginx:latest".to_owned(),
            image_id: Some("sha256:aaa".to_owned()),
            cmd: None,
            entrypoint: None,
            env: None,
            labels: None,
            host_config: None,
        }
    }

    #[test]
    fn endpoint_parses_socket_path() {
        assert_eq!(
            EngineEndpoint::parse("/var/run/docker.sock").unwrap(),
            EngineEndpoint::Socket("/var/run/docker.sock".to_owned())
        );
        assert_eq!(
            EngineEndpoint::parse("unix:///run/docker.sock").unwrap(),
            EngineEndpoint::Socket("/run/docker.sock".to_owned())
        );
    }

    #[test]
    fn endpoint_parses_tcp_and_http() {
        assert_eq!(
            EngineEndpoint::parse("tcp://10.0.0.5:2375").unwrap(),
            EngineEndpoint::Http("tcp://10.0.0.5:2375".to_owned())
        );
        assert_eq!(
            EngineEndpoint::parse("HTTP://docker.internal:2375").unwrap(),
            EngineEndpoint::Http("tcp://docker.internal:2375".to_owned())
        );
    }

    #[test]
    fn endpoint_rejects_tls_and_empty() {
        assert!(EngineEndpoint::parse("https://docker.internal:2376").is_err());
        assert!(EngineEndpoint::parse("tcp://").is_err());
        assert!(EngineEndpoint::parse("unix://").is_err());
        assert!(EngineEndpoint::parse("").is_err());
    }

    #[test]
    fn endpoint_rejects_unknown_schemes() {
        for host in ["tcps://docker.internal:2376", "ssh://root@host", "npipe:////./pipe/docker"] {
            match EngineEndpoint::parse(host) {
                Err(UpdaterError::Config { field, .. }) => assert_eq!(field, "engine.host"),
                other => panic!("expected Config error for {host}, got {other:?}"),
            }
        }
    }

    fn server_error(status_code: u16) -> DockerError {
        DockerError::DockerResponseServerError {
            status_code,
            message: "engine said no".to_owned(),
        }
    }

    #[test]
    fn inspected_container_becomes_snapshot() {
        let details = ContainerInspectResponse {
            id: Some("abc123def456".to_owned()),
            name: Some("/web".to_owned()),
            config: Some(bollard::models::ContainerConfig {
                image: Some("nginx:latest".to_owned()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let snapshot = snapshot_or_skip("abc123def456", Ok(details)).unwrap();
        assert_eq!(snapshot.bare_name(), "web");
    }

    #[test]
    fn failed_inspection_skips_only_that_container() {
        assert!(snapshot_or_skip("gone", Err(server_error(404))).is_none());
        assert!(snapshot_or_skip("broken", Err(server_error(500))).is_none());
        // no image reference in the response
        assert!(snapshot_or_skip("odd", Ok(ContainerInspectResponse::default())).is_none());
    }

    #[test]
    fn pull_failure_reads_error_detail() {
        let info = CreateImageInfo {
            error_detail: Some(bollard::models::ErrorDetail {
                code: None,
                message: Some("manifest unknown".to_owned()),
            }),
            error: Some("manifest unknown (top level)".to_owned()),
            ..Default::default()
        };
        assert_eq!(pull_failure(&info).as_deref(), Some("manifest unknown"));
    }

    #[test]
    fn pull_failure_falls_back_to_top_level_error() {
        let info = CreateImageInfo {
            error: Some("unauthorized: authentication required".to_owned()),
            ..Default::default()
        };
        assert_eq!(
            pull_failure(&info).as_deref(),
            Some("unauthorized: authentication required")
        );
    }

    #[test]
    fn pull_progress_is_not_failure() {
        let info = CreateImageInfo {
            status: Some("Downloading".to_owned()),
            ..Default::default()
        };
        assert!(pull_failure(&info).is_none());
    }

    #[test]
    fn split_reference_with_tag() {
        assert_eq!(split_reference("nginx:1.25"), ("nginx", "1.25"));
        assert_eq!(
            split_reference("ghcr.io/acme/api:v2"),
            ("ghcr.io/acme/api", "v2")
        );
    }

    #[test]
    fn split_reference_defaults_to_latest() {
        assert_eq!(split_reference("redis"), ("redis", "latest"));
        // registry port is not a tag
        assert_eq!(
            split_reference("localhost:5000/app"),
            ("localhost:5000/app", "latest")
        );
    }

    #[test]
    fn split_reference_passes_digests_through() {
        let reference = "nginx@sha256:0123abcd";
        assert_eq!(split_reference(reference), (reference, ""));
    }

    #[tokio::test]
    async fn mock_engine_lists_and_records() {
        let engine = MockEngine::new().with_containers(vec![sample_container()]);
        let running = engine.list_running().await.unwrap();
        assert_eq!(running.len(), 1);
        assert_eq!(engine.calls_for(EngineStep::List).await.len(), 1);
    }

    #[tokio::test]
    async fn mock_engine_inspects_local_images_by_id_and_tag() {
        let image = ImageDescriptor::new("sha256:aaa", vec!["nginx:latest".to_owned()]);
        let engine = MockEngine::new().with_local_image(image.clone());
        assert_eq!(engine.inspect_image("sha256:aaa").await.unwrap(), Some(image.clone()));
        assert_eq!(engine.inspect_image("nginx:latest").await.unwrap(), Some(image));
        assert!(engine.inspect_image("redis:7").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn mock_engine_failing_step() {
        let engine = MockEngine::new()
            .with_containers(vec![sample_container()])
            .failing(EngineStep::Stop);
        let err = engine.stop_container("abc123def456").await.unwrap_err();
        assert_eq!(err.step(), Some(EngineStep::Stop));
        // failed calls are still recorded
        assert_eq!(engine.calls_for(EngineStep::Stop).await, vec!["abc123def456"]);
    }

    #[tokio::test]
    async fn mock_engine_remove_and_create_update_container_list() {
        let engine = MockEngine::new().with_containers(vec![sample_container()]);
        engine.remove_container("abc123def456").await.unwrap();
        assert!(engine.containers().await.is_empty());

        let spec = crate::rebuild::rebuild_spec(&sample_container(), "nginx:1.25");
        let id = engine.create_container(&spec).await.unwrap();
        assert_eq!(id, "new-web");
        let containers = engine.containers().await;
        assert_eq!(containers.len(), 1);
        assert_eq!(containers[0].image, "nginx:1.25");
    }

    #[test]
    fn container_engine_impls_are_send_sync() {
        fn assert_send_sync<T: Send + Sync + 'static>() {}
        assert_send_sync::<MockEngine>();
        assert_send_sync::<BollardEngine>();
    }
}
