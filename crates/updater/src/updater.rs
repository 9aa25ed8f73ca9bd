//! 업데이트 오케스트레이터 -- 한 번의 업데이트 패스 전체 흐름 관리
//!
//! [`Updater`]는 패스마다 실행 중인 컨테이너를 나열하고, 필터를 적용한 뒤
//! 컨테이너를 하나씩 검사하여 새 이미지가 있으면 교체합니다.
//!
//! # 패스 흐름
//! ```text
//! list_running ──> resolve_scope ──> (컨테이너별)
//!                                     inspect_image (현재)
//!                                          |
//!                                     pull_image (최신)
//!                                          |
//!                                     is_updated? ──no──> 다음 컨테이너
//!                                          | yes
//!                                     rebuild_spec
//!                                          |
//!                                     LifecycleManager.replace()
//!                                          |
//!                                     (cleanup) remove_image
//!
//! PassResult ──merge──> ResultStore ──report──> Notifier
//! ```
//!
//! 컨테이너는 엄격히 하나씩 처리됩니다. `run_pass`가 `&mut self`를 받으므로
//! 하나의 `Updater`에서 패스가 겹칠 수 없습니다.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, warn};

use refit_core::metrics as m;

use crate::config::UpdaterConfig;
use crate::engine::ContainerEngine;
use crate::error::{EngineStep, UpdaterError};
use crate::filter::resolve_scope;
use crate::image::{ImageDescriptor, is_updated};
use crate::lifecycle::{LifecycleManager, ReplacementOutcome};
use crate::notify::Notifier;
use crate::rebuild::rebuild_spec;
use crate::results::{PassResult, ReplacementRecord, ResultStore};
use crate::types::ContainerSnapshot;

/// 업데이트 오케스트레이터
///
/// # 사용 예시
/// ```ignore
/// use std::sync::Arc;
/// use refit_updater::{BollardEngine, LogNotifier, UpdaterBuilder};
///
/// let engine = Arc::new(BollardEngine::connect("/var/run/docker.sock", 120)?);
/// let mut updater = UpdaterBuilder::new()
///     .config(config)
///     .engine(engine)
///     .notifier(LogNotifier)
///     .build()?;
///
/// let result = updater.run_pass().await?;
/// ```
pub struct Updater<E: ContainerEngine, N: Notifier> {
    /// 업데이터 설정
    config: UpdaterConfig,
    /// 컨테이너 엔진 (라이프사이클 매니저와 공유)
    engine: Arc<E>,
    /// 컨테이너 교체 실행기
    lifecycle: LifecycleManager<E>,
    /// 패스 종료 시 보고서 수신자
    notifier: N,
    /// 호스트별 카운트와 대기 중인 교체 기록
    results: ResultStore,
    /// 완료된 패스 수 (중단된 패스 포함)
    passes_run: u64,
}

impl<E: ContainerEngine, N: Notifier> Updater<E, N> {
    /// 결과 카운터의 호스트 키를 반환합니다.
    pub fn host(&self) -> &str {
        &self.config.host
    }

    /// 결과 저장소를 반환합니다.
    pub fn results(&self) -> &ResultStore {
        &self.results
    }

    /// 실행된 패스 수를 반환합니다.
    pub fn passes_run(&self) -> u64 {
        self.passes_run
    }

    /// 한 번의 업데이트 패스를 실행합니다.
    ///
    /// # Errors
    ///
    /// - 컨테이너 목록 조회 실패: `UpdaterError::EngineCall` (알림 없음)
    /// - 감시/제외 목록 겹침: `UpdaterError::ConfigurationConflict` (알림 없음, 카운트 미기록)
    ///
    /// 컨테이너별 실패와 알림 실패는 로그로만 남고 에러로 반환되지 않습니다.
    pub async fn run_pass(&mut self) -> Result<PassResult, UpdaterError> {
        let started = Instant::now();
        self.passes_run += 1;
        metrics::counter!(m::UPDATER_PASSES_TOTAL).increment(1);

        let host = self.config.host.clone();
        info!(host = %host, pass = self.passes_run, "starting update pass");

        let result = self.execute_pass(&host).await;

        metrics::histogram!(m::UPDATER_PASS_DURATION_SECONDS, m::LABEL_HOST => host.clone())
            .record(started.elapsed().as_secs_f64());

        let result = result?;
        info!(
            host = %host,
            monitored = result.monitored,
            updated = result.updated,
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "update pass finished"
        );
        Ok(result)
    }

    async fn execute_pass(&mut self, host: &str) -> Result<PassResult, UpdaterError> {
        // 1. 실행 중인 컨테이너 나열
        let running = match self.engine.list_running().await {
            Ok(running) => running,
            Err(e) => {
                error!(host = %host, error = %e, "failed to list running containers, pass aborted");
                metrics::counter!(m::UPDATER_STEP_FAILURES_TOTAL, m::LABEL_STEP => EngineStep::List.as_str())
                    .increment(1);
                return Err(e);
            }
        };

        // 2. 필터 적용 (겹치면 엔진 변경 전에 중단). 실행 중인 컨테이너가 없으면 필터를 보지 않습니다.
        let scope = if running.is_empty() {
            info!(host = %host, "no running containers");
            Vec::new()
        } else {
            match resolve_scope(running, &self.config.filter) {
                Ok(scope) => scope,
                Err(e) => {
                    error!(host = %host, error = %e, "invalid container filter, pass aborted");
                    return Err(e);
                }
            }
        };

        // 3. 감시 대상 수 기록
        let mut result = PassResult::empty(host, scope.len());
        metrics::gauge!(m::UPDATER_MONITORED_CONTAINERS, m::LABEL_HOST => host.to_owned())
            .set(scope.len() as f64);
        debug!(host = %host, monitored = scope.len(), "resolved update scope");

        // 4-5. 컨테이너별 처리 (엔진 나열 순서)
        for container in &scope {
            if let Some(record) = self.update_container(container).await {
                result.updated += 1;
                result.replacements.push(record);
            }
        }

        if result.updated > 0 {
            metrics::counter!(m::UPDATER_UPDATED_CONTAINERS_TOTAL, m::LABEL_HOST => host.to_owned())
                .increment(result.updated as u64);
        }

        // 6. 결과 병합 및 알림
        self.results.merge(result.clone());
        self.notify(host).await;

        Ok(result)
    }

    /// 한 컨테이너를 검사하고 필요하면 교체합니다.
    ///
    /// 새 컨테이너가 시작까지 완료된 경우에만 교체 기록을 반환합니다.
    async fn update_container(&self, container: &ContainerSnapshot) -> Option<ReplacementRecord> {
        let name = container.bare_name();

        let current = self.current_image(container).await?;

        let latest = match self
            .engine
            .pull_image(&container.image, self.config.credentials.as_ref())
            .await
        {
            Ok(latest) => latest,
            Err(e) => {
                warn!(
                    container_name = name,
                    image = %container.image,
                    error = %e,
                    "failed to pull image, skipping container"
                );
                metrics::counter!(m::UPDATER_PULL_FAILURES_TOTAL).increment(1);
                record_step_failure(EngineStep::Pull);
                return None;
            }
        };
        let Some(latest) = latest else {
            debug!(
                container_name = name,
                image = %container.image,
                "no image found after pull, skipping container"
            );
            return None;
        };

        if !is_updated(&current, Some(&latest)) {
            debug!(
                container_name = name,
                image_id = %current.id,
                "container is running the latest image"
            );
            return None;
        }

        info!(
            container_name = name,
            container_id = %container.id,
            old_image = %current.id,
            new_image = %latest.id,
            "found new image"
        );

        let spec = rebuild_spec(container, &container.image);
        let outcome = self.lifecycle.replace(container, spec).await;
        for failure in &outcome.failures {
            record_step_failure(failure.step);
        }

        if self.config.cleanup {
            self.cleanup_image(name, &current, &latest, &outcome).await;
        }

        if !outcome.is_replaced() {
            return None;
        }

        Some(ReplacementRecord {
            old_image: current.id,
            new_image: latest.id,
            old_container: container.clone(),
        })
    }

    /// 컨테이너가 실행 중인 이미지를 조회합니다.
    ///
    /// 실행 중인 이미지 ID로 먼저 조회하고, 없으면 설정된 참조로 조회합니다.
    async fn current_image(&self, container: &ContainerSnapshot) -> Option<ImageDescriptor> {
        let name = container.bare_name();
        let reference = container
            .image_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .unwrap_or(&container.image);

        match self.engine.inspect_image(reference).await {
            Ok(Some(image)) => Some(image),
            Ok(None) if reference != container.image => {
                match self.engine.inspect_image(&container.image).await {
                    Ok(Some(image)) => Some(image),
                    Ok(None) => {
                        warn!(container_name = name, image = %container.image, "current image not found, skipping container");
                        None
                    }
                    Err(e) => {
                        warn!(container_name = name, error = %e, "failed to inspect current image, skipping container");
                        record_step_failure(EngineStep::InspectImage);
                        None
                    }
                }
            }
            Ok(None) => {
                warn!(container_name = name, image = %container.image, "current image not found, skipping container");
                None
            }
            Err(e) => {
                warn!(container_name = name, error = %e, "failed to inspect current image, skipping container");
                record_step_failure(EngineStep::InspectImage);
                None
            }
        }
    }

    /// 교체로 기존 컨테이너가 삭제된 경우 이전 이미지 삭제를 요청합니다.
    ///
    /// 실패는 로그만 남깁니다 (다른 컨테이너가 사용 중일 수 있음).
    async fn cleanup_image(
        &self,
        name: &str,
        current: &ImageDescriptor,
        latest: &ImageDescriptor,
        outcome: &ReplacementOutcome,
    ) {
        if !outcome.old_removed || current.id == latest.id {
            return;
        }
        match self.engine.remove_image(&current.id).await {
            Ok(()) => info!(container_name = name, image_id = %current.id, "removed previous image"),
            Err(e) => {
                warn!(
                    container_name = name,
                    image_id = %current.id,
                    error = %e,
                    "failed to remove previous image"
                );
                record_step_failure(EngineStep::RemoveImage);
            }
        }
    }

    /// 집계 보고서를 알림으로 전달합니다.
    async fn notify(&mut self, host: &str) {
        let report = self.results.report(host);
        match self.notifier.notify(&report).await {
            Ok(()) => {
                self.results.mark_notified();
                debug!(host = %host, records = report.replacements.len(), "pass report delivered");
            }
            Err(e) => {
                error!(
                    host = %host,
                    error = %e,
                    pending = report.replacements.len(),
                    "failed to send pass notification"
                );
            }
        }
    }
}

fn record_step_failure(step: EngineStep) {
    metrics::counter!(m::UPDATER_STEP_FAILURES_TOTAL, m::LABEL_STEP => step.as_str()).increment(1);
}

/// 업데이터 빌더
pub struct UpdaterBuilder<E: ContainerEngine, N: Notifier> {
    config: UpdaterConfig,
    engine: Option<Arc<E>>,
    notifier: Option<N>,
}

impl<E: ContainerEngine, N: Notifier> Default for UpdaterBuilder<E, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: ContainerEngine, N: Notifier> UpdaterBuilder<E, N> {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            config: UpdaterConfig::default(),
            engine: None,
            notifier: None,
        }
    }

    /// 업데이터 설정을 지정합니다.
    pub fn config(mut self, config: UpdaterConfig) -> Self {
        self.config = config;
        self
    }

    /// 컨테이너 엔진을 설정합니다.
    pub fn engine(mut self, engine: Arc<E>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// 알림 수신자를 설정합니다.
    pub fn notifier(mut self, notifier: N) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// 업데이터를 빌드합니다.
    pub fn build(self) -> Result<Updater<E, N>, UpdaterError> {
        self.config.validate()?;

        let engine = self.engine.ok_or_else(|| UpdaterError::Config {
            field: "engine".to_owned(),
            reason: "container engine must be provided".to_owned(),
        })?;
        let notifier = self.notifier.ok_or_else(|| UpdaterError::Config {
            field: "notifier".to_owned(),
            reason: "notifier must be provided".to_owned(),
        })?;

        Ok(Updater {
            lifecycle: LifecycleManager::new(Arc::clone(&engine)),
            results: ResultStore::new(self.config.record_retention),
            config: self.config,
            engine,
            notifier,
            passes_run: 0,
        })
    }
}
