//! 라이프사이클 관리 -- 컨테이너 교체 상태 전이
//!
//! [`LifecycleManager`]는 하나의 컨테이너에 대해
//! `Running → Stopped → Removed → Created → Started` 전이를 수행합니다.
//!
//! # 실패 정책
//! - 정지 실패: 교체 중단, 이후 단계는 호출하지 않음 (기존 컨테이너 유지)
//! - 삭제 실패: 로그만 남기고 생성 단계로 진행 (정지는 되돌리지 않음)
//! - 생성 실패: critical 로그, 이전/신규 컨테이너 모두 워크로드를 실행하지 않음
//! - 시작 실패: 로그만 남김, 생성된 컨테이너는 정지 상태로 남음
//!
//! 단계 간 트랜잭션 롤백은 없습니다. 각 단계의 결과는 [`ReplacementOutcome`]에
//! 기록되어 호출자가 어디까지 진행되었는지 확인할 수 있습니다.

use std::fmt;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::engine::ContainerEngine;
use crate::error::{EngineStep, UpdaterError};
use crate::rebuild::ContainerSpec;
use crate::types::ContainerSnapshot;

/// 교체 전이 중 도달한 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LifecycleState {
    /// 기존 컨테이너가 실행 중 (아무 단계도 성공하지 않음)
    Running,
    /// 기존 컨테이너 정지됨
    Stopped,
    /// 기존 컨테이너 삭제됨
    Removed,
    /// 신규 컨테이너 생성됨 (아직 시작 전)
    Created,
    /// 신규 컨테이너 시작됨
    Started,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Stopped => write!(f, "stopped"),
            Self::Removed => write!(f, "removed"),
            Self::Created => write!(f, "created"),
            Self::Started => write!(f, "started"),
        }
    }
}

/// 실패한 단계와 그 에러
#[derive(Debug)]
pub struct StepFailure {
    pub step: EngineStep,
    pub error: UpdaterError,
}

/// 한 컨테이너 교체의 결과
#[derive(Debug)]
pub struct ReplacementOutcome {
    /// 교체 대상이었던 기존 컨테이너 ID
    pub old_container_id: String,
    /// 마지막으로 도달한 상태
    ///
    /// 삭제가 실패해도 생성이 성공하면 `Created` 이상이 될 수 있으므로,
    /// 기존 컨테이너 삭제 여부는 [`old_removed`](Self::old_removed)로 확인합니다.
    pub state: LifecycleState,
    /// 기존 컨테이너 삭제 성공 여부
    pub old_removed: bool,
    /// 신규 컨테이너 ID (생성 성공 시)
    pub new_container_id: Option<String>,
    /// 실패한 단계 목록 (발생 순서)
    pub failures: Vec<StepFailure>,
}

impl ReplacementOutcome {
    fn new(old_container_id: &str) -> Self {
        Self {
            old_container_id: old_container_id.to_owned(),
            state: LifecycleState::Running,
            old_removed: false,
            new_container_id: None,
            failures: Vec::new(),
        }
    }

    /// 신규 컨테이너가 시작까지 완료되었는지 확인합니다.
    pub fn is_replaced(&self) -> bool {
        self.state == LifecycleState::Started
    }

    fn fail(&mut self, step: EngineStep, error: UpdaterError) {
        self.failures.push(StepFailure { step, error });
    }
}

/// 컨테이너 교체 실행기
pub struct LifecycleManager<E: ContainerEngine> {
    engine: Arc<E>,
}

impl<E: ContainerEngine> LifecycleManager<E> {
    /// 새 라이프사이클 매니저를 생성합니다.
    pub fn new(engine: Arc<E>) -> Self {
        Self { engine }
    }

    /// `old`를 정지/삭제하고 `spec`으로 신규 컨테이너를 생성/시작합니다.
    ///
    /// 에러를 반환하지 않습니다. 각 단계의 실패는 결과에 기록되고 로그로 남습니다.
    pub async fn replace(&self, old: &ContainerSnapshot, spec: ContainerSpec) -> ReplacementOutcome {
        let name = old.bare_name();
        let mut outcome = ReplacementOutcome::new(&old.id);

        info!(
            container_name = name,
            container_id = %old.id,
            new_image = %spec.image,
            "replacing container"
        );

        if let Err(e) = self.engine.stop_container(&old.id).await {
            error!(
                container_name = name,
                container_id = %old.id,
                error = %e,
                "failed to stop container, replacement aborted"
            );
            outcome.fail(EngineStep::Stop, e);
            return outcome;
        }
        outcome.state = LifecycleState::Stopped;

        match self.engine.remove_container(&old.id).await {
            Ok(()) => {
                outcome.old_removed = true;
                outcome.state = LifecycleState::Removed;
            }
            Err(e) => {
                warn!(
                    container_name = name,
                    container_id = %old.id,
                    error = %e,
                    "failed to remove container, continuing with create"
                );
                outcome.fail(EngineStep::Remove, e);
            }
        }

        let new_id = match self.engine.create_container(&spec).await {
            Ok(id) => id,
            Err(e) => {
                error!(
                    container_name = name,
                    container_id = %old.id,
                    image = %spec.image,
                    error = %e,
                    critical = true,
                    "failed to create replacement container, workload is not running"
                );
                outcome.fail(EngineStep::Create, e);
                return outcome;
            }
        };
        outcome.state = LifecycleState::Created;
        outcome.new_container_id = Some(new_id.clone());

        if let Err(e) = self.engine.start_container(&new_id).await {
            error!(
                container_name = name,
                container_id = %new_id,
                error = %e,
                "failed to start replacement container, it remains created but stopped"
            );
            outcome.fail(EngineStep::Start, e);
            return outcome;
        }
        outcome.state = LifecycleState::Started;

        info!(
            container_name = name,
            old_container_id = %old.id,
            new_container_id = %new_id,
            "container replaced"
        );
        outcome
    }
}
