//! 필터 해석 -- 업데이트 대상 컨테이너 범위 계산
//!
//! [`FilterSpec`]은 감시(monitor) 목록과 제외(ignore) 목록을 보관하고,
//! [`resolve_scope`]는 실행 중인 컨테이너 중 이번 패스에서 다룰 컨테이너를
//! 엔진이 나열한 순서 그대로 골라냅니다.

use refit_core::config::{UpdateConfig, overlapping_names};

use crate::error::UpdaterError;
use crate::types::ContainerSnapshot;

/// 감시/제외 이름 목록
///
/// 이름은 정확히 일치해야 하며, 컨테이너 이름의 앞쪽 `/`는 비교 전에 제거됩니다.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    /// 감시할 컨테이너 이름 (비어있으면 전체)
    pub monitor: Vec<String>,
    /// 제외할 컨테이너 이름
    pub ignore: Vec<String>,
}

impl FilterSpec {
    pub fn new(monitor: Vec<String>, ignore: Vec<String>) -> Self {
        Self { monitor, ignore }
    }

    /// 코어 업데이트 설정에서 필터를 생성합니다.
    pub fn from_config(config: &UpdateConfig) -> Self {
        Self::new(config.monitor.clone(), config.ignore.clone())
    }

    /// 두 목록에 동시에 등장하는 이름을 반환합니다.
    pub fn conflicts(&self) -> Vec<String> {
        overlapping_names(&self.monitor, &self.ignore)
    }

    /// 감시/제외 목록이 겹치면 `ConfigurationConflict`를 반환합니다.
    pub fn validate(&self) -> Result<(), UpdaterError> {
        let names = self.conflicts();
        if names.is_empty() {
            Ok(())
        } else {
            Err(UpdaterError::ConfigurationConflict { names })
        }
    }

    /// 컨테이너가 이 필터의 범위에 포함되는지 확인합니다.
    ///
    /// 겹침 검증은 하지 않으므로 [`validate`](Self::validate) 이후에 사용해야 합니다.
    pub fn matches(&self, container: &ContainerSnapshot) -> bool {
        let name = container.bare_name();
        let monitored = self.monitor.is_empty() || self.monitor.iter().any(|m| m == name);
        monitored && !self.ignore.iter().any(|i| i == name)
    }
}

/// 실행 중인 컨테이너 목록에서 이번 패스의 대상 범위를 계산합니다.
///
/// 목록이 겹치면 범위를 계산하지 않고 즉시 실패합니다.
/// 빈 입력은 에러가 아니라 빈 범위입니다.
pub fn resolve_scope(
    running: Vec<ContainerSnapshot>,
    filter: &FilterSpec,
) -> Result<Vec<ContainerSnapshot>, UpdaterError> {
    filter.validate()?;
    Ok(running.into_iter().filter(|c| filter.matches(c)).collect())
}
