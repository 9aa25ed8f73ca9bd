//! 업데이터 에러 타입
//!
//! [`UpdaterError`]는 업데이트 패스 내부에서 발생하는 모든 에러를 표현합니다.
//! `From<UpdaterError> for RefitError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.
//!
//! # 전파 정책
//! - `ConfigurationConflict`: 패스 전체를 중단 (엔진 변경 전)
//! - `EngineCall`: 해당 컨테이너에만 국한, 패스는 다음 컨테이너로 계속
//! - `Notification`: 로그만 남김, 이미 수행된 교체와 카운트에 영향 없음

use std::fmt;

use refit_core::error::{ConfigError, EngineError, RefitError, UpdateError};

/// 엔진 API 호출 단계
///
/// 에러 메시지와 메트릭 레이블에 사용됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineStep {
    /// 실행 중인 컨테이너 목록 조회
    List,
    /// 이미지 조회
    InspectImage,
    /// 최신 이미지 pull
    Pull,
    /// 이전 이미지 삭제
    RemoveImage,
    /// 컨테이너 정지
    Stop,
    /// 컨테이너 삭제
    Remove,
    /// 컨테이너 생성
    Create,
    /// 컨테이너 시작
    Start,
}

impl EngineStep {
    /// 메트릭 레이블용 고정 문자열을 반환합니다.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::List => "list",
            Self::InspectImage => "inspect_image",
            Self::Pull => "pull",
            Self::RemoveImage => "remove_image",
            Self::Stop => "stop",
            Self::Remove => "remove",
            Self::Create => "create",
            Self::Start => "start",
        }
    }
}

impl fmt::Display for EngineStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 업데이터 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum UpdaterError {
    /// 감시 목록과 제외 목록이 겹침
    #[error("containers to monitor intersect with containers to ignore: {names:?}")]
    ConfigurationConflict {
        /// 양쪽에 모두 등장한 컨테이너 이름
        names: Vec<String>,
    },

    /// 엔진 API 호출 실패
    #[error("{step} failed for '{target}': {reason}")]
    EngineCall {
        /// 실패한 단계
        step: EngineStep,
        /// 대상 컨테이너 ID, 이름 또는 이미지 참조
        target: String,
        /// 실패 사유
        reason: String,
    },

    /// 엔진 연결 실패
    #[error("docker connection error: {0}")]
    DockerConnection(String),

    /// 알림 전송 실패
    #[error("notification failed: {0}")]
    Notification(String),

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },
}

impl UpdaterError {
    /// 엔진 호출 실패 에러를 생성합니다.
    pub fn engine(step: EngineStep, target: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::EngineCall {
            step,
            target: target.into(),
            reason: reason.to_string(),
        }
    }

    /// 실패한 엔진 단계를 반환합니다 (엔진 호출 에러가 아니면 `None`).
    pub fn step(&self) -> Option<EngineStep> {
        match self {
            Self::EngineCall { step, .. } => Some(*step),
            _ => None,
        }
    }
}

impl From<UpdaterError> for RefitError {
    fn from(err: UpdaterError) -> Self {
        match err {
            UpdaterError::ConfigurationConflict { names } => {
                RefitError::Config(ConfigError::FilterConflict { names })
            }
            UpdaterError::EngineCall {
                step,
                target,
                reason,
            } => RefitError::Engine(EngineError::Call {
                step: step.to_string(),
                target,
                reason,
            }),
            UpdaterError::DockerConnection(msg) => {
                RefitError::Engine(EngineError::Connection(msg))
            }
            UpdaterError::Notification(msg) => {
                RefitError::Update(UpdateError::Notification(msg))
            }
            UpdaterError::Config { field, reason } => {
                RefitError::Config(ConfigError::InvalidValue { field, reason })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_conflict_display() {
        let err = UpdaterError::ConfigurationConflict {
            names: vec!["web".to_owned(), "db".to_owned()],
        };
        let msg = err.to_string();
        assert!(msg.contains("web"));
        assert!(msg.contains("db"));
    }

    #[test]
    fn engine_call_display() {
        let err = UpdaterError::engine(EngineStep::Stop, "abc123", "container is paused");
        assert_eq!(err.to_string(), "stop failed for 'abc123': container is paused");
        assert_eq!(err.step(), Some(EngineStep::Stop));
    }

    #[test]
    fn step_is_none_for_non_engine_errors() {
        let err = UpdaterError::Notification("smtp down".to_owned());
        assert!(err.step().is_none());
    }

    #[test]
    fn step_labels_are_lowercase() {
        for step in [
            EngineStep::List,
            EngineStep::InspectImage,
            EngineStep::Pull,
            EngineStep::RemoveImage,
            EngineStep::Stop,
            EngineStep::Remove,
            EngineStep::Create,
            EngineStep::Start,
        ] {
            assert_eq!(step.as_str().to_lowercase(), step.as_str());
        }
    }

    #[test]
    fn converts_conflict_to_filter_conflict() {
        let err: RefitError = UpdaterError::ConfigurationConflict {
            names: vec!["a".to_owned()],
        }
        .into();
        assert!(matches!(
            err,
            RefitError::Config(ConfigError::FilterConflict { .. })
        ));
    }

    #[test]
    fn converts_engine_call_to_engine_error() {
        let err: RefitError = UpdaterError::engine(EngineStep::Pull, "nginx:latest", "denied").into();
        match err {
            RefitError::Engine(EngineError::Call { step, .. }) => assert_eq!(step, "pull"),
            other => panic!("unexpected conversion: {other}"),
        }
    }

    #[test]
    fn converts_notification_to_update_error() {
        let err: RefitError = UpdaterError::Notification("closed".to_owned()).into();
        assert!(matches!(
            err,
            RefitError::Update(UpdateError::Notification(_))
        ));
    }
}
