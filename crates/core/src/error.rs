//! 에러 타입 -- 도메인별 에러 정의

/// Refit 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum RefitError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 컨테이너 엔진 에러
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    /// 업데이트 패스 에러
    #[error("update error: {0}")]
    Update(#[from] UpdateError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    /// 감시 대상과 제외 대상 이름이 겹침
    #[error("containers to monitor intersect with containers to ignore: {names:?}")]
    FilterConflict { names: Vec<String> },
}

/// 컨테이너 엔진 에러
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// 엔진 연결 실패
    #[error("connection failed: {0}")]
    Connection(String),

    /// 엔진 API 호출 실패
    #[error("{step} failed for '{target}': {reason}")]
    Call {
        step: String,
        target: String,
        reason: String,
    },
}

/// 업데이트 패스 에러
#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    /// 알림 전송 실패
    #[error("notification failed: {0}")]
    Notification(String),
}
