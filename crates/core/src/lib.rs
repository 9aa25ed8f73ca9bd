//! Refit 공통 크레이트
//!
//! 모든 Refit 크레이트가 공유하는 설정, 에러 타입, 메트릭 이름을 정의합니다.
//!
//! - [`config`]: `refit.toml` 파싱, 환경변수 오버라이드, 검증
//! - [`error`]: 최상위 에러 타입 (`RefitError`)
//! - [`metrics`]: Prometheus 메트릭 이름과 설명 등록

pub mod config;
pub mod error;
pub mod metrics;

// --- 주요 타입 re-export ---

// 에러
pub use error::{ConfigError, EngineError, RefitError, UpdateError};

// 설정
pub use config::{
    EngineConfig, GeneralConfig, MetricsConfig, RecordRetention, RefitConfig, RegistryConfig,
    UpdateConfig,
};
