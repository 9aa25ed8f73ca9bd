//! 업데이터 설정
//!
//! [`UpdaterConfig`]는 core의 [`RefitConfig`](refit_core::config::RefitConfig)에서
//! 업데이트 패스에 필요한 값만 추려낸 설정입니다.
//!
//! # 사용 예시
//! ```ignore
//! use refit_core::config::RefitConfig;
//! use refit_updater::config::UpdaterConfig;
//!
//! let core_config = RefitConfig::default();
//! let config = UpdaterConfig::from_core(&core_config);
//! ```

use refit_core::config::{RecordRetention, RefitConfig};

use crate::engine::EngineEndpoint;
use crate::error::UpdaterError;
use crate::filter::FilterSpec;
use crate::types::PullCredentials;

/// 업데이터 설정
#[derive(Debug, Clone)]
pub struct UpdaterConfig {
    /// 엔진 주소 (결과 카운터의 호스트 키)
    pub host: String,
    /// 업데이트 후 이전 이미지 삭제 여부
    pub cleanup: bool,
    /// 감시/제외 필터
    pub filter: FilterSpec,
    /// pull 인증 정보 (없으면 익명 pull)
    pub credentials: Option<PullCredentials>,
    /// 교체 기록 보존 정책
    pub record_retention: RecordRetention,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            host: "/var/run/docker.sock".to_owned(),
            cleanup: false,
            filter: FilterSpec::default(),
            credentials: None,
            record_retention: RecordRetention::default(),
        }
    }
}

impl UpdaterConfig {
    /// core 설정에서 업데이터 설정을 생성합니다.
    ///
    /// 레지스트리 사용자명과 비밀번호가 모두 있을 때만 인증 정보가 설정됩니다.
    pub fn from_core(core: &RefitConfig) -> Self {
        Self {
            host: core.engine.host.clone(),
            cleanup: core.update.cleanup,
            filter: FilterSpec::from_config(&core.update),
            credentials: PullCredentials::from_parts(
                core.registry.username.as_deref(),
                core.registry.password.as_deref(),
            ),
            record_retention: core.update.record_retention,
        }
    }

    /// 설정값의 유효성을 검증합니다.
    ///
    /// 필터 겹침은 패스마다 [`resolve_scope`](crate::filter::resolve_scope)가 검사합니다.
    pub fn validate(&self) -> Result<(), UpdaterError> {
        if self.host.trim().is_empty() {
            return Err(UpdaterError::Config {
                field: "host".to_owned(),
                reason: "host must not be empty".to_owned(),
            });
        }
        EngineEndpoint::parse(&self.host)?;
        Ok(())
    }
}

/// 업데이터 설정 빌더
#[derive(Default)]
pub struct UpdaterConfigBuilder {
    config: UpdaterConfig,
}

impl UpdaterConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 엔진 주소를 설정합니다.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// 이전 이미지 삭제 여부를 설정합니다.
    pub fn cleanup(mut self, cleanup: bool) -> Self {
        self.config.cleanup = cleanup;
        self
    }

    /// 감시할 컨테이너 이름을 설정합니다.
    pub fn monitor(mut self, names: Vec<String>) -> Self {
        self.config.filter.monitor = names;
        self
    }

    /// 제외할 컨테이너 이름을 설정합니다.
    pub fn ignore(mut self, names: Vec<String>) -> Self {
        self.config.filter.ignore = names;
        self
    }

    /// pull 인증 정보를 설정합니다.
    pub fn credentials(mut self, credentials: Option<PullCredentials>) -> Self {
        self.config.credentials = credentials;
        self
    }

    /// 교체 기록 보존 정책을 설정합니다.
    pub fn record_retention(mut self, retention: RecordRetention) -> Self {
        self.config.record_retention = retention;
        self
    }

    /// 설정을 검증하고 `UpdaterConfig`를 생성합니다.
    pub fn build(self) -> Result<UpdaterConfig, UpdaterError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
