//! 설정 관리 -- refit.toml 파싱 및 런타임 설정
//!
//! [`RefitConfig`]는 데몬과 업데이터가 사용하는 최상위 설정 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선, `refit-daemon`에서 적용)
//! 2. 환경변수 (`REFIT_UPDATE_INTERVAL_SECS=60` 형식)
//! 3. 설정 파일 (`refit.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), refit_core::error::RefitError> {
//! use refit_core::config::RefitConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = RefitConfig::load("refit.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = RefitConfig::parse("[update]\nrun_once = true")?;
//! # Ok(())
//! # }
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, RefitError};

/// 설정 상한값 상수
const MAX_INTERVAL_SECS: u64 = 86_400;
const MAX_ENGINE_TIMEOUT_SECS: u64 = 3600;

/// Refit 통합 설정
///
/// `refit.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RefitConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 컨테이너 엔진 연결 설정
    #[serde(default)]
    pub engine: EngineConfig,
    /// 업데이트 패스 설정
    #[serde(default)]
    pub update: UpdateConfig,
    /// 레지스트리 인증 설정
    #[serde(default)]
    pub registry: RegistryConfig,
    /// 메트릭 설정
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl RefitConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, RefitError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음, 검증 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, RefitError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                RefitError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                RefitError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, RefitError> {
        toml::from_str(toml_str).map_err(|e| {
            RefitError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `REFIT_{SECTION}_{FIELD}`
    /// 예: `REFIT_ENGINE_HOST=tcp://10.0.0.5:2375`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "REFIT_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "REFIT_GENERAL_LOG_FORMAT");

        // Engine
        override_string(&mut self.engine.host, "REFIT_ENGINE_HOST");
        override_u64(&mut self.engine.timeout_secs, "REFIT_ENGINE_TIMEOUT_SECS");

        // Update
        override_bool(&mut self.update.run_once, "REFIT_UPDATE_RUN_ONCE");
        override_bool(&mut self.update.cleanup, "REFIT_UPDATE_CLEANUP");
        override_u64(
            &mut self.update.interval_secs,
            "REFIT_UPDATE_INTERVAL_SECS",
        );
        override_csv(&mut self.update.monitor, "REFIT_UPDATE_MONITOR");
        override_csv(&mut self.update.ignore, "REFIT_UPDATE_IGNORE");
        override_retention(
            &mut self.update.record_retention,
            "REFIT_UPDATE_RECORD_RETENTION",
        );

        // Registry
        override_opt_string(&mut self.registry.username, "REFIT_REGISTRY_USERNAME");
        override_opt_string(&mut self.registry.password, "REFIT_REGISTRY_PASSWORD");

        // Metrics
        override_bool(&mut self.metrics.enabled, "REFIT_METRICS_ENABLED");
        override_string(&mut self.metrics.listen_addr, "REFIT_METRICS_LISTEN_ADDR");
        override_u16(&mut self.metrics.port, "REFIT_METRICS_PORT");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), RefitError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        if self.engine.host.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "engine.host".to_owned(),
                reason: "host must not be empty".to_owned(),
            }
            .into());
        }

        if self.engine.timeout_secs == 0 || self.engine.timeout_secs > MAX_ENGINE_TIMEOUT_SECS {
            return Err(ConfigError::InvalidValue {
                field: "engine.timeout_secs".to_owned(),
                reason: format!("must be 1-{MAX_ENGINE_TIMEOUT_SECS}"),
            }
            .into());
        }

        if self.update.interval_secs == 0 || self.update.interval_secs > MAX_INTERVAL_SECS {
            return Err(ConfigError::InvalidValue {
                field: "update.interval_secs".to_owned(),
                reason: format!("must be 1-{MAX_INTERVAL_SECS}"),
            }
            .into());
        }

        let overlap = self.update.overlapping_names();
        if !overlap.is_empty() {
            return Err(ConfigError::FilterConflict { names: overlap }.into());
        }

        if self.registry.username.is_some() != self.registry.password.is_some() {
            warn!("registry credentials are incomplete, pulls will be anonymous");
        }

        if self.metrics.enabled && self.metrics.endpoint != "/metrics" {
            return Err(ConfigError::InvalidValue {
                field: "metrics.endpoint".to_owned(),
                reason: "only '/metrics' is supported".to_owned(),
            }
            .into());
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// 컨테이너 엔진 연결 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// 엔진 주소 (소켓 경로 또는 `tcp://host:port`)
    ///
    /// 패스 결과 카운터의 호스트 키로도 사용됩니다.
    pub host: String,
    /// 엔진 API 호출 타임아웃 (초)
    pub timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            host: "/var/run/docker.sock".to_owned(),
            timeout_secs: 120,
        }
    }
}

/// 업데이트 패스 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateConfig {
    /// 한 번만 실행하고 종료
    pub run_once: bool,
    /// 업데이트 후 이전 이미지 삭제
    pub cleanup: bool,
    /// 패스 간격 (초)
    pub interval_secs: u64,
    /// 감시할 컨테이너 이름 (비어있으면 전체)
    pub monitor: Vec<String>,
    /// 제외할 컨테이너 이름
    pub ignore: Vec<String>,
    /// 교체 기록 보존 정책
    pub record_retention: RecordRetention,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            run_once: false,
            cleanup: false,
            interval_secs: 300,
            monitor: Vec::new(),
            ignore: Vec::new(),
            record_retention: RecordRetention::default(),
        }
    }
}

impl UpdateConfig {
    /// 감시 목록과 제외 목록에 모두 등장하는 이름을 반환합니다.
    pub fn overlapping_names(&self) -> Vec<String> {
        overlapping_names(&self.monitor, &self.ignore)
    }
}

/// 두 이름 목록에 모두 등장하는 이름을 `monitor` 순서대로 중복 없이 반환합니다.
pub fn overlapping_names(monitor: &[String], ignore: &[String]) -> Vec<String> {
    let ignore: HashSet<&str> = ignore.iter().map(String::as_str).collect();
    let mut seen = HashSet::new();
    monitor
        .iter()
        .filter(|name| ignore.contains(name.as_str()) && seen.insert(name.as_str()))
        .cloned()
        .collect()
}

/// 교체 기록 보존 정책
///
/// 카운트는 항상 마지막 패스 값으로 덮어쓰지만, 교체 기록 목록은
/// 이 정책에 따라 누적되거나 알림 성공 후 비워집니다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordRetention {
    /// 알림 전송에 성공하면 기록을 비움 (실패 시 다음 패스로 이월)
    #[default]
    DrainOnNotify,
    /// 프로세스 수명 동안 기록을 계속 누적
    Accumulate,
}

impl std::str::FromStr for RecordRetention {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "drain_on_notify" => Ok(Self::DrainOnNotify),
            "accumulate" => Ok(Self::Accumulate),
            other => Err(ConfigError::InvalidValue {
                field: "update.record_retention".to_owned(),
                reason: format!("unknown policy '{other}', expected drain_on_notify or accumulate"),
            }),
        }
    }
}

/// 레지스트리 인증 설정
///
/// 사용자명과 비밀번호가 모두 있어야 인증에 사용됩니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// 레지스트리 사용자명
    pub username: Option<String>,
    /// 레지스트리 비밀번호
    pub password: Option<String>,
}

/// 메트릭 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 수신 주소
    pub listen_addr: String,
    /// 수신 포트
    pub port: u16,
    /// 스크레이프 경로
    pub endpoint: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: "127.0.0.1".to_owned(),
            port: 9464,
            endpoint: "/metrics".to_owned(),
        }
    }
}

/// 쉼표로 구분된 컨테이너 이름 목록을 파싱합니다.
///
/// 앞뒤 공백은 제거되고 빈 항목은 버려집니다.
pub fn parse_name_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_opt_string(target: &mut Option<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = if val.is_empty() { None } else { Some(val) };
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_u16(target: &mut u16, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u16>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u16 from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}

fn override_retention(target: &mut RecordRetention, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<RecordRetention>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse record retention from env var, ignoring"
            ),
        }
    }
}

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = parse_name_list(&val);
    }
}
