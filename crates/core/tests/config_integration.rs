//! refit.toml 통합 설정 테스트
//!
//! - refit.toml.example 파싱 테스트
//! - 부분 설정 (일부 섹션만) 로딩 테스트
//! - 파일 로딩 및 환경변수 우선순위 테스트
//! - 빈 파일 / 잘못된 형식 에러 테스트

use std::io::Write;

use refit_core::config::{RecordRetention, RefitConfig};
use refit_core::error::{ConfigError, RefitError};
use serial_test::serial;

// =============================================================================
// refit.toml.example 파싱 테스트
// =============================================================================

const EXAMPLE: &str = include_str!("../../../refit.toml.example");

#[test]
fn example_config_parses_successfully() {
    let config = RefitConfig::parse(EXAMPLE).expect("example config should parse");
    assert_eq!(config.general.log_level, "info");
    assert_eq!(config.general.log_format, "pretty");
}

#[test]
fn example_config_passes_validation() {
    let config = RefitConfig::parse(EXAMPLE).expect("should parse");
    config
        .validate()
        .expect("example config should pass validation");
}

#[test]
fn example_config_matches_code_defaults() {
    let example = RefitConfig::parse(EXAMPLE).expect("should parse");
    let defaults = RefitConfig::default();

    assert_eq!(example.general.log_level, defaults.general.log_level);
    assert_eq!(example.general.log_format, defaults.general.log_format);
    assert_eq!(example.engine.host, defaults.engine.host);
    assert_eq!(example.engine.timeout_secs, defaults.engine.timeout_secs);
    assert_eq!(example.update.run_once, defaults.update.run_once);
    assert_eq!(example.update.cleanup, defaults.update.cleanup);
    assert_eq!(example.update.interval_secs, defaults.update.interval_secs);
    assert_eq!(example.update.monitor, defaults.update.monitor);
    assert_eq!(example.update.ignore, defaults.update.ignore);
    assert_eq!(
        example.update.record_retention,
        defaults.update.record_retention
    );
    assert_eq!(example.registry.username, defaults.registry.username);
    assert_eq!(example.metrics.enabled, defaults.metrics.enabled);
    assert_eq!(example.metrics.port, defaults.metrics.port);
    assert_eq!(example.metrics.endpoint, defaults.metrics.endpoint);
}

// =============================================================================
// 부분 설정 테스트
// =============================================================================

#[test]
fn partial_config_update_only() {
    let config = RefitConfig::parse(
        r#"
[update]
monitor = ["web", "api"]
record_retention = "accumulate"
"#,
    )
    .expect("should parse");

    assert_eq!(config.update.monitor, vec!["web", "api"]);
    assert_eq!(config.update.record_retention, RecordRetention::Accumulate);
    // 나머지는 기본값
    assert_eq!(config.update.interval_secs, 300);
    assert_eq!(config.engine.host, "/var/run/docker.sock");
    assert_eq!(config.general.log_level, "info");
}

#[test]
fn partial_config_engine_and_registry() {
    let config = RefitConfig::parse(
        r#"
[engine]
host = "tcp://10.0.0.5:2375"

[registry]
username = "deploy"
password = "token"
"#,
    )
    .expect("should parse");

    assert_eq!(config.engine.host, "tcp://10.0.0.5:2375");
    assert_eq!(config.engine.timeout_secs, 120);
    assert_eq!(config.registry.username.as_deref(), Some("deploy"));
    assert_eq!(config.registry.password.as_deref(), Some("token"));
}

#[test]
fn empty_file_is_all_defaults() {
    let config = RefitConfig::parse("").expect("empty config should parse");
    config.validate().expect("defaults should validate");
}

// =============================================================================
// 에러 테스트
// =============================================================================

#[test]
fn malformed_toml_is_parse_error() {
    let err = RefitConfig::parse("[update\ninterval_secs = 1").unwrap_err();
    assert!(matches!(
        err,
        RefitError::Config(ConfigError::ParseFailed { .. })
    ));
}

#[test]
fn wrong_type_is_parse_error() {
    let err = RefitConfig::parse("[update]\ninterval_secs = \"soon\"").unwrap_err();
    assert!(matches!(
        err,
        RefitError::Config(ConfigError::ParseFailed { .. })
    ));
}

#[test]
fn unknown_retention_is_parse_error() {
    assert!(RefitConfig::parse("[update]\nrecord_retention = \"forever\"").is_err());
}

#[test]
fn overlapping_filters_fail_validation() {
    let config = RefitConfig::parse(
        r#"
[update]
monitor = ["web", "api"]
ignore = ["api", "db"]
"#,
    )
    .expect("should parse");

    match config.validate().unwrap_err() {
        RefitError::Config(ConfigError::FilterConflict { names }) => {
            assert_eq!(names, vec!["api"]);
        }
        other => panic!("expected FilterConflict, got {other:?}"),
    }
}

// =============================================================================
// 파일 로딩 / 환경변수 우선순위
// =============================================================================

#[tokio::test]
#[serial]
async fn load_applies_env_over_file() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(b"[engine]\nhost = \"/run/docker.sock\"\n[update]\ninterval_secs = 120\n")
        .expect("write");

    // SAFETY: serial 테스트이므로 다른 스레드가 환경변수를 읽지 않습니다.
    unsafe { std::env::set_var("REFIT_UPDATE_INTERVAL_SECS", "45") };
    let result = RefitConfig::load(file.path()).await;
    unsafe { std::env::remove_var("REFIT_UPDATE_INTERVAL_SECS") };

    let config = result.expect("config should load");
    assert_eq!(config.engine.host, "/run/docker.sock");
    assert_eq!(config.update.interval_secs, 45);
}

#[tokio::test]
#[serial]
async fn load_rejects_invalid_env_result() {
    let file = tempfile::NamedTempFile::new().expect("temp file");

    // SAFETY: serial 테스트이므로 다른 스레드가 환경변수를 읽지 않습니다.
    unsafe { std::env::set_var("REFIT_ENGINE_TIMEOUT_SECS", "0") };
    let result = RefitConfig::load(file.path()).await;
    unsafe { std::env::remove_var("REFIT_ENGINE_TIMEOUT_SECS") };

    assert!(result.is_err());
}

#[tokio::test]
async fn load_missing_file_is_not_found() {
    let err = RefitConfig::load("/nonexistent/refit.toml").await.unwrap_err();
    assert!(matches!(
        err,
        RefitError::Config(ConfigError::FileNotFound { .. })
    ));
}
