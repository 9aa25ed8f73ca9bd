//! Configuration loading tests.
//!
//! Tests file loading, environment overrides, CLI precedence, and validation
//! as the daemon performs them at startup.

use std::io::Write;

use clap::Parser;
use refit_core::config::RecordRetention;
use refit_daemon::app::load_config;
use refit_daemon::cli::DaemonCli;
use serial_test::serial;

fn cli(args: &[&str]) -> DaemonCli {
    let mut argv = vec!["refit-daemon"];
    argv.extend_from_slice(args);
    DaemonCli::try_parse_from(argv).expect("arguments should parse")
}

fn write_config(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(content.as_bytes()).expect("write config");
    file
}

#[tokio::test]
#[serial]
async fn test_defaults_without_config_file() {
    let config = load_config(&cli(&[])).await.expect("defaults should load");
    assert_eq!(config.engine.host, "/var/run/docker.sock");
    assert_eq!(config.update.interval_secs, 300);
    assert!(!config.update.run_once);
}

#[tokio::test]
#[serial]
async fn test_full_config_file() {
    let file = write_config(
        r#"
[general]
log_level = "debug"
log_format = "json"

[engine]
host = "tcp://10.0.0.5:2375"
timeout_secs = 30

[update]
run_once = true
cleanup = true
interval_secs = 600
monitor = ["web", "api"]
ignore = ["db"]
record_retention = "accumulate"

[registry]
username = "deploy"
password = "token"

[metrics]
enabled = false
"#,
    );
    let path = file.path().to_string_lossy().into_owned();

    let config = load_config(&cli(&["--config", &path]))
        .await
        .expect("config should load");

    assert_eq!(config.general.log_level, "debug");
    assert_eq!(config.engine.host, "tcp://10.0.0.5:2375");
    assert_eq!(config.engine.timeout_secs, 30);
    assert!(config.update.run_once);
    assert!(config.update.cleanup);
    assert_eq!(config.update.interval_secs, 600);
    assert_eq!(config.update.monitor, vec!["web", "api"]);
    assert_eq!(config.update.record_retention, RecordRetention::Accumulate);
    assert_eq!(config.registry.username.as_deref(), Some("deploy"));
}

#[tokio::test]
#[serial]
async fn test_cli_overrides_file_and_env() {
    let file = write_config("[update]\ninterval_secs = 600\n");
    let path = file.path().to_string_lossy().into_owned();

    // SAFETY: serial 테스트이므로 다른 스레드가 환경변수를 읽지 않습니다.
    unsafe { std::env::set_var("REFIT_UPDATE_INTERVAL_SECS", "900") };
    let from_env = load_config(&cli(&["--config", &path])).await;
    let from_cli = load_config(&cli(&["--config", &path, "--interval", "30"])).await;
    unsafe { std::env::remove_var("REFIT_UPDATE_INTERVAL_SECS") };

    assert_eq!(from_env.expect("env config").update.interval_secs, 900);
    assert_eq!(from_cli.expect("cli config").update.interval_secs, 30);
}

#[tokio::test]
#[serial]
async fn test_missing_config_file_fails() {
    let result = load_config(&cli(&["--config", "/nonexistent/refit.toml"])).await;
    let err = result.expect_err("missing file should fail");
    assert!(err.to_string().contains("failed to load config"));
}

#[tokio::test]
#[serial]
async fn test_overlapping_filters_rejected_at_startup() {
    let result = load_config(&cli(&["--monitor", "web,api", "--ignore", "api"])).await;
    let err = result.expect_err("overlap should fail validation");
    assert!(err.to_string().contains("api"));
}

#[tokio::test]
#[serial]
async fn test_invalid_interval_rejected() {
    let result = load_config(&cli(&["--interval", "0"])).await;
    assert!(result.is_err());
}

#[tokio::test]
#[serial]
async fn test_unsupported_engine_scheme_rejected_at_startup() {
    for host in ["tcps://docker.internal:2376", "ssh://root@host"] {
        let err = load_config(&cli(&["--host", host]))
            .await
            .expect_err("unsupported scheme should fail validation");
        assert!(err.to_string().contains("engine.host"));
    }
}

#[tokio::test]
#[serial]
async fn test_invalid_toml_fails() {
    let file = write_config("[update\ninterval_secs = ");
    let path = file.path().to_string_lossy().into_owned();
    assert!(load_config(&cli(&["--config", &path])).await.is_err());
}

#[tokio::test]
#[serial]
async fn test_registry_env_vars_feed_cli() {
    // SAFETY: serial 테스트이므로 다른 스레드가 환경변수를 읽지 않습니다.
    unsafe {
        std::env::set_var("REPO_USER", "ci-bot");
        std::env::set_var("REPO_PASS", "hunter2");
    }
    let parsed = cli(&[]);
    unsafe {
        std::env::remove_var("REPO_USER");
        std::env::remove_var("REPO_PASS");
    }

    let config = load_config(&parsed).await.expect("config should load");
    assert_eq!(config.registry.username.as_deref(), Some("ci-bot"));
    assert_eq!(config.registry.password.as_deref(), Some("hunter2"));
}
