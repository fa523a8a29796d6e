//! Tests for the Shakedown configuration system.

use std::sync::Mutex;

use shakedown_core::config::{CliOverrides, ShakedownConfig, TestRunConfig};
use shakedown_core::errors::ConfigError;

/// Global mutex to serialize tests that modify environment variables.
static ENV_MUTEX: Mutex<()> = Mutex::new(());

fn tempdir() -> tempfile::TempDir {
    tempfile::TempDir::new().unwrap()
}

/// Clear all SHAKEDOWN_ env vars to prevent cross-test contamination.
fn clear_shakedown_env_vars() {
    for key in [
        "SHAKEDOWN_TEST_TIMEOUT_MS",
        "SHAKEDOWN_COVERAGE_ENABLED",
        "SHAKEDOWN_COVERAGE_THRESHOLD",
        "SHAKEDOWN_COVERAGE_DIR",
        "SHAKEDOWN_ITERATIONS",
        "SHAKEDOWN_BASE_TIMEOUT_SECS",
        "SHAKEDOWN_LOG_DIR",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn test_layered_resolution() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_shakedown_env_vars();

    let dir = tempdir();
    std::fs::write(
        dir.path().join("shakedown.toml"),
        r#"
[test_run]
timeout_ms = 45_000

[forensics]
iterations = 5
base_timeout_seconds = 90
"#,
    )
    .unwrap();

    std::env::set_var("SHAKEDOWN_ITERATIONS", "7");

    let cli = CliOverrides {
        base_timeout_seconds: Some(120),
        ..Default::default()
    };
    let config = ShakedownConfig::load(dir.path(), Some(&cli)).unwrap();

    // Project file beats defaults
    assert_eq!(config.test_run.effective_timeout_ms(), 45_000);
    // Env beats project
    assert_eq!(config.forensics.effective_iterations(), 7);
    // CLI beats project
    assert_eq!(config.forensics.effective_base_timeout_seconds(), 120);

    clear_shakedown_env_vars();
}

#[test]
fn test_load_missing_files_fallback() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_shakedown_env_vars();

    let dir = tempdir();
    let config = ShakedownConfig::load(dir.path(), None).unwrap();

    assert_eq!(config.test_run.effective_timeout_ms(), 30_000);
    assert_eq!(config.forensics.effective_iterations(), 10);
    // 48s baseline + 25% margin
    assert_eq!(config.forensics.effective_base_timeout_seconds(), 60);
    assert_eq!(config.forensics.effective_log_dir(), "forensics-logs");
    assert!(!config.coverage.effective_enabled());
}

#[test]
fn test_invalid_toml_syntax() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_shakedown_env_vars();

    let dir = tempdir();
    std::fs::write(dir.path().join("shakedown.toml"), "not = [valid toml").unwrap();

    match ShakedownConfig::load(dir.path(), None) {
        Err(ConfigError::ParseError { .. }) => {}
        other => panic!("Expected ParseError, got: {other:?}"),
    }
}

#[test]
fn test_validation_rejects_bad_values() {
    let cases = [
        "[coverage]\nthreshold_percent = 150",
        "[test_run]\ntimeout_ms = 0",
        "[forensics]\niterations = 0",
        "[forensics]\nbase_timeout_seconds = 0",
        "[forensics]\nbase_timeout_seconds = 604801",
        "[forensics]\nbaseline_seconds = 1000000000000000000",
        "[environment]\nmarkers = [\"registry:HKLM\"]",
    ];
    for case in cases {
        let config = ShakedownConfig::from_toml(case).unwrap();
        match ShakedownConfig::validate(&config) {
            Err(ConfigError::ValidationFailed { .. }) => {}
            other => panic!("Expected ValidationFailed for {case:?}, got: {other:?}"),
        }
    }
}

#[test]
fn test_unparseable_env_value_ignored() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_shakedown_env_vars();

    let dir = tempdir();
    std::env::set_var("SHAKEDOWN_TEST_TIMEOUT_MS", "soon");
    let config = ShakedownConfig::load(dir.path(), None).unwrap();
    assert_eq!(config.test_run.timeout_ms, None);

    clear_shakedown_env_vars();
}

#[test]
fn test_base_timeout_rounds_margin_up() {
    let config = ShakedownConfig::from_toml(
        "[forensics]\nbaseline_seconds = 10\nsafety_margin_percent = 25",
    )
    .unwrap();
    // 12.5 rounds up to 13
    assert_eq!(config.forensics.effective_base_timeout_seconds(), 13);
}

#[test]
fn test_base_timeout_saturates_on_huge_baseline() {
    let config = ShakedownConfig::from_toml(
        "[forensics]\nbaseline_seconds = 1000000000000000000\nsafety_margin_percent = 1000",
    )
    .unwrap();
    assert_eq!(
        config.forensics.effective_base_timeout_seconds(),
        u64::MAX.div_ceil(100)
    );
}

#[test]
fn test_week_long_timeout_accepted() {
    let config = ShakedownConfig::from_toml(
        "[forensics]\nbaseline_seconds = 604800\nbase_timeout_seconds = 604800",
    )
    .unwrap();
    assert!(ShakedownConfig::validate(&config).is_ok());
}

#[test]
fn test_unknown_keys_ignored() {
    let config = ShakedownConfig::from_toml(
        "[test_run]\ntimeout_ms = 1000\nfuture_option = true\n[brand_new_section]\nx = 1",
    )
    .unwrap();
    assert_eq!(config.test_run.timeout_ms, Some(1000));
}

#[test]
fn test_round_trip_through_toml() {
    let config = ShakedownConfig::from_toml(
        r#"
[coverage]
enabled = true
threshold_percent = 90
report_formats = ["lcov"]

[scopes]
smoke = ["tests/smoke"]
"#,
    )
    .unwrap();
    let serialized = config.to_toml().unwrap();
    let back = ShakedownConfig::from_toml(&serialized).unwrap();
    assert_eq!(back.coverage.threshold_percent, Some(90));
    assert_eq!(back.scopes.get("smoke"), Some(&vec!["tests/smoke".to_string()]));
}

#[test]
fn test_run_config_snapshot_defaults() {
    let snapshot = TestRunConfig::from_config(&ShakedownConfig::default());

    assert_eq!(snapshot.timeout(), std::time::Duration::from_millis(30_000));
    assert!(!snapshot.is_coverage_enabled());
    let coverage = snapshot.coverage_config();
    assert_eq!(coverage.threshold_percent, 80);
    assert_eq!(coverage.directory, std::path::PathBuf::from("coverage"));
    assert!(coverage.report_formats.contains("lcov"));
    assert_eq!(coverage.report_formats.len(), 3);

    let scopes = snapshot.base_scope_patterns();
    assert_eq!(scopes.get("unit"), Some(&vec!["tests/unit".to_string()]));
    assert!(scopes.contains_key("integration"));
    assert!(scopes.contains_key("e2e"));
}

#[test]
fn test_run_config_configured_scopes_overlay_defaults() {
    let config = ShakedownConfig::from_toml(
        "[scopes]\nunit = [\"src\", \"lib\"]\nsmoke = [\"tests/smoke\"]",
    )
    .unwrap();
    let snapshot = TestRunConfig::from_config(&config);

    assert_eq!(snapshot.scope("unit").unwrap(), ["src", "lib"]);
    assert_eq!(snapshot.scope("smoke").unwrap(), ["tests/smoke"]);
    assert_eq!(snapshot.scope("e2e").unwrap(), ["tests/e2e"]);
    assert!(matches!(
        snapshot.scope("nightly"),
        Err(ConfigError::UnknownScope(_))
    ));
}

#[test]
fn test_run_config_child_env() {
    let config = ShakedownConfig::from_toml(
        "[test_run]\ntimeout_ms = 5000\n[coverage]\nenabled = true\ndirectory = \"cov\"",
    )
    .unwrap();
    let env = TestRunConfig::from_config(&config).child_env();

    assert!(env.contains(&("SHAKEDOWN_TEST_TIMEOUT_MS".into(), "5000".into())));
    assert!(env.contains(&("SHAKEDOWN_COVERAGE_DIR".into(), "cov".into())));
    assert!(env.contains(&("SHAKEDOWN_COVERAGE_THRESHOLD".into(), "80".into())));

    let without_coverage = TestRunConfig::default().child_env();
    assert_eq!(without_coverage.len(), 1);
}
