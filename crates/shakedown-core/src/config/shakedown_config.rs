//! Top-level Shakedown configuration with layered resolution.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::forensic_config::MAX_TIMEOUT_SECONDS;
use super::{CoverageConfig, EnvironmentConfig, ForensicConfig, TestRunSection};
use crate::errors::ConfigError;

/// Project config file name, looked up in the project root.
pub const PROJECT_CONFIG_FILE: &str = "shakedown.toml";

/// Top-level configuration aggregating all sections.
///
/// Resolution order (highest priority first):
/// 1. CLI flags (applied via `apply_cli_overrides`)
/// 2. Environment variables (`SHAKEDOWN_*`)
/// 3. Project config (`shakedown.toml` in project root)
/// 4. User config (`~/.shakedown/config.toml`)
/// 5. Compiled defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ShakedownConfig {
    pub test_run: TestRunSection,
    pub coverage: CoverageConfig,
    /// Scope name → path prefixes passed to the wrapped command.
    pub scopes: BTreeMap<String, Vec<String>>,
    pub forensics: ForensicConfig,
    pub environment: EnvironmentConfig,
}

/// CLI override arguments that can be applied to a config.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub test_timeout_ms: Option<u64>,
    pub coverage_enabled: Option<bool>,
    pub iterations: Option<u32>,
    pub base_timeout_seconds: Option<u64>,
    pub delay_ms: Option<u64>,
    pub log_dir: Option<String>,
}

impl ShakedownConfig {
    /// Load configuration with layered resolution.
    ///
    /// Resolution order (highest priority first):
    /// 1. CLI flags
    /// 2. Environment variables (`SHAKEDOWN_*`)
    /// 3. Project config (`shakedown.toml` in `root`)
    /// 4. User config (`~/.shakedown/config.toml`)
    /// 5. Compiled defaults
    pub fn load(root: &Path, cli_overrides: Option<&CliOverrides>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Layer 4 (lowest priority): user config
        if let Some(user_config_path) = Self::user_config_path() {
            if user_config_path.exists() {
                match Self::merge_toml_file(&mut config, &user_config_path) {
                    Ok(()) => {}
                    Err(err @ ConfigError::ParseError { .. }) => return Err(err),
                    Err(err) => {
                        tracing::warn!(
                            path = %user_config_path.display(),
                            error = %err,
                            "ignoring unreadable user config"
                        );
                    }
                }
            }
        }

        // Layer 3: project config
        let project_config_path = root.join(PROJECT_CONFIG_FILE);
        if project_config_path.exists() {
            Self::merge_toml_file(&mut config, &project_config_path)?;
        }

        // Layer 2: environment variables
        Self::apply_env_overrides(&mut config);

        // Layer 1 (highest priority): CLI flags
        if let Some(cli) = cli_overrides {
            Self::apply_cli_overrides(&mut config, cli);
        }

        Self::validate(&config)?;

        Ok(config)
    }

    /// Load configuration from a TOML string (for testing).
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })
    }

    /// Validate the configuration values.
    pub fn validate(config: &ShakedownConfig) -> Result<(), ConfigError> {
        if let Some(threshold) = config.coverage.threshold_percent {
            if threshold > 100 {
                return Err(ConfigError::ValidationFailed {
                    field: "coverage.threshold_percent".to_string(),
                    message: "must be between 0 and 100".to_string(),
                });
            }
        }
        if config.test_run.timeout_ms == Some(0) {
            return Err(ConfigError::ValidationFailed {
                field: "test_run.timeout_ms".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if config.forensics.iterations == Some(0) {
            return Err(ConfigError::ValidationFailed {
                field: "forensics.iterations".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if config.forensics.base_timeout_seconds == Some(0) {
            return Err(ConfigError::ValidationFailed {
                field: "forensics.base_timeout_seconds".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if config.forensics.baseline_seconds == Some(0) {
            return Err(ConfigError::ValidationFailed {
                field: "forensics.baseline_seconds".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        for (field, value) in [
            (
                "forensics.base_timeout_seconds",
                config.forensics.base_timeout_seconds,
            ),
            ("forensics.baseline_seconds", config.forensics.baseline_seconds),
        ] {
            if value.is_some_and(|v| v > MAX_TIMEOUT_SECONDS) {
                return Err(ConfigError::ValidationFailed {
                    field: field.to_string(),
                    message: format!("must be at most {MAX_TIMEOUT_SECONDS} seconds"),
                });
            }
        }
        if let Some(margin) = config.forensics.safety_margin_percent {
            if margin > 1000 {
                return Err(ConfigError::ValidationFailed {
                    field: "forensics.safety_margin_percent".to_string(),
                    message: "must be at most 1000".to_string(),
                });
            }
        }
        for marker in &config.environment.markers {
            if !(marker.starts_with("env:") || marker.starts_with("file:")) {
                return Err(ConfigError::ValidationFailed {
                    field: "environment.markers".to_string(),
                    message: format!("'{marker}' must start with 'env:' or 'file:'"),
                });
            }
        }
        Ok(())
    }

    /// Returns the user config path: `~/.shakedown/config.toml`.
    fn user_config_path() -> Option<PathBuf> {
        dirs_path().map(|d| d.join("config.toml"))
    }

    /// Merge a TOML file into the existing config.
    /// Unknown keys are silently ignored (forward-compatible).
    fn merge_toml_file(config: &mut ShakedownConfig, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        let file_config: ShakedownConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        Self::merge(config, &file_config);
        Ok(())
    }

    /// Merge `other` into `base`, where `other` values override `base` values
    /// only when `other` has a value.
    fn merge(base: &mut ShakedownConfig, other: &ShakedownConfig) {
        // Test run
        if other.test_run.timeout_ms.is_some() {
            base.test_run.timeout_ms = other.test_run.timeout_ms;
        }

        // Coverage
        if other.coverage.enabled.is_some() {
            base.coverage.enabled = other.coverage.enabled;
        }
        if other.coverage.threshold_percent.is_some() {
            base.coverage.threshold_percent = other.coverage.threshold_percent;
        }
        if other.coverage.directory.is_some() {
            base.coverage.directory = other.coverage.directory.clone();
        }
        if !other.coverage.report_formats.is_empty() {
            base.coverage.report_formats = other.coverage.report_formats.clone();
        }

        // Scopes merge per name
        for (name, prefixes) in &other.scopes {
            base.scopes.insert(name.clone(), prefixes.clone());
        }

        // Forensics
        if other.forensics.iterations.is_some() {
            base.forensics.iterations = other.forensics.iterations;
        }
        if other.forensics.baseline_seconds.is_some() {
            base.forensics.baseline_seconds = other.forensics.baseline_seconds;
        }
        if other.forensics.safety_margin_percent.is_some() {
            base.forensics.safety_margin_percent = other.forensics.safety_margin_percent;
        }
        if other.forensics.base_timeout_seconds.is_some() {
            base.forensics.base_timeout_seconds = other.forensics.base_timeout_seconds;
        }
        if other.forensics.delay_ms.is_some() {
            base.forensics.delay_ms = other.forensics.delay_ms;
        }
        if other.forensics.log_dir.is_some() {
            base.forensics.log_dir = other.forensics.log_dir.clone();
        }
        if !other.forensics.tools.is_empty() {
            base.forensics.tools = other.forensics.tools.clone();
        }

        // Environment
        if !other.environment.markers.is_empty() {
            base.environment.markers = other.environment.markers.clone();
        }
    }

    /// Apply environment variable overrides.
    /// Pattern: `SHAKEDOWN_TEST_TIMEOUT_MS`, `SHAKEDOWN_ITERATIONS`, etc.
    /// Unparseable values are ignored.
    fn apply_env_overrides(config: &mut ShakedownConfig) {
        if let Ok(val) = std::env::var("SHAKEDOWN_TEST_TIMEOUT_MS") {
            if let Ok(v) = val.parse::<u64>() {
                config.test_run.timeout_ms = Some(v);
            }
        }
        if let Ok(val) = std::env::var("SHAKEDOWN_COVERAGE_ENABLED") {
            if let Ok(v) = val.parse::<bool>() {
                config.coverage.enabled = Some(v);
            }
        }
        if let Ok(val) = std::env::var("SHAKEDOWN_COVERAGE_THRESHOLD") {
            if let Ok(v) = val.parse::<u32>() {
                config.coverage.threshold_percent = Some(v);
            }
        }
        if let Ok(val) = std::env::var("SHAKEDOWN_COVERAGE_DIR") {
            config.coverage.directory = Some(val);
        }
        if let Ok(val) = std::env::var("SHAKEDOWN_ITERATIONS") {
            if let Ok(v) = val.parse::<u32>() {
                config.forensics.iterations = Some(v);
            }
        }
        if let Ok(val) = std::env::var("SHAKEDOWN_BASE_TIMEOUT_SECS") {
            if let Ok(v) = val.parse::<u64>() {
                config.forensics.base_timeout_seconds = Some(v);
            }
        }
        if let Ok(val) = std::env::var("SHAKEDOWN_LOG_DIR") {
            config.forensics.log_dir = Some(val);
        }
    }

    /// Apply CLI overrides (highest priority).
    fn apply_cli_overrides(config: &mut ShakedownConfig, cli: &CliOverrides) {
        if let Some(v) = cli.test_timeout_ms {
            config.test_run.timeout_ms = Some(v);
        }
        if let Some(v) = cli.coverage_enabled {
            config.coverage.enabled = Some(v);
        }
        if let Some(v) = cli.iterations {
            config.forensics.iterations = Some(v);
        }
        if let Some(v) = cli.base_timeout_seconds {
            config.forensics.base_timeout_seconds = Some(v);
        }
        if let Some(v) = cli.delay_ms {
            config.forensics.delay_ms = Some(v);
        }
        if let Some(ref v) = cli.log_dir {
            config.forensics.log_dir = Some(v.clone());
        }
    }

    /// Serialize the config back to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            path: "<serialization>".to_string(),
            message: e.to_string(),
        })
    }
}

/// Returns the user-level config directory: `~/.shakedown/`.
fn dirs_path() -> Option<PathBuf> {
    home_dir().map(|h| h.join(".shakedown"))
}

/// Cross-platform home directory resolution.
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}
