//! Test-run settings and the immutable snapshot shared by command wrappers.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::ShakedownConfig;
use crate::errors::ConfigError;

pub const DEFAULT_TEST_TIMEOUT_MS: u64 = 30_000;

/// Default scope name → path prefixes.
pub const DEFAULT_SCOPES: &[(&str, &[&str])] = &[
    ("unit", &["tests/unit"]),
    ("integration", &["tests/integration"]),
    ("e2e", &["tests/e2e"]),
];

/// `[test_run]` section of `shakedown.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TestRunSection {
    /// Per-test timeout handed to the wrapped runner. Default: 30000.
    pub timeout_ms: Option<u64>,
}

impl TestRunSection {
    pub fn effective_timeout_ms(&self) -> u64 {
        self.timeout_ms.unwrap_or(DEFAULT_TEST_TIMEOUT_MS)
    }
}

/// Resolved coverage settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoverageSettings {
    pub enabled: bool,
    pub threshold_percent: u32,
    pub directory: PathBuf,
    pub report_formats: BTreeSet<String>,
}

/// Read-only limits shared by every wrapper that executes a test or lint
/// command.
///
/// Built once from the layered [`ShakedownConfig`] before any wrapper runs.
/// There are no setters; share it behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestRunConfig {
    timeout_ms: u64,
    coverage: CoverageSettings,
    scope_patterns: BTreeMap<String, Vec<String>>,
}

impl TestRunConfig {
    /// Freeze the test-run slice of a resolved configuration.
    pub fn from_config(config: &ShakedownConfig) -> Self {
        let mut scope_patterns: BTreeMap<String, Vec<String>> = DEFAULT_SCOPES
            .iter()
            .map(|(name, prefixes)| {
                (
                    name.to_string(),
                    prefixes.iter().map(|p| p.to_string()).collect(),
                )
            })
            .collect();
        // Configured scopes replace defaults of the same name only.
        for (name, prefixes) in &config.scopes {
            scope_patterns.insert(name.clone(), prefixes.clone());
        }

        Self {
            timeout_ms: config.test_run.effective_timeout_ms(),
            coverage: CoverageSettings {
                enabled: config.coverage.effective_enabled(),
                threshold_percent: config.coverage.effective_threshold_percent(),
                directory: PathBuf::from(config.coverage.effective_directory()),
                report_formats: config
                    .coverage
                    .effective_report_formats()
                    .into_iter()
                    .collect(),
            },
            scope_patterns,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    pub fn is_coverage_enabled(&self) -> bool {
        self.coverage.enabled
    }

    pub fn coverage_config(&self) -> &CoverageSettings {
        &self.coverage
    }

    pub fn coverage_directory(&self) -> &Path {
        &self.coverage.directory
    }

    pub fn base_scope_patterns(&self) -> &BTreeMap<String, Vec<String>> {
        &self.scope_patterns
    }

    /// Path prefixes for one scope.
    pub fn scope(&self, name: &str) -> Result<&[String], ConfigError> {
        self.scope_patterns
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| ConfigError::UnknownScope(name.to_string()))
    }

    /// Environment variables that hand these limits to a child process.
    pub fn child_env(&self) -> Vec<(String, String)> {
        let mut vars = vec![(
            "SHAKEDOWN_TEST_TIMEOUT_MS".to_string(),
            self.timeout_ms.to_string(),
        )];
        if self.coverage.enabled {
            vars.push((
                "SHAKEDOWN_COVERAGE_DIR".to_string(),
                self.coverage.directory.display().to_string(),
            ));
            vars.push((
                "SHAKEDOWN_COVERAGE_THRESHOLD".to_string(),
                self.coverage.threshold_percent.to_string(),
            ));
        }
        vars
    }
}

impl Default for TestRunConfig {
    fn default() -> Self {
        Self::from_config(&ShakedownConfig::default())
    }
}
