//! Coverage configuration.

use serde::{Deserialize, Serialize};

pub const DEFAULT_COVERAGE_THRESHOLD: u32 = 80;
pub const DEFAULT_COVERAGE_DIRECTORY: &str = "coverage";
pub const DEFAULT_REPORT_FORMATS: &[&str] = &["text", "lcov", "html"];

/// Coverage settings as they appear in `shakedown.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CoverageConfig {
    /// Collect coverage during test runs. Default: false.
    pub enabled: Option<bool>,
    /// Minimum line coverage percentage (0-100). Default: 80.
    pub threshold_percent: Option<u32>,
    /// Directory coverage reports are written to. Default: "coverage".
    pub directory: Option<String>,
    /// Coverage report formats. Default: text, lcov, html.
    #[serde(default)]
    pub report_formats: Vec<String>,
}

impl CoverageConfig {
    pub fn effective_enabled(&self) -> bool {
        self.enabled.unwrap_or(false)
    }

    pub fn effective_threshold_percent(&self) -> u32 {
        self.threshold_percent.unwrap_or(DEFAULT_COVERAGE_THRESHOLD)
    }

    pub fn effective_directory(&self) -> &str {
        self.directory.as_deref().unwrap_or(DEFAULT_COVERAGE_DIRECTORY)
    }

    /// Returns the configured report formats, or the defaults when none are set.
    pub fn effective_report_formats(&self) -> Vec<String> {
        if self.report_formats.is_empty() {
            DEFAULT_REPORT_FORMATS.iter().map(|f| f.to_string()).collect()
        } else {
            self.report_formats.clone()
        }
    }
}
