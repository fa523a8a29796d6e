//! Forensic runner configuration.

use serde::{Deserialize, Serialize};

pub const DEFAULT_ITERATIONS: u32 = 10;
pub const DEFAULT_BASELINE_SECONDS: u64 = 48;
pub const DEFAULT_SAFETY_MARGIN_PERCENT: u32 = 25;
pub const DEFAULT_LOG_DIR: &str = "forensics-logs";
/// Upper bound accepted for `baseline_seconds` and `base_timeout_seconds`.
pub const MAX_TIMEOUT_SECONDS: u64 = 7 * 24 * 60 * 60;

/// Configuration for repeated forensic runs.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ForensicConfig {
    /// Number of sequential iterations. Default: 10.
    pub iterations: Option<u32>,
    /// Measured runtime of a healthy run, in seconds. Default: 48.
    pub baseline_seconds: Option<u64>,
    /// Margin added on top of the baseline. Default: 25.
    pub safety_margin_percent: Option<u32>,
    /// Explicit base timeout; wins over baseline + margin when set.
    pub base_timeout_seconds: Option<u64>,
    /// Pause between iterations, in milliseconds. Default: 0.
    pub delay_ms: Option<u64>,
    /// Directory receiving one log artifact per iteration.
    pub log_dir: Option<String>,
    /// Tools whose availability is recorded with every forensic report.
    #[serde(default)]
    pub tools: Vec<String>,
}

impl ForensicConfig {
    pub fn effective_iterations(&self) -> u32 {
        self.iterations.unwrap_or(DEFAULT_ITERATIONS)
    }

    /// Base timeout in seconds.
    ///
    /// Either the explicit value or `ceil(baseline * (100 + margin) / 100)`.
    pub fn effective_base_timeout_seconds(&self) -> u64 {
        if let Some(explicit) = self.base_timeout_seconds {
            return explicit;
        }
        let baseline = self.baseline_seconds.unwrap_or(DEFAULT_BASELINE_SECONDS);
        let margin = u64::from(
            self.safety_margin_percent
                .unwrap_or(DEFAULT_SAFETY_MARGIN_PERCENT),
        );
        baseline.saturating_mul(100 + margin).div_ceil(100)
    }

    pub fn effective_delay_ms(&self) -> u64 {
        self.delay_ms.unwrap_or(0)
    }

    pub fn effective_log_dir(&self) -> &str {
        self.log_dir.as_deref().unwrap_or(DEFAULT_LOG_DIR)
    }
}
