//! Isolated-environment detection configuration.

use serde::{Deserialize, Serialize};

/// Markers checked when none are configured, highest priority first.
pub const DEFAULT_MARKERS: &[&str] = &["env:VIRTUAL_ENV", "env:CONDA_PREFIX", "file:.venv/pyvenv.cfg"];

/// Configuration for `VenvManager`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// Ordered marker specs: `env:NAME` or `file:relative/or/absolute/path`.
    #[serde(default)]
    pub markers: Vec<String>,
}

impl EnvironmentConfig {
    pub fn effective_markers(&self) -> Vec<String> {
        if self.markers.is_empty() {
            DEFAULT_MARKERS.iter().map(|m| m.to_string()).collect()
        } else {
            self.markers.clone()
        }
    }
}
