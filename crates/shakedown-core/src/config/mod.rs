//! Configuration system for Shakedown.
//! TOML-based, layered resolution: CLI > env > project > user > defaults.

pub mod coverage_config;
pub mod environment_config;
pub mod forensic_config;
pub mod shakedown_config;
pub mod test_run_config;

pub use coverage_config::CoverageConfig;
pub use environment_config::EnvironmentConfig;
pub use forensic_config::ForensicConfig;
pub use shakedown_config::{CliOverrides, ShakedownConfig};
pub use test_run_config::{CoverageSettings, TestRunConfig, TestRunSection};
