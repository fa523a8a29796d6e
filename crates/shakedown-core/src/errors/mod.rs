//! Error handling for Shakedown.
//! One error enum per subsystem, `thiserror` only, zero `anyhow`.

pub mod config_error;
pub mod error_code;
pub mod probe_error;
pub mod runner_error;

pub use config_error::ConfigError;
pub use error_code::ShakedownErrorCode;
pub use probe_error::ProbeError;
pub use runner_error::RunnerError;
