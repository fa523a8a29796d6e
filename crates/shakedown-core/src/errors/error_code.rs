//! ShakedownErrorCode trait for machine-readable error reporting.

/// Every error enum implements this to provide a stable error code string
/// that scripts consuming the harness output can match on.
pub trait ShakedownErrorCode {
    /// Returns the error code string (e.g., "CONFIG_ERROR").
    fn error_code(&self) -> &'static str;

    /// Returns the tagged error string: `[ERROR_CODE] message`.
    fn tagged_string(&self) -> String
    where
        Self: std::fmt::Display,
    {
        format!("[{}] {}", self.error_code(), self)
    }
}

pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
pub const ENVIRONMENT_INCONCLUSIVE: &str = "ENVIRONMENT_INCONCLUSIVE";
pub const SPAWN_FAILED: &str = "SPAWN_FAILED";
pub const PROCESS_IO: &str = "PROCESS_IO";
pub const LOG_ARTIFACT_ERROR: &str = "LOG_ARTIFACT_ERROR";
pub const INVALID_REQUEST: &str = "INVALID_REQUEST";
