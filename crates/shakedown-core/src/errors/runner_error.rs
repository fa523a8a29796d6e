//! Forensic runner errors.
//!
//! Timeouts and nonzero exits are iteration outcomes, not errors. Only the
//! conditions below leave the runner.

use std::path::PathBuf;

use super::error_code::{self, ShakedownErrorCode};

/// Errors that abort a forensic batch.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("Failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error while supervising '{program}': {message}")]
    ProcessIo { program: String, message: String },

    #[error("Failed to write log artifact {path}: {source}")]
    LogArtifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid forensic request: {0}")]
    InvalidRequest(String),
}

impl ShakedownErrorCode for RunnerError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Spawn { .. } => error_code::SPAWN_FAILED,
            Self::ProcessIo { .. } => error_code::PROCESS_IO,
            Self::LogArtifact { .. } => error_code::LOG_ARTIFACT_ERROR,
            Self::InvalidRequest(_) => error_code::INVALID_REQUEST,
        }
    }
}
