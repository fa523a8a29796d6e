//! Environment marker probe errors.

use std::path::PathBuf;

use super::error_code::{self, ShakedownErrorCode};

/// A marker that could not be evaluated.
///
/// Never fatal: `VenvManager` downgrades it to a negative marker and
/// records the message as a warning on the environment state.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("Environment marker {path} unreadable: {source}")]
    MarkerUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ShakedownErrorCode for ProbeError {
    fn error_code(&self) -> &'static str {
        error_code::ENVIRONMENT_INCONCLUSIVE
    }
}
