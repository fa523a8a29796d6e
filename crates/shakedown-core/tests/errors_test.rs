//! Tests for the Shakedown error types.

use std::collections::HashSet;
use std::path::PathBuf;

use shakedown_core::errors::*;

fn io_error() -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied")
}

#[test]
fn test_all_errors_have_error_code() {
    let codes: Vec<&str> = vec![
        ConfigError::UnknownScope("x".into()).error_code(),
        ProbeError::MarkerUnreadable {
            path: PathBuf::from("/venv/pyvenv.cfg"),
            source: io_error(),
        }
        .error_code(),
        RunnerError::Spawn {
            program: "pytest".into(),
            source: io_error(),
        }
        .error_code(),
        RunnerError::ProcessIo {
            program: "pytest".into(),
            message: "pipe closed".into(),
        }
        .error_code(),
        RunnerError::LogArtifact {
            path: PathBuf::from("logs/iteration-001.log"),
            source: io_error(),
        }
        .error_code(),
        RunnerError::InvalidRequest("empty command".into()).error_code(),
    ];
    assert!(codes.iter().all(|c| !c.is_empty()));
    let unique: HashSet<&str> = codes.iter().copied().collect();
    assert_eq!(unique.len(), codes.len(), "runner codes must be distinct");
}

#[test]
fn test_tagged_string_format() {
    let err = ConfigError::ValidationFailed {
        field: "forensics.iterations".into(),
        message: "must be greater than 0".into(),
    };
    assert_eq!(
        err.tagged_string(),
        "[CONFIG_ERROR] Config validation failed for forensics.iterations: must be greater than 0"
    );
}

#[test]
fn test_error_sources_preserved() {
    use std::error::Error as _;
    let err = RunnerError::Spawn {
        program: "pytest".into(),
        source: io_error(),
    };
    assert!(err.source().is_some());
    assert!(err.to_string().contains("pytest"));
}
