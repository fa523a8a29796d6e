//! Environment markers and the source they are read from.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::errors::ProbeError;

/// A process-level signal that an isolated environment is active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum EnvironmentMarker {
    /// An environment variable naming the active environment root.
    EnvVar(String),
    /// A marker file whose parent directory is the environment root.
    File(PathBuf),
}

impl EnvironmentMarker {
    /// Parse a marker spec (`env:NAME` or `file:PATH`).
    ///
    /// Relative file paths are resolved against `project_root`.
    pub fn parse(spec: &str, project_root: &Path) -> Option<Self> {
        if let Some(name) = spec.strip_prefix("env:") {
            let name = name.trim();
            return (!name.is_empty()).then(|| Self::EnvVar(name.to_string()));
        }
        if let Some(path) = spec.strip_prefix("file:") {
            let path = Path::new(path.trim());
            if path.as_os_str().is_empty() {
                return None;
            }
            let resolved = if path.is_absolute() {
                path.to_path_buf()
            } else {
                project_root.join(path)
            };
            return Some(Self::File(resolved));
        }
        None
    }

    /// Evaluate this marker against `source`.
    ///
    /// `Ok(Some(root))` is a positive match, `Ok(None)` a negative one. An
    /// `Err` means the marker exists but could not be read.
    pub fn evaluate(&self, source: &dyn MarkerSource) -> Result<Option<PathBuf>, ProbeError> {
        match self {
            Self::EnvVar(name) => Ok(source
                .env_var(name)
                .filter(|value| !value.trim().is_empty())
                .map(PathBuf::from)),
            Self::File(path) => match source.read_marker(path) {
                Ok(()) => Ok(Some(
                    path.parent().map(Path::to_path_buf).unwrap_or_else(|| path.clone()),
                )),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
                Err(source) => Err(ProbeError::MarkerUnreadable {
                    path: path.clone(),
                    source,
                }),
            },
        }
    }
}

impl fmt::Display for EnvironmentMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EnvVar(name) => write!(f, "env:{name}"),
            Self::File(path) => write!(f, "file:{}", path.display()),
        }
    }
}

/// Where marker values come from. Swappable so detection can be exercised
/// without touching the real process environment.
pub trait MarkerSource: Send + Sync {
    fn env_var(&self, name: &str) -> Option<String>;

    /// Confirm the marker file is present and readable.
    fn read_marker(&self, path: &Path) -> std::io::Result<()>;
}

/// Reads markers from the real process environment and filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemMarkers;

impl MarkerSource for SystemMarkers {
    fn env_var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }

    fn read_marker(&self, path: &Path) -> std::io::Result<()> {
        std::fs::read(path).map(|_| ())
    }
}
