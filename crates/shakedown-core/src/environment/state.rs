//! The cached environment verdict.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::markers::EnvironmentMarker;

/// Component that produced an [`EnvironmentState`]. There is exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectedBy {
    VenvManager,
}

/// Whether the process runs inside an isolated tool environment.
///
/// Only constructible inside this module tree, so `VenvManager` stays the
/// sole writer. Immutable once computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvironmentState {
    in_virtual_env: bool,
    root_path: Option<PathBuf>,
    detected_by: DetectedBy,
    source: Option<EnvironmentMarker>,
    computed_at: DateTime<Utc>,
    warnings: Vec<String>,
}

impl EnvironmentState {
    pub(super) fn detected(
        root_path: PathBuf,
        source: EnvironmentMarker,
        warnings: Vec<String>,
    ) -> Self {
        Self {
            in_virtual_env: true,
            root_path: Some(root_path),
            detected_by: DetectedBy::VenvManager,
            source: Some(source),
            computed_at: Utc::now(),
            warnings,
        }
    }

    pub(super) fn not_detected(warnings: Vec<String>) -> Self {
        Self {
            in_virtual_env: false,
            root_path: None,
            detected_by: DetectedBy::VenvManager,
            source: None,
            computed_at: Utc::now(),
            warnings,
        }
    }

    pub fn in_virtual_env(&self) -> bool {
        self.in_virtual_env
    }

    pub fn root_path(&self) -> Option<&Path> {
        self.root_path.as_deref()
    }

    pub fn detected_by(&self) -> DetectedBy {
        self.detected_by
    }

    /// The marker that produced a positive verdict, if any.
    pub fn source(&self) -> Option<&EnvironmentMarker> {
        self.source.as_ref()
    }

    pub fn computed_at(&self) -> DateTime<Utc> {
        self.computed_at
    }

    /// Inconclusive marker probes, downgraded to negatives.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}
