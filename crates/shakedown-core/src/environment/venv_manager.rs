//! VenvManager — the single authority on isolated-environment membership.

use std::path::Path;
use std::sync::OnceLock;

use super::markers::{EnvironmentMarker, MarkerSource, SystemMarkers};
use super::state::EnvironmentState;
use crate::config::EnvironmentConfig;
use crate::errors::ShakedownErrorCode;

static GLOBAL: OnceLock<VenvManager> = OnceLock::new();

/// Read-only view of the environment verdict.
///
/// Components that need to know whether they run inside an isolated
/// environment take this trait, never a `MarkerSource`. Implementations must
/// hand out the same cached state for the whole process lifetime.
pub trait EnvironmentVerdict: Send + Sync {
    fn environment(&self) -> &EnvironmentState;

    fn is_in_virtual_environment(&self) -> bool {
        self.environment().in_virtual_env()
    }
}

/// Computes [`EnvironmentState`] lazily, once, and caches it.
///
/// Markers are checked in order; the first positive one wins. Unreadable
/// markers count as negative and leave a warning on the state. The outcome
/// is logged exactly once, when it is computed.
pub struct VenvManager {
    markers: Vec<EnvironmentMarker>,
    source: Box<dyn MarkerSource>,
    state: OnceLock<EnvironmentState>,
}

impl VenvManager {
    pub fn new(markers: Vec<EnvironmentMarker>, source: Box<dyn MarkerSource>) -> Self {
        Self {
            markers,
            source,
            state: OnceLock::new(),
        }
    }

    /// Manager reading the real environment, with markers from config.
    ///
    /// Malformed marker specs were rejected by config validation; any that
    /// slip through are skipped.
    pub fn from_config(config: &EnvironmentConfig, project_root: &Path) -> Self {
        let markers = config
            .effective_markers()
            .iter()
            .filter_map(|spec| EnvironmentMarker::parse(spec, project_root))
            .collect();
        Self::new(markers, Box::new(SystemMarkers))
    }

    /// Install `manager` as the process-wide instance.
    ///
    /// The first installed (or lazily created) manager wins; later calls get
    /// the existing one back.
    pub fn install_global(manager: VenvManager) -> &'static VenvManager {
        GLOBAL.get_or_init(|| manager)
    }

    /// The process-wide instance, created with default markers rooted at the
    /// current directory if nothing was installed.
    pub fn global() -> &'static VenvManager {
        GLOBAL.get_or_init(|| {
            let root = std::env::current_dir().unwrap_or_default();
            Self::from_config(&EnvironmentConfig::default(), &root)
        })
    }

    pub fn markers(&self) -> &[EnvironmentMarker] {
        &self.markers
    }

    /// Whether the process runs inside an isolated environment.
    pub fn is_in_virtual_environment(&self) -> bool {
        self.state().in_virtual_env()
    }

    /// The cached state, computing it on first access.
    pub fn state(&self) -> &EnvironmentState {
        self.state.get_or_init(|| self.detect())
    }

    fn detect(&self) -> EnvironmentState {
        let mut warnings = Vec::new();

        for marker in &self.markers {
            match marker.evaluate(self.source.as_ref()) {
                Ok(Some(root)) => {
                    tracing::info!(
                        source = %marker,
                        root = %root.display(),
                        "isolated environment detected"
                    );
                    return EnvironmentState::detected(root, marker.clone(), warnings);
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(
                        source = %marker,
                        code = err.error_code(),
                        error = %err,
                        "environment marker inconclusive, treating as absent"
                    );
                    warnings.push(err.to_string());
                }
            }
        }

        tracing::info!(
            markers_checked = self.markers.len(),
            "no isolated environment detected"
        );
        EnvironmentState::not_detected(warnings)
    }
}

impl EnvironmentVerdict for VenvManager {
    fn environment(&self) -> &EnvironmentState {
        self.state()
    }
}

impl std::fmt::Debug for VenvManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VenvManager")
            .field("markers", &self.markers)
            .field("state", &self.state.get())
            .finish()
    }
}
