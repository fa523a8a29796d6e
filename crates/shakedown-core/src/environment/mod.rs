//! Isolated tool environment detection and tool resolution.
//!
//! [`VenvManager`] is the only component that decides whether the process
//! runs inside an isolated environment. Everything else reads that decision
//! through [`EnvironmentVerdict`] and must never probe markers itself.

pub mod availability;
pub mod markers;
pub mod probe;
pub mod state;
pub mod venv_manager;

pub use availability::{ToolAvailability, ToolAvailabilityChecker, ToolAvailabilityTable};
pub use markers::{EnvironmentMarker, MarkerSource, SystemMarkers};
pub use probe::{EnvironmentProbe, ProbeHit};
pub use state::{DetectedBy, EnvironmentState};
pub use venv_manager::{EnvironmentVerdict, VenvManager};
