//! Shakedown forensics: run a command N times in sequence, escalate the
//! timeout after a bad run, keep every run's output on disk, and fold the
//! captured output into violation records.

pub mod log_artifact;
pub mod policy;
pub mod process;
pub mod record;
pub mod reporters;
pub mod runner;
pub mod state;

pub use policy::{EscalationTrigger, TimeoutPolicy};
pub use process::{CommandSpec, NativeRunner, ProcessOutput, ProcessRunner};
pub use record::{ExecutionRecord, ExitStatus, ForensicReport};
pub use runner::ForensicRunner;
pub use state::IterationState;
