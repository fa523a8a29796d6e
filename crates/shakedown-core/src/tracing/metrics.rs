//! Structured field names used in tracing events across Shakedown.
//!
//! Keeping them in one place lets log queries over a forensic session use
//! the same keys regardless of which crate emitted the event.

/// Forensic iteration sequence number (1-based).
pub const ITERATION: &str = "iteration";

/// Timeout applied to an iteration, in seconds.
pub const TIMEOUT_SECONDS: &str = "timeout_seconds";

/// Wall-clock duration of an iteration, in seconds.
pub const DURATION_SECONDS: &str = "duration_seconds";

/// Terminal state of an iteration.
pub const ITERATION_STATE: &str = "state";

/// Number of violations extracted from one tool output.
pub const VIOLATION_COUNT: &str = "violation_count";

/// Number of raw output lines that matched no extraction pattern.
pub const SKIPPED_LINES: &str = "skipped_lines";
