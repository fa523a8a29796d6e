//! Iteration records and the aggregate forensic report.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use shakedown_analysis::violations::{ViolationRecord, ViolationSummary};
use shakedown_core::environment::{EnvironmentState, ToolAvailabilityTable};

use crate::policy::{EscalationTrigger, TimeoutPolicy};
use crate::state::IterationState;

/// Outcome of one iteration.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionRecord {
    /// 1-based.
    pub sequence_number: u32,
    pub started_at: DateTime<Utc>,
    pub duration_seconds: f64,
    pub timeout_seconds: u64,
    pub escalation: Option<EscalationTrigger>,
    pub state: IterationState,
    pub exit_code: Option<i32>,
    pub signal: Option<i32>,
    pub timed_out: bool,
    pub violations: Vec<ViolationRecord>,
    /// Output lines no extraction pattern matched.
    pub skipped_lines: usize,
    /// `None` when the artifact could not be written.
    pub log_artifact_path: Option<PathBuf>,
    /// Supervision problem that turned this iteration into a failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Process exit status of the harness, derived from a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitStatus {
    Clean,
    /// Every run completed but error-severity violations were reported.
    Violations,
    /// At least one run failed or timed out.
    ProcessFailures,
    HarnessError,
}

impl ExitStatus {
    pub fn code(self) -> i32 {
        match self {
            Self::Clean => 0,
            Self::Violations => 1,
            Self::ProcessFailures => 2,
            Self::HarnessError => 3,
        }
    }
}

/// Everything a forensic batch produced.
#[derive(Debug, Clone, Serialize)]
pub struct ForensicReport {
    pub command: Vec<String>,
    pub policy: TimeoutPolicy,
    pub environment: EnvironmentState,
    pub tool_availability: ToolAvailabilityTable,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub records: Vec<ExecutionRecord>,
    pub summary: ViolationSummary,
    /// Tagged error that stopped the batch early. `records` then holds only
    /// the iterations that ran before it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aborted: Option<String>,
}

impl ForensicReport {
    pub fn count(&self, state: IterationState) -> usize {
        self.records.iter().filter(|r| r.state == state).count()
    }

    pub fn completed(&self) -> usize {
        self.count(IterationState::Completed)
    }

    pub fn timed_out(&self) -> usize {
        self.count(IterationState::TimedOut)
    }

    pub fn failed(&self) -> usize {
        self.count(IterationState::Failed)
    }

    pub fn total_skipped_lines(&self) -> usize {
        self.records.iter().map(|r| r.skipped_lines).sum()
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.is_some()
    }

    /// An aborted batch is a harness error; otherwise failures and timeouts
    /// outrank violations.
    pub fn exit_status(&self) -> ExitStatus {
        if self.is_aborted() {
            ExitStatus::HarnessError
        } else if self.records.iter().any(|r| r.state.is_bad()) {
            ExitStatus::ProcessFailures
        } else if self.summary.errors() > 0 {
            ExitStatus::Violations
        } else {
            ExitStatus::Clean
        }
    }
}
