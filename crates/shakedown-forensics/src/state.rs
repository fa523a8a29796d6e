//! Per-iteration lifecycle.

use std::fmt;

use serde::{Deserialize, Serialize};

/// `Pending → Running → {Completed, TimedOut, Failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IterationState {
    Pending,
    Running,
    Completed,
    TimedOut,
    Failed,
}

impl IterationState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::TimedOut | Self::Failed)
    }

    pub fn can_transition_to(self, next: IterationState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Running)
                | (Self::Running, Self::Completed)
                | (Self::Running, Self::TimedOut)
                | (Self::Running, Self::Failed)
        )
    }

    /// True for the outcomes that make the next iteration escalate.
    pub fn is_bad(self) -> bool {
        matches!(self, Self::TimedOut | Self::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::TimedOut => "timed_out",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for IterationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
