//! Timeout escalation.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::state::IterationState;

/// Why an iteration ran under the escalated timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationTrigger {
    PreviousTimeout,
    PreviousFailure,
}

impl fmt::Display for EscalationTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PreviousTimeout => f.write_str("previous_timeout"),
            Self::PreviousFailure => f.write_str("previous_failure"),
        }
    }
}

/// Base and escalated timeout for one forensic batch.
///
/// The escalated value is the base plus half of it, rounded up, so it is
/// always strictly greater than the base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutPolicy {
    base_timeout_seconds: u64,
    escalated_timeout_seconds: u64,
}

impl TimeoutPolicy {
    /// `base_timeout_seconds` of zero is clamped to one second.
    pub fn new(base_timeout_seconds: u64) -> Self {
        let base = base_timeout_seconds.max(1);
        Self {
            base_timeout_seconds: base,
            escalated_timeout_seconds: base.saturating_add(base.div_ceil(2)),
        }
    }

    pub fn base_timeout_seconds(&self) -> u64 {
        self.base_timeout_seconds
    }

    pub fn escalated_timeout_seconds(&self) -> u64 {
        self.escalated_timeout_seconds
    }

    /// Timeout for the next iteration given how the previous one ended.
    ///
    /// `None` means this is the first iteration.
    pub fn timeout_for(
        &self,
        previous: Option<IterationState>,
    ) -> (Duration, Option<EscalationTrigger>) {
        let trigger = match previous {
            Some(IterationState::TimedOut) => Some(EscalationTrigger::PreviousTimeout),
            Some(IterationState::Failed) => Some(EscalationTrigger::PreviousFailure),
            _ => None,
        };
        let seconds = if trigger.is_some() {
            self.escalated_timeout_seconds
        } else {
            self.base_timeout_seconds
        };
        (Duration::from_secs(seconds), trigger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escalation_rounds_up() {
        assert_eq!(TimeoutPolicy::new(60).escalated_timeout_seconds(), 90);
        assert_eq!(TimeoutPolicy::new(5).escalated_timeout_seconds(), 8);
        assert_eq!(TimeoutPolicy::new(1).escalated_timeout_seconds(), 2);
    }

    #[test]
    fn zero_base_is_clamped() {
        let policy = TimeoutPolicy::new(0);
        assert_eq!(policy.base_timeout_seconds(), 1);
        assert!(policy.escalated_timeout_seconds() > policy.base_timeout_seconds());
    }

    #[test]
    fn timeout_follows_previous_state() {
        let policy = TimeoutPolicy::new(10);
        assert_eq!(policy.timeout_for(None), (Duration::from_secs(10), None));
        assert_eq!(
            policy.timeout_for(Some(IterationState::TimedOut)),
            (
                Duration::from_secs(15),
                Some(EscalationTrigger::PreviousTimeout)
            )
        );
        assert_eq!(
            policy.timeout_for(Some(IterationState::Failed)).1,
            Some(EscalationTrigger::PreviousFailure)
        );
        assert_eq!(
            policy.timeout_for(Some(IterationState::Completed)),
            (Duration::from_secs(10), None)
        );
    }
}
