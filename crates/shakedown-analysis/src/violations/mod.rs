//! Violation model and the multi-pattern aggregator.

pub mod aggregator;
pub mod patterns;
pub mod structured_block;
pub mod summary;
pub mod types;

pub use aggregator::{ParseOutcome, ViolationAggregator};
pub use patterns::{LinePattern, RuleStyle};
pub use summary::{SeverityCounts, ViolationSummary};
pub use types::*;
