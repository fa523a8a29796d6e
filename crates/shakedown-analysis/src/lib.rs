//! Violation extraction for the Shakedown QA harness.
//!
//! Static-analysis tools disagree on output format. [`violations`] turns
//! their raw text into one ordered sequence of [`violations::ViolationRecord`]s.

pub mod violations;
