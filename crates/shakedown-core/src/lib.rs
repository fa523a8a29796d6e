//! Core building blocks for the Shakedown QA harness.
//!
//! Layered configuration, the per-subsystem error enums, tracing setup, and
//! the single source of truth for "are we inside an isolated tool
//! environment?".

pub mod config;
pub mod environment;
pub mod errors;
pub mod tracing;
