//! Tests for the retry policy.
//!
//! Test organization:
//! - attempts.rs: Attempt counting and result propagation
//! - backoff.rs: Delays between attempts and cancellation
//! - failure_kinds.rs: Retrying by failure kind

mod attempts;
mod backoff;
