//! Tests for the fallback policy.
//!
//! Test organization:
//! - integration.rs: Routing between primary and fallback operations
