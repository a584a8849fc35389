//! Keyed resilience policies for async Rust.
//!
//! `callguard` bundles four policies that wrap an async operation at a call
//! site. Each policy is available as an individual crate and as a feature in
//! this meta-crate.
//!
//! # Policies
//!
//! - **Bulkhead** (`bulkhead` feature): Limits concurrent calls per call site,
//!   with a bounded, cancellable wait for a free permit
//! - **Circuit Breaker** (`circuitbreaker` feature): Fails fast on a call site
//!   whose dependency keeps failing, then probes it with a single trial call
//! - **Retry** (`retry` feature): Re-runs failed operations with pluggable
//!   backoff and failure-kind filtering
//! - **Fallback** (`fallback` feature): Runs a substitute operation when the
//!   primary fails
//!
//! Bulkhead and circuit breaker state is kept per [`PolicyKey`] in a
//! [`KeyedStateRegistry`] owned by the policy value, so call sites never share
//! permits or failure counts.
//!
//! # Usage
//!
//! Enable specific policies via features:
//!
//! ```toml
//! [dependencies]
//! callguard = { version = "0.1", features = ["circuitbreaker", "bulkhead"] }
//! ```
//!
//! Or enable all policies:
//!
//! ```toml
//! [dependencies]
//! callguard = { version = "0.1", features = ["full"] }
//! ```
//!
//! # Example
//!
//! ```rust
//! # #[cfg(all(feature = "circuitbreaker", feature = "bulkhead"))]
//! # {
//! use callguard::bulkhead::{Bulkhead, BulkheadConfig};
//! use callguard::circuitbreaker::{CircuitBreaker, CircuitBreakerConfig};
//! use callguard::{PolicyKey, ResilienceError};
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let bulkhead = Bulkhead::new();
//! let breaker = CircuitBreaker::new();
//! let bulkhead_config = BulkheadConfig::builder()
//!     .max_concurrent_calls(10)
//!     .wait_timeout(Duration::from_millis(100))
//!     .build();
//! let breaker_config = CircuitBreakerConfig::builder().failure_threshold(5).build();
//! let key = PolicyKey::from("orders#submit");
//!
//! let result: Result<u64, ResilienceError<std::io::Error>> = breaker
//!     .execute(&key, &breaker_config, || {
//!         bulkhead.execute(&key, &bulkhead_config, || async { Ok(17) })
//!     })
//!     .await;
//!
//! assert_eq!(result.ok(), Some(17));
//! # }
//! # }
//! ```
//!
//! See [`composition`] for ordering the policies.
//!
//! # Individual Crates
//!
//! Each policy is also available as a standalone crate for minimal dependencies:
//!
//! - `callguard-bulkhead`
//! - `callguard-circuitbreaker`
//! - `callguard-retry`
//! - `callguard-fallback`
//! - `callguard-core` (shared infrastructure)

// Re-export core (always available)
pub use callguard_core as core;
pub use callguard_core::{Classify, FailureKind, KeyedStateRegistry, PolicyKey, ResilienceError};

// Re-export policies based on features
#[cfg(feature = "bulkhead")]
pub use callguard_bulkhead as bulkhead;

#[cfg(feature = "circuitbreaker")]
pub use callguard_circuitbreaker as circuitbreaker;

#[cfg(feature = "fallback")]
pub use callguard_fallback as fallback;

#[cfg(feature = "retry")]
pub use callguard_retry as retry;

pub mod composition;
