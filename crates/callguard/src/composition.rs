//! # Composition Guide
//!
//! Policies compose by nesting: the outer policy's operation calls the inner
//! policy's `execute`. The outermost policy sees the call first and the
//! result last.
//!
//! ```text
//! Call → [Fallback] → [Retry] → [CircuitBreaker] → [Bulkhead] → Operation
//!                                                                  ↓
//! Result ← [Fallback] ← [Retry] ← [CircuitBreaker] ← [Bulkhead] ← Result
//! ```
//!
//! ## One Error Type
//!
//! Every policy is generic over the operation's error `E` and injects its own
//! failures through `E: From<PolicyError>`. Nested policies therefore share a
//! single error type and never wrap each other's errors.
//! [`ResilienceError`](crate::ResilienceError) is a ready-made choice; an
//! application error enum with the right `From` impls works just as well.
//!
//! ## Ordering
//!
//! | Order | Effect |
//! |-------|--------|
//! | Retry outside CircuitBreaker | Every attempt is counted by the breaker; once it opens, remaining attempts fail fast with `CircuitOpen` |
//! | CircuitBreaker outside Retry | The breaker records one outcome per retried call |
//! | Bulkhead innermost | A permit is held only while the operation runs, not across backoff waits |
//! | Bulkhead outside Retry | One permit covers every attempt and backoff wait |
//! | Fallback outermost | Catches whatever escapes the other policies, including policy failures |
//!
//! Retry treats `ResourceExhausted` and `CircuitOpen` like any other error
//! unless its predicate says otherwise. Use `retry_on_kinds` with
//! [`PolicyFailure`](crate::core::PolicyFailure) kinds to leave them out.
//!
//! ## Full Stack
//!
//! ```rust
//! # #[cfg(feature = "full")]
//! # {
//! use callguard::bulkhead::{Bulkhead, BulkheadConfig};
//! use callguard::circuitbreaker::{CircuitBreaker, CircuitBreakerConfig};
//! use callguard::fallback::Fallback;
//! use callguard::retry::{Retry, RetryConfig};
//! use callguard::{PolicyKey, ResilienceError};
//! use std::time::Duration;
//!
//! type CallError = ResilienceError<String>;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let key = PolicyKey::from("quotes#latest");
//! let bulkhead = Bulkhead::new();
//! let breaker = CircuitBreaker::new();
//! let bulkhead_config = BulkheadConfig::builder().max_concurrent_calls(8).build();
//! let breaker_config = CircuitBreakerConfig::builder().failure_threshold(5).build();
//! let retry_config = RetryConfig::<CallError>::builder()
//!     .max_attempts(3)
//!     .fixed_backoff(Duration::from_millis(5))
//!     .build();
//!
//! let quote = Fallback::<CallError>::new()
//!     .execute(
//!         || {
//!             Retry.execute(&retry_config, || {
//!                 breaker.execute(&key, &breaker_config, || {
//!                     bulkhead.execute(&key, &bulkhead_config, || async {
//!                         Err::<f64, _>(ResilienceError::Operation("feed offline".to_string()))
//!                     })
//!                 })
//!             })
//!         },
//!         || async { Ok(101.5) },
//!     )
//!     .await;
//!
//! assert_eq!(quote.ok(), Some(101.5));
//! # }
//! # }
//! ```
