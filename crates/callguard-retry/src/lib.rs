//! Retry policy with pluggable backoff.
//!
//! [`Retry`] re-runs an operation until it succeeds, the error is not
//! retryable, or the attempt limit is reached. Between attempts it waits for
//! the delay computed by the configured [`IntervalFunction`].
//!
//! - A success is returned immediately.
//! - An error the retry predicate rejects is returned immediately, without
//!   waiting.
//! - When the last attempt fails, its error is returned unchanged.
//!
//! Retry keeps no state between calls.
//!
//! # Basic Example
//!
//! ```rust
//! use callguard_retry::{Retry, RetryConfig};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let config = RetryConfig::<String>::builder()
//!     .max_attempts(3)
//!     .fixed_backoff(Duration::from_millis(10))
//!     .build();
//!
//! let calls = AtomicUsize::new(0);
//! let result = Retry::new()
//!     .execute(&config, || async {
//!         if calls.fetch_add(1, Ordering::SeqCst) < 2 {
//!             Err("connection reset".to_string())
//!         } else {
//!             Ok("connected")
//!         }
//!     })
//!     .await;
//!
//! assert_eq!(result, Ok("connected"));
//! assert_eq!(calls.load(Ordering::SeqCst), 3);
//! # }
//! ```
//!
//! # Backoff Strategies
//!
//! ```rust
//! use callguard_retry::{ExponentialBackoff, RetryConfig};
//! use std::time::Duration;
//!
//! let config = RetryConfig::<std::io::Error>::builder()
//!     .max_attempts(5)
//!     .backoff(
//!         ExponentialBackoff::new(Duration::from_millis(100))
//!             .multiplier(2.0)
//!             .max_interval(Duration::from_secs(5)),
//!     )
//!     .build();
//! # let _ = config;
//! ```

use std::convert::Infallible;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

pub use backoff::{
    ExponentialBackoff, ExponentialRandomBackoff, FixedInterval, FnInterval, IntervalFunction,
};
pub use config::{RetryConfig, RetryConfigBuilder};
pub use error::RetryError;
pub use events::RetryEvent;
pub use policy::{RetryDecision, RetryPolicy, RetryPredicate};

mod backoff;
mod config;
mod error;
mod events;
mod policy;

/// Executes operations under a [`RetryConfig`].
///
/// Stateless; every call is driven entirely by the configuration it is given.
#[derive(Debug, Clone, Copy, Default)]
pub struct Retry;

impl Retry {
    /// Creates a new retry executor.
    pub fn new() -> Self {
        Self
    }

    /// Runs `operation` up to `config.max_attempts()` times.
    ///
    /// Returns the first success, the first non-retryable error, or the error
    /// of the final attempt.
    pub async fn execute<F, Fut, T, E>(&self, config: &RetryConfig<E>, operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let outcome = run(config, operation, |delay| async move {
            tokio::time::sleep(delay).await;
            Ok::<(), Infallible>(())
        })
        .await;

        match outcome {
            Ok(result) => result,
            Err(interrupted) => match interrupted.reason {},
        }
    }

    /// Like [`execute`](Self::execute), but a backoff wait is abandoned as
    /// soon as `cancel` fires.
    ///
    /// A cancelled wait yields [`RetryError::Cancelled`] converted into `E`;
    /// no further attempts are made. An attempt already running is not
    /// interrupted.
    pub async fn execute_cancellable<F, Fut, T, E>(
        &self,
        config: &RetryConfig<E>,
        cancel: &CancellationToken,
        operation: F,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<RetryError>,
    {
        let outcome = run(config, operation, |delay| async move {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(()),
                _ = tokio::time::sleep(delay) => Ok(()),
            }
        })
        .await;

        match outcome {
            Ok(result) => result,
            Err(Interrupted { attempts, .. }) => Err(RetryError::Cancelled { attempts }.into()),
        }
    }
}

/// A backoff wait that was cut short.
struct Interrupted<X> {
    reason: X,
    attempts: usize,
}

async fn run<F, Fut, T, E, W, WFut, X>(
    config: &RetryConfig<E>,
    mut operation: F,
    mut wait: W,
) -> Result<Result<T, E>, Interrupted<X>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    W: FnMut(Duration) -> WFut,
    WFut: Future<Output = Result<(), X>>,
{
    let policy = &config.policy;
    let mut attempt = 1;

    loop {
        let error = match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(name = %config.name, attempts = attempt, "retry succeeded");
                }

                config.event_listeners.emit(&RetryEvent::Success {
                    name: config.name.clone(),
                    timestamp: Instant::now(),
                    attempts: attempt,
                });
                return Ok(Ok(value));
            }
            Err(error) => error,
        };

        let delay = match policy.decide(attempt, &error) {
            RetryDecision::RetryAfter(delay) => delay,
            RetryDecision::Ignore => {
                #[cfg(feature = "tracing")]
                tracing::debug!(name = %config.name, attempt, "error not retryable");

                config.event_listeners.emit(&RetryEvent::IgnoredError {
                    name: config.name.clone(),
                    timestamp: Instant::now(),
                    attempt,
                });
                return Ok(Err(error));
            }
            RetryDecision::Exhausted => {
                #[cfg(feature = "tracing")]
                tracing::warn!(name = %config.name, attempts = attempt, "retries exhausted");

                config.event_listeners.emit(&RetryEvent::Error {
                    name: config.name.clone(),
                    timestamp: Instant::now(),
                    attempts: attempt,
                });
                return Ok(Err(error));
            }
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(name = %config.name, attempt, ?delay, "attempt failed, backing off");

        config.event_listeners.emit(&RetryEvent::Retry {
            name: config.name.clone(),
            timestamp: Instant::now(),
            attempt,
            delay,
        });

        if let Err(reason) = wait(delay).await {
            #[cfg(feature = "tracing")]
            tracing::debug!(name = %config.name, attempts = attempt, "retry cancelled during backoff");

            config.event_listeners.emit(&RetryEvent::Cancelled {
                name: config.name.clone(),
                timestamp: Instant::now(),
                attempts: attempt,
            });
            return Err(Interrupted {
                reason,
                attempts: attempt,
            });
        }

        attempt += 1;
    }
}
