//! Fallback policy.
//!
//! Runs a primary operation and, if it fails, a substitute operation whose
//! outcome is returned in its place. This is useful for:
//!
//! - Returning cached or stale data when the primary source is unavailable
//! - Providing degraded functionality instead of complete failure
//! - Routing to a backup dependency
//!
//! The fallback runs at most once and its result is returned as-is: a failing
//! fallback propagates its own error unmodified, and fallbacks are never
//! chained. If the primary succeeds the fallback is never invoked.
//!
//! # Basic Example
//!
//! ```rust
//! use callguard_fallback::Fallback;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let fallback = Fallback::<String>::new();
//!
//! let price = fallback
//!     .execute(
//!         || async { Err("pricing service down".to_string()) },
//!         || async { Ok::<_, String>(9.99) },
//!     )
//!     .await;
//!
//! assert_eq!(price, Ok(9.99));
//! # }
//! ```
//!
//! # Using the Primary Error
//!
//! ```rust
//! use callguard_fallback::Fallback;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let fallback = Fallback::<String>::new();
//!
//! let greeting = fallback
//!     .execute_with_error(
//!         || async { Err("profile unavailable".to_string()) },
//!         |error| async move { Ok::<_, String>(format!("hello, guest ({error})")) },
//!     )
//!     .await;
//!
//! assert_eq!(greeting.as_deref(), Ok("hello, guest (profile unavailable)"));
//! # }
//! ```
//!
//! # Selective Error Handling
//!
//! Only trigger fallback for specific errors:
//!
//! ```rust
//! use callguard_fallback::{Fallback, FallbackConfig};
//!
//! # #[derive(Debug, Clone)]
//! # struct MyError { retryable: bool }
//! let fallback = Fallback::with_config(
//!     FallbackConfig::builder()
//!         .name("catalog#search")
//!         .handle(|e: &MyError| e.retryable)
//!         .build(),
//! );
//! # let _ = fallback;
//! ```
//!
//! # Events
//!
//! - `Success`: Primary succeeded, no fallback needed
//! - `FailedAttempt`: Primary failed, fallback will run
//! - `Applied`: Fallback succeeded
//! - `Failed`: Fallback failed too
//! - `Skipped`: Error didn't match predicate, propagated as-is

mod config;
mod events;

pub use config::{FallbackConfig, FallbackConfigBuilder, HandlePredicate};
pub use events::FallbackEvent;

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

/// Substitute-operation dispatch on failure.
///
/// Holds no per-call state; cloning is cheap and clones share the
/// configuration.
///
/// See the [module-level documentation](crate) for usage examples.
pub struct Fallback<E> {
    config: Arc<FallbackConfig<E>>,
}

impl<E> Fallback<E> {
    /// Creates a fallback that handles every error.
    pub fn new() -> Self {
        Self::with_config(FallbackConfig::default())
    }

    /// Creates a fallback from a configuration.
    pub fn with_config(config: FallbackConfig<E>) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &FallbackConfig<E> {
        &self.config
    }

    /// Runs `primary`; if it fails with an error the configuration handles,
    /// runs `fallback` and returns its outcome instead.
    pub async fn execute<P, PFut, F, FFut, T>(&self, primary: P, fallback: F) -> Result<T, E>
    where
        P: FnOnce() -> PFut,
        PFut: Future<Output = Result<T, E>>,
        F: FnOnce() -> FFut,
        FFut: Future<Output = Result<T, E>>,
    {
        self.run(primary, |_| fallback(), "operation").await
    }

    /// Like [`execute`](Self::execute), but the fallback receives the
    /// primary's error.
    pub async fn execute_with_error<P, PFut, F, FFut, T>(
        &self,
        primary: P,
        fallback: F,
    ) -> Result<T, E>
    where
        P: FnOnce() -> PFut,
        PFut: Future<Output = Result<T, E>>,
        F: FnOnce(E) -> FFut,
        FFut: Future<Output = Result<T, E>>,
    {
        self.run(primary, fallback, "from_error").await
    }

    async fn run<P, PFut, F, FFut, T>(
        &self,
        primary: P,
        fallback: F,
        strategy: &'static str,
    ) -> Result<T, E>
    where
        P: FnOnce() -> PFut,
        PFut: Future<Output = Result<T, E>>,
        F: FnOnce(E) -> FFut,
        FFut: Future<Output = Result<T, E>>,
    {
        let config = &self.config;

        let error = match primary().await {
            Ok(value) => {
                config.event_listeners.emit(&FallbackEvent::Success {
                    name: config.name.clone(),
                    timestamp: Instant::now(),
                });
                return Ok(value);
            }
            Err(error) => error,
        };

        if !config.handles(&error) {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                fallback = %config.name,
                "Error does not match predicate, skipping fallback"
            );

            config.event_listeners.emit(&FallbackEvent::Skipped {
                name: config.name.clone(),
                timestamp: Instant::now(),
            });
            return Err(error);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(fallback = %config.name, "Primary failed, applying fallback");

        config.event_listeners.emit(&FallbackEvent::FailedAttempt {
            name: config.name.clone(),
            timestamp: Instant::now(),
        });

        match fallback(error).await {
            Ok(value) => {
                config.event_listeners.emit(&FallbackEvent::Applied {
                    name: config.name.clone(),
                    timestamp: Instant::now(),
                    strategy,
                });
                Ok(value)
            }
            Err(fallback_error) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(fallback = %config.name, "Fallback also failed");

                config.event_listeners.emit(&FallbackEvent::Failed {
                    name: config.name.clone(),
                    timestamp: Instant::now(),
                });
                Err(fallback_error)
            }
        }
    }
}

impl<E> Default for Fallback<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for Fallback<E> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
        }
    }
}

impl<E> std::fmt::Debug for Fallback<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fallback")
            .field("config", &self.config)
            .finish()
    }
}
