//! Keyed bulkhead implementation.

use crate::config::BulkheadConfig;
use crate::error::BulkheadError;
use crate::events::BulkheadEvent;
use callguard_core::{KeyedStateRegistry, PolicyKey};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;

/// Per-key bulkhead state, fixed when the key is first used.
#[derive(Debug)]
pub(crate) struct BulkheadState {
    semaphore: Arc<Semaphore>,
    max_concurrent_calls: usize,
    wait_timeout: Duration,
}

impl BulkheadState {
    fn new(config: &BulkheadConfig) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(config.max_concurrent_calls)),
            max_concurrent_calls: config.max_concurrent_calls,
            wait_timeout: config.wait_timeout,
        }
    }

    fn in_flight(&self) -> usize {
        self.max_concurrent_calls
            .saturating_sub(self.semaphore.available_permits())
    }
}

/// Limits the number of concurrent executions per call site.
///
/// Each [`PolicyKey`] gets its own fair (FIFO) semaphore the first time it is
/// used. Callers that find no free permit wait up to the key's wait timeout;
/// if none frees up they fail with [`BulkheadError::ResourceExhausted`]
/// without running the operation.
///
/// `Bulkhead` is cheap to clone; clones share their per-key state.
///
/// # Examples
///
/// ```rust
/// use callguard_bulkhead::{Bulkhead, BulkheadConfig, BulkheadError};
/// use callguard_core::PolicyKey;
/// use std::time::Duration;
///
/// # #[derive(Debug)]
/// # enum AppError { Bulkhead(BulkheadError) }
/// # impl From<BulkheadError> for AppError {
/// #     fn from(e: BulkheadError) -> Self { AppError::Bulkhead(e) }
/// # }
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let bulkhead = Bulkhead::new();
/// let config = BulkheadConfig::builder()
///     .max_concurrent_calls(4)
///     .wait_timeout(Duration::from_millis(250))
///     .build();
/// let key = PolicyKey::from("inventory#reserve");
///
/// let reserved = bulkhead
///     .execute(&key, &config, || async { Ok::<_, AppError>(42) })
///     .await;
/// assert_eq!(reserved.ok(), Some(42));
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct Bulkhead {
    states: Arc<KeyedStateRegistry<BulkheadState>>,
}

impl Bulkhead {
    /// Creates a bulkhead with no call sites.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `operation` under the bulkhead for `key`.
    pub async fn execute<F, Fut, T, E>(
        &self,
        key: &PolicyKey,
        config: &BulkheadConfig,
        operation: F,
    ) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<BulkheadError>,
    {
        self.execute_cancellable(key, config, &CancellationToken::new(), operation)
            .await
    }

    /// Runs `operation` under the bulkhead for `key`, abandoning the permit
    /// wait if `cancel` fires first.
    ///
    /// Cancellation only affects the wait. Once a permit is granted the
    /// operation runs to completion (or until the returned future is dropped).
    pub async fn execute_cancellable<F, Fut, T, E>(
        &self,
        key: &PolicyKey,
        config: &BulkheadConfig,
        cancel: &CancellationToken,
        operation: F,
    ) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<BulkheadError>,
    {
        let state = self.state_for(key, config);
        run(key, &state, config, cancel, operation).await
    }

    /// Returns a handle bound to one call site.
    ///
    /// The key's state is created (or looked up) once, so calls through the
    /// handle skip the registry.
    pub fn bind(&self, key: impl Into<PolicyKey>, config: BulkheadConfig) -> BoundBulkhead {
        let key = key.into();
        let state = self.state_for(&key, &config);
        BoundBulkhead { key, config, state }
    }

    /// Returns the number of free permits for `key`, or `None` if the key has
    /// not been used yet.
    pub fn available_permits(&self, key: &PolicyKey) -> Option<usize> {
        self.states
            .get(key)
            .map(|state| state.semaphore.available_permits())
    }

    /// Returns the permit capacity fixed for `key`, or `None` if the key has
    /// not been used yet.
    pub fn max_permits(&self, key: &PolicyKey) -> Option<usize> {
        self.states.get(key).map(|state| state.max_concurrent_calls)
    }

    /// Returns the keys that have bulkhead state.
    pub fn keys(&self) -> Vec<PolicyKey> {
        self.states.keys()
    }

    fn state_for(&self, key: &PolicyKey, config: &BulkheadConfig) -> Arc<BulkheadState> {
        self.states
            .get_or_create(key, || BulkheadState::new(config))
    }
}

/// A bulkhead bound to a single call site.
///
/// Created by [`Bulkhead::bind`].
#[derive(Clone, Debug)]
pub struct BoundBulkhead {
    key: PolicyKey,
    config: BulkheadConfig,
    state: Arc<BulkheadState>,
}

impl BoundBulkhead {
    /// Runs `operation` under this call site's bulkhead.
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<BulkheadError>,
    {
        run(
            &self.key,
            &self.state,
            &self.config,
            &CancellationToken::new(),
            operation,
        )
        .await
    }

    /// Runs `operation`, abandoning the permit wait if `cancel` fires first.
    pub async fn execute_cancellable<F, Fut, T, E>(
        &self,
        cancel: &CancellationToken,
        operation: F,
    ) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<BulkheadError>,
    {
        run(&self.key, &self.state, &self.config, cancel, operation).await
    }

    /// Returns the key this handle is bound to.
    pub fn key(&self) -> &PolicyKey {
        &self.key
    }

    /// Returns the number of free permits.
    pub fn available_permits(&self) -> usize {
        self.state.semaphore.available_permits()
    }
}

async fn run<F, Fut, T, E>(
    key: &PolicyKey,
    state: &BulkheadState,
    config: &BulkheadConfig,
    cancel: &CancellationToken,
    operation: F,
) -> Result<T, E>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: From<BulkheadError>,
{
    let permit = acquire(key, state, config, cancel).await?;

    let concurrent_calls = state.in_flight();
    config.event_listeners.emit(&BulkheadEvent::CallPermitted {
        key: key.clone(),
        timestamp: Instant::now(),
        concurrent_calls,
    });

    #[cfg(feature = "tracing")]
    tracing::debug!(key = %key, concurrent_calls, "bulkhead permit granted");

    let start = Instant::now();
    let result = operation().await;

    // Release before notifying so listeners observe the freed slot.
    drop(permit);

    let duration = start.elapsed();
    let event = match &result {
        Ok(_) => BulkheadEvent::CallFinished {
            key: key.clone(),
            timestamp: Instant::now(),
            duration,
        },
        Err(_) => BulkheadEvent::CallFailed {
            key: key.clone(),
            timestamp: Instant::now(),
            duration,
        },
    };
    config.event_listeners.emit(&event);

    result
}

async fn acquire(
    key: &PolicyKey,
    state: &BulkheadState,
    config: &BulkheadConfig,
    cancel: &CancellationToken,
) -> Result<OwnedSemaphorePermit, BulkheadError> {
    let wait = tokio::time::timeout(
        state.wait_timeout,
        Arc::clone(&state.semaphore).acquire_owned(),
    );

    tokio::select! {
        biased;

        _ = cancel.cancelled() => {
            config.event_listeners.emit(&BulkheadEvent::CallCancelled {
                key: key.clone(),
                timestamp: Instant::now(),
            });

            #[cfg(feature = "tracing")]
            tracing::debug!(key = %key, "bulkhead wait cancelled");

            Err(BulkheadError::Cancelled { key: key.clone() })
        }
        acquired = wait => match acquired {
            Ok(Ok(permit)) => Ok(permit),
            // The semaphore is never closed, so only the timeout can get here.
            Ok(Err(_)) | Err(_) => {
                config.event_listeners.emit(&BulkheadEvent::CallRejected {
                    key: key.clone(),
                    timestamp: Instant::now(),
                    max_concurrent_calls: state.max_concurrent_calls,
                });

                #[cfg(feature = "tracing")]
                tracing::warn!(
                    key = %key,
                    max_concurrent_calls = state.max_concurrent_calls,
                    wait_timeout = ?state.wait_timeout,
                    "bulkhead full, call rejected"
                );

                Err(BulkheadError::ResourceExhausted {
                    key: key.clone(),
                    max_concurrent_calls: state.max_concurrent_calls,
                    wait_timeout: state.wait_timeout,
                })
            }
        },
    }
}
