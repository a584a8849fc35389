//! Keyed circuit breaker policy.
//!
//! A circuit breaker stops calling a dependency that keeps failing. Each call
//! site, identified by a [`PolicyKey`], has its own circuit:
//!
//! - **Closed**: calls run. Each failure increments a counter and stamps the
//!   failure time; a success resets the counter. Reaching the failure
//!   threshold opens the circuit.
//! - **Open**: calls fail immediately with [`CircuitOpenError`] until the open
//!   timeout has elapsed since the most recent failure.
//! - **Half-open**: exactly one trial call runs. Success closes the circuit,
//!   failure opens it again. Other calls are rejected while the trial is in
//!   flight.
//!
//! The admission check and the outcome update are two short critical
//! sections; the operation itself runs without holding any lock. The outcome
//! update is last-write-wins: a slow call that succeeds after other calls
//! opened the circuit closes it again.
//!
//! # Basic Example
//!
//! ```rust
//! use callguard_circuitbreaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
//! use callguard_core::{PolicyKey, ResilienceError};
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let breaker = CircuitBreaker::new();
//! let config = CircuitBreakerConfig::builder()
//!     .failure_threshold(3)
//!     .open_timeout(Duration::from_secs(10))
//!     .build();
//! let key = PolicyKey::from("payments#authorize");
//!
//! for _ in 0..3 {
//!     let _: Result<(), ResilienceError<&str>> = breaker
//!         .execute(&key, &config, || async { Err(ResilienceError::Operation("declined")) })
//!         .await;
//! }
//!
//! assert_eq!(breaker.state(&key), Some(CircuitState::Open));
//!
//! let rejected: Result<(), ResilienceError<&str>> =
//!     breaker.execute(&key, &config, || async { Ok(()) }).await;
//! assert!(rejected.unwrap_err().is_circuit_open());
//! # }
//! ```
//!
//! # Failure Classification
//!
//! By default every error counts as a failure, including a
//! [`CircuitOpenError`] coming from a nested breaker. A classifier narrows
//! that down; errors it rejects are recorded as successes:
//!
//! ```rust
//! use callguard_circuitbreaker::CircuitBreakerConfig;
//!
//! #[derive(Debug)]
//! enum LookupError {
//!     NotFound,
//!     Unavailable,
//! }
//!
//! let config = CircuitBreakerConfig::builder()
//!     .failure_classifier(|e: &LookupError| matches!(e, LookupError::Unavailable))
//!     .build();
//! # let _ = config;
//! ```

use crate::circuit::{Admission, CircuitRecord};
use callguard_core::{KeyedStateRegistry, PolicyKey};
use std::future::Future;
use std::sync::Arc;

pub use circuit::{CircuitMetrics, CircuitState};
pub use classifier::{DefaultClassifier, FailureClassifier, FnClassifier};
pub use config::{CircuitBreakerConfig, CircuitBreakerConfigBuilder};
pub use error::CircuitOpenError;
pub use events::CircuitBreakerEvent;

mod circuit;
pub mod classifier;
mod config;
mod error;
mod events;

/// Keyed circuit breaker.
///
/// Holds one circuit per [`PolicyKey`], created on first use with the
/// threshold and open timeout of the configuration passed to that call.
/// Cloning is cheap; clones share their circuits.
#[derive(Clone, Debug, Default)]
pub struct CircuitBreaker {
    records: Arc<KeyedStateRegistry<CircuitRecord>>,
}

impl CircuitBreaker {
    /// Creates a circuit breaker with no circuits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `operation` through the circuit for `key`.
    ///
    /// Returns the operation's result unchanged, or a [`CircuitOpenError`]
    /// converted into `E` if the circuit rejected the call. A rejected call
    /// never invokes `operation`.
    pub async fn execute<F, Fut, T, E, C>(
        &self,
        key: &PolicyKey,
        config: &CircuitBreakerConfig<C>,
        operation: F,
    ) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<CircuitOpenError>,
        C: FailureClassifier<E>,
    {
        let record = self.record_for(key, config);
        run(key, &record, config, operation).await
    }

    /// Returns a handle bound to one call site.
    pub fn bind<C>(
        &self,
        key: impl Into<PolicyKey>,
        config: CircuitBreakerConfig<C>,
    ) -> BoundCircuitBreaker<C> {
        let key = key.into();
        let record = self.record_for(&key, &config);
        BoundCircuitBreaker {
            key,
            config,
            record,
        }
    }

    /// Returns the state of the circuit for `key`, or `None` if the key has
    /// not been used.
    ///
    /// Reads an atomic mirror of the state, so it is safe to call from event
    /// listeners.
    pub fn state(&self, key: &PolicyKey) -> Option<CircuitState> {
        self.records.get(key).map(|record| record.state())
    }

    /// Returns whether the circuit for `key` is open.
    pub fn is_open(&self, key: &PolicyKey) -> bool {
        self.state(key) == Some(CircuitState::Open)
    }

    /// Returns a snapshot of the circuit for `key`.
    pub fn metrics(&self, key: &PolicyKey) -> Option<CircuitMetrics> {
        self.records.get(key).map(|record| record.lock().metrics())
    }

    /// Forces the circuit for `key` open, as if a failure had just been
    /// recorded. Returns `false` if the key has not been used.
    ///
    /// Forced transitions are logged but not delivered to event listeners.
    pub fn force_open(&self, key: &PolicyKey) -> bool {
        self.with_record(key, |record| record.lock().force_open(key))
    }

    /// Forces the circuit for `key` closed and clears its failure count.
    /// Returns `false` if the key has not been used.
    pub fn force_closed(&self, key: &PolicyKey) -> bool {
        self.with_record(key, |record| record.lock().force_closed(key))
    }

    /// Returns the circuit for `key` to its initial state. Returns `false` if
    /// the key has not been used.
    pub fn reset(&self, key: &PolicyKey) -> bool {
        self.with_record(key, |record| record.lock().reset(key))
    }

    /// Returns the keys that have a circuit.
    pub fn keys(&self) -> Vec<PolicyKey> {
        self.records.keys()
    }

    fn record_for<C>(&self, key: &PolicyKey, config: &CircuitBreakerConfig<C>) -> Arc<CircuitRecord> {
        self.records.get_or_create(key, || {
            CircuitRecord::new(config.failure_threshold, config.open_timeout)
        })
    }

    fn with_record(&self, key: &PolicyKey, f: impl FnOnce(&CircuitRecord)) -> bool {
        match self.records.get(key) {
            Some(record) => {
                f(&record);
                true
            }
            None => false,
        }
    }
}

/// A circuit breaker bound to a single call site.
///
/// Created by [`CircuitBreaker::bind`].
pub struct BoundCircuitBreaker<C = DefaultClassifier> {
    key: PolicyKey,
    config: CircuitBreakerConfig<C>,
    record: Arc<CircuitRecord>,
}

impl<C> BoundCircuitBreaker<C> {
    /// Runs `operation` through this call site's circuit.
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<CircuitOpenError>,
        C: FailureClassifier<E>,
    {
        run(&self.key, &self.record, &self.config, operation).await
    }

    /// Returns the key this handle is bound to.
    pub fn key(&self) -> &PolicyKey {
        &self.key
    }

    /// Returns the current state of the circuit.
    pub fn state(&self) -> CircuitState {
        self.record.state()
    }

    /// Returns a snapshot of the circuit.
    pub fn metrics(&self) -> CircuitMetrics {
        self.record.lock().metrics()
    }
}

impl<C: Clone> Clone for BoundCircuitBreaker<C> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            config: self.config.clone(),
            record: Arc::clone(&self.record),
        }
    }
}

impl<C> std::fmt::Debug for BoundCircuitBreaker<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundCircuitBreaker")
            .field("key", &self.key)
            .field("state", &self.record.state())
            .finish()
    }
}

/// Releases a half-open trial slot if the trial call is dropped before its
/// outcome is recorded.
struct TrialGuard<'a> {
    record: &'a CircuitRecord,
    trial: Option<u64>,
}

impl TrialGuard<'_> {
    fn disarm(&mut self) -> Option<u64> {
        self.trial.take()
    }
}

impl Drop for TrialGuard<'_> {
    fn drop(&mut self) {
        if let Some(trial) = self.trial.take() {
            if self.record.lock().finish_trial(trial) {
                #[cfg(feature = "tracing")]
                tracing::debug!("half-open trial abandoned, slot released");
            }
        }
    }
}

async fn run<F, Fut, T, E, C>(
    key: &PolicyKey,
    record: &CircuitRecord,
    config: &CircuitBreakerConfig<C>,
    operation: F,
) -> Result<T, E>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: From<CircuitOpenError>,
    C: FailureClassifier<E>,
{
    let admission = record.lock().try_acquire(key, &config.event_listeners);

    let trial = match admission {
        Admission::Rejected => {
            #[cfg(feature = "tracing")]
            tracing::trace!(key = %key, "circuit breaker rejected call");

            return Err(CircuitOpenError::new(key.clone()).into());
        }
        Admission::Permitted => None,
        Admission::Trial(trial) => {
            #[cfg(feature = "tracing")]
            tracing::debug!(key = %key, "circuit half-open, running trial call");

            Some(trial)
        }
    };

    let mut guard = TrialGuard { record, trial };
    let result = operation().await;

    let mut circuit = record.lock();
    match &result {
        Err(error) if config.failure_classifier.is_failure(error) => {
            circuit.record_failure(key, &config.event_listeners)
        }
        _ => circuit.record_success(key, &config.event_listeners),
    }
    if let Some(trial) = guard.disarm() {
        circuit.finish_trial(trial);
    }
    drop(circuit);

    result
}
