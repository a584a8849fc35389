//! Failure classification for circuit breaker decisions.
//!
//! This module provides the [`FailureClassifier`] trait and implementations
//! for deciding whether an error returned by the wrapped operation counts
//! toward opening the circuit.

use std::sync::Arc;

/// Decides whether an operation error counts as a circuit failure.
///
/// Errors that are not failures are recorded as successes: they reset the
/// failure count and close a half-open circuit.
pub trait FailureClassifier<E>: Send + Sync {
    /// Returns `true` if `error` should count as a failure.
    fn is_failure(&self, error: &E) -> bool;
}

/// Default classifier: every error is a failure.
///
/// This includes [`CircuitOpenError`](crate::CircuitOpenError) values
/// propagated from a nested circuit breaker.
///
/// # Example
///
/// ```rust
/// use callguard_circuitbreaker::classifier::{DefaultClassifier, FailureClassifier};
///
/// let classifier = DefaultClassifier;
/// assert!(FailureClassifier::<std::io::Error>::is_failure(
///     &classifier,
///     &std::io::Error::other("fail")
/// ));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultClassifier;

impl<E> FailureClassifier<E> for DefaultClassifier {
    fn is_failure(&self, _error: &E) -> bool {
        true
    }
}

/// A failure classifier backed by a closure.
///
/// # Example
///
/// ```rust
/// use callguard_circuitbreaker::classifier::{FailureClassifier, FnClassifier};
/// use std::io::{Error, ErrorKind};
///
/// // Invalid input is the caller's fault, not the dependency's
/// let classifier = FnClassifier::new(|e: &Error| e.kind() != ErrorKind::InvalidInput);
///
/// assert!(classifier.is_failure(&Error::new(ErrorKind::ConnectionReset, "reset")));
/// assert!(!classifier.is_failure(&Error::new(ErrorKind::InvalidInput, "bad id")));
/// ```
#[derive(Clone)]
pub struct FnClassifier<F> {
    f: Arc<F>,
}

impl<F> FnClassifier<F> {
    /// Creates a new `FnClassifier` from the given closure.
    pub fn new(f: F) -> Self {
        Self { f: Arc::new(f) }
    }
}

impl<F, E> FailureClassifier<E> for FnClassifier<F>
where
    F: Fn(&E) -> bool + Send + Sync,
{
    fn is_failure(&self, error: &E) -> bool {
        (self.f)(error)
    }
}

impl<F> std::fmt::Debug for FnClassifier<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnClassifier")
            .field("f", &"<closure>")
            .finish()
    }
}
