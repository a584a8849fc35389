use callguard_core::{PolicyKey, ResilienceError};
use thiserror::Error;

/// Returned when a circuit breaker rejects a call without running it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("circuit '{key}' is open; call not permitted")]
pub struct CircuitOpenError {
    key: PolicyKey,
}

impl CircuitOpenError {
    pub(crate) fn new(key: PolicyKey) -> Self {
        Self { key }
    }

    /// Returns the key of the open circuit.
    pub fn key(&self) -> &PolicyKey {
        &self.key
    }
}

impl<E> From<CircuitOpenError> for ResilienceError<E> {
    fn from(err: CircuitOpenError) -> Self {
        ResilienceError::CircuitOpen { key: err.key }
    }
}
