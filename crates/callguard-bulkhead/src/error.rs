//! Error types for the bulkhead policy.

use callguard_core::{PolicyKey, ResilienceError};
use std::time::Duration;

/// Failures introduced by a bulkhead.
///
/// A failure of the wrapped operation is never converted into a
/// `BulkheadError`; it is returned unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BulkheadError {
    /// No permit became available within the wait timeout.
    #[error(
        "bulkhead '{key}' is full: no permit within {wait_timeout:?} (max concurrent calls {max_concurrent_calls})"
    )]
    ResourceExhausted {
        /// Key of the saturated bulkhead.
        key: PolicyKey,
        /// Permit capacity of the bulkhead.
        max_concurrent_calls: usize,
        /// How long the call waited before giving up.
        wait_timeout: Duration,
    },
    /// The caller cancelled while waiting for a permit.
    #[error("cancelled while waiting for a permit from bulkhead '{key}'")]
    Cancelled {
        /// Key of the bulkhead that was being waited on.
        key: PolicyKey,
    },
}

impl BulkheadError {
    /// Returns `true` if the bulkhead was saturated.
    pub fn is_resource_exhausted(&self) -> bool {
        matches!(self, BulkheadError::ResourceExhausted { .. })
    }

    /// Returns `true` if the wait was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, BulkheadError::Cancelled { .. })
    }

    /// Returns the key of the bulkhead that produced this error.
    pub fn key(&self) -> &PolicyKey {
        match self {
            BulkheadError::ResourceExhausted { key, .. } | BulkheadError::Cancelled { key } => key,
        }
    }
}

/// Result type for bulkhead operations.
pub type Result<T> = std::result::Result<T, BulkheadError>;

// Conversion to ResilienceError for zero-boilerplate error handling
impl<E> From<BulkheadError> for ResilienceError<E> {
    fn from(err: BulkheadError) -> Self {
        match err {
            BulkheadError::ResourceExhausted {
                key,
                max_concurrent_calls,
                ..
            } => ResilienceError::ResourceExhausted {
                key,
                max_concurrent: max_concurrent_calls,
            },
            BulkheadError::Cancelled { .. } => ResilienceError::Cancelled { layer: "bulkhead" },
        }
    }
}
