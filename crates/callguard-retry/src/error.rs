use callguard_core::ResilienceError;

/// Failures introduced by the retry policy itself.
///
/// Operation failures are never wrapped: the last attempt's error is
/// returned as-is.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RetryError {
    /// Cancellation fired during a backoff wait. No further attempts were
    /// made.
    #[error("retry cancelled after {attempts} attempt(s)")]
    Cancelled {
        /// Attempts made before the cancellation.
        attempts: usize,
    },
}

impl<E> From<RetryError> for ResilienceError<E> {
    fn from(err: RetryError) -> Self {
        match err {
            RetryError::Cancelled { .. } => ResilienceError::Cancelled { layer: "retry" },
        }
    }
}
