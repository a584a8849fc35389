//! Decisions taken after a failed attempt.

use crate::backoff::IntervalFunction;
use std::sync::Arc;
use std::time::Duration;

/// Determines whether an error should be retried.
pub type RetryPredicate<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;

/// Outcome of [`RetryPolicy::decide`] for one failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// The error is not retryable and is returned as-is.
    Ignore,
    /// The failed attempt was the last one allowed.
    Exhausted,
    /// Wait for the delay, then run the next attempt.
    RetryAfter(Duration),
}

/// The attempt limit, backoff and retryable-error filter of a call site.
///
/// Built by [`RetryConfigBuilder`](crate::RetryConfigBuilder); shared
/// read-only by every execution using the configuration.
pub struct RetryPolicy<E> {
    max_attempts: usize,
    backoff: Arc<dyn IntervalFunction>,
    retryable: Option<RetryPredicate<E>>,
}

impl<E> RetryPolicy<E> {
    pub(crate) fn new(
        max_attempts: usize,
        backoff: Arc<dyn IntervalFunction>,
        retryable: Option<RetryPredicate<E>>,
    ) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
            retryable,
        }
    }

    /// Returns the maximum number of attempts, including the first.
    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Returns `true` if `error` may be retried. Without a filter every error
    /// is retryable.
    pub fn is_retryable(&self, error: &E) -> bool {
        match &self.retryable {
            Some(retryable) => retryable(error),
            None => true,
        }
    }

    /// Returns the wait after attempt number `attempt` (1-based) fails.
    pub fn delay_after(&self, attempt: usize) -> Duration {
        self.backoff.next_interval(attempt.saturating_sub(1))
    }

    /// Decides how to continue after attempt number `attempt` failed with
    /// `error`.
    ///
    /// A non-retryable error is ignored even on the last attempt.
    pub fn decide(&self, attempt: usize, error: &E) -> RetryDecision {
        if !self.is_retryable(error) {
            RetryDecision::Ignore
        } else if attempt >= self.max_attempts {
            RetryDecision::Exhausted
        } else {
            RetryDecision::RetryAfter(self.delay_after(attempt))
        }
    }

    pub(crate) fn is_filtered(&self) -> bool {
        self.retryable.is_some()
    }
}

impl<E> Clone for RetryPolicy<E> {
    fn clone(&self) -> Self {
        Self {
            max_attempts: self.max_attempts,
            backoff: Arc::clone(&self.backoff),
            retryable: self.retryable.clone(),
        }
    }
}
