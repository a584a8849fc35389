use callguard_core::events::ResilienceEvent;
use callguard_core::PolicyKey;
use std::time::{Duration, Instant};

/// Events emitted by the retry policy.
#[derive(Debug, Clone)]
pub enum RetryEvent {
    /// An attempt failed and another one will be made after `delay`.
    Retry {
        name: PolicyKey,
        timestamp: Instant,
        /// The attempt that just failed (1-indexed).
        attempt: usize,
        delay: Duration,
    },
    /// The operation succeeded (either on first try or after retries).
    Success {
        name: PolicyKey,
        timestamp: Instant,
        attempts: usize,
    },
    /// The operation failed after exhausting all attempts.
    Error {
        name: PolicyKey,
        timestamp: Instant,
        attempts: usize,
    },
    /// An error occurred but was not retried (filtered by the retry predicate).
    IgnoredError {
        name: PolicyKey,
        timestamp: Instant,
        attempt: usize,
    },
    /// A backoff wait was interrupted by cancellation.
    Cancelled {
        name: PolicyKey,
        timestamp: Instant,
        attempts: usize,
    },
}

impl ResilienceEvent for RetryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RetryEvent::Retry { .. } => "Retry",
            RetryEvent::Success { .. } => "Success",
            RetryEvent::Error { .. } => "Error",
            RetryEvent::IgnoredError { .. } => "IgnoredError",
            RetryEvent::Cancelled { .. } => "Cancelled",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            RetryEvent::Retry { timestamp, .. }
            | RetryEvent::Success { timestamp, .. }
            | RetryEvent::Error { timestamp, .. }
            | RetryEvent::IgnoredError { timestamp, .. }
            | RetryEvent::Cancelled { timestamp, .. } => *timestamp,
        }
    }

    fn call_site(&self) -> &str {
        match self {
            RetryEvent::Retry { name, .. }
            | RetryEvent::Success { name, .. }
            | RetryEvent::Error { name, .. }
            | RetryEvent::IgnoredError { name, .. }
            | RetryEvent::Cancelled { name, .. } => name.as_str(),
        }
    }
}
