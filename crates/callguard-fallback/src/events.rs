//! Events emitted by the fallback policy.

use callguard_core::{PolicyKey, ResilienceEvent};
use std::time::Instant;

/// Events emitted by the fallback policy.
#[derive(Debug, Clone)]
pub enum FallbackEvent {
    /// The primary operation succeeded; no fallback was needed.
    Success {
        /// Name of the fallback instance.
        name: PolicyKey,
        /// When the event occurred.
        timestamp: Instant,
    },

    /// The primary operation failed; the fallback will run.
    FailedAttempt {
        /// Name of the fallback instance.
        name: PolicyKey,
        /// When the event occurred.
        timestamp: Instant,
    },

    /// The fallback operation succeeded.
    Applied {
        /// Name of the fallback instance.
        name: PolicyKey,
        /// When the event occurred.
        timestamp: Instant,
        /// `"operation"` for [`execute`](crate::Fallback::execute),
        /// `"from_error"` for
        /// [`execute_with_error`](crate::Fallback::execute_with_error).
        strategy: &'static str,
    },

    /// The fallback operation failed too.
    Failed {
        /// Name of the fallback instance.
        name: PolicyKey,
        /// When the event occurred.
        timestamp: Instant,
    },

    /// The error didn't match the handle predicate; propagated as-is.
    Skipped {
        /// Name of the fallback instance.
        name: PolicyKey,
        /// When the event occurred.
        timestamp: Instant,
    },
}

impl ResilienceEvent for FallbackEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::FailedAttempt { .. } => "failed_attempt",
            Self::Applied { .. } => "applied",
            Self::Failed { .. } => "failed",
            Self::Skipped { .. } => "skipped",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            Self::Success { timestamp, .. }
            | Self::FailedAttempt { timestamp, .. }
            | Self::Applied { timestamp, .. }
            | Self::Failed { timestamp, .. }
            | Self::Skipped { timestamp, .. } => *timestamp,
        }
    }

    fn call_site(&self) -> &str {
        match self {
            Self::Success { name, .. }
            | Self::FailedAttempt { name, .. }
            | Self::Applied { name, .. }
            | Self::Failed { name, .. }
            | Self::Skipped { name, .. } => name.as_str(),
        }
    }
}
