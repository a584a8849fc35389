//! Events emitted by the bulkhead policy.

use callguard_core::events::ResilienceEvent;
use callguard_core::PolicyKey;
use std::time::{Duration, Instant};

/// Events emitted by the bulkhead policy.
#[derive(Debug, Clone)]
pub enum BulkheadEvent {
    /// A permit was granted.
    CallPermitted {
        key: PolicyKey,
        timestamp: Instant,
        concurrent_calls: usize,
    },
    /// No permit became available within the wait timeout.
    CallRejected {
        key: PolicyKey,
        timestamp: Instant,
        max_concurrent_calls: usize,
    },
    /// A permitted call succeeded and released its permit.
    CallFinished {
        key: PolicyKey,
        timestamp: Instant,
        duration: Duration,
    },
    /// A permitted call failed and released its permit.
    CallFailed {
        key: PolicyKey,
        timestamp: Instant,
        duration: Duration,
    },
    /// The caller cancelled while waiting for a permit.
    CallCancelled { key: PolicyKey, timestamp: Instant },
}

impl ResilienceEvent for BulkheadEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::CallPermitted { .. } => "call_permitted",
            Self::CallRejected { .. } => "call_rejected",
            Self::CallFinished { .. } => "call_finished",
            Self::CallFailed { .. } => "call_failed",
            Self::CallCancelled { .. } => "call_cancelled",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            Self::CallPermitted { timestamp, .. }
            | Self::CallRejected { timestamp, .. }
            | Self::CallFinished { timestamp, .. }
            | Self::CallFailed { timestamp, .. }
            | Self::CallCancelled { timestamp, .. } => *timestamp,
        }
    }

    fn call_site(&self) -> &str {
        match self {
            Self::CallPermitted { key, .. }
            | Self::CallRejected { key, .. }
            | Self::CallFinished { key, .. }
            | Self::CallFailed { key, .. }
            | Self::CallCancelled { key, .. } => key.as_str(),
        }
    }
}
