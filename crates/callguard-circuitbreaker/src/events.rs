use crate::circuit::CircuitState;
use callguard_core::events::ResilienceEvent;
use callguard_core::PolicyKey;
use std::time::Instant;

/// Events emitted by the circuit breaker.
#[derive(Debug, Clone)]
pub enum CircuitBreakerEvent {
    /// The circuit moved from one state to another.
    StateTransition {
        key: PolicyKey,
        timestamp: Instant,
        from_state: CircuitState,
        to_state: CircuitState,
    },
    /// A call was allowed to run.
    CallPermitted {
        key: PolicyKey,
        timestamp: Instant,
        state: CircuitState,
    },
    /// A call was rejected without running.
    CallRejected { key: PolicyKey, timestamp: Instant },
    /// A call outcome was recorded as a success.
    SuccessRecorded {
        key: PolicyKey,
        timestamp: Instant,
        state: CircuitState,
    },
    /// A call outcome was recorded as a failure.
    FailureRecorded {
        key: PolicyKey,
        timestamp: Instant,
        state: CircuitState,
    },
}

impl ResilienceEvent for CircuitBreakerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CircuitBreakerEvent::StateTransition { .. } => "state_transition",
            CircuitBreakerEvent::CallPermitted { .. } => "call_permitted",
            CircuitBreakerEvent::CallRejected { .. } => "call_rejected",
            CircuitBreakerEvent::SuccessRecorded { .. } => "success_recorded",
            CircuitBreakerEvent::FailureRecorded { .. } => "failure_recorded",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            CircuitBreakerEvent::StateTransition { timestamp, .. }
            | CircuitBreakerEvent::CallPermitted { timestamp, .. }
            | CircuitBreakerEvent::CallRejected { timestamp, .. }
            | CircuitBreakerEvent::SuccessRecorded { timestamp, .. }
            | CircuitBreakerEvent::FailureRecorded { timestamp, .. } => *timestamp,
        }
    }

    fn call_site(&self) -> &str {
        match self {
            CircuitBreakerEvent::StateTransition { key, .. }
            | CircuitBreakerEvent::CallPermitted { key, .. }
            | CircuitBreakerEvent::CallRejected { key, .. }
            | CircuitBreakerEvent::SuccessRecorded { key, .. }
            | CircuitBreakerEvent::FailureRecorded { key, .. } => key.as_str(),
        }
    }
}
