use crate::events::CircuitBreakerEvent;
use callguard_core::{EventListeners, PolicyKey};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Represents the state of the circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CircuitState {
    /// The circuit is closed and calls are allowed.
    Closed = 0,
    /// The circuit is open and calls are rejected.
    Open = 1,
    /// The circuit is half-open and a single trial call is allowed.
    HalfOpen = 2,
}

impl CircuitState {
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => CircuitState::Open,
            2 => CircuitState::HalfOpen,
            _ => CircuitState::Closed,
        }
    }
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CircuitState::Closed => f.write_str("closed"),
            CircuitState::Open => f.write_str("open"),
            CircuitState::HalfOpen => f.write_str("half-open"),
        }
    }
}

/// Snapshot of one key's circuit for observability.
///
/// All fields are read under the record's lock, so they describe a single
/// consistent moment.
#[derive(Debug, Clone, PartialEq)]
pub struct CircuitMetrics {
    /// Current state of the circuit.
    pub state: CircuitState,
    /// Failures recorded since the last success or reset.
    pub failure_count: usize,
    /// Failure count that opens the circuit.
    pub failure_threshold: usize,
    /// How long the circuit stays open after the last failure.
    pub open_timeout: Duration,
    /// Time since the most recent failure, if one was recorded.
    pub time_since_last_failure: Option<Duration>,
}

/// Outcome of the pre-execution check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Admission {
    Permitted,
    /// A half-open trial call, identified so that only its own completion
    /// or abandonment clears the trial slot.
    Trial(u64),
    Rejected,
}

/// Per-key record shared by every call for the key.
#[derive(Debug)]
pub(crate) struct CircuitRecord {
    circuit: Mutex<Circuit>,
    state_atomic: Arc<AtomicU8>,
}

impl CircuitRecord {
    pub(crate) fn new(failure_threshold: usize, open_timeout: Duration) -> Self {
        let state_atomic = Arc::new(AtomicU8::new(CircuitState::Closed as u8));
        Self {
            circuit: Mutex::new(Circuit::new(
                failure_threshold,
                open_timeout,
                Arc::clone(&state_atomic),
            )),
            state_atomic,
        }
    }

    /// Returns the current state without taking the lock.
    pub(crate) fn state(&self) -> CircuitState {
        CircuitState::from_u8(self.state_atomic.load(Ordering::Acquire))
    }

    pub(crate) fn lock(&self) -> parking_lot::MutexGuard<'_, Circuit> {
        self.circuit.lock()
    }
}

/// Failure-count state machine for one key.
///
/// Listeners are invoked while the record is locked; they must not call back
/// into the breaker for the same key.
#[derive(Debug)]
pub(crate) struct Circuit {
    state: CircuitState,
    state_atomic: Arc<AtomicU8>,
    failure_count: usize,
    last_failure: Option<Instant>,
    failure_threshold: usize,
    open_timeout: Duration,
    trial: Option<u64>,
    next_trial: u64,
}

impl Circuit {
    fn new(failure_threshold: usize, open_timeout: Duration, state_atomic: Arc<AtomicU8>) -> Self {
        Self {
            state: CircuitState::Closed,
            state_atomic,
            failure_count: 0,
            last_failure: None,
            failure_threshold,
            open_timeout,
            trial: None,
            next_trial: 0,
        }
    }

    pub(crate) fn state(&self) -> CircuitState {
        self.state
    }

    pub(crate) fn metrics(&self) -> CircuitMetrics {
        CircuitMetrics {
            state: self.state,
            failure_count: self.failure_count,
            failure_threshold: self.failure_threshold,
            open_timeout: self.open_timeout,
            time_since_last_failure: self.last_failure.map(|at| at.elapsed()),
        }
    }

    pub(crate) fn try_acquire(
        &mut self,
        key: &PolicyKey,
        listeners: &EventListeners<CircuitBreakerEvent>,
    ) -> Admission {
        let admission = match self.state {
            CircuitState::Closed => Admission::Permitted,
            CircuitState::Open => {
                let expired = match self.last_failure {
                    Some(at) => at.elapsed() > self.open_timeout,
                    None => true,
                };
                if expired {
                    self.transition_to(CircuitState::HalfOpen, key, listeners);
                    Admission::Trial(self.start_trial())
                } else {
                    Admission::Rejected
                }
            }
            CircuitState::HalfOpen => {
                if self.trial.is_none() {
                    Admission::Trial(self.start_trial())
                } else {
                    Admission::Rejected
                }
            }
        };

        match admission {
            Admission::Rejected => listeners.emit(&CircuitBreakerEvent::CallRejected {
                key: key.clone(),
                timestamp: std::time::Instant::now(),
            }),
            Admission::Permitted | Admission::Trial(_) => {
                listeners.emit(&CircuitBreakerEvent::CallPermitted {
                    key: key.clone(),
                    timestamp: std::time::Instant::now(),
                    state: self.state,
                })
            }
        }

        admission
    }

    /// Records a success. The circuit closes whatever state it was in.
    pub(crate) fn record_success(
        &mut self,
        key: &PolicyKey,
        listeners: &EventListeners<CircuitBreakerEvent>,
    ) {
        listeners.emit(&CircuitBreakerEvent::SuccessRecorded {
            key: key.clone(),
            timestamp: std::time::Instant::now(),
            state: self.state,
        });

        self.failure_count = 0;
        self.transition_to(CircuitState::Closed, key, listeners);
    }

    pub(crate) fn record_failure(
        &mut self,
        key: &PolicyKey,
        listeners: &EventListeners<CircuitBreakerEvent>,
    ) {
        listeners.emit(&CircuitBreakerEvent::FailureRecorded {
            key: key.clone(),
            timestamp: std::time::Instant::now(),
            state: self.state,
        });

        self.failure_count = self.failure_count.saturating_add(1);
        self.last_failure = Some(Instant::now());

        if self.state == CircuitState::HalfOpen || self.failure_count >= self.failure_threshold {
            self.transition_to(CircuitState::Open, key, listeners);
        }
    }

    /// Releases the trial slot if `trial` still holds it.
    pub(crate) fn finish_trial(&mut self, trial: u64) -> bool {
        if self.trial == Some(trial) {
            self.trial = None;
            true
        } else {
            false
        }
    }

    /// Opens the circuit as if a failure had just been recorded.
    pub(crate) fn force_open(&mut self, key: &PolicyKey) {
        self.last_failure = Some(Instant::now());
        self.transition_to(CircuitState::Open, key, &EventListeners::new());
    }

    pub(crate) fn force_closed(&mut self, key: &PolicyKey) {
        self.failure_count = 0;
        self.transition_to(CircuitState::Closed, key, &EventListeners::new());
    }

    /// Returns the circuit to its initial state.
    pub(crate) fn reset(&mut self, key: &PolicyKey) {
        self.failure_count = 0;
        self.last_failure = None;
        self.transition_to(CircuitState::Closed, key, &EventListeners::new());
    }

    fn start_trial(&mut self) -> u64 {
        let trial = self.next_trial;
        self.next_trial = self.next_trial.wrapping_add(1);
        self.trial = Some(trial);
        trial
    }

    fn transition_to(
        &mut self,
        state: CircuitState,
        key: &PolicyKey,
        listeners: &EventListeners<CircuitBreakerEvent>,
    ) {
        if self.state == state {
            return;
        }

        let from_state = self.state;

        listeners.emit(&CircuitBreakerEvent::StateTransition {
            key: key.clone(),
            timestamp: std::time::Instant::now(),
            from_state,
            to_state: state,
        });

        #[cfg(feature = "tracing")]
        tracing::info!(key = %key, from = %from_state, to = %state, "circuit state transition");

        self.state = state;
        self.state_atomic.store(state as u8, Ordering::Release);
        if state != CircuitState::HalfOpen {
            self.trial = None;
        }
    }
}
