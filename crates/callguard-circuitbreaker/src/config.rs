use crate::classifier::{DefaultClassifier, FnClassifier};
use crate::events::CircuitBreakerEvent;
use crate::CircuitState;
use callguard_core::{EventListeners, FnListener};
use std::time::Duration;

/// Configuration for a circuit breaker call site.
///
/// `failure_threshold` and `open_timeout` are fixed for a key the first time
/// it is used; later configurations for the same key only contribute their
/// classifier and listeners.
///
/// # Type Parameters
///
/// - `C`: The failure classifier type (`DefaultClassifier` or `FnClassifier<F>`)
#[derive(Clone)]
pub struct CircuitBreakerConfig<C = DefaultClassifier> {
    pub(crate) failure_threshold: usize,
    pub(crate) open_timeout: Duration,
    pub(crate) failure_classifier: C,
    pub(crate) event_listeners: EventListeners<CircuitBreakerEvent>,
}

impl CircuitBreakerConfig<DefaultClassifier> {
    /// Creates a new configuration builder.
    pub fn builder() -> CircuitBreakerConfigBuilder<DefaultClassifier> {
        CircuitBreakerConfigBuilder::new()
    }
}

impl<C> CircuitBreakerConfig<C> {
    /// Returns the number of failures that opens the circuit.
    pub fn failure_threshold(&self) -> usize {
        self.failure_threshold
    }

    /// Returns how long the circuit stays open after the last failure.
    pub fn open_timeout(&self) -> Duration {
        self.open_timeout
    }
}

impl Default for CircuitBreakerConfig<DefaultClassifier> {
    fn default() -> Self {
        CircuitBreakerConfigBuilder::new().build()
    }
}

impl<C> std::fmt::Debug for CircuitBreakerConfig<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreakerConfig")
            .field("failure_threshold", &self.failure_threshold)
            .field("open_timeout", &self.open_timeout)
            .field("event_listeners", &self.event_listeners.len())
            .finish_non_exhaustive()
    }
}

/// Builder for configuring a circuit breaker call site.
pub struct CircuitBreakerConfigBuilder<C> {
    failure_threshold: usize,
    open_timeout: Duration,
    failure_classifier: C,
    event_listeners: EventListeners<CircuitBreakerEvent>,
}

impl CircuitBreakerConfigBuilder<DefaultClassifier> {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self {
            failure_threshold: 3,
            open_timeout: Duration::from_millis(5000),
            failure_classifier: DefaultClassifier,
            event_listeners: EventListeners::new(),
        }
    }
}

impl<C> CircuitBreakerConfigBuilder<C> {
    /// Sets the number of consecutive failures that opens the circuit.
    ///
    /// A threshold of zero is treated as one.
    ///
    /// Default: 3
    pub fn failure_threshold(mut self, threshold: usize) -> Self {
        self.failure_threshold = threshold.max(1);
        self
    }

    /// Sets how long the circuit stays open after the most recent failure
    /// before a trial call is let through.
    ///
    /// Default: 5000 ms
    pub fn open_timeout(mut self, timeout: Duration) -> Self {
        self.open_timeout = timeout;
        self
    }

    /// Sets a custom failure classifier function.
    ///
    /// Errors for which the closure returns `false` are recorded as
    /// successes.
    ///
    /// Default: every error is a failure
    ///
    /// # Example
    /// ```rust
    /// use callguard_circuitbreaker::CircuitBreakerConfig;
    /// use std::io::{Error, ErrorKind};
    ///
    /// let config = CircuitBreakerConfig::builder()
    ///     .failure_classifier(|e: &Error| e.kind() != ErrorKind::NotFound)
    ///     .build();
    /// # let _ = config;
    /// ```
    pub fn failure_classifier<F>(self, classifier: F) -> CircuitBreakerConfigBuilder<FnClassifier<F>>
    where
        F: Send + Sync + 'static,
    {
        CircuitBreakerConfigBuilder {
            failure_threshold: self.failure_threshold,
            open_timeout: self.open_timeout,
            failure_classifier: FnClassifier::new(classifier),
            event_listeners: self.event_listeners,
        }
    }

    /// Registers a callback when the circuit breaker transitions between states.
    ///
    /// # Callback Signature
    /// `Fn(CircuitState, CircuitState)` - Called with the state the circuit is
    /// leaving and the state it is entering.
    ///
    /// # Example
    /// ```rust
    /// use callguard_circuitbreaker::{CircuitBreakerConfig, CircuitState};
    ///
    /// let config = CircuitBreakerConfig::builder()
    ///     .on_state_transition(|from, to| {
    ///         if to == CircuitState::Open {
    ///             eprintln!("circuit opened (was {:?})", from);
    ///         }
    ///     })
    ///     .build();
    /// # let _ = config;
    /// ```
    pub fn on_state_transition<F>(mut self, f: F) -> Self
    where
        F: Fn(CircuitState, CircuitState) + Send + Sync + 'static,
    {
        self.event_listeners
            .add(FnListener::new(move |event: &CircuitBreakerEvent| {
                if let CircuitBreakerEvent::StateTransition {
                    from_state,
                    to_state,
                    ..
                } = event
                {
                    f(*from_state, *to_state);
                }
            }));
        self
    }

    /// Registers a callback when a call is permitted through the circuit breaker.
    ///
    /// # Callback Signature
    /// `Fn(CircuitState)` - Called with the state the call was admitted in:
    /// `Closed`, or `HalfOpen` for a trial call.
    pub fn on_call_permitted<F>(mut self, f: F) -> Self
    where
        F: Fn(CircuitState) + Send + Sync + 'static,
    {
        self.event_listeners
            .add(FnListener::new(move |event: &CircuitBreakerEvent| {
                if let CircuitBreakerEvent::CallPermitted { state, .. } = event {
                    f(*state);
                }
            }));
        self
    }

    /// Registers a callback when a call is rejected by the circuit breaker.
    ///
    /// Calls are rejected while the circuit is open, and while a half-open
    /// trial call is in flight.
    ///
    /// # Example
    /// ```rust
    /// use callguard_circuitbreaker::CircuitBreakerConfig;
    /// use std::sync::atomic::{AtomicUsize, Ordering};
    /// use std::sync::Arc;
    ///
    /// let rejection_count = Arc::new(AtomicUsize::new(0));
    /// let counter = Arc::clone(&rejection_count);
    ///
    /// let config = CircuitBreakerConfig::builder()
    ///     .on_call_rejected(move || {
    ///         counter.fetch_add(1, Ordering::SeqCst);
    ///     })
    ///     .build();
    /// # let _ = config;
    /// ```
    pub fn on_call_rejected<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.event_listeners
            .add(FnListener::new(move |event: &CircuitBreakerEvent| {
                if matches!(event, CircuitBreakerEvent::CallRejected { .. }) {
                    f();
                }
            }));
        self
    }

    /// Registers a callback when a successful call is recorded.
    ///
    /// # Callback Signature
    /// `Fn(CircuitState)` - Called with the state the circuit was in when
    /// the outcome was recorded, before any resulting transition.
    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: Fn(CircuitState) + Send + Sync + 'static,
    {
        self.event_listeners
            .add(FnListener::new(move |event: &CircuitBreakerEvent| {
                if let CircuitBreakerEvent::SuccessRecorded { state, .. } = event {
                    f(*state);
                }
            }));
        self
    }

    /// Registers a callback when a failed call is recorded.
    ///
    /// # Callback Signature
    /// `Fn(CircuitState)` - Called with the state the circuit was in when
    /// the outcome was recorded, before any resulting transition.
    pub fn on_failure<F>(mut self, f: F) -> Self
    where
        F: Fn(CircuitState) + Send + Sync + 'static,
    {
        self.event_listeners
            .add(FnListener::new(move |event: &CircuitBreakerEvent| {
                if let CircuitBreakerEvent::FailureRecorded { state, .. } = event {
                    f(*state);
                }
            }));
        self
    }

    /// Registers a listener that receives every circuit breaker event.
    pub fn on_event<F>(mut self, f: F) -> Self
    where
        F: Fn(&CircuitBreakerEvent) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(f));
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> CircuitBreakerConfig<C> {
        CircuitBreakerConfig {
            failure_threshold: self.failure_threshold,
            open_timeout: self.open_timeout,
            failure_classifier: self.failure_classifier,
            event_listeners: self.event_listeners,
        }
    }
}

impl Default for CircuitBreakerConfigBuilder<DefaultClassifier> {
    fn default() -> Self {
        Self::new()
    }
}
