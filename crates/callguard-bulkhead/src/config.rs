//! Configuration for the bulkhead policy.

use crate::events::BulkheadEvent;
use callguard_core::events::{EventListeners, FnListener};
use std::time::Duration;
use tokio::sync::Semaphore;

/// Configuration for a bulkhead call site.
///
/// Capacity and wait timeout are read only when a key is used for the first
/// time. Later calls for the same key keep the values fixed at creation, even
/// if they pass a different configuration. Listeners are taken from the
/// configuration of each call.
#[derive(Clone)]
pub struct BulkheadConfig {
    /// Maximum number of concurrent calls allowed.
    pub(crate) max_concurrent_calls: usize,
    /// Maximum time to wait for a permit.
    pub(crate) wait_timeout: Duration,
    /// Event listeners.
    pub(crate) event_listeners: EventListeners<BulkheadEvent>,
}

impl BulkheadConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> BulkheadConfigBuilder {
        BulkheadConfigBuilder::new()
    }

    /// Returns the configured permit capacity.
    pub fn max_concurrent_calls(&self) -> usize {
        self.max_concurrent_calls
    }

    /// Returns the configured wait timeout.
    pub fn wait_timeout(&self) -> Duration {
        self.wait_timeout
    }
}

impl Default for BulkheadConfig {
    fn default() -> Self {
        BulkheadConfigBuilder::new().build()
    }
}

impl std::fmt::Debug for BulkheadConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BulkheadConfig")
            .field("max_concurrent_calls", &self.max_concurrent_calls)
            .field("wait_timeout", &self.wait_timeout)
            .field("event_listeners", &self.event_listeners.len())
            .finish()
    }
}

/// Builder for bulkhead configuration.
pub struct BulkheadConfigBuilder {
    max_concurrent_calls: usize,
    wait_timeout: Duration,
    event_listeners: EventListeners<BulkheadEvent>,
}

impl BulkheadConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self {
            max_concurrent_calls: 2,
            wait_timeout: Duration::from_millis(1000),
            event_listeners: EventListeners::new(),
        }
    }

    /// Sets the maximum number of concurrent calls.
    ///
    /// A capacity of zero rejects every call once the wait timeout elapses.
    /// Values above [`Semaphore::MAX_PERMITS`] are clamped to it.
    ///
    /// Default: 2
    pub fn max_concurrent_calls(mut self, max: usize) -> Self {
        self.max_concurrent_calls = max.min(Semaphore::MAX_PERMITS);
        self
    }

    /// Sets the maximum time to wait for a permit.
    ///
    /// A zero timeout still grants a permit that is immediately available.
    ///
    /// Default: 1000 ms
    pub fn wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    /// Registers a callback when a call is permitted through the bulkhead.
    ///
    /// # Callback Signature
    /// `Fn(usize)` - Called with the number of calls in flight for the key,
    /// including the one just permitted.
    ///
    /// # Example
    /// ```rust
    /// use callguard_bulkhead::BulkheadConfig;
    ///
    /// let config = BulkheadConfig::builder()
    ///     .max_concurrent_calls(10)
    ///     .on_call_permitted(|concurrent| {
    ///         if concurrent >= 8 {
    ///             println!("approaching capacity: {} in flight", concurrent);
    ///         }
    ///     })
    ///     .build();
    /// # let _ = config;
    /// ```
    pub fn on_call_permitted<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let BulkheadEvent::CallPermitted {
                concurrent_calls, ..
            } = event
            {
                f(*concurrent_calls);
            }
        }));
        self
    }

    /// Registers a callback when a call is rejected because no permit became
    /// available within the wait timeout.
    ///
    /// # Callback Signature
    /// `Fn(usize)` - Called with the permit capacity of the key.
    pub fn on_call_rejected<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let BulkheadEvent::CallRejected {
                max_concurrent_calls,
                ..
            } = event
            {
                f(*max_concurrent_calls);
            }
        }));
        self
    }

    /// Registers a callback when a permitted call completes successfully.
    ///
    /// # Callback Signature
    /// `Fn(Duration)` - Called with the time from permit grant to completion.
    pub fn on_call_finished<F>(mut self, f: F) -> Self
    where
        F: Fn(Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let BulkheadEvent::CallFinished { duration, .. } = event {
                f(*duration);
            }
        }));
        self
    }

    /// Registers a callback when a permitted call fails.
    ///
    /// # Callback Signature
    /// `Fn(Duration)` - Called with the time from permit grant to failure.
    pub fn on_call_failed<F>(mut self, f: F) -> Self
    where
        F: Fn(Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let BulkheadEvent::CallFailed { duration, .. } = event {
                f(*duration);
            }
        }));
        self
    }

    /// Registers a callback when a caller cancels while waiting for a permit.
    pub fn on_call_cancelled<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let BulkheadEvent::CallCancelled { .. } = event {
                f();
            }
        }));
        self
    }

    /// Registers a listener that receives every bulkhead event.
    pub fn on_event<F>(mut self, f: F) -> Self
    where
        F: Fn(&BulkheadEvent) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(f));
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> BulkheadConfig {
        BulkheadConfig {
            max_concurrent_calls: self.max_concurrent_calls,
            wait_timeout: self.wait_timeout,
            event_listeners: self.event_listeners,
        }
    }
}

impl Default for BulkheadConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
