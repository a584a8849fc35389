use crate::backoff::{ExponentialBackoff, FixedInterval, IntervalFunction};
use crate::events::RetryEvent;
use crate::policy::{RetryPolicy, RetryPredicate};
use callguard_core::events::{EventListeners, FnListener};
use callguard_core::{Classify, FailureKind, PolicyKey};
use std::sync::Arc;
use std::time::Duration;

/// Configuration for the retry policy.
///
/// Retry keeps no state between calls, so one configuration can be shared by
/// any number of concurrent executions.
pub struct RetryConfig<E> {
    pub(crate) policy: RetryPolicy<E>,
    pub(crate) event_listeners: EventListeners<RetryEvent>,
    pub(crate) name: PolicyKey,
}

impl<E> RetryConfig<E> {
    /// Creates a new configuration builder.
    pub fn builder() -> RetryConfigBuilder<E> {
        RetryConfigBuilder::new()
    }

    /// Returns the maximum number of attempts, including the first.
    pub fn max_attempts(&self) -> usize {
        self.policy.max_attempts()
    }

    /// Returns the name used in events and logs.
    pub fn name(&self) -> &PolicyKey {
        &self.name
    }

    /// Returns the retry policy.
    pub fn policy(&self) -> &RetryPolicy<E> {
        &self.policy
    }
}

impl<E> Clone for RetryConfig<E> {
    fn clone(&self) -> Self {
        Self {
            policy: self.policy.clone(),
            event_listeners: self.event_listeners.clone(),
            name: self.name.clone(),
        }
    }
}

impl<E> Default for RetryConfig<E> {
    fn default() -> Self {
        RetryConfigBuilder::new().build()
    }
}

impl<E> std::fmt::Debug for RetryConfig<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryConfig")
            .field("name", &self.name)
            .field("max_attempts", &self.policy.max_attempts())
            .field("filtered", &self.policy.is_filtered())
            .finish_non_exhaustive()
    }
}

/// Builder for [`RetryConfig`].
pub struct RetryConfigBuilder<E> {
    max_attempts: usize,
    interval_fn: Option<Arc<dyn IntervalFunction>>,
    retry_predicate: Option<RetryPredicate<E>>,
    event_listeners: EventListeners<RetryEvent>,
    name: PolicyKey,
}

impl<E> Default for RetryConfigBuilder<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> RetryConfigBuilder<E> {
    /// Creates a new builder with defaults.
    ///
    /// Defaults:
    /// - max_attempts: 3
    /// - backoff: fixed 1000 ms
    /// - retry on: every error
    /// - name: `"<unnamed>"`
    pub fn new() -> Self {
        Self {
            max_attempts: 3,
            interval_fn: None,
            retry_predicate: None,
            event_listeners: EventListeners::new(),
            name: PolicyKey::from("<unnamed>"),
        }
    }

    /// Sets the maximum number of attempts.
    ///
    /// This includes the initial attempt, so max_attempts=3 means
    /// 1 initial attempt + 2 retries. Zero is treated as one.
    pub fn max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Sets a fixed backoff interval.
    pub fn fixed_backoff(mut self, duration: Duration) -> Self {
        self.interval_fn = Some(Arc::new(FixedInterval::new(duration)));
        self
    }

    /// Sets exponential backoff with a multiplier of 2 and no cap.
    pub fn exponential_backoff(mut self, initial_interval: Duration) -> Self {
        self.interval_fn = Some(Arc::new(ExponentialBackoff::new(initial_interval)));
        self
    }

    /// Sets a custom interval function for backoff.
    pub fn backoff<I>(mut self, interval_fn: I) -> Self
    where
        I: IntervalFunction + 'static,
    {
        self.interval_fn = Some(Arc::new(interval_fn));
        self
    }

    /// Sets a predicate to determine which errors should be retried.
    ///
    /// Errors the predicate rejects are returned immediately, without delay.
    pub fn retry_on<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.retry_predicate = Some(Arc::new(predicate));
        self
    }

    /// Sets the name for this retry instance (used in events and logs).
    pub fn name(mut self, name: impl Into<PolicyKey>) -> Self {
        self.name = name.into();
        self
    }

    /// Registers a callback when a retry attempt is about to be made.
    ///
    /// This callback is invoked after a failed attempt and before the retry
    /// delay begins.
    ///
    /// # Callback Signature
    /// `Fn(usize, Duration)` - Called with two parameters:
    /// - First parameter: The attempt that just failed (1-indexed)
    /// - Second parameter: The delay before the next attempt
    ///
    /// # Example
    /// ```rust
    /// use callguard_retry::RetryConfig;
    /// use std::time::Duration;
    ///
    /// let config = RetryConfig::<std::io::Error>::builder()
    ///     .max_attempts(5)
    ///     .exponential_backoff(Duration::from_millis(100))
    ///     .on_retry(|attempt, delay| {
    ///         println!("attempt {} failed, retrying in {:?}", attempt, delay);
    ///     })
    ///     .build();
    /// # let _ = config;
    /// ```
    pub fn on_retry<F>(mut self, f: F) -> Self
    where
        F: Fn(usize, Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RetryEvent::Retry { attempt, delay, .. } = event {
                f(*attempt, *delay);
            }
        }));
        self
    }

    /// Registers a callback when an operation succeeds.
    ///
    /// # Callback Signature
    /// `Fn(usize)` - Called with the total number of attempts made (including
    /// the initial attempt).
    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RetryEvent::Success { attempts, .. } = event {
                f(*attempts);
            }
        }));
        self
    }

    /// Registers a callback when all attempts are exhausted.
    ///
    /// # Callback Signature
    /// `Fn(usize)` - Called with the total number of attempts made. This
    /// equals `max_attempts`.
    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RetryEvent::Error { attempts, .. } = event {
                f(*attempts);
            }
        }));
        self
    }

    /// Registers a callback when an error is returned without retrying
    /// because the retry predicate rejected it.
    ///
    /// # Callback Signature
    /// `Fn()` - Called with no parameters when an error is ignored.
    ///
    /// # Example
    /// ```rust
    /// use callguard_retry::RetryConfig;
    /// use std::io::{Error, ErrorKind};
    ///
    /// let config = RetryConfig::<Error>::builder()
    ///     .retry_on(|err| {
    ///         matches!(err.kind(), ErrorKind::ConnectionRefused | ErrorKind::TimedOut)
    ///     })
    ///     .on_ignored_error(|| {
    ///         println!("non-retryable error");
    ///     })
    ///     .build();
    /// # let _ = config;
    /// ```
    pub fn on_ignored_error<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if matches!(event, RetryEvent::IgnoredError { .. }) {
                f();
            }
        }));
        self
    }

    /// Registers a callback when a backoff wait is cancelled.
    ///
    /// # Callback Signature
    /// `Fn(usize)` - Called with the number of attempts made before the
    /// cancellation.
    pub fn on_cancelled<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RetryEvent::Cancelled { attempts, .. } = event {
                f(*attempts);
            }
        }));
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> RetryConfig<E> {
        let interval_fn = self
            .interval_fn
            .unwrap_or_else(|| Arc::new(FixedInterval::default()));

        RetryConfig {
            policy: RetryPolicy::new(self.max_attempts, interval_fn, self.retry_predicate),
            event_listeners: self.event_listeners,
            name: self.name,
        }
    }
}

impl<E> RetryConfigBuilder<E>
where
    E: Classify + 'static,
{
    /// Retries only errors whose [`FailureKind`] is one of `kinds` or a
    /// descendant of one of them.
    ///
    /// # Example
    /// ```rust
    /// use callguard_core::{Classify, FailureKind};
    /// use callguard_retry::RetryConfig;
    ///
    /// #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// enum Kind {
    ///     Transient,
    ///     Timeout,
    ///     Fatal,
    /// }
    ///
    /// impl FailureKind for Kind {
    ///     fn parent(self) -> Option<Self> {
    ///         match self {
    ///             Kind::Timeout => Some(Kind::Transient),
    ///             Kind::Transient | Kind::Fatal => None,
    ///         }
    ///     }
    /// }
    ///
    /// struct FetchError(Kind);
    ///
    /// impl Classify for FetchError {
    ///     type Kind = Kind;
    ///     fn failure_kind(&self) -> Kind {
    ///         self.0
    ///     }
    /// }
    ///
    /// let config = RetryConfig::<FetchError>::builder()
    ///     .retry_on_kinds([Kind::Transient])
    ///     .build();
    ///
    /// assert!(config.policy().is_retryable(&FetchError(Kind::Timeout)));
    /// assert!(!config.policy().is_retryable(&FetchError(Kind::Fatal)));
    /// ```
    pub fn retry_on_kinds<I>(self, kinds: I) -> Self
    where
        I: IntoIterator<Item = E::Kind>,
    {
        let kinds: Vec<E::Kind> = kinds.into_iter().collect();
        self.retry_on(move |error: &E| {
            let kind = error.failure_kind();
            kinds.iter().any(|&allowed| kind.is_a(allowed))
        })
    }
}
