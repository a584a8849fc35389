//! Configuration for the fallback policy.

use crate::FallbackEvent;
use callguard_core::{EventListeners, FnListener, PolicyKey};
use std::sync::Arc;

/// Predicate to determine if an error should trigger the fallback.
pub type HandlePredicate<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;

/// Configuration for the fallback policy.
pub struct FallbackConfig<E> {
    pub(crate) name: PolicyKey,
    pub(crate) handle_predicate: Option<HandlePredicate<E>>,
    pub(crate) event_listeners: EventListeners<FallbackEvent>,
}

impl<E> FallbackConfig<E> {
    /// Creates a new configuration builder.
    pub fn builder() -> FallbackConfigBuilder<E> {
        FallbackConfigBuilder::new()
    }

    /// Returns the name used in events and logs.
    pub fn name(&self) -> &PolicyKey {
        &self.name
    }

    /// Returns whether `error` should be routed to the fallback.
    pub fn handles(&self, error: &E) -> bool {
        self.handle_predicate
            .as_ref()
            .map(|p| p(error))
            .unwrap_or(true)
    }
}

impl<E> Default for FallbackConfig<E> {
    fn default() -> Self {
        FallbackConfigBuilder::new().build()
    }
}

impl<E> Clone for FallbackConfig<E> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            handle_predicate: self.handle_predicate.clone(),
            event_listeners: self.event_listeners.clone(),
        }
    }
}

impl<E> std::fmt::Debug for FallbackConfig<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackConfig")
            .field("name", &self.name)
            .field("filtered", &self.handle_predicate.is_some())
            .field("event_listeners", &self.event_listeners)
            .finish()
    }
}

/// Builder for [`FallbackConfig`].
pub struct FallbackConfigBuilder<E> {
    name: PolicyKey,
    handle_predicate: Option<HandlePredicate<E>>,
    event_listeners: EventListeners<FallbackEvent>,
}

impl<E> Default for FallbackConfigBuilder<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> FallbackConfigBuilder<E> {
    /// Creates a new builder that routes every error to the fallback.
    pub fn new() -> Self {
        Self {
            name: PolicyKey::from("<unnamed>"),
            handle_predicate: None,
            event_listeners: EventListeners::new(),
        }
    }

    /// Sets the name for this fallback instance (used in events and logs).
    pub fn name(mut self, name: impl Into<PolicyKey>) -> Self {
        self.name = name.into();
        self
    }

    /// Only trigger fallback for errors matching this predicate.
    ///
    /// Errors that don't match the predicate will be propagated as-is.
    pub fn handle<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.handle_predicate = Some(Arc::new(predicate));
        self
    }

    /// Adds an event listener.
    pub fn on_event<F>(mut self, listener: F) -> Self
    where
        F: Fn(&FallbackEvent) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(listener));
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> FallbackConfig<E> {
        FallbackConfig {
            name: self.name,
            handle_predicate: self.handle_predicate,
            event_listeners: self.event_listeners,
        }
    }
}
