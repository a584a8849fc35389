//! Keyed registry of lazily created policy state.

use crate::key::PolicyKey;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Maps each [`PolicyKey`] to a shared, lazily created state object.
///
/// The registry guarantees that the factory passed to
/// [`get_or_create`](Self::get_or_create) runs at most once per key, even when
/// many tasks use a key for the first time concurrently. Entries are never
/// removed; they live as long as the registry.
///
/// The registry lock only guards the map itself. Mutation of an individual
/// state object is the job of that object's own synchronization.
///
/// # Examples
///
/// ```
/// use callguard_core::{KeyedStateRegistry, PolicyKey};
/// use std::sync::atomic::AtomicUsize;
/// use std::sync::Arc;
///
/// let registry: KeyedStateRegistry<AtomicUsize> = KeyedStateRegistry::new();
/// let key = PolicyKey::from("billing#charge");
///
/// let first = registry.get_or_create(&key, || AtomicUsize::new(7));
/// let second = registry.get_or_create(&key, || AtomicUsize::new(99));
///
/// assert!(Arc::ptr_eq(&first, &second));
/// assert_eq!(registry.len(), 1);
/// ```
pub struct KeyedStateRegistry<S> {
    states: RwLock<HashMap<PolicyKey, Arc<S>>>,
}

impl<S> KeyedStateRegistry<S> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            states: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the state for `key`, creating it with `factory` on first use.
    pub fn get_or_create<F>(&self, key: &PolicyKey, factory: F) -> Arc<S>
    where
        F: FnOnce() -> S,
    {
        if let Some(state) = self.states.read().get(key) {
            return Arc::clone(state);
        }

        let mut states = self.states.write();
        // Another task may have inserted between dropping the read lock and
        // taking the write lock.
        if let Some(state) = states.get(key) {
            return Arc::clone(state);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(key = %key, "creating policy state");

        let state = Arc::new(factory());
        states.insert(key.clone(), Arc::clone(&state));
        state
    }

    /// Returns the state for `key` if it has been created.
    pub fn get(&self, key: &PolicyKey) -> Option<Arc<S>> {
        self.states.read().get(key).map(Arc::clone)
    }

    /// Returns the number of keys with state.
    pub fn len(&self) -> usize {
        self.states.read().len()
    }

    /// Returns `true` if no state has been created yet.
    pub fn is_empty(&self) -> bool {
        self.states.read().is_empty()
    }

    /// Returns the keys that currently have state, in no particular order.
    pub fn keys(&self) -> Vec<PolicyKey> {
        self.states.read().keys().cloned().collect()
    }
}

impl<S> Default for KeyedStateRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> fmt::Debug for KeyedStateRegistry<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedStateRegistry")
            .field("keys", &self.len())
            .finish()
    }
}
