//! Call-site identifiers.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// Identifies the call site whose policy state is shared.
///
/// Keys are immutable and cheap to clone. Every call made with an equal key
/// shares the same bulkhead permits and circuit breaker record.
///
/// # Examples
///
/// ```
/// use callguard_core::PolicyKey;
///
/// struct InventoryClient;
///
/// let key = PolicyKey::for_method::<InventoryClient>("reserve");
/// assert!(key.as_str().ends_with("InventoryClient#reserve"));
///
/// let explicit = PolicyKey::from("inventory#reserve");
/// assert_eq!(explicit.to_string(), "inventory#reserve");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PolicyKey(Arc<str>);

impl PolicyKey {
    /// Creates a key from any string-like value.
    pub fn new(key: impl Into<Arc<str>>) -> Self {
        Self(key.into())
    }

    /// Derives a key of the form `<type>#<operation>` from the declaring type.
    pub fn for_method<T: ?Sized>(operation: &str) -> Self {
        Self(format!("{}#{}", std::any::type_name::<T>(), operation).into())
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PolicyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PolicyKey {
    fn from(value: &str) -> Self {
        Self(value.into())
    }
}

impl From<String> for PolicyKey {
    fn from(value: String) -> Self {
        Self(value.into())
    }
}

impl From<&PolicyKey> for PolicyKey {
    fn from(value: &PolicyKey) -> Self {
        value.clone()
    }
}

impl Borrow<str> for PolicyKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for PolicyKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
