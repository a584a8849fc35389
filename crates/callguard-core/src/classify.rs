//! Failure classification.
//!
//! Retry eligibility is decided by failure *kind*. Kinds form a hierarchy: a
//! kind matches an allow-list entry when the entry is the kind itself or one
//! of its ancestors.
//!
//! ```
//! use callguard_core::{Classify, FailureKind};
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! enum Kind {
//!     Any,
//!     Io,
//!     ConnectionReset,
//!     InvalidInput,
//! }
//!
//! impl FailureKind for Kind {
//!     fn parent(self) -> Option<Self> {
//!         match self {
//!             Kind::Any => None,
//!             Kind::Io | Kind::InvalidInput => Some(Kind::Any),
//!             Kind::ConnectionReset => Some(Kind::Io),
//!         }
//!     }
//! }
//!
//! assert!(Kind::ConnectionReset.is_a(Kind::Io));
//! assert!(Kind::ConnectionReset.is_a(Kind::Any));
//! assert!(!Kind::InvalidInput.is_a(Kind::Io));
//! ```

use std::fmt;

/// A classification tag with an optional parent kind.
///
/// Parent chains must terminate; a kind may not be its own ancestor.
pub trait FailureKind: Copy + Eq + fmt::Debug + Send + Sync + 'static {
    /// Returns the direct parent of this kind, or `None` for a root kind.
    fn parent(self) -> Option<Self>;

    /// Returns `true` if `ancestor` is this kind or one of its ancestors.
    fn is_a(self, ancestor: Self) -> bool {
        let mut current = Some(self);
        while let Some(kind) = current {
            if kind == ancestor {
                return true;
            }
            current = kind.parent();
        }
        false
    }
}

/// Errors that report a [`FailureKind`].
pub trait Classify {
    /// The kind hierarchy this error belongs to.
    type Kind: FailureKind;

    /// Returns the kind of this failure.
    fn failure_kind(&self) -> Self::Kind;
}

/// Failures synthesized by the policies themselves rather than by the
/// wrapped operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyFailure {
    /// A bulkhead could not grant a permit in time.
    ResourceExhausted,
    /// A circuit breaker rejected the call.
    CircuitOpen,
    /// A wait was abandoned because the caller cancelled.
    Cancelled,
}

impl FailureKind for PolicyFailure {
    fn parent(self) -> Option<Self> {
        None
    }
}

impl fmt::Display for PolicyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyFailure::ResourceExhausted => f.write_str("resource exhausted"),
            PolicyFailure::CircuitOpen => f.write_str("circuit open"),
            PolicyFailure::Cancelled => f.write_str("cancelled"),
        }
    }
}
