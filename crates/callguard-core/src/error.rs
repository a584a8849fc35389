//! Common error type for callguard policies.
//!
//! Every policy is generic over the error type of the operation it wraps and
//! only asks that the policy's own failures can be converted into it
//! (`E: From<BulkheadError>`, `E: From<CircuitOpenError>`, ...). Because each
//! policy injects its failures into the caller's error type, nested policies
//! share one error type and no wrapper-in-wrapper errors appear.
//!
//! [`ResilienceError<E>`] is a ready-made error type with conversions from every
//! policy error, so callers only have to describe their own failures:
//!
//! ```rust
//! use callguard_core::ResilienceError;
//!
//! #[derive(Debug, Clone)]
//! enum AppError {
//!     DatabaseDown,
//! }
//!
//! impl std::fmt::Display for AppError {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//!         match self {
//!             AppError::DatabaseDown => write!(f, "database down"),
//!         }
//!     }
//! }
//!
//! impl std::error::Error for AppError {}
//!
//! type CallError = ResilienceError<AppError>;
//!
//! fn describe(err: &CallError) -> String {
//!     match err {
//!         ResilienceError::ResourceExhausted { key, max_concurrent } => {
//!             format!("{} saturated ({} permits)", key, max_concurrent)
//!         }
//!         ResilienceError::CircuitOpen { key } => format!("{} open", key),
//!         ResilienceError::Cancelled { layer } => format!("cancelled in {}", layer),
//!         ResilienceError::Operation(app) => format!("failed: {}", app),
//!     }
//! }
//!
//! let err: CallError = ResilienceError::Operation(AppError::DatabaseDown);
//! assert_eq!(describe(&err), "failed: database down");
//! ```

use crate::classify::{Classify, PolicyFailure};
use crate::key::PolicyKey;
use std::fmt;

/// A common error type that wraps all policy failures and the operation's own
/// failure.
///
/// From implementations for each policy error are provided by the policy
/// crates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResilienceError<E> {
    /// A bulkhead could not grant a permit within its wait timeout.
    ResourceExhausted {
        /// Key of the saturated bulkhead.
        key: PolicyKey,
        /// Permit capacity of the bulkhead.
        max_concurrent: usize,
    },

    /// A circuit breaker rejected the call without running it.
    CircuitOpen {
        /// Key of the open circuit.
        key: PolicyKey,
    },

    /// A permit wait or backoff delay was abandoned because the caller
    /// cancelled.
    Cancelled {
        /// The policy that was waiting (e.g. "bulkhead", "retry").
        layer: &'static str,
    },

    /// The wrapped operation failed.
    Operation(E),
}

impl<E> fmt::Display for ResilienceError<E>
where
    E: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResilienceError::ResourceExhausted {
                key,
                max_concurrent,
            } => write!(
                f,
                "bulkhead '{}' exhausted: all {} permits in use",
                key, max_concurrent
            ),
            ResilienceError::CircuitOpen { key } => {
                write!(f, "circuit breaker '{}' is open", key)
            }
            ResilienceError::Cancelled { layer } => write!(f, "cancelled while waiting in {}", layer),
            ResilienceError::Operation(e) => write!(f, "operation failed: {}", e),
        }
    }
}

impl<E> std::error::Error for ResilienceError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResilienceError::Operation(e) => Some(e),
            _ => None,
        }
    }
}

impl<E> ResilienceError<E> {
    /// Returns `true` if a bulkhead rejected the call.
    pub fn is_resource_exhausted(&self) -> bool {
        matches!(self, ResilienceError::ResourceExhausted { .. })
    }

    /// Returns `true` if a circuit breaker rejected the call.
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, ResilienceError::CircuitOpen { .. })
    }

    /// Returns `true` if the call was cancelled while waiting.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ResilienceError::Cancelled { .. })
    }

    /// Returns `true` if this is the operation's own failure.
    pub fn is_operation(&self) -> bool {
        matches!(self, ResilienceError::Operation(_))
    }

    /// Returns the policy failure this error represents, if any.
    pub fn policy_failure(&self) -> Option<PolicyFailure> {
        match self {
            ResilienceError::ResourceExhausted { .. } => Some(PolicyFailure::ResourceExhausted),
            ResilienceError::CircuitOpen { .. } => Some(PolicyFailure::CircuitOpen),
            ResilienceError::Cancelled { .. } => Some(PolicyFailure::Cancelled),
            ResilienceError::Operation(_) => None,
        }
    }

    /// Extracts the operation error, if this is an `Operation` variant.
    pub fn operation_error(self) -> Option<E> {
        match self {
            ResilienceError::Operation(e) => Some(e),
            _ => None,
        }
    }

    /// Maps the operation error using a function.
    ///
    /// # Examples
    ///
    /// ```
    /// use callguard_core::ResilienceError;
    ///
    /// let err: ResilienceError<String> = ResilienceError::Operation("boom".to_string());
    /// let mapped: ResilienceError<usize> = err.map_operation(|s| s.len());
    /// assert_eq!(mapped.operation_error(), Some(4));
    /// ```
    pub fn map_operation<F, T>(self, f: F) -> ResilienceError<T>
    where
        F: FnOnce(E) -> T,
    {
        match self {
            ResilienceError::ResourceExhausted {
                key,
                max_concurrent,
            } => ResilienceError::ResourceExhausted {
                key,
                max_concurrent,
            },
            ResilienceError::CircuitOpen { key } => ResilienceError::CircuitOpen { key },
            ResilienceError::Cancelled { layer } => ResilienceError::Cancelled { layer },
            ResilienceError::Operation(e) => ResilienceError::Operation(f(e)),
        }
    }
}

impl<E> Classify for ResilienceError<E>
where
    E: Classify,
    E::Kind: From<PolicyFailure>,
{
    type Kind = E::Kind;

    fn failure_kind(&self) -> Self::Kind {
        match self {
            ResilienceError::ResourceExhausted { .. } => PolicyFailure::ResourceExhausted.into(),
            ResilienceError::CircuitOpen { .. } => PolicyFailure::CircuitOpen.into(),
            ResilienceError::Cancelled { .. } => PolicyFailure::Cancelled.into(),
            ResilienceError::Operation(e) => e.failure_kind(),
        }
    }
}
