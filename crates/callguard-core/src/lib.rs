//! Core infrastructure for callguard.
//!
//! This crate provides shared functionality used across all callguard policies:
//! - [`PolicyKey`] identifying a call site
//! - [`KeyedStateRegistry`] holding lazily created per-key policy state
//! - Failure classification ([`FailureKind`], [`Classify`])
//! - The unified [`ResilienceError`] type
//! - Event system for observability

pub mod classify;
pub mod error;
pub mod events;
pub mod key;
pub mod registry;

pub use classify::{Classify, FailureKind, PolicyFailure};
pub use error::ResilienceError;
pub use events::{EventListener, EventListeners, FnListener, ResilienceEvent};
pub use key::PolicyKey;
pub use registry::KeyedStateRegistry;
