//! Keyed bulkhead policy.
//!
//! The bulkhead pattern isolates call sites so that one slow dependency
//! cannot tie up every task in the process. Each call site, identified by a
//! [`PolicyKey`](callguard_core::PolicyKey), gets its own fair semaphore with
//! a fixed number of permits. A call that finds no free permit waits up to
//! the configured wait timeout and then fails with
//! [`BulkheadError::ResourceExhausted`] without running.
//!
//! # Basic Example
//!
//! ```rust
//! use callguard_bulkhead::{Bulkhead, BulkheadConfig, BulkheadError};
//! use callguard_core::PolicyKey;
//! use std::time::Duration;
//!
//! #[derive(Debug)]
//! enum ApiError {
//!     Busy(BulkheadError),
//!     Upstream(String),
//! }
//!
//! impl From<BulkheadError> for ApiError {
//!     fn from(e: BulkheadError) -> Self {
//!         ApiError::Busy(e)
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let bulkhead = Bulkhead::new();
//! let config = BulkheadConfig::builder()
//!     .max_concurrent_calls(10)
//!     .wait_timeout(Duration::from_millis(500))
//!     .build();
//!
//! let key = PolicyKey::for_method::<Bulkhead>("fetch_profile");
//! let profile = bulkhead
//!     .execute(&key, &config, || async { Ok::<_, ApiError>("alice") })
//!     .await;
//!
//! assert_eq!(profile.unwrap(), "alice");
//! # }
//! ```
//!
//! # Binding a Call Site
//!
//! [`Bulkhead::bind`] resolves a key once and returns a [`BoundBulkhead`] that
//! can be stored next to the code it protects:
//!
//! ```rust
//! use callguard_bulkhead::{Bulkhead, BulkheadConfig};
//! use callguard_core::ResilienceError;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let bulkhead = Bulkhead::new();
//! let reports = bulkhead.bind("reports#render", BulkheadConfig::default());
//!
//! let rendered: Result<&str, ResilienceError<std::io::Error>> =
//!     reports.execute(|| async { Ok("<html/>") }).await;
//! assert!(rendered.is_ok());
//! # }
//! ```
//!
//! # Example with Event Listeners
//!
//! ```rust
//! use callguard_bulkhead::BulkheadConfig;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let rejections = Arc::new(AtomicUsize::new(0));
//! let r = Arc::clone(&rejections);
//!
//! let config = BulkheadConfig::builder()
//!     .max_concurrent_calls(5)
//!     .on_call_permitted(|concurrent| {
//!         println!("call permitted ({} in flight)", concurrent);
//!     })
//!     .on_call_rejected(move |_| {
//!         r.fetch_add(1, Ordering::SeqCst);
//!     })
//!     .build();
//! # let _ = config;
//! ```

pub mod bulkhead;
pub mod config;
pub mod error;
pub mod events;

pub use bulkhead::{BoundBulkhead, Bulkhead};
pub use config::{BulkheadConfig, BulkheadConfigBuilder};
pub use error::{BulkheadError, Result};
pub use events::BulkheadEvent;
