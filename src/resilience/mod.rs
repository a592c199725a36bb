//! Retry-on-timeout decorator.
//!
//! [`RetryOnTimeout`] wraps any zero-argument operation, most often a whole
//! bind, filter, dispatch and resolve sequence, and re-runs it from scratch
//! when it fails with a timeout.
//!
//! ```rust
//! use cloud_lib_rust::resilience::{RetryOnTimeout, RetryPolicy};
//! use cloud_lib_rust::Error;
//!
//! let retry = RetryOnTimeout::new(RetryPolicy::default());
//! let mut calls = 0;
//! let result: Result<(), Error> = retry.execute_blocking("drives.list", || {
//!     calls += 1;
//!     Err(Error::timeout("read timed out"))
//! });
//! assert!(result.unwrap_err().is_timeout());
//! assert_eq!(calls, 3);
//! ```

pub mod retry;

pub use retry::{RetryOnTimeout, RetryPolicy};
