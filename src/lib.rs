//! # Autothrottle
//!
//! A self-adjusting throttler for Rust: a concurrency-safe gate that adapts
//! its own rate based on whether the operations it guards succeed or fail.
//!
//! ## Overview
//!
//! Autothrottle gates how frequently callers may perform an operation:
//! - **Self-adjusting**: no fixed rate to configure, only a ceiling
//! - **Failure-driven backoff**: each failure doubles the enforced spacing
//! - **Success-driven recovery**: each success halves it, down to fully open
//! - **Non-blocking admission**: [`Throttler::allow`] never waits or queues
//!
//! ## Quick Start
//!
//! ```
//! use autothrottle::Throttler;
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! // Back off up to one second between operations at the top throttling level
//! let throttler = Throttler::new(Duration::from_secs(1)).unwrap();
//!
//! if throttler.allow() {
//!     // perform the operation, then report how it went
//!     let succeeded = true;
//!     throttler.adjust(succeeded);
//! } else {
//!     // denied: retry later
//! }
//! # }
//! ```
//!
//! ## How It Works
//!
//! The throttler keeps a single *delay* value: the required spacing between
//! consecutive admissions. It starts at zero (fully open). A background
//! pacing task makes one permit available per delay interval, and
//! [`Throttler::allow`] consumes a permit if one is immediately available.
//!
//! Feedback moves the delay:
//! - [`Throttler::down`] (operation failed) doubles the delay, starting at
//!   1ms and saturating at the ceiling given to [`Throttler::new`]
//! - [`Throttler::up`] (operation succeeded) halves the delay, collapsing
//!   to zero once it falls below 1ms
//!
//! While the delay is zero, `allow` short-circuits to `true` without
//! touching the pacing machinery at all.
//!
//! ## Wrapping a Fallible Operation
//!
//! ```no_run
//! use autothrottle::Throttler;
//! use std::time::Duration;
//!
//! # async fn call_remote_service() -> Result<(), std::io::Error> { Ok(()) }
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let throttler = Throttler::new(Duration::from_secs(30)).unwrap();
//!
//! loop {
//!     if !throttler.allow() {
//!         tokio::time::sleep(Duration::from_millis(100)).await;
//!         continue;
//!     }
//!     let result = call_remote_service().await;
//!     throttler.adjust(result.is_ok());
//! }
//! # }
//! ```
//!
//! ## Thread Safety
//!
//! All operations take `&self` and are safe to call concurrently from any
//! number of tasks or threads. Share a throttler by wrapping it in an
//! [`Arc`](std::sync::Arc):
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use autothrottle::Throttler;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let throttler = Arc::new(Throttler::new(Duration::from_secs(1)).unwrap());
//! # }
//! ```
//!
//! ## Lifecycle
//!
//! [`Throttler::new`] spawns the pacing task on the current Tokio runtime,
//! so it must be called from within one. Dropping the throttler stops the
//! pacing task.

pub mod core;

pub use core::{ThrottleError, Throttler};
