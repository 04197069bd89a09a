//! Core components of the autothrottle library
//!
//! This module contains the fundamental building blocks:
//! - [`throttler`]: the self-adjusting throttler and its pacing loop

pub mod throttler;

pub use throttler::Throttler;

use std::time::Duration;

/// Errors that can occur when constructing a throttler
///
/// Every runtime operation on a [`Throttler`] is total; construction is the
/// only fallible point.
#[derive(Debug, thiserror::Error)]
pub enum ThrottleError {
    /// The ceiling is too large to encode in the throttler's internal
    /// nanosecond representation
    #[error("max delay {0:?} is out of range")]
    InvalidMaxDelay(Duration),
}
