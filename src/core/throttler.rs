//! Self-adjusting throttler implementation
//!
//! This module provides the main [`Throttler`] struct: an adaptive gate
//! that doubles its enforced delay on failures and halves it on successes,
//! paced by a background task that hands out at most one permit at a time.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{Notify, Semaphore};
use tokio::task::JoinHandle;

use super::ThrottleError;

/// Smallest nonzero delay, in nanoseconds. A delay that would fall below
/// this collapses to zero instead of lingering at a negligible value, and
/// the first step up from zero starts here.
const MIN_DELAY_NS: u64 = 1_000_000;

/// A self-adjusting throttler
///
/// The throttler keeps a single delay value: the required spacing between
/// consecutive admissions. It starts fully open (zero delay) and moves only
/// in response to feedback: [`down`](Throttler::down) on failure doubles the
/// delay up to the ceiling fixed at construction, [`up`](Throttler::up) on
/// success halves it back toward zero.
///
/// A background pacing task makes one permit available per delay interval;
/// [`allow`](Throttler::allow) consumes a permit if one is immediately
/// available and never blocks.
///
/// All methods take `&self` and are safe to call concurrently; share the
/// throttler across tasks with an [`Arc`].
///
/// # Example
///
/// ```
/// use autothrottle::Throttler;
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let throttler = Throttler::new(Duration::from_secs(1)).unwrap();
///
/// // Fully open: admitted unconditionally
/// assert!(throttler.allow());
///
/// // A failure starts throttling at 1ms spacing
/// throttler.down();
/// assert_eq!(throttler.current_delay(), Duration::from_millis(1));
/// # }
/// ```
#[derive(Debug)]
pub struct Throttler {
    shared: Arc<Shared>,
    pacer: JoinHandle<()>,
}

#[derive(Debug)]
struct Shared {
    /// Current spacing between admissions, in nanoseconds. Zero means
    /// unthrottled. Adjusted only through compare-and-swap; a lost race
    /// drops the adjustment rather than retrying.
    delay_ns: AtomicU64,
    /// Ceiling on `delay_ns`, fixed at construction.
    max_delay_ns: u64,
    /// Holds the single permit offered by the pacing task.
    permit: Semaphore,
    /// Wakes the pacing task once the outstanding permit is consumed.
    taken: Notify,
}

impl Throttler {
    /// Create a new throttler and start its pacing task
    ///
    /// `max_delay` is the ceiling on throttling severity: the longest
    /// spacing the throttler will ever enforce between admissions. A zero
    /// ceiling produces a throttler that never throttles.
    ///
    /// The throttler starts fully open and the returned handle is ready for
    /// use immediately; construction never blocks.
    ///
    /// # Errors
    ///
    /// [`ThrottleError::InvalidMaxDelay`] if `max_delay` cannot be encoded
    /// in the internal nanosecond representation (longer than about 584
    /// years).
    ///
    /// # Panics
    ///
    /// Panics if called from outside a Tokio runtime, since the pacing task
    /// is spawned on the current runtime.
    ///
    /// # Example
    ///
    /// ```
    /// use autothrottle::Throttler;
    /// use std::time::Duration;
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// let throttler = Throttler::new(Duration::from_secs(30)).unwrap();
    /// assert_eq!(throttler.max_delay(), Duration::from_secs(30));
    /// # }
    /// ```
    pub fn new(max_delay: Duration) -> Result<Self, ThrottleError> {
        let max_delay_ns = u64::try_from(max_delay.as_nanos())
            .map_err(|_| ThrottleError::InvalidMaxDelay(max_delay))?;

        let shared = Arc::new(Shared {
            delay_ns: AtomicU64::new(0),
            max_delay_ns,
            permit: Semaphore::new(0),
            taken: Notify::new(),
        });

        let pacer = tokio::spawn(pace(Arc::clone(&shared)));
        tracing::debug!("throttler started with max delay {:?}", max_delay);

        Ok(Throttler { shared, pacer })
    }

    /// Check whether the next operation is admitted right now
    ///
    /// Returns `true` if the operation may run, `false` if the caller
    /// should back off and retry later. Never blocks and never queues the
    /// caller.
    ///
    /// While the delay is zero this is a single atomic load. Under
    /// throttling, each permit produced by the pacing task is claimed by
    /// exactly one caller; racing callers that find no permit are denied
    /// immediately.
    pub fn allow(&self) -> bool {
        if self.shared.delay_ns.load(Ordering::Relaxed) == 0 {
            return true;
        }
        match self.shared.permit.try_acquire() {
            Ok(permit) => {
                permit.forget();
                self.shared.taken.notify_one();
                true
            }
            Err(_) => false,
        }
    }

    /// Report a success: relax throttling
    ///
    /// Halves the current delay; once it falls below 1ms it collapses to
    /// zero (fully open). No-op when already fully open. If a concurrent
    /// adjustment races this one, the losing update is dropped silently.
    pub fn up(&self) {
        let delay = self.shared.delay_ns.load(Ordering::Relaxed);
        if delay == 0 {
            return;
        }
        let mut next = delay / 2;
        if next < MIN_DELAY_NS {
            next = 0;
        }
        if self
            .shared
            .delay_ns
            .compare_exchange(delay, next, Ordering::Relaxed, Ordering::Relaxed)
            .is_ok()
        {
            tracing::trace!("throttle relaxed: {}ns -> {}ns", delay, next);
        }
    }

    /// Report a failure: tighten throttling
    ///
    /// Doubles the current delay, starting at 1ms from fully open and
    /// saturating at the ceiling. No-op when already at the ceiling. Same
    /// drop-on-race semantics as [`up`](Throttler::up).
    pub fn down(&self) {
        let delay = self.shared.delay_ns.load(Ordering::Relaxed);
        if delay >= self.shared.max_delay_ns {
            return;
        }
        let mut next = delay.saturating_mul(2);
        if next < MIN_DELAY_NS {
            next = MIN_DELAY_NS;
        }
        if next > self.shared.max_delay_ns {
            next = self.shared.max_delay_ns;
        }
        if self
            .shared
            .delay_ns
            .compare_exchange(delay, next, Ordering::Relaxed, Ordering::Relaxed)
            .is_ok()
        {
            tracing::trace!("throttle tightened: {}ns -> {}ns", delay, next);
        }
    }

    /// Adjust throttling from the outcome of a gated operation
    ///
    /// Dispatches to [`up`](Throttler::up) when `succeeded` is `true` and
    /// [`down`](Throttler::down) otherwise. This is the primary integration
    /// point for callers wrapping a fallible operation.
    ///
    /// # Example
    ///
    /// ```
    /// use autothrottle::Throttler;
    /// use std::time::Duration;
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// let throttler = Throttler::new(Duration::from_secs(1)).unwrap();
    ///
    /// throttler.adjust(false);
    /// assert_eq!(throttler.current_delay(), Duration::from_millis(1));
    ///
    /// throttler.adjust(true);
    /// assert_eq!(throttler.current_delay(), Duration::ZERO);
    /// # }
    /// ```
    pub fn adjust(&self, succeeded: bool) {
        if succeeded {
            self.up();
        } else {
            self.down();
        }
    }

    /// The spacing currently enforced between admissions (zero = open)
    pub fn current_delay(&self) -> Duration {
        Duration::from_nanos(self.shared.delay_ns.load(Ordering::Relaxed))
    }

    /// The ceiling fixed at construction
    pub fn max_delay(&self) -> Duration {
        Duration::from_nanos(self.shared.max_delay_ns)
    }
}

impl Drop for Throttler {
    /// Stops the pacing task.
    fn drop(&mut self) {
        self.pacer.abort();
    }
}

/// The pacing loop: produces at most one outstanding permit, spaced by the
/// delay in force at the start of each cycle.
///
/// The delay is re-read fresh every iteration, so an adjustment made while
/// the loop is sleeping takes effect on the next cycle; one in-flight sleep
/// is never interrupted. The loop waits for each permit to be consumed
/// before producing the next, so at most one admission is ever pending.
async fn pace(shared: Arc<Shared>) {
    loop {
        let delay_ns = shared.delay_ns.load(Ordering::Relaxed);
        if delay_ns > 0 {
            tokio::time::sleep(Duration::from_nanos(delay_ns)).await;
        }
        shared.permit.add_permits(1);
        shared.taken.notified().await;
    }
}
