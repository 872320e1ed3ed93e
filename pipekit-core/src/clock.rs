//! Time sources used for run timing, rate limiting and retry backoff

use std::cell::{Cell, RefCell};
use std::time::{Duration, Instant};

/// A time source that can also block for a duration.
///
/// Every pause the engine takes goes through this trait, so swapping the
/// clock swaps the scheduling model without touching stage arithmetic.
pub trait Clock {
    /// Current instant
    fn now(&self) -> Instant;

    /// Block the calling thread for `duration`
    fn sleep(&self, duration: Duration);
}

/// Wall clock backed by [`Instant::now`] and [`std::thread::sleep`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Virtual clock: `sleep` advances time instantly and is recorded.
///
/// Useful for asserting the exact pauses a pipeline requests. Virtual time
/// stops at the latest instant the platform can represent, so even a
/// saturated backoff never overflows.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: Cell<Duration>,
    sleeps: RefCell<Vec<Duration>>,
}

impl ManualClock {
    /// Create a clock frozen at the current instant
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Cell::new(Duration::ZERO),
            sleeps: RefCell::new(Vec::new()),
        }
    }

    /// Move virtual time forward without recording a sleep
    pub fn advance(&self, duration: Duration) {
        let wanted = self.offset.get().saturating_add(duration);
        self.offset.set(self.representable(wanted));
    }

    /// Largest offset up to `wanted` that still yields a valid instant
    fn representable(&self, wanted: Duration) -> Duration {
        if self.origin.checked_add(wanted).is_some() {
            return wanted;
        }

        // lo always representable, hi never
        let mut lo = self.offset.get();
        let mut hi = wanted;
        while hi - lo > Duration::from_nanos(1) {
            let mid = lo + (hi - lo) / 2;
            if self.origin.checked_add(mid).is_some() {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        lo
    }

    /// Virtual time elapsed since creation
    pub fn elapsed(&self) -> Duration {
        self.offset.get()
    }

    /// Every sleep requested so far, in order
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.borrow().clone()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin
            .checked_add(self.offset.get())
            .unwrap_or(self.origin)
    }

    fn sleep(&self, duration: Duration) {
        self.sleeps.borrow_mut().push(duration);
        self.advance(duration);
    }
}
