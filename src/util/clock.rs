//! Monotonic millisecond clock used for all simulation timers.
//!
//! Timers (pad cooldowns, burst windows, zone schedule, grace periods) are
//! measured against this clock rather than accumulated delta-time, so they
//! stay correct under variable tick rates.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Milliseconds since the clock's origin
pub type TimeMs = u64;

/// Source of simulation time
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> TimeMs;
}

/// Wall-clock-independent clock backed by `Instant`
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> TimeMs {
        self.origin.elapsed().as_millis() as TimeMs
    }
}

/// Manually advanced clock for tests and fixed-step hosts
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start: TimeMs) -> Self {
        Self {
            now: AtomicU64::new(start),
        }
    }

    pub fn advance(&self, ms: TimeMs) -> TimeMs {
        self.now.fetch_add(ms, Ordering::Relaxed) + ms
    }

    pub fn set(&self, ms: TimeMs) {
        self.now.store(ms, Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> TimeMs {
        self.now.load(Ordering::Relaxed)
    }
}
