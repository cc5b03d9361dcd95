//! Time sources for the timer.
//!
//! Intervals (pause accounting) are measured on a monotonic clock; entry
//! timestamps come from the wall clock. Both are behind one trait so tests
//! can drive time by hand.

use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;

pub trait Clock: Send + Sync {
    /// Monotonic instant used to measure intervals.
    fn now(&self) -> Instant;

    /// Wall-clock time used for recorded timestamps.
    fn wall_now(&self) -> DateTime<Utc>;
}

/// Real clock backed by tokio's instant (which honours `tokio::time::pause`)
/// and the system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn wall_now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    wall_origin: DateTime<Utc>,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new(wall_origin: DateTime<Utc>) -> Self {
        Self {
            origin: Instant::now(),
            wall_origin,
            offset: Mutex::new(Duration::ZERO),
        }
    }

    /// Move both clocks forward.
    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(|e| e.into_inner());
        *offset += by;
    }

    fn elapsed(&self) -> Duration {
        *self.offset.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }

    fn wall_now(&self) -> DateTime<Utc> {
        let elapsed = chrono::Duration::from_std(self.elapsed()).unwrap_or(chrono::Duration::zero());
        self.wall_origin + elapsed
    }
}
