//! Time sources in epoch milliseconds.
//!
//! Cooldown timestamps are persisted as epoch-millisecond strings, so every
//! comparison in the scheduler goes through a [`Clock`].

use std::time::Duration;

/// Source of the current time as epoch milliseconds.
pub trait Clock: Send + Sync + 'static {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64;
}

/// Wall-clock time from the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// A clock anchored at a fixed epoch value and advanced by Tokio's monotonic
/// clock.
///
/// Immune to wall-clock jumps, and follows `tokio::time::pause`/`advance`,
/// which makes timer-driven behavior reproducible in tests.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    base_millis: i64,
    start: tokio::time::Instant,
}

impl MonotonicClock {
    /// Start counting from `base_millis` now.
    #[must_use]
    pub fn starting_at(base_millis: i64) -> Self {
        Self {
            base_millis,
            start: tokio::time::Instant::now(),
        }
    }
}

impl Clock for MonotonicClock {
    fn now_millis(&self) -> i64 {
        let elapsed = i64::try_from(self.start.elapsed().as_millis()).unwrap_or(i64::MAX);
        self.base_millis.saturating_add(elapsed)
    }
}

/// Convert a non-negative millisecond delay into a [`Duration`].
///
/// Negative delays are treated as zero.
#[must_use]
pub fn delay_duration(delay_ms: i64) -> Duration {
    Duration::from_millis(u64::try_from(delay_ms).unwrap_or(0))
}
