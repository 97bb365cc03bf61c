//! Periodic full-state dump trigger.

use std::time::Duration;

/// Time-based trigger that behaves like a `?` command arriving on its own.
///
/// Timestamps are microseconds from any monotonic origin; only differences
/// between them matter, and wrap-around of the counter is tolerated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AutoReport {
    interval: Duration,
    last_fired: u64,
}

impl AutoReport {
    /// Create a trigger. A zero interval disables it.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_fired: 0,
        }
    }

    /// Current interval.
    #[inline]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Change the interval without touching the reference timestamp.
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    /// Check if the trigger can fire at all.
    #[inline]
    pub fn is_enabled(&self) -> bool {
        !self.interval.is_zero()
    }

    /// Timestamp of the most recent firing.
    #[inline]
    pub fn last_fired(&self) -> u64 {
        self.last_fired
    }

    /// Fire if at least one interval has passed since the last firing.
    ///
    /// Firing moves the reference timestamp to `now_micros`.
    pub fn poll(&mut self, now_micros: u64) -> bool {
        if !self.is_enabled() {
            return false;
        }
        let elapsed = u128::from(now_micros.wrapping_sub(self.last_fired));
        if elapsed >= self.interval.as_micros() {
            self.last_fired = now_micros;
            true
        } else {
            false
        }
    }
}

/// Convert a seconds value to an interval. Negative, NaN and infinite
/// values disable the trigger.
pub fn interval_from_secs(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::ZERO)
}
