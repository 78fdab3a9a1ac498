//! Wall Clock Abstraction
//!
//! Session expiry and lockout windows are wall-clock timestamps, so every
//! component that compares against "now" reads it through a [`Clock`].

use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Source of the current wall-clock time
pub trait Clock: Send + Sync {
    fn now(&self) -> SystemTime;
}

/// Clock backed by the operating system
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<SystemTime>,
}

impl ManualClock {
    /// Create a clock frozen at the given instant
    pub fn new(start: SystemTime) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Create a clock frozen at the given number of milliseconds after the epoch
    pub fn from_millis(millis: u64) -> Self {
        Self::new(from_epoch_millis(millis))
    }

    /// Move the clock forward
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }

    /// Jump to an absolute instant
    pub fn set(&self, to: SystemTime) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> SystemTime {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Milliseconds since the Unix epoch, saturating at zero for pre-epoch times
pub fn epoch_millis(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

pub fn from_epoch_millis(millis: u64) -> SystemTime {
    UNIX_EPOCH + Duration::from_millis(millis)
}

/// Whole minutes left in `remaining`, rounded up
pub fn ceil_minutes(remaining: Duration) -> u64 {
    let millis = remaining.as_millis() as u64;
    millis.div_ceil(60_000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::from_millis(1_000);
        clock.advance(Duration::from_secs(2));
        assert_eq!(epoch_millis(clock.now()), 3_000);
    }

    #[test]
    fn test_ceil_minutes() {
        assert_eq!(ceil_minutes(Duration::ZERO), 0);
        assert_eq!(ceil_minutes(Duration::from_millis(1)), 1);
        assert_eq!(ceil_minutes(Duration::from_secs(60)), 1);
        assert_eq!(ceil_minutes(Duration::from_secs(61)), 2);
        assert_eq!(ceil_minutes(Duration::from_secs(15 * 60)), 15);
    }
}
