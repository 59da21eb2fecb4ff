//! Time source for workflow mutations.
//!
//! Engines never call `Utc::now()` directly; they receive a [`Clock`] so tests
//! can pin timestamps and assert on `updatedAt` movement.

use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for tests and deterministic seeding.
///
/// Each call to [`Clock::now`] returns the current instant and then advances it
/// by the configured step, so successive mutations get strictly increasing
/// timestamps.
#[derive(Debug)]
pub struct ManualClock {
    state: Mutex<DateTime<Utc>>,
    step: Duration,
}

impl ManualClock {
    /// Creates a clock starting at `start` that advances by `step` per reading.
    #[must_use]
    pub fn new(start: DateTime<Utc>, step: Duration) -> Self {
        Self {
            state: Mutex::new(start),
            step,
        }
    }

    /// Creates a clock that advances one second per reading.
    #[must_use]
    pub fn starting_at(start: DateTime<Utc>) -> Self {
        Self::new(start, Duration::seconds(1))
    }

    /// Moves the clock forward without producing a reading.
    pub fn advance(&self, by: Duration) {
        let mut now = self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *now += by;
    }

    /// Returns the next reading without advancing.
    #[must_use]
    pub fn peek(&self) -> DateTime<Utc> {
        *self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        let mut now = self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let reading = *now;
        *now += self.step;
        reading
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_manual_clock_advances_per_reading() {
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let clock = ManualClock::starting_at(start);

        assert_eq!(clock.now(), start);
        assert_eq!(clock.now(), start + Duration::seconds(1));
        assert_eq!(clock.peek(), start + Duration::seconds(2));
    }

    #[test]
    fn test_manual_clock_advance() {
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let clock = ManualClock::new(start, Duration::zero());
        clock.advance(Duration::hours(2));

        assert_eq!(clock.now(), start + Duration::hours(2));
        assert_eq!(clock.now(), start + Duration::hours(2));
    }

    #[test]
    fn test_system_clock_is_monotonic_enough() {
        let clock = SystemClock;
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
