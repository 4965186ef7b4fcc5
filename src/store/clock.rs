//! Clock Module
//!
//! Millisecond clocks used for record timestamps and staleness checks.

use std::fmt::Debug;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;

// == Clock ==
/// Source of "now" in Unix milliseconds. Readings never go backwards.
pub trait Clock: Debug + Send + Sync {
    fn current_time_millis(&self) -> i64;
}

// == System Clock ==
/// Wall clock, clamped so that it never returns a value lower than a
/// previous reading.
#[derive(Debug, Default)]
pub struct SystemClock {
    last: AtomicI64,
}

impl SystemClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for SystemClock {
    fn current_time_millis(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let previous = self.last.fetch_max(now, Ordering::AcqRel);
        previous.max(now)
    }
}

// == Manual Clock ==
/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(start_ms: i64) -> Self {
        Self {
            now: AtomicI64::new(start_ms),
        }
    }

    /// Moves the clock forward by `delta_ms`.
    pub fn advance(&self, delta_ms: i64) {
        self.now.fetch_add(delta_ms.max(0), Ordering::AcqRel);
    }

    /// Moves the clock to `now_ms`, unless that would move it backwards.
    pub fn set(&self, now_ms: i64) {
        self.now.fetch_max(now_ms, Ordering::AcqRel);
    }
}

impl Clock for ManualClock {
    fn current_time_millis(&self) -> i64 {
        self.now.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let mut previous = clock.current_time_millis();
        for _ in 0..1000 {
            let now = clock.current_time_millis();
            assert!(now >= previous);
            previous = now;
        }
    }

    #[test]
    fn test_manual_clock_moves_forward_only() {
        let clock = ManualClock::new(1_000);
        clock.advance(500);
        assert_eq!(clock.current_time_millis(), 1_500);

        clock.set(1_200);
        assert_eq!(clock.current_time_millis(), 1_500);

        clock.advance(-10);
        assert_eq!(clock.current_time_millis(), 1_500);
    }
}
