use chrono::{DateTime, Duration, DurationRound, Utc};
use std::sync::Mutex;

/// Wall clock used for every timestamp the service stamps or compares.
///
/// Timestamps are truncated to whole milliseconds so a client that echoes the
/// ISO string it received compares equal on the optimistic-concurrency check.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

fn to_millis(at: DateTime<Utc>) -> DateTime<Utc> {
    at.duration_trunc(Duration::milliseconds(1)).unwrap_or(at)
}

/// `updated_at` for a row rewritten at `now` that was last stamped `previous`.
///
/// Always strictly after `previous`, so two writes inside one millisecond
/// still leave distinct versions for the optimistic-concurrency check.
pub fn next_stamp(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    now.max(previous + Duration::milliseconds(1))
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        to_millis(Utc::now())
    }
}

/// Settable clock for tests and deterministic replays
#[derive(Debug)]
pub struct ManualClock {
    current: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            current: Mutex::new(to_millis(start)),
        }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current = to_millis(at);
    }

    pub fn advance(&self, by: Duration) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current = to_millis(*current + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.current.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    #[test]
    fn system_clock_has_millisecond_precision() {
        let now = SystemClock.now();
        assert_eq!(now.nanosecond() % 1_000_000, 0);
    }

    #[test]
    fn manual_clock_advances() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let clock = ManualClock::new(start);
        clock.advance(Duration::seconds(61));
        assert_eq!(clock.now(), start + Duration::seconds(61));
    }

    #[test]
    fn next_stamp_moves_past_a_same_millisecond_write() {
        let t1 = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        assert_eq!(next_stamp(t1, t1), t1 + Duration::milliseconds(1));
        assert_eq!(next_stamp(t1, t1 - Duration::seconds(5)), t1 + Duration::milliseconds(1));
        assert_eq!(next_stamp(t1, t1 + Duration::seconds(5)), t1 + Duration::seconds(5));
    }
}
