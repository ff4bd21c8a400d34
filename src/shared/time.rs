//! Wall-clock abstraction
//!
//! Reservations are same-day and pickup times are local wall-clock times, so
//! the engine asks a [`Clock`] for "now" instead of calling `chrono::Local`
//! directly. Tests pin the clock with [`FixedClock`].

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, Utc};

pub trait Clock: Send + Sync {
    /// Current local date and time.
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }

    fn time_of_day(&self) -> NaiveTime {
        self.now().time()
    }

    /// Instant used for record timestamps. Reads the pinned local time as
    /// UTC unless the clock tracks real time.
    fn now_utc(&self) -> DateTime<Utc> {
        self.now().and_utc()
    }
}

pub type SharedClock = Arc<dyn Clock>;

/// Local system time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Settable clock for tests and demos.
#[derive(Debug)]
pub struct FixedClock {
    now: RwLock<NaiveDateTime>,
}

impl FixedClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: RwLock::new(now),
        }
    }

    pub fn set(&self, now: NaiveDateTime) {
        match self.now.write() {
            Ok(mut guard) => *guard = now,
            Err(poisoned) => *poisoned.into_inner() = now,
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        match self.now.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_can_be_moved() {
        let start = NaiveDate::from_ymd_opt(2024, 6, 3)
            .unwrap()
            .and_hms_opt(11, 0, 0)
            .unwrap();
        let clock = FixedClock::new(start);
        assert_eq!(clock.today(), start.date());
        assert_eq!(clock.time_of_day(), NaiveTime::from_hms_opt(11, 0, 0).unwrap());

        let next_day = start + chrono::Duration::days(1);
        clock.set(next_day);
        assert_eq!(clock.today(), next_day.date());
        assert_eq!(clock.now_utc().naive_utc(), next_day);
    }
}
