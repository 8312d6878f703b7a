//! Time sources for the hydration store.
//!
//! Day boundaries are evaluated in the local timezone. The store never calls
//! `Local::now()` directly; it asks its [`Clock`], which makes rollover
//! deterministic under test.
//!
//! # Mock Time for Development
//!
//! In debug builds, [`SystemClock`] honours the `WATERCHECK_MOCK_TIME`
//! environment variable (`YYYY-MM-DD HH:MM:SS`, local time). The mock time
//! advances at the same rate as the real clock.

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use std::cell::Cell;

/// Environment variable name for mock time (debug builds only)
pub const MOCK_TIME_ENV_VAR: &str = "WATERCHECK_MOCK_TIME";

/// Source of the current local time
pub trait Clock {
    fn now(&self) -> DateTime<Local>;

    /// Current local calendar day
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Wall-clock time, optionally shifted by `WATERCHECK_MOCK_TIME`
#[derive(Clone, Debug, Default)]
pub struct SystemClock {
    offset: Option<Duration>,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            offset: mock_time_offset(),
        }
    }

    /// Returns whether mock time is active for this clock.
    pub fn is_mocked(&self) -> bool {
        self.offset.is_some()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        let real_now = Local::now();
        match self.offset {
            Some(offset) => real_now + offset,
            None => real_now,
        }
    }
}

#[cfg(debug_assertions)]
fn mock_time_offset() -> Option<Duration> {
    let mock_time_str = std::env::var(MOCK_TIME_ENV_VAR).ok()?;
    let naive_dt = match NaiveDateTime::parse_from_str(&mock_time_str, "%Y-%m-%d %H:%M:%S") {
        Ok(dt) => dt,
        Err(e) => {
            tracing::warn!(
                mock_time = %mock_time_str,
                expected_format = "%Y-%m-%d %H:%M:%S",
                "Invalid mock time format: {}",
                e
            );
            return None;
        }
    };
    let Some(mock_dt) = Local.from_local_datetime(&naive_dt).earliest() else {
        tracing::warn!(mock_time = %mock_time_str, "Mock time does not exist in local timezone");
        return None;
    };
    let offset = mock_dt.signed_duration_since(Local::now());
    tracing::info!(
        mock_time = %mock_time_str,
        offset_secs = offset.num_seconds(),
        "Mock time enabled"
    );
    Some(offset)
}

#[cfg(not(debug_assertions))]
fn mock_time_offset() -> Option<Duration> {
    None
}

/// Hand-driven clock for tests and simulations
#[derive(Debug)]
pub struct ManualClock {
    current: Cell<NaiveDateTime>,
}

impl ManualClock {
    /// Clock fixed at the given local date and time
    pub fn new(local: NaiveDateTime) -> Self {
        Self {
            current: Cell::new(local),
        }
    }

    /// Clock fixed at local noon of `date`
    ///
    /// Noon keeps tests clear of DST transitions, which happen at night.
    pub fn on(date: NaiveDate) -> Self {
        Self::new(noon(date))
    }

    pub fn set(&self, local: NaiveDateTime) {
        self.current.set(local);
    }

    /// Jump to local noon of `date`
    pub fn set_date(&self, date: NaiveDate) {
        self.set(noon(date));
    }

    pub fn advance(&self, by: Duration) {
        self.current.set(self.current.get() + by);
    }

    pub fn advance_days(&self, days: i64) {
        self.advance(Duration::days(days));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        let naive = self.current.get();
        Local
            .from_local_datetime(&naive)
            .earliest()
            // Inside a DST gap the wall time does not exist; read it as UTC instead.
            .unwrap_or_else(|| Local.from_utc_datetime(&naive))
    }

    fn today(&self) -> NaiveDate {
        self.current.get().date()
    }
}

fn noon(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::default()) + Duration::hours(12)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_manual_clock_reports_local_day() {
        let clock = ManualClock::on(date(2025, 1, 10));
        assert_eq!(clock.today(), date(2025, 1, 10));
        assert_eq!(clock.now().date_naive(), date(2025, 1, 10));
    }

    #[test]
    fn test_manual_clock_advances_across_midnight() {
        let clock = ManualClock::new(date(2025, 1, 10).and_hms_opt(23, 59, 0).unwrap());
        assert_eq!(clock.today(), date(2025, 1, 10));

        clock.advance(Duration::minutes(2));
        assert_eq!(clock.today(), date(2025, 1, 11));

        clock.advance_days(3);
        assert_eq!(clock.today(), date(2025, 1, 14));
    }

    #[test]
    fn test_manual_clock_can_jump_backwards() {
        let clock = ManualClock::on(date(2025, 1, 12));
        clock.set(date(2025, 1, 10).and_hms_opt(7, 30, 0).unwrap());
        assert_eq!(clock.today(), date(2025, 1, 10));

        clock.set_date(date(2025, 1, 11));
        assert_eq!(clock.now().date_naive(), date(2025, 1, 11));
    }

    #[test]
    fn test_system_clock_is_near_real_time() {
        let clock = SystemClock { offset: None };
        let drift = (clock.now() - Local::now()).num_seconds().abs();
        assert!(drift < 5);
        assert!(!clock.is_mocked());
    }
}
