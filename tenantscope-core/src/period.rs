//! Reporting windows and their comparison periods.
//!
//! A [`Period`] is an inclusive `[start, end]` range. Periods built from bare
//! calendar dates cover whole days: `start` at 00:00:00 and `end` at
//! 23:59:59.999.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

use crate::error::{Error, Result};

/// Inclusive time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Period {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl Period {
    /// Create a period, rejecting `start > end` and windows whose
    /// comparison period would fall outside the representable range.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start > end {
            return Err(Error::InvalidPeriod { start, end });
        }
        let period = Self { start, end };
        if start.checked_sub_signed(period.comparison_shift()).is_none() {
            return Err(Error::PeriodOutOfRange(format!(
                "no comparison window before {}",
                start.format("%Y-%m-%d")
            )));
        }
        Ok(period)
    }

    /// Create a whole-day period from two calendar dates (both inclusive).
    pub fn from_dates(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        Self::new(start_of_day(start), end_of_day(end))
    }

    /// The window of `days` whole days ending on (and including) `end`.
    ///
    /// `days` of zero is treated as one day.
    pub fn trailing_days(end: NaiveDate, days: u32) -> Result<Self> {
        let span = Duration::days(i64::from(days.max(1)) - 1);
        let start = end.checked_sub_signed(span).ok_or_else(|| {
            Error::PeriodOutOfRange(format!("{days} days before {end}"))
        })?;
        Self::from_dates(start, end)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Whether `ts` falls inside the window, both ends inclusive.
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts <= self.end
    }

    /// `end - start` in whole days (0 for a single-day window).
    pub fn length_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Number of calendar days the window touches.
    pub fn day_count(&self) -> i64 {
        (self.end.date_naive() - self.start.date_naive()).num_days() + 1
    }

    /// Weeks covered by the window, never less than one.
    pub fn weeks(&self) -> f64 {
        (self.day_count() as f64 / 7.0).max(1.0)
    }

    /// The immediately preceding window of identical length.
    ///
    /// The whole window moves back by `length_days + 1` days, so the
    /// comparison ends on the calendar day before `start` and never
    /// overlaps the current window.
    ///
    /// [`Period::new`] guarantees this is representable. A comparison of a
    /// comparison may not be, and is clamped to the earliest instant.
    pub fn comparison(&self) -> Period {
        let shift = self.comparison_shift();
        let clamp = |ts: DateTime<Utc>| {
            ts.checked_sub_signed(shift)
                .unwrap_or(DateTime::<Utc>::MIN_UTC)
        };
        Period {
            start: clamp(self.start),
            end: clamp(self.end),
        }
    }

    fn comparison_shift(&self) -> Duration {
        Duration::days(self.length_days() + 1)
    }

    /// Display label such as `2024-03-01 – 2024-03-31`.
    pub fn label(&self) -> String {
        format!(
            "{} – {}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}

/// Midnight at the start of `date`, in UTC.
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// The last millisecond of `date`, in UTC.
pub fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    start_of_day(date) + (Duration::days(1) - Duration::milliseconds(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_from_dates_normalizes_to_whole_days() {
        let period = Period::from_dates(date(2024, 3, 1), date(2024, 3, 30)).unwrap();
        assert_eq!(period.start().to_rfc3339(), "2024-03-01T00:00:00+00:00");
        assert_eq!(
            period.end().format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
            "2024-03-30 23:59:59.999"
        );
        assert_eq!(period.length_days(), 29);
        assert_eq!(period.day_count(), 30);
    }

    #[test]
    fn test_invalid_period() {
        let err = Period::from_dates(date(2024, 3, 2), date(2024, 3, 1)).unwrap_err();
        assert!(matches!(err, Error::InvalidPeriod { .. }));
    }

    #[test]
    fn test_comparison_thirty_days() {
        let period = Period::from_dates(date(2024, 3, 1), date(2024, 3, 30)).unwrap();
        let comparison = period.comparison();
        assert_eq!(comparison.start().date_naive(), date(2024, 1, 31));
        assert_eq!(comparison.end().date_naive(), date(2024, 2, 29));
        assert_eq!(comparison.day_count(), period.day_count());
        assert!(comparison.end() < period.start());
    }

    #[test]
    fn test_comparison_single_day() {
        let period = Period::from_dates(date(2024, 3, 1), date(2024, 3, 1)).unwrap();
        let comparison = period.comparison();
        assert_eq!(comparison.start().date_naive(), date(2024, 2, 29));
        assert_eq!(comparison.end().date_naive(), date(2024, 2, 29));
        assert_eq!(comparison.day_count(), 1);
    }

    #[test]
    fn test_comparison_of_instant_period_does_not_overlap() {
        let start = date(2024, 3, 1).and_hms_opt(10, 0, 0).unwrap().and_utc();
        let end = date(2024, 3, 3).and_hms_opt(9, 0, 0).unwrap().and_utc();
        let period = Period::new(start, end).unwrap();
        let comparison = period.comparison();
        assert!(comparison.end() < period.start());
        assert_eq!(comparison.end() - comparison.start(), end - start);
    }

    #[test]
    fn test_contains_is_inclusive() {
        let period = Period::from_dates(date(2024, 3, 1), date(2024, 3, 1)).unwrap();
        assert!(period.contains(start_of_day(date(2024, 3, 1))));
        assert!(period.contains(end_of_day(date(2024, 3, 1))));
        assert!(!period.contains(start_of_day(date(2024, 3, 2))));
    }

    #[test]
    fn test_trailing_days_and_weeks() {
        let period = Period::trailing_days(date(2024, 3, 30), 30).unwrap();
        assert_eq!(period.start().date_naive(), date(2024, 3, 1));
        assert!((period.weeks() - 30.0 / 7.0).abs() < 1e-9);

        let short = Period::trailing_days(date(2024, 3, 30), 3).unwrap();
        assert_eq!(short.weeks(), 1.0);
    }

    #[test]
    fn test_trailing_days_beyond_calendar_is_an_error() {
        let err = Period::trailing_days(date(2024, 3, 31), u32::MAX).unwrap_err();
        assert!(matches!(err, Error::PeriodOutOfRange(_)));
        assert!(err.to_string().contains("4294967295 days before 2024-03-31"));
    }

    #[test]
    fn test_calendar_edges() {
        let last = Period::from_dates(NaiveDate::MAX, NaiveDate::MAX).unwrap();
        assert_eq!(last.end().date_naive(), NaiveDate::MAX);

        let err = Period::from_dates(NaiveDate::MIN, date(2024, 3, 31)).unwrap_err();
        assert!(matches!(err, Error::PeriodOutOfRange(_)));

        let first = Period::from_dates(NaiveDate::MIN, NaiveDate::MIN).unwrap_err();
        assert!(matches!(first, Error::PeriodOutOfRange(_)));
    }
}
