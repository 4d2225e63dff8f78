//! Half-open time windows.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// A half-open `[start, end)` range of instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// The trailing `days` ending at `now`, or `None` if the start underflows.
    pub fn trailing(now: DateTime<Utc>, days: i64) -> Option<Self> {
        let start = now.checked_sub_signed(Duration::try_days(days)?)?;
        Some(Self::new(start, now))
    }

    /// One UTC calendar day, midnight to midnight.
    ///
    /// `None` when either bound falls outside the nanosecond-timestamp range
    /// that tick records are keyed by (roughly years 1677 to 2262).
    pub fn day(date: NaiveDate) -> Option<Self> {
        let start = date.and_time(NaiveTime::MIN).and_utc();
        let end = start.checked_add_signed(Duration::days(1))?;
        start.timestamp_nanos_opt()?;
        end.timestamp_nanos_opt()?;
        Some(Self::new(start, end))
    }

    pub fn length(&self) -> Duration {
        self.end - self.start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_window_spans_24_hours() {
        let w = TimeWindow::day(NaiveDate::from_ymd_opt(2021, 11, 17).unwrap()).unwrap();
        assert_eq!(w.start.to_rfc3339(), "2021-11-17T00:00:00+00:00");
        assert_eq!(w.end.to_rfc3339(), "2021-11-18T00:00:00+00:00");
        assert_eq!(w.length(), Duration::hours(24));
    }

    #[test]
    fn trailing_window_ends_now() {
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let w = TimeWindow::trailing(now, 365).unwrap();
        assert_eq!(w.end, now);
        assert_eq!(w.length(), Duration::days(365));
    }

    #[test]
    fn out_of_range_days_have_no_window() {
        assert!(TimeWindow::day(NaiveDate::MAX).is_none());
        assert!(TimeWindow::day(NaiveDate::from_ymd_opt(2262, 4, 12).unwrap()).is_none());
        assert!(TimeWindow::day(NaiveDate::from_ymd_opt(1677, 9, 20).unwrap()).is_none());
        assert!(TimeWindow::day(NaiveDate::from_ymd_opt(2262, 4, 10).unwrap()).is_some());
    }

    #[test]
    fn oversized_trailing_span_has_no_window() {
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        assert!(TimeWindow::trailing(now, i64::MAX).is_none());
        assert!(TimeWindow::trailing(now, 365_000_000).is_none());
    }
}
