//! Day windows and page arithmetic.

use chrono::{DateTime, Duration, NaiveDate, Utc};

/// The inclusive UTC interval `[00:00:00.000, 23:59:59.999]` of one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub day: NaiveDate,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DayWindow {
    pub fn for_day(day: NaiveDate) -> Self {
        let start = day.and_time(chrono::NaiveTime::MIN).and_utc();
        let end = start + Duration::days(1) - Duration::milliseconds(1);
        DayWindow { day, start, end }
    }

    /// Today's window, in UTC.
    pub fn today() -> Self {
        Self::for_day(Utc::now().date_naive())
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts <= self.end
    }

    pub fn next_day(&self) -> Option<NaiveDate> {
        self.day.succ_opt()
    }

    pub fn previous_day(&self) -> Option<NaiveDate> {
        self.day.pred_opt()
    }
}

/// Parse YYYY-MM-DD
pub fn parse_day(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| format!("Invalid date format '{}'. Expected YYYY-MM-DD", s))
}

/// Offset of a 1-based page. Pages below 1 clamp to offset 0.
pub fn offset_for_page(page: i64, page_size: u32) -> i64 {
    page.saturating_sub(1)
        .saturating_mul(i64::from(page_size))
        .max(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_window_bounds() {
        let window = DayWindow::for_day(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(window.start, Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap());
        assert_eq!(
            window.end,
            Utc.with_ymd_and_hms(2024, 1, 15, 23, 59, 59).unwrap() + Duration::milliseconds(999)
        );
    }

    #[test]
    fn test_window_is_inclusive() {
        let window = DayWindow::for_day(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert!(window.contains(window.start));
        assert!(window.contains(window.end));
        assert!(!window.contains(window.start - Duration::milliseconds(1)));
        assert!(!window.contains(window.end + Duration::milliseconds(1)));
    }

    #[test]
    fn test_adjacent_days() {
        let window = DayWindow::for_day(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(window.next_day(), NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(window.previous_day(), NaiveDate::from_ymd_opt(2024, 2, 28));
    }

    #[test]
    fn test_parse_day() {
        assert_eq!(parse_day("2024-01-15"), Ok(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()));
        assert!(parse_day("15.01.2024").is_err());
        assert!(parse_day("2024-02-30").is_err());
    }

    #[test]
    fn test_offset_for_page() {
        assert_eq!(offset_for_page(1, 20), 0);
        assert_eq!(offset_for_page(2, 20), 20);
        assert_eq!(offset_for_page(0, 20), 0);
        assert_eq!(offset_for_page(-3, 20), 0);
    }
}
