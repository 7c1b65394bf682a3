//! Display helpers for event dates.

use chrono::{DateTime, Utc};

/// Format a timestamp the way event listings show it.
///
/// Produces `Sun, Jun 15, 2025, 7:00 PM` in UTC.
#[must_use]
pub fn format_date(value: &DateTime<Utc>) -> String {
    value.format("%a, %b %-d, %Y, %-I:%M %p").to_string()
}

/// Format an event's start/end pair as a single range.
#[must_use]
pub fn format_date_range(start: &DateTime<Utc>, end: &DateTime<Utc>) -> String {
    format!("{} – {}", format_date(start), format_date(end))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_format_date_evening() {
        let d = Utc.with_ymd_and_hms(2025, 6, 15, 19, 0, 0).single();
        assert_eq!(
            d.as_ref().map(format_date).as_deref(),
            Some("Sun, Jun 15, 2025, 7:00 PM")
        );
    }

    #[test]
    fn test_format_date_morning_single_digit_day() {
        let d = Utc.with_ymd_and_hms(2025, 8, 1, 9, 5, 0).single();
        assert_eq!(
            d.as_ref().map(format_date).as_deref(),
            Some("Fri, Aug 1, 2025, 9:05 AM")
        );
    }

    #[test]
    fn test_format_date_range() {
        let start = Utc.with_ymd_and_hms(2025, 6, 15, 19, 0, 0).single();
        let end = Utc.with_ymd_and_hms(2025, 6, 15, 22, 30, 0).single();
        let range = start.zip(end).map(|(s, e)| format_date_range(&s, &e));
        assert_eq!(
            range.as_deref(),
            Some("Sun, Jun 15, 2025, 7:00 PM – Sun, Jun 15, 2025, 10:30 PM")
        );
    }
}
