//! Timestamp parsing for event logs.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::period::start_of_day;

/// Naive layouts accepted after RFC 3339; all are read as UTC.
const NAIVE_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parse an event timestamp.
///
/// Accepts RFC 3339, the naive layouts in `NAIVE_FORMATS`, or a bare
/// `YYYY-MM-DD` date (read as midnight UTC). Returns `None` for anything else.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(ts.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(start_of_day)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rfc3339_with_offset() {
        let ts = parse_timestamp("2024-03-01T10:00:00+02:00").unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-03-01T08:00:00+00:00");
    }

    #[test]
    fn test_naive_layouts() {
        assert!(parse_timestamp("2024-03-01 10:00:00").is_some());
        assert!(parse_timestamp("2024-03-01 10:00:00.250").is_some());
        assert!(parse_timestamp("2024-03-01T10:00:00").is_some());
        assert!(parse_timestamp("2024-03-01 10:00").is_some());
    }

    #[test]
    fn test_bare_date_is_midnight() {
        let ts = parse_timestamp(" 2024-02-29 ").unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-02-29T00:00:00+00:00");
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("2024-02-30").is_none());
    }
}
