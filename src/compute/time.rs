//! Timestamp parsing: calendar text and epoch seconds, both normalized to UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SubsecRound, Utc};

/// Naive date-time layouts, interpreted as UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
    "%d.%m.%Y %H:%M:%S%.f",
    "%d.%m.%Y %H:%M",
];

/// Date-only layouts, taken as midnight UTC.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y"];

/// Parse a calendar date-time string into a UTC instant.
///
/// Accepts RFC 3339 (any offset), RFC 2822, and the naive layouts above.
/// Bare numbers never parse here. Sub-microsecond digits are truncated to the
/// resolution of recorded timestamps.
pub fn parse_calendar(value: &str) -> Option<DateTime<Utc>> {
    parse_calendar_exact(value).map(|t| t.trunc_subsecs(6))
}

fn parse_calendar_exact(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    // ISO 8601 with a space separator and offset, e.g. "2024-01-01 12:00:00+02:00"
    if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.with_timezone(&Utc));
    }

    let naive = value.strip_suffix('Z').unwrap_or(value);
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(naive, fmt) {
            return Some(ndt.and_utc());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(naive, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|ndt| ndt.and_utc());
        }
    }
    None
}

/// Parse a floating-point count of seconds since the Unix epoch.
pub fn parse_epoch_seconds(value: &str) -> Option<DateTime<Utc>> {
    let secs: f64 = value.trim().parse().ok()?;
    epoch_seconds_to_utc(secs)
}

/// Convert fractional epoch seconds to a UTC instant (microsecond resolution).
pub fn epoch_seconds_to_utc(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    let micros = (secs * 1_000_000.0).round();
    if micros < i64::MIN as f64 || micros > i64::MAX as f64 {
        return None;
    }
    DateTime::from_timestamp_micros(micros as i64)
}

/// Parse a single user-supplied instant: calendar text first, then epoch seconds.
///
/// Unlike column coercion, the fallback here is decided per value.
pub fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    parse_calendar(value).or_else(|| parse_epoch_seconds(value))
}
