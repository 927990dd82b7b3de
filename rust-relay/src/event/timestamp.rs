//! Timestamp coercion for inbound event fields.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};
use serde_json::Value;

/// Epoch values above this are read as milliseconds.
const MILLIS_THRESHOLD: u64 = 100_000_000_000;

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Coerce a JSON value into a timestamp.
///
/// Absent, null and blank values yield `Ok(None)`. Anything present that
/// cannot be read as a point in time yields `Err` with a short reason.
pub fn coerce_timestamp(value: Option<&Value>) -> Result<Option<DateTime<FixedOffset>>, String> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => parse_timestamp(s)
            .map(Some)
            .ok_or_else(|| format!("is not a recognised timestamp: {:?}", s)),
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(from_epoch)
            .map(Some)
            .ok_or_else(|| format!("is not a valid epoch timestamp: {}", n)),
        Some(_) => Err("expected a timestamp string or number".to_string()),
    }
}

/// Parse RFC 3339, naive ISO 8601 (read as UTC), or a bare date.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt);
    }

    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt);
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.fix().from_utc_datetime(&naive));
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.fix().from_utc_datetime(&naive))
}

fn from_epoch(value: i64) -> Option<DateTime<FixedOffset>> {
    let utc = if value.unsigned_abs() > MILLIS_THRESHOLD {
        Utc.timestamp_millis_opt(value).single()
    } else {
        Utc.timestamp_opt(value, 0).single()
    };
    utc.map(|dt| dt.with_timezone(&Utc.fix()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rfc3339_keeps_offset() {
        let dt = parse_timestamp("2025-01-15T10:30:00+02:00").unwrap();
        assert_eq!(dt.to_rfc3339(), "2025-01-15T10:30:00+02:00");

        let dt = parse_timestamp("2025-01-15T10:30:00.250Z").unwrap();
        assert_eq!(dt.timestamp_millis(), 1_736_937_000_250);
    }

    #[test]
    fn test_naive_is_utc() {
        let dt = parse_timestamp("2025-01-15T10:30:00").unwrap();
        assert_eq!(dt.to_rfc3339(), "2025-01-15T10:30:00+00:00");

        let dt = parse_timestamp("2025-01-15 10:30:00.5").unwrap();
        assert_eq!(dt.timestamp_millis(), 1_736_937_000_500);
    }

    #[test]
    fn test_bare_date() {
        let dt = parse_timestamp("2025-01-15").unwrap();
        assert_eq!(dt.to_rfc3339(), "2025-01-15T00:00:00+00:00");
    }

    #[test]
    fn test_compact_offset() {
        let dt = parse_timestamp("2025-01-15T10:30:00+0530").unwrap();
        assert_eq!(dt.offset().local_minus_utc(), 5 * 3600 + 30 * 60);
    }

    #[test]
    fn test_epoch_seconds_and_millis() {
        let secs = coerce_timestamp(Some(&json!(1_736_937_000))).unwrap().unwrap();
        let millis = coerce_timestamp(Some(&json!(1_736_937_000_000i64)))
            .unwrap()
            .unwrap();
        assert_eq!(secs, millis);
    }

    #[test]
    fn test_out_of_range_epoch_is_rejected() {
        assert!(coerce_timestamp(Some(&json!(i64::MIN))).is_err());
        assert!(coerce_timestamp(Some(&json!(i64::MAX))).is_err());
        assert!(coerce_timestamp(Some(&json!(-1.0e30))).is_err());
        assert!(coerce_timestamp(Some(&json!(1.0e30))).is_err());
    }

    #[test]
    fn test_absent_and_blank_are_none() {
        assert_eq!(coerce_timestamp(None), Ok(None));
        assert_eq!(coerce_timestamp(Some(&Value::Null)), Ok(None));
        assert_eq!(coerce_timestamp(Some(&json!("  "))), Ok(None));
    }

    #[test]
    fn test_uncoercible_values() {
        assert!(coerce_timestamp(Some(&json!("yesterday"))).is_err());
        assert!(coerce_timestamp(Some(&json!({"at": 1}))).is_err());
        assert!(coerce_timestamp(Some(&json!(true))).is_err());
    }
}
