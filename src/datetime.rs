//! Date/time helpers for API responses.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Convert a database datetime string (YYYY-MM-DD HH:MM:SS, UTC) to RFC3339.
///
/// Strings that are already RFC3339 are normalized to UTC; anything else
/// is returned unchanged.
pub fn to_rfc3339(datetime_str: &str) -> String {
    if let Ok(naive) = NaiveDateTime::parse_from_str(datetime_str, "%Y-%m-%d %H:%M:%S") {
        return naive.and_utc().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(datetime_str) {
        return dt
            .with_timezone(&Utc)
            .to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
    }
    datetime_str.to_string()
}
