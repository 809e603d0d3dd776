//! Timestamp utilities
//!
//! All timestamps written to the store are RFC3339 strings in UTC with
//! second precision, e.g. `2025-03-14T09:26:53Z`.

use chrono::{DateTime, SecondsFormat, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Format a timestamp the way rows store it
pub fn to_rfc3339(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Current time formatted for storage
pub fn now_rfc3339() -> String {
    to_rfc3339(now())
}

/// Parse a stored timestamp and return its `YYYY-MM` month key
///
/// Accepts any RFC3339 offset (the store echoes `+00:00` with fractional
/// seconds). Returns `None` for anything unparseable.
pub fn month_key(raw: &str) -> Option<String> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|ts| ts.format("%Y-%m").to_string())
}
