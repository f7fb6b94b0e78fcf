// src/olx/dates.rs

//! edX date attributes to epoch seconds

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Convert an edX date string to epoch seconds
///
/// edX writes dates as JSON strings inside XML attributes, so the value may
/// still carry its quotes. Missing or empty values map to 0. Offsets are
/// honored; dates without one are read as UTC.
pub fn parse_date(value: Option<&str>) -> Option<i64> {
    let raw = value.unwrap_or("").trim().trim_matches('"').trim();
    if raw.is_empty() || raw == "null" {
        return Some(0);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp());
    }

    const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];
    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw.trim_end_matches('Z'), format) {
            return Some(dt.and_utc().timestamp());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp())
}
