//! Date/time normalization for stored timestamps.
//!
//! Timestamps reach the database from several places (request time, form
//! date/time pickers, column defaults) and are stored as plain text. Everything
//! that is displayed or sorted goes through [`normalize`] first so that the
//! canonical `YYYY-MM-DDTHH:MM:SSZ` form compares correctly as a string.

use chrono::{NaiveDate, NaiveDateTime, Utc};

/// Canonical output format. Lexicographic order equals chronological order.
pub const CANONICAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Date+time layouts tried in priority order.
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Current UTC time in canonical form.
pub fn utc_now() -> String {
    Utc::now().format(CANONICAL_FORMAT).to_string()
}

/// Convert a stored date/time string to canonical form.
///
/// Returns `None` for empty input. Strings already ending in `Z` pass through
/// untouched, and anything that matches no known layout is returned as-is.
pub fn normalize(value: &str) -> Option<String> {
    if value.is_empty() {
        return None;
    }

    if value.ends_with('Z') {
        return Some(value.to_string());
    }

    // Drop fractional seconds and positive UTC offsets before parsing
    let trimmed = value.split('.').next().unwrap_or(value);
    let trimmed = trimmed.split('+').next().unwrap_or(trimmed);

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(dt.format(CANONICAL_FORMAT).to_string());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, DATE_FORMAT) {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return Some(dt.format(CANONICAL_FORMAT).to_string());
        }
    }

    Some(value.to_string())
}

/// Normalize an optional column value.
pub fn normalize_opt(value: Option<&str>) -> Option<String> {
    value.and_then(normalize)
}

/// Combine the separate date and time inputs of the gallery upload form.
pub fn combine_date_time(date: &str, time: &str) -> Option<String> {
    if date.is_empty() {
        return None;
    }

    if time.is_empty() {
        Some(format!("{date}T00:00:00Z"))
    } else {
        Some(format!("{date}T{time}:00Z"))
    }
}

/// Human readable rendering of a canonical timestamp.
pub fn display(iso: &str) -> String {
    match NaiveDateTime::parse_from_str(iso, CANONICAL_FORMAT) {
        Ok(dt) => dt.format("%Y-%m-%d %H:%M UTC").to_string(),
        Err(_) => iso.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_known_formats() {
        assert_eq!(normalize("2024-03-05T14:30:00").as_deref(), Some("2024-03-05T14:30:00Z"));
        assert_eq!(normalize("2024-03-05 14:30:00").as_deref(), Some("2024-03-05T14:30:00Z"));
        assert_eq!(normalize("2024-03-05 14:30").as_deref(), Some("2024-03-05T14:30:00Z"));
        assert_eq!(normalize("2024-03-05").as_deref(), Some("2024-03-05T00:00:00Z"));
    }

    #[test]
    fn test_normalize_strips_fraction_and_offset() {
        assert_eq!(
            normalize("2024-03-05 14:30:00.123456").as_deref(),
            Some("2024-03-05T14:30:00Z")
        );
        assert_eq!(
            normalize("2024-03-05 14:30:00+00:00").as_deref(),
            Some("2024-03-05T14:30:00Z")
        );
    }

    #[test]
    fn test_normalize_passthrough() {
        assert_eq!(normalize("2024-03-05T14:30:00Z").as_deref(), Some("2024-03-05T14:30:00Z"));
        assert_eq!(normalize("last tuesday").as_deref(), Some("last tuesday"));
        assert_eq!(normalize(""), None);
        assert_eq!(normalize_opt(None), None);
    }

    #[test]
    fn test_combine_date_time() {
        assert_eq!(
            combine_date_time("2024-03-05", "09:15").as_deref(),
            Some("2024-03-05T09:15:00Z")
        );
        assert_eq!(
            combine_date_time("2024-03-05", "").as_deref(),
            Some("2024-03-05T00:00:00Z")
        );
        assert_eq!(combine_date_time("", "09:15"), None);
    }

    #[test]
    fn test_utc_now_is_canonical() {
        let now = utc_now();
        assert!(NaiveDateTime::parse_from_str(&now, CANONICAL_FORMAT).is_ok());
        assert_eq!(normalize(&now), Some(now));
    }

    #[test]
    fn test_display() {
        assert_eq!(display("2024-03-05T14:30:00Z"), "2024-03-05 14:30 UTC");
        assert_eq!(display("whenever"), "whenever");
    }
}
