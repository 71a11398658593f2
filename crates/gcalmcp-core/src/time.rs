//! Timestamp helpers for tool arguments.
//!
//! Tool arguments carry RFC 3339 timestamps that must spell out their UTC
//! offset (`Z` or `±HH:MM`); a bare local time is ambiguous for the
//! Calendar API.

use std::sync::LazyLock;

use chrono::{DateTime, Duration, FixedOffset};
use regex::Regex;

/// RFC 3339 date-time with a mandatory offset.
static TIMESTAMP_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d+)?(Z|[+-]\d{2}:\d{2})$")
        .expect("Invalid timestamp regex")
});

/// Returns true if `value` is an RFC 3339 date-time with an explicit offset.
pub fn is_timestamp_with_offset(value: &str) -> bool {
    TIMESTAMP_REGEX.is_match(value) && DateTime::parse_from_rfc3339(value).is_ok()
}

/// Parses a timestamp accepted by [`is_timestamp_with_offset`].
pub fn parse_timestamp(value: &str) -> Option<DateTime<FixedOffset>> {
    if !TIMESTAMP_REGEX.is_match(value) {
        return None;
    }
    DateTime::parse_from_rfc3339(value).ok()
}

/// Duration from `start` to `end`, or `None` if either fails to parse.
pub fn window_span(start: &str, end: &str) -> Option<Duration> {
    Some(parse_timestamp(end)? - parse_timestamp(start)?)
}
