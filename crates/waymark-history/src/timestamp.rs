//! Timestamp formatting and lenient parsing for history records.
//!
//! New records are stamped with RFC 3339 local time. Parsing also accepts
//! naive ISO-8601 date-times and bare dates (interpreted as local time) so
//! documents written by older tools still participate in retention and
//! statistics.

use chrono::{
    DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone,
};
use std::fmt::Display;

/// Naive layouts tried after RFC 3339.
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Current local time as a record timestamp.
pub fn now() -> String {
    format_timestamp(&Local::now())
}

/// Format an instant the way records store it.
pub fn format_timestamp<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    at.to_rfc3339_opts(SecondsFormat::Micros, false)
}

/// Parse a stored timestamp, returning `None` when it is not a recognizable instant.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed);
    }
    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })?;
    Some(localize(naive))
}

/// Calendar date of a stored timestamp, as written in its own offset.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    parse_timestamp(raw).map(|parsed| parsed.date_naive())
}

/// Interpret a naive date-time in the local zone.
fn localize(naive: NaiveDateTime) -> DateTime<FixedOffset> {
    match Local.from_local_datetime(&naive).earliest() {
        Some(local) => local.fixed_offset(),
        // Skipped by a DST transition; fall back to reading it as UTC.
        None => naive.and_utc().fixed_offset(),
    }
}
