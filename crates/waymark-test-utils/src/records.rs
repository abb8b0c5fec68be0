use chrono::{Local, TimeDelta};
use serde_json::{Map, Value, json};
use waymark_history::HistoryRecord;
use waymark_history::timestamp::format_timestamp;

/// Build a payload from string pairs.
pub fn payload(pairs: &[(&str, &str)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), json!(value)))
        .collect()
}

/// Route-planning record with the given endpoints.
pub fn route_record(origin: &str, destination: &str) -> HistoryRecord {
    HistoryRecord::new(
        "route_planning",
        payload(&[("origin", origin), ("destination", destination)]),
    )
}

/// Record stamped `days` days before now.
pub fn record_aged(kind: &str, days: i64) -> HistoryRecord {
    let at = Local::now() - TimeDelta::days(days);
    record_at(kind, &format_timestamp(&at))
}

/// Record with an explicit raw timestamp.
pub fn record_at(kind: &str, timestamp: &str) -> HistoryRecord {
    HistoryRecord::new(kind, Map::new()).with_timestamp(timestamp)
}
