//! Record model and the derived views computed from it.

use crate::timestamp;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Persisted history record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryRecord {
    /// Record identifier, unique within the collection.
    pub id: String,
    /// Open-ended record type, e.g. `route_planning`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Creation time as an ISO-8601 string.
    pub timestamp: String,
    /// Opaque key-value payload.
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl HistoryRecord {
    /// Create a record with a fresh id stamped with the current time.
    pub fn new(kind: impl Into<String>, data: Map<String, Value>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind: kind.into(),
            timestamp: timestamp::now(),
            data,
        }
    }

    /// Replace the timestamp, e.g. when importing older entries.
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = timestamp.into();
        self
    }

    /// Parsed creation time, if the stored string is well formed.
    pub fn created_at(&self) -> Option<DateTime<FixedOffset>> {
        timestamp::parse_timestamp(&self.timestamp)
    }

    /// String value stored under `key` in the payload.
    pub fn data_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }
}

/// A distinct coordinate pulled from route-planning history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Location {
    /// Raw `"lng,lat"` string as stored in the record.
    pub coordinates: String,
    pub longitude: f64,
    pub latitude: f64,
    /// Timestamp of the record the coordinate was last used in.
    pub last_used: String,
}

/// Aggregate counts over the history collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HistoryStatistics {
    pub total_records: usize,
    /// Record count per type.
    pub by_type: BTreeMap<String, usize>,
    /// Record count per calendar date (`YYYY-MM-DD`); unparsable timestamps are left out.
    pub by_date: BTreeMap<String, usize>,
    /// Timestamp of the newest record.
    pub most_recent: Option<String>,
    /// Timestamp of the oldest record.
    pub oldest: Option<String>,
}
