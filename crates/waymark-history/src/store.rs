//! History store: load-transform-save operations over a backend.

use crate::backend::{HistoryBackend, HistorySnapshot, JsonFileBackend};
use crate::error::HistoryError;
use crate::locations::{LocationOptions, extract_locations};
use crate::model::{HistoryRecord, HistoryStatistics, Location};
use crate::policy::{CapacityPolicy, RetentionPolicy};
use crate::stats::aggregate;
use chrono::{DateTime, Local, TimeZone};
use log::{debug, info, warn};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Arc;

/// Construction-time settings for a [`HistoryStore`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryOptions {
    /// Collection length bound.
    pub capacity: CapacityPolicy,
    /// Age limit applied by [`HistoryStore::auto_cleanup`].
    pub retention: RetentionPolicy,
    /// Location extraction settings.
    pub locations: LocationOptions,
}

impl HistoryOptions {
    /// Options with the given bound and retention age, other settings default.
    pub fn new(max_items: usize, auto_clear_days: u32) -> Self {
        Self {
            capacity: CapacityPolicy { max_items },
            retention: RetentionPolicy {
                max_age_days: auto_clear_days,
            },
            locations: LocationOptions::default(),
        }
    }
}

/// Filter for [`HistoryStore::history`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryQuery {
    /// Exact record type to keep.
    pub kind: Option<String>,
    /// Maximum records returned, newest first.
    pub limit: Option<usize>,
}

impl HistoryQuery {
    /// Every record.
    pub fn all() -> Self {
        Self::default()
    }

    /// Records of one type.
    pub fn of_kind(kind: impl Into<String>) -> Self {
        Self {
            kind: Some(kind.into()),
            limit: None,
        }
    }

    /// Cap the number of records returned.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    fn apply(&self, records: Vec<HistoryRecord>) -> Vec<HistoryRecord> {
        let limit = self.limit.unwrap_or(usize::MAX);
        records
            .into_iter()
            .filter(|record| self.kind.as_deref().is_none_or(|kind| record.kind == kind))
            .take(limit)
            .collect()
    }
}

/// Bounded, newest-first history persisted through a [`HistoryBackend`].
///
/// Every operation reloads the collection; mutations rewrite it whole. Reads
/// never fail: an unreadable or corrupt document is treated as empty and
/// logged. Mutations report failures as [`HistoryError`] after logging them.
pub struct HistoryStore {
    backend: Arc<dyn HistoryBackend>,
    options: HistoryOptions,
    /// Single writer point for load-transform-save cycles.
    write_lock: Mutex<()>,
}

impl HistoryStore {
    /// Create a store over an explicit backend.
    pub fn new(backend: Arc<dyn HistoryBackend>, options: HistoryOptions) -> Self {
        info!(
            "initialized history store (max_items={}, auto_clear_days={})",
            options.capacity.max_items, options.retention.max_age_days
        );
        Self {
            backend,
            options,
            write_lock: Mutex::new(()),
        }
    }

    /// Create a store persisting to a JSON document at `path`.
    pub fn open(path: impl AsRef<Path>, options: HistoryOptions) -> Self {
        Self::new(Arc::new(JsonFileBackend::new(path)), options)
    }

    /// Settings the store was built with.
    pub fn options(&self) -> &HistoryOptions {
        &self.options
    }

    /// Record a new action at the head of the history.
    pub fn add_record(
        &self,
        kind: &str,
        data: Map<String, Value>,
    ) -> Result<HistoryRecord, HistoryError> {
        // Stamp under the write lock so head order matches timestamp order.
        let record = self.mutate("add", |records| {
            let record = HistoryRecord::new(kind, data);
            records.insert(0, record.clone());
            record
        })?;
        info!("history record added (id={}, type={})", record.id, record.kind);
        Ok(record)
    }

    /// Insert a prepared record at the head, replacing any record with the same id.
    pub fn insert_record(&self, record: HistoryRecord) -> Result<HistoryRecord, HistoryError> {
        let inserted = record.clone();
        self.mutate("insert", move |records| {
            records.retain(|existing| existing.id != record.id);
            records.insert(0, record);
        })?;
        info!(
            "history record inserted (id={}, type={})",
            inserted.id, inserted.kind
        );
        Ok(inserted)
    }

    /// Records matching `query`, newest first.
    pub fn history(&self, query: &HistoryQuery) -> Vec<HistoryRecord> {
        query.apply(self.load_snapshot().records)
    }

    /// Look up a single record by id.
    pub fn record(&self, id: &str) -> Option<HistoryRecord> {
        self.load_snapshot()
            .records
            .into_iter()
            .find(|record| record.id == id)
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.load_snapshot().records.len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Delete the record with `id`. Unknown ids are a no-op returning 0.
    pub fn delete_record(&self, id: &str) -> Result<usize, HistoryError> {
        let removed = self.mutate("delete", |records| {
            let before = records.len();
            records.retain(|record| record.id != id);
            before - records.len()
        })?;
        info!("history delete (id={id}, removed={removed})");
        Ok(removed)
    }

    /// Remove every record, or only those of `kind`.
    pub fn clear_history(&self, kind: Option<&str>) -> Result<usize, HistoryError> {
        let removed = self.mutate("clear", |records| {
            let before = records.len();
            match kind {
                Some(kind) => records.retain(|record| record.kind != kind),
                None => records.clear(),
            }
            before - records.len()
        })?;
        info!(
            "history cleared (type={}, removed={removed})",
            kind.unwrap_or("*")
        );
        Ok(removed)
    }

    /// Drop records older than the configured retention age.
    pub fn auto_cleanup(&self) -> Result<usize, HistoryError> {
        self.auto_cleanup_at(&Local::now(), self.options.retention.max_age_days)
    }

    /// Drop records older than `max_age_days` before `now`.
    ///
    /// Records whose timestamp cannot be parsed are kept.
    pub fn auto_cleanup_at<Tz: TimeZone>(
        &self,
        now: &DateTime<Tz>,
        max_age_days: u32,
    ) -> Result<usize, HistoryError> {
        let policy = RetentionPolicy { max_age_days };
        let now = now.fixed_offset();
        let removed = self.mutate("cleanup", |records| policy.apply(records, now))?;
        info!("history cleanup (max_age_days={max_age_days}, removed={removed})");
        Ok(removed)
    }

    /// Most recently used distinct coordinates from route-planning records.
    pub fn recent_locations(&self, limit: usize) -> Vec<Location> {
        let options = &self.options.locations;
        let query =
            HistoryQuery::of_kind(options.record_kind.clone()).limit(options.fetch_limit(limit));
        let candidates = self.history(&query);
        let locations = extract_locations(&candidates, limit);
        debug!(
            "recent locations (limit={limit}, candidates={}, returned={})",
            candidates.len(),
            locations.len()
        );
        locations
    }

    /// Counts by type and date plus the newest and oldest timestamps.
    pub fn statistics(&self) -> HistoryStatistics {
        aggregate(&self.load_snapshot().records)
    }

    /// Load the collection, treating any failure as empty history.
    fn load_snapshot(&self) -> HistorySnapshot {
        match self.backend.load() {
            Ok(snapshot) => snapshot,
            Err(err) if err.is_corrupt() => {
                warn!("history document is corrupt; treating as empty: {err}");
                HistorySnapshot::default()
            }
            Err(err) => {
                warn!("failed to load history; treating as empty: {err}");
                HistorySnapshot::default()
            }
        }
    }

    /// Run one load-transform-save cycle under the write lock.
    fn mutate<T>(
        &self,
        action: &str,
        apply: impl FnOnce(&mut Vec<HistoryRecord>) -> T,
    ) -> Result<T, HistoryError> {
        let _guard = self.write_lock.lock();
        let HistorySnapshot {
            mut records,
            revision,
        } = self.load_snapshot();
        let outcome = apply(&mut records);
        self.options.capacity.enforce(&mut records);
        match self.backend.save(&records, revision) {
            Ok(next) => {
                debug!(
                    "history {action} persisted (revision={next}, records={})",
                    records.len()
                );
                Ok(outcome)
            }
            Err(err) => {
                warn!("history {action} failed: {err}");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{HistoryOptions, HistoryQuery, HistoryStore};
    use crate::model::HistoryRecord;
    use pretty_assertions::assert_eq;
    use serde_json::{Map, json};
    use tempfile::tempdir;

    fn data(pairs: &[(&str, &str)]) -> Map<String, serde_json::Value> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), json!(value)))
            .collect()
    }

    #[test]
    fn query_filters_then_limits() {
        let records = vec![
            HistoryRecord::new("a", Map::new()),
            HistoryRecord::new("b", Map::new()),
            HistoryRecord::new("a", Map::new()),
            HistoryRecord::new("a", Map::new()),
        ];
        let picked = HistoryQuery::of_kind("a").limit(2).apply(records.clone());
        assert_eq!(picked, vec![records[0].clone(), records[2].clone()]);
        assert_eq!(HistoryQuery::all().apply(records.clone()), records);
        assert!(HistoryQuery::of_kind("zzz").apply(records).is_empty());
    }

    #[test]
    fn insert_record_replaces_duplicate_ids() {
        let temp = tempdir().expect("tempdir");
        let store = HistoryStore::open(temp.path().join("history.json"), HistoryOptions::default());
        let first = store
            .add_record("note", data(&[("v", "1")]))
            .expect("add");
        let mut replacement = first.clone();
        replacement.data = data(&[("v", "2")]);
        store.insert_record(replacement.clone()).expect("insert");

        assert_eq!(store.history(&HistoryQuery::all()), vec![replacement]);
    }

    #[test]
    fn record_lookup_by_id() {
        let temp = tempdir().expect("tempdir");
        let store = HistoryStore::open(temp.path().join("history.json"), HistoryOptions::default());
        let added = store.add_record("note", Map::new()).expect("add");
        assert_eq!(store.record(&added.id), Some(added));
        assert_eq!(store.record("missing"), None);
        assert_eq!(store.len(), 1);
        assert!(!store.is_empty());
    }
}
