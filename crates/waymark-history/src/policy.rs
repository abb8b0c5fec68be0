//! Capacity and retention policies applied to the history collection.

use crate::model::HistoryRecord;
use chrono::{DateTime, FixedOffset, TimeDelta};
use log::debug;

/// Default maximum number of records kept.
pub const DEFAULT_MAX_ITEMS: usize = 100;
/// Default record age, in days, before cleanup removes it.
pub const DEFAULT_AUTO_CLEAR_DAYS: u32 = 30;

/// Upper bound on the collection length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityPolicy {
    /// Maximum records kept; older entries past this are dropped.
    pub max_items: usize,
}

impl Default for CapacityPolicy {
    fn default() -> Self {
        Self {
            max_items: DEFAULT_MAX_ITEMS,
        }
    }
}

impl CapacityPolicy {
    /// Truncate a newest-first collection to the bound, returning how many were evicted.
    pub fn enforce(&self, records: &mut Vec<HistoryRecord>) -> usize {
        let evicted = records.len().saturating_sub(self.max_items);
        if evicted > 0 {
            records.truncate(self.max_items);
            debug!("evicted oldest history records (count={evicted})");
        }
        evicted
    }
}

/// Age-based retention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Records older than this many days are removed by cleanup.
    pub max_age_days: u32,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            max_age_days: DEFAULT_AUTO_CLEAR_DAYS,
        }
    }
}

impl RetentionPolicy {
    /// Oldest instant still retained at `now`; `None` if it underflows the calendar.
    pub fn cutoff(&self, now: DateTime<FixedOffset>) -> Option<DateTime<FixedOffset>> {
        now.checked_sub_signed(TimeDelta::days(i64::from(self.max_age_days)))
    }

    /// Whether a record falls before the cutoff. Unparsable timestamps never expire.
    pub fn is_expired(record: &HistoryRecord, cutoff: DateTime<FixedOffset>) -> bool {
        record
            .created_at()
            .is_some_and(|created_at| created_at < cutoff)
    }

    /// Drop expired records in place, returning how many were removed.
    pub fn apply(&self, records: &mut Vec<HistoryRecord>, now: DateTime<FixedOffset>) -> usize {
        let Some(cutoff) = self.cutoff(now) else {
            return 0;
        };
        let before = records.len();
        records.retain(|record| !Self::is_expired(record, cutoff));
        before - records.len()
    }
}
