//! Aggregate statistics over the history collection.

use crate::model::{HistoryRecord, HistoryStatistics};
use crate::timestamp::parse_date;

/// Count records by type and by calendar date.
///
/// `most_recent` and `oldest` are the raw timestamps at the two ends of the
/// newest-first collection, so they follow insertion order even when a
/// timestamp is malformed.
pub fn aggregate(records: &[HistoryRecord]) -> HistoryStatistics {
    let mut stats = HistoryStatistics {
        total_records: records.len(),
        most_recent: records.first().map(|record| record.timestamp.clone()),
        oldest: records.last().map(|record| record.timestamp.clone()),
        ..HistoryStatistics::default()
    };

    for record in records {
        *stats.by_type.entry(record.kind.clone()).or_default() += 1;
        if let Some(date) = parse_date(&record.timestamp) {
            *stats
                .by_date
                .entry(date.format("%Y-%m-%d").to_string())
                .or_default() += 1;
        }
    }
    stats
}
