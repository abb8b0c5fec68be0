//! Recent distinct locations derived from route-planning history.

use crate::model::{HistoryRecord, Location};
use std::collections::HashSet;

/// Record type whose payload carries `origin`/`destination` coordinates.
pub const ROUTE_PLANNING: &str = "route_planning";
/// Payload keys examined per record, in order.
const CANDIDATE_KEYS: [&str; 2] = ["origin", "destination"];

/// Options for location extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationOptions {
    /// Record type scanned for coordinates.
    pub record_kind: String,
    /// Records fetched per requested location. A heuristic: duplicates or
    /// malformed coordinates can still leave the result short of the limit.
    pub overfetch_factor: usize,
}

impl Default for LocationOptions {
    fn default() -> Self {
        Self {
            record_kind: ROUTE_PLANNING.to_string(),
            overfetch_factor: 2,
        }
    }
}

impl LocationOptions {
    /// Number of candidate records to pull for `limit` locations.
    pub fn fetch_limit(&self, limit: usize) -> usize {
        limit.saturating_mul(self.overfetch_factor.max(1))
    }
}

/// Collect up to `limit` distinct locations from newest-first records.
///
/// `origin` is considered before `destination` within each record. Empty,
/// repeated, or malformed coordinates are skipped.
pub fn extract_locations(records: &[HistoryRecord], limit: usize) -> Vec<Location> {
    let mut locations = Vec::new();
    if limit == 0 {
        return locations;
    }
    let mut seen: HashSet<String> = HashSet::new();

    for record in records {
        for key in CANDIDATE_KEYS {
            let Some(raw) = record.data_str(key) else {
                continue;
            };
            if raw.is_empty() || seen.contains(raw) {
                continue;
            }
            let Some((longitude, latitude)) = parse_coordinates(raw) else {
                continue;
            };
            seen.insert(raw.to_string());
            locations.push(Location {
                coordinates: raw.to_string(),
                longitude,
                latitude,
                last_used: record.timestamp.clone(),
            });
            if locations.len() >= limit {
                return locations;
            }
        }
    }
    locations
}

/// Parse `"lng,lat"` into a pair of finite numbers.
pub fn parse_coordinates(raw: &str) -> Option<(f64, f64)> {
    let mut parts = raw.split(',');
    let longitude = parse_component(parts.next()?)?;
    let latitude = parse_component(parts.next()?)?;
    if parts.next().is_some() {
        return None;
    }
    Some((longitude, latitude))
}

fn parse_component(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}
