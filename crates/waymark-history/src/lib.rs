//! Bounded, persisted history of typed user-action records.
//!
//! The store keeps a newest-first collection capped at a configured size,
//! persists it as a single JSON document, and derives recent locations and
//! aggregate statistics from it on demand.

pub mod backend;
pub mod error;
pub mod locations;
pub mod model;
pub mod policy;
pub mod stats;
pub mod store;
pub mod timestamp;

/// Persistence backend interface and the default JSON file implementation.
pub use backend::{HistoryBackend, HistorySnapshot, JsonFileBackend};
/// History error type.
pub use error::HistoryError;
/// Location extraction options.
pub use locations::{LocationOptions, ROUTE_PLANNING};
/// Record model and derived views.
pub use model::{HistoryRecord, HistoryStatistics, Location};
/// Capacity and retention policies.
pub use policy::{CapacityPolicy, RetentionPolicy};
/// History store and its options.
pub use store::{HistoryOptions, HistoryQuery, HistoryStore};
