//! Error types for history operations.

/// Errors returned by history backends and the store.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization error.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    /// Persisted document could not be understood.
    #[error("corrupt history document: {0}")]
    Corrupt(String),
    /// Persisted revision moved since the collection was loaded.
    #[error("revision conflict (expected={expected}, found={found})")]
    Conflict { expected: u64, found: u64 },
}

impl HistoryError {
    /// True when the error means the document was unreadable rather than unwritable.
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::Corrupt(_))
    }
}
