use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use waymark_history::{HistoryBackend, HistoryError, HistoryRecord, HistorySnapshot};

/// In-memory backend with the same revision semantics as the file backend.
#[derive(Default)]
pub struct StubBackend {
    snapshot: Mutex<HistorySnapshot>,
    saves: AtomicUsize,
    foreign_write: AtomicBool,
}

impl StubBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<HistoryRecord>) -> Self {
        Self {
            snapshot: Mutex::new(HistorySnapshot {
                records,
                revision: 1,
            }),
            ..Self::default()
        }
    }

    pub fn records(&self) -> Vec<HistoryRecord> {
        self.snapshot.lock().records.clone()
    }

    pub fn revision(&self) -> u64 {
        self.snapshot.lock().revision
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Pretend another writer commits between the next load and save.
    pub fn interfere_on_next_save(&self) {
        self.foreign_write.store(true, Ordering::SeqCst);
    }
}

impl HistoryBackend for StubBackend {
    fn load(&self) -> Result<HistorySnapshot, HistoryError> {
        Ok(self.snapshot.lock().clone())
    }

    fn save(
        &self,
        records: &[HistoryRecord],
        expected_revision: u64,
    ) -> Result<u64, HistoryError> {
        let mut snapshot = self.snapshot.lock();
        if self.foreign_write.swap(false, Ordering::SeqCst) {
            snapshot.revision += 1;
        }
        if snapshot.revision != expected_revision {
            return Err(HistoryError::Conflict {
                expected: expected_revision,
                found: snapshot.revision,
            });
        }
        snapshot.records = records.to_vec();
        snapshot.revision += 1;
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(snapshot.revision)
    }
}

/// Kind of failure a [`FailingBackend`] injects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    Io,
    Corrupt,
}

impl Failure {
    fn error(self) -> HistoryError {
        match self {
            Failure::Io => HistoryError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "injected failure",
            )),
            Failure::Corrupt => HistoryError::Corrupt("injected corruption".to_string()),
        }
    }
}

/// Backend that fails loads and/or saves on demand.
pub struct FailingBackend {
    records: Vec<HistoryRecord>,
    load_failure: Option<Failure>,
    save_failure: Option<Failure>,
}

impl FailingBackend {
    /// Loads succeed with `records`; every save fails with an IO error.
    pub fn read_only(records: Vec<HistoryRecord>) -> Self {
        Self {
            records,
            load_failure: None,
            save_failure: Some(Failure::Io),
        }
    }

    /// Loads report the document as corrupt; saves succeed.
    pub fn corrupt() -> Self {
        Self {
            records: Vec::new(),
            load_failure: Some(Failure::Corrupt),
            save_failure: None,
        }
    }

    /// Both loads and saves fail with IO errors.
    pub fn unavailable() -> Self {
        Self {
            records: Vec::new(),
            load_failure: Some(Failure::Io),
            save_failure: Some(Failure::Io),
        }
    }
}

impl HistoryBackend for FailingBackend {
    fn load(&self) -> Result<HistorySnapshot, HistoryError> {
        match self.load_failure {
            Some(failure) => Err(failure.error()),
            None => Ok(HistorySnapshot {
                records: self.records.clone(),
                revision: 1,
            }),
        }
    }

    fn save(
        &self,
        _records: &[HistoryRecord],
        expected_revision: u64,
    ) -> Result<u64, HistoryError> {
        match self.save_failure {
            Some(failure) => Err(failure.error()),
            None => Ok(expected_revision + 1),
        }
    }
}
