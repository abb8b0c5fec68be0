//! Persistence backends for the history collection.

use crate::error::HistoryError;
use crate::model::HistoryRecord;
use log::{debug, info};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Layout version written into every document.
pub const DOCUMENT_VERSION: u32 = 1;

/// The collection as read from a backend, with the revision it was read at.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistorySnapshot {
    /// Records, newest first.
    pub records: Vec<HistoryRecord>,
    /// Revision of the persisted document; 0 when nothing was persisted yet.
    pub revision: u64,
}

/// Whole-document persistence for the history collection.
pub trait HistoryBackend: Send + Sync {
    /// Read the persisted collection. A missing document is an empty snapshot.
    fn load(&self) -> Result<HistorySnapshot, HistoryError>;

    /// Replace the persisted collection.
    ///
    /// Fails with [`HistoryError::Conflict`] when the persisted revision no
    /// longer matches `expected_revision`. Returns the new revision.
    fn save(&self, records: &[HistoryRecord], expected_revision: u64)
    -> Result<u64, HistoryError>;
}

/// Document layout written by [`JsonFileBackend`].
#[derive(Serialize)]
struct DocumentRef<'a> {
    version: u32,
    revision: u64,
    records: &'a [HistoryRecord],
}

/// Accepted document layouts.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredDocument {
    Versioned {
        version: u32,
        #[serde(default)]
        revision: u64,
        records: Vec<HistoryRecord>,
    },
    /// Bare array written by earlier tools.
    Legacy(Vec<HistoryRecord>),
}

/// Single JSON file holding the full collection.
#[derive(Debug)]
pub struct JsonFileBackend {
    /// Document location.
    path: PathBuf,
    /// Serialize check-and-replace within this process.
    write_lock: Mutex<()>,
}

impl JsonFileBackend {
    /// Create a backend for the document at `path`. Nothing touches the disk until the first save.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        info!("initialized history file backend (path={})", path.display());
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    /// Document location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Unique sibling the next document is written to before the rename.
    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_else(|| "history.json".into());
        name.push(format!(".{}.tmp", Uuid::new_v4().simple()));
        self.path.with_file_name(name)
    }

    fn read_document(&self) -> Result<HistorySnapshot, HistoryError> {
        let contents = match fs::read(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("history document missing (path={})", self.path.display());
                return Ok(HistorySnapshot::default());
            }
            Err(err) => return Err(HistoryError::Io(err)),
        };
        if contents.iter().all(u8::is_ascii_whitespace) {
            return Ok(HistorySnapshot::default());
        }
        // Invalid UTF-8 is a content problem, not an IO one.
        let document: StoredDocument = serde_json::from_slice(&contents)
            .map_err(|err| HistoryError::Corrupt(err.to_string()))?;
        match document {
            StoredDocument::Versioned {
                version,
                revision,
                records,
            } => {
                if version != DOCUMENT_VERSION {
                    return Err(HistoryError::Corrupt(format!(
                        "unsupported document version {version}"
                    )));
                }
                Ok(HistorySnapshot { records, revision })
            }
            StoredDocument::Legacy(records) => Ok(HistorySnapshot {
                records,
                revision: 0,
            }),
        }
    }

    /// Revision currently on disk. A corrupt document counts as revision 0 so it can be replaced.
    fn persisted_revision(&self) -> Result<u64, HistoryError> {
        match self.read_document() {
            Ok(snapshot) => Ok(snapshot.revision),
            Err(HistoryError::Corrupt(_)) => Ok(0),
            Err(err) => Err(err),
        }
    }
}

impl HistoryBackend for JsonFileBackend {
    fn load(&self) -> Result<HistorySnapshot, HistoryError> {
        let snapshot = self.read_document()?;
        debug!(
            "loaded history document (path={}, revision={}, records={})",
            self.path.display(),
            snapshot.revision,
            snapshot.records.len()
        );
        Ok(snapshot)
    }

    fn save(
        &self,
        records: &[HistoryRecord],
        expected_revision: u64,
    ) -> Result<u64, HistoryError> {
        let _guard = self.write_lock.lock();
        let found = self.persisted_revision()?;
        if found != expected_revision {
            return Err(HistoryError::Conflict {
                expected: expected_revision,
                found,
            });
        }

        let revision = found + 1;
        let body = serde_json::to_vec_pretty(&DocumentRef {
            version: DOCUMENT_VERSION,
            revision,
            records,
        })?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let temp_path = self.temp_path();
        if let Err(err) = write_and_replace(&temp_path, &self.path, &body) {
            let _ = fs::remove_file(&temp_path);
            return Err(err.into());
        }
        debug!(
            "saved history document (path={}, revision={}, records={})",
            self.path.display(),
            revision,
            records.len()
        );
        Ok(revision)
    }
}

fn write_and_replace(temp_path: &Path, path: &Path, body: &[u8]) -> std::io::Result<()> {
    let mut file = OpenOptions::new()
        .create_new(true)
        .write(true)
        .open(temp_path)?;
    file.write_all(body)?;
    file.sync_all()?;
    drop(file);
    fs::rename(temp_path, path)
}

#[cfg(test)]
mod tests {
    use super::{HistoryBackend, JsonFileBackend};
    use crate::HistoryError;
    use crate::model::HistoryRecord;
    use pretty_assertions::assert_eq;
    use serde_json::{Map, json};
    use tempfile::tempdir;

    fn record(kind: &str, note: &str) -> HistoryRecord {
        let mut data = Map::new();
        data.insert("note".to_string(), json!(note));
        data.insert("nested".to_string(), json!({ "tags": ["a", "b"], "n": 3 }));
        HistoryRecord::new(kind, data)
    }

    #[test]
    fn missing_document_loads_empty() {
        let temp = tempdir().expect("tempdir");
        let backend = JsonFileBackend::new(temp.path().join("history.json"));
        let snapshot = backend.load().expect("load");
        assert!(snapshot.records.is_empty());
        assert_eq!(snapshot.revision, 0);
    }

    #[test]
    fn save_creates_parent_dirs_and_round_trips_unicode() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("nested").join("dir").join("history.json");
        let backend = JsonFileBackend::new(&path);
        let records = vec![record("route_planning", "北京 → 上海"), record("note", "café ✓")];

        let revision = backend.save(&records, 0).expect("save");
        assert_eq!(revision, 1);

        let raw = std::fs::read_to_string(&path).expect("read");
        assert!(raw.contains("北京 → 上海"));

        let snapshot = backend.load().expect("load");
        assert_eq!(snapshot.records, records);
        assert_eq!(snapshot.revision, 1);
        assert_ne!(backend.temp_path(), backend.temp_path());
        let leftovers: Vec<_> = std::fs::read_dir(path.parent().expect("parent"))
            .expect("read_dir")
            .map(|entry| entry.expect("entry").file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from("history.json")]);
    }

    #[test]
    fn stale_revision_is_rejected() {
        let temp = tempdir().expect("tempdir");
        let backend = JsonFileBackend::new(temp.path().join("history.json"));
        backend.save(&[record("a", "one")], 0).expect("first save");

        let err = backend
            .save(&[record("b", "two")], 0)
            .expect_err("stale save");
        assert!(matches!(
            err,
            HistoryError::Conflict {
                expected: 0,
                found: 1
            }
        ));
        assert_eq!(backend.load().expect("load").records[0].kind, "a");
    }

    #[test]
    fn corrupt_document_is_reported_and_replaceable() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("history.json");
        std::fs::write(&path, "{ not json").expect("write");
        let backend = JsonFileBackend::new(&path);

        let err = backend.load().expect_err("corrupt");
        assert!(err.is_corrupt());

        backend.save(&[record("a", "fresh")], 0).expect("overwrite");
        assert_eq!(backend.load().expect("load").records.len(), 1);
    }

    #[test]
    fn non_utf8_document_is_corrupt_and_replaceable() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("history.json");
        std::fs::write(&path, [0xff, 0xfe, b'[', b']']).expect("write");
        let backend = JsonFileBackend::new(&path);

        let err = backend.load().expect_err("invalid utf-8");
        assert!(err.is_corrupt());

        assert_eq!(backend.save(&[record("a", "fresh")], 0).expect("overwrite"), 1);
        assert_eq!(backend.load().expect("load").records.len(), 1);
    }

    #[test]
    fn legacy_array_loads_at_revision_zero() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("history.json");
        std::fs::write(
            &path,
            r#"[{"id":"1","type":"route_planning","timestamp":"2024-01-01T00:00:00","data":{"origin":"1,2"}}]"#,
        )
        .expect("write");
        let backend = JsonFileBackend::new(&path);
        let snapshot = backend.load().expect("load");
        assert_eq!(snapshot.revision, 0);
        assert_eq!(snapshot.records[0].data_str("origin"), Some("1,2"));
    }

    #[test]
    fn unknown_version_is_corrupt() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("history.json");
        std::fs::write(&path, r#"{"version":9,"revision":1,"records":[]}"#).expect("write");
        let err = JsonFileBackend::new(&path).load().expect_err("version");
        assert!(err.is_corrupt());
    }
}
