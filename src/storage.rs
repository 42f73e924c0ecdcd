use crate::config::write_atomic;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::{fs, io};
use thiserror::Error;
use tracing::warn;

pub const BEST_TIME_KEY: &str = "shroom-best-survival-time";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("record file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("record file is not valid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("stored best time {0:?} is not a number")]
    BadValue(String),
    #[error("record storage unavailable")]
    Unavailable,
}

/// Durable home of the single best-survival-time scalar.
pub trait BestTimeStore {
    /// `Ok(None)` when nothing has been recorded yet.
    fn load(&self) -> Result<Option<f64>, StorageError>;
    fn save(&mut self, best_secs: f64) -> Result<(), StorageError>;
}

/// Key/value record file; the best time is stored as a decimal string.
pub struct FileRecordStore {
    path: PathBuf,
}

impl FileRecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_records(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(s) => Ok(serde_json::from_str(&s)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(source) => Err(StorageError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

fn parse_best(raw: &str) -> Result<f64, StorageError> {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(v),
        _ => Err(StorageError::BadValue(raw.to_string())),
    }
}

impl BestTimeStore for FileRecordStore {
    fn load(&self) -> Result<Option<f64>, StorageError> {
        let records = self.read_records()?;
        records.get(BEST_TIME_KEY).map(|raw| parse_best(raw)).transpose()
    }

    fn save(&mut self, best_secs: f64) -> Result<(), StorageError> {
        // keep unrelated keys; only a corrupt file is replaced
        let mut records = match self.read_records() {
            Ok(records) => records,
            Err(StorageError::Json(err)) => {
                warn!(path = %self.path.display(), %err, "replacing corrupt records file");
                BTreeMap::new()
            }
            Err(err) => return Err(err),
        };
        records.insert(BEST_TIME_KEY.to_string(), best_secs.to_string());
        let data = serde_json::to_vec_pretty(&records)?;
        write_atomic(&self.path, &data).map_err(|source| StorageError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

/// In-memory store; `failing()` builds one that rejects every call.
#[derive(Debug, Default)]
pub struct MemoryStore {
    value: Option<f64>,
    fail: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(value: f64) -> Self {
        Self {
            value: Some(value),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            value: None,
            fail: true,
        }
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }
}

impl BestTimeStore for MemoryStore {
    fn load(&self) -> Result<Option<f64>, StorageError> {
        if self.fail {
            return Err(StorageError::Unavailable);
        }
        Ok(self.value)
    }

    fn save(&mut self, best_secs: f64) -> Result<(), StorageError> {
        if self.fail {
            return Err(StorageError::Unavailable);
        }
        self.value = Some(best_secs);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_means_no_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileRecordStore::new(dir.path().join("records.json"));
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn best_time_is_written_as_decimal_string() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");
        let mut store = FileRecordStore::new(&path);
        store.save(42.5).unwrap();

        let raw: BTreeMap<String, String> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw.get(BEST_TIME_KEY).map(String::as_str), Some("42.5"));
        assert_eq!(store.load().unwrap(), Some(42.5));
    }

    #[test]
    fn garbage_value_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");
        fs::write(&path, format!(r#"{{"{BEST_TIME_KEY}": "soon"}}"#)).unwrap();
        let store = FileRecordStore::new(&path);
        assert!(matches!(store.load(), Err(StorageError::BadValue(_))));
    }

    #[test]
    fn other_keys_survive_a_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");
        fs::write(&path, r#"{"volume": "0.5"}"#).unwrap();
        let mut store = FileRecordStore::new(&path);
        store.save(3.0).unwrap();
        let raw: BTreeMap<String, String> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw.get("volume").map(String::as_str), Some("0.5"));
    }

    #[test]
    fn corrupt_file_is_replaced_on_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");
        fs::write(&path, "not json").unwrap();
        let mut store = FileRecordStore::new(&path);
        store.save(7.0).unwrap();
        assert_eq!(store.load().unwrap(), Some(7.0));
    }

    #[test]
    fn unreadable_file_fails_the_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");
        fs::create_dir(&path).unwrap();
        let mut store = FileRecordStore::new(&path);
        assert!(matches!(store.save(7.0), Err(StorageError::Io { .. })));
        assert!(path.is_dir());
    }

    #[test]
    fn memory_store_keeps_what_was_saved() {
        let mut store = MemoryStore::new();
        assert_eq!(store.value(), None);
        store.save(12.5).unwrap();
        assert_eq!(store.value(), Some(12.5));
        assert_eq!(MemoryStore::with_value(3.0).load().unwrap(), Some(3.0));
    }

    #[test]
    fn failing_memory_store_errors() {
        let mut store = MemoryStore::failing();
        assert!(store.load().is_err());
        assert!(store.save(1.0).is_err());
    }
}
