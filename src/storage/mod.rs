// src/storage/mod.rs
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::extractors::section::Section;
use crate::utils::error::StorageError;

/// All sections extracted from one (ticker, year) filing. The unit of output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilingRecord {
    pub ticker: String,
    pub year: i32,
    #[serde(rename = "items")]
    pub sections: Vec<Section>,
}

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Writes to a uniquely named temp file in the same directory, syncs, then
/// renames over the target so readers see either the old or the new contents.
/// Concurrent writers never share a temp file.
pub fn write_atomically(target: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    let file_name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp_path = target.with_file_name(format!(
        ".{}.{}.{}.tmp",
        file_name,
        std::process::id(),
        TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));

    let result = (|| {
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        fs::rename(&tmp_path, target)
    })();

    if let Err(e) = result {
        let _ = fs::remove_file(&tmp_path);
        return Err(StorageError::IoError(e));
    }
    Ok(())
}

/// Persisted artifact name, derived only from ticker and year.
pub fn record_file_name(ticker: &str, year: i32) -> String {
    format!("{}-{}-10k.json", ticker.to_uppercase(), year)
}

/// What the pipeline needs from a persistence backend.
pub trait RecordStore: Send + Sync {
    /// Replaces any previous record for the same (ticker, year) in one step.
    fn save(&self, record: &FilingRecord) -> Result<PathBuf, StorageError>;

    fn load(&self, ticker: &str, year: i32) -> Result<Option<FilingRecord>, StorageError>;
}

/// Stores each record as pretty JSON at `<base_dir>/<TICKER>-<year>-10k.json`.
pub struct StorageManager {
    base_dir: PathBuf,
}

impl StorageManager {
    /// Creates a new StorageManager with the specified base directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self, StorageError> {
        let base_path = base_dir.as_ref().to_path_buf();

        // Create the base directory if it doesn't exist
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(StorageError::IoError)?;
        }

        Ok(Self {
            base_dir: base_path,
        })
    }

    pub fn record_path(&self, ticker: &str, year: i32) -> PathBuf {
        self.base_dir.join(record_file_name(ticker, year))
    }
}

impl RecordStore for StorageManager {
    fn save(&self, record: &FilingRecord) -> Result<PathBuf, StorageError> {
        let json = serde_json::to_string_pretty(record)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;

        let file_path = self.record_path(&record.ticker, record.year);
        write_atomically(&file_path, json.as_bytes())?;

        tracing::info!(
            "Saved {} sections for {} {} to {}",
            record.sections.len(),
            record.ticker,
            record.year,
            file_path.display()
        );
        Ok(file_path)
    }

    fn load(&self, ticker: &str, year: i32) -> Result<Option<FilingRecord>, StorageError> {
        let file_path = self.record_path(ticker, year);
        let raw = match fs::read_to_string(&file_path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::IoError(e)),
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| StorageError::SerializationError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(chunks: &[&str]) -> FilingRecord {
        FilingRecord {
            ticker: "AAPL".into(),
            year: 2022,
            sections: vec![Section {
                key: "Item 1".into(),
                description: "Business".into(),
                chunks: chunks.iter().map(|c| c.to_string()).collect(),
            }],
        }
    }

    #[test]
    fn file_name_is_stable() {
        assert_eq!(record_file_name("aapl", 2022), "AAPL-2022-10k.json");
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = StorageManager::new(dir.path().join("nested")).unwrap();

        let path = store.save(&record(&["One.", "Two."])).unwrap();

        assert_eq!(path.file_name().unwrap(), "AAPL-2022-10k.json");
        assert_eq!(store.load("AAPL", 2022).unwrap(), Some(record(&["One.", "Two."])));
        assert_eq!(store.load("AAPL", 2021).unwrap(), None);
    }

    #[test]
    fn save_overwrites_instead_of_appending() {
        let dir = tempfile::tempdir().unwrap();
        let store = StorageManager::new(dir.path()).unwrap();

        store.save(&record(&["Old chunk.", "Another."])).unwrap();
        store.save(&record(&["New chunk."])).unwrap();

        assert_eq!(store.load("AAPL", 2022).unwrap(), Some(record(&["New chunk."])));
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(leftovers, vec!["AAPL-2022-10k.json".to_string()]);
    }

    #[test]
    fn persisted_schema_uses_downstream_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = StorageManager::new(dir.path()).unwrap();
        let path = store.save(&record(&["One."])).unwrap();

        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(value["ticker"], "AAPL");
        assert_eq!(value["year"], 2022);
        assert_eq!(value["items"][0]["item"], "Item 1");
        assert_eq!(value["items"][0]["description"], "Business");
        assert_eq!(value["items"][0]["contents"][0], "One.");
    }

    #[test]
    fn failed_write_leaves_previous_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = StorageManager::new(dir.path()).unwrap();
        store.save(&record(&["Kept."])).unwrap();

        // A directory squatting on the target makes the rename fail.
        let blocked = FilingRecord { year: 2023, ..record(&["Lost."]) };
        fs::create_dir(store.record_path("AAPL", 2023)).unwrap();
        fs::write(store.record_path("AAPL", 2023).join("occupant"), "x").unwrap();

        assert!(store.save(&blocked).is_err());
        assert_eq!(store.load("AAPL", 2022).unwrap(), Some(record(&["Kept."])));
        let tmp_files = fs::read_dir(dir.path())
            .unwrap()
            .filter(|e| e.as_ref().unwrap().file_name().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(tmp_files, 0);
    }
}
