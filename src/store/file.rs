//! JSON file entry store.
//!
//! The whole data set is one JSON document holding `weightEntries` and
//! `waistEntries`. Every mutation re-reads the file, applies the change and
//! writes the result through a temp file in the same directory, so a crash
//! mid-write never leaves a truncated data file behind.

use super::{Collections, EntryRepository, SaveOutcome};
use crate::error::{Result, TrackerError};
use crate::models::{MetricKind, NewMeasurement, WaistEntry, WeightEntry};
use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::sync::Mutex;
use tracing::debug;

/// Entry store persisted to a single JSON file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the backing data file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Collections> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(Collections::default()),
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                TrackerError::Repository(format!(
                    "failed to parse {}: {}",
                    self.path.display(),
                    e
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No data file at {}, starting empty", self.path.display());
                Ok(Collections::default())
            }
            Err(e) => Err(TrackerError::Repository(format!(
                "failed to read {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    async fn save(&self, collections: &Collections) -> Result<()> {
        let content = serde_json::to_string_pretty(collections)?;
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || write_atomically(&path, content.as_bytes()))
            .await
            .map_err(|e| TrackerError::Repository(format!("write task failed: {}", e)))??;

        debug!("Saved data file {}", self.path.display());
        Ok(())
    }

    /// Load, apply `f`, and persist, holding the write lock throughout.
    async fn modify<T>(&self, f: impl FnOnce(&mut Collections) -> Result<T> + Send) -> Result<T> {
        let _guard = self.write_lock.lock().await;
        let mut collections = self.load().await?;
        let result = f(&mut collections)?;
        self.save(&collections).await?;
        Ok(result)
    }
}

/// Write `bytes` to `path` via a sibling temp file and rename.
pub(crate) fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir)?;

    let mut tmp = NamedTempFile::new_in(&dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| TrackerError::Repository(e.to_string()))?;
    Ok(())
}

#[async_trait]
impl EntryRepository for JsonFileStore {
    async fn fetch_weight(&self) -> Result<Vec<WeightEntry>> {
        Ok(self.load().await?.weight_entries)
    }

    async fn fetch_waist(&self) -> Result<Vec<WaistEntry>> {
        Ok(self.load().await?.waist_entries)
    }

    async fn fetch_all(&self) -> Result<Collections> {
        self.load().await
    }

    async fn add_weight(&self, entry: NewMeasurement) -> Result<WeightEntry> {
        self.modify(|c| Ok(c.add_weight(entry))).await
    }

    async fn save_waist(&self, entry: NewMeasurement) -> Result<(WaistEntry, SaveOutcome)> {
        self.modify(|c| Ok(c.save_waist(entry))).await
    }

    async fn update(
        &self,
        kind: MetricKind,
        id: &str,
        value: f64,
        notes: Option<String>,
    ) -> Result<()> {
        self.modify(|c| c.update(kind, id, value, notes)).await
    }

    async fn delete(&self, kind: MetricKind, id: &str) -> Result<()> {
        self.modify(|c| c.delete(kind, id)).await
    }

    async fn replace_all(&self, weight: Vec<WeightEntry>, waist: Vec<WaistEntry>) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.save(&Collections {
            weight_entries: weight,
            waist_entries: waist,
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::parse_date_string;
    use tempfile::TempDir;

    fn measurement(date: &str, value: f64) -> NewMeasurement {
        NewMeasurement::new(parse_date_string(date).unwrap(), value, None).unwrap()
    }

    #[test]
    fn test_missing_file_is_empty_store() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("data.json"));

        tokio_test::block_on(async {
            assert!(store.fetch_weight().await.unwrap().is_empty());
            assert!(store.fetch_waist().await.unwrap().is_empty());
        });
    }

    #[tokio::test]
    async fn test_entries_persist_across_instances() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("data.json");

        let store = JsonFileStore::new(&path);
        let added = store.add_weight(measurement("2024-06-03", 80.0)).await.unwrap();
        store.save_waist(measurement("2024-06-03", 92.0)).await.unwrap();
        store.save_waist(measurement("2024-06-03", 91.0)).await.unwrap();

        let reopened = JsonFileStore::new(&path);
        let weight = reopened.fetch_weight().await.unwrap();
        assert_eq!(weight.len(), 1);
        assert_eq!(weight[0].id, added.id);

        let waist = reopened.fetch_waist().await.unwrap();
        assert_eq!(waist.len(), 1);
        assert_eq!(waist[0].measurement, 91.0);

        reopened
            .delete(MetricKind::Weight, &added.id)
            .await
            .unwrap();
        assert!(store.fetch_weight().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_all_reads_both_collections() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("data.json"));
        store.add_weight(measurement("2024-06-03", 80.0)).await.unwrap();
        store.save_waist(measurement("2024-06-04", 92.0)).await.unwrap();

        let snapshot = store.fetch_all().await.unwrap();
        assert_eq!(snapshot.weight_entries.len(), 1);
        assert_eq!(snapshot.waist_entries.len(), 1);
        assert_eq!(snapshot.waist_entries[0].measurement, 92.0);
    }

    #[test]
    fn test_corrupt_file_is_repository_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = JsonFileStore::new(&path);
        let result = tokio_test::block_on(store.fetch_weight());
        assert!(matches!(result, Err(TrackerError::Repository(_))));
    }
}
