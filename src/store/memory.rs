//! In-memory entry store.

use super::{Collections, EntryRepository, SaveOutcome};
use crate::error::Result;
use crate::models::{MetricKind, NewMeasurement, WaistEntry, WeightEntry};
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Entry store that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with the given entries.
    #[cfg(test)]
    pub fn with_entries(weight: Vec<WeightEntry>, waist: Vec<WaistEntry>) -> Self {
        Self {
            inner: RwLock::new(Collections {
                weight_entries: weight,
                waist_entries: waist,
            }),
        }
    }
}

#[async_trait]
impl EntryRepository for MemoryStore {
    async fn fetch_weight(&self) -> Result<Vec<WeightEntry>> {
        Ok(self.inner.read().await.weight_entries.clone())
    }

    async fn fetch_waist(&self) -> Result<Vec<WaistEntry>> {
        Ok(self.inner.read().await.waist_entries.clone())
    }

    async fn fetch_all(&self) -> Result<Collections> {
        Ok(self.inner.read().await.clone())
    }

    async fn add_weight(&self, entry: NewMeasurement) -> Result<WeightEntry> {
        Ok(self.inner.write().await.add_weight(entry))
    }

    async fn save_waist(&self, entry: NewMeasurement) -> Result<(WaistEntry, SaveOutcome)> {
        Ok(self.inner.write().await.save_waist(entry))
    }

    async fn update(
        &self,
        kind: MetricKind,
        id: &str,
        value: f64,
        notes: Option<String>,
    ) -> Result<()> {
        self.inner.write().await.update(kind, id, value, notes)
    }

    async fn delete(&self, kind: MetricKind, id: &str) -> Result<()> {
        self.inner.write().await.delete(kind, id)
    }

    async fn replace_all(&self, weight: Vec<WeightEntry>, waist: Vec<WaistEntry>) -> Result<()> {
        *self.inner.write().await = Collections {
            weight_entries: weight,
            waist_entries: waist,
        };
        Ok(())
    }
}
