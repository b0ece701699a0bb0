//! Entry storage.
//!
//! The analysis code only ever sees the [`EntryRepository`] trait. Two
//! implementations exist: an in-memory store and a JSON file store.

pub mod file;
pub mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use crate::error::{Result, TrackerError};
use crate::models::{normalize_notes, MetricKind, NewMeasurement, WaistEntry, WeightEntry};
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whether a waist save created a new record or updated the one for that date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Created,
    Updated,
}

/// Storage contract for both measurement collections.
///
/// Fetches return whole collections in no particular order.
#[async_trait]
pub trait EntryRepository: Send + Sync {
    async fn fetch_weight(&self) -> Result<Vec<WeightEntry>>;

    async fn fetch_waist(&self) -> Result<Vec<WaistEntry>>;

    /// Both collections from one consistent read.
    async fn fetch_all(&self) -> Result<Collections> {
        let (weight_entries, waist_entries) =
            futures::try_join!(self.fetch_weight(), self.fetch_waist())?;
        Ok(Collections {
            weight_entries,
            waist_entries,
        })
    }

    async fn add_weight(&self, entry: NewMeasurement) -> Result<WeightEntry>;

    /// Insert a waist entry, or update the existing entry for the same date.
    async fn save_waist(&self, entry: NewMeasurement) -> Result<(WaistEntry, SaveOutcome)>;

    /// Change the value of an entry. `notes` of `None` keeps the existing
    /// notes; blank notes clear them.
    async fn update(
        &self,
        kind: MetricKind,
        id: &str,
        value: f64,
        notes: Option<String>,
    ) -> Result<()>;

    async fn delete(&self, kind: MetricKind, id: &str) -> Result<()>;

    /// Replace both collections in one step.
    async fn replace_all(&self, weight: Vec<WeightEntry>, waist: Vec<WaistEntry>) -> Result<()>;
}

/// Both collections as held by a store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collections {
    #[serde(default)]
    pub weight_entries: Vec<WeightEntry>,
    #[serde(default)]
    pub waist_entries: Vec<WaistEntry>,
}

impl Collections {
    pub(crate) fn add_weight(&mut self, entry: NewMeasurement) -> WeightEntry {
        let now = Utc::now();
        let created = WeightEntry {
            id: Uuid::new_v4().to_string(),
            date: entry.date,
            weight: entry.value,
            notes: entry.notes,
            created_at: now,
            updated_at: now,
        };
        self.weight_entries.push(created.clone());
        created
    }

    pub(crate) fn save_waist(&mut self, entry: NewMeasurement) -> (WaistEntry, SaveOutcome) {
        let now = Utc::now();

        if let Some(existing) = self.waist_entries.iter_mut().find(|e| e.date == entry.date) {
            existing.measurement = entry.value;
            existing.notes = entry.notes;
            existing.updated_at = now;
            return (existing.clone(), SaveOutcome::Updated);
        }

        let created = WaistEntry {
            id: Uuid::new_v4().to_string(),
            date: entry.date,
            measurement: entry.value,
            notes: entry.notes,
            created_at: now,
            updated_at: now,
        };
        self.waist_entries.push(created.clone());
        (created, SaveOutcome::Created)
    }

    pub(crate) fn update(
        &mut self,
        kind: MetricKind,
        id: &str,
        value: f64,
        notes: Option<String>,
    ) -> Result<()> {
        crate::models::validate_value(value)?;
        let now = Utc::now();
        let notes = notes.map(normalize_notes);

        match kind {
            MetricKind::Weight => {
                let entry = self
                    .weight_entries
                    .iter_mut()
                    .find(|e| e.id == id)
                    .ok_or_else(|| not_found(kind, id))?;
                entry.weight = value;
                if let Some(notes) = notes {
                    entry.notes = notes;
                }
                entry.updated_at = now;
            }
            MetricKind::Waist => {
                let entry = self
                    .waist_entries
                    .iter_mut()
                    .find(|e| e.id == id)
                    .ok_or_else(|| not_found(kind, id))?;
                entry.measurement = value;
                if let Some(notes) = notes {
                    entry.notes = notes;
                }
                entry.updated_at = now;
            }
        }

        Ok(())
    }

    pub(crate) fn delete(&mut self, kind: MetricKind, id: &str) -> Result<()> {
        let removed = match kind {
            MetricKind::Weight => {
                let before = self.weight_entries.len();
                self.weight_entries.retain(|e| e.id != id);
                before != self.weight_entries.len()
            }
            MetricKind::Waist => {
                let before = self.waist_entries.len();
                self.waist_entries.retain(|e| e.id != id);
                before != self.waist_entries.len()
            }
        };

        if removed {
            Ok(())
        } else {
            Err(not_found(kind, id))
        }
    }
}

fn not_found(kind: MetricKind, id: &str) -> TrackerError {
    TrackerError::NotFound {
        kind: kind.to_string(),
        id: id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::parse_date_string;

    fn measurement(date: &str, value: f64, notes: Option<&str>) -> NewMeasurement {
        NewMeasurement::new(
            parse_date_string(date).unwrap(),
            value,
            notes.map(String::from),
        )
        .unwrap()
    }

    #[test]
    fn test_waist_upsert_by_date() {
        let mut collections = Collections::default();
        let (first, outcome) = collections.save_waist(measurement("2024-06-03", 92.0, None));
        assert_eq!(outcome, SaveOutcome::Created);

        let (second, outcome) =
            collections.save_waist(measurement("2024-06-03", 91.0, Some("after run")));
        assert_eq!(outcome, SaveOutcome::Updated);
        assert_eq!(second.id, first.id);
        assert_eq!(second.measurement, 91.0);
        assert_eq!(second.notes.as_deref(), Some("after run"));
        assert!(second.updated_at >= first.updated_at);
        assert_eq!(collections.waist_entries.len(), 1);
    }

    #[test]
    fn test_weight_allows_same_date() {
        let mut collections = Collections::default();
        collections.add_weight(measurement("2024-06-03", 80.0, None));
        collections.add_weight(measurement("2024-06-03", 80.4, None));
        assert_eq!(collections.weight_entries.len(), 2);
    }

    #[test]
    fn test_update_keeps_notes_unless_given() {
        let mut collections = Collections::default();
        let entry = collections.add_weight(measurement("2024-06-03", 80.0, Some("fasted")));

        collections
            .update(MetricKind::Weight, &entry.id, 79.0, None)
            .unwrap();
        assert_eq!(collections.weight_entries[0].notes.as_deref(), Some("fasted"));

        collections
            .update(MetricKind::Weight, &entry.id, 79.0, Some("  after run  ".to_string()))
            .unwrap();
        assert_eq!(collections.weight_entries[0].notes.as_deref(), Some("after run"));

        collections
            .update(MetricKind::Weight, &entry.id, 79.0, Some("   ".to_string()))
            .unwrap();
        assert_eq!(collections.weight_entries[0].notes, None);
    }

    #[test]
    fn test_update_and_delete_unknown_id() {
        let mut collections = Collections::default();
        let entry = collections.add_weight(measurement("2024-06-03", 80.0, None));

        collections
            .update(MetricKind::Weight, &entry.id, 79.5, None)
            .unwrap();
        assert_eq!(collections.weight_entries[0].weight, 79.5);

        assert!(matches!(
            collections.update(MetricKind::Weight, &entry.id, 0.0, None),
            Err(TrackerError::InvalidValue(_))
        ));
        assert!(matches!(
            collections.delete(MetricKind::Waist, &entry.id),
            Err(TrackerError::NotFound { .. })
        ));

        collections.delete(MetricKind::Weight, &entry.id).unwrap();
        assert!(collections.weight_entries.is_empty());
    }
}
