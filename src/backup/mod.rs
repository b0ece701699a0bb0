//! Backup export and restore.
//!
//! A backup is a single JSON document with both entry collections sorted by
//! date. Restoring validates the whole file before touching the store, so a
//! bad file never partially replaces existing data.

pub mod auto;

pub use auto::{AutoBackup, AutoBackupOutcome};

use crate::calendar;
use crate::error::{BackupError, Result};
use crate::models::{Measurement, WaistEntry, WeightEntry};
use crate::store::EntryRepository;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

/// Format version written into every backup.
pub const BACKUP_VERSION: &str = "1.0";

/// On-disk backup document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupFile {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub export_date: Option<DateTime<Utc>>,
    pub weight_entries: Vec<WeightEntry>,
    pub waist_entries: Vec<WaistEntry>,
}

fn default_version() -> String {
    BACKUP_VERSION.to_string()
}

/// Entry counts applied by a restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestoreSummary {
    pub weight_entries: usize,
    pub waist_entries: usize,
}

impl BackupFile {
    /// Builds a backup with both collections sorted ascending by date.
    pub fn from_entries(
        mut weight: Vec<WeightEntry>,
        mut waist: Vec<WaistEntry>,
        now: DateTime<Utc>,
    ) -> Self {
        weight.sort_by_key(|e| e.date);
        waist.sort_by_key(|e| e.date);

        Self {
            version: BACKUP_VERSION.to_string(),
            export_date: Some(now),
            weight_entries: weight,
            waist_entries: waist,
        }
    }

    /// Pretty-printed JSON for writing to disk.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Default file name for a backup taken on `date`.
pub fn backup_file_name(date: NaiveDate) -> String {
    format!("bodylog-backup-{}.json", calendar::to_date_string(date))
}

/// Snapshot the repository into a backup document.
pub async fn export<R: EntryRepository + ?Sized>(repo: &R) -> Result<BackupFile> {
    let snapshot = repo.fetch_all().await?;
    info!(
        "Exporting {} weight and {} waist entries",
        snapshot.weight_entries.len(),
        snapshot.waist_entries.len()
    );
    Ok(BackupFile::from_entries(
        snapshot.weight_entries,
        snapshot.waist_entries,
        Utc::now(),
    ))
}

/// Parse and validate backup text.
///
/// Returns [`BackupError::InvalidJson`] when the text is not JSON and
/// [`BackupError::InvalidFormat`] when it is JSON of the wrong shape.
pub fn parse_backup(text: &str) -> std::result::Result<BackupFile, BackupError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| BackupError::InvalidJson(e.to_string()))?;

    validate_shape(&value)?;

    serde_json::from_value(value).map_err(|e| BackupError::InvalidFormat(e.to_string()))
}

/// Validate then replace the repository contents with the backup.
pub async fn restore<R: EntryRepository + ?Sized>(
    repo: &R,
    backup: BackupFile,
) -> Result<RestoreSummary> {
    let summary = RestoreSummary {
        weight_entries: backup.weight_entries.len(),
        waist_entries: backup.waist_entries.len(),
    };

    for (field, duplicate) in [
        ("weightEntries", duplicate_id(&backup.weight_entries)),
        ("waistEntries", duplicate_id(&backup.waist_entries)),
    ] {
        if let Some(id) = duplicate {
            return Err(BackupError::InvalidFormat(format!(
                "{} has more than one entry with id {}",
                field, id
            ))
            .into());
        }
    }

    if let Some(duplicate) = duplicate_waist_date(&backup.waist_entries) {
        return Err(BackupError::InvalidFormat(format!(
            "waistEntries has more than one entry for {}",
            calendar::to_date_string(duplicate)
        ))
        .into());
    }

    repo.replace_all(backup.weight_entries, backup.waist_entries)
        .await?;

    info!(
        "Restored {} weight and {} waist entries",
        summary.weight_entries, summary.waist_entries
    );
    Ok(summary)
}

/// Parse, validate and restore backup text in one step.
pub async fn import<R: EntryRepository + ?Sized>(repo: &R, text: &str) -> Result<RestoreSummary> {
    let backup = parse_backup(text).map_err(|e| {
        warn!("Rejected backup: {}", e);
        e
    })?;
    restore(repo, backup).await
}

fn validate_shape(value: &Value) -> std::result::Result<(), BackupError> {
    let root = value
        .as_object()
        .ok_or_else(|| BackupError::InvalidFormat("top level must be an object".to_string()))?;

    for (field, value_key) in [("weightEntries", "weight"), ("waistEntries", "measurement")] {
        let entries = root
            .get(field)
            .and_then(Value::as_array)
            .ok_or_else(|| BackupError::InvalidFormat(format!("missing {} array", field)))?;

        for (index, entry) in entries.iter().enumerate() {
            validate_entry(entry, value_key).map_err(|reason| {
                BackupError::InvalidFormat(format!("{}[{}]: {}", field, index, reason))
            })?;
        }
    }

    Ok(())
}

fn validate_entry(entry: &Value, value_key: &str) -> std::result::Result<(), String> {
    let non_empty = |key: &str| {
        entry
            .get(key)
            .and_then(Value::as_str)
            .is_some_and(|s| !s.trim().is_empty())
    };

    if !entry.is_object() {
        return Err("entry must be an object".to_string());
    }
    if !non_empty("id") {
        return Err("missing id".to_string());
    }
    if !non_empty("date") {
        return Err("missing date".to_string());
    }
    match entry.get(value_key).and_then(Value::as_f64) {
        Some(v) if v > 0.0 => {}
        _ => return Err(format!("{} must be a number greater than 0", value_key)),
    }
    if !non_empty("createdAt") || !non_empty("updatedAt") {
        return Err("missing timestamps".to_string());
    }

    Ok(())
}

fn duplicate_id<E: Measurement>(entries: &[E]) -> Option<String> {
    let mut seen = std::collections::HashSet::new();
    entries
        .iter()
        .map(Measurement::id)
        .find(|id| !seen.insert(*id))
        .map(str::to_string)
}

fn duplicate_waist_date(entries: &[WaistEntry]) -> Option<NaiveDate> {
    let mut seen = std::collections::HashSet::new();
    entries.iter().map(|e| e.date).find(|d| !seen.insert(*d))
}
