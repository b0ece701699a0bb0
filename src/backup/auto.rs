//! Scheduled automatic backups.
//!
//! An auto-backup writes at most one backup file per calendar day into the
//! configured directory. The date of the last run is kept in a small state
//! file next to the backups, and only the newest `keep` files are retained.

use super::export;
use crate::calendar;
use crate::config::BackupConfig;
use crate::error::{Result, TrackerError};
use crate::store::{file::write_atomically, EntryRepository};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

const STATE_FILE: &str = ".last-auto-backup";
/// Distinct from manual export names so pruning never touches those.
const FILE_PREFIX: &str = "bodylog-auto-";

/// Result of one auto-backup attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutoBackupOutcome {
    /// Auto-backup is switched off in the configuration.
    Disabled,
    /// A backup was already taken today.
    AlreadyRan(NaiveDate),
    /// A new backup file was written.
    Written(PathBuf),
}

/// Daily backup task.
#[derive(Debug, Clone)]
pub struct AutoBackup {
    enabled: bool,
    directory: PathBuf,
    keep: usize,
}

impl AutoBackup {
    pub fn new(enabled: bool, directory: impl Into<PathBuf>, keep: usize) -> Self {
        Self {
            enabled,
            directory: directory.into(),
            keep: keep.max(1),
        }
    }

    pub fn from_config(config: &BackupConfig) -> Self {
        Self::new(config.enabled, &config.directory, config.keep)
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Write today's backup unless one exists or the task is disabled.
    pub async fn run_if_due<R: EntryRepository + ?Sized>(
        &self,
        repo: &R,
        today: NaiveDate,
    ) -> Result<AutoBackupOutcome> {
        if !self.enabled {
            debug!("Auto-backup disabled");
            return Ok(AutoBackupOutcome::Disabled);
        }

        if let Some(last) = self.last_run().await {
            if last >= today {
                debug!("Auto-backup already ran on {}", last);
                return Ok(AutoBackupOutcome::AlreadyRan(last));
            }
        }

        self.run_now(repo, today).await
    }

    /// Write a backup for `today` regardless of the last run date.
    pub async fn run_now<R: EntryRepository + ?Sized>(
        &self,
        repo: &R,
        today: NaiveDate,
    ) -> Result<AutoBackupOutcome> {
        let backup = export(repo).await?;
        let json = backup.to_json()?;

        let path = self.directory.join(auto_backup_file_name(today));
        let state = self.directory.join(STATE_FILE);
        let backup_path = path.clone();

        tokio::task::spawn_blocking(move || -> Result<()> {
            write_atomically(&backup_path, json.as_bytes())?;
            write_atomically(&state, calendar::to_date_string(today).as_bytes())
        })
        .await
        .map_err(|e| TrackerError::Repository(format!("backup task failed: {}", e)))??;

        info!("Auto-backup written to {}", path.display());

        if let Err(e) = self.prune() {
            warn!("Failed to prune old backups: {}", e);
        }

        Ok(AutoBackupOutcome::Written(path))
    }

    async fn last_run(&self) -> Option<NaiveDate> {
        let content = tokio::fs::read_to_string(self.directory.join(STATE_FILE))
            .await
            .ok()?;
        calendar::parse_date_string(&content).ok()
    }

    /// Remove all but the newest `keep` backup files.
    fn prune(&self) -> std::io::Result<usize> {
        let mut backups: Vec<PathBuf> = WalkDir::new(&self.directory)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| {
                let name = e.file_name().to_string_lossy();
                name.starts_with(FILE_PREFIX) && name.ends_with(".json")
            })
            .map(|e| e.into_path())
            .collect();

        // Names embed YYYY-MM-DD, so lexical order is chronological.
        backups.sort();

        let excess = backups.len().saturating_sub(self.keep);
        for path in backups.iter().take(excess) {
            debug!("Removing old backup {}", path.display());
            std::fs::remove_file(path)?;
        }

        Ok(excess)
    }
}

/// File name of the auto-backup taken on `date`.
pub fn auto_backup_file_name(date: NaiveDate) -> String {
    format!("{}{}.json", FILE_PREFIX, calendar::to_date_string(date))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::parse_date_string;
    use crate::models::WeightEntry;
    use crate::store::MemoryStore;
    use chrono::{Duration, Utc};
    use tempfile::TempDir;

    fn date(s: &str) -> NaiveDate {
        parse_date_string(s).unwrap()
    }

    fn store() -> MemoryStore {
        MemoryStore::with_entries(
            vec![WeightEntry {
                id: "a".to_string(),
                date: date("2024-06-03"),
                weight: 80.0,
                notes: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            }],
            Vec::new(),
        )
    }

    #[tokio::test]
    async fn test_disabled_never_writes() {
        let dir = TempDir::new().unwrap();
        let task = AutoBackup::new(false, dir.path().join("backups"), 7);

        let outcome = task.run_if_due(&store(), date("2024-06-03")).await.unwrap();
        assert_eq!(outcome, AutoBackupOutcome::Disabled);
        assert!(!dir.path().join("backups").exists());
    }

    #[tokio::test]
    async fn test_runs_at_most_once_per_day() {
        let dir = TempDir::new().unwrap();
        let task = AutoBackup::new(true, dir.path(), 7);
        let repo = store();
        let today = date("2024-06-03");

        let first = task.run_if_due(&repo, today).await.unwrap();
        let expected = dir.path().join("bodylog-auto-2024-06-03.json");
        assert_eq!(first, AutoBackupOutcome::Written(expected.clone()));

        let written = std::fs::read_to_string(&expected).unwrap();
        let backup = crate::backup::parse_backup(&written).unwrap();
        let restored: Vec<WeightEntry> = backup.weight_entries;
        assert_eq!(restored.len(), 1);

        let second = task.run_if_due(&repo, today).await.unwrap();
        assert_eq!(second, AutoBackupOutcome::AlreadyRan(today));

        let tomorrow = task
            .run_if_due(&repo, today + Duration::days(1))
            .await
            .unwrap();
        assert!(matches!(tomorrow, AutoBackupOutcome::Written(_)));
    }

    #[tokio::test]
    async fn test_prunes_to_keep_newest() {
        let dir = TempDir::new().unwrap();
        let task = AutoBackup::new(true, dir.path(), 2);
        let repo = store();

        for day in 0..4 {
            task.run_now(&repo, date("2024-06-01") + Duration::days(day))
                .await
                .unwrap();
        }

        let mut names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|n| n.starts_with(FILE_PREFIX))
            .collect();
        names.sort();

        assert_eq!(
            names,
            vec![
                "bodylog-auto-2024-06-03.json".to_string(),
                "bodylog-auto-2024-06-04.json".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_prune_leaves_manual_exports_alone() {
        let dir = TempDir::new().unwrap();
        let manual = dir
            .path()
            .join(crate::backup::backup_file_name(date("2024-05-01")));
        std::fs::write(&manual, "{}").unwrap();

        let task = AutoBackup::new(true, dir.path(), 1);
        let repo = store();
        for day in 0..3 {
            task.run_now(&repo, date("2024-06-01") + Duration::days(day))
                .await
                .unwrap();
        }

        assert!(manual.exists());
        assert!(dir.path().join("bodylog-auto-2024-06-03.json").exists());
        assert!(!dir.path().join("bodylog-auto-2024-06-02.json").exists());
        assert!(!dir
            .path()
            .read_dir()
            .unwrap()
            .filter_map(|e| e.ok())
            .any(|e| e.file_name().to_string_lossy().starts_with(".tmp")));
    }
}
