//! Error types for the tracker core.
//!
//! Missing data is never an error: empty collections and empty week windows
//! surface as `None` statistics. These types cover malformed input, store
//! failures and corrupt backup files.

use thiserror::Error;

/// Errors produced by the calendar, store, analysis and backup modules.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// A date string that is not `YYYY-MM-DD`.
    #[error("invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    /// A comparison lookback other than 1, 2 or 4 weeks.
    #[error("invalid comparison period: {0} weeks (expected 1, 2 or 4)")]
    InvalidComparisonPeriod(u32),

    /// A measurement value that is not a finite number above zero.
    #[error("invalid measurement value {0}: must be greater than 0")]
    InvalidValue(f64),

    /// No entry with the given id exists.
    #[error("no {kind} entry with id '{id}'")]
    NotFound { kind: String, id: String },

    /// The underlying store failed to read or write.
    #[error("repository error: {0}")]
    Repository(String),

    /// A backup file could not be read or did not validate.
    #[error(transparent)]
    Backup(#[from] BackupError),
}

/// Errors raised while reading or validating a backup file.
///
/// `InvalidJson` and `InvalidFormat` are reported separately so the user can
/// tell a truncated or foreign file from a JSON file with the wrong shape.
#[derive(Debug, Error)]
pub enum BackupError {
    #[error("backup file is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("backup file has an invalid format: {0}")]
    InvalidFormat(String),

    #[error("backup I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

impl From<std::io::Error> for TrackerError {
    fn from(err: std::io::Error) -> Self {
        TrackerError::Repository(err.to_string())
    }
}

impl From<serde_json::Error> for TrackerError {
    fn from(err: serde_json::Error) -> Self {
        TrackerError::Repository(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TrackerError>;
