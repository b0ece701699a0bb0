//! Data models for the tracker.
//!
//! This module contains the measurement entries, the comparison period
//! selector and the derived weekly statistics record.

use crate::calendar;
use crate::error::{Result, TrackerError};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which measurement collection an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Weight,
    Waist,
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricKind::Weight => write!(f, "weight"),
            MetricKind::Waist => write!(f, "waist"),
        }
    }
}

impl MetricKind {
    /// Display unit for values of this kind.
    pub fn unit(&self) -> &'static str {
        match self {
            MetricKind::Weight => "kg",
            MetricKind::Waist => "cm",
        }
    }
}

/// Common read access over weight and waist entries.
pub trait Measurement: Clone {
    fn id(&self) -> &str;
    fn date(&self) -> NaiveDate;
    fn value(&self) -> f64;
    fn notes(&self) -> Option<&str>;
}

/// A single weight measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightEntry {
    pub id: String,
    #[serde(with = "calendar::date_format")]
    pub date: NaiveDate,
    /// Weight in kilograms.
    pub weight: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A single waist measurement. At most one exists per date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaistEntry {
    pub id: String,
    #[serde(with = "calendar::date_format")]
    pub date: NaiveDate,
    /// Waist circumference in centimetres.
    pub measurement: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Measurement for WeightEntry {
    fn id(&self) -> &str {
        &self.id
    }

    fn date(&self) -> NaiveDate {
        self.date
    }

    fn value(&self) -> f64 {
        self.weight
    }

    fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }
}

impl Measurement for WaistEntry {
    fn id(&self) -> &str {
        &self.id
    }

    fn date(&self) -> NaiveDate {
        self.date
    }

    fn value(&self) -> f64 {
        self.measurement
    }

    fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }
}

/// A measurement as submitted by the user, before it gets an id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMeasurement {
    pub date: NaiveDate,
    pub value: f64,
    pub notes: Option<String>,
}

impl NewMeasurement {
    /// Builds a new measurement, rejecting non-positive or non-finite values.
    pub fn new(date: NaiveDate, value: f64, notes: Option<String>) -> Result<Self> {
        validate_value(value)?;
        Ok(Self {
            date,
            value,
            notes: notes.and_then(normalize_notes),
        })
    }
}

/// Trims notes, treating blank text as no notes.
pub fn normalize_notes(notes: String) -> Option<String> {
    let trimmed = notes.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Checks that a measurement value is finite and above zero.
pub fn validate_value(value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(TrackerError::InvalidValue(value))
    }
}

/// How far back the secondary comparison baseline looks.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(try_from = "u32", into = "u32")]
pub enum ComparisonPeriod {
    #[default]
    #[value(name = "1w")]
    OneWeek,
    #[value(name = "2w")]
    TwoWeeks,
    #[value(name = "4w")]
    FourWeeks,
}

impl ComparisonPeriod {
    /// Number of weeks the baseline lies behind the target week.
    pub fn weeks(&self) -> u32 {
        match self {
            ComparisonPeriod::OneWeek => 1,
            ComparisonPeriod::TwoWeeks => 2,
            ComparisonPeriod::FourWeeks => 4,
        }
    }
}

impl TryFrom<u32> for ComparisonPeriod {
    type Error = TrackerError;

    fn try_from(weeks: u32) -> Result<Self> {
        match weeks {
            1 => Ok(ComparisonPeriod::OneWeek),
            2 => Ok(ComparisonPeriod::TwoWeeks),
            4 => Ok(ComparisonPeriod::FourWeeks),
            other => Err(TrackerError::InvalidComparisonPeriod(other)),
        }
    }
}

impl From<ComparisonPeriod> for u32 {
    fn from(period: ComparisonPeriod) -> Self {
        period.weeks()
    }
}

impl fmt::Display for ComparisonPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComparisonPeriod::OneWeek => write!(f, "1 week"),
            other => write!(f, "{} weeks", other.weeks()),
        }
    }
}

/// Derived statistics for one week, recomputed on every query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyStats {
    #[serde(with = "calendar::date_format")]
    pub week_start: NaiveDate,
    pub week_end: NaiveDateTime,
    pub comparison_period: ComparisonPeriod,

    pub weight_average: Option<f64>,
    pub weight_min: Option<f64>,
    pub weight_max: Option<f64>,
    pub weight_count: usize,
    pub previous_week_average: Option<f64>,
    pub week_over_week_change: Option<f64>,
    pub comparison_period_average: Option<f64>,
    pub comparison_period_change: Option<f64>,
    /// Week actually used as the weight baseline, after fallback.
    pub weight_comparison_week_start: Option<NaiveDate>,

    pub waist_measurements: Vec<WaistEntry>,
    pub current_week_waist: Option<f64>,
    pub previous_week_waist: Option<f64>,
    pub waist_week_over_week_change: Option<f64>,
    pub comparison_period_waist: Option<f64>,
    pub comparison_waist_change: Option<f64>,
    /// Week actually used as the waist baseline, after fallback.
    pub waist_comparison_week_start: Option<NaiveDate>,
}

impl WeeklyStats {
    /// The comparison week requested before any fallback was applied.
    pub fn requested_comparison_week(&self) -> Option<NaiveDate> {
        self.week_start
            .checked_sub_signed(chrono::Duration::weeks(i64::from(
                self.comparison_period.weeks(),
            )))
            .map(calendar::week_start)
    }

    /// Whether the weight baseline fell back to the earliest recorded week.
    pub fn weight_used_fallback(&self) -> bool {
        self.weight_comparison_week_start
            .is_some_and(|w| Some(w) != self.requested_comparison_week())
    }

    /// Whether the waist baseline fell back to the earliest recorded week.
    pub fn waist_used_fallback(&self) -> bool {
        self.waist_comparison_week_start
            .is_some_and(|w| Some(w) != self.requested_comparison_week())
    }

    /// True when the week has neither weight nor waist data.
    pub fn is_empty(&self) -> bool {
        self.weight_count == 0 && self.waist_measurements.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comparison_period_from_weeks() {
        assert_eq!(ComparisonPeriod::try_from(1).unwrap(), ComparisonPeriod::OneWeek);
        assert_eq!(ComparisonPeriod::try_from(2).unwrap(), ComparisonPeriod::TwoWeeks);
        assert_eq!(ComparisonPeriod::try_from(4).unwrap(), ComparisonPeriod::FourWeeks);
        assert!(matches!(
            ComparisonPeriod::try_from(3),
            Err(TrackerError::InvalidComparisonPeriod(3))
        ));
    }

    #[test]
    fn test_comparison_period_display() {
        assert_eq!(ComparisonPeriod::OneWeek.to_string(), "1 week");
        assert_eq!(ComparisonPeriod::FourWeeks.to_string(), "4 weeks");
    }

    #[test]
    fn test_new_measurement_validation() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        assert!(NewMeasurement::new(date, 80.0, None).is_ok());
        assert!(NewMeasurement::new(date, 0.0, None).is_err());
        assert!(NewMeasurement::new(date, -1.0, None).is_err());
        assert!(NewMeasurement::new(date, f64::NAN, None).is_err());

        let blank = NewMeasurement::new(date, 80.0, Some("   ".to_string())).unwrap();
        assert_eq!(blank.notes, None);
    }

    #[test]
    fn test_entry_serializes_with_backup_field_names() {
        let entry = WaistEntry {
            id: "w1".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            measurement: 90.5,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"date\":\"2024-06-03\""));
        assert!(json.contains("\"measurement\":90.5"));
        assert!(json.contains("\"createdAt\""));
        assert!(json.contains("\"updatedAt\""));
        assert!(!json.contains("notes"));
    }

    #[test]
    fn test_metric_kind_units() {
        assert_eq!(MetricKind::Weight.unit(), "kg");
        assert_eq!(MetricKind::Waist.unit(), "cm");
        assert_eq!(MetricKind::Waist.to_string(), "waist");
    }
}
