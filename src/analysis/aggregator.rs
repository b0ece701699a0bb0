//! Week-window filtering and summary statistics.
//!
//! This module provides the building blocks the comparison engine composes:
//! selecting the entries of one week and reducing them to count, mean,
//! minimum and maximum.

use crate::calendar;
use crate::models::Measurement;
use chrono::NaiveDate;

/// Count, mean and extremes over one set of measurements.
///
/// With no entries, `average`, `min` and `max` are all `None` so callers can
/// tell "no data" apart from a real zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Aggregate {
    pub count: usize,
    pub average: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Entries dated within the week starting at `week_start`, oldest first.
///
/// `week_start` is normalized to its Monday. Same-date entries keep their
/// input order.
pub fn entries_in_week<E: Measurement>(entries: &[E], week_start: NaiveDate) -> Vec<E> {
    let window = calendar::week_window(week_start);

    let mut in_week: Vec<E> = entries
        .iter()
        .filter(|e| window.contains(e.date()))
        .cloned()
        .collect();

    in_week.sort_by_key(|e| e.date());
    in_week
}

/// Reduce entries to count, unweighted mean, minimum and maximum.
pub fn aggregate<E: Measurement>(entries: &[E]) -> Aggregate {
    if entries.is_empty() {
        return Aggregate::default();
    }

    let values = entries.iter().map(Measurement::value);
    let sum: f64 = values.clone().sum();
    let min = values.clone().fold(f64::INFINITY, f64::min);
    let max = values.fold(f64::NEG_INFINITY, f64::max);

    Aggregate {
        count: entries.len(),
        average: Some(sum / entries.len() as f64),
        min: Some(min),
        max: Some(max),
    }
}

/// Value of the most recent entry in a date-ascending window.
pub fn latest<E: Measurement>(entries: &[E]) -> Option<f64> {
    entries.last().map(Measurement::value)
}

/// Week start of the earliest entry across the whole collection.
pub fn earliest_week_start<E: Measurement>(entries: &[E]) -> Option<NaiveDate> {
    entries
        .iter()
        .map(Measurement::date)
        .min()
        .map(calendar::week_start)
}

/// `current - baseline`, absent if either side is absent.
pub fn change(current: Option<f64>, baseline: Option<f64>) -> Option<f64> {
    match (current, baseline) {
        (Some(c), Some(b)) => Some(c - b),
        _ => None,
    }
}

/// Entries sorted newest first, for history listings.
pub fn newest_first<E: Measurement>(entries: &[E]) -> Vec<E> {
    let mut sorted = entries.to_vec();
    sorted.sort_by(|a, b| b.date().cmp(&a.date()));
    sorted
}
