//! Weekly comparison engine.
//!
//! Computes the statistics for a target week and compares them with the
//! previous week and with a comparison week 1, 2 or 4 weeks back. When the
//! comparison week has no data, each metric falls back to the week of its own
//! earliest entry, so weight and waist can end up compared against different
//! weeks.

use super::aggregator::{aggregate, change, earliest_week_start, entries_in_week, latest};
use crate::calendar;
use crate::error::Result;
use crate::models::{ComparisonPeriod, Measurement, WaistEntry, WeeklyStats, WeightEntry};
use crate::store::EntryRepository;
use chrono::{Duration, NaiveDate};
use tracing::debug;

/// Query front-end over an injected entry repository.
pub struct ComparisonEngine<R> {
    repo: R,
}

/// The three windows of one metric family after fallback resolution.
struct Windows<E> {
    current: Vec<E>,
    previous: Vec<E>,
    comparison: Vec<E>,
    comparison_week: Option<NaiveDate>,
}

impl<R: EntryRepository> ComparisonEngine<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Statistics for the week containing `week_start`.
    ///
    /// Reads both collections fresh on every call. Fails only if the
    /// repository fails; empty weeks produce absent statistics.
    pub async fn weekly_stats(
        &self,
        week_start: NaiveDate,
        period: ComparisonPeriod,
    ) -> Result<WeeklyStats> {
        let snapshot = self.repo.fetch_all().await?;

        debug!(
            "Computing stats for week of {} ({} weight, {} waist entries)",
            week_start,
            snapshot.weight_entries.len(),
            snapshot.waist_entries.len()
        );

        Ok(compute_weekly_stats(
            &snapshot.weight_entries,
            &snapshot.waist_entries,
            week_start,
            period,
        ))
    }

    /// Statistics for `weeks` consecutive weeks ending with the week of
    /// `last_week`, newest first.
    ///
    /// The range stops early at the first week before the earliest
    /// representable date.
    pub async fn week_range_stats(
        &self,
        last_week: NaiveDate,
        weeks: u32,
        period: ComparisonPeriod,
    ) -> Result<Vec<WeeklyStats>> {
        let snapshot = self.repo.fetch_all().await?;

        let newest = calendar::week_start(last_week);
        Ok((0..weeks)
            .map_while(|offset| newest.checked_sub_signed(Duration::weeks(i64::from(offset))))
            .map(|start| {
                compute_weekly_stats(
                    &snapshot.weight_entries,
                    &snapshot.waist_entries,
                    start,
                    period,
                )
            })
            .collect())
    }
}

/// Pure statistics computation over already-fetched collections.
pub fn compute_weekly_stats(
    weight: &[WeightEntry],
    waist: &[WaistEntry],
    week_start: NaiveDate,
    period: ComparisonPeriod,
) -> WeeklyStats {
    let window = calendar::week_window(week_start);
    let start = window.week_start;

    let weight_windows = resolve_windows(weight, start, period);
    let waist_windows = resolve_windows(waist, start, period);

    if weight_windows.comparison_week != waist_windows.comparison_week {
        debug!(
            "Weight and waist baselines differ: {:?} vs {:?}",
            weight_windows.comparison_week, waist_windows.comparison_week
        );
    }

    let current = aggregate(&weight_windows.current);
    let previous = aggregate(&weight_windows.previous);
    let comparison = aggregate(&weight_windows.comparison);

    let current_waist = latest(&waist_windows.current);
    let previous_waist = latest(&waist_windows.previous);
    let comparison_waist = latest(&waist_windows.comparison);

    WeeklyStats {
        week_start: start,
        week_end: window.week_end,
        comparison_period: period,

        weight_average: current.average,
        weight_min: current.min,
        weight_max: current.max,
        weight_count: current.count,
        previous_week_average: previous.average,
        week_over_week_change: change(current.average, previous.average),
        comparison_period_average: comparison.average,
        comparison_period_change: change(current.average, comparison.average),
        weight_comparison_week_start: weight_windows.comparison_week,

        current_week_waist: current_waist,
        previous_week_waist: previous_waist,
        waist_week_over_week_change: change(current_waist, previous_waist),
        comparison_period_waist: comparison_waist,
        comparison_waist_change: change(current_waist, comparison_waist),
        waist_comparison_week_start: waist_windows.comparison_week,
        waist_measurements: waist_windows.current,
    }
}

fn resolve_windows<E: Measurement>(
    entries: &[E],
    week_start: NaiveDate,
    period: ComparisonPeriod,
) -> Windows<E> {
    let previous_start = weeks_before(week_start, 1);
    let requested_start = weeks_before(week_start, period.weeks());

    let mut comparison = requested_start
        .map(|start| entries_in_week(entries, start))
        .unwrap_or_default();
    let mut comparison_week = requested_start;

    if comparison.is_empty() {
        comparison_week = earliest_week_start(entries);
        if let Some(fallback) = comparison_week {
            debug!(
                "No entries in week of {:?}, falling back to earliest week {}",
                requested_start, fallback
            );
            comparison = entries_in_week(entries, fallback);
        }
    }

    Windows {
        current: entries_in_week(entries, week_start),
        previous: previous_start
            .map(|start| entries_in_week(entries, start))
            .unwrap_or_default(),
        comparison,
        comparison_week,
    }
}

/// Monday `weeks` weeks before the week of `date`, if representable.
fn weeks_before(date: NaiveDate, weeks: u32) -> Option<NaiveDate> {
    date.checked_sub_signed(Duration::weeks(i64::from(weeks)))
        .map(calendar::week_start)
}
