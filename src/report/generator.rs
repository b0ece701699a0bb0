//! Markdown report generation.
//!
//! This module renders weekly statistics, week-by-week trends and entry
//! history as Markdown, plus a JSON form of the weekly statistics.

use crate::analysis::newest_first;
use crate::calendar::{same_week, to_date_string};
use crate::models::{Measurement, MetricKind, WeeklyStats};
use anyhow::Result;
use chrono::NaiveDate;

const ABSENT: &str = "n/a";

/// Generate a complete Markdown report for one week.
pub fn generate_markdown_report(stats: &WeeklyStats) -> String {
    let mut output = String::new();

    // Title
    output.push_str(&format!(
        "# Week of {} to {}\n\n",
        to_date_string(stats.week_start),
        to_date_string(stats.week_end.date())
    ));

    if stats.is_empty() {
        output.push_str("No measurements recorded this week.\n\n");
    }

    output.push_str(&generate_weight_section(stats));
    output.push_str(&generate_waist_section(stats));

    output
}

/// Generate the weight section.
fn generate_weight_section(stats: &WeeklyStats) -> String {
    let unit = MetricKind::Weight.unit();
    let mut section = String::new();

    section.push_str("## Weight\n\n");
    section.push_str("| Average | Min | Max | Entries |\n");
    section.push_str("|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | {} |\n\n",
        format_value(stats.weight_average, unit),
        format_value(stats.weight_min, unit),
        format_value(stats.weight_max, unit),
        stats.weight_count
    ));

    section.push_str(&format!(
        "- **Previous week:** {} ({})\n",
        format_value(stats.previous_week_average, unit),
        format_change(stats.week_over_week_change, unit)
    ));
    section.push_str(&format!(
        "- **{} ago{}:** {} ({})\n\n",
        stats.comparison_period,
        baseline_label(stats.weight_comparison_week_start, stats.weight_used_fallback()),
        format_value(stats.comparison_period_average, unit),
        format_change(stats.comparison_period_change, unit)
    ));

    section
}

/// Generate the waist section.
fn generate_waist_section(stats: &WeeklyStats) -> String {
    let unit = MetricKind::Waist.unit();
    let mut section = String::new();

    section.push_str("## Waist\n\n");
    section.push_str(&format!(
        "- **Latest this week:** {}\n",
        format_value(stats.current_week_waist, unit)
    ));
    section.push_str(&format!(
        "- **Previous week:** {} ({})\n",
        format_value(stats.previous_week_waist, unit),
        format_change(stats.waist_week_over_week_change, unit)
    ));
    section.push_str(&format!(
        "- **{} ago{}:** {} ({})\n\n",
        stats.comparison_period,
        baseline_label(stats.waist_comparison_week_start, stats.waist_used_fallback()),
        format_value(stats.comparison_period_waist, unit),
        format_change(stats.comparison_waist_change, unit)
    ));

    if !stats.waist_measurements.is_empty() {
        section.push_str("| Date | Waist | Notes |\n");
        section.push_str("|:---|:---:|:---|\n");
        for entry in &stats.waist_measurements {
            section.push_str(&format!(
                "| {} | {} | {} |\n",
                to_date_string(entry.date()),
                format_value(Some(entry.value()), unit),
                entry.notes().unwrap_or("")
            ));
        }
        section.push('\n');
    }

    section
}

/// Generate a week-by-week summary table, rows in the given order.
///
/// The row for the week containing `today` is marked.
pub fn generate_trend_table(weeks: &[WeeklyStats], today: NaiveDate) -> String {
    let weight_unit = MetricKind::Weight.unit();
    let waist_unit = MetricKind::Waist.unit();
    let mut table = String::new();

    table.push_str("| Week | Avg weight | Change | Entries | Waist | Change |\n");
    table.push_str("|:---|:---:|:---:|:---:|:---:|:---:|\n");

    for week in weeks {
        let marker = if same_week(week.week_start, today) {
            " (this week)"
        } else {
            ""
        };
        table.push_str(&format!(
            "| {}{} | {} | {} | {} | {} | {} |\n",
            to_date_string(week.week_start),
            marker,
            format_value(week.weight_average, weight_unit),
            format_change(week.week_over_week_change, weight_unit),
            week.weight_count,
            format_value(week.current_week_waist, waist_unit),
            format_change(week.waist_week_over_week_change, waist_unit)
        ));
    }

    table
}

/// Generate a newest-first listing of entries, at most `limit` rows.
pub fn generate_history<E: Measurement>(kind: MetricKind, entries: &[E], limit: usize) -> String {
    let mut listing = String::new();

    if entries.is_empty() {
        listing.push_str(&format!("No {} entries recorded.\n", kind));
        return listing;
    }

    listing.push_str("| Date | Value | Notes | Id |\n");
    listing.push_str("|:---|:---:|:---|:---|\n");

    for entry in newest_first(entries).iter().take(limit) {
        listing.push_str(&format!(
            "| {} | {} | {} | `{}` |\n",
            to_date_string(entry.date()),
            format_value(Some(entry.value()), kind.unit()),
            entry.notes().unwrap_or(""),
            entry.id()
        ));
    }

    if entries.len() > limit {
        listing.push_str(&format!("\n{} older entries not shown.\n", entries.len() - limit));
    }

    listing
}

/// Generate a JSON report.
pub fn generate_json_report(stats: &WeeklyStats) -> Result<String> {
    serde_json::to_string_pretty(stats).map_err(Into::into)
}

fn format_value(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) => format!("{:.1} {}", v, unit),
        None => ABSENT.to_string(),
    }
}

fn format_change(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) => format!("{:+.1} {}", v, unit),
        None => ABSENT.to_string(),
    }
}

fn baseline_label(week: Option<NaiveDate>, fallback: bool) -> String {
    match week {
        Some(w) if fallback => format!(" (earliest data, week of {})", to_date_string(w)),
        Some(w) => format!(" (week of {})", to_date_string(w)),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::comparison::compute_weekly_stats;
    use crate::calendar::parse_date_string;
    use crate::models::{ComparisonPeriod, WaistEntry, WeightEntry};
    use chrono::Utc;

    fn weight(d: &str, value: f64) -> WeightEntry {
        WeightEntry {
            id: format!("w-{}", d),
            date: parse_date_string(d).unwrap(),
            weight: value,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn waist(d: &str, value: f64, notes: Option<&str>) -> WaistEntry {
        WaistEntry {
            id: format!("c-{}", d),
            date: parse_date_string(d).unwrap(),
            measurement: value,
            notes: notes.map(String::from),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn create_test_stats() -> WeeklyStats {
        compute_weekly_stats(
            &[
                weight("2024-05-01", 85.0),
                weight("2024-05-28", 81.0),
                weight("2024-06-03", 80.0),
                weight("2024-06-05", 78.0),
            ],
            &[waist("2024-06-04", 92.0, Some("after run"))],
            parse_date_string("2024-06-03").unwrap(),
            ComparisonPeriod::FourWeeks,
        )
    }

    #[test]
    fn test_generate_markdown_report() {
        let markdown = generate_markdown_report(&create_test_stats());

        assert!(markdown.contains("# Week of 2024-06-03 to 2024-06-09"));
        assert!(markdown.contains("## Weight"));
        assert!(markdown.contains("| 79.0 kg | 78.0 kg | 80.0 kg | 2 |"));
        assert!(markdown.contains("81.0 kg (-2.0 kg)"));
        assert!(markdown.contains("4 weeks ago (earliest data, week of 2024-04-29)"));
        assert!(markdown.contains("## Waist"));
        assert!(markdown.contains("| 2024-06-04 | 92.0 cm | after run |"));
    }

    #[test]
    fn test_absent_values_render_as_na() {
        let stats = compute_weekly_stats(
            &[],
            &[],
            parse_date_string("2024-06-03").unwrap(),
            ComparisonPeriod::OneWeek,
        );
        let markdown = generate_markdown_report(&stats);

        assert!(markdown.contains("No measurements recorded this week."));
        assert!(markdown.contains("| n/a | n/a | n/a | 0 |"));
        assert!(!markdown.contains("NaN"));
    }

    #[test]
    fn test_generate_trend_table() {
        let stats = create_test_stats();
        let today = parse_date_string("2024-06-07").unwrap();
        let table = generate_trend_table(std::slice::from_ref(&stats), today);

        assert!(table.contains(
            "| 2024-06-03 (this week) | 79.0 kg | -2.0 kg | 2 | 92.0 cm | n/a |"
        ));

        let later = parse_date_string("2024-06-10").unwrap();
        let table = generate_trend_table(std::slice::from_ref(&stats), later);
        assert!(table.contains("| 2024-06-03 | 79.0 kg |"));
    }

    #[test]
    fn test_generate_history() {
        let entries = vec![
            weight("2024-06-01", 81.0),
            weight("2024-06-03", 80.0),
            weight("2024-06-05", 79.0),
        ];

        let listing = generate_history(MetricKind::Weight, &entries, 2);
        let first = listing.find("2024-06-05").unwrap();
        let second = listing.find("2024-06-03").unwrap();
        assert!(first < second);
        assert!(!listing.contains("| 2024-06-01 |"));
        assert!(listing.contains("1 older entries not shown."));

        let empty = generate_history::<WeightEntry>(MetricKind::Weight, &[], 10);
        assert_eq!(empty, "No weight entries recorded.\n");
    }

    #[test]
    fn test_generate_json_report() {
        let json = generate_json_report(&create_test_stats()).unwrap();

        assert!(json.contains("\"weekStart\": \"2024-06-03\""));
        assert!(json.contains("\"weightAverage\": 79.0"));
        assert!(json.contains("\"waistMeasurements\""));
        assert!(json.contains("\"previousWeekWaist\": null"));
    }
}
