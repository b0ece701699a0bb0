//! Week alignment and calendar date strings.
//!
//! Weeks run Monday through Sunday. All dates are plain calendar dates
//! (`NaiveDate`) with no attached offset, so formatting and parsing can never
//! move a date across a day boundary.

use crate::error::{Result, TrackerError};
use chrono::{Datelike, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A Monday-to-Sunday calendar window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekWindow {
    /// Monday of the week.
    pub week_start: NaiveDate,
    /// Last millisecond of the Sunday.
    pub week_end: NaiveDateTime,
}

impl WeekWindow {
    /// Whether `date` falls on or between Monday and Sunday of this window.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.week_start && date <= self.week_end.date()
    }
}

/// Returns the Monday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    // Sunday is day 7 from Monday, so it steps back six days.
    let days_back = date.weekday().number_from_monday() - 1;
    date - Duration::days(i64::from(days_back))
}

/// Returns the last instant of the Sunday ending the week containing `date`.
pub fn week_end(date: NaiveDate) -> NaiveDateTime {
    let sunday = week_start(date) + Duration::days(6);
    sunday.and_time(end_of_day())
}

/// Returns the full window for the week containing `date`.
pub fn week_window(date: NaiveDate) -> WeekWindow {
    WeekWindow {
        week_start: week_start(date),
        week_end: week_end(date),
    }
}

/// Formats a date as zero-padded `YYYY-MM-DD`.
pub fn to_date_string(date: NaiveDate) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        date.month(),
        date.day()
    )
}

/// Parses a `YYYY-MM-DD` string as a calendar date.
pub fn parse_date_string(s: &str) -> Result<NaiveDate> {
    let trimmed = s.trim();
    // chrono accepts unpadded fields; require the exact width.
    if trimmed.len() != 10 {
        return Err(TrackerError::InvalidDate(s.to_string()));
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .map_err(|_| TrackerError::InvalidDate(s.to_string()))
}

/// True iff both dates belong to the same Monday-aligned week.
pub fn same_week(a: NaiveDate, b: NaiveDate) -> bool {
    week_start(a) == week_start(b)
}

/// Today's date on the local calendar.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN)
}

/// Serde adapter storing dates as `YYYY-MM-DD` strings.
pub mod date_format {
    use super::{parse_date_string, to_date_string};
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&to_date_string(*date))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_date_string(&s).map_err(serde::de::Error::custom)
    }
}
