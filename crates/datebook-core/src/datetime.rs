//! Calendar-day and clock-time helpers.
//!
//! Days are matched through their canonical "YYYY-MM-DD" key; times are
//! minute-resolution points within one nominal day.

use std::fmt;

use anyhow::anyhow;
use chrono::{Datelike, NaiveDate};
use regex::Regex;

/// The canonical key used everywhere a day is compared or looked up.
pub fn canonical_date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Compares against the configured reference date, not the wall clock.
pub fn is_today(date: NaiveDate, today: NaiveDate) -> bool {
    canonical_date_key(date) == canonical_date_key(today)
}

pub fn is_same_month(a: NaiveDate, b: NaiveDate) -> bool {
    a.month() == b.month() && a.year() == b.year()
}

/// A wall-clock time of day, minute resolution, no date and no zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ClockTime {
    hour: u32,
    minute: u32,
}

impl ClockTime {
    pub fn new(hour: u32, minute: u32) -> anyhow::Result<Self> {
        if hour > 23 {
            return Err(anyhow!("hour out of range: {hour}"));
        }
        if minute > 59 {
            return Err(anyhow!("minute out of range: {minute}"));
        }
        Ok(Self { hour, minute })
    }

    /// Parses 24-hour "HH:MM" (a single leading digit is accepted).
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let clock_re = Regex::new(r"^(?P<hour>\d{1,2}):(?P<minute>\d{2})$")
            .map_err(|e| anyhow!("internal regex compile failure: {e}"))?;
        let captures = clock_re
            .captures(raw.trim())
            .ok_or_else(|| anyhow!("invalid clock time: {raw} (expected HH:MM)"))?;

        let hour = captures
            .name("hour")
            .ok_or_else(|| anyhow!("missing hour in: {raw}"))?
            .as_str()
            .parse::<u32>()?;
        let minute = captures
            .name("minute")
            .ok_or_else(|| anyhow!("missing minute in: {raw}"))?
            .as_str()
            .parse::<u32>()?;

        Self::new(hour, minute)
    }

    pub fn hour(self) -> u32 {
        self.hour
    }

    pub fn minute(self) -> u32 {
        self.minute
    }

    pub fn minutes_from_midnight(self) -> i64 {
        i64::from(self.hour) * 60 + i64::from(self.minute)
    }

    /// 12-hour display form, "h:mm AM/PM". Hour 0 renders as 12 AM and
    /// hour 12 as 12 PM.
    #[must_use]
    pub fn format_display(self) -> String {
        let hour12 = match self.hour % 12 {
            0 => 12,
            other => other,
        };
        let ampm = if self.hour >= 12 { "PM" } else { "AM" };
        format!("{}:{:02} {}", hour12, self.minute, ampm)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Signed difference in minutes, assuming both times fall on the same
/// nominal day. Not clamped: end at or before start yields zero or a
/// negative count; rejecting that is the draft layer's job.
pub fn duration_minutes(start: ClockTime, end: ClockTime) -> i64 {
    end.minutes_from_midnight() - start.minutes_from_midnight()
}

pub mod clock_serde {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::ClockTime;

    pub fn serialize<S>(time: &ClockTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&time.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<ClockTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        ClockTime::parse(&raw).map_err(serde::de::Error::custom)
    }
}
