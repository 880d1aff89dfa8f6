use anyhow::anyhow;
use chrono::{Datelike, Duration, Months, NaiveDate};

use crate::datetime::is_same_month;

/// Fixed 6x7 layout: the grid height never depends on month length or on
/// the weekday the month starts on.
pub const GRID_CELLS: usize = 42;

/// A displayed month, carried as its first day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthRef {
    first: NaiveDate,
}

impl MonthRef {
    pub fn new(year: i32, month: u32) -> anyhow::Result<Self> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| anyhow!("invalid month: {year}-{month:02}"))?;
        Ok(Self { first })
    }

    /// The month a given date falls in.
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            first: date.with_day(1).unwrap_or(date),
        }
    }

    /// Parses "YYYY-MM".
    pub fn parse(token: &str) -> anyhow::Result<Self> {
        let (year, month) = token
            .trim()
            .split_once('-')
            .ok_or_else(|| anyhow!("invalid month: {token} (expected YYYY-MM)"))?;
        let year: i32 = year
            .parse()
            .map_err(|_| anyhow!("invalid year in: {token}"))?;
        let month: u32 = month
            .parse()
            .map_err(|_| anyhow!("invalid month in: {token}"))?;
        Self::new(year, month)
    }

    pub fn year(&self) -> i32 {
        self.first.year()
    }

    pub fn month(&self) -> u32 {
        self.first.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first
    }

    /// Shifts by a signed number of months.
    pub fn offset(&self, months: i32) -> anyhow::Result<Self> {
        let shifted = if months >= 0 {
            self.first.checked_add_months(Months::new(months as u32))
        } else {
            self.first.checked_sub_months(Months::new(months.unsigned_abs()))
        };
        shifted
            .map(|first| Self { first })
            .ok_or_else(|| anyhow!("month arithmetic out of range: {months} from {}", self.first))
    }

    /// "May 2025" form, used as the grid title.
    pub fn label(&self) -> String {
        self.first.format("%B %Y").to_string()
    }
}

/// How many whole months separate two month references (positive when
/// `to` is later).
pub fn months_between(from: MonthRef, to: MonthRef) -> i32 {
    (to.year() - from.year()) * 12 + (to.month() as i32 - from.month() as i32)
}

#[derive(Debug, Clone, Copy)]
pub struct GridCell {
    pub date: NaiveDate,
    /// False for the dimmed leading/trailing cells of adjacent months.
    pub in_month: bool,
}

/// The 42 consecutive dates of one month view, starting from the Sunday
/// on or before the 1st.
pub fn month_grid(month: MonthRef) -> Vec<GridCell> {
    let first = month.first_day();
    let back = i64::from(first.weekday().num_days_from_sunday());
    let start = first
        .checked_sub_signed(Duration::days(back))
        .unwrap_or(first);

    let mut cells = Vec::with_capacity(GRID_CELLS);
    let mut cursor = start;
    for _ in 0..GRID_CELLS {
        cells.push(GridCell {
            date: cursor,
            in_month: is_same_month(cursor, first),
        });
        cursor = cursor
            .checked_add_signed(Duration::days(1))
            .unwrap_or(cursor);
    }

    cells
}
