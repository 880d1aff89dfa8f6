use std::io::{self, IsTerminal, Write};

use chrono::{Datelike, NaiveDate, Weekday};
use unicode_width::UnicodeWidthStr;

use crate::config::Config;
use crate::datetime::is_today;
use crate::event::{Event, EventKind};
use crate::grid::{GridCell, MonthRef, month_grid};
use crate::store::EventStore;

const WEEKDAY_LABELS: [&str; 7] = ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"];
const CELL_WIDTH: usize = 7;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> Self {
        Self { color: cfg.color }
    }

    /// The month view: title, today line, weekday header, six week rows.
    /// Cells carry the day number, a `*` on today, and a `+N` event badge.
    #[tracing::instrument(skip(self, store))]
    pub fn print_month(
        &mut self,
        month: MonthRef,
        store: &EventStore,
        today: NaiveDate,
    ) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        writeln!(out, "{}", self.paint(&month.label(), "1"))?;
        writeln!(out, "Today: {}", today.format("%A, %B %-d, %Y"))?;
        writeln!(out)?;

        for label in WEEKDAY_LABELS {
            write!(out, "{:>width$} ", label, width = CELL_WIDTH)?;
        }
        writeln!(out)?;

        for week in month_grid(month).chunks(7) {
            for cell in week {
                let mut plain = format!("{:>2}", cell.date.day());
                if is_today(cell.date, today) {
                    plain.push('*');
                }
                let count = store.count_for(cell.date);
                if count > 0 {
                    plain.push_str(&format!(" +{count}"));
                }

                let painted = self.paint_cell(&plain, cell, today);
                let visible = UnicodeWidthStr::width(strip_ansi(&painted).as_str());
                let padding = CELL_WIDTH.saturating_sub(visible);
                write!(out, "{}{} ", " ".repeat(padding), painted)?;
            }
            writeln!(out)?;
        }

        Ok(())
    }

    /// The day view: a count line, then one table row per event.
    #[tracing::instrument(skip(self, events))]
    pub fn print_day(&mut self, date: NaiveDate, events: &[Event]) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        writeln!(out, "Events for {}", date.format("%A, %B %-d, %Y"))?;
        let plural = if events.len() == 1 { "" } else { "s" };
        writeln!(out, "{} event{} scheduled", events.len(), plural)?;

        if events.is_empty() {
            writeln!(out, "No events scheduled")?;
            return Ok(());
        }
        writeln!(out)?;

        let headers = vec![
            "ID".to_string(),
            "Time".to_string(),
            "Duration".to_string(),
            "Type".to_string(),
            "Title".to_string(),
        ];

        let mut rows = Vec::with_capacity(events.len());
        for event in events {
            let id = event
                .id
                .map(|value| value.to_string())
                .unwrap_or_else(|| "-".to_string());
            let id = self.paint(&id, "33");
            let time = format!(
                "{} - {}",
                event.start.format_display(),
                event.end.format_display()
            );
            let kind = self.paint(event.kind.label(), event.kind.color_code());
            rows.push(vec![
                id,
                time,
                format_duration(event.duration_minutes()),
                kind,
                event.title.clone(),
            ]);
        }

        write_table(&mut out, headers, rows)?;
        Ok(())
    }

    pub fn print_legend(&mut self) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        writeln!(out, "Event types")?;
        for kind in EventKind::ALL {
            writeln!(out, "  {}", self.paint(kind.label(), kind.color_code()))?;
        }
        writeln!(out)?;
        writeln!(out, "Markers")?;
        writeln!(out, "  *    today")?;
        writeln!(out, "  dim  outside the displayed month")?;
        writeln!(out, "  red  weekend")?;
        writeln!(out)?;
        writeln!(out, "Editing and deleting events: not implemented")?;
        Ok(())
    }

    fn paint_cell(&self, text: &str, cell: &GridCell, today: NaiveDate) -> String {
        if is_today(cell.date, today) {
            return self.paint(text, "1;36");
        }
        if !cell.in_month {
            return self.paint(text, "90");
        }
        let weekday = cell.date.weekday();
        if weekday == Weekday::Sun || weekday == Weekday::Sat {
            return self.paint(text, "31");
        }
        text.to_string()
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || !io::stdout().is_terminal() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn format_duration(minutes: i64) -> String {
    format!("{} minutes ({}h {}m)", minutes, minutes / 60, minutes % 60)
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for idx in 0..column_count {
        write!(writer, "{:-<width$} ", "", width = widths[idx])?;
    }
    writeln!(writer)?;

    for row in rows {
        for idx in 0..column_count {
            let cell = &row[idx];
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::{format_duration, strip_ansi};

    #[test]
    fn duration_renders_minutes_and_hours() {
        assert_eq!(format_duration(90), "90 minutes (1h 30m)");
        assert_eq!(format_duration(0), "0 minutes (0h 0m)");
    }

    #[test]
    fn ansi_codes_do_not_count_toward_width() {
        assert_eq!(strip_ansi("\x1b[31m24\x1b[0m"), "24");
        assert_eq!(strip_ansi("plain"), "plain");
    }
}
