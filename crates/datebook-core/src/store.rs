use anyhow::anyhow;
use chrono::NaiveDate;
use tracing::debug;
use uuid::Uuid;

use crate::datetime::{ClockTime, canonical_date_key};
use crate::event::{Event, EventKind};

/// The in-memory event sequence. Append-only, insertion order preserved,
/// alive only for the duration of one session.
#[derive(Debug, Clone, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// The sample data every session starts from. Seeds are constructed
    /// directly and bypass draft validation: the deadline entry spans
    /// 23:59-23:59, which the add-event path would refuse.
    pub fn seeded() -> anyhow::Result<Self> {
        let mut store = Self::new();
        for (id, title, (y, m, d), start, end, kind) in [
            (1, "Team Meeting", (2025, 5, 22), "10:00", "11:00", EventKind::Meeting),
            (2, "Project Deadline", (2025, 5, 24), "23:59", "23:59", EventKind::Deadline),
            (3, "Client Presentation", (2025, 5, 28), "14:00", "16:00", EventKind::Presentation),
            (4, "Code Review", (2025, 5, 23), "15:30", "17:00", EventKind::Review),
        ] {
            let date = NaiveDate::from_ymd_opt(y, m, d)
                .ok_or_else(|| anyhow!("invalid seed date: {y}-{m:02}-{d:02}"))?;
            store.append(Event {
                uuid: Uuid::new_v4(),
                id: Some(id),
                title: title.to_string(),
                date,
                start: ClockTime::parse(start)?,
                end: ClockTime::parse(end)?,
                kind,
            });
        }
        Ok(store)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn next_id(&self) -> u64 {
        self.events.iter().filter_map(|e| e.id).max().unwrap_or(0) + 1
    }

    #[tracing::instrument(skip(self, event), fields(id = ?event.id, date = %event.date))]
    pub fn append(&mut self, event: Event) {
        debug!(count = self.events.len() + 1, "appending event");
        self.events.push(event);
    }

    /// All events on the given day, in store order. A linear scan over the
    /// canonical date key; no index is kept at this size.
    pub fn events_for(&self, date: NaiveDate) -> Vec<Event> {
        let key = canonical_date_key(date);
        self.events
            .iter()
            .filter(|event| event.date_key() == key)
            .cloned()
            .collect()
    }

    pub fn count_for(&self, date: NaiveDate) -> usize {
        let key = canonical_date_key(date);
        self.events
            .iter()
            .filter(|event| event.date_key() == key)
            .count()
    }
}
