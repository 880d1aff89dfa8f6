//! The session state machine.
//!
//! All mutable state of a session lives here and is only changed by
//! applying an [`Action`]. This replaces the implicit shared mutable
//! state of a UI layer with an explicit reducer.

use anyhow::anyhow;
use chrono::NaiveDate;
use tracing::{debug, info};
use uuid::Uuid;

use crate::datetime::canonical_date_key;
use crate::event::{Event, EventDraft, FieldErrors};
use crate::grid::MonthRef;
use crate::store::EventStore;

/// The currently open day plus its cached event subset. Recomputed on
/// selection; maintained incrementally on append.
#[derive(Debug, Clone)]
pub struct DaySelection {
    pub date: NaiveDate,
    pub events: Vec<Event>,
}

#[derive(Debug)]
pub struct CalendarState {
    month: MonthRef,
    selection: Option<DaySelection>,
    store: EventStore,
}

#[derive(Debug, Clone)]
pub enum Action {
    /// Shift the displayed month by a signed number of months.
    NavigateMonth(i32),
    SelectDate(NaiveDate),
    /// Validate a draft and, if clean, append it on the selected day.
    AddEvent(EventDraft),
    CloseSelection,
}

#[derive(Debug, Clone)]
pub enum Outcome {
    MonthChanged(MonthRef),
    Selected(DaySelection),
    EventAdded(Event),
    /// The draft failed validation; nothing was mutated.
    Rejected(FieldErrors),
    SelectionClosed,
}

impl CalendarState {
    pub fn new(month: MonthRef, store: EventStore) -> Self {
        Self {
            month,
            selection: None,
            store,
        }
    }

    pub fn month(&self) -> MonthRef {
        self.month
    }

    pub fn selection(&self) -> Option<&DaySelection> {
        self.selection.as_ref()
    }

    pub fn store(&self) -> &EventStore {
        &self.store
    }

    #[tracing::instrument(skip(self, action))]
    pub fn apply(&mut self, action: Action) -> anyhow::Result<Outcome> {
        match action {
            Action::NavigateMonth(delta) => {
                self.month = self.month.offset(delta)?;
                debug!(month = %self.month.label(), delta, "navigated");
                Ok(Outcome::MonthChanged(self.month))
            }
            Action::SelectDate(date) => {
                let selection = DaySelection {
                    date,
                    events: self.store.events_for(date),
                };
                debug!(date = %date, events = selection.events.len(), "selected day");
                self.selection = Some(selection.clone());
                Ok(Outcome::Selected(selection))
            }
            Action::AddEvent(draft) => {
                let Some(selected) = self.selection.as_ref() else {
                    return Err(anyhow!("no day selected; select a date before adding events"));
                };

                let errors = draft.validate();
                if !errors.is_empty() {
                    debug!(?errors, "draft rejected");
                    return Ok(Outcome::Rejected(errors));
                }

                // validate() guarantees both times are present.
                let (Some(start), Some(end)) = (draft.start, draft.end) else {
                    return Err(anyhow!("validated draft is missing times"));
                };

                let event = Event {
                    uuid: Uuid::new_v4(),
                    id: Some(self.store.next_id()),
                    title: draft.title.trim().to_string(),
                    date: selected.date,
                    start,
                    end,
                    kind: draft.kind,
                };
                self.append_event(event.clone());
                info!(id = ?event.id, date = %event.date, "event added");
                Ok(Outcome::EventAdded(event))
            }
            Action::CloseSelection => {
                self.selection = None;
                Ok(Outcome::SelectionClosed)
            }
        }
    }

    /// Appends to the store and, iff the event falls on the selected day,
    /// to the cached selection as well, so an open day view reflects the
    /// addition without a re-filter.
    pub fn append_event(&mut self, event: Event) {
        if let Some(selection) = self.selection.as_mut()
            && canonical_date_key(selection.date) == event.date_key()
        {
            selection.events.push(event.clone());
        }
        self.store.append(event);
    }
}
