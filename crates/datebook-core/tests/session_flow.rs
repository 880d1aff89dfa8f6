use chrono::NaiveDate;
use datebook_core::datetime::ClockTime;
use datebook_core::event::{Event, EventDraft, EventKind};
use datebook_core::grid::MonthRef;
use datebook_core::state::{Action, CalendarState, Outcome};
use datebook_core::store::EventStore;
use uuid::Uuid;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn clock(raw: &str) -> ClockTime {
    ClockTime::parse(raw).expect("valid clock time")
}

fn seeded_state() -> CalendarState {
    let store = EventStore::seeded().expect("seed store");
    let month = MonthRef::new(2025, 5).expect("valid month");
    CalendarState::new(month, store)
}

fn draft(title: &str, start: &str, end: &str) -> EventDraft {
    EventDraft {
        title: title.to_string(),
        start: Some(clock(start)),
        end: Some(clock(end)),
        kind: EventKind::Meeting,
    }
}

#[test]
fn selecting_a_day_caches_its_events_in_store_order() {
    let mut state = seeded_state();

    let outcome = state
        .apply(Action::SelectDate(date(2025, 5, 22)))
        .expect("select day");
    let Outcome::Selected(selection) = outcome else {
        panic!("select should yield a selection");
    };

    assert_eq!(selection.events.len(), 1);
    assert_eq!(selection.events[0].title, "Team Meeting");
    assert_eq!(state.selection().expect("selection kept").date, date(2025, 5, 22));
}

#[test]
fn adding_an_event_grows_store_and_selection_together() {
    let mut state = seeded_state();
    state
        .apply(Action::SelectDate(date(2025, 5, 22)))
        .expect("select day");
    let store_before = state.store().len();

    let outcome = state
        .apply(Action::AddEvent(draft("Retro", "10:00", "11:30")))
        .expect("add event");
    let Outcome::EventAdded(event) = outcome else {
        panic!("valid draft should be added");
    };

    assert_eq!(event.date, date(2025, 5, 22));
    assert_eq!(event.id, Some(5));
    assert_eq!(event.duration_minutes(), 90);

    assert_eq!(state.store().len(), store_before + 1);
    let selection = state.selection().expect("selection kept");
    assert_eq!(selection.events.len(), 2);
    assert_eq!(selection.events[0].title, "Team Meeting");
    assert_eq!(selection.events[1].title, "Retro");
}

#[test]
fn appending_for_another_day_leaves_the_selection_alone() {
    let mut state = seeded_state();
    state
        .apply(Action::SelectDate(date(2025, 5, 22)))
        .expect("select day");
    let store_before = state.store().len();
    let selected_before = state.selection().expect("selection").events.len();

    let next_id = state.store().next_id();
    state.append_event(Event {
        uuid: Uuid::new_v4(),
        id: Some(next_id),
        title: "Elsewhere".to_string(),
        date: date(2025, 5, 30),
        start: clock("09:00"),
        end: clock("09:30"),
        kind: EventKind::Break,
    });

    assert_eq!(state.store().len(), store_before + 1);
    assert_eq!(
        state.selection().expect("selection").events.len(),
        selected_before
    );
}

#[test]
fn rejected_drafts_mutate_nothing() {
    let mut state = seeded_state();
    state
        .apply(Action::SelectDate(date(2025, 5, 22)))
        .expect("select day");
    let store_before = state.store().len();
    let selected_before = state.selection().expect("selection").events.len();

    let outcome = state
        .apply(Action::AddEvent(draft("   ", "10:00", "11:00")))
        .expect("apply add");
    let Outcome::Rejected(errors) = outcome else {
        panic!("blank title must be rejected");
    };
    assert_eq!(errors.title.as_deref(), Some("Title is required"));

    let outcome = state
        .apply(Action::AddEvent(draft("Backwards", "14:00", "13:00")))
        .expect("apply add");
    let Outcome::Rejected(errors) = outcome else {
        panic!("end before start must be rejected");
    };
    assert_eq!(
        errors.end.as_deref(),
        Some("End time must be after start time")
    );

    assert_eq!(state.store().len(), store_before);
    assert_eq!(
        state.selection().expect("selection").events.len(),
        selected_before
    );
}

#[test]
fn adding_without_a_selection_is_a_caller_error() {
    let mut state = seeded_state();
    let result = state.apply(Action::AddEvent(draft("Orphan", "10:00", "11:00")));
    assert!(result.is_err());
    assert_eq!(state.store().len(), 4);
}

#[test]
fn titles_are_trimmed_before_storage() {
    let mut state = seeded_state();
    state
        .apply(Action::SelectDate(date(2025, 5, 22)))
        .expect("select day");

    let outcome = state
        .apply(Action::AddEvent(draft("  Padded title  ", "10:00", "11:00")))
        .expect("add event");
    let Outcome::EventAdded(event) = outcome else {
        panic!("valid draft should be added");
    };
    assert_eq!(event.title, "Padded title");
}

#[test]
fn month_navigation_keeps_the_selection() {
    let mut state = seeded_state();
    state
        .apply(Action::SelectDate(date(2025, 5, 24)))
        .expect("select day");

    state
        .apply(Action::NavigateMonth(1))
        .expect("navigate forward");
    assert_eq!((state.month().year(), state.month().month()), (2025, 6));
    assert!(state.selection().is_some());

    state
        .apply(Action::NavigateMonth(-2))
        .expect("navigate back");
    assert_eq!((state.month().year(), state.month().month()), (2025, 4));

    state
        .apply(Action::CloseSelection)
        .expect("close selection");
    assert!(state.selection().is_none());
}

#[test]
fn exported_events_use_the_canonical_wire_shape() {
    let state = seeded_state();
    let json = serde_json::to_value(state.store().events()).expect("serialize store");

    let first = json
        .get(0)
        .and_then(|row| row.as_object())
        .expect("first event object");
    assert_eq!(
        first.get("date"),
        Some(&serde_json::json!("2025-05-22"))
    );
    assert_eq!(first.get("start"), Some(&serde_json::json!("10:00")));
    assert_eq!(first.get("type"), Some(&serde_json::json!("meeting")));
}
