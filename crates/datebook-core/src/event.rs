use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::datetime::{ClockTime, canonical_date_key, clock_serde, duration_minutes};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Meeting,
    Deadline,
    Break,
    Presentation,
    Review,
}

impl EventKind {
    pub const ALL: [Self; 5] = [
        Self::Meeting,
        Self::Deadline,
        Self::Break,
        Self::Presentation,
        Self::Review,
    ];

    pub fn parse(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "meeting" => Some(Self::Meeting),
            "deadline" => Some(Self::Deadline),
            "break" => Some(Self::Break),
            "presentation" => Some(Self::Presentation),
            "review" => Some(Self::Review),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Meeting => "meeting",
            Self::Deadline => "deadline",
            Self::Break => "break",
            Self::Presentation => "presentation",
            Self::Review => "review",
        }
    }

    /// ANSI color used for this kind in the day view and the legend.
    pub fn color_code(&self) -> &'static str {
        match self {
            Self::Meeting => "34",
            Self::Deadline => "31",
            Self::Break => "32",
            Self::Presentation => "35",
            Self::Review => "33",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub uuid: Uuid,

    #[serde(default)]
    pub id: Option<u64>,

    pub title: String,

    pub date: NaiveDate,

    #[serde(with = "clock_serde")]
    pub start: ClockTime,

    #[serde(with = "clock_serde")]
    pub end: ClockTime,

    #[serde(rename = "type")]
    pub kind: EventKind,
}

impl Event {
    pub fn date_key(&self) -> String {
        canonical_date_key(self.date)
    }

    pub fn duration_minutes(&self) -> i64 {
        duration_minutes(self.start, self.end)
    }
}

/// User input for a new event, before validation. The date is not part of
/// the draft: it comes from the currently selected day.
#[derive(Debug, Clone)]
pub struct EventDraft {
    pub title: String,
    pub start: Option<ClockTime>,
    pub end: Option<ClockTime>,
    pub kind: EventKind,
}

/// Per-field validation results. Any populated field blocks the mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    pub title: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.start.is_none() && self.end.is_none()
    }
}

impl EventDraft {
    /// Checks the creation-time invariants: non-blank title, both times
    /// present, end strictly after start. Reported per field; the store is
    /// only touched when this comes back empty.
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::default();

        if self.title.trim().is_empty() {
            errors.title = Some("Title is required".to_string());
        }
        if self.start.is_none() {
            errors.start = Some("Start time is required".to_string());
        }
        if self.end.is_none() {
            errors.end = Some("End time is required".to_string());
        }

        if let (Some(start), Some(end)) = (self.start, self.end)
            && duration_minutes(start, end) <= 0
        {
            errors.end = Some("End time must be after start time".to_string());
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use crate::datetime::ClockTime;

    use super::{EventDraft, EventKind};

    fn clock(raw: &str) -> ClockTime {
        ClockTime::parse(raw).expect("valid clock time")
    }

    fn draft(title: &str, start: Option<&str>, end: Option<&str>) -> EventDraft {
        EventDraft {
            title: title.to_string(),
            start: start.map(clock),
            end: end.map(clock),
            kind: EventKind::Meeting,
        }
    }

    #[test]
    fn valid_draft_has_no_errors() {
        let errors = draft("Team sync", Some("10:00"), Some("11:00")).validate();
        assert!(errors.is_empty());
    }

    #[test]
    fn blank_title_is_rejected() {
        let errors = draft("   ", Some("10:00"), Some("11:00")).validate();
        assert_eq!(errors.title.as_deref(), Some("Title is required"));
        assert!(errors.start.is_none());
        assert!(errors.end.is_none());
    }

    #[test]
    fn missing_times_are_rejected_per_field() {
        let errors = draft("Team sync", None, None).validate();
        assert_eq!(errors.start.as_deref(), Some("Start time is required"));
        assert_eq!(errors.end.as_deref(), Some("End time is required"));
    }

    #[test]
    fn end_must_be_strictly_after_start() {
        let errors = draft("Team sync", Some("14:00"), Some("13:00")).validate();
        assert_eq!(
            errors.end.as_deref(),
            Some("End time must be after start time")
        );

        let errors = draft("Team sync", Some("14:00"), Some("14:00")).validate();
        assert_eq!(
            errors.end.as_deref(),
            Some("End time must be after start time")
        );
    }

    #[test]
    fn kinds_serialize_lowercase() {
        let value = serde_json::to_value(EventKind::Presentation).expect("serialize kind");
        assert_eq!(value, serde_json::json!("presentation"));
    }

    #[test]
    fn unknown_kind_tokens_are_rejected() {
        assert_eq!(EventKind::parse("MEETING"), Some(EventKind::Meeting));
        assert_eq!(EventKind::parse("standup"), None);
    }
}
