use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::blob::Blob;
use super::items::{ActionItem, ActionStatus, FollowUp, Note, Todo};

/// The whole store as persisted: agenda id to record, in insertion order
pub type Snapshot = IndexMap<String, AgendaRecord>;

/// Lifecycle state of an agenda
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AgendaStatus {
    #[default]
    Scheduled,
    InProgress,
    Completed,
}

impl AgendaStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AgendaStatus::Scheduled => "scheduled",
            AgendaStatus::InProgress => "in_progress",
            AgendaStatus::Completed => "completed",
        }
    }

    /// Human label, e.g. `In Progress`
    pub fn label(self) -> &'static str {
        match self {
            AgendaStatus::Scheduled => "Scheduled",
            AgendaStatus::InProgress => "In Progress",
            AgendaStatus::Completed => "Completed",
        }
    }

    /// Parse a status name. Accepts `in_progress`, `in-progress` and `in progress`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "scheduled" => Some(AgendaStatus::Scheduled),
            "in_progress" => Some(AgendaStatus::InProgress),
            "completed" => Some(AgendaStatus::Completed),
            _ => None,
        }
    }
}

/// A named link attached to an agenda
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlLink {
    pub name: String,
    pub url: String,
}

/// One scheduled meeting topic and everything attached to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgendaRecord {
    pub id: String,
    pub topic: String,
    pub presenter: String,
    /// Free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub date: NaiveDate,
    #[serde(with = "clock_time")]
    pub time: NaiveTime,
    /// Length in minutes
    #[serde(rename = "duration", alias = "duration_minutes")]
    pub duration_minutes: u32,
    #[serde(default)]
    pub status: AgendaStatus,
    #[serde(default)]
    pub topic_image: Option<Blob>,
    #[serde(default)]
    pub urls: Vec<UrlLink>,
    #[serde(default)]
    pub attachments: Vec<Blob>,
    #[serde(default)]
    pub notes: Vec<Note>,
    #[serde(default)]
    pub todos: Vec<Todo>,
    #[serde(default)]
    pub action_items: Vec<ActionItem>,
    #[serde(default)]
    pub follow_ups: Vec<FollowUp>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl AgendaRecord {
    /// Refresh `updated_at`. Never moves the timestamp backwards.
    pub fn touch(&mut self, now: NaiveDateTime) {
        if now > self.updated_at {
            self.updated_at = now;
        }
    }

    /// Action items whose status is not `completed`
    pub fn pending_actions(&self) -> usize {
        self.action_items
            .iter()
            .filter(|a| a.status != ActionStatus::Completed)
            .count()
    }
}

/// `HH:MM:SS` on output; `HH:MM` and fractional seconds accepted on input.
pub(crate) mod clock_time {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(t: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&t.format("%H:%M:%S").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_time(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid time of day: {}", raw)))
    }
}

/// Parse a time of day written as `HH:MM`, `HH:MM:SS` or `HH:MM:SS.ffffff`.
pub fn parse_time(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .ok()
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::items::Priority;

    #[test]
    fn status_parse_accepts_separators() {
        assert_eq!(AgendaStatus::parse("in progress"), Some(AgendaStatus::InProgress));
        assert_eq!(AgendaStatus::parse("In-Progress"), Some(AgendaStatus::InProgress));
        assert_eq!(AgendaStatus::parse("completed"), Some(AgendaStatus::Completed));
        assert_eq!(AgendaStatus::parse("cancelled"), None);
    }

    #[test]
    fn parse_time_short_and_long() {
        assert_eq!(parse_time("09:00"), NaiveTime::from_hms_opt(9, 0, 0));
        assert_eq!(parse_time("14:30:15"), NaiveTime::from_hms_opt(14, 30, 15));
        assert!(parse_time("25:00").is_none());
    }

    #[test]
    fn record_deserializes_legacy_snapshot_entry() {
        let json = r#"{
            "id": "ab12cd34",
            "topic": "Budget Review",
            "presenter": "A. Lee",
            "date": "2025-03-01",
            "time": "09:00:00",
            "duration": 60,
            "topic_image": null,
            "urls": [{"name": "Deck", "url": "https://example.com/deck"}],
            "attachments": [],
            "notes": [],
            "todos": [{"id": "t1", "task": "Slides", "priority": "High",
                       "assignee": "", "completed": false,
                       "created_at": "2025-02-20T10:00:00.123456"}],
            "action_items": [],
            "created_at": "2025-02-20T10:00:00.123456",
            "updated_at": "2025-02-20T10:00:00.123456",
            "status": "scheduled"
        }"#;
        let record: AgendaRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.duration_minutes, 60);
        assert_eq!(record.status, AgendaStatus::Scheduled);
        assert!(record.follow_ups.is_empty());
        assert_eq!(record.todos[0].priority, Priority::High);
        assert_eq!(record.urls[0].name, "Deck");
    }

    #[test]
    fn touch_never_moves_backwards() {
        let created = NaiveDate::from_ymd_opt(2025, 1, 2)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        let mut record = AgendaRecord {
            id: "x".into(),
            topic: "t".into(),
            presenter: "p".into(),
            description: None,
            date: NaiveDate::from_ymd_opt(2025, 1, 3).unwrap(),
            time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            duration_minutes: 30,
            status: AgendaStatus::Scheduled,
            topic_image: None,
            urls: Vec::new(),
            attachments: Vec::new(),
            notes: Vec::new(),
            todos: Vec::new(),
            action_items: Vec::new(),
            follow_ups: Vec::new(),
            created_at: created,
            updated_at: created,
        };
        let earlier = created - chrono::Duration::hours(1);
        record.touch(earlier);
        assert_eq!(record.updated_at, created);
    }
}
