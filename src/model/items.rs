use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Priority shared by to-dos, action items and follow-ups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[serde(alias = "Low")]
    Low,
    #[default]
    #[serde(alias = "Medium")]
    Medium,
    #[serde(alias = "High")]
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Some(Priority::Low),
            "medium" | "med" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            _ => None,
        }
    }
}

/// Progress of an action item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl ActionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionStatus::Pending => "pending",
            ActionStatus::InProgress => "in_progress",
            ActionStatus::Completed => "completed",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ActionStatus::Pending => "Pending",
            ActionStatus::InProgress => "In Progress",
            ActionStatus::Completed => "Completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "pending" => Some(ActionStatus::Pending),
            "in_progress" => Some(ActionStatus::InProgress),
            "completed" | "done" => Some(ActionStatus::Completed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub content: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: String,
    pub task: String,
    #[serde(default)]
    pub priority: Priority,
    /// Empty when unassigned
    #[serde(default)]
    pub assignee: String,
    #[serde(default)]
    pub completed: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionItem {
    pub id: String,
    pub action: String,
    pub owner: String,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: ActionStatus,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUp {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub completed: bool,
    pub created_at: NaiveDateTime,
}

/// Which nested collection of an agenda a sub-item lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubItemKind {
    Note,
    Todo,
    Action,
    FollowUp,
}

impl SubItemKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SubItemKind::Note => "note",
            SubItemKind::Todo => "todo",
            SubItemKind::Action => "action",
            SubItemKind::FollowUp => "follow_up",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "note" | "notes" => Some(SubItemKind::Note),
            "todo" | "todos" => Some(SubItemKind::Todo),
            "action" | "actions" | "action_item" | "action_items" => Some(SubItemKind::Action),
            "follow_up" | "follow_ups" | "followup" | "followups" => Some(SubItemKind::FollowUp),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_accepts_capitalized_legacy_values() {
        let p: Priority = serde_json::from_str("\"Medium\"").unwrap();
        assert_eq!(p, Priority::Medium);
        assert_eq!(serde_json::to_string(&Priority::High).unwrap(), "\"high\"");
    }

    #[test]
    fn action_status_round_trips_snake_case() {
        let s: ActionStatus = serde_json::from_str("\"in_progress\"").unwrap();
        assert_eq!(s, ActionStatus::InProgress);
        assert_eq!(s.label(), "In Progress");
    }

    #[test]
    fn sub_item_kind_parse_aliases() {
        assert_eq!(SubItemKind::parse("action-items"), Some(SubItemKind::Action));
        assert_eq!(SubItemKind::parse("followup"), Some(SubItemKind::FollowUp));
        assert_eq!(SubItemKind::parse("notes"), Some(SubItemKind::Note));
        assert_eq!(SubItemKind::parse("tags"), None);
    }
}
