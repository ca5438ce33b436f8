use serde::Serialize;

use crate::model::agenda::{AgendaRecord, AgendaStatus};
use crate::model::config::{EmailConfig, NoteOrder};
use crate::model::items::{ActionStatus, Priority};
use crate::ops::query::StoreStats;
use crate::util::unicode::{fit_to_width, truncate_to_width};

/// Topic width in the recent list
const RECENT_TOPIC_WIDTH: usize = 25;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct AgendaSummaryJson {
    pub id: String,
    pub topic: String,
    pub presenter: String,
    pub date: String,
    pub time: String,
    pub duration: u32,
    pub status: AgendaStatus,
    pub notes: usize,
    pub todos: usize,
    pub action_items: usize,
    pub follow_ups: usize,
    pub updated_at: String,
}

#[derive(Serialize)]
pub struct MonthGroupJson {
    pub month: String,
    pub agendas: Vec<AgendaSummaryJson>,
}

#[derive(Serialize)]
pub struct CreatedJson {
    pub id: String,
}

#[derive(Serialize)]
pub struct ToggledJson {
    pub id: String,
    pub completed: bool,
}

#[derive(Serialize)]
pub struct EmailSettingsJson {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub sender: String,
    pub password_set: bool,
    pub distribution_list: Vec<String>,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn agenda_to_summary_json(record: &AgendaRecord) -> AgendaSummaryJson {
    AgendaSummaryJson {
        id: record.id.clone(),
        topic: record.topic.clone(),
        presenter: record.presenter.clone(),
        date: record.date.format("%Y-%m-%d").to_string(),
        time: record.time.format("%H:%M").to_string(),
        duration: record.duration_minutes,
        status: record.status,
        notes: record.notes.len(),
        todos: record.todos.len(),
        action_items: record.action_items.len(),
        follow_ups: record.follow_ups.len(),
        updated_at: record.updated_at.format("%Y-%m-%dT%H:%M:%S").to_string(),
    }
}

pub fn email_settings_json(config: &EmailConfig) -> EmailSettingsJson {
    EmailSettingsJson {
        smtp_host: config.smtp_host.clone(),
        smtp_port: config.smtp_port,
        sender: config.sender.clone(),
        password_set: !config.password.is_empty(),
        distribution_list: config.distribution_list.clone(),
    }
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

fn status_char(status: AgendaStatus) -> char {
    match status {
        AgendaStatus::Scheduled => ' ',
        AgendaStatus::InProgress => '>',
        AgendaStatus::Completed => 'x',
    }
}

fn check(done: bool) -> char {
    if done { 'x' } else { ' ' }
}

fn priority_tag(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "!!",
        Priority::Medium => "! ",
        Priority::Low => "  ",
    }
}

/// One-line summary used by `list`
pub fn format_agenda_line(record: &AgendaRecord) -> String {
    format!(
        "[{}] {}  {} {}  {} ({}, {} min)",
        status_char(record.status),
        record.id,
        record.date.format("%Y-%m-%d"),
        record.time.format("%H:%M"),
        record.topic,
        record.presenter,
        record.duration_minutes
    )
}

/// Month-grouped listing
pub fn format_month_groups(groups: &[(String, Vec<&AgendaRecord>)]) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, (month, records)) in groups.iter().enumerate() {
        if i > 0 {
            lines.push(String::new());
        }
        lines.push(format!("== {} ==", month));
        for record in records {
            lines.push(format_agenda_line(record));
        }
    }
    lines
}

/// Full view used by `show`
pub fn format_agenda_detail(record: &AgendaRecord, note_order: NoteOrder) -> Vec<String> {
    let mut lines = Vec::new();
    lines.push(format!("{} {}", record.id, record.topic));
    lines.push(format!("presenter: {}", record.presenter));
    lines.push(format!(
        "when: {} {} ({} min)",
        record.date.format("%Y-%m-%d"),
        record.time.format("%H:%M"),
        record.duration_minutes
    ));
    lines.push(format!("status: {}", record.status.label()));
    if let Some(description) = &record.description {
        lines.push("description:".to_string());
        for line in description.lines() {
            lines.push(format!("  {}", line));
        }
    }
    if let Some(image) = &record.topic_image {
        lines.push(format!("image: {} ({})", image.name, image.mime_type));
    }
    for link in &record.urls {
        lines.push(format!("link: {} <{}>", link.name, link.url));
    }
    for blob in &record.attachments {
        lines.push(format!(
            "attachment: {} ({}, {} bytes)",
            blob.name,
            blob.mime_type,
            blob.data.len()
        ));
    }

    if !record.notes.is_empty() {
        lines.push(String::new());
        lines.push("notes:".to_string());
        let notes: Vec<_> = match note_order {
            NoteOrder::OldestFirst => record.notes.iter().collect(),
            NoteOrder::NewestFirst => record.notes.iter().rev().collect(),
        };
        for note in notes {
            lines.push(format!(
                "  {} {}  {}",
                note.id,
                note.created_at.format("%Y-%m-%d %H:%M"),
                note.content
            ));
        }
    }

    if !record.todos.is_empty() {
        lines.push(String::new());
        lines.push("todos:".to_string());
        for todo in &record.todos {
            let assignee = if todo.assignee.is_empty() {
                String::new()
            } else {
                format!(" @{}", todo.assignee)
            };
            lines.push(format!(
                "  [{}] {} {} {}{}",
                check(todo.completed),
                todo.id,
                priority_tag(todo.priority),
                todo.task,
                assignee
            ));
        }
    }

    if !record.action_items.is_empty() {
        lines.push(String::new());
        lines.push("action items:".to_string());
        for action in &record.action_items {
            lines.push(format!(
                "  [{}] {} {} {} @{} due {}",
                action_char(action.status),
                action.id,
                priority_tag(action.priority),
                action.action,
                action.owner,
                action.due_date.format("%Y-%m-%d")
            ));
        }
    }

    if !record.follow_ups.is_empty() {
        lines.push(String::new());
        lines.push("follow-ups:".to_string());
        for follow_up in &record.follow_ups {
            lines.push(format!(
                "  [{}] {} {} {}",
                check(follow_up.completed),
                follow_up.id,
                priority_tag(follow_up.priority),
                follow_up.content
            ));
        }
    }

    lines
}

fn action_char(status: ActionStatus) -> char {
    match status {
        ActionStatus::Pending => ' ',
        ActionStatus::InProgress => '>',
        ActionStatus::Completed => 'x',
    }
}

pub fn format_stats(stats: &StoreStats) -> Vec<String> {
    vec![
        format!("agendas:          {}", stats.total),
        format!("  scheduled:      {}", stats.scheduled),
        format!("  in progress:    {}", stats.in_progress),
        format!("  completed:      {}", stats.completed),
        format!("pending actions:  {}", stats.pending_actions),
        format!("open todos:       {}", stats.open_todos),
        format!(
            "follow-ups:       {} ({} open)",
            stats.follow_ups, stats.open_follow_ups
        ),
    ]
}

/// One line of `recent`: topic cut to a fixed width, then date and status
pub fn format_recent_line(record: &AgendaRecord) -> String {
    format!(
        "{}  {}  {}  {}",
        record.id,
        fit_to_width(&record.topic, RECENT_TOPIC_WIDTH),
        record.date.format("%Y-%m-%d"),
        record.status.label()
    )
}

pub fn format_email_settings(config: &EmailConfig) -> Vec<String> {
    let mut lines = vec![
        format!("smtp host: {}", or_unset(&config.smtp_host)),
        format!("smtp port: {}", config.smtp_port),
        format!("sender:    {}", or_unset(&config.sender)),
        format!(
            "password:  {}",
            if config.password.is_empty() { "(not set)" } else { "********" }
        ),
    ];
    if config.distribution_list.is_empty() {
        lines.push("distribution list: (empty)".to_string());
    } else {
        lines.push("distribution list:".to_string());
        for address in &config.distribution_list {
            lines.push(format!("  {}", address));
        }
    }
    lines
}

fn or_unset(s: &str) -> &str {
    if s.is_empty() { "(not set)" } else { s }
}

/// Short form of a topic for one-line confirmations
pub fn short_topic(topic: &str) -> String {
    truncate_to_width(topic, 40)
}
