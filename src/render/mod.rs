//! Turns an agenda record into the HTML document and plain-text summary
//! used for previews and outgoing mail.

mod html;
mod text;

use chrono::NaiveDateTime;

use crate::model::agenda::AgendaRecord;
use crate::model::config::NoteOrder;

/// Which optional sections to include
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sections {
    pub urls: bool,
    pub notes: bool,
    pub todos: bool,
    pub action_items: bool,
    pub follow_ups: bool,
}

impl Default for Sections {
    fn default() -> Self {
        Sections {
            urls: true,
            notes: true,
            todos: true,
            action_items: true,
            follow_ups: true,
        }
    }
}

impl Sections {
    pub fn none() -> Self {
        Sections {
            urls: false,
            notes: false,
            todos: false,
            action_items: false,
            follow_ups: false,
        }
    }

    /// Parse a comma-separated list such as `notes,todos`. Unknown names
    /// are returned as the error.
    pub fn parse_list(s: &str) -> Result<Self, String> {
        let mut sections = Sections::none();
        for name in s.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            match name {
                "urls" | "links" => sections.urls = true,
                "notes" => sections.notes = true,
                "todos" => sections.todos = true,
                "actions" | "action-items" | "action_items" => sections.action_items = true,
                "followups" | "follow-ups" | "follow_ups" => sections.follow_ups = true,
                other => return Err(other.to_string()),
            }
        }
        Ok(sections)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub sections: Sections,
    pub note_order: NoteOrder,
    /// Footer timestamp; no footer line when unset
    pub generated_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub html: String,
    pub plain_text: String,
}

/// Render a record. Output depends only on the arguments.
pub fn render(record: &AgendaRecord, options: &RenderOptions) -> Rendered {
    Rendered {
        html: html::render_html(record, options),
        plain_text: text::render_summary(record),
    }
}

pub use html::escape;
