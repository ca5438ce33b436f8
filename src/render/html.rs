use crate::model::agenda::AgendaRecord;
use crate::model::config::NoteOrder;
use crate::model::items::Note;
use crate::render::RenderOptions;

const STYLE: &str = "\
body { font-family: 'Segoe UI', Arial, sans-serif; line-height: 1.6; color: #1e293b; }
.container { max-width: 700px; margin: 0 auto; padding: 20px; }
.header { background: #1e40af; color: white; padding: 30px; border-radius: 12px 12px 0 0; }
.header h1 { margin: 0; font-size: 24px; }
.meta { display: flex; gap: 20px; flex-wrap: wrap; margin-top: 15px; }
.content { background: white; padding: 30px; border: 1px solid #e2e8f0; }
.section { margin: 20px 0; padding: 15px; background: #f8fafc; border-radius: 8px; }
.section h3 { margin: 0 0 10px 0; color: #1e40af; border-bottom: 2px solid #1e40af; }
.item { padding: 8px 0; border-bottom: 1px solid #e2e8f0; }
.badge { display: inline-block; padding: 4px 12px; border-radius: 20px; font-size: 12px; font-weight: 600; }
.badge-high { background: #fee2e2; color: #991b1b; }
.badge-medium { background: #fef3c7; color: #92400e; }
.badge-low { background: #d1fae5; color: #065f46; }
.badge-pending { background: #dbeafe; color: #1e40af; }
.badge-in-progress { background: #fef3c7; color: #92400e; }
.badge-completed { background: #d1fae5; color: #065f46; }
.footer { background: #f1f5f9; padding: 20px; text-align: center; border-radius: 0 0 12px 12px; font-size: 14px; color: #64748b; }
table { width: 100%; border-collapse: collapse; }
th, td { padding: 10px; text-align: left; border-bottom: 1px solid #e2e8f0; }
th { background: #f1f5f9; font-weight: 600; }
";

/// Escape text for use in HTML content and double-quoted attributes.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub(super) fn render_html(record: &AgendaRecord, options: &RenderOptions) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str(&format!("<title>{}</title>\n", escape(&record.topic)));
    out.push_str("<style>\n");
    out.push_str(STYLE);
    out.push_str("</style>\n</head>\n<body>\n<div class=\"container\">\n");

    render_header(&mut out, record);

    out.push_str("<div class=\"content\">\n");
    let sections = &options.sections;
    if sections.urls && !record.urls.is_empty() {
        render_urls(&mut out, record);
    }
    if sections.notes && !record.notes.is_empty() {
        render_notes(&mut out, &record.notes, options.note_order);
    }
    if sections.todos && !record.todos.is_empty() {
        render_todos(&mut out, record);
    }
    if sections.action_items && !record.action_items.is_empty() {
        render_actions(&mut out, record);
    }
    if sections.follow_ups && !record.follow_ups.is_empty() {
        render_follow_ups(&mut out, record);
    }
    out.push_str("</div>\n");

    if let Some(at) = options.generated_at {
        out.push_str("<div class=\"footer\">\n");
        out.push_str("<p>This meeting agenda was generated by agenda</p>\n");
        out.push_str(&format!(
            "<p>Generated on {}</p>\n",
            at.format("%B %d, %Y at %I:%M %p")
        ));
        out.push_str("</div>\n");
    }

    out.push_str("</div>\n</body>\n</html>\n");
    out
}

fn render_header(out: &mut String, record: &AgendaRecord) {
    out.push_str("<div class=\"header\">\n");
    out.push_str(&format!("<h1>{}</h1>\n", escape(&record.topic)));
    out.push_str("<div class=\"meta\">\n");
    out.push_str(&format!(
        "<div class=\"meta-item\">Presenter: {}</div>\n",
        escape(&record.presenter)
    ));
    out.push_str(&format!(
        "<div class=\"meta-item\">Date: {}</div>\n",
        record.date.format("%Y-%m-%d")
    ));
    out.push_str(&format!(
        "<div class=\"meta-item\">Time: {}</div>\n",
        record.time.format("%H:%M")
    ));
    out.push_str(&format!(
        "<div class=\"meta-item\">Duration: {} min</div>\n",
        record.duration_minutes
    ));
    out.push_str(&format!(
        "<div class=\"meta-item\">Status: {}</div>\n",
        record.status.label()
    ));
    out.push_str("</div>\n");
    if let Some(description) = &record.description {
        out.push_str(&format!("<p>{}</p>\n", escape(description)));
    }
    out.push_str("</div>\n");
}

fn open_section(out: &mut String, heading: &str) {
    out.push_str(&format!("<div class=\"section\"><h3>{}</h3>\n", heading));
}

fn render_urls(out: &mut String, record: &AgendaRecord) {
    open_section(out, "Related Links");
    for link in &record.urls {
        out.push_str(&format!(
            "<div class=\"item\"><a href=\"{}\" class=\"url-link\">{}</a></div>\n",
            escape(&link.url),
            escape(&link.name)
        ));
    }
    out.push_str("</div>\n");
}

fn render_notes(out: &mut String, notes: &[Note], order: NoteOrder) {
    open_section(out, "Notes");
    let mut emit = |note: &Note| {
        out.push_str(&format!(
            "<div class=\"item\">{}</div>\n",
            escape(&note.content)
        ));
    };
    match order {
        NoteOrder::OldestFirst => notes.iter().for_each(&mut emit),
        NoteOrder::NewestFirst => notes.iter().rev().for_each(&mut emit),
    }
    out.push_str("</div>\n");
}

fn badge(class: &str, text: &str) -> String {
    format!("<span class=\"badge badge-{}\">{}</span>", class, text)
}

fn render_todos(out: &mut String, record: &AgendaRecord) {
    open_section(out, "To-Do Items");
    out.push_str("<table>\n");
    out.push_str("<tr><th>Task</th><th>Priority</th><th>Assignee</th><th>Status</th></tr>\n");
    for todo in &record.todos {
        let assignee = if todo.assignee.trim().is_empty() {
            "-".to_string()
        } else {
            escape(&todo.assignee)
        };
        let status = if todo.completed { "Done" } else { "Pending" };
        out.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            escape(&todo.task),
            badge(todo.priority.as_str(), &todo.priority.as_str().to_uppercase()),
            assignee,
            status
        ));
    }
    out.push_str("</table></div>\n");
}

fn render_actions(out: &mut String, record: &AgendaRecord) {
    open_section(out, "Action Items");
    out.push_str("<table>\n");
    out.push_str(
        "<tr><th>Action</th><th>Owner</th><th>Due Date</th><th>Priority</th><th>Status</th></tr>\n",
    );
    for action in &record.action_items {
        out.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            escape(&action.action),
            escape(&action.owner),
            action.due_date.format("%Y-%m-%d"),
            badge(
                action.priority.as_str(),
                &action.priority.as_str().to_uppercase()
            ),
            badge(
                &action.status.as_str().replace('_', "-"),
                action.status.label()
            ),
        ));
    }
    out.push_str("</table></div>\n");
}

fn render_follow_ups(out: &mut String, record: &AgendaRecord) {
    open_section(out, "Follow-ups");
    out.push_str("<table>\n");
    out.push_str("<tr><th>Item</th><th>Priority</th><th>Status</th></tr>\n");
    for follow_up in &record.follow_ups {
        let status = if follow_up.completed { "Done" } else { "Open" };
        out.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            escape(&follow_up.content),
            badge(
                follow_up.priority.as_str(),
                &follow_up.priority.as_str().to_uppercase()
            ),
            status
        ));
    }
    out.push_str("</table></div>\n");
}
