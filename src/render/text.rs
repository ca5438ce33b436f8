use crate::model::agenda::AgendaRecord;

/// Short summary used as the plain-text alternative of an email.
pub(super) fn render_summary(record: &AgendaRecord) -> String {
    let mut out = String::new();
    out.push_str(&format!("Meeting Agenda: {}\n", record.topic));
    out.push_str(&format!("Presenter: {}\n", record.presenter));
    out.push_str(&format!(
        "Date: {} at {}\n",
        record.date.format("%Y-%m-%d"),
        record.time.format("%H:%M")
    ));
    out.push_str(&format!("Duration: {} minutes\n", record.duration_minutes));
    out.push('\n');
    out.push_str("Please view this email in HTML format for the full content.\n");
    out
}
