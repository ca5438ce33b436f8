use chrono::NaiveDate;

use crate::model::items::{
    ActionItem, ActionStatus, FollowUp, Note, Priority, SubItemKind, Todo,
};
use crate::ops::store::{AgendaError, AgendaStore, Commit, now, require_text, short_id};

/// A short id not already used by any element of `taken`.
fn fresh_item_id<'a>(taken: impl Iterator<Item = &'a str> + Clone) -> String {
    loop {
        let id = short_id();
        if !taken.clone().any(|t| t == id) {
            return id;
        }
    }
}

// ---------------------------------------------------------------------------
// Adding sub-items
// ---------------------------------------------------------------------------

impl AgendaStore {
    /// Append a note. Returns the note id.
    pub fn add_note(&mut self, id: &str, content: &str) -> Result<Commit<String>, AgendaError> {
        let record = self.record_mut(id)?;
        let content = require_text("note", content)?;

        let note_id = fresh_item_id(record.notes.iter().map(|n| n.id.as_str()));
        let now = now();
        record.notes.push(Note {
            id: note_id.clone(),
            content,
            created_at: now,
        });
        record.touch(now);
        tracing::debug!(agenda = %id, note = %note_id, "added note");
        Ok(self.commit(note_id))
    }

    /// Append a to-do. An empty assignee means unassigned.
    pub fn add_todo(
        &mut self,
        id: &str,
        task: &str,
        priority: Priority,
        assignee: &str,
    ) -> Result<Commit<String>, AgendaError> {
        let record = self.record_mut(id)?;
        let task = require_text("task", task)?;

        let todo_id = fresh_item_id(record.todos.iter().map(|t| t.id.as_str()));
        let now = now();
        record.todos.push(Todo {
            id: todo_id.clone(),
            task,
            priority,
            assignee: assignee.trim().to_string(),
            completed: false,
            created_at: now,
        });
        record.touch(now);
        tracing::debug!(agenda = %id, todo = %todo_id, "added todo");
        Ok(self.commit(todo_id))
    }

    /// Append an action item in `pending` state.
    pub fn add_action_item(
        &mut self,
        id: &str,
        action: &str,
        owner: &str,
        due_date: NaiveDate,
        priority: Priority,
    ) -> Result<Commit<String>, AgendaError> {
        let record = self.record_mut(id)?;
        let action = require_text("action", action)?;
        let owner = require_text("owner", owner)?;

        let action_id = fresh_item_id(record.action_items.iter().map(|a| a.id.as_str()));
        let now = now();
        record.action_items.push(ActionItem {
            id: action_id.clone(),
            action,
            owner,
            due_date,
            priority,
            status: ActionStatus::Pending,
            created_at: now,
        });
        record.touch(now);
        tracing::debug!(agenda = %id, action = %action_id, "added action item");
        Ok(self.commit(action_id))
    }

    /// Append a follow-up.
    pub fn add_follow_up(
        &mut self,
        id: &str,
        content: &str,
        priority: Priority,
    ) -> Result<Commit<String>, AgendaError> {
        let record = self.record_mut(id)?;
        let content = require_text("follow-up", content)?;

        let item_id = fresh_item_id(record.follow_ups.iter().map(|f| f.id.as_str()));
        let now = now();
        record.follow_ups.push(FollowUp {
            id: item_id.clone(),
            content,
            priority,
            completed: false,
            created_at: now,
        });
        record.touch(now);
        tracing::debug!(agenda = %id, follow_up = %item_id, "added follow-up");
        Ok(self.commit(item_id))
    }

    // -----------------------------------------------------------------------
    // State changes
    // -----------------------------------------------------------------------

    /// Flip a to-do's `completed` flag. Returns the new value.
    pub fn toggle_todo(&mut self, id: &str, todo_id: &str) -> Result<Commit<bool>, AgendaError> {
        let record = self.record_mut(id)?;
        let todo = record
            .todos
            .iter_mut()
            .find(|t| t.id == todo_id)
            .ok_or_else(|| AgendaError::not_found("todo", todo_id))?;
        todo.completed = !todo.completed;
        let completed = todo.completed;
        record.touch(now());
        tracing::debug!(agenda = %id, todo = %todo_id, completed, "toggled todo");
        Ok(self.commit(completed))
    }

    /// Flip a follow-up's `completed` flag. Returns the new value.
    pub fn toggle_follow_up(
        &mut self,
        id: &str,
        item_id: &str,
    ) -> Result<Commit<bool>, AgendaError> {
        let record = self.record_mut(id)?;
        let item = record
            .follow_ups
            .iter_mut()
            .find(|f| f.id == item_id)
            .ok_or_else(|| AgendaError::not_found("follow-up", item_id))?;
        item.completed = !item.completed;
        let completed = item.completed;
        record.touch(now());
        tracing::debug!(agenda = %id, follow_up = %item_id, completed, "toggled follow-up");
        Ok(self.commit(completed))
    }

    pub fn set_action_status(
        &mut self,
        id: &str,
        action_id: &str,
        status: ActionStatus,
    ) -> Result<Commit<()>, AgendaError> {
        let record = self.record_mut(id)?;
        let action = record
            .action_items
            .iter_mut()
            .find(|a| a.id == action_id)
            .ok_or_else(|| AgendaError::not_found("action item", action_id))?;
        action.status = status;
        record.touch(now());
        tracing::debug!(agenda = %id, action = %action_id, status = status.as_str(), "set action status");
        Ok(self.commit(()))
    }

    /// Remove one sub-item. Returns whether anything was removed; an item
    /// that is already gone is not an error.
    pub fn delete_sub_item(
        &mut self,
        id: &str,
        kind: SubItemKind,
        item_id: &str,
    ) -> Result<Commit<bool>, AgendaError> {
        let record = self.record_mut(id)?;
        let removed = match kind {
            SubItemKind::Note => remove_by_id(&mut record.notes, item_id, |n| &n.id),
            SubItemKind::Todo => remove_by_id(&mut record.todos, item_id, |t| &t.id),
            SubItemKind::Action => remove_by_id(&mut record.action_items, item_id, |a| &a.id),
            SubItemKind::FollowUp => remove_by_id(&mut record.follow_ups, item_id, |f| &f.id),
        };
        if !removed {
            tracing::debug!(agenda = %id, kind = kind.as_str(), item = %item_id, "sub-item already absent");
            return Ok(Commit {
                value: false,
                persist_error: None,
            });
        }
        record.touch(now());
        tracing::debug!(agenda = %id, kind = kind.as_str(), item = %item_id, "deleted sub-item");
        Ok(self.commit(true))
    }
}

fn remove_by_id<T>(items: &mut Vec<T>, item_id: &str, id_of: impl Fn(&T) -> &String) -> bool {
    let before = items.len();
    items.retain(|item| id_of(item) != item_id);
    items.len() != before
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::config::LimitsConfig;
    use crate::ops::store::NewAgenda;
    use chrono::NaiveTime;

    fn store_with_agenda() -> (AgendaStore, String) {
        let mut store = AgendaStore::in_memory(LimitsConfig::default());
        let id = store
            .create(NewAgenda::new(
                "Budget Review",
                "A. Lee",
                NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
                NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                60,
            ))
            .unwrap()
            .into_value();
        (store, id)
    }

    fn due() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 15).unwrap()
    }

    #[test]
    fn add_note_appends_in_order() {
        let (mut store, id) = store_with_agenda();
        let first = store.add_note(&id, "Opening remarks").unwrap().into_value();
        let second = store.add_note(&id, "  Q&A  ").unwrap().into_value();
        let notes = &store.get(&id).unwrap().notes;
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].id, first);
        assert_eq!(notes[1].id, second);
        assert_eq!(notes[1].content, "Q&A");
        assert_ne!(first, second);
    }

    #[test]
    fn sub_item_refreshes_updated_at() {
        let (mut store, id) = store_with_agenda();
        let before = store.get(&id).unwrap().updated_at;
        store.add_note(&id, "note").unwrap().check().unwrap();
        let record = store.get(&id).unwrap();
        assert!(record.updated_at >= before);
        assert!(record.updated_at >= record.created_at);
    }

    #[test]
    fn add_to_missing_agenda_is_not_found() {
        let (mut store, _) = store_with_agenda();
        assert!(matches!(
            store.add_note("nope", "text"),
            Err(AgendaError::NotFound { kind: "agenda", .. })
        ));
        assert!(matches!(
            store.add_todo("nope", "task", Priority::Low, ""),
            Err(AgendaError::NotFound { .. })
        ));
        assert!(matches!(
            store.add_action_item("nope", "a", "o", due(), Priority::Low),
            Err(AgendaError::NotFound { .. })
        ));
        assert!(matches!(
            store.add_follow_up("nope", "f", Priority::Low),
            Err(AgendaError::NotFound { .. })
        ));
    }

    #[test]
    fn empty_required_sub_fields_are_rejected() {
        let (mut store, id) = store_with_agenda();
        assert!(matches!(
            store.add_note(&id, " "),
            Err(AgendaError::Validation { .. })
        ));
        assert!(matches!(
            store.add_todo(&id, "", Priority::High, "Sam"),
            Err(AgendaError::Validation { .. })
        ));
        assert!(matches!(
            store.add_action_item(&id, "Ship it", "", due(), Priority::High),
            Err(AgendaError::Validation { field: "owner", .. })
        ));
        assert!(matches!(
            store.add_follow_up(&id, "\n", Priority::High),
            Err(AgendaError::Validation { .. })
        ));
        let record = store.get(&id).unwrap();
        assert!(record.notes.is_empty());
        assert!(record.todos.is_empty());
        assert!(record.action_items.is_empty());
        assert!(record.follow_ups.is_empty());
    }

    #[test]
    fn toggle_todo_is_an_involution() {
        let (mut store, id) = store_with_agenda();
        let todo_id = store
            .add_todo(&id, "Prepare slides", Priority::High, "")
            .unwrap()
            .into_value();
        assert!(!store.get(&id).unwrap().todos[0].completed);

        assert!(store.toggle_todo(&id, &todo_id).unwrap().into_value());
        assert!(store.get(&id).unwrap().todos[0].completed);

        assert!(!store.toggle_todo(&id, &todo_id).unwrap().into_value());
        assert!(!store.get(&id).unwrap().todos[0].completed);
    }

    #[test]
    fn toggle_follow_up_is_an_involution() {
        let (mut store, id) = store_with_agenda();
        let item = store
            .add_follow_up(&id, "Send minutes", Priority::Medium)
            .unwrap()
            .into_value();
        assert!(store.toggle_follow_up(&id, &item).unwrap().into_value());
        assert!(!store.toggle_follow_up(&id, &item).unwrap().into_value());
    }

    #[test]
    fn toggle_missing_item_is_not_found() {
        let (mut store, id) = store_with_agenda();
        assert!(matches!(
            store.toggle_todo(&id, "missing"),
            Err(AgendaError::NotFound { kind: "todo", .. })
        ));
        assert!(matches!(
            store.toggle_follow_up(&id, "missing"),
            Err(AgendaError::NotFound { .. })
        ));
        assert!(matches!(
            store.set_action_status(&id, "missing", ActionStatus::Completed),
            Err(AgendaError::NotFound { .. })
        ));
    }

    #[test]
    fn set_action_status_changes_only_target() {
        let (mut store, id) = store_with_agenda();
        let a = store
            .add_action_item(&id, "Draft plan", "Kim", due(), Priority::Medium)
            .unwrap()
            .into_value();
        let b = store
            .add_action_item(&id, "Review plan", "Ari", due(), Priority::Low)
            .unwrap()
            .into_value();
        store
            .set_action_status(&id, &b, ActionStatus::InProgress)
            .unwrap()
            .check()
            .unwrap();
        let record = store.get(&id).unwrap();
        assert_eq!(record.action_items[0].id, a);
        assert_eq!(record.action_items[0].status, ActionStatus::Pending);
        assert_eq!(record.action_items[1].status, ActionStatus::InProgress);
        assert_eq!(record.pending_actions(), 2);
    }

    #[test]
    fn delete_sub_item_removes_and_tolerates_absent() {
        let (mut store, id) = store_with_agenda();
        let note = store.add_note(&id, "keep?").unwrap().into_value();
        let todo = store
            .add_todo(&id, "task", Priority::Low, "")
            .unwrap()
            .into_value();

        assert!(
            store
                .delete_sub_item(&id, SubItemKind::Note, &note)
                .unwrap()
                .into_value()
        );
        assert!(
            !store
                .delete_sub_item(&id, SubItemKind::Note, &note)
                .unwrap()
                .into_value()
        );
        // Wrong collection is also a no-op
        assert!(
            !store
                .delete_sub_item(&id, SubItemKind::Action, &todo)
                .unwrap()
                .into_value()
        );

        let record = store.get(&id).unwrap();
        assert!(record.notes.is_empty());
        assert_eq!(record.todos.len(), 1);
    }

    #[test]
    fn delete_sub_item_on_missing_agenda_is_not_found() {
        let (mut store, _) = store_with_agenda();
        assert!(matches!(
            store.delete_sub_item("gone", SubItemKind::Todo, "x"),
            Err(AgendaError::NotFound { .. })
        ));
    }

    #[test]
    fn deleting_agenda_cascades() {
        let (mut store, id) = store_with_agenda();
        let todo = store
            .add_todo(&id, "task", Priority::Low, "")
            .unwrap()
            .into_value();
        store.delete(&id).unwrap().check().unwrap();
        assert!(matches!(
            store.toggle_todo(&id, &todo),
            Err(AgendaError::NotFound { kind: "agenda", .. })
        ));
        assert!(matches!(
            store.add_note(&id, "late note"),
            Err(AgendaError::NotFound { .. })
        ));
    }
}
