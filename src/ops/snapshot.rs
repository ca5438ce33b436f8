use std::collections::HashSet;
use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::io::store_io::PersistError;
use crate::model::agenda::AgendaRecord;
use crate::model::config::LimitsConfig;
use crate::ops::store::{AgendaError, AgendaStore, Commit, require_text};

/// Result of an import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    /// Top-level records taken from the payload
    pub accepted: usize,
    /// How many of those overwrote an existing record
    pub replaced: usize,
}

impl AgendaStore {
    /// The whole store as pretty-printed JSON.
    pub fn export(&self) -> Result<String, AgendaError> {
        serde_json::to_string_pretty(&self.records)
            .map_err(|e| AgendaError::Persist(PersistError::Serialize(e)))
    }

    /// Merge a snapshot into the store, overwriting records with the same id.
    /// Nothing changes unless the whole payload is valid.
    pub fn import(&mut self, text: &str) -> Result<Commit<ImportSummary>, AgendaError> {
        let ImportPayload(incoming) =
            serde_json::from_str(text).map_err(|e| AgendaError::Format(e.to_string()))?;
        for (key, record) in &incoming {
            check_record(key, record, self.limits())?;
        }

        let mut summary = ImportSummary {
            accepted: 0,
            replaced: 0,
        };
        for (key, record) in incoming {
            if self.records.contains_key(&key) {
                summary.replaced += 1;
            }
            self.issued.insert(key.clone());
            self.records.insert(key, record);
            summary.accepted += 1;
        }
        tracing::info!(
            accepted = summary.accepted,
            replaced = summary.replaced,
            "imported agendas"
        );
        Ok(self.commit(summary))
    }
}

/// Snapshot entries in payload order. Unlike `Snapshot`, a repeated top-level
/// id is an error rather than a silent overwrite.
struct ImportPayload(Vec<(String, AgendaRecord)>);

impl<'de> Deserialize<'de> for ImportPayload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PayloadVisitor;

        impl<'de> Visitor<'de> for PayloadVisitor {
            type Value = ImportPayload;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of agenda id to agenda record")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut seen = HashSet::new();
                let mut entries = Vec::new();
                while let Some((key, record)) = map.next_entry::<String, AgendaRecord>()? {
                    if !seen.insert(key.clone()) {
                        return Err(de::Error::custom(format!("duplicate agenda id {}", key)));
                    }
                    entries.push((key, record));
                }
                Ok(ImportPayload(entries))
            }
        }

        deserializer.deserialize_map(PayloadVisitor)
    }
}

/// Checks serde cannot express. Imported records must satisfy the same
/// rules `create` and `update` enforce.
fn check_record(
    key: &str,
    record: &AgendaRecord,
    limits: &LimitsConfig,
) -> Result<(), AgendaError> {
    if key.is_empty() {
        return Err(AgendaError::Format("empty agenda id".into()));
    }
    if record.id != key {
        return Err(AgendaError::Format(format!(
            "record under key {} has id {}",
            key, record.id
        )));
    }
    for (field, value) in [("topic", &record.topic), ("presenter", &record.presenter)] {
        require_text(field, value)
            .map_err(|_| AgendaError::Format(format!("agenda {} has an empty {}", key, field)))?;
    }
    if !limits.duration_in_range(record.duration_minutes) {
        return Err(AgendaError::Format(format!(
            "agenda {} lasts {} minutes, outside {}-{}",
            key, record.duration_minutes, limits.min_duration, limits.max_duration
        )));
    }
    if record.updated_at < record.created_at {
        return Err(AgendaError::Format(format!(
            "agenda {} was updated before it was created",
            key
        )));
    }
    unique_ids(key, "note", record.notes.iter().map(|n| n.id.as_str()))?;
    unique_ids(key, "todo", record.todos.iter().map(|t| t.id.as_str()))?;
    unique_ids(
        key,
        "action item",
        record.action_items.iter().map(|a| a.id.as_str()),
    )?;
    unique_ids(
        key,
        "follow-up",
        record.follow_ups.iter().map(|f| f.id.as_str()),
    )?;
    Ok(())
}

fn unique_ids<'a>(
    agenda: &str,
    kind: &str,
    ids: impl Iterator<Item = &'a str>,
) -> Result<(), AgendaError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(AgendaError::Format(format!(
                "agenda {} has duplicate {} id {}",
                agenda, kind, id
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::agenda::Snapshot;
    use crate::model::items::Priority;
    use crate::ops::store::NewAgenda;
    use chrono::{NaiveDate, NaiveTime};
    use pretty_assertions::assert_eq;

    fn populated() -> (AgendaStore, String) {
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
        store.add_note(&id, "Numbers are in").unwrap().check().unwrap();
        store
            .add_todo(&id, "Prepare slides", Priority::High, "")
            .unwrap()
            .check()
            .unwrap();
        (store, id)
    }

    #[test]
    fn export_import_round_trip() {
        let (store, id) = populated();
        let text = store.export().unwrap();

        let mut fresh = AgendaStore::in_memory(LimitsConfig::default());
        let summary = fresh.import(&text).unwrap().check().unwrap();
        assert_eq!(
            summary,
            ImportSummary {
                accepted: 1,
                replaced: 0
            }
        );
        assert_eq!(fresh.get(&id).unwrap(), store.get(&id).unwrap());
    }

    #[test]
    fn import_overwrites_colliding_ids() {
        let (mut store, id) = populated();
        let mut edited = store.get(&id).unwrap().clone();
        edited.topic = "Budget Review (moved)".into();
        let mut payload = Snapshot::new();
        payload.insert(id.clone(), edited);
        let text = serde_json::to_string(&payload).unwrap();

        let summary = store.import(&text).unwrap().into_value();
        assert_eq!(summary.replaced, 1);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&id).unwrap().topic, "Budget Review (moved)");
    }

    #[test]
    fn import_malformed_json_leaves_store_unchanged() {
        let (mut store, id) = populated();
        let before = store.export().unwrap();
        assert!(matches!(
            store.import("not valid json"),
            Err(AgendaError::Format(_))
        ));
        assert_eq!(store.export().unwrap(), before);
        assert!(store.contains(&id));
    }

    #[test]
    fn import_wrong_shape_is_format_error() {
        let mut store = AgendaStore::in_memory(LimitsConfig::default());
        assert!(matches!(
            store.import(r#"[{"topic": "x"}]"#),
            Err(AgendaError::Format(_))
        ));
        assert!(matches!(
            store.import(r#"{"a1": {"topic": "missing fields"}}"#),
            Err(AgendaError::Format(_))
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn import_rejects_key_id_mismatch() {
        let (store, id) = populated();
        let mut payload = Snapshot::new();
        payload.insert("other".into(), store.get(&id).unwrap().clone());
        let text = serde_json::to_string(&payload).unwrap();

        let mut fresh = AgendaStore::in_memory(LimitsConfig::default());
        assert!(matches!(fresh.import(&text), Err(AgendaError::Format(_))));
        assert!(fresh.is_empty());
    }

    #[test]
    fn import_rejects_duplicate_sub_item_ids() {
        let (store, id) = populated();
        let mut record = store.get(&id).unwrap().clone();
        let dup = record.notes[0].clone();
        record.notes.push(dup);
        let mut payload = Snapshot::new();
        payload.insert(id, record);
        let text = serde_json::to_string(&payload).unwrap();

        let mut fresh = AgendaStore::in_memory(LimitsConfig::default());
        assert!(matches!(fresh.import(&text), Err(AgendaError::Format(_))));
    }

    #[test]
    fn imported_ids_are_not_reissued() {
        let (store, id) = populated();
        let text = store.export().unwrap();
        let mut fresh = AgendaStore::in_memory(LimitsConfig::default());
        fresh.import(&text).unwrap().check().unwrap();
        fresh.delete(&id).unwrap().check().unwrap();
        assert!(fresh.issued.contains(&id));
    }

    fn payload_with(edit: impl FnOnce(&mut AgendaRecord)) -> String {
        let (store, id) = populated();
        let mut record = store.get(&id).unwrap().clone();
        edit(&mut record);
        let mut payload = Snapshot::new();
        payload.insert(id, record);
        serde_json::to_string(&payload).unwrap()
    }

    #[test]
    fn import_rejects_blank_topic_or_presenter() {
        let mut fresh = AgendaStore::in_memory(LimitsConfig::default());
        let blank_topic = payload_with(|r| r.topic = "  ".into());
        let blank_presenter = payload_with(|r| r.presenter = String::new());

        assert!(matches!(fresh.import(&blank_topic), Err(AgendaError::Format(_))));
        assert!(matches!(
            fresh.import(&blank_presenter),
            Err(AgendaError::Format(_))
        ));
        assert!(fresh.is_empty());
    }

    #[test]
    fn import_rejects_duration_outside_limits() {
        let mut fresh = AgendaStore::in_memory(LimitsConfig::default());
        for minutes in [0, 4, 481] {
            let text = payload_with(|r| r.duration_minutes = minutes);
            assert!(
                matches!(fresh.import(&text), Err(AgendaError::Format(_))),
                "{} minutes accepted",
                minutes
            );
        }
        let text = payload_with(|r| r.duration_minutes = 480);
        assert_eq!(fresh.import(&text).unwrap().into_value().accepted, 1);
    }

    #[test]
    fn import_rejects_repeated_top_level_id() {
        let (store, id) = populated();
        let record = serde_json::to_string(store.get(&id).unwrap()).unwrap();
        let text = format!(r#"{{"{id}": {record}, "{id}": {record}}}"#);

        let mut fresh = AgendaStore::in_memory(LimitsConfig::default());
        match fresh.import(&text) {
            Err(AgendaError::Format(msg)) => {
                assert!(msg.contains("duplicate agenda id"), "{}", msg)
            }
            other => panic!("expected format error, got {:?}", other.map(|c| c.into_value())),
        }
        assert!(fresh.is_empty());
    }

    #[test]
    fn exported_timestamps_use_microseconds() {
        let (store, _) = populated();
        let text = store.export().unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        for record in value.as_object().unwrap().values() {
            for key in ["created_at", "updated_at"] {
                let stamp = record[key].as_str().unwrap();
                let fraction = stamp.split_once('.').map_or("", |(_, f)| f);
                assert!(fraction.len() <= 6, "{} = {}", key, stamp);
            }
        }
    }
}
