use std::collections::HashSet;

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::io::store_io::{PersistError, Persistence};
use crate::model::agenda::{AgendaRecord, AgendaStatus, Snapshot, UrlLink};
use crate::model::blob::Blob;
use crate::model::config::LimitsConfig;

/// Error type for agenda store operations
#[derive(Debug, thiserror::Error)]
pub enum AgendaError {
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
    #[error("invalid snapshot: {0}")]
    Format(String),
    #[error("change kept in memory but not saved: {0}")]
    Persist(#[from] PersistError),
}

impl AgendaError {
    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        AgendaError::Validation {
            field,
            reason: reason.into(),
        }
    }

    pub(crate) fn not_found(kind: &'static str, id: &str) -> Self {
        AgendaError::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

/// Outcome of a mutation that succeeded in memory.
///
/// `persist_error` is set when the follow-up snapshot write failed; the
/// in-memory change stands either way.
#[derive(Debug)]
#[must_use = "a Commit may carry a persistence failure"]
pub struct Commit<T> {
    pub value: T,
    pub persist_error: Option<PersistError>,
}

impl<T> Commit<T> {
    pub fn is_persisted(&self) -> bool {
        self.persist_error.is_none()
    }

    /// The mutation result, ignoring whether it reached storage.
    pub fn into_value(self) -> T {
        self.value
    }

    /// The mutation result, or `AgendaError::Persist` if the write failed.
    pub fn check(self) -> Result<T, AgendaError> {
        match self.persist_error {
            None => Ok(self.value),
            Some(e) => Err(AgendaError::Persist(e)),
        }
    }
}

/// Required fields for a new agenda
#[derive(Debug, Clone)]
pub struct NewAgenda {
    pub topic: String,
    pub presenter: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub duration_minutes: u32,
    pub description: Option<String>,
    pub topic_image: Option<Blob>,
    pub urls: Vec<UrlLink>,
    pub attachments: Vec<Blob>,
}

impl NewAgenda {
    pub fn new(
        topic: impl Into<String>,
        presenter: impl Into<String>,
        date: NaiveDate,
        time: NaiveTime,
        duration_minutes: u32,
    ) -> Self {
        NewAgenda {
            topic: topic.into(),
            presenter: presenter.into(),
            date,
            time,
            duration_minutes,
            description: None,
            topic_image: None,
            urls: Vec::new(),
            attachments: Vec::new(),
        }
    }
}

/// Partial update. `None` leaves a field unchanged; for the optional
/// fields, `Some(None)` clears them.
#[derive(Debug, Clone, Default)]
pub struct AgendaPatch {
    pub topic: Option<String>,
    pub presenter: Option<String>,
    pub description: Option<Option<String>>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub duration_minutes: Option<u32>,
    pub status: Option<AgendaStatus>,
    pub topic_image: Option<Option<Blob>>,
    pub urls: Option<Vec<UrlLink>>,
    pub attachments: Option<Vec<Blob>>,
}

impl AgendaPatch {
    pub fn is_empty(&self) -> bool {
        self.topic.is_none()
            && self.presenter.is_none()
            && self.description.is_none()
            && self.date.is_none()
            && self.time.is_none()
            && self.duration_minutes.is_none()
            && self.status.is_none()
            && self.topic_image.is_none()
            && self.urls.is_none()
            && self.attachments.is_none()
    }
}

/// Owns every agenda record and writes the full snapshot after each mutation.
#[derive(Debug)]
pub struct AgendaStore {
    pub(crate) records: Snapshot,
    /// Every record id handed out or loaded during this store's lifetime
    pub(crate) issued: HashSet<String>,
    persistence: Persistence,
    limits: LimitsConfig,
}

impl AgendaStore {
    /// Open a store backed by `persistence`, loading whatever it holds.
    pub fn open(persistence: Persistence, limits: LimitsConfig) -> Result<Self, AgendaError> {
        let records = persistence.load()?;
        tracing::debug!(records = records.len(), "opened agenda store");
        let issued = records.keys().cloned().collect();
        Ok(AgendaStore {
            records,
            issued,
            persistence,
            limits,
        })
    }

    /// A session-only store that starts empty.
    pub fn in_memory(limits: LimitsConfig) -> Self {
        AgendaStore {
            records: Snapshot::new(),
            issued: HashSet::new(),
            persistence: Persistence::Session,
            limits,
        }
    }

    pub fn persistence(&self) -> &Persistence {
        &self.persistence
    }

    pub fn limits(&self) -> &LimitsConfig {
        &self.limits
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    /// All records in store order
    pub fn records(&self) -> impl Iterator<Item = &AgendaRecord> {
        self.records.values()
    }

    pub fn get(&self, id: &str) -> Result<&AgendaRecord, AgendaError> {
        self.records
            .get(id)
            .ok_or_else(|| AgendaError::not_found("agenda", id))
    }

    /// Create an agenda and return its id.
    pub fn create(&mut self, new: NewAgenda) -> Result<Commit<String>, AgendaError> {
        let topic = require_text("topic", &new.topic)?;
        let presenter = require_text("presenter", &new.presenter)?;
        self.check_duration(new.duration_minutes)?;

        let id = self.fresh_record_id();
        let now = now();
        let record = AgendaRecord {
            id: id.clone(),
            topic,
            presenter,
            description: new.description.and_then(non_blank),
            date: new.date,
            time: new.time,
            duration_minutes: new.duration_minutes,
            status: AgendaStatus::Scheduled,
            topic_image: new.topic_image,
            urls: new.urls,
            attachments: new.attachments,
            notes: Vec::new(),
            todos: Vec::new(),
            action_items: Vec::new(),
            follow_ups: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.records.insert(id.clone(), record);
        tracing::debug!(%id, "created agenda");
        Ok(self.commit(id))
    }

    /// Merge the fields set in `patch` into an existing agenda.
    pub fn update(&mut self, id: &str, patch: AgendaPatch) -> Result<Commit<()>, AgendaError> {
        if !self.records.contains_key(id) {
            return Err(AgendaError::not_found("agenda", id));
        }
        let topic = patch
            .topic
            .as_deref()
            .map(|t| require_text("topic", t))
            .transpose()?;
        let presenter = patch
            .presenter
            .as_deref()
            .map(|p| require_text("presenter", p))
            .transpose()?;
        if let Some(minutes) = patch.duration_minutes {
            self.check_duration(minutes)?;
        }

        let record = self.record_mut(id)?;
        if let Some(topic) = topic {
            record.topic = topic;
        }
        if let Some(presenter) = presenter {
            record.presenter = presenter;
        }
        if let Some(description) = patch.description {
            record.description = description.and_then(non_blank);
        }
        if let Some(date) = patch.date {
            record.date = date;
        }
        if let Some(time) = patch.time {
            record.time = time;
        }
        if let Some(minutes) = patch.duration_minutes {
            record.duration_minutes = minutes;
        }
        if let Some(status) = patch.status {
            record.status = status;
        }
        if let Some(image) = patch.topic_image {
            record.topic_image = image;
        }
        if let Some(urls) = patch.urls {
            record.urls = urls;
        }
        if let Some(attachments) = patch.attachments {
            record.attachments = attachments;
        }
        record.touch(now());
        tracing::debug!(%id, "updated agenda");
        Ok(self.commit(()))
    }

    /// Remove an agenda together with all of its sub-items.
    pub fn delete(&mut self, id: &str) -> Result<Commit<AgendaRecord>, AgendaError> {
        let removed = self
            .records
            .shift_remove(id)
            .ok_or_else(|| AgendaError::not_found("agenda", id))?;
        tracing::debug!(%id, "deleted agenda");
        Ok(self.commit(removed))
    }

    // -----------------------------------------------------------------------
    // Helpers shared with the other store modules
    // -----------------------------------------------------------------------

    pub(crate) fn record_mut(&mut self, id: &str) -> Result<&mut AgendaRecord, AgendaError> {
        self.records
            .get_mut(id)
            .ok_or_else(|| AgendaError::not_found("agenda", id))
    }

    /// Write the snapshot and wrap `value` with the outcome.
    pub(crate) fn commit<T>(&self, value: T) -> Commit<T> {
        let persist_error = match self.persistence.save(&self.records) {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!(error = %e, "agenda change not persisted");
                Some(e)
            }
        };
        Commit {
            value,
            persist_error,
        }
    }

    fn check_duration(&self, minutes: u32) -> Result<(), AgendaError> {
        if self.limits.duration_in_range(minutes) {
            Ok(())
        } else {
            Err(AgendaError::validation(
                "duration",
                format!(
                    "{} minutes is outside {}-{}",
                    minutes, self.limits.min_duration, self.limits.max_duration
                ),
            ))
        }
    }

    fn fresh_record_id(&mut self) -> String {
        loop {
            let id = short_id();
            if !self.issued.contains(&id) && !self.records.contains_key(&id) {
                self.issued.insert(id.clone());
                return id;
            }
        }
    }
}

/// Current local wall-clock time, as stored in snapshots
/// Local time truncated to microseconds, the precision snapshots carry.
pub(crate) fn now() -> NaiveDateTime {
    let stamp = Local::now().naive_local();
    stamp
        .with_nanosecond(stamp.nanosecond() / 1_000 * 1_000)
        .unwrap_or(stamp)
}

/// Eight lowercase hex characters from a random UUID
pub(crate) fn short_id() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}

/// Trimmed text, or a validation error if nothing is left.
pub(crate) fn require_text(field: &'static str, value: &str) -> Result<String, AgendaError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(AgendaError::validation(field, "must not be empty"))
    } else {
        Ok(trimmed.to_string())
    }
}

fn non_blank(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn budget_review() -> NewAgenda {
        NewAgenda::new(
            "Budget Review",
            "A. Lee",
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            60,
        )
    }

    fn store() -> AgendaStore {
        AgendaStore::in_memory(LimitsConfig::default())
    }

    #[test]
    fn create_assigns_scheduled_record() {
        let mut store = store();
        let id = store.create(budget_review()).unwrap().check().unwrap();
        let record = store.get(&id).unwrap();
        assert_eq!(record.topic, "Budget Review");
        assert_eq!(record.presenter, "A. Lee");
        assert_eq!(record.status, AgendaStatus::Scheduled);
        assert!(record.notes.is_empty() && record.todos.is_empty());
        assert_eq!(record.created_at, record.updated_at);
        assert_eq!(id.len(), 8);
    }

    #[test]
    fn create_ids_are_never_reused() {
        let mut store = store();
        let mut seen = HashSet::new();
        for _ in 0..50 {
            let id = store.create(budget_review()).unwrap().into_value();
            store.delete(&id).unwrap().check().unwrap();
            assert!(seen.insert(id));
        }
        assert!(store.is_empty());
    }

    #[test]
    fn create_rejects_blank_topic_and_presenter() {
        let mut store = store();
        let mut new = budget_review();
        new.topic = "   ".into();
        assert!(matches!(
            store.create(new),
            Err(AgendaError::Validation { field: "topic", .. })
        ));
        let mut new = budget_review();
        new.presenter = String::new();
        assert!(matches!(
            store.create(new),
            Err(AgendaError::Validation {
                field: "presenter",
                ..
            })
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn create_rejects_out_of_range_duration() {
        let mut store = store();
        for minutes in [0, 4, 481] {
            let mut new = budget_review();
            new.duration_minutes = minutes;
            assert!(matches!(
                store.create(new),
                Err(AgendaError::Validation {
                    field: "duration",
                    ..
                })
            ));
        }
        let mut new = budget_review();
        new.duration_minutes = 480;
        assert!(store.create(new).is_ok());
    }

    #[test]
    fn update_merges_only_given_fields() {
        let mut store = store();
        let id = store.create(budget_review()).unwrap().into_value();
        let before = store.get(&id).unwrap().clone();

        let patch = AgendaPatch {
            topic: Some("Budget Review Q2".into()),
            status: Some(AgendaStatus::InProgress),
            ..Default::default()
        };
        store.update(&id, patch).unwrap().check().unwrap();

        let after = store.get(&id).unwrap();
        assert_eq!(after.topic, "Budget Review Q2");
        assert_eq!(after.status, AgendaStatus::InProgress);
        assert_eq!(after.presenter, before.presenter);
        assert_eq!(after.date, before.date);
        assert_eq!(after.duration_minutes, before.duration_minutes);
        assert!(after.updated_at >= before.updated_at);
    }

    #[test]
    fn update_validation_failure_changes_nothing() {
        let mut store = store();
        let id = store.create(budget_review()).unwrap().into_value();
        let before = store.get(&id).unwrap().clone();
        let patch = AgendaPatch {
            topic: Some("New topic".into()),
            duration_minutes: Some(1000),
            ..Default::default()
        };
        assert!(store.update(&id, patch).is_err());
        assert_eq!(store.get(&id).unwrap(), &before);
    }

    #[test]
    fn update_clears_description() {
        let mut store = store();
        let mut new = budget_review();
        new.description = Some("Quarterly numbers".into());
        let id = store.create(new).unwrap().into_value();
        assert_eq!(
            store.get(&id).unwrap().description.as_deref(),
            Some("Quarterly numbers")
        );
        let patch = AgendaPatch {
            description: Some(None),
            ..Default::default()
        };
        store.update(&id, patch).unwrap().check().unwrap();
        assert!(store.get(&id).unwrap().description.is_none());
    }

    #[test]
    fn deleted_id_is_not_found_everywhere() {
        let mut store = store();
        let id = store.create(budget_review()).unwrap().into_value();
        let removed = store.delete(&id).unwrap().into_value();
        assert_eq!(removed.id, id);

        assert!(matches!(store.get(&id), Err(AgendaError::NotFound { .. })));
        assert!(matches!(
            store.update(&id, AgendaPatch::default()),
            Err(AgendaError::NotFound { .. })
        ));
        assert!(matches!(
            store.delete(&id),
            Err(AgendaError::NotFound { .. })
        ));
    }

    #[test]
    fn delete_preserves_order_of_remaining() {
        let mut store = store();
        let a = store.create(budget_review()).unwrap().into_value();
        let b = store.create(budget_review()).unwrap().into_value();
        let c = store.create(budget_review()).unwrap().into_value();
        store.delete(&b).unwrap().check().unwrap();
        let ids: Vec<_> = store.records().map(|r| r.id.clone()).collect();
        assert_eq!(ids, vec![a, c]);
    }

    #[test]
    fn file_store_writes_through() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("agendas.json");
        let mut store =
            AgendaStore::open(Persistence::File(path.clone()), LimitsConfig::default()).unwrap();
        let id = store.create(budget_review()).unwrap().check().unwrap();

        let reopened =
            AgendaStore::open(Persistence::File(path), LimitsConfig::default()).unwrap();
        assert_eq!(reopened.get(&id).unwrap(), store.get(&id).unwrap());
    }

    #[test]
    fn persist_failure_keeps_memory_state() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("agendas.json");
        let mut store =
            AgendaStore::open(Persistence::File(path), LimitsConfig::default()).unwrap();

        let commit = store.create(budget_review()).unwrap();
        assert!(!commit.is_persisted());
        let id = commit.value.clone();
        assert!(matches!(commit.check(), Err(AgendaError::Persist(_))));
        assert_eq!(store.get(&id).unwrap().topic, "Budget Review");
    }

    #[test]
    fn timestamps_serialize_with_at_most_microseconds() {
        let mut store = store();
        let id = store.create(budget_review()).unwrap().into_value();
        let record = store.get(&id).unwrap();
        assert_eq!(record.created_at.nanosecond() % 1_000, 0);

        let json = serde_json::to_value(record).unwrap();
        let created = json["created_at"].as_str().unwrap();
        let fraction = created.split_once('.').map_or("", |(_, f)| f);
        assert!(fraction.len() <= 6, "created_at {}", created);
        assert!(NaiveDateTime::parse_from_str(created, "%Y-%m-%dT%H:%M:%S%.f").is_ok());
    }
}
