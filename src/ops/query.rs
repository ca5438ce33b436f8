use std::cmp::Ordering;

use serde::Serialize;

use crate::model::agenda::{AgendaRecord, AgendaStatus};
use crate::ops::store::AgendaStore;

/// Sort order for agenda listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Newest meeting first
    #[default]
    DateDesc,
    DateAsc,
    TopicAsc,
    TopicDesc,
}

impl SortOrder {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "date-desc" | "newest" => Some(SortOrder::DateDesc),
            "date-asc" | "oldest" => Some(SortOrder::DateAsc),
            "topic-asc" | "topic" | "a-z" => Some(SortOrder::TopicAsc),
            "topic-desc" | "z-a" => Some(SortOrder::TopicDesc),
            _ => None,
        }
    }

    fn compare(self, a: &AgendaRecord, b: &AgendaRecord) -> Ordering {
        match self {
            SortOrder::DateAsc => (a.date, a.time).cmp(&(b.date, b.time)),
            SortOrder::DateDesc => (b.date, b.time).cmp(&(a.date, a.time)),
            SortOrder::TopicAsc => a.topic.to_lowercase().cmp(&b.topic.to_lowercase()),
            SortOrder::TopicDesc => b.topic.to_lowercase().cmp(&a.topic.to_lowercase()),
        }
    }
}

/// Filter and sort for [`AgendaStore::list`]
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    /// Case-insensitive substring matched against topic and presenter
    pub search: Option<String>,
    pub status: Option<AgendaStatus>,
    pub sort: SortOrder,
}

impl ListQuery {
    fn matches(&self, record: &AgendaRecord) -> bool {
        if let Some(status) = self.status
            && record.status != status
        {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => {
                let needle = needle.to_lowercase();
                record.topic.to_lowercase().contains(&needle)
                    || record.presenter.to_lowercase().contains(&needle)
            }
            _ => true,
        }
    }
}

/// Counts across the whole store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub total: usize,
    pub scheduled: usize,
    pub in_progress: usize,
    pub completed: usize,
    /// Action items not yet completed
    pub pending_actions: usize,
    pub open_todos: usize,
    pub follow_ups: usize,
    pub open_follow_ups: usize,
}

impl AgendaStore {
    /// Records matching `query`, sorted. Ties keep store order.
    pub fn list(&self, query: &ListQuery) -> Vec<&AgendaRecord> {
        let mut records: Vec<&AgendaRecord> =
            self.records().filter(|r| query.matches(r)).collect();
        records.sort_by(|a, b| query.sort.compare(a, b));
        records
    }

    pub fn stats(&self) -> StoreStats {
        let mut stats = StoreStats::default();
        for record in self.records() {
            stats.total += 1;
            match record.status {
                AgendaStatus::Scheduled => stats.scheduled += 1,
                AgendaStatus::InProgress => stats.in_progress += 1,
                AgendaStatus::Completed => stats.completed += 1,
            }
            stats.pending_actions += record.pending_actions();
            stats.open_todos += record.todos.iter().filter(|t| !t.completed).count();
            stats.follow_ups += record.follow_ups.len();
            stats.open_follow_ups += record.follow_ups.iter().filter(|f| !f.completed).count();
        }
        stats
    }

    /// Most recently modified records first, at most `limit`.
    pub fn recent(&self, limit: usize) -> Vec<&AgendaRecord> {
        let mut records: Vec<&AgendaRecord> = self.records().collect();
        records.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        records.truncate(limit);
        records
    }
}

/// Group records under `Month YYYY` headings, keeping their order.
pub fn group_by_month<'a>(records: &[&'a AgendaRecord]) -> Vec<(String, Vec<&'a AgendaRecord>)> {
    let mut groups: Vec<(String, Vec<&'a AgendaRecord>)> = Vec::new();
    for &record in records {
        let label = record.date.format("%B %Y").to_string();
        match groups.last_mut() {
            Some((last, items)) if *last == label => items.push(record),
            _ => groups.push((label, vec![record])),
        }
    }
    groups
}
