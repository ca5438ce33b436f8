pub mod item_ops;
pub mod query;
pub mod snapshot;
pub mod store;

pub use query::{ListQuery, SortOrder, StoreStats};
pub use snapshot::ImportSummary;
pub use store::{AgendaError, AgendaPatch, AgendaStore, Commit, NewAgenda};
