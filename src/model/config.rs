use serde::{Deserialize, Serialize};

/// Configuration from `.agenda/config.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgendaConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub email: EmailConfig,
}

/// Where agendas are kept
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Snapshot file, relative to `.agenda/`
    #[serde(default = "default_store_file")]
    pub file: String,
    #[serde(default)]
    pub persist: PersistMode,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            file: default_store_file(),
            persist: PersistMode::File,
        }
    }
}

/// `file` writes every mutation through to disk; `session` keeps state in memory only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PersistMode {
    #[default]
    File,
    Session,
}

/// Validation bounds for agenda fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_min_duration")]
    pub min_duration: u32,
    #[serde(default = "default_max_duration")]
    pub max_duration: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        LimitsConfig {
            min_duration: default_min_duration(),
            max_duration: default_max_duration(),
        }
    }
}

impl LimitsConfig {
    pub fn duration_in_range(&self, minutes: u32) -> bool {
        (self.min_duration..=self.max_duration).contains(&minutes)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default)]
    pub note_order: NoteOrder,
}

/// Display order for notes in detail views and rendered documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum NoteOrder {
    /// Insertion order, as stored
    #[default]
    OldestFirst,
    NewestFirst,
}

impl NoteOrder {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "oldest-first" | "oldest" => Some(NoteOrder::OldestFirst),
            "newest-first" | "newest" => Some(NoteOrder::NewestFirst),
            _ => None,
        }
    }
}

/// SMTP settings and the saved distribution list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    #[serde(default)]
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub sender: String,
    /// Overridden by `AGENDA_SMTP_PASSWORD` when set
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub distribution_list: Vec<String>,
}

impl Default for EmailConfig {
    fn default() -> Self {
        EmailConfig {
            smtp_host: String::new(),
            smtp_port: default_smtp_port(),
            sender: String::new(),
            password: String::new(),
            distribution_list: Vec::new(),
        }
    }
}

/// Default: see src/cli/handlers/init.rs template
fn default_store_file() -> String {
    "agendas.json".to_string()
}

/// Default: see src/cli/handlers/init.rs template
fn default_min_duration() -> u32 {
    5
}

/// Default: see src/cli/handlers/init.rs template
fn default_max_duration() -> u32 {
    480
}

fn default_smtp_port() -> u16 {
    587
}
