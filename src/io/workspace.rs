use std::fs;
use std::path::{Path, PathBuf};

use crate::io::store_io::Persistence;
use crate::model::config::{AgendaConfig, PersistMode};

/// Name of the directory that marks an agenda workspace
pub const AGENDA_DIR: &str = ".agenda";

/// Error type for workspace discovery and config I/O
#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    #[error("not an agenda workspace: no .agenda/ directory found (run `agenda init`)")]
    NotAWorkspace,
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse config.toml: {0}")]
    ConfigParseError(#[from] toml::de::Error),
    #[error("could not edit config.toml: {0}")]
    ConfigEditError(#[from] toml_edit::TomlError),
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

/// A discovered workspace with its parsed configuration
#[derive(Debug)]
pub struct Workspace {
    /// Directory containing `.agenda/`
    pub root: PathBuf,
    /// Path to the `.agenda/` directory
    pub agenda_dir: PathBuf,
    pub config: AgendaConfig,
}

impl Workspace {
    /// Persistence target selected by `[store]`
    pub fn persistence(&self) -> Persistence {
        match self.config.store.persist {
            PersistMode::File => Persistence::File(self.agenda_dir.join(&self.config.store.file)),
            PersistMode::Session => Persistence::Session,
        }
    }
}

/// Walk up from `start` looking for `.agenda/config.toml`.
pub fn discover_workspace(start: &Path) -> Result<PathBuf, WorkspaceError> {
    let mut current = start.to_path_buf();
    loop {
        let agenda_dir = current.join(AGENDA_DIR);
        if agenda_dir.is_dir() && agenda_dir.join("config.toml").exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(WorkspaceError::NotAWorkspace);
        }
    }
}

/// Load the workspace rooted at `root`.
pub fn load_workspace(root: &Path) -> Result<Workspace, WorkspaceError> {
    let agenda_dir = root.join(AGENDA_DIR);
    if !agenda_dir.is_dir() {
        return Err(WorkspaceError::NotAWorkspace);
    }
    let config_path = agenda_dir.join("config.toml");
    let config_text = fs::read_to_string(&config_path).map_err(|e| WorkspaceError::ReadError {
        path: config_path.clone(),
        source: e,
    })?;
    let config: AgendaConfig = toml::from_str(&config_text)?;
    Ok(Workspace {
        root: root.to_path_buf(),
        agenda_dir,
        config,
    })
}
