use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::model::agenda::Snapshot;

/// Error type for snapshot persistence
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("could not read {path}: {source}")]
    ReadError { path: PathBuf, source: io::Error },
    #[error("could not write {path}: {source}")]
    WriteError { path: PathBuf, source: io::Error },
    #[error("{path} is not a valid agenda snapshot: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("could not serialize agendas: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Where mutations are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Persistence {
    /// Whole-snapshot write-through to a JSON file
    File(PathBuf),
    /// In-memory only; nothing survives the process
    Session,
}

impl Persistence {
    pub fn path(&self) -> Option<&Path> {
        match self {
            Persistence::File(path) => Some(path),
            Persistence::Session => None,
        }
    }

    /// Load the persisted snapshot. A missing file is an empty store.
    pub fn load(&self) -> Result<Snapshot, PersistError> {
        match self {
            Persistence::File(path) => load_snapshot(path),
            Persistence::Session => Ok(Snapshot::new()),
        }
    }

    /// Overwrite the persisted snapshot with `snapshot`.
    pub fn save(&self, snapshot: &Snapshot) -> Result<(), PersistError> {
        match self {
            Persistence::File(path) => save_snapshot(path, snapshot),
            Persistence::Session => {
                tracing::trace!(records = snapshot.len(), "session store, skipping write");
                Ok(())
            }
        }
    }
}

/// Read a snapshot file. Returns an empty snapshot if the file does not exist.
pub fn load_snapshot(path: &Path) -> Result<Snapshot, PersistError> {
    if !path.exists() {
        return Ok(Snapshot::new());
    }
    let text = fs::read_to_string(path).map_err(|e| PersistError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    if text.trim().is_empty() {
        return Ok(Snapshot::new());
    }
    serde_json::from_str(&text).map_err(|e| PersistError::Corrupt {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Serialize and write a snapshot file in one step.
pub fn save_snapshot(path: &Path, snapshot: &Snapshot) -> Result<(), PersistError> {
    let content = serde_json::to_string_pretty(snapshot)?;
    atomic_write(path, content.as_bytes()).map_err(|e| PersistError::WriteError {
        path: path.to_path_buf(),
        source: e,
    })?;
    tracing::info!(path = %path.display(), records = snapshot.len(), "saved agendas");
    Ok(())
}

/// Write `content` to `path` atomically using a temp file + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let snapshot = load_snapshot(&dir.path().join("agendas.json")).unwrap();
        assert!(snapshot.is_empty());
    }

    #[test]
    fn empty_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("agendas.json");
        fs::write(&path, "  \n").unwrap();
        assert!(load_snapshot(&path).unwrap().is_empty());
    }

    #[test]
    fn malformed_file_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("agendas.json");
        fs::write(&path, "not json {{{").unwrap();
        assert!(matches!(
            load_snapshot(&path),
            Err(PersistError::Corrupt { .. })
        ));
    }

    #[test]
    fn save_then_load_empty_snapshot() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("agendas.json");
        save_snapshot(&path, &Snapshot::new()).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
        assert!(load_snapshot(&path).unwrap().is_empty());
    }

    #[test]
    fn save_into_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("agendas.json");
        assert!(matches!(
            save_snapshot(&path, &Snapshot::new()),
            Err(PersistError::WriteError { .. })
        ));
    }

    #[test]
    fn session_persistence_never_touches_disk() {
        let persistence = Persistence::Session;
        assert!(persistence.path().is_none());
        persistence.save(&Snapshot::new()).unwrap();
        assert!(persistence.load().unwrap().is_empty());
    }
}
