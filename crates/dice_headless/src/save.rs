//! Snapshot files.
//!
//! The snapshot is written as pretty JSON after every mutation and read
//! once at startup. A missing or unreadable file starts a fresh game.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use dice_core::data::Catalog;
use dice_core::economy::{Economy, EconomyConfig};
use dice_core::snapshot::Snapshot;

/// Errors reading or writing a snapshot file.
#[derive(Debug, Error)]
pub enum SaveError {
    /// Filesystem failure.
    #[error("Snapshot IO error at {path}: {source}")]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// File contents are not a snapshot.
    #[error("Malformed snapshot at {path}: {source}")]
    Json {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
}

/// Write `snapshot` to `path`, replacing any previous file.
///
/// The JSON goes to a sibling temporary file first and is renamed into
/// place, so a crash mid-write leaves the old snapshot intact.
pub fn save_snapshot(path: &Path, snapshot: &Snapshot) -> Result<(), SaveError> {
    let json = serde_json::to_string_pretty(snapshot).map_err(|source| SaveError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let tmp = path.with_extension("json.tmp");
    let io_err = |source| SaveError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    fs::write(&tmp, json).map_err(io_err)?;
    fs::rename(&tmp, path).map_err(io_err)?;
    Ok(())
}

/// Read a snapshot. `Ok(None)` when the file does not exist.
pub fn load_snapshot(path: &Path) -> Result<Option<Snapshot>, SaveError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(SaveError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    serde_json::from_str(&text)
        .map(Some)
        .map_err(|source| SaveError::Json {
            path: path.to_path_buf(),
            source,
        })
}

/// Build the economy a session starts with: the saved game at `path` if
/// it loads, otherwise a fresh one.
pub fn load_or_initial(path: Option<&Path>, catalog: Arc<Catalog>, config: EconomyConfig) -> Economy {
    let Some(path) = path else {
        return Economy::new(catalog, config);
    };
    match load_snapshot(path) {
        Ok(Some(snapshot)) => {
            info!("Loaded snapshot from {}", path.display());
            Economy::from_snapshot(catalog, config, snapshot)
        }
        Ok(None) => {
            info!("No snapshot at {}, starting fresh", path.display());
            Economy::new(catalog, config)
        }
        Err(e) => {
            warn!("{e}; starting fresh");
            Economy::new(catalog, config)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dice_core::data::TierKey;

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("save.json");
        let mut economy = Economy::default();
        economy.purchase_die(TierKey::Steel);

        save_snapshot(&path, &economy.snapshot()).unwrap();
        let loaded = load_snapshot(&path).unwrap().unwrap();
        assert_eq!(loaded, economy.snapshot());
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_snapshot(&dir.path().join("absent.json"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_malformed_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("save.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(load_snapshot(&path), Err(SaveError::Json { .. })));
        let economy = load_or_initial(Some(path.as_path()), Catalog::builtin(), EconomyConfig::default());
        assert_eq!(economy.state_hash(), Economy::default().state_hash());
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("save.json");
        save_snapshot(&path, &Economy::default().snapshot()).unwrap();
        assert!(path.exists());
    }
}
