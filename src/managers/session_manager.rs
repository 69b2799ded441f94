//! Session snapshot persistence.
//!
//! Stores a single [`SessionSnapshot`] as JSON on disk (overwrite, never
//! append), plus a separate last-known window geometry used when no full
//! snapshot exists. Read and parse failures mean "no snapshot"; they are
//! logged and never propagated to the user.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::platform;
use crate::types::errors::SessionError;
use crate::types::session::{SessionSnapshot, WindowGeometry, SESSION_SCHEMA_VERSION};

/// Trait defining snapshot store operations.
pub trait SnapshotStore: Send + Sync {
    fn load(&self) -> Option<SessionSnapshot>;
    fn save(&self, snapshot: &SessionSnapshot) -> bool;
    fn remove(&self);
}

/// JSON-file snapshot store with write-temp-then-replace semantics.
#[derive(Debug, Clone)]
pub struct SessionSnapshotStore {
    path: PathBuf,
}

impl SessionSnapshotStore {
    /// Creates a store at `path_override`, or `<data dir>/session.json`.
    pub fn new(path_override: Option<String>) -> Self {
        let path = match path_override {
            Some(p) => PathBuf::from(p),
            None => platform::get_data_dir().join("session.json"),
        };
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads and validates the snapshot, reporting why it is unusable.
    pub fn try_load(&self) -> Result<Option<SessionSnapshot>, SessionError> {
        let Some(snapshot) = read_json::<SessionSnapshot>(&self.path)? else {
            return Ok(None);
        };
        if snapshot.schema_version == 0 || snapshot.schema_version > SESSION_SCHEMA_VERSION {
            return Err(SessionError::UnsupportedVersion(snapshot.schema_version));
        }
        Ok(Some(snapshot))
    }

    pub fn try_save(&self, snapshot: &SessionSnapshot) -> Result<(), SessionError> {
        write_json_atomic(&self.path, snapshot)
    }
}

impl SnapshotStore for SessionSnapshotStore {
    fn load(&self) -> Option<SessionSnapshot> {
        match self.try_load() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "discarding unreadable session snapshot");
                None
            }
        }
    }

    fn save(&self, snapshot: &SessionSnapshot) -> bool {
        match self.try_save(snapshot) {
            Ok(()) => {
                debug!(path = %self.path.display(), windows = snapshot.windows.len(), "session snapshot saved");
                true
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "session snapshot save failed");
                false
            }
        }
    }

    fn remove(&self) {
        if let Err(e) = fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), error = %e, "failed to remove session snapshot");
            }
        }
    }
}

/// Last-known geometry of the most recently closed window.
#[derive(Debug, Clone)]
pub struct WindowGeometryStore {
    path: PathBuf,
}

impl WindowGeometryStore {
    /// Creates a store at `path_override`, or `<data dir>/window-geometry.json`.
    pub fn new(path_override: Option<String>) -> Self {
        let path = match path_override {
            Some(p) => PathBuf::from(p),
            None => platform::get_data_dir().join("window-geometry.json"),
        };
        Self { path }
    }

    pub fn load(&self) -> Option<WindowGeometry> {
        match read_json::<WindowGeometry>(&self.path) {
            Ok(geometry) => geometry,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "discarding unreadable window geometry");
                None
            }
        }
    }

    pub fn save(&self, geometry: &WindowGeometry) -> bool {
        match write_json_atomic(&self.path, geometry) {
            Ok(()) => true,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "window geometry save failed");
                false
            }
        }
    }
}

/// Current time in seconds since the Unix epoch.
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// Reads a JSON document; a missing file is `Ok(None)`.
fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, SessionError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(SessionError::IoError(e.to_string())),
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| SessionError::SerializationError(e.to_string()))
}

/// Serializes to a temp file beside `path`, then renames over it.
fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), SessionError> {
    let json = serde_json::to_vec_pretty(value)
        .map_err(|e| SessionError::SerializationError(e.to_string()))?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(|e| SessionError::IoError(e.to_string()))?;

    let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| SessionError::IoError(e.to_string()))?;
    tmp.write_all(&json)
        .map_err(|e| SessionError::IoError(e.to_string()))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| SessionError::IoError(e.to_string()))?;
    tmp.persist(path)
        .map_err(|e| SessionError::IoError(e.error.to_string()))?;
    Ok(())
}
