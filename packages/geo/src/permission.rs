use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    Granted,
    Denied,
    Prompt,
}

#[derive(Debug, thiserror::Error)]
pub enum PermissionStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt permission file: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Durable storage for the user's location permission decision, so a denied
/// user is not prompted again on the next session.
pub trait PermissionStore: Send + Sync {
    fn load(&self) -> Result<Option<PermissionState>, PermissionStoreError>;
    fn save(&self, state: PermissionState) -> Result<(), PermissionStoreError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct PermissionFile {
    geolocation: PermissionState,
}

/// Stores the flag as a small JSON document on disk
#[derive(Debug, Clone)]
pub struct FilePermissionStore {
    path: PathBuf,
}

impl FilePermissionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PermissionStore for FilePermissionStore {
    fn load(&self) -> Result<Option<PermissionState>, PermissionStoreError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let file: PermissionFile = serde_json::from_str(&raw)?;
        Ok(Some(file.geolocation))
    }

    fn save(&self, state: PermissionState) -> Result<(), PermissionStoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string(&PermissionFile { geolocation: state })?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryPermissionStore {
    state: Mutex<Option<PermissionState>>,
}

impl MemoryPermissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: PermissionState) -> Self {
        Self {
            state: Mutex::new(Some(state)),
        }
    }
}

impl PermissionStore for MemoryPermissionStore {
    fn load(&self) -> Result<Option<PermissionState>, PermissionStoreError> {
        Ok(*self.state.lock())
    }

    fn save(&self, state: PermissionState) -> Result<(), PermissionStoreError> {
        *self.state.lock() = Some(state);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("m1ssion-geo-{}", m1ssion_types::create_id()))
            .join(name)
    }

    #[test]
    fn file_store_round_trip() {
        let store = FilePermissionStore::new(temp_path("permission.json"));
        assert_eq!(store.load().unwrap(), None);

        store.save(PermissionState::Denied).unwrap();
        assert_eq!(store.load().unwrap(), Some(PermissionState::Denied));

        // a second handle on the same path sees the persisted decision
        let reopened = FilePermissionStore::new(store.path());
        assert_eq!(reopened.load().unwrap(), Some(PermissionState::Denied));

        std::fs::remove_dir_all(store.path().parent().unwrap()).ok();
    }

    #[test]
    fn corrupt_file_is_reported() {
        let store = FilePermissionStore::new(temp_path("permission.json"));
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), "not json").unwrap();

        assert!(matches!(store.load(), Err(PermissionStoreError::Corrupt(_))));

        std::fs::remove_dir_all(store.path().parent().unwrap()).ok();
    }
}
