//! Client-side key/value storage for the company selection.
//!
//! Two scopes are used: a durable store that survives restarts and a
//! session-scoped store that lives as long as the process (or browser
//! tab, for other front ends).

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::error::SessionError;

/// Durable key holding the selection as JSON `{ "id": ..., "name": ... }`.
pub const SELECTED_COMPANY_KEY: &str = "okr.selected_company";

/// Durable key from older clients holding only the company id.
pub const LEGACY_SELECTED_COMPANY_KEY: &str = "okr.selected_company_id";

/// Session-scoped marker: the admin selection reset already ran.
pub const ADMIN_SELECTION_RESET_KEY: &str = "okr.admin_selection_reset";

pub trait ClientStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), SessionError>;
    /// Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), SessionError>;
}

impl<S: ClientStorage + ?Sized> ClientStorage for Arc<S> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), SessionError> {
        (**self).remove(key)
    }
}

/// Forget the stored company selection and end the admin session
/// marker. Failures are logged; the remaining keys are still removed.
pub fn clear_selection(durable: &dyn ClientStorage, session_storage: &dyn ClientStorage) {
    for key in [SELECTED_COMPANY_KEY, LEGACY_SELECTED_COMPANY_KEY] {
        if let Err(e) = durable.remove(key) {
            warn!(key, error = %e, "Failed to clear stored selection");
        }
    }
    if let Err(e) = session_storage.remove(ADMIN_SELECTION_RESET_KEY) {
        warn!(error = %e, "Failed to clear session marker");
    }
}

fn poisoned() -> SessionError {
    SessionError::Storage("storage lock poisoned".into())
}

/// Process-lifetime storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClientStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        self.entries
            .lock()
            .map_err(|_| poisoned())?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SessionError> {
        self.entries.lock().map_err(|_| poisoned())?.remove(key);
        Ok(())
    }
}

/// Storage backed by a JSON object on disk. Every write rewrites the
/// whole file.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Open (or lazily create) the store at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SessionError> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            if raw.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&raw)?
            }
        } else {
            BTreeMap::new()
        };

        debug!(path = %path.display(), keys = entries.len(), "Opened client storage");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(entries)?)?;
        Ok(())
    }
}

impl ClientStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        let mut entries = self.entries.lock().map_err(|_| poisoned())?;
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), SessionError> {
        let mut entries = self.entries.lock().map_err(|_| poisoned())?;
        if entries.remove(key).is_some() {
            self.flush(&entries)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_storage_set_get_remove() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get("k"), None);

        storage.set("k", "v").unwrap();
        assert_eq!(storage.get("k").as_deref(), Some("v"));

        storage.remove("k").unwrap();
        storage.remove("k").unwrap();
        assert_eq!(storage.get("k"), None);
    }

    #[test]
    fn shared_storage_sees_the_same_entries() {
        let storage: Arc<dyn ClientStorage> = Arc::new(MemoryStorage::new());
        let other = Arc::clone(&storage);

        storage.set(SELECTED_COMPANY_KEY, "x").unwrap();
        assert_eq!(other.get(SELECTED_COMPANY_KEY).as_deref(), Some("x"));
    }
}
