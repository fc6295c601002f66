//! Key-value storage backends.
//!
//! The persistence manager writes through the [`StorageBackend`] trait, so
//! the same lifecycle logic runs against memory, files, or any host store.
//!
//! ## Backends
//!
//! - [`InMemoryStorage`] - A map behind a lock, with an optional byte quota
//! - [`FileStorage`] - One JSON file per key under a directory
//!
//! A [`StorageSession`] pairs the session-scoped store with the durable one.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use formcraft_core::{FormcraftError, Settings};

/// A synchronous string key-value store.
///
/// Writes complete before the call returns.
pub trait StorageBackend: Send + Sync {
    /// Reads the entry under `key`.
    fn get(&self, key: &str) -> Result<Option<String>, FormcraftError>;

    /// Writes (or replaces) the entry under `key`.
    fn set(&self, key: &str, value: &str) -> Result<(), FormcraftError>;

    /// Removes the entry under `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), FormcraftError>;

    /// Checks whether an entry exists under `key`.
    fn contains(&self, key: &str) -> Result<bool, FormcraftError> {
        Ok(self.get(key)?.is_some())
    }
}

fn poisoned() -> FormcraftError {
    FormcraftError::Storage("storage lock poisoned".to_string())
}

/// An in-memory store, suitable for session-scoped data and tests.
///
/// With a quota set, a write that would make the total size of keys and
/// values exceed the quota fails with a storage error and leaves the store
/// unchanged.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    entries: RwLock<HashMap<String, String>>,
    quota: Option<usize>,
}

impl InMemoryStorage {
    /// Creates an empty store without a quota.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store that holds at most `bytes` of keys and values.
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            quota: Some(bytes),
        }
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.read().map_or(0, |e| e.len())
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StorageBackend for InMemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, FormcraftError> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), FormcraftError> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        if let Some(quota) = self.quota {
            let others: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = others + key.len() + value.len();
            if needed > quota {
                return Err(FormcraftError::Storage(format!(
                    "quota exceeded: {needed} bytes needed, {quota} allowed"
                )));
            }
        }
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), FormcraftError> {
        self.entries.write().map_err(|_| poisoned())?.remove(key);
        Ok(())
    }
}

/// A file-based store that keeps each entry in `{dir}/{key}.json`.
///
/// The directory is created on first write. Characters outside
/// `[A-Za-z0-9_-]` in keys are replaced with `_` in file names.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Creates a store rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The storage directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{file}.json"))
    }
}

impl StorageBackend for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, FormcraftError> {
        let path = self.entry_path(key);
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(FormcraftError::Storage(format!(
                "Failed to read '{}': {e}",
                path.display()
            ))),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), FormcraftError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            FormcraftError::Storage(format!(
                "Failed to create storage directory '{}': {e}",
                self.dir.display()
            ))
        })?;
        let path = self.entry_path(key);
        std::fs::write(&path, value.as_bytes()).map_err(|e| {
            FormcraftError::Storage(format!("Failed to write '{}': {e}", path.display()))
        })
    }

    fn remove(&self, key: &str) -> Result<(), FormcraftError> {
        let path = self.entry_path(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(FormcraftError::Storage(format!(
                "Failed to remove '{}': {e}",
                path.display()
            ))),
        }
    }

    fn contains(&self, key: &str) -> Result<bool, FormcraftError> {
        Ok(self.entry_path(key).is_file())
    }
}

/// The pair of stores a persistence manager writes to.
///
/// `session` holds values of `session`-mode fields; `durable` holds the
/// expiring entries of `permanent`-mode fields.
#[derive(Clone)]
pub struct StorageSession {
    /// Store that lives as long as the user session.
    pub session: Arc<dyn StorageBackend>,
    /// Store that survives across sessions.
    pub durable: Arc<dyn StorageBackend>,
}

impl StorageSession {
    /// Pairs two stores.
    pub fn new(session: Arc<dyn StorageBackend>, durable: Arc<dyn StorageBackend>) -> Self {
        Self { session, durable }
    }

    /// Two fresh in-memory stores.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryStorage::new()), Arc::new(InMemoryStorage::new()))
    }

    /// File stores under the configured storage directory.
    ///
    /// Durable entries live in `{data_dir}/{storage_dir}`, session entries in
    /// its `session` subdirectory. A command-line process has no session end,
    /// so session entries last until cleared.
    pub fn from_settings(settings: &Settings) -> Self {
        let root = settings.storage_path();
        Self::new(
            Arc::new(FileStorage::new(root.join("session"))),
            Arc::new(FileStorage::new(root)),
        )
    }
}

impl std::fmt::Debug for StorageSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageSession").finish_non_exhaustive()
    }
}
