//! Persistent key-value storage
//!
//! The synchronous, fallible store shared by the hydration wrapper and the
//! credential store. Values are JSON text; typed access goes through
//! [`load_json`] and [`save_json`].

use crate::error::{PersistenceError, StorageError};
use serde::{Serialize, de::DeserializeOwned};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use std::rc::Rc;

// =========================================================
// Abstract interface
// =========================================================

pub trait PersistentStore {
    /// `Ok(None)` when the key has never been written or was removed.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

impl<S: PersistentStore + ?Sized> PersistentStore for Rc<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

/// Reads and deserializes the JSON value stored under `key`.
pub fn load_json<T: DeserializeOwned>(
    store: &dyn PersistentStore,
    key: &str,
) -> Result<Option<T>, PersistenceError> {
    match store.get(key)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Serializes `value` and stores it under `key`.
pub fn save_json<T: Serialize + ?Sized>(
    store: &dyn PersistentStore,
    key: &str,
    value: &T,
) -> Result<(), PersistenceError> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)?;
    Ok(())
}

fn check_quota(key: &str, total: usize, limit: Option<usize>) -> Result<(), StorageError> {
    match limit {
        Some(limit) if total > limit => Err(StorageError::QuotaExceeded {
            key: key.to_string(),
            size: total,
            limit,
        }),
        _ => Ok(()),
    }
}

// =========================================================
// In-memory implementation
// =========================================================

/// In-memory store.
///
/// Clones share the same map, so dropping every component built on one
/// clone and rebuilding them on another behaves like a page reload.
#[derive(Clone, Default)]
pub struct MemoryStore {
    map: Rc<RefCell<HashMap<String, String>>>,
    quota: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limits the total bytes (keys plus values) the store may hold.
    pub fn with_quota(limit: usize) -> Self {
        Self {
            map: Rc::default(),
            quota: Some(limit),
        }
    }

    pub fn len(&self) -> usize {
        self.map.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.borrow().is_empty()
    }

    fn used_bytes_without(&self, key: &str) -> usize {
        self.map
            .borrow()
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl PersistentStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.map.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let total = self.used_bytes_without(key) + key.len() + value.len();
        check_quota(key, total, self.quota)?;
        self.map
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.map.borrow_mut().remove(key);
        Ok(())
    }
}

// =========================================================
// File-backed implementation
// =========================================================

/// One `<key>.json` file per key inside a directory.
pub struct FileStore {
    dir: PathBuf,
    quota: Option<usize>,
}

impl FileStore {
    /// Creates the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir, quota: None })
    }

    pub fn with_quota(mut self, limit: Option<usize>) -> Self {
        self.quota = limit;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
            && !key.starts_with('.');
        if !valid {
            return Err(StorageError::Unavailable(format!(
                "key '{}' is not a valid file name",
                key
            )));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }

    fn used_bytes_without(&self, skip: &Path) -> Result<usize, StorageError> {
        let mut total = 0;
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            if path == skip || path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            let key_len = path.file_stem().map_or(0, |stem| stem.len());
            total += key_len + entry.metadata()?.len() as usize;
        }
        Ok(total)
    }
}

impl PersistentStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == IoErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        if self.quota.is_some() {
            let total = self.used_bytes_without(&path)? + key.len() + value.len();
            check_quota(key, total, self.quota)?;
        }
        // Write then rename so a crash never leaves a half-written value.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == IoErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
