//! Key/value persistence for the two JSON blobs (achievements, quest progress).
//!
//! Storage is non-critical: reads that fail or return garbage yield the
//! default value, writes that fail are logged and dropped.

use std::collections::HashMap;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{EggError, Result};

/// Minimal string key/value backend. `window.localStorage` in the browser,
/// a map in tests.
pub trait KvBackend {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryBackend {
    entries: HashMap<String, String>,
    /// Simulates a full or disabled storage: every write fails.
    pub reject_writes: bool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, key: &str, value: &str) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    pub fn raw(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

impl KvBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        if self.reject_writes {
            return Err(EggError::Storage(format!("write to '{key}' rejected")));
        }
        self.entries.insert(key.into(), value.into());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if self.reject_writes {
            return Err(EggError::Storage(format!("remove of '{key}' rejected")));
        }
        self.entries.remove(key);
        Ok(())
    }
}

/// `window.localStorage`. Holds `None` when the browser refuses access
/// (privacy mode, sandboxed iframe), in which case everything degrades.
pub struct LocalStorageBackend {
    storage: Option<web_sys::Storage>,
}

impl LocalStorageBackend {
    pub fn open() -> Self {
        let storage = web_sys::window().and_then(|w| w.local_storage().ok().flatten());
        if storage.is_none() {
            log::warn!("localStorage unavailable; achievements will not persist");
        }
        Self { storage }
    }

    fn storage(&self) -> Result<&web_sys::Storage> {
        self.storage.as_ref().ok_or(EggError::StorageUnavailable)
    }
}

impl KvBackend for LocalStorageBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.storage()?.get_item(key).map_err(EggError::storage)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.storage()?.set_item(key, value).map_err(EggError::storage)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.storage()?.remove_item(key).map_err(EggError::storage)
    }
}

pub struct Store<B: KvBackend> {
    backend: B,
}

impl<B: KvBackend> Store<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Reads and decodes `key`, or `None` when absent or unreadable.
    pub fn try_load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.backend.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                log::warn!("reading '{key}' failed: {e}");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("ignoring malformed '{key}': {e}");
                None
            }
        }
    }

    pub fn load<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        self.try_load(key).unwrap_or_default()
    }

    /// Returns whether the value actually reached the backend.
    pub fn save<T: Serialize>(&mut self, key: &str, value: &T) -> bool {
        let encoded = match serde_json::to_string(value) {
            Ok(s) => s,
            Err(e) => {
                log::warn!("encoding '{key}' failed: {e}");
                return false;
            }
        };
        match self.backend.set(key, &encoded) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("saving '{key}' failed: {e}");
                false
            }
        }
    }

    pub fn clear(&mut self, key: &str) {
        if let Err(e) = self.backend.remove(key) {
            log::warn!("clearing '{key}' failed: {e}");
        }
    }
}
