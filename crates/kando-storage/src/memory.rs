//! In-memory medium.
//!
//! Serves as the fallback whenever a named medium is unavailable, and as the
//! test double for `local`/`session`.

use crate::{Medium, StorageError, StorageResult};
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock, RwLock};

static SHARED: OnceLock<Arc<MemoryMedium>> = OnceLock::new();

/// In-memory medium.
///
/// Keys enumerate in sorted order. An optional quota caps the total size of
/// stored keys and values in bytes.
pub struct MemoryMedium {
    data: RwLock<BTreeMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryMedium {
    /// Create an empty, unbounded medium.
    pub fn new() -> Self {
        Self {
            data: RwLock::new(BTreeMap::new()),
            quota: None,
        }
    }

    /// Create an empty medium that refuses writes beyond `bytes`.
    ///
    /// A quota of zero behaves like disabled browser storage.
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            data: RwLock::new(BTreeMap::new()),
            quota: Some(bytes),
        }
    }

    /// The process-wide fallback medium.
    ///
    /// Created on first use and kept for the life of the process.
    pub fn shared() -> Arc<MemoryMedium> {
        SHARED.get_or_init(|| Arc::new(MemoryMedium::new())).clone()
    }

    fn entry_size(key: &str, value: &str) -> usize {
        key.len() + value.len()
    }

    fn read(&self) -> StorageResult<std::sync::RwLockReadGuard<'_, BTreeMap<String, String>>> {
        self.data
            .read()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))
    }

    fn write(&self) -> StorageResult<std::sync::RwLockWriteGuard<'_, BTreeMap<String, String>>> {
        self.data
            .write()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))
    }
}

impl Default for MemoryMedium {
    fn default() -> Self {
        Self::new()
    }
}

impl Medium for MemoryMedium {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.read()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut data = self.write()?;

        if let Some(limit) = self.quota {
            let used: usize = data
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| Self::entry_size(k, v))
                .sum();
            if used + Self::entry_size(key, value) > limit {
                return Err(StorageError::quota_exceeded(key, limit));
            }
        }

        data.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        self.write()?.remove(key);
        Ok(())
    }

    fn clear(&self) -> StorageResult<()> {
        self.write()?.clear();
        Ok(())
    }

    fn key(&self, index: usize) -> StorageResult<Option<String>> {
        Ok(self.read()?.keys().nth(index).cloned())
    }

    fn len(&self) -> StorageResult<usize> {
        Ok(self.read()?.len())
    }
}
