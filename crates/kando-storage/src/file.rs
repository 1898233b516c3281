//! JSON file-backed medium.
//!
//! The whole medium is one JSON object file mapping keys to string values:
//! `{"user": "{\"user\":{...}}", "ns.key.expires": "1700000000000"}`.
//! The file is the source of truth; it is re-read on every call and rewritten
//! atomically, so several processes can share it between calls.

use crate::{Medium, StorageError, StorageResult};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

type Entries = BTreeMap<String, String>;

/// JSON file-backed medium.
pub struct FileMedium {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl FileMedium {
    /// Create a medium stored at `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> StorageResult<Entries> {
        match fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(Entries::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Entries::new()),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    fn save(&self, entries: &Entries) -> StorageResult<()> {
        debug!(path = %self.path.display(), keys = entries.len(), "Writing medium file");

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(entries)?;

        // Write atomically (write to temp file, then rename)
        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, &content)?;
        fs::rename(&temp_path, &self.path)?;

        Ok(())
    }

    fn modify<F>(&self, edit: F) -> StorageResult<()>
    where
        F: FnOnce(&mut Entries) -> bool,
    {
        let _guard = self
            .lock
            .lock()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))?;

        let mut entries = self.load()?;
        if edit(&mut entries) {
            self.save(&entries)?;
        }
        Ok(())
    }
}

impl Medium for FileMedium {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.load()?.remove(key))
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        self.modify(|entries| {
            entries.insert(key.to_string(), value.to_string());
            true
        })
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        self.modify(|entries| entries.remove(key).is_some())
    }

    fn clear(&self) -> StorageResult<()> {
        self.modify(|entries| {
            let changed = !entries.is_empty();
            entries.clear();
            changed
        })
    }

    fn key(&self, index: usize) -> StorageResult<Option<String>> {
        Ok(self.load()?.into_keys().nth(index))
    }

    fn len(&self) -> StorageResult<usize> {
        Ok(self.load()?.len())
    }
}
