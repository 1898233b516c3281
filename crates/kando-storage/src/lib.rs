//! Storage mediums for kando.
//!
//! A medium is a flat string-to-string store with the same surface as the
//! browser `localStorage`/`sessionStorage` objects. This crate provides:
//! - The [`Medium`] trait
//! - In-memory medium (fallback and tests)
//! - JSON file medium (persistent, used by the CLI)

pub mod error;
pub mod file;
pub mod memory;

pub use error::{StorageError, StorageResult};
pub use file::FileMedium;
pub use memory::MemoryMedium;

use tracing::debug;

/// Sentinel key written and removed by [`probe`].
pub const DEFAULT_PROBE_KEY: &str = "__storage_test__";

/// A flat key-value storage medium.
///
/// Keys and values are plain strings. Enumeration is by index over
/// `0..len()`; the order is stable as long as the medium is not mutated.
pub trait Medium: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// Returns `None` if the key doesn't exist.
    fn get_item(&self, key: &str) -> StorageResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set_item(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove `key`. Removing a missing key is not an error.
    fn remove_item(&self, key: &str) -> StorageResult<()>;

    /// Remove every key.
    fn clear(&self) -> StorageResult<()>;

    /// Name of the key at position `index`, if any.
    fn key(&self, index: usize) -> StorageResult<Option<String>>;

    /// Number of stored keys.
    fn len(&self) -> StorageResult<usize>;

    fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Snapshot of every key currently stored.
    fn keys(&self) -> StorageResult<Vec<String>> {
        let mut keys = Vec::new();
        for index in 0..self.len()? {
            if let Some(key) = self.key(index)? {
                keys.push(key);
            }
        }
        Ok(keys)
    }
}

/// Check whether a medium accepts writes.
///
/// Writes `probe_key` and removes it again. Any failure (quota, disabled
/// storage, IO) means the medium is unusable; it is logged, never returned.
pub fn probe(medium: &dyn Medium, probe_key: &str) -> bool {
    match medium
        .set_item(probe_key, probe_key)
        .and_then(|()| medium.remove_item(probe_key))
    {
        Ok(()) => true,
        Err(e) => {
            debug!(error = %e, "Medium failed availability probe");
            false
        }
    }
}
