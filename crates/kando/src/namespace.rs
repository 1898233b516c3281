//! Loading, persisting and collapsing namespace roots.
//!
//! A namespace root is the JSON document stored in a medium under the root
//! key. It is read fully for every operation, changed in memory and then
//! either rewritten whole or removed; nothing is cached between calls.

use crate::error::KandoResult;
use crate::path::root_key;
use crate::tree;
use kando_storage::Medium;
use serde_json::{Map, Value};
use tracing::debug;

/// Parse the root stored under `root_key`, or an empty object if absent.
///
/// Corrupt JSON is returned as an error for this call.
pub fn load_root(medium: &dyn Medium, root_key: &str) -> KandoResult<Value> {
    match medium.get_item(root_key)? {
        Some(raw) if !raw.is_empty() => Ok(serde_json::from_str(&raw)?),
        _ => Ok(Value::Object(Map::new())),
    }
}

/// Serialize `root` back under `root_key`.
pub fn persist(medium: &dyn Medium, root_key: &str, root: &Value) -> KandoResult<()> {
    let raw = serde_json::to_string(root)?;
    medium.set_item(root_key, &raw)?;
    Ok(())
}

/// Whether `root` holds nothing worth keeping.
///
/// True for `{}` and for a root whose only entry is its own namespace key
/// holding an empty object, empty array or `null`.
pub fn is_empty_namespace(root: &Value, root_key: &str) -> bool {
    match root {
        Value::Object(map) => map
            .iter()
            .all(|(key, value)| key == root_key && is_empty_container(value)),
        _ => false,
    }
}

fn is_empty_container(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Remove the value at `path` from its namespace.
///
/// A path naming the root key removes the whole medium entry. Otherwise the
/// root is rewritten, or removed entirely when nothing is left in it.
/// Returns whether anything was removed.
pub fn remove_path(medium: &dyn Medium, path: &str) -> KandoResult<bool> {
    let root_key = root_key(path);

    if path == root_key {
        let existed = medium.get_item(root_key)?.is_some();
        medium.remove_item(root_key)?;
        debug!(root_key, existed, "Removed namespace");
        return Ok(existed);
    }

    let mut root = load_root(medium, root_key)?;
    let removed = tree::remove(&mut root, path).is_some();

    if is_empty_namespace(&root, root_key) {
        debug!(root_key, "Namespace empty, removing root entry");
        medium.remove_item(root_key)?;
    } else if removed {
        persist(medium, root_key, &root)?;
    }

    Ok(removed)
}
