//! Get, set and remove inside a JSON tree by dotted path.
//!
//! Paths are walked segment by segment from the root value, the first
//! segment being the root key. Reads use safe navigation: any missing link
//! yields `None`. Writes create missing containers on the way down (objects
//! for plain keys, arrays for indexed bases) and pad arrays with `null` when
//! an index lies past the end, up to [`MAX_INDEX`]. Removing an indexed
//! element shifts the rest of the array left.

use crate::error::{KandoError, KandoResult};
use crate::path::{segments, Segment};
use serde_json::{Map, Value};

/// Largest array index a write may pad up to.
pub const MAX_INDEX: usize = 65_535;

/// Resolve `path` inside `root`.
pub fn get<'v>(root: &'v Value, path: &str) -> Option<&'v Value> {
    segments(path).try_fold(root, child)
}

/// Store `value` at `path`, creating intermediate containers as needed.
///
/// Existing values on the way that cannot hold the next segment (scalars, or
/// an array addressed by a non-numeric key) are replaced by a fresh container.
/// An index above [`MAX_INDEX`] past the end of an array is rejected; `root`
/// may then hold partially created containers and should be discarded.
pub fn set(root: &mut Value, path: &str, value: Value) -> KandoResult<()> {
    let parsed: Vec<Segment<'_>> = segments(path).collect();
    let Some((last, parents)) = parsed.split_last() else {
        return Ok(());
    };

    let mut cursor = root;
    for segment in parents {
        cursor = child_or_insert(cursor, *segment).ok_or_else(|| index_too_large(path))?;
    }
    *child_or_insert(cursor, *last).ok_or_else(|| index_too_large(path))? = value;
    Ok(())
}

fn index_too_large(path: &str) -> KandoError {
    KandoError::invalid_path(path, "array index exceeds the maximum")
}

/// Remove the value at `path`, returning it.
///
/// Missing branches are a no-op. An indexed last segment splices the element
/// out; a plain numeric key on an array leaves a `null` in its place.
pub fn remove(root: &mut Value, path: &str) -> Option<Value> {
    let parsed: Vec<Segment<'_>> = segments(path).collect();
    let (last, parents) = parsed.split_last()?;

    let mut cursor = root;
    for segment in parents {
        cursor = child_mut(cursor, *segment)?;
    }

    match *last {
        Segment::Key(key) => remove_key(cursor, key),
        Segment::Indexed { base, index } => match lookup_mut(cursor, base)? {
            Value::Array(items) if index < items.len() => Some(items.remove(index)),
            Value::Object(map) => map.remove(&index.to_string()),
            _ => None,
        },
    }
}

fn child<'v>(parent: &'v Value, segment: Segment<'_>) -> Option<&'v Value> {
    match segment {
        Segment::Key(key) => lookup(parent, key),
        Segment::Indexed { base, index } => lookup_index(lookup(parent, base)?, index),
    }
}

fn lookup<'v>(parent: &'v Value, key: &str) -> Option<&'v Value> {
    match parent {
        Value::Object(map) => map.get(key),
        Value::Array(items) => items.get(key.parse::<usize>().ok()?),
        _ => None,
    }
}

fn lookup_index(container: &Value, index: usize) -> Option<&Value> {
    match container {
        Value::Array(items) => items.get(index),
        Value::Object(map) => map.get(&index.to_string()),
        _ => None,
    }
}

fn child_mut<'v>(parent: &'v mut Value, segment: Segment<'_>) -> Option<&'v mut Value> {
    match segment {
        Segment::Key(key) => lookup_mut(parent, key),
        Segment::Indexed { base, index } => match lookup_mut(parent, base)? {
            Value::Array(items) => items.get_mut(index),
            Value::Object(map) => map.get_mut(&index.to_string()),
            _ => None,
        },
    }
}

fn lookup_mut<'v>(parent: &'v mut Value, key: &str) -> Option<&'v mut Value> {
    match parent {
        Value::Object(map) => map.get_mut(key),
        Value::Array(items) => items.get_mut(key.parse::<usize>().ok()?),
        _ => None,
    }
}

fn remove_key(parent: &mut Value, key: &str) -> Option<Value> {
    match parent {
        Value::Object(map) => map.remove(key),
        Value::Array(items) => {
            let slot = items.get_mut(key.parse::<usize>().ok()?)?;
            Some(std::mem::take(slot))
        }
        _ => None,
    }
}

fn child_or_insert<'v>(parent: &'v mut Value, segment: Segment<'_>) -> Option<&'v mut Value> {
    match segment {
        Segment::Key(key) => key_or_insert(parent, key),
        Segment::Indexed { base, index } => {
            let container = key_or_insert(parent, base)?;
            if container.is_object() {
                return key_or_insert(container, &index.to_string());
            }
            element_or_insert(array_mut(container), index)
        }
    }
}

fn key_or_insert<'v>(parent: &'v mut Value, key: &str) -> Option<&'v mut Value> {
    let index = if parent.is_array() {
        key.parse::<usize>().ok()
    } else {
        None
    };

    if let Some(index) = index {
        return element_or_insert(array_mut(parent), index);
    }
    Some(
        object_mut(parent)
            .entry(key.to_string())
            .or_insert(Value::Null),
    )
}

fn element_or_insert(items: &mut Vec<Value>, index: usize) -> Option<&mut Value> {
    if items.len() <= index {
        if index > MAX_INDEX {
            return None;
        }
        items.resize(index.checked_add(1)?, Value::Null);
    }
    items.get_mut(index)
}

fn object_mut(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!("non-object values are replaced above"),
    }
}

fn array_mut(value: &mut Value) -> &mut Vec<Value> {
    if !value.is_array() {
        *value = Value::Array(Vec::new());
    }
    match value {
        Value::Array(items) => items,
        _ => unreachable!("non-array values are replaced above"),
    }
}
