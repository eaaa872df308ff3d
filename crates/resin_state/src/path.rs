//! Dot-path traversal over state trees
//!
//! Paths are dot-delimited segment lists (`"cart.items.0.name"`). A walk
//! descends only when the current node structurally owns the next segment:
//! a map key that is present, or an in-bounds index into a sequence. Any
//! miss ends the walk with `None` - never an error - so a path may point
//! into a value that a prior mutation removed. Lookups are read-only.

use serde_json::Value;
use smallvec::SmallVec;

/// Segment buffer for one split path.
pub(crate) type PathSegments<'a> = SmallVec<[&'a str; 8]>;

/// Split a dot-delimited path into segments.
///
/// Splitting never fails; an empty path yields one empty segment, which no
/// tree owns, so resolution of `""` is always `None`.
pub(crate) fn split_path(path: &str) -> PathSegments<'_> {
    path.split('.').collect()
}

/// Parse a segment as a canonical sequence index: digits only, no leading
/// zeros (except `"0"` itself), no sign. Anything else does not own a slot.
fn parse_index(segment: &str) -> Option<usize> {
    if segment.is_empty() || (segment.len() > 1 && segment.starts_with('0')) {
        return None;
    }
    if !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

/// Walk `segments` into `tree`, returning the referenced node.
pub fn resolve_in<'a>(tree: &'a Value, segments: &[&str]) -> Option<&'a Value> {
    let mut current = tree;
    for segment in segments {
        current = match current {
            Value::Object(map) => map.get(*segment)?,
            Value::Array(items) => items.get(parse_index(segment)?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Mutable variant of [`resolve_in`]; used by action scopes to edit in place.
pub(crate) fn resolve_in_mut<'a>(tree: &'a mut Value, segments: &[&str]) -> Option<&'a mut Value> {
    let mut current = tree;
    for segment in segments {
        current = match current {
            Value::Object(map) => map.get_mut(*segment)?,
            Value::Array(items) => items.get_mut(parse_index(segment)?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Write `value` at `segments`, creating missing map segments on the way.
///
/// Returns `false` without touching notification state when the write cannot
/// land: an out-of-bounds sequence index, or a scalar in an intermediate
/// position.
pub(crate) fn apply_write(tree: &mut Value, segments: &[&str], value: Value) -> bool {
    let Some((last, parents)) = segments.split_last() else {
        return false;
    };
    let mut current = tree;
    for segment in parents {
        current = match current {
            Value::Object(map) => map
                .entry((*segment).to_string())
                .or_insert_with(|| Value::Object(serde_json::Map::new())),
            Value::Array(items) => match parse_index(segment).and_then(|i| items.get_mut(i)) {
                Some(item) => item,
                None => return false,
            },
            _ => return false,
        };
    }
    match current {
        Value::Object(map) => {
            map.insert((*last).to_string(), value);
            true
        }
        Value::Array(items) => match parse_index(last) {
            Some(index) if index < items.len() => {
                items[index] = value;
                true
            }
            _ => false,
        },
        _ => false,
    }
}

/// Remove the node at `segments`, returning it.
pub(crate) fn apply_remove(tree: &mut Value, segments: &[&str]) -> Option<Value> {
    let (last, parents) = segments.split_last()?;
    let parent = resolve_in_mut(tree, parents)?;
    match parent {
        Value::Object(map) => map.remove(*last),
        Value::Array(items) => {
            let index = parse_index(last)?;
            if index < items.len() {
                Some(items.remove(index))
            } else {
                None
            }
        }
        _ => None,
    }
}
