//! Coalescing merge with `__replace` subtree suppression.
//!
//! `dst` always holds the higher-priority tree and `src` the next lower-priority
//! source. A merge step is `prune_replaced(&dst, &mut src)` followed by
//! `coalesce(&mut dst, src)`; once every source is folded in, the markers are
//! removed with `strip_replace_markers`.

use super::ValueTree;
use crate::domain::REPLACE_MARKER;
use serde_json::map::Entry;
use serde_json::Value;

/// True when the mapping carries `__replace: true`. Any other marker value is ignored.
pub fn is_replace_marked(node: &ValueTree) -> bool {
    matches!(node.get(REPLACE_MARKER), Some(Value::Bool(true)))
}

/// Remove from `src` every subtree that a replace-marked mapping in `dst` owns.
///
/// Unmarked mappings present on both sides are walked recursively so that a marker
/// deep inside `dst` still takes effect.
pub fn prune_replaced(dst: &ValueTree, src: &mut ValueTree) {
    prune_at(dst, src, "");
}

fn prune_at(dst: &ValueTree, src: &mut ValueTree, prefix: &str) {
    for (key, dst_value) in dst {
        let Value::Object(dst_child) = dst_value else {
            continue;
        };
        if is_replace_marked(dst_child) {
            if src.remove(key).is_some() {
                tracing::debug!(
                    key = %full_key(prefix, key),
                    "replaced subtree, lower-priority values dropped"
                );
            }
        } else if let Some(Value::Object(src_child)) = src.get_mut(key) {
            prune_at(dst_child, src_child, &full_key(prefix, key));
        }
    }
}

/// Fold `src` into `dst`. `dst` wins every collision except mapping-vs-mapping,
/// which recurses. Sequences are never concatenated.
pub fn coalesce(dst: &mut ValueTree, src: ValueTree) {
    coalesce_at(dst, src, "");
}

fn coalesce_at(dst: &mut ValueTree, src: ValueTree, prefix: &str) {
    for (key, src_value) in src {
        let path = full_key(prefix, &key);
        match dst.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(src_value);
            }
            Entry::Occupied(mut slot) => match (slot.get_mut(), src_value) {
                (Value::Object(dst_child), Value::Object(src_child)) => {
                    coalesce_at(dst_child, src_child, &path);
                }
                (Value::Object(_), Value::Null) => {}
                (Value::Object(_), ignored) => {
                    tracing::warn!(
                        "destination for {} is a table; ignoring non-table value ({})",
                        path,
                        ignored
                    );
                }
                (dst_value, Value::Object(_)) if !dst_value.is_null() => {
                    tracing::warn!(
                        "cannot overwrite table with non-table for {} ({})",
                        path,
                        dst_value
                    );
                }
                _ => {}
            },
        }
    }
}

/// Delete the `__replace` key at every depth, including mappings inside sequences.
pub fn strip_replace_markers(tree: &mut ValueTree) {
    tree.remove(REPLACE_MARKER);
    for value in tree.values_mut() {
        strip_value(value);
    }
}

fn strip_value(value: &mut Value) {
    match value {
        Value::Object(map) => strip_replace_markers(map),
        Value::Array(items) => items.iter_mut().for_each(strip_value),
        _ => {}
    }
}

fn full_key(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}
