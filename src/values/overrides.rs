//! `--set path.to.key=value` overrides.
//!
//! Each pair becomes a nested mapping. Later pairs addressing the same path win,
//! and an intermediate segment that holds a scalar is replaced by a mapping.

use super::ValueTree;
use crate::error::{Result, TemplaterError};
use serde_json::{Map, Number, Value};

/// Parse `--set` pairs, coercing each right-hand side with [`coerce_scalar`].
pub fn parse_overrides<S: AsRef<str>>(pairs: &[S]) -> Result<ValueTree> {
    let mut tree = ValueTree::new();
    apply_overrides(&mut tree, pairs, coerce_scalar)?;
    Ok(tree)
}

/// Parse `--set-string` pairs. Values are kept verbatim as strings.
pub fn parse_string_overrides<S: AsRef<str>>(pairs: &[S]) -> Result<ValueTree> {
    let mut tree = ValueTree::new();
    apply_overrides(&mut tree, pairs, keep_string)?;
    Ok(tree)
}

/// Apply pairs in order on top of an existing override tree.
pub fn apply_overrides<S, F>(tree: &mut ValueTree, pairs: &[S], convert: F) -> Result<()>
where
    S: AsRef<str>,
    F: Fn(&str) -> Value,
{
    for pair in pairs {
        let pair = pair.as_ref();
        let (path, raw) = split_pair(pair)?;
        let segments: Vec<&str> = path.split('.').collect();
        insert_path(tree, &segments, convert(raw));
    }
    Ok(())
}

/// Coerce an override value: booleans, then null, then integers, then floats,
/// falling back to the raw string.
pub fn coerce_scalar(raw: &str) -> Value {
    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        "null" | "nil" => Value::Null,
        _ => {
            if let Ok(int) = raw.parse::<i64>() {
                return Value::from(int);
            }
            match raw.parse::<f64>().ok().and_then(Number::from_f64) {
                Some(float) => Value::Number(float),
                None => Value::String(raw.to_string()),
            }
        }
    }
}

/// `--set-string` conversion: the raw text, untouched.
pub fn keep_string(raw: &str) -> Value {
    Value::String(raw.to_string())
}

fn split_pair(pair: &str) -> Result<(&str, &str)> {
    let invalid = |reason: &str| TemplaterError::InvalidOverride {
        pair: pair.to_string(),
        reason: reason.to_string(),
    };

    let (path, raw) = pair.split_once('=').ok_or_else(|| invalid("expected key=value"))?;
    if path.is_empty() {
        return Err(invalid("key is empty"));
    }
    if path.split('.').any(str::is_empty) {
        return Err(invalid("key contains an empty path segment"));
    }
    Ok((path, raw))
}

fn insert_path(node: &mut ValueTree, segments: &[&str], value: Value) {
    match segments {
        [] => {}
        [last] => {
            node.insert(last.to_string(), value);
        }
        [head, rest @ ..] => {
            let slot = node.entry(head.to_string()).or_insert_with(|| Value::Object(Map::new()));
            match slot {
                Value::Object(child) => insert_path(child, rest, value),
                other => {
                    let mut child = Map::new();
                    insert_path(&mut child, rest, value);
                    *other = Value::Object(child);
                }
            }
        }
    }
}
