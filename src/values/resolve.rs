//! Fold value sources and overrides into the final tree.

use super::merge::{coalesce, prune_replaced, strip_replace_markers};
use super::{ValueSource, ValueTree};
use crate::domain::VALUES_KEY;
use crate::error::Result;
use serde_json::Value;

/// Resolve the final value tree.
///
/// `sources` are ordered lowest to highest priority; `overrides` outrank all of
/// them. Folding starts from the overrides and walks the sources in reverse, so
/// each step merges a lower-priority source under everything already resolved.
pub fn resolve_values(sources: &[ValueSource], overrides: ValueTree) -> Result<ValueTree> {
    let mut merged = overrides;

    for source in sources.iter().rev() {
        let mut tree = source.parse()?;
        tracing::debug!(source = %source.name, keys = tree.len(), "merging values source");
        prune_replaced(&merged, &mut tree);
        coalesce(&mut merged, tree);
    }

    strip_replace_markers(&mut merged);
    Ok(merged)
}

/// Wrap the resolved tree as template data: `{"Values": tree}`.
pub fn wrap_values(tree: ValueTree) -> Value {
    let mut root = ValueTree::new();
    root.insert(VALUES_KEY.to_string(), Value::Object(tree));
    Value::Object(root)
}
