//! Value resolution
//!
//! Loads YAML value sources, parses `--set` overrides and coalesces everything into
//! one tree (highest priority wins, mappings merge recursively, `__replace: true`
//! blocks merging of a subtree).

pub mod merge;
pub mod overrides;
pub mod resolve;
pub mod source;

pub use merge::{coalesce, prune_replaced, strip_replace_markers};
pub use overrides::{
    apply_overrides, coerce_scalar, keep_string, parse_overrides, parse_string_overrides,
};
pub use resolve::{resolve_values, wrap_values};
pub use source::{load_sources, ValueSource};

/// A resolved (or partially resolved) configuration tree.
pub type ValueTree = serde_json::Map<String, serde_json::Value>;
