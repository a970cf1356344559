//! Shared domain types: runtime configuration and reserved names.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Key under which the resolved tree is exposed to templates (`Values.foo.bar`).
pub const VALUES_KEY: &str = "Values";

/// Mapping key that suppresses deep-merge of its subtree with lower-priority sources.
pub const REPLACE_MARKER: &str = "__replace";

/// Template name used when the root template comes from standard input.
pub const STDIN_NAME: &str = "<stdin>";

pub const DEFAULT_MAX_INCLUDE_DEPTH: usize = 64;

/// What to do when one file of a directory batch fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorPolicy {
    /// Stop at the first failing file.
    #[default]
    FailFast,
    /// Render every file, then report all failures.
    Collect,
}

impl fmt::Display for ErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorPolicy::FailFast => write!(f, "fail-fast"),
            ErrorPolicy::Collect => write!(f, "collect"),
        }
    }
}

/// Settings loaded from config file and environment, then overridden by CLI flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Undefined template references are errors instead of empty output.
    pub strict: bool,
    pub max_include_depth: usize,
    /// Worker threads for directory mode; `None` lets rayon decide.
    pub jobs: Option<usize>,
    pub error_policy: ErrorPolicy,
    /// Globs (relative to the input directory) skipped in directory mode.
    pub exclude: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            strict: false,
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
            jobs: None,
            error_policy: ErrorPolicy::FailFast,
            exclude: Vec::new(),
        }
    }
}
