//! CLI > config precedence.

use crate::domain::{Config, ErrorPolicy};

/// Settings given on the command line; `None` keeps the loaded value.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub strict: Option<bool>,
    pub max_include_depth: Option<usize>,
    pub jobs: Option<usize>,
    pub error_policy: Option<ErrorPolicy>,
    /// Replaces the configured exclude list when present.
    pub exclude: Option<Vec<String>>,
}

pub fn merge_cli_with_config(mut config: Config, cli: CliOverrides) -> Config {
    if let Some(strict) = cli.strict {
        config.strict = strict;
    }
    if let Some(depth) = cli.max_include_depth {
        config.max_include_depth = depth;
    }
    if cli.jobs.is_some() {
        config.jobs = cli.jobs;
    }
    if let Some(policy) = cli.error_policy {
        config.error_policy = policy;
    }
    if let Some(exclude) = cli.exclude {
        config.exclude = exclude;
    }
    config
}
