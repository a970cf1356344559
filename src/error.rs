//! Error types for value resolution and template rendering.
//!
//! Every variant names the resource that caused it: a value source, an override
//! pair, a template (path or `<stdin>`), or an output path.

use std::path::PathBuf;
use thiserror::Error;

/// Library-level error. The CLI wraps these in `anyhow` with extra context.
#[derive(Debug, Error)]
pub enum TemplaterError {
    /// A value file or template file could not be read.
    #[error("failed to read {}", path.display())]
    SourceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A value source is not valid YAML.
    #[error("invalid YAML in values source {name}")]
    YamlParse {
        name: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// A template failed to compile.
    #[error("failed to parse template {name}")]
    TemplateParse {
        name: String,
        #[source]
        source: minijinja::Error,
    },

    /// A `--set` style override is malformed.
    #[error("invalid override '{pair}': {reason}")]
    InvalidOverride { pair: String, reason: String },

    /// A value source parsed but cannot be represented as a value tree.
    #[error("cannot merge values source {name}: {reason}")]
    Merge { name: String, reason: String },

    /// A template compiled but failed while rendering.
    #[error("failed to render template {name}")]
    Execution {
        name: String,
        #[source]
        source: minijinja::Error,
    },

    /// Rendered output could not be written.
    #[error("failed to write output {}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T, E = TemplaterError> = std::result::Result<T, E>;
