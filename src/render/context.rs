//! Evaluator context threaded into every template compile.
//!
//! A context is immutable. `include` derives a child context rebased on the
//! included file's directory; `tpl` derives one with the same base. Both bump the
//! nesting depth, which is checked against `max_include_depth`.

use crate::domain::{Config, DEFAULT_MAX_INCLUDE_DEPTH};
use crate::utils::clean_path;
use minijinja::{Error, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Engine settings shared by a root template and everything it includes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Undefined references fail instead of rendering empty.
    pub strict: bool,
    pub max_include_depth: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { strict: false, max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH }
    }
}

impl From<&Config> for RenderOptions {
    fn from(config: &Config) -> Self {
        Self { strict: config.strict, max_include_depth: config.max_include_depth }
    }
}

#[derive(Debug, Clone)]
pub struct EvalContext {
    base_dir: PathBuf,
    depth: usize,
    options: Arc<RenderOptions>,
}

impl EvalContext {
    /// Root context resolving relative includes against `base_dir`.
    pub fn new(base_dir: impl Into<PathBuf>, options: RenderOptions) -> Self {
        Self { base_dir: base_dir.into(), depth: 0, options: Arc::new(options) }
    }

    /// Root context for a template file: its base is the file's absolute directory.
    pub fn for_file(path: &Path, options: RenderOptions) -> std::io::Result<Self> {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()?.join(path)
        };
        let base_dir = clean_path(&absolute).parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(Self::new(base_dir, options))
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Absolute paths are kept; relative ones are joined to this context's base.
    pub fn resolve(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            clean_path(path)
        } else {
            clean_path(&self.base_dir.join(path))
        }
    }

    /// Child context for a nested evaluation with the same base directory.
    pub fn nested(&self, entering: &str) -> Result<Self, Error> {
        let depth = self.depth + 1;
        if depth > self.options.max_include_depth {
            return Err(Error::new(
                ErrorKind::InvalidOperation,
                format!(
                    "include depth limit of {} exceeded while entering {}",
                    self.options.max_include_depth, entering
                ),
            ));
        }
        Ok(Self { base_dir: self.base_dir.clone(), depth, options: Arc::clone(&self.options) })
    }

    /// Child context for an included file, rebased onto that file's directory.
    pub fn for_include(&self, resolved: &Path) -> Result<Self, Error> {
        let mut child = self.nested(&resolved.display().to_string())?;
        if let Some(dir) = resolved.parent() {
            child.base_dir = dir.to_path_buf();
        }
        Ok(child)
    }
}
