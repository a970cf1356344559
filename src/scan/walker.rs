//! Template discovery for directory mode.

use crate::utils::{clean_path, normalize_path};
use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A template found under the walk root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateFile {
    pub path: PathBuf,
    /// Forward-slash path relative to the walk root.
    pub relative_path: String,
}

/// Walks a directory for template files in deterministic order.
pub struct TemplateWalker {
    root_path: PathBuf,
    exclude_globs: Vec<String>,
    skip_dirs: Vec<PathBuf>,
}

impl TemplateWalker {
    pub fn new(root_path: PathBuf) -> Self {
        Self { root_path, exclude_globs: Vec::new(), skip_dirs: Vec::new() }
    }

    /// Set glob patterns (matched against the relative path) to exclude
    pub fn exclude_globs(mut self, globs: Vec<String>) -> Self {
        self.exclude_globs = globs;
        self
    }

    /// Never descend into `dir`, e.g. an output directory nested in the input.
    pub fn skip_dir(mut self, dir: PathBuf) -> Self {
        self.skip_dirs.push(dir);
        self
    }

    fn build_exclude_globset(&self) -> Result<GlobSet> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.exclude_globs {
            builder.add(
                Glob::new(pattern).with_context(|| format!("invalid exclude glob '{pattern}'"))?,
            );
        }
        Ok(builder.build()?)
    }

    /// Every regular file under the root, sorted by file name at each level.
    pub fn walk(&self) -> Result<Vec<TemplateFile>> {
        let excludes = self.build_exclude_globset()?;
        let mut files = Vec::new();

        // Skipped directories are compared as cleaned absolute paths, so `out`,
        // `./out` and `/abs/out` all name the same directory.
        let cwd = std::env::current_dir().context("failed to read current directory")?;
        let skip: Vec<PathBuf> = self.skip_dirs.iter().map(|dir| absolute(&cwd, dir)).collect();

        let walker = WalkDir::new(&self.root_path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                !entry.file_type().is_dir() || !skip.contains(&absolute(&cwd, entry.path()))
            });

        for entry in walker {
            let entry = entry
                .with_context(|| format!("failed to walk {}", self.root_path.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let Ok(rel) = path.strip_prefix(&self.root_path) else {
                continue;
            };
            let relative_path = normalize_path(&rel.to_string_lossy());

            if excludes.is_match(&relative_path) {
                tracing::debug!(path = %relative_path, "excluded by glob");
                continue;
            }
            files.push(TemplateFile { path: path.to_path_buf(), relative_path });
        }

        tracing::debug!(root = %self.root_path.display(), count = files.len(), "walked templates");
        Ok(files)
    }
}

fn absolute(cwd: &Path, path: &Path) -> PathBuf {
    clean_path(&cwd.join(path))
}
