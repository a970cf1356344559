//! Directory-mode template discovery

use crate::render::RenderJob;
use anyhow::Result;
use std::path::Path;

pub mod walker;

pub use walker::{TemplateFile, TemplateWalker};

/// Walk `root` and pair every template with its target: `output_dir/<relative path>`,
/// or stdout when there is no output directory.
pub fn plan_jobs(
    root: &Path,
    output_dir: Option<&Path>,
    exclude: &[String],
) -> Result<Vec<RenderJob>> {
    let mut walker = TemplateWalker::new(root.to_path_buf()).exclude_globs(exclude.to_vec());
    if let Some(dir) = output_dir {
        walker = walker.skip_dir(dir.to_path_buf());
    }

    let jobs = walker
        .walk()?
        .into_iter()
        .map(|file| RenderJob {
            output: output_dir.map(|dir| dir.join(&file.relative_path)),
            input: file.path,
        })
        .collect();
    Ok(jobs)
}
