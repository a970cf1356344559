//! Directory-mode rendering on a bounded rayon pool.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde_json::Value;

use super::context::{EvalContext, RenderOptions};
use super::output::write_output;
use super::template::render_file;
use crate::domain::ErrorPolicy;
use crate::error::TemplaterError;

// Nested include/tpl renders recurse on the worker's stack.
const WORKER_STACK_SIZE: usize = 16 * 1024 * 1024;

/// One template file and where its output goes (`None` means stdout).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderJob {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
}

#[derive(Debug)]
pub struct RenderedJob {
    pub job: RenderJob,
    /// Rendered text, kept only for stdout jobs.
    pub contents: Option<String>,
}

#[derive(Debug)]
pub struct JobFailure {
    pub input: PathBuf,
    pub error: TemplaterError,
}

/// Outcome of a batch, in job order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub rendered: Vec<RenderedJob>,
    pub failures: Vec<JobFailure>,
    /// Jobs never started because fail-fast tripped.
    pub skipped: usize,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct BatchSettings {
    pub options: RenderOptions,
    pub jobs: Option<usize>,
    pub policy: ErrorPolicy,
}

enum JobResult {
    Rendered(RenderedJob),
    Failed(JobFailure),
    Skipped,
}

/// Render one job: its own context and environment, sharing only `data`.
pub fn render_job(
    job: &RenderJob,
    data: &Value,
    options: &RenderOptions,
) -> Result<Option<String>, TemplaterError> {
    let ctx = EvalContext::for_file(&job.input, options.clone())
        .map_err(|source| TemplaterError::SourceRead { path: job.input.clone(), source })?;
    let rendered = render_file(&job.input, &ctx, data)?;
    match &job.output {
        Some(path) => {
            write_output(path, &rendered)?;
            Ok(None)
        }
        None => Ok(Some(rendered)),
    }
}

/// Render every job. Failures are recorded in the report, never returned as `Err`;
/// `Err` means the pool itself could not be built.
pub fn render_batch(
    jobs: Vec<RenderJob>,
    data: &Value,
    settings: &BatchSettings,
) -> Result<BatchReport> {
    let mut builder = rayon::ThreadPoolBuilder::new().stack_size(WORKER_STACK_SIZE);
    if let Some(threads) = settings.jobs {
        builder = builder.num_threads(threads);
    }
    let pool = builder.build().context("failed to build render thread pool")?;
    tracing::debug!(
        jobs = jobs.len(),
        threads = pool.current_num_threads(),
        policy = %settings.policy,
        "rendering directory"
    );

    let abort = AtomicBool::new(false);
    let results: Vec<JobResult> = pool.install(|| {
        jobs.into_par_iter()
            .map(|job| {
                if abort.load(Ordering::Relaxed) {
                    return JobResult::Skipped;
                }
                match render_job(&job, data, &settings.options) {
                    Ok(contents) => JobResult::Rendered(RenderedJob { job, contents }),
                    Err(error) => {
                        if settings.policy == ErrorPolicy::FailFast {
                            abort.store(true, Ordering::Relaxed);
                        } else {
                            tracing::error!(
                                path = %job.input.display(),
                                error = %error,
                                "render failed"
                            );
                        }
                        JobResult::Failed(JobFailure { input: job.input, error })
                    }
                }
            })
            .collect()
    });

    let mut report = BatchReport::default();
    for result in results {
        match result {
            JobResult::Rendered(rendered) => report.rendered.push(rendered),
            JobResult::Failed(failure) => report.failures.push(failure),
            JobResult::Skipped => report.skipped += 1,
        }
    }
    Ok(report)
}
