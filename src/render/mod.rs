//! Template evaluation: compile, render, include and write.

pub mod batch;
pub mod context;
pub mod functions;
pub mod output;
pub mod template;

pub use batch::{
    render_batch, render_job, BatchReport, BatchSettings, JobFailure, RenderJob, RenderedJob,
};
pub use context::{EvalContext, RenderOptions};
pub use output::write_output;
pub use template::{render_file, CompiledTemplate};
