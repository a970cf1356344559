//! Render command implementation

use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use super::utils::{is_stdin, parse_csv};
use crate::config::{load_config, merge_cli_with_config, CliOverrides};
use crate::domain::{Config, ErrorPolicy, STDIN_NAME};
use crate::render::{
    render_batch, render_file, write_output, BatchSettings, CompiledTemplate, EvalContext,
    RenderOptions,
};
use crate::scan::plan_jobs;
use crate::values::{
    apply_overrides, keep_string, load_sources, parse_overrides, resolve_values, wrap_values,
};

#[derive(Args)]
pub struct RenderArgs {
    /// Template file, directory of templates, or '-' for stdin
    #[arg(short, long, value_name = "PATH")]
    pub input: PathBuf,

    /// Output file (or directory when the input is a directory); stdout if omitted
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// YAML values file (repeatable; later files win)
    #[arg(short = 'f', long = "values", value_name = "FILE")]
    pub values: Vec<PathBuf>,

    /// Set a value, e.g. 'image.tag=1.2' (repeatable; coerces booleans, null and numbers)
    #[arg(long, value_name = "KEY=VALUE")]
    pub set: Vec<String>,

    /// Set a value kept verbatim as a string (repeatable; wins over --set)
    #[arg(long, value_name = "KEY=VALUE")]
    pub set_string: Vec<String>,

    /// Fail on undefined template references
    #[arg(long)]
    pub strict: bool,

    /// Maximum nesting of include/tpl calls
    #[arg(long, value_name = "N")]
    pub max_include_depth: Option<usize>,

    /// Worker threads for directory mode
    #[arg(short = 'j', long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Keep rendering the remaining files of a directory after a failure
    #[arg(long)]
    pub keep_going: bool,

    /// Skip templates matching these globs in directory mode (comma-separated)
    #[arg(short = 'e', long, value_name = "GLOBS")]
    pub exclude: Option<String>,

    /// Path to config file (templater.toml or .templater.yml)
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl RenderArgs {
    fn cli_overrides(&self) -> CliOverrides {
        CliOverrides {
            strict: if self.strict { Some(true) } else { None },
            max_include_depth: self.max_include_depth,
            jobs: self.jobs,
            error_policy: if self.keep_going { Some(ErrorPolicy::Collect) } else { None },
            exclude: parse_csv(&self.exclude),
        }
    }
}

pub fn run(args: RenderArgs) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let file_config = load_config(&cwd, args.config.as_deref())?;
    let config = merge_cli_with_config(file_config, args.cli_overrides());
    tracing::debug!(?config, "effective config");

    let mut overrides = parse_overrides(&args.set)?;
    apply_overrides(&mut overrides, &args.set_string, keep_string)?;
    let sources = load_sources(&args.values)?;
    let data = wrap_values(resolve_values(&sources, overrides)?);

    if is_stdin(&args.input) {
        render_stdin(&cwd, args.output.as_deref(), &config, &data)
    } else if args.input.is_dir() {
        render_directory(&args.input, args.output.as_deref(), &config, &data)
    } else {
        render_single(&args.input, args.output.as_deref(), &config, &data)
    }
}

fn render_stdin(cwd: &Path, output: Option<&Path>, config: &Config, data: &Value) -> Result<()> {
    if let Some(path) = output {
        tracing::warn!(output = %path.display(), "stdin input always renders to stdout");
    }
    let mut source = String::new();
    io::stdin().read_to_string(&mut source).context("Failed reading template from stdin")?;

    let ctx = EvalContext::new(cwd, RenderOptions::from(config));
    let rendered = CompiledTemplate::compile(STDIN_NAME, source, &ctx)?.render(data)?;
    print_stdout(&rendered)
}

fn render_single(input: &Path, output: Option<&Path>, config: &Config, data: &Value) -> Result<()> {
    let ctx = EvalContext::for_file(input, RenderOptions::from(config))
        .with_context(|| format!("Failed resolving template path: {}", input.display()))?;
    let rendered = render_file(input, &ctx, data)?;
    match output {
        Some(path) => Ok(write_output(path, &rendered)?),
        None => print_stdout(&rendered),
    }
}

fn render_directory(
    input: &Path,
    output: Option<&Path>,
    config: &Config,
    data: &Value,
) -> Result<()> {
    let jobs = plan_jobs(input, output, &config.exclude)?;
    let total = jobs.len();
    let settings = BatchSettings {
        options: RenderOptions::from(config),
        jobs: config.jobs,
        policy: config.error_policy,
    };
    let report = render_batch(jobs, data, &settings)?;

    for rendered in &report.rendered {
        if let Some(contents) = &rendered.contents {
            print_stdout(contents)?;
        }
    }
    tracing::debug!(
        rendered = report.rendered.len(),
        failed = report.failures.len(),
        skipped = report.skipped,
        "directory render finished"
    );

    let mut failures = report.failures.into_iter();
    match (config.error_policy, failures.next()) {
        (_, None) => Ok(()),
        (ErrorPolicy::FailFast, Some(first)) => Err(first.error.into()),
        (ErrorPolicy::Collect, Some(_)) => {
            anyhow::bail!("{} of {} templates failed to render", failures.len() + 1, total)
        }
    }
}

fn print_stdout(contents: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(contents.as_bytes()).context("Failed writing to stdout")?;
    stdout.flush().context("Failed writing to stdout")?;
    Ok(())
}
