//! templater: render templates against layered YAML values
//!
//! Values come from any number of YAML sources plus `--set` overrides and are
//! coalesced Helm-style into a single tree, with `__replace: true` available to
//! stop a subtree from being deep-merged. Templates are Jinja2 (minijinja) and get
//! `toYaml`, `toJson`, `tpl` and `include`, where `include` resolves paths relative
//! to the template that calls it.

pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod render;
pub mod scan;
pub mod utils;
pub mod values;

pub use domain::{Config, ErrorPolicy};
pub use error::{Result, TemplaterError};
pub use render::{CompiledTemplate, EvalContext, RenderOptions};
pub use values::{parse_overrides, resolve_values, ValueSource, ValueTree};
