//! Template functions: `toYaml`, `toJson`, `tpl` and `include`.
//!
//! `tpl` and `include` are callable objects holding the [`EvalContext`] of the
//! environment they were registered in. Each call derives a child context and
//! builds a fresh environment for the nested template, so the nested `include`
//! resolves against the right directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use minijinja::value::{from_args, Object, ObjectRepr};
use minijinja::{context, Environment, Error, ErrorKind, State, Value};

use super::context::EvalContext;
use super::template::{render_file, CompiledTemplate};
use crate::domain::VALUES_KEY;
use crate::error::TemplaterError;

/// Name given to templates compiled by `tpl`.
pub const TPL_TEMPLATE_NAME: &str = "tpl";

/// Registers the function environment bound to `ctx`.
pub fn register_functions(env: &mut Environment<'static>, ctx: &EvalContext) {
    env.add_function("toYaml", to_yaml);
    env.add_function("toJson", to_json);
    env.add_global("tpl", Value::from_object(TplFunction { ctx: ctx.clone() }));
    env.add_global("include", Value::from_object(IncludeFunction { ctx: ctx.clone() }));
}

fn to_yaml(value: Value) -> Result<String, Error> {
    serde_yaml::to_string(&value).map_err(|err| {
        Error::new(ErrorKind::BadSerialization, "toYaml could not serialize value").with_source(err)
    })
}

fn to_json(value: Value) -> Result<String, Error> {
    serde_json::to_string(&value).map_err(|err| {
        Error::new(ErrorKind::BadSerialization, "toJson could not serialize value").with_source(err)
    })
}

/// Without an explicit data argument, nested templates see the caller's `Values`.
fn caller_data(state: &State, data: Option<Value>) -> Value {
    data.unwrap_or_else(|| {
        let values = state.lookup(VALUES_KEY).unwrap_or(Value::UNDEFINED);
        context! { Values => values }
    })
}

/// `tpl(source, data?)`: evaluate a string as a template, exactly once.
#[derive(Debug)]
struct TplFunction {
    ctx: EvalContext,
}

impl Object for TplFunction {
    fn repr(self: &Arc<Self>) -> ObjectRepr {
        ObjectRepr::Plain
    }

    fn call(self: &Arc<Self>, state: &State<'_, '_>, args: &[Value]) -> Result<Value, Error> {
        let (source, data): (String, Option<Value>) = from_args(args)?;
        let child = self.ctx.nested(TPL_TEMPLATE_NAME)?;
        let data = caller_data(state, data);

        CompiledTemplate::compile(TPL_TEMPLATE_NAME, source, &child)
            .and_then(|compiled| compiled.render(&data))
            .map(Value::from)
            .map_err(engine_error)
    }
}

/// `include(path, data?)`: render another template file relative to the caller.
#[derive(Debug)]
struct IncludeFunction {
    ctx: EvalContext,
}

impl Object for IncludeFunction {
    fn repr(self: &Arc<Self>) -> ObjectRepr {
        ObjectRepr::Plain
    }

    fn call(self: &Arc<Self>, state: &State<'_, '_>, args: &[Value]) -> Result<Value, Error> {
        let (path, data): (String, Option<Value>) = from_args(args)?;
        let resolved = self.ctx.resolve(&path);
        let child = self.ctx.for_include(&resolved)?;
        let data = caller_data(state, data);

        tracing::debug!(
            from = %state.name(),
            path = %resolved.display(),
            depth = child.depth(),
            "including template"
        );

        render_file(&resolved, &child, &data)
            .map(Value::from)
            .map_err(|err| include_error(resolved, err))
    }
}

// Failures inside an include are reported against the resolved path.
fn include_error(resolved: PathBuf, err: TemplaterError) -> Error {
    let describe = |action: &str, path: &Path| {
        Error::new(
            ErrorKind::InvalidOperation,
            format!("failed to {} include file {}", action, path.display()),
        )
    };
    match err {
        TemplaterError::SourceRead { source, .. } => describe("read", &resolved).with_source(source),
        TemplaterError::TemplateParse { source, .. } => {
            describe("parse", &resolved).with_source(source)
        }
        TemplaterError::Execution { source, .. } => {
            describe("execute", &resolved).with_source(source)
        }
        other => describe("execute", &resolved).with_source(other),
    }
}

fn engine_error(err: TemplaterError) -> Error {
    match err {
        TemplaterError::TemplateParse { source, .. } | TemplaterError::Execution { source, .. } => {
            source
        }
        other => Error::new(ErrorKind::InvalidOperation, other.to_string()).with_source(other),
    }
}
