//! Compiled templates.

use std::fs;
use std::path::Path;

use minijinja::{AutoEscape, Environment, UndefinedBehavior};
use serde::Serialize;

use super::context::EvalContext;
use super::functions::register_functions;
use crate::error::{Result, TemplaterError};

/// A template compiled against the function environment of one [`EvalContext`].
///
/// Rendering does not mutate the template; the same instance can be rendered any
/// number of times with different data.
#[derive(Debug)]
pub struct CompiledTemplate {
    name: String,
    env: Environment<'static>,
}

impl CompiledTemplate {
    /// Compile `source` under `name` (a path or `<stdin>`, used in errors).
    pub fn compile(
        name: impl Into<String>,
        source: impl Into<String>,
        ctx: &EvalContext,
    ) -> Result<Self> {
        let name = name.into();
        let mut env = build_environment(ctx);
        env.add_template_owned(name.clone(), source.into())
            .map_err(|source| TemplaterError::TemplateParse { name: name.clone(), source })?;
        Ok(Self { name, env })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn render<S: Serialize>(&self, data: S) -> Result<String> {
        self.env
            .get_template(&self.name)
            .and_then(|template| template.render(data))
            .map_err(|source| TemplaterError::Execution { name: self.name.clone(), source })
    }
}

/// Read, compile and render a template file with `ctx` as its context.
pub fn render_file<S: Serialize>(path: &Path, ctx: &EvalContext, data: S) -> Result<String> {
    let source = fs::read_to_string(path)
        .map_err(|source| TemplaterError::SourceRead { path: path.to_path_buf(), source })?;
    let compiled = CompiledTemplate::compile(path.display().to_string(), source, ctx)?;
    tracing::debug!(template = compiled.name(), depth = ctx.depth(), "rendering template file");
    compiled.render(data)
}

fn build_environment(ctx: &EvalContext) -> Environment<'static> {
    let mut env = Environment::new();
    // Output is plain text whatever the file extension.
    env.set_auto_escape_callback(|_| AutoEscape::None);
    env.set_keep_trailing_newline(true);
    env.set_undefined_behavior(if ctx.options().strict {
        UndefinedBehavior::Strict
    } else {
        UndefinedBehavior::Lenient
    });
    register_functions(&mut env, ctx);
    env
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RenderOptions;
    use serde_json::json;
    use similar_asserts::assert_eq;
    use std::error::Error as _;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn ctx_at(dir: &Path) -> EvalContext {
        EvalContext::new(dir, RenderOptions::default())
    }

    fn strict_ctx_at(dir: &Path) -> EvalContext {
        EvalContext::new(dir, RenderOptions { strict: true, ..RenderOptions::default() })
    }

    fn render_str(source: &str, data: serde_json::Value) -> Result<String> {
        CompiledTemplate::compile("test.tpl", source, &ctx_at(Path::new("/")))?.render(data)
    }

    fn error_chain(err: &dyn std::error::Error) -> String {
        let mut parts = vec![err.to_string()];
        let mut current = err.source();
        while let Some(cause) = current {
            parts.push(cause.to_string());
            current = cause.source();
        }
        parts.join(": ")
    }

    fn write(dir: &Path, rel: &str, contents: &str) -> PathBuf {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("mkdir");
        }
        fs::write(&path, contents).expect("write");
        path
    }

    #[test]
    fn renders_values() {
        let out = render_str("Hello {{ Values.name }}!", json!({"Values": {"name": "Ada"}}))
            .expect("render");
        assert_eq!(out, "Hello Ada!");
    }

    #[test]
    fn keeps_trailing_newline_and_skips_escaping() {
        let ctx = ctx_at(Path::new("/"));
        let compiled = CompiledTemplate::compile("page.html", "<b>{{ Values.x }}</b>\n", &ctx)
            .expect("compile");
        assert_eq!(compiled.name(), "page.html");
        let out = compiled.render(json!({"Values": {"x": "a & b"}})).expect("render");
        assert_eq!(out, "<b>a & b</b>\n");
    }

    #[test]
    fn syntax_error_is_a_parse_error_with_name() {
        let err = CompiledTemplate::compile("broken.tpl", "{{ unclosed", &ctx_at(Path::new("/")))
            .unwrap_err();
        assert!(matches!(err, TemplaterError::TemplateParse { ref name, .. } if name == "broken.tpl"));
    }

    #[test]
    fn undefined_is_empty_when_lenient_and_fails_when_strict() {
        let data = json!({"Values": {}});
        assert_eq!(render_str("[{{ Values.missing }}]", data.clone()).expect("lenient"), "[]");

        let compiled = CompiledTemplate::compile(
            "strict.tpl",
            "{{ Values.missing }}",
            &strict_ctx_at(Path::new("/")),
        )
        .expect("compile");
        let err = compiled.render(data).unwrap_err();
        assert!(matches!(err, TemplaterError::Execution { ref name, .. } if name == "strict.tpl"));
    }

    #[test]
    fn to_yaml_serializes_structures() {
        let out = render_str(
            "{{ toYaml(Values.class) }}",
            json!({"Values": {"class": {"name": "suresh", "section": "A"}}}),
        )
        .expect("render");
        assert_eq!(out, "name: suresh\nsection: A\n");
    }

    #[test]
    fn to_json_serializes_structures() {
        let out = render_str("{{ toJson(Values) }}", json!({"Values": {"a": [1, 2]}}))
            .expect("render");
        assert_eq!(out, r#"{"a":[1,2]}"#);
    }

    #[test]
    fn tpl_evaluates_string_once() {
        let data = json!({"Values": {"name": "Ada", "greeting": "{{ Values.name }}"}});
        assert_eq!(render_str("{{ tpl(Values.greeting) }}", data.clone()).expect("tpl"), "Ada");

        // The evaluated string yields template syntax as text; it is not evaluated again.
        let nested = json!({"Values": {"raw": "{{ '{{ Values.name }}' }}", "name": "Ada"}});
        assert_eq!(render_str("{{ tpl(Values.raw) }}", nested).expect("tpl"), "{{ Values.name }}");
    }

    #[test]
    fn tpl_accepts_explicit_data() {
        let out = render_str(
            r#"{{ tpl("{{ Values.who }}", {"Values": {"who": "Grace"} }) }}"#,
            json!({"Values": {"who": "Ada"}}),
        )
        .expect("render");
        assert_eq!(out, "Grace");
    }

    #[test]
    fn tpl_syntax_error_propagates() {
        let err = render_str("{{ tpl('{{ oops') }}", json!({"Values": {}})).unwrap_err();
        assert!(matches!(err, TemplaterError::Execution { .. }));
    }

    #[test]
    fn include_chain_resolves_each_hop_from_its_own_directory() {
        let tmp = TempDir::new().expect("tmp");
        let root = write(tmp.path(), "root.tpl", r#"root>{{ include("sub/child.tpl") }}"#);
        write(tmp.path(), "sub/child.tpl", r#"child>{{ include("grandchild.tpl") }}"#);
        write(tmp.path(), "sub/grandchild.tpl", "grandchild:{{ Values.name }}");
        // Decoy at the root directory that must not be picked up.
        write(tmp.path(), "grandchild.tpl", "WRONG");

        let ctx = EvalContext::for_file(&root, RenderOptions::default()).expect("ctx");
        let out = render_file(&root, &ctx, json!({"Values": {"name": "Ada"}})).expect("render");
        assert_eq!(out, "root>child>grandchild:Ada");
    }

    #[test]
    fn sibling_includes_do_not_leak_base_directories() {
        let tmp = TempDir::new().expect("tmp");
        let root = write(
            tmp.path(),
            "root.tpl",
            r#"{{ include("a/first.tpl") }}|{{ include("b/second.tpl") }}"#,
        );
        write(tmp.path(), "a/first.tpl", r#"{{ include("leaf.tpl") }}"#);
        write(tmp.path(), "a/leaf.tpl", "a-leaf");
        write(tmp.path(), "b/second.tpl", r#"{{ include("leaf.tpl") }}"#);
        write(tmp.path(), "b/leaf.tpl", "b-leaf");

        let ctx = EvalContext::for_file(&root, RenderOptions::default()).expect("ctx");
        let out = render_file(&root, &ctx, json!({"Values": {}})).expect("render");
        assert_eq!(out, "a-leaf|b-leaf");
    }

    #[test]
    fn include_accepts_absolute_paths_and_explicit_data() {
        let tmp = TempDir::new().expect("tmp");
        let partial = write(tmp.path(), "partials/name.tpl", "{{ Values.name }}");
        let source = format!(
            r#"{{{{ include("{}", {{"Values": {{"name": "Grace"}} }}) }}}}"#,
            partial.display()
        );

        let compiled =
            CompiledTemplate::compile("abs.tpl", source, &ctx_at(Path::new("/nowhere")))
                .expect("compile");
        assert_eq!(compiled.render(json!({"Values": {"name": "Ada"}})).expect("render"), "Grace");
    }

    #[test]
    fn tpl_inside_include_resolves_from_included_directory() {
        let tmp = TempDir::new().expect("tmp");
        let root = write(tmp.path(), "root.tpl", r#"{{ include("sub/child.tpl") }}"#);
        write(tmp.path(), "sub/child.tpl", r#"{{ tpl('{{ include("leaf.tpl") }}') }}"#);
        write(tmp.path(), "sub/leaf.tpl", "leaf");

        let ctx = EvalContext::for_file(&root, RenderOptions::default()).expect("ctx");
        assert_eq!(render_file(&root, &ctx, json!({"Values": {}})).expect("render"), "leaf");
    }

    #[test]
    fn missing_include_is_reported_against_resolved_path() {
        let tmp = TempDir::new().expect("tmp");
        let root = write(tmp.path(), "root.tpl", r#"{{ include("sub/../missing.tpl") }}"#);

        let ctx = EvalContext::for_file(&root, RenderOptions::default()).expect("ctx");
        let err = render_file(&root, &ctx, json!({"Values": {}})).unwrap_err();
        let chain = error_chain(&err);
        let resolved = ctx.resolve("missing.tpl");
        assert!(
            chain.contains(&format!("failed to read include file {}", resolved.display())),
            "chain: {chain}"
        );
        assert!(err.source().is_some());
    }

    #[test]
    fn include_parse_error_is_reported_against_resolved_path() {
        let tmp = TempDir::new().expect("tmp");
        let root = write(tmp.path(), "root.tpl", r#"{{ include("bad.tpl") }}"#);
        let bad = write(tmp.path(), "bad.tpl", "{% if %}");

        let ctx = EvalContext::for_file(&root, RenderOptions::default()).expect("ctx");
        let chain = error_chain(&render_file(&root, &ctx, json!({})).unwrap_err());
        assert!(
            chain.contains(&format!("failed to parse include file {}", bad.display())),
            "chain: {chain}"
        );
    }

    #[test]
    fn include_execution_error_is_reported_against_resolved_path() {
        let tmp = TempDir::new().expect("tmp");
        let root = write(tmp.path(), "root.tpl", r#"{{ include("sub/../sub/bad.tpl") }}"#);
        let bad = write(tmp.path(), "sub/bad.tpl", "{{ Values.missing }}");

        let ctx = EvalContext::for_file(&root, RenderOptions { strict: true, ..Default::default() })
            .expect("ctx");
        let chain = error_chain(&render_file(&root, &ctx, json!({"Values": {}})).unwrap_err());
        assert!(
            chain.contains(&format!("failed to execute include file {}", bad.display())),
            "chain: {chain}"
        );
        assert!(!chain.contains("sub/../sub"), "chain: {chain}");
    }

    #[test]
    fn cyclic_include_hits_depth_limit() {
        let tmp = TempDir::new().expect("tmp");
        let root = write(tmp.path(), "loop.tpl", r#"x{{ include("loop.tpl") }}"#);

        let options = RenderOptions { strict: false, max_include_depth: 8 };
        let ctx = EvalContext::for_file(&root, options).expect("ctx");
        let chain = error_chain(&render_file(&root, &ctx, json!({})).unwrap_err());
        assert!(chain.contains("include depth limit of 8 exceeded"), "chain: {chain}");
    }

    #[test]
    fn unreadable_root_is_a_source_read_error() {
        let tmp = TempDir::new().expect("tmp");
        let missing = tmp.path().join("missing.tpl");
        let err = render_file(&missing, &ctx_at(tmp.path()), json!({})).unwrap_err();
        assert!(matches!(err, TemplaterError::SourceRead { ref path, .. } if *path == missing));
    }
}
