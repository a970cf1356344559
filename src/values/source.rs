//! Value sources: named YAML buffers and their conversion into value trees.

use super::ValueTree;
use crate::error::{Result, TemplaterError};
use serde_json::{Number, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// One YAML document contributing to the value tree.
///
/// The name is only used to identify the source in errors and logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueSource {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl ValueSource {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self { name: name.into(), bytes: bytes.into() }
    }

    /// Read a values file from disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)
            .map_err(|source| TemplaterError::SourceRead { path: path.to_path_buf(), source })?;
        Ok(Self::new(path.display().to_string(), bytes))
    }

    /// Parse the buffer into a value tree.
    ///
    /// An empty document is an empty tree. Anything other than a mapping at the top
    /// level is rejected.
    pub fn parse(&self) -> Result<ValueTree> {
        if self.bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(ValueTree::new());
        }
        let yaml_error = |source| TemplaterError::YamlParse { name: self.name.clone(), source };
        let mut raw: serde_yaml::Value = serde_yaml::from_slice(&self.bytes).map_err(yaml_error)?;
        // `<<: *anchor` merge keys are expanded before conversion.
        raw.apply_merge().map_err(yaml_error)?;

        let converted = yaml_to_json(raw).map_err(|reason| self.merge_error(reason))?;
        match converted {
            Value::Null => Ok(ValueTree::new()),
            Value::Object(tree) => Ok(tree),
            other => Err(self.merge_error(format!(
                "top-level value must be a mapping, found {}",
                kind_name(&other)
            ))),
        }
    }

    fn merge_error(&self, reason: String) -> TemplaterError {
        TemplaterError::Merge { name: self.name.clone(), reason }
    }
}

/// Read every values file, preserving order (first = lowest priority).
pub fn load_sources(paths: &[PathBuf]) -> Result<Vec<ValueSource>> {
    paths
        .iter()
        .map(|path| {
            tracing::debug!(path = %path.display(), "reading values file");
            ValueSource::from_path(path)
        })
        .collect()
}

fn yaml_to_json(value: serde_yaml::Value) -> std::result::Result<Value, String> {
    use serde_yaml::Value as Yaml;

    match value {
        Yaml::Null => Ok(Value::Null),
        Yaml::Bool(b) => Ok(Value::Bool(b)),
        Yaml::Number(n) => yaml_number(&n).map(Value::Number),
        Yaml::String(s) => Ok(Value::String(s)),
        Yaml::Sequence(items) => items
            .into_iter()
            .map(yaml_to_json)
            .collect::<std::result::Result<_, _>>()
            .map(Value::Array),
        Yaml::Mapping(mapping) => {
            let mut tree = ValueTree::new();
            for (key, value) in mapping {
                tree.insert(mapping_key(key)?, yaml_to_json(value)?);
            }
            Ok(Value::Object(tree))
        }
        Yaml::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

fn yaml_number(n: &serde_yaml::Number) -> std::result::Result<Number, String> {
    if let Some(i) = n.as_i64() {
        Ok(Number::from(i))
    } else if let Some(u) = n.as_u64() {
        Ok(Number::from(u))
    } else {
        n.as_f64()
            .and_then(Number::from_f64)
            .ok_or_else(|| format!("number {} cannot be represented", n))
    }
}

// Scalar keys are stringified the way YAML-to-JSON converters do it.
fn mapping_key(key: serde_yaml::Value) -> std::result::Result<String, String> {
    use serde_yaml::Value as Yaml;

    match key {
        Yaml::String(s) => Ok(s),
        Yaml::Bool(b) => Ok(b.to_string()),
        Yaml::Number(n) => Ok(n.to_string()),
        Yaml::Null => Ok("null".to_string()),
        Yaml::Tagged(tagged) => mapping_key(tagged.value),
        Yaml::Sequence(_) | Yaml::Mapping(_) => {
            Err("mapping keys must be scalars, found a collection key".to_string())
        }
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn parses_nested_mapping() {
        let source = ValueSource::new("values.yaml", "class:\n  name: rajesh\n  grade: 10\n");
        let tree = source.parse().expect("parse");
        assert_eq!(Value::Object(tree), json!({"class": {"name": "rajesh", "grade": 10}}));
    }

    #[test]
    fn empty_document_is_empty_tree() {
        assert!(ValueSource::new("empty.yaml", "").parse().expect("parse").is_empty());
        assert!(ValueSource::new("null.yaml", "~\n").parse().expect("parse").is_empty());
    }

    #[test]
    fn invalid_yaml_names_the_source() {
        let err = ValueSource::new("broken.yaml", "a: [1, 2\n").parse().unwrap_err();
        assert!(matches!(err, TemplaterError::YamlParse { ref name, .. } if name == "broken.yaml"));
    }

    #[test]
    fn top_level_sequence_is_a_merge_error() {
        let err = ValueSource::new("list.yaml", "- a\n- b\n").parse().unwrap_err();
        match err {
            TemplaterError::Merge { name, reason } => {
                assert_eq!(name, "list.yaml");
                assert!(reason.contains("a sequence"), "reason: {reason}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn merge_keys_are_expanded() {
        let source = ValueSource::new(
            "anchors.yaml",
            "base: &b\n  host: a\n  port: 1\nprod:\n  <<: *b\n  port: 2\n",
        );
        let tree = source.parse().expect("parse");
        assert_eq!(tree["prod"], json!({"host": "a", "port": 2}));
        assert_eq!(tree["base"], json!({"host": "a", "port": 1}));
    }

    #[test]
    fn scalar_keys_are_stringified() {
        let source = ValueSource::new("keys.yaml", "ports:\n  80: http\n  true: yes-key\n");
        let tree = source.parse().expect("parse");
        assert_eq!(tree["ports"]["80"], json!("http"));
        assert_eq!(tree["ports"]["true"], json!("yes-key"));
    }

    #[test]
    fn collection_keys_are_rejected() {
        let source = ValueSource::new("weird.yaml", "? [a, b]\n: value\n");
        assert!(matches!(source.parse(), Err(TemplaterError::Merge { .. })));
    }

    #[test]
    fn tags_are_dropped() {
        let source = ValueSource::new("tagged.yaml", "port: !custom 8080\n");
        assert_eq!(source.parse().expect("parse")["port"], json!(8080));
    }

    #[test]
    fn load_sources_keeps_order_and_reports_missing_files() {
        let tmp = TempDir::new().expect("tmp");
        let a = tmp.path().join("a.yaml");
        let b = tmp.path().join("b.yaml");
        fs::write(&a, "a: 1\n").expect("write a");
        fs::write(&b, "b: 2\n").expect("write b");

        let sources = load_sources(&[a.clone(), b]).expect("load");
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].name, a.display().to_string());

        let missing = tmp.path().join("missing.yaml");
        let err = load_sources(&[a, missing.clone()]).unwrap_err();
        assert!(matches!(err, TemplaterError::SourceRead { ref path, .. } if *path == missing));
    }
}
