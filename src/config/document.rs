//! Hierarchical configuration document (e.g. `application.yml`).
//!
//! The document is loaded once and queried by dotted path. Leaves are strings;
//! numeric and boolean scalars are stored in their textual form, sequences and
//! nulls are kept as opaque terminals that never resolve.

use std::collections::BTreeMap;
use std::path::Path;

use super::FileFormat;
use crate::error::{ExtractorError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigNode {
    Text(String),
    Table(BTreeMap<String, ConfigNode>),
    Opaque,
}

/// Immutable snapshot of a configuration tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigDocument {
    root: BTreeMap<String, ConfigNode>,
}

impl ConfigDocument {
    pub fn new(root: BTreeMap<String, ConfigNode>) -> Self {
        Self { root }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Loads a document; the format is chosen by extension
    pub fn load(path: &Path) -> Result<Self> {
        let format = FileFormat::from_path(path)?;
        let content = std::fs::read_to_string(path)?;
        let document = Self::parse(format, &content)?;
        tracing::debug!("Loaded configuration document {}", path.display());
        Ok(document)
    }

    pub fn parse(format: FileFormat, content: &str) -> Result<Self> {
        match format {
            FileFormat::Yaml => Self::from_yaml_str(content),
            FileFormat::Json => Self::from_json_str(content),
            FileFormat::Toml => Self::from_toml_str(content),
        }
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let value: serde_yaml::Value = serde_yaml::from_str(content)?;
        Self::from_root(from_yaml(value))
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(content)?;
        Self::from_root(from_json(value))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let table: toml::Table = toml::from_str(content)?;
        Self::from_root(from_toml(toml::Value::Table(table)))
    }

    fn from_root(root: Option<ConfigNode>) -> Result<Self> {
        match root {
            Some(ConfigNode::Table(table)) => Ok(Self::new(table)),
            None => Ok(Self::empty()),
            Some(_) => Err(ExtractorError::Config(
                "configuration root must be a mapping".to_string(),
            )),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Resolves a dotted key path to a string leaf.
    ///
    /// Returns `None` on a missing segment, a non-table intermediate, a
    /// non-string terminal, or when the path ends on a table.
    pub fn resolve(&self, dot_path: &str) -> Option<&str> {
        let mut segments = dot_path.split('.');
        let first = segments.next()?;
        let mut current = self.root.get(first)?;

        for segment in segments {
            match current {
                ConfigNode::Table(table) => current = table.get(segment)?,
                _ => return None,
            }
        }

        match current {
            ConfigNode::Text(value) => Some(value),
            _ => None,
        }
    }
}

/// Extracts the dotted key path from a configuration-key tag payload.
///
/// Accepts `${a.b.c}` and bare `a.b.c`. Returns `None` for a missing closing
/// delimiter, an empty path or an empty segment.
pub fn parse_key_path(payload: &str) -> Option<&str> {
    let trimmed = payload.trim();
    let path = match trimmed.strip_prefix("${") {
        Some(rest) => rest.strip_suffix('}')?,
        None => trimmed,
    };

    if path.is_empty() || path.contains(['{', '}']) {
        return None;
    }
    if path.split('.').any(|segment| segment.trim().is_empty()) {
        return None;
    }
    Some(path)
}

fn from_yaml(value: serde_yaml::Value) -> Option<ConfigNode> {
    use serde_yaml::Value;

    match value {
        Value::Null => None,
        Value::String(s) => Some(ConfigNode::Text(s)),
        Value::Number(n) => Some(ConfigNode::Text(n.to_string())),
        Value::Bool(b) => Some(ConfigNode::Text(b.to_string())),
        Value::Sequence(_) => Some(ConfigNode::Opaque),
        Value::Mapping(mapping) => {
            let mut table = BTreeMap::new();
            for (key, value) in mapping {
                let key = match key {
                    Value::String(s) => s,
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    _ => continue,
                };
                table.insert(key, from_yaml(value).unwrap_or(ConfigNode::Opaque));
            }
            Some(ConfigNode::Table(table))
        }
        Value::Tagged(tagged) => from_yaml(tagged.value),
    }
}

fn from_json(value: serde_json::Value) -> Option<ConfigNode> {
    use serde_json::Value;

    match value {
        Value::Null => None,
        Value::String(s) => Some(ConfigNode::Text(s)),
        Value::Number(n) => Some(ConfigNode::Text(n.to_string())),
        Value::Bool(b) => Some(ConfigNode::Text(b.to_string())),
        Value::Array(_) => Some(ConfigNode::Opaque),
        Value::Object(object) => Some(ConfigNode::Table(
            object
                .into_iter()
                .map(|(k, v)| (k, from_json(v).unwrap_or(ConfigNode::Opaque)))
                .collect(),
        )),
    }
}

fn from_toml(value: toml::Value) -> Option<ConfigNode> {
    use toml::Value;

    match value {
        Value::String(s) => Some(ConfigNode::Text(s)),
        Value::Integer(i) => Some(ConfigNode::Text(i.to_string())),
        Value::Float(f) => Some(ConfigNode::Text(f.to_string())),
        Value::Boolean(b) => Some(ConfigNode::Text(b.to_string())),
        Value::Datetime(d) => Some(ConfigNode::Text(d.to_string())),
        Value::Array(_) => Some(ConfigNode::Opaque),
        Value::Table(table) => Some(ConfigNode::Table(
            table
                .into_iter()
                .map(|(k, v)| (k, from_toml(v).unwrap_or(ConfigNode::Opaque)))
                .collect(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_nested_leaf() {
        let doc = ConfigDocument::from_yaml_str("a:\n  b:\n    c: v\n").unwrap();
        assert_eq!(doc.resolve("a.b.c"), Some("v"));
    }

    #[test]
    fn test_resolve_path_too_long() {
        let doc = ConfigDocument::from_yaml_str("a:\n  b: v\n").unwrap();
        assert_eq!(doc.resolve("a.b.c"), None);
    }

    #[test]
    fn test_resolve_empty_document() {
        let doc = ConfigDocument::from_yaml_str("{}").unwrap();
        assert_eq!(doc.resolve("a.b.c"), None);
        assert!(ConfigDocument::from_yaml_str("").unwrap().is_empty());
    }

    #[test]
    fn test_resolve_stops_on_table_and_opaque() {
        let doc = ConfigDocument::from_yaml_str(
            "svc:\n  host: 10.0.0.1\n  port: 8080\n  peers: [a, b]\n",
        )
        .unwrap();

        assert_eq!(doc.resolve("svc"), None);
        assert_eq!(doc.resolve("svc.peers"), None);
        assert_eq!(doc.resolve("svc.port"), Some("8080"));
        assert_eq!(doc.resolve("svc.host"), Some("10.0.0.1"));
        assert_eq!(doc.resolve("svc.missing"), None);
    }

    #[test]
    fn test_toml_and_json_documents() {
        let toml_doc = ConfigDocument::from_toml_str("[svc]\nhost = \"h\"\n").unwrap();
        assert_eq!(toml_doc.resolve("svc.host"), Some("h"));

        let json_doc = ConfigDocument::from_json_str(r#"{"svc": {"host": "j"}}"#).unwrap();
        assert_eq!(json_doc.resolve("svc.host"), Some("j"));
    }

    #[test]
    fn test_non_mapping_root_rejected() {
        assert!(ConfigDocument::from_yaml_str("- a\n- b\n").is_err());
    }

    #[test]
    fn test_parse_key_path() {
        assert_eq!(parse_key_path("${svc.host}"), Some("svc.host"));
        assert_eq!(parse_key_path("svc.host"), Some("svc.host"));
        assert_eq!(parse_key_path("${svc.host"), None);
        assert_eq!(parse_key_path("${svc..host}"), None);
        assert_eq!(parse_key_path("${}"), None);
        assert_eq!(parse_key_path(""), None);
    }
}
