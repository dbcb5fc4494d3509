//! Extraction settings and configuration documents.

pub mod document;

use std::collections::BTreeMap;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{ExtractorError, Result};

pub use document::{parse_key_path, ConfigDocument, ConfigNode};

/// Serialization format of an input file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Yaml,
    Toml,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "json" => Ok(FileFormat::Json),
            "yaml" | "yml" => Ok(FileFormat::Yaml),
            "toml" => Ok(FileFormat::Toml),
            _ => Err(ExtractorError::UnsupportedFormat(path.display().to_string())),
        }
    }

    pub fn parse<T: DeserializeOwned>(&self, content: &str) -> Result<T> {
        match self {
            FileFormat::Json => Ok(serde_json::from_str(content)?),
            FileFormat::Yaml => Ok(serde_yaml::from_str(content)?),
            FileFormat::Toml => Ok(toml::from_str(content)?),
        }
    }
}

/// Caller-supplied marker conventions and extraction knobs.
///
/// Every field has a default matching the Spring / JPA conventions, so a
/// settings file only needs to list what differs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionSettings {
    /// Name of the produced module
    pub module_name: String,
    /// Case-insensitive substring of a tag name marking a controller
    pub controller_marker: String,
    /// Substring of a qualified tag name marking a service
    pub service_marker: String,
    /// Prefix of a qualified tag name marking a persistent entity
    pub entity_marker: String,
    /// Simple tag names marking a relation field
    pub relation_markers: Vec<String>,
    /// Simple type names treated as containers
    pub collection_types: Vec<String>,
    /// Simple tag name carrying a configuration key payload
    pub config_key_marker: String,
    /// Signature prefix of outbound HTTP client calls
    pub rest_call_prefix: String,
    /// Optional filter on the matched call's method name
    pub rest_call_methods: Option<Vec<String>>,
    /// Allocation types treated as string accumulators
    pub accumulator_types: Vec<String>,
    /// Method names appending to an accumulator
    pub append_methods: Vec<String>,
    /// Method names producing the accumulated value
    pub finisher_methods: Vec<String>,
    /// Simple tag name -> HTTP verb (`None` when the tag does not fix one)
    pub endpoint_markers: BTreeMap<String, Option<String>>,
    /// Only declarations under this package are analysed, when set
    pub base_package: Option<String>,
    /// Declarations under these packages are never analysed
    pub excluded_packages: Vec<String>,
    pub extract_rest_calls: bool,
    /// Hop bound of a single expression resolution
    pub max_depth: usize,
    /// Shard declarations across worker threads
    pub parallel: bool,
}

pub const DEFAULT_MAX_DEPTH: usize = 64;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        let endpoint_markers = [
            ("GetMapping", Some("GET")),
            ("PostMapping", Some("POST")),
            ("PutMapping", Some("PUT")),
            ("DeleteMapping", Some("DELETE")),
            ("PatchMapping", Some("PATCH")),
            ("RequestMapping", None),
        ]
        .into_iter()
        .map(|(tag, verb)| (tag.to_string(), verb.map(str::to_string)))
        .collect();

        Self {
            module_name: "module".to_string(),
            controller_marker: "controller".to_string(),
            service_marker: "stereotype.Service".to_string(),
            entity_marker: "javax.persistence.Entity".to_string(),
            relation_markers: strings(&["ManyToOne", "OneToMany", "OneToOne", "ManyToMany"]),
            collection_types: strings(&[
                "Set",
                "List",
                "Collection",
                "Queue",
                "Deque",
                "Map",
                "Array",
            ]),
            config_key_marker: "Value".to_string(),
            rest_call_prefix: "org.springframework.web.client.RestTemplate".to_string(),
            rest_call_methods: None,
            accumulator_types: strings(&["java.lang.StringBuilder", "java.lang.StringBuffer"]),
            append_methods: strings(&["append"]),
            finisher_methods: strings(&["toString"]),
            endpoint_markers,
            base_package: None,
            excluded_packages: strings(&["org.graalvm", "com.oracle", "jdk.vm"]),
            extract_rest_calls: true,
            max_depth: DEFAULT_MAX_DEPTH,
            parallel: false,
        }
    }
}

impl ExtractionSettings {
    /// Loads settings; the format is chosen by extension
    pub fn load(path: &Path) -> Result<Self> {
        let format = FileFormat::from_path(path)?;
        let content = std::fs::read_to_string(path)?;
        let settings: Self = format.parse(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            return Err(ExtractorError::Config("max_depth must be at least 1".to_string()));
        }
        if self.rest_call_prefix.is_empty() {
            return Err(ExtractorError::Config(
                "rest_call_prefix must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether a declaration passes the package filters
    pub fn includes(&self, qualified_name: &str) -> bool {
        if self
            .excluded_packages
            .iter()
            .any(|p| qualified_name.starts_with(p.as_str()))
        {
            return false;
        }
        match &self.base_package {
            Some(base) => qualified_name.starts_with(base.as_str()),
            None => true,
        }
    }
}
