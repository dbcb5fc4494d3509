use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use archscope::config::{ConfigDocument, ExtractionSettings};
use archscope::error::{ExtractorError, Result};
use archscope::{Extractor, Module, SnapshotCatalog};

#[derive(Parser)]
#[command(name = "archscope")]
#[command(about = "Recover an architecture model from a program analysis snapshot")]
#[command(version)]
#[command(after_long_help = r#"
EXAMPLES:
    # Extract the module model and print it as JSON
    archscope extract --catalog snapshot.json --config application.yml

    # Restrict analysis to one package and write YAML to a file
    archscope extract --catalog snapshot.yml --base-package com.acme --format yaml --output model.yml

    # Show how each declaration is classified
    archscope classify --catalog snapshot.json

    # Look up one configuration key
    archscope config --config application.yml services.orders.url
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to an extraction settings file (YAML, TOML or JSON)
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract entities, services, controllers, endpoints and REST calls
    Extract {
        /// Path to the catalog snapshot
        #[arg(long)]
        catalog: PathBuf,

        /// Path to the application configuration document
        #[arg(long)]
        config: Option<PathBuf>,

        /// Module name (overrides settings)
        #[arg(long)]
        module: Option<String>,

        /// Only analyse declarations under this package
        #[arg(long)]
        base_package: Option<String>,

        /// Write the model to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format (json or yaml)
        #[arg(long, default_value = "json")]
        format: String,

        /// Skip REST call extraction
        #[arg(long)]
        no_rest_calls: bool,

        /// Shard declarations across worker threads
        #[arg(long)]
        parallel: bool,
    },

    /// Print the role of every analysed declaration
    Classify {
        /// Path to the catalog snapshot
        #[arg(long)]
        catalog: PathBuf,

        /// Also list declarations without a role
        #[arg(long)]
        all: bool,
    },

    /// Resolve a dotted key against a configuration document
    Config {
        /// Path to the configuration document
        #[arg(long)]
        config: PathBuf,

        /// Dotted key path, e.g. services.orders.url
        key: String,
    },
}

pub fn load_settings(path: Option<&Path>) -> Result<ExtractionSettings> {
    match path {
        Some(path) => ExtractionSettings::load(path),
        None => Ok(ExtractionSettings::default()),
    }
}

fn load_config(path: Option<&Path>) -> Result<ConfigDocument> {
    match path {
        Some(path) => ConfigDocument::load(path),
        None => Ok(ConfigDocument::empty()),
    }
}

#[allow(clippy::too_many_arguments)]
pub fn extract(
    settings_path: Option<&Path>,
    catalog_path: &Path,
    config_path: Option<&Path>,
    module: Option<String>,
    base_package: Option<String>,
    output: Option<&Path>,
    format: &str,
    no_rest_calls: bool,
    parallel: bool,
) -> Result<()> {
    let mut settings = load_settings(settings_path)?;
    if let Some(module) = module {
        settings.module_name = module;
    }
    if base_package.is_some() {
        settings.base_package = base_package;
    }
    if no_rest_calls {
        settings.extract_rest_calls = false;
    }
    settings.parallel |= parallel;

    let catalog = SnapshotCatalog::load(catalog_path)?;
    let config = load_config(config_path)?;
    let module = Extractor::new(settings, config).run(&catalog)?;

    let serialized = serialize_module(&module, format)?;
    match output {
        Some(path) => {
            fs::write(path, serialized)?;
            eprintln!("Wrote module {} to {}", module.name(), path.display());
        }
        None => println!("{}", serialized),
    }

    Ok(())
}

fn serialize_module(module: &Module, format: &str) -> Result<String> {
    match format {
        "json" => Ok(serde_json::to_string_pretty(module)?),
        "yaml" | "yml" => Ok(serde_yaml::to_string(module)?),
        other => Err(ExtractorError::UnsupportedFormat(other.to_string())),
    }
}

pub fn classify(settings_path: Option<&Path>, catalog_path: &Path, all: bool) -> Result<()> {
    let settings = load_settings(settings_path)?;
    let catalog = SnapshotCatalog::load(catalog_path)?;
    let results = Extractor::new(settings, ConfigDocument::empty()).classify(&catalog)?;

    let mut classified = 0;
    for result in &results {
        match result.role {
            Some(role) => {
                classified += 1;
                println!("{:<12} {}", role.as_str(), result.name);
            }
            None if all => println!("{:<12} {}", "-", result.name),
            None => {}
        }
    }

    println!(
        "\n{} of {} declarations classified",
        classified,
        results.len()
    );
    Ok(())
}

pub fn resolve_config(config_path: &Path, key: &str) -> Result<()> {
    let document = ConfigDocument::load(config_path)?;
    match document.resolve(key) {
        Some(value) => println!("{}", value),
        None => println!("{}: unresolved", key),
    }
    Ok(())
}
