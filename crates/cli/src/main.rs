//! apibind CLI
//!
//! Command-line interface for inspecting OpenAPI specifications and binding
//! endpoint parameters.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use apibind_core::{CallerInput, EndpointCollection};
use apibind_parser::SpecDocument;
use serde_json::Value;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "apibind")]
#[command(version, about = "Build typed endpoint collections from OpenAPI specifications", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a spec file and display the extracted endpoints
    #[command(after_help = "EXAMPLES:\n  \
        # Parse a JSON spec\n  \
        apibind parse --spec petstore.json\n\n  \
        # Parse a YAML spec with parameter detail\n  \
        apibind parse --spec petstore.yaml --verbose")]
    Parse {
        /// Path to the spec file
        #[arg(short, long)]
        spec: PathBuf,

        /// Spec format (auto-detected if not specified)
        #[arg(short, long)]
        format: Option<SpecFormat>,
    },

    /// List the endpoint keys a spec file produces
    List {
        /// Path to the spec file
        #[arg(short, long)]
        spec: PathBuf,

        /// Spec format (auto-detected if not specified)
        #[arg(short, long)]
        format: Option<SpecFormat>,
    },

    /// Bind an endpoint's parameters and print the resulting request
    #[command(after_help = "EXAMPLES:\n  \
        apibind bind \\\n    \
        --spec petstore.json \\\n    \
        --key /pets/{pet_id} \\\n    \
        --path-param pet_id=7 \\\n    \
        --param format=json")]
    Bind {
        /// Path to the spec file
        #[arg(short, long)]
        spec: PathBuf,

        /// Spec format (auto-detected if not specified)
        #[arg(short, long)]
        format: Option<SpecFormat>,

        /// Endpoint key (raw path, or method:path for multi-method paths)
        #[arg(short, long)]
        key: String,

        /// Query parameter as name=value (repeatable)
        #[arg(long = "param", value_name = "NAME=VALUE")]
        params: Vec<String>,

        /// Path parameter as name=value (repeatable)
        #[arg(long = "path-param", value_name = "NAME=VALUE")]
        path_params: Vec<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SpecFormat {
    /// JSON document
    Json,
    /// YAML document
    Yaml,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Parse { spec, format } => parse_command(&spec, format, cli.verbose),
        Commands::List { spec, format } => list_command(&spec, format),
        Commands::Bind {
            spec,
            format,
            key,
            params,
            path_params,
        } => bind_command(&spec, format, &key, &params, &path_params),
    }
}

fn parse_command(spec_path: &Path, format: Option<SpecFormat>, verbose: bool) -> Result<()> {
    let collection = load_collection(spec_path, format)?;

    println!("\n{}", "✓ Parse successful!".green().bold());
    println!("\n{}", "Endpoints:".bold());
    for (key, endpoint) in collection.list() {
        println!(
            "  • {} {}",
            endpoint.method().to_string().to_uppercase().yellow(),
            key.cyan()
        );
        if !endpoint.description().is_empty() {
            println!("    {}", endpoint.description());
        }
        if verbose {
            for (name, spec) in endpoint.path_params() {
                println!(
                    "    path  {} (required: {}, default: {})",
                    name,
                    spec.required,
                    render_default(&spec.default)
                );
            }
            for (name, spec) in endpoint.query_params() {
                println!(
                    "    query {} (required: {}, default: {})",
                    name,
                    spec.required,
                    render_default(&spec.default)
                );
            }
        }
    }

    report_diagnostics(&collection);
    Ok(())
}

fn list_command(spec_path: &Path, format: Option<SpecFormat>) -> Result<()> {
    let collection = load_collection(spec_path, format)?;
    for key in collection.keys() {
        println!("{}", key);
    }
    Ok(())
}

fn bind_command(
    spec_path: &Path,
    format: Option<SpecFormat>,
    key: &str,
    params: &[String],
    path_params: &[String],
) -> Result<()> {
    let mut collection = load_collection(spec_path, format)?;

    let mut caller = CallerInput::new();
    for pair in params {
        let (name, value) = split_pair(pair)?;
        caller = caller.param(name, value);
    }
    for pair in path_params {
        let (name, value) = split_pair(pair)?;
        caller = caller.path_param(name, value);
    }

    let binding = collection
        .bind(key, &caller)
        .with_context(|| format!("Failed to bind endpoint '{}'", key))?;

    println!("\n{}", "✓ Bound request:".green().bold());
    println!(
        "  {} {}",
        binding.request.method.to_string().to_uppercase().yellow(),
        binding.request.path.cyan()
    );
    for (name, value) in &binding.request.query {
        println!("  ? {}={}", name, value);
    }

    for warning in &binding.warnings {
        eprintln!("{} {}", "⚠".yellow(), warning);
    }
    Ok(())
}

fn load_collection(spec_path: &Path, format: Option<SpecFormat>) -> Result<EndpointCollection> {
    println!("{} Parsing spec file: {}", "→".cyan(), spec_path.display());

    let document = match format {
        Some(SpecFormat::Json) => {
            let content = std::fs::read_to_string(spec_path)
                .with_context(|| format!("Failed to read {}", spec_path.display()))?;
            SpecDocument::from_json(&content)
        }
        Some(SpecFormat::Yaml) => {
            let content = std::fs::read_to_string(spec_path)
                .with_context(|| format!("Failed to read {}", spec_path.display()))?;
            SpecDocument::from_yaml(&content)
        }
        None => SpecDocument::from_file(spec_path),
    }
    .context("Failed to parse spec")?;

    Ok(EndpointCollection::from_spec(&document))
}

fn report_diagnostics(collection: &EndpointCollection) {
    if collection.diagnostics().is_empty() {
        return;
    }
    println!("\n{}", "Diagnostics:".bold());
    for diagnostic in collection.diagnostics() {
        println!("  {} {}", "⚠".yellow(), diagnostic);
    }
}

/// Split a name=value argument; the value stays a JSON string
fn split_pair(pair: &str) -> Result<(String, Value)> {
    match pair.split_once('=') {
        Some((name, value)) if !name.is_empty() => {
            Ok((name.to_string(), Value::String(value.to_string())))
        }
        _ => anyhow::bail!("Expected NAME=VALUE, got '{}'", pair),
    }
}

fn render_default(default: &Option<Value>) -> String {
    match default {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => "none".to_string(),
    }
}
