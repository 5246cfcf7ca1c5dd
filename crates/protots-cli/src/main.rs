//! protots command-line tool.

use std::path::PathBuf;

use clap::Parser;
use protots_codegen::{render_templates, CodegenError, Template};
use protots_parser::{load, ParseOptions};
use tracing_subscriber::EnvFilter;

mod config;

use config::{Config, FileConfig};

#[derive(Parser)]
#[command(name = "protots")]
#[command(author, version, about = "Generate TypeScript declarations from proto files", long_about = None)]
struct Cli {
    /// Proto entry files
    files: Vec<PathBuf>,

    /// Output directory
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Directory to search for imported files (repeatable)
    #[arg(short = 'I', long = "proto-path")]
    proto_paths: Vec<PathBuf>,

    /// Template to run (repeatable; defaults to all)
    #[arg(short, long = "template")]
    templates: Vec<String>,

    /// JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Keep original field-name casing instead of lowerCamelCase
    #[arg(long)]
    keep_case: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let file_config = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| format!("cannot read config '{}': {e}", path.display()))?;
            serde_json::from_str::<FileConfig>(&text)
                .map_err(|e| format!("invalid config '{}': {e}", path.display()))?
        }
        None => FileConfig::default(),
    };

    let config = Config::merge(
        file_config,
        cli.files,
        cli.proto_paths,
        cli.out,
        cli.templates,
        cli.keep_case,
    );

    tracing::debug!(?config, "merged configuration");

    if config.files.is_empty() {
        return Err("no input files; pass proto files or list them in the config".into());
    }

    let templates = config
        .templates
        .iter()
        .map(|name| {
            protots_codegen::template_by_name(name)
                .ok_or_else(|| CodegenError::UnknownTemplate(name.clone()))
        })
        .collect::<Result<Vec<&dyn Template>, _>>()?;

    let options = ParseOptions {
        keep_case: config.keep_case,
    };

    let root = match load(&config.files, &config.proto_paths, &options) {
        Ok(root) => root,
        Err(e) => {
            e.report();
            return Err("loading failed".into());
        }
    };

    let files = render_templates(&root, &templates)?;
    files.write_to(&config.out)?;

    println!("Generated {} files to {}", files.len(), config.out.display());
    for path in files.paths() {
        println!("  - {}", path);
    }

    Ok(())
}
