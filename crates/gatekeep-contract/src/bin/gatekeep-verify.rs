//! Offline authorization contract verifier.
//!
//! Diffs the contract registry against the enforcement calls in the service
//! sources and checks the mutation-audit rule. Exits non-zero on any finding.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use gatekeep_contract::{verify_workspace, ContractRegistry, HandlerManifest, DEFAULT_SERVICES_DIR};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gatekeep-verify")]
#[command(about = "Verify that service code enforces the declared authorization contracts", long_about = None)]
struct Cli {
    /// Workspace root
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Service sources checked by the mutation-audit rule, relative to the root
    #[arg(long, default_value = DEFAULT_SERVICES_DIR)]
    services: PathBuf,

    /// Contract registry to use instead of the built-in one
    #[arg(long)]
    registry: Option<PathBuf>,

    /// Handler manifest to use instead of the built-in one
    #[arg(long)]
    manifest: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let registry = match &cli.registry {
        Some(path) => ContractRegistry::from_toml_str(&read(path)?)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ContractRegistry::builtin()?,
    };
    let manifest = match &cli.manifest {
        Some(path) => HandlerManifest::from_toml_str(&read(path)?)
            .with_context(|| format!("loading {}", path.display()))?,
        None => HandlerManifest::builtin()?,
    };

    let report = verify_workspace(&cli.root, &registry, &manifest, &cli.services)?;

    match cli.format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        Format::Text => {
            for finding in &report.findings {
                println!("{finding}");
            }
            println!(
                "{} operations checked, {} service methods scanned, {} findings",
                report.operations_checked,
                report.methods_scanned,
                report.findings.len()
            );
        }
    }

    Ok(if report.is_clean() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}
