//! `dataact-check` — Runs EU Data Act compliance queries against contract ontologies.
//!
//! Each contract is merged with the Data Act base ontology and evaluated with
//! the SPARQL queries that apply to its type (B2C, B2B, B2G), or with a single
//! query given on the command line. Results are printed as a plain-text report.
//!
//! **Usage:**
//! ```text
//! dataact-check [--contract <path>] [--query <path>] [--config <file>]
//!               [--base-ontology <path>] [--queries <dir>] [--contracts <dir>]
//!               [--verbose] [--json <path>] [--export] [--fail-on-violation]
//! ```
//!
//! Without `--contract`, every contract in the contracts directory is checked.
//! Exits non-zero when a document or query cannot be loaded, parsed, or run.
//! Verdicts do not affect the exit code unless `--fail-on-violation` is set.

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use dataact_compliance::report::{
    default_export_path, export_json, render_report, render_summary,
};
use dataact_compliance::scenario::discover_contracts;
use dataact_compliance::{CheckerConfig, ComplianceChecker, ContractReport};
use tracing_subscriber::EnvFilter;

/// Check contract ontologies against the EU Data Act.
#[derive(Parser)]
#[command(
    name = "dataact-check",
    about = "Run EU Data Act compliance queries against contract ontologies"
)]
struct Args {
    /// Contract ontology to check (default: every contract in the contracts directory).
    #[arg(long)]
    contract: Option<PathBuf>,

    /// SPARQL query file to run instead of the built-in article checks.
    #[arg(long)]
    query: Option<PathBuf>,

    /// TOML file with `base_ontology`, `queries_dir`, `contracts_dir`, `reports_dir`.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Data Act base ontology (overrides the configuration).
    #[arg(long)]
    base_ontology: Option<PathBuf>,

    /// Directory holding the article query files (overrides the configuration).
    #[arg(long)]
    queries: Option<PathBuf>,

    /// Directory scanned for contracts (overrides the configuration).
    #[arg(long)]
    contracts: Option<PathBuf>,

    /// List every matched row in the report.
    #[arg(long, short)]
    verbose: bool,

    /// Write the reports as JSON to this path.
    #[arg(long)]
    json: Option<PathBuf>,

    /// Write the reports as JSON to the dated file in the reports directory.
    #[arg(long)]
    export: bool,

    /// Exit with status 2 when any contract is non-compliant.
    #[arg(long)]
    fail_on_violation: bool,
}

impl Args {
    fn checker_config(&self) -> Result<CheckerConfig> {
        let mut config = match &self.config {
            Some(path) => CheckerConfig::from_toml_file(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?,
            None => CheckerConfig::default(),
        };
        if let Some(path) = &self.base_ontology {
            config.base_ontology = path.clone();
        }
        if let Some(dir) = &self.queries {
            config.queries_dir = dir.clone();
        }
        if let Some(dir) = &self.contracts {
            config.contracts_dir = dir.clone();
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let checker = ComplianceChecker::new(args.checker_config()?)
        .context("Failed to initialise the compliance checker")?;

    let contracts = match &args.contract {
        Some(path) => vec![path.clone()],
        None => discover_contracts(&checker.config().contracts_dir)?,
    };
    if contracts.is_empty() {
        println!(
            "No contract files found in {}",
            checker.config().contracts_dir.display()
        );
        return Ok(());
    }

    let reports: Vec<ContractReport> = match &args.query {
        Some(query) => checker.query_contracts(&contracts, query)?,
        None => checker.check_contracts(&contracts)?,
    };

    println!("EU DATA ACT COMPLIANCE CHECK");
    println!();
    for report in &reports {
        print!("{}", render_report(report, args.verbose));
        println!();
    }
    if reports.len() > 1 {
        print!("{}", render_summary(&reports));
    }

    if let Some(path) = &args.json {
        export_json(&reports, path)?;
        println!("Report exported to: {}", path.display());
    }
    if args.export {
        let path = default_export_path(
            &checker.config().reports_dir,
            chrono::Local::now().date_naive(),
        );
        export_json(&reports, &path)?;
        println!("Report exported to: {}", path.display());
    }

    let non_compliant = reports.iter().filter(|r| !r.overall_compliant()).count();
    if args.fail_on_violation && non_compliant > 0 {
        eprintln!("{non_compliant} contract(s) are non-compliant.");
        process::exit(2);
    }
    Ok(())
}

/// Logs go to stderr so stdout carries only the report. `RUST_LOG` overrides
/// the default `warn` level.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
