//! The compliance pipeline: load base ontology, load contract, merge, run the
//! applicable queries, collect a report.

use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::CheckerConfig;
use crate::error::{require_exists, Result};
use crate::query::{QueryFile, QueryRunner};
use crate::report::{CheckResult, ContractReport, Row};
use crate::scenario::{
    applicable_checks, detect_contract_type, discover_contracts, display_name, ContractType,
};
use crate::store::{merge, OntologyGraph};

const UNKNOWN_TYPE_NOTE: &str = "Could not determine contract type (B2C/B2B/B2G); no article checks apply";

/// Runs Data Act compliance checks against contract ontologies.
///
/// The base ontology is parsed once; every contract is merged with it into a
/// fresh graph that lives only for that contract's checks.
#[derive(Debug)]
pub struct ComplianceChecker {
    config: CheckerConfig,
    base: OntologyGraph,
}

impl ComplianceChecker {
    /// Validates the configured paths and loads the base ontology.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::FileNotFound`] if the base ontology or the
    /// queries directory is missing and [`crate::Error::Parse`] if the base
    /// ontology is malformed.
    pub fn new(config: CheckerConfig) -> Result<Self> {
        require_exists(&config.base_ontology)?;
        require_exists(&config.queries_dir)?;
        let base = OntologyGraph::load(&config.base_ontology)?;
        tracing::info!(
            path = %config.base_ontology.display(),
            triples = base.len(),
            "loaded base ontology"
        );
        Ok(Self { config, base })
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    /// The parsed base ontology.
    #[must_use]
    pub fn base(&self) -> &OntologyGraph {
        &self.base
    }

    /// Loads a contract and merges it with the base ontology.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::FileNotFound`] or [`crate::Error::Parse`] if
    /// the contract cannot be loaded.
    pub fn load_contract(&self, path: &Path) -> Result<OntologyGraph> {
        let contract = OntologyGraph::load(path)?;
        Ok(merge(&self.base, &contract))
    }

    /// Runs every check that applies to the contract's detected type.
    ///
    /// A contract whose type cannot be detected yields a report with no
    /// checks and an explanatory note.
    ///
    /// # Errors
    ///
    /// Fails on the first load, parse, or query error.
    pub fn check_contract(&self, path: &Path, name: Option<&str>) -> Result<ContractReport> {
        let (mut report, runner) = self.prepare(path, name)?;
        let checks = applicable_checks(report.contract_type);
        if checks.is_empty() {
            tracing::warn!(contract = %path.display(), "unknown contract type");
            report.note = Some(UNKNOWN_TYPE_NOTE.to_string());
            return Ok(report);
        }
        for check in checks {
            let query = QueryFile::load(self.config.queries_dir.join(check.query_file))?;
            report
                .checks
                .push(run_check(&runner, check.article_id, check.article_name, &query)?);
        }
        Ok(report)
    }

    /// Runs a single ad-hoc query file against a contract.
    ///
    /// # Errors
    ///
    /// Fails on the first load, parse, or query error.
    pub fn run_query(&self, path: &Path, query_path: &Path) -> Result<ContractReport> {
        let query = QueryFile::load(query_path)?;
        let (mut report, runner) = self.prepare(path, None)?;
        let id = query.name();
        report
            .checks
            .push(run_check(&runner, &id, "Ad-hoc query", &query)?);
        Ok(report)
    }

    /// Checks each contract in order, stopping at the first error.
    ///
    /// # Errors
    ///
    /// Propagates the first failing contract's error.
    pub fn check_contracts(&self, paths: &[PathBuf]) -> Result<Vec<ContractReport>> {
        paths
            .iter()
            .map(|path| self.check_contract(path, None))
            .collect()
    }

    /// Runs one ad-hoc query against each contract, stopping at the first error.
    ///
    /// # Errors
    ///
    /// Propagates the first failing contract's error.
    pub fn query_contracts(
        &self,
        paths: &[PathBuf],
        query_path: &Path,
    ) -> Result<Vec<ContractReport>> {
        paths
            .iter()
            .map(|path| self.run_query(path, query_path))
            .collect()
    }

    /// Checks every contract document found directly inside `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::FileNotFound`] if `dir` is missing, otherwise
    /// the first contract error.
    pub fn check_directory(&self, dir: &Path) -> Result<Vec<ContractReport>> {
        self.check_contracts(&discover_contracts(dir)?)
    }

    /// Checks the built-in scenario set (the configured contracts directory).
    ///
    /// # Errors
    ///
    /// Same as [`ComplianceChecker::check_directory`].
    pub fn check_default_scenarios(&self) -> Result<Vec<ContractReport>> {
        self.check_directory(&self.config.contracts_dir)
    }

    fn prepare(&self, path: &Path, name: Option<&str>) -> Result<(ContractReport, QueryRunner)> {
        let graph = self.load_contract(path)?;
        let runner = QueryRunner::new(&graph)?;
        let name = name.map_or_else(|| display_name(path), str::to_string);
        let mut report = ContractReport::new(name, path);
        report.total_triples = graph.len();
        report.contract_type = detect_contract_type(&runner, Some(path))?;
        tracing::info!(
            contract = %path.display(),
            contract_type = %report.contract_type,
            triples = report.total_triples,
            "contract loaded"
        );
        if report.contract_type == ContractType::Unknown {
            tracing::debug!(contract = %path.display(), "no data-sharing individual found");
        }
        Ok((report, runner))
    }
}

fn run_check(
    runner: &QueryRunner,
    article_id: &str,
    article_name: &str,
    query: &QueryFile,
) -> Result<CheckResult> {
    let started = Instant::now();
    let matches = runner
        .select_file(query)?
        .map(|binding| binding.map(|b| b.to_row()))
        .collect::<Result<Vec<Row>>>()?;
    let execution_time_ms = started.elapsed().as_secs_f64() * 1000.0;
    tracing::info!(
        article = article_id,
        outcome = %query.outcome,
        matches = matches.len(),
        elapsed_ms = execution_time_ms,
        "check finished"
    );
    Ok(CheckResult {
        article_id: article_id.to_string(),
        article_name: article_name.to_string(),
        outcome: query.outcome,
        matches,
        execution_time_ms,
    })
}
