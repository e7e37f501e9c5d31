//! Compliance report types, the plain-text formatter, and the JSON export.
//!
//! Classification of a row is fixed by the query that produced it (see
//! [`Outcome`]); nothing here inspects row contents to decide a verdict.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDate};
use serde::{Serialize, Serializer};

use crate::error::{Error, Result};
use crate::query::Outcome;
use crate::scenario::ContractType;

const RULE: &str =
    "================================================================================";
const THIN_RULE: &str =
    "--------------------------------------------------------------------------------";

/// Variables printed first, in this order, when listing a match.
const LEAD_VARIABLES: [&str; 2] = ["violationType", "details"];

/// A single result row rendered as `variable -> value`, in the query's
/// projection order. Serializes as a JSON object with keys in that order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row(Vec<(String, String)>);

impl Row {
    /// The value bound to `variable`.
    #[must_use]
    pub fn get(&self, variable: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(name, _)| name == variable)
            .map(|(_, value)| value.as_str())
    }

    /// Iterates over `(variable, value)` pairs in projection order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Number of bound variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no variable is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

/// The result of running one query against one contract.
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    /// Article reference (or query file stem for ad-hoc queries).
    pub article_id: String,
    /// Human-readable provision name.
    pub article_name: String,
    /// Outcome class of every row in `matches`.
    pub outcome: Outcome,
    /// Rows returned by the query.
    pub matches: Vec<Row>,
    /// Wall-clock time spent evaluating the query.
    pub execution_time_ms: f64,
}

impl CheckResult {
    /// False only for a `violated` check that returned rows.
    #[must_use]
    pub fn compliant(&self) -> bool {
        self.outcome != Outcome::Violated || self.matches.is_empty()
    }

    /// Number of violations found by this check.
    #[must_use]
    pub fn violation_count(&self) -> usize {
        self.count_of(Outcome::Violated)
    }

    fn count_of(&self, outcome: Outcome) -> usize {
        if self.outcome == outcome {
            self.matches.len()
        } else {
            0
        }
    }
}

/// All checks run against one contract.
#[derive(Debug, Clone, Serialize)]
pub struct ContractReport {
    /// Display name of the contract.
    pub contract_name: String,
    /// Path of the contract document.
    pub contract_path: PathBuf,
    /// Detected contract type.
    pub contract_type: ContractType,
    /// When the report was produced.
    pub timestamp: DateTime<Local>,
    /// Triples in the merged graph (base ontology plus contract).
    pub total_triples: usize,
    /// Checks in execution order.
    pub checks: Vec<CheckResult>,
    /// Set when no check could be selected for the contract.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ContractReport {
    /// Starts an empty report.
    #[must_use]
    pub fn new(contract_name: impl Into<String>, contract_path: impl Into<PathBuf>) -> Self {
        Self {
            contract_name: contract_name.into(),
            contract_path: contract_path.into(),
            contract_type: ContractType::Unknown,
            timestamp: Local::now(),
            total_triples: 0,
            checks: Vec::new(),
            note: None,
        }
    }

    /// True when the contract was checked and no `violated` check returned
    /// rows. A report carrying a [`note`](Self::note) was never checked and
    /// is not compliant.
    #[must_use]
    pub fn overall_compliant(&self) -> bool {
        self.note.is_none() && self.checks.iter().all(CheckResult::compliant)
    }

    /// Violations across all checks.
    #[must_use]
    pub fn total_violations(&self) -> usize {
        self.checks.iter().map(CheckResult::violation_count).sum()
    }

    /// Fulfilled obligations across all checks.
    #[must_use]
    pub fn fulfilled_count(&self) -> usize {
        self.checks.iter().map(|c| c.count_of(Outcome::Fulfilled)).sum()
    }

    /// Pending obligations across all checks.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.checks.iter().map(|c| c.count_of(Outcome::Pending)).sum()
    }
}

/// Renders one contract report.
///
/// With `verbose`, every matched row is listed with `violationType` and
/// `details` first and the remaining variables after them.
#[must_use]
pub fn render_report(report: &ContractReport, verbose: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "COMPLIANCE REPORT: {}", report.contract_name);
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "Contract Path: {}", report.contract_path.display());
    let _ = writeln!(out, "Contract Type: {}", report.contract_type);
    let _ = writeln!(
        out,
        "Timestamp: {}",
        report.timestamp.format("%Y-%m-%d %H:%M:%S")
    );
    let _ = writeln!(out, "Total Triples: {}", report.total_triples);

    if let Some(note) = &report.note {
        let _ = writeln!(out);
        let _ = writeln!(out, "NOTE: {note}");
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Compliance Status:");
    let overall = if report.note.is_some() {
        "NOT CHECKED"
    } else if report.overall_compliant() {
        "COMPLIANT"
    } else {
        "NON-COMPLIANT"
    };
    let _ = writeln!(out, "   Overall: {overall}");
    let _ = writeln!(out, "   Total Checks: {}", report.checks.len());
    let _ = writeln!(out, "   Violated: {}", report.total_violations());
    let _ = writeln!(out, "   Fulfilled: {}", report.fulfilled_count());
    let _ = writeln!(out, "   Pending: {}", report.pending_count());

    if !report.checks.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Article Checks:");
        let _ = writeln!(out, "{THIN_RULE}");
    }
    for check in &report.checks {
        render_check(&mut out, check, verbose);
    }
    let _ = writeln!(out, "{RULE}");
    out
}

fn render_check(out: &mut String, check: &CheckResult, verbose: bool) {
    let status = match (check.outcome, check.matches.len()) {
        (Outcome::Violated, 0) => "PASS".to_string(),
        (Outcome::Violated, n) => format!("FAIL ({n} violations)"),
        (Outcome::Fulfilled, n) => format!("FULFILLED ({n} obligations met)"),
        (Outcome::Pending, 0) => "NOTHING PENDING".to_string(),
        (Outcome::Pending, n) => format!("PENDING ({n} open)"),
    };
    let _ = writeln!(out);
    let _ = writeln!(out, "[{}] Article {}: {}", check.outcome, check.article_id, check.article_name);
    let _ = writeln!(out, "   Status: {status}");
    let _ = writeln!(out, "   Execution Time: {:.2}ms", check.execution_time_ms);

    if !verbose || check.matches.is_empty() {
        return;
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "   Matches:");
    for (i, row) in check.matches.iter().enumerate() {
        let kind = row.get("violationType").unwrap_or("UNKNOWN");
        let details = row.get("details").unwrap_or("No details");
        let _ = writeln!(out, "   [{}] {kind}", i + 1);
        let _ = writeln!(out, "       {details}");
        for (key, value) in row.iter().filter(|(k, _)| !LEAD_VARIABLES.contains(k)) {
            let _ = writeln!(out, "       {key}: {value}");
        }
    }
}

/// Renders the summary across several contract reports.
#[must_use]
pub fn render_summary(reports: &[ContractReport]) -> String {
    let mut out = String::new();
    let total = reports.len();
    let compliant = reports.iter().filter(|r| r.overall_compliant()).count();
    let checks: usize = reports.iter().map(|r| r.checks.len()).sum();
    let violations: usize = reports.iter().map(ContractReport::total_violations).sum();
    let percent = if total == 0 {
        0.0
    } else {
        compliant as f64 / total as f64 * 100.0
    };

    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "COMPLIANCE SUMMARY - ALL CONTRACTS");
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "Statistics:");
    let _ = writeln!(out, "   Total Contracts: {total}");
    let _ = writeln!(out, "   Compliant: {compliant} ({percent:.1}%)");
    let _ = writeln!(out, "   Non-Compliant: {}", total - compliant);
    let _ = writeln!(out, "   Total Article Checks: {checks}");
    let _ = writeln!(out, "   Total Violations: {violations}");
    let _ = writeln!(out);
    let _ = writeln!(out, "Contract Details:");
    let _ = writeln!(out, "{THIN_RULE}");

    for report in reports {
        let status = if report.overall_compliant() { "OK " } else { "NOK" };
        let _ = writeln!(out, "[{status}] {}", report.contract_name);
        let _ = writeln!(out, "      Type: {}", report.contract_type);
        let _ = writeln!(out, "      Violations: {}", report.total_violations());
        if let Some(note) = &report.note {
            let _ = writeln!(out, "      Note: {note}");
        }
        for check in &report.checks {
            let _ = writeln!(
                out,
                "      Article {} [{}]: {} match(es)",
                check.article_id,
                check.outcome,
                check.matches.len()
            );
        }
    }

    let _ = writeln!(out, "{THIN_RULE}");
    if compliant == total {
        let _ = writeln!(out, "OVERALL STATUS: ALL CONTRACTS COMPLIANT");
    } else {
        let _ = writeln!(
            out,
            "OVERALL STATUS: {} CONTRACT(S) NEED ATTENTION",
            total - compliant
        );
    }
    out
}

/// Top-level JSON document written by [`export_json`].
#[derive(Debug, Serialize)]
pub struct SummaryExport<'a> {
    /// When the export was produced.
    pub timestamp: DateTime<Local>,
    /// Number of contracts checked.
    pub total_contracts: usize,
    /// Number of compliant contracts.
    pub compliant_contracts: usize,
    /// Violations across all contracts.
    pub total_violations: usize,
    /// Per-contract reports.
    pub reports: &'a [ContractReport],
}

impl<'a> SummaryExport<'a> {
    /// Aggregates `reports`.
    #[must_use]
    pub fn new(reports: &'a [ContractReport]) -> Self {
        Self {
            timestamp: Local::now(),
            total_contracts: reports.len(),
            compliant_contracts: reports.iter().filter(|r| r.overall_compliant()).count(),
            total_violations: reports.iter().map(ContractReport::total_violations).sum(),
            reports,
        }
    }
}

/// Writes the reports as pretty-printed JSON, creating parent directories.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file or its directory cannot be written.
pub fn export_json(reports: &[ContractReport], path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(&SummaryExport::new(reports)).map_err(|e| Error::Io {
        path: path.to_path_buf(),
        source: e.into(),
    })?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| Error::from_io(parent, e))?;
    }
    std::fs::write(path, json).map_err(|e| Error::from_io(path, e))?;
    tracing::info!(path = %path.display(), reports = reports.len(), "exported JSON report");
    Ok(())
}

/// `dir/compliance-report-YYYY-MM-DD.json`.
#[must_use]
pub fn default_export_path(dir: &Path, date: NaiveDate) -> PathBuf {
    dir.join(format!("compliance-report-{}.json", date.format("%Y-%m-%d")))
}
