//! Exit status and output of the `dataact-check` binary.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn workspace(rel: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join(rel)
}

fn run(extra: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_dataact-check"))
        .env_remove("RUST_LOG")
        .arg("--base-ontology")
        .arg(workspace("data/data_act_ontology.ttl"))
        .arg("--queries")
        .arg(workspace("data/queries"))
        .arg("--contracts")
        .arg(workspace("data/contracts"))
        .args(extra)
        .output()
        .unwrap()
}

fn path_arg(rel: &str) -> String {
    workspace(rel).to_string_lossy().into_owned()
}

/// A non-compliant verdict alone does not fail the run.
#[test]
fn violations_exit_zero_by_default() {
    let contract = path_arg("data/contracts/b2c-smart-thermostat.owl");
    let output = run(&["--contract", &contract]);
    assert_eq!(output.status.code(), Some(0));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("EU DATA ACT COMPLIANCE CHECK"));
    assert!(stdout.contains("COMPLIANCE REPORT: B2c Smart Thermostat"));
    assert!(stdout.contains("Overall: NON-COMPLIANT"));
    assert!(stdout.contains("Status: FAIL (2 violations)"));
}

#[test]
fn fail_on_violation_exits_two() {
    let contract = path_arg("data/contracts/b2c-smart-thermostat.owl");
    let output = run(&["--contract", &contract, "--fail-on-violation"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stdout).contains("Overall: NON-COMPLIANT"));
}

#[test]
fn fail_on_violation_passes_compliant_contract() {
    let contract = path_arg("data/contracts/b2g-flood-response.ttl");
    let output = run(&["--contract", &contract, "--fail-on-violation"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("Overall: COMPLIANT"));
}

/// Query syntax errors fail the run with status 1 and no report.
#[test]
fn bad_query_exits_one() {
    let contract = path_arg("data/contracts/b2c-smart-thermostat.owl");
    let query = path_arg("checker/tests/fixtures/bad-syntax.sparql");
    let output = run(&["--contract", &contract, "--query", &query]);
    assert_eq!(output.status.code(), Some(1));
    assert!(!String::from_utf8_lossy(&output.stdout).contains("COMPLIANCE REPORT"));
    assert!(!output.stderr.is_empty());
}

#[test]
fn missing_contract_exits_one() {
    let contract = path_arg("data/contracts/does-not-exist.ttl");
    let output = run(&["--contract", &contract]);
    assert_eq!(output.status.code(), Some(1));
}

/// Without `--contract` every bundled scenario is checked and summarised.
#[test]
fn directory_run_prints_summary() {
    let output = run(&[]);
    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("COMPLIANCE SUMMARY - ALL CONTRACTS"));
    assert!(stdout.contains("Total Contracts: 3"));
}
