//! End-to-end runs of the bundled scenario set.

use std::path::{Path, PathBuf};

use dataact_compliance::report::render_summary;
use dataact_compliance::{
    CheckerConfig, ComplianceChecker, ContractReport, ContractType, Error, Outcome, QueryFile,
    QueryRunner,
};

fn workspace() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("..")
}

fn fixture(rel: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(rel)
}

fn checker() -> ComplianceChecker {
    ComplianceChecker::new(CheckerConfig::default().rooted_at(&workspace())).unwrap()
}

fn contract(name: &str) -> PathBuf {
    workspace().join("data/contracts").join(name)
}

fn check<'a>(report: &'a ContractReport, article: &str) -> &'a dataact_compliance::CheckResult {
    report
        .checks
        .iter()
        .find(|c| c.article_id == article)
        .unwrap_or_else(|| panic!("no check {article} in {:?}", report.checks))
}

/// The B2C Art. 4(1) scenario reports the charged-access violation.
#[test]
fn b2c_article_4_1_reports_expected_violation() {
    let report = checker()
        .check_contract(&contract("b2c-smart-thermostat.owl"), None)
        .unwrap();
    assert_eq!(report.contract_type, ContractType::B2C);
    assert_eq!(report.contract_name, "B2c Smart Thermostat");
    assert!(!report.overall_compliant());

    let art_4_1 = check(&report, "4.1");
    assert_eq!(art_4_1.outcome, Outcome::Violated);
    assert_eq!(art_4_1.matches.len(), 2);

    let first = &art_4_1.matches[0];
    assert_eq!(
        first.get("contract"),
        Some("http://www.semanticweb.org/dataact#SmartThermostatContract")
    );
    assert_eq!(
        first.get("violationType"),
        Some("AccessNotFreeOfCharge")
    );
    assert_eq!(
        first.get("dataHolder"),
        Some("http://www.semanticweb.org/dataact#ThermoCorp")
    );
    assert_eq!(
        art_4_1.matches[1].get("violationType"),
        Some("UndueDelay")
    );
    let details = art_4_1.matches[1].get("details").unwrap();
    assert!(details.contains("30 days"), "got {details}");
}

#[test]
fn b2c_open_access_request_is_pending() {
    let report = checker()
        .check_contract(&contract("b2c-smart-thermostat.owl"), Some("Thermostat"))
        .unwrap();
    assert_eq!(report.contract_name, "Thermostat");
    let pending = check(&report, "4.1-pending");
    assert_eq!(pending.outcome, Outcome::Pending);
    assert_eq!(pending.matches.len(), 1);
    assert_eq!(
        pending.matches[0].get("requestedOn"),
        Some("2025-03-01")
    );
    assert_eq!(report.pending_count(), 1);
    assert_eq!(report.total_violations(), 2);
}

#[test]
fn b2b_trade_secret_without_measures_is_violated() {
    let report = checker()
        .check_contract(&contract("b2b-fleet-telematics.ttl"), None)
        .unwrap();
    assert_eq!(report.contract_type, ContractType::B2B);
    let art_8_6 = check(&report, "8.6");
    assert_eq!(art_8_6.matches.len(), 1);
    assert_eq!(
        art_8_6.matches[0].get("data"),
        Some("http://www.semanticweb.org/dataact#EngineCalibrationMaps")
    );
}

#[test]
fn b2g_public_interest_use_is_fulfilled() {
    let report = checker()
        .check_contract(&contract("b2g-flood-response.ttl"), None)
        .unwrap();
    assert_eq!(report.contract_type, ContractType::B2G);
    assert!(report.overall_compliant());
    assert!(check(&report, "19.2a").matches.is_empty());

    let fulfilled = check(&report, "19.2a-fulfilled");
    assert_eq!(fulfilled.outcome, Outcome::Fulfilled);
    assert_eq!(
        fulfilled.matches[0].get("purposeLabel"),
        Some("Flood emergency response")
    );
    assert_eq!(report.fulfilled_count(), 1);
}

#[test]
fn default_scenarios_run_in_file_name_order() {
    let reports = checker().check_default_scenarios().unwrap();
    let types: Vec<ContractType> = reports.iter().map(|r| r.contract_type).collect();
    assert_eq!(
        types,
        [ContractType::B2B, ContractType::B2C, ContractType::B2G]
    );
    let compliant = reports.iter().filter(|r| r.overall_compliant()).count();
    assert_eq!(compliant, 1);
}

#[test]
fn contract_type_falls_back_to_graph() {
    let report = checker()
        .check_contract(&fixture("lease-agreement.ttl"), None)
        .unwrap();
    assert_eq!(report.contract_type, ContractType::B2C);
    let art_4_1 = check(&report, "4.1");
    assert_eq!(art_4_1.matches.len(), 1);
    assert_eq!(
        art_4_1.matches[0].get("violationType"),
        Some("NotMachineReadable")
    );
    assert!(check(&report, "4.1-pending").matches.is_empty());
}

#[test]
fn unknown_contract_type_has_no_checks() {
    let report = checker()
        .check_contract(&fixture("no-sharing.ttl"), None)
        .unwrap();
    assert_eq!(report.contract_type, ContractType::Unknown);
    assert!(report.checks.is_empty());
    assert!(report.note.is_some());
    assert!(!report.overall_compliant());
    assert!(!render_summary(&[report]).contains("ALL CONTRACTS COMPLIANT"));
}

/// Side files next to the contracts (XML catalogs, notes) are not loaded.
#[test]
fn directory_run_ignores_side_files() {
    let reports = checker()
        .check_directory(&fixture("contracts-mixed"))
        .unwrap();
    let types: Vec<ContractType> = reports.iter().map(|r| r.contract_type).collect();
    assert_eq!(types, [ContractType::B2G, ContractType::B2C]);
}

#[test]
fn query_without_match_yields_no_rows() {
    let report = checker()
        .run_query(
            &contract("b2c-smart-thermostat.owl"),
            &fixture("no-match.sparql"),
        )
        .unwrap();
    assert_eq!(report.checks.len(), 1);
    assert_eq!(report.checks[0].article_id, "no-match");
    assert_eq!(report.checks[0].outcome, Outcome::Pending);
    assert!(report.checks[0].matches.is_empty());
}

#[test]
fn query_errors_are_typed() {
    let checker = checker();
    let thermostat = contract("b2c-smart-thermostat.owl");

    let syntax = checker
        .run_query(&thermostat, &fixture("bad-syntax.sparql"))
        .unwrap_err();
    assert!(matches!(syntax, Error::QuerySyntax { path: Some(_), .. }), "got {syntax:?}");

    let form = checker
        .run_query(&thermostat, &fixture("ask-form.sparql"))
        .unwrap_err();
    assert!(matches!(form, Error::QueryExecution { .. }), "got {form:?}");

    let missing = checker
        .run_query(&thermostat, &fixture("missing.sparql"))
        .unwrap_err();
    assert!(matches!(missing, Error::FileNotFound { .. }), "got {missing:?}");
}

#[test]
fn malformed_contract_stops_the_run() {
    let paths = vec![
        contract("b2b-fleet-telematics.ttl"),
        fixture("malformed.ttl"),
        contract("b2g-flood-response.ttl"),
    ];
    let err = checker().check_contracts(&paths).unwrap_err();
    assert!(matches!(err, Error::Parse { .. }), "got {err:?}");
}

#[test]
fn missing_base_ontology_is_not_found() {
    let config = CheckerConfig {
        base_ontology: workspace().join("data/missing.ttl"),
        ..CheckerConfig::default().rooted_at(&workspace())
    };
    let err = ComplianceChecker::new(config).unwrap_err();
    assert!(matches!(err, Error::FileNotFound { .. }), "got {err:?}");
}

/// Querying leaves the merged graph untouched.
#[test]
fn queries_do_not_mutate_the_graph() {
    let checker = checker();
    let graph = checker
        .load_contract(&contract("b2b-fleet-telematics.ttl"))
        .unwrap();
    let before = graph.clone();
    let runner = QueryRunner::new(&graph).unwrap();
    let query = QueryFile::load(workspace().join("data/queries/query-8.6.sparql")).unwrap();
    assert_eq!(runner.select_file(&query).unwrap().count(), 1);
    assert_eq!(graph, before);
}
