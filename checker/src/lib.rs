//! EU Data Act (Regulation (EU) 2023/2854) compliance checks.
//!
//! A contract ontology is merged with the Data Act base ontology and queried
//! with hand-written SPARQL. Each query file selects exactly one class of
//! outcome (fulfilled, violated, or pending); the rows it returns are the
//! obligations in that class.
//!
//! # Pipeline
//!
//! | Step | Item |
//! |------|------|
//! | Load ontology documents (Turtle, N-Triples, RDF/XML) | [`OntologyGraph::load`] |
//! | Merge base ontology and contract | [`store::merge`] |
//! | Evaluate a SPARQL query | [`QueryRunner::select`] |
//! | Classify and print | [`report::render_report`] |
//!
//! # Entry Point
//!
//! ```no_run
//! use dataact_compliance::{CheckerConfig, ComplianceChecker};
//!
//! let checker = ComplianceChecker::new(CheckerConfig::default())?;
//! for report in checker.check_default_scenarios()? {
//!     print!("{}", dataact_compliance::report::render_report(&report, true));
//! }
//! # Ok::<(), dataact_compliance::Error>(())
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod checker;
pub mod config;
pub mod error;
pub mod query;
pub mod report;
pub mod scenario;
pub mod store;

pub use checker::ComplianceChecker;
pub use config::CheckerConfig;
pub use error::{Error, Result};
pub use query::{Binding, Bindings, Outcome, QueryFile, QueryRunner};
pub use report::{CheckResult, ContractReport};
pub use scenario::{ArticleCheck, ContractType};
pub use store::{OntologyGraph, RdfFormat};
