//! Built-in scenario set: contract types, the articles checked for each type,
//! and discovery of contract files on disk.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::error::{require_exists, Error, Result};
use crate::query::QueryRunner;

/// Namespace of the Data Act ontology.
pub const DATAACT_NS: &str = "http://www.semanticweb.org/dataact#";

/// File extensions picked up by [`discover_contracts`]. Narrower than what the
/// loader accepts: tool side files such as `catalog-v001.xml` are skipped.
pub const CONTRACT_EXTENSIONS: [&str; 4] = ["owl", "rdf", "ttl", "nt"];

/// The data-sharing relationship a contract sets up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContractType {
    /// Business to consumer (Chapter II).
    B2C,
    /// Business to business (Chapter III).
    B2B,
    /// Business to government (Chapter V).
    B2G,
    /// No data-sharing individual was found.
    #[serde(rename = "UNKNOWN")]
    Unknown,
}

impl ContractType {
    const DETECTABLE: [Self; 3] = [Self::B2C, Self::B2B, Self::B2G];

    /// Display code, e.g. `B2C`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::B2C => "B2C",
            Self::B2B => "B2B",
            Self::B2G => "B2G",
            Self::Unknown => "UNKNOWN",
        }
    }

    fn sharing_class(self) -> Option<&'static str> {
        match self {
            Self::B2C => Some("B2CDataSharing"),
            Self::B2B => Some("B2BDataSharing"),
            Self::B2G => Some("B2GDataSharing"),
            Self::Unknown => None,
        }
    }
}

impl fmt::Display for ContractType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detects the contract type.
///
/// A file stem containing `b2c`, `b2b` or `b2g` wins. Otherwise the graph is
/// asked for an IRI individual of `dataact:B2CDataSharing`,
/// `dataact:B2BDataSharing` or `dataact:B2GDataSharing`, in that order.
/// Class declarations in the base ontology are not individuals and never
/// match.
///
/// # Errors
///
/// Returns an error only if the detection queries fail to evaluate.
pub fn detect_contract_type(runner: &QueryRunner, path: Option<&Path>) -> Result<ContractType> {
    if let Some(kind) = path.and_then(type_from_file_name) {
        tracing::debug!(contract_type = %kind, "contract type from file name");
        return Ok(kind);
    }
    for kind in ContractType::DETECTABLE {
        let Some(class) = kind.sharing_class() else {
            continue;
        };
        let ask = format!(
            "PREFIX dataact: <{DATAACT_NS}> ASK {{ ?s a dataact:{class} . FILTER(isIRI(?s)) }}"
        );
        if runner.ask(&ask)? {
            tracing::debug!(contract_type = %kind, "contract type from graph");
            return Ok(kind);
        }
    }
    Ok(ContractType::Unknown)
}

fn type_from_file_name(path: &Path) -> Option<ContractType> {
    let stem = path.file_stem()?.to_string_lossy().to_lowercase();
    ContractType::DETECTABLE
        .into_iter()
        .find(|kind| stem.contains(&kind.as_str().to_lowercase()))
}

/// One article check: which query file evaluates which provision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArticleCheck {
    /// Article reference, e.g. `4.1`.
    pub article_id: &'static str,
    /// Human-readable provision name.
    pub article_name: &'static str,
    /// Query file name inside the queries directory.
    pub query_file: &'static str,
}

const B2C_CHECKS: &[ArticleCheck] = &[
    ArticleCheck {
        article_id: "4.1",
        article_name: "User Access Rights",
        query_file: "query-4.1.sparql",
    },
    ArticleCheck {
        article_id: "4.1-pending",
        article_name: "User Access Requests Awaiting Response",
        query_file: "query-4.1-pending.sparql",
    },
];

const B2B_CHECKS: &[ArticleCheck] = &[ArticleCheck {
    article_id: "8.6",
    article_name: "Trade Secret Exception",
    query_file: "query-8.6.sparql",
}];

const B2G_CHECKS: &[ArticleCheck] = &[
    ArticleCheck {
        article_id: "19.2a",
        article_name: "Competitive Use Prohibition",
        query_file: "query-19.2.a.sparql",
    },
    ArticleCheck {
        article_id: "19.2a-fulfilled",
        article_name: "Use Limited to Public Interest Task",
        query_file: "query-19.2.a-fulfilled.sparql",
    },
];

/// The article checks that apply to a contract type.
#[must_use]
pub fn applicable_checks(kind: ContractType) -> &'static [ArticleCheck] {
    match kind {
        ContractType::B2C => B2C_CHECKS,
        ContractType::B2B => B2B_CHECKS,
        ContractType::B2G => B2G_CHECKS,
        ContractType::Unknown => &[],
    }
}

/// Lists the contract documents directly inside `dir`, sorted by file name.
/// Only files with one of the [`CONTRACT_EXTENSIONS`] are listed.
///
/// # Errors
///
/// Returns [`Error::FileNotFound`] if `dir` does not exist, or [`Error::Io`]
/// if it cannot be read.
pub fn discover_contracts(dir: &Path) -> Result<Vec<PathBuf>> {
    require_exists(dir)?;
    let mut contracts = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| Error::Io {
            path: dir.to_path_buf(),
            source: e.into(),
        })?;
        if entry.file_type().is_file() && is_contract_file(entry.path()) {
            contracts.push(entry.into_path());
        }
    }
    tracing::debug!(dir = %dir.display(), count = contracts.len(), "discovered contracts");
    Ok(contracts)
}

fn is_contract_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            CONTRACT_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
}

/// Human-readable contract name: `b2c-smart_thermostat.owl` becomes
/// `B2c Smart Thermostat`.
#[must_use]
pub fn display_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    stem.split(['-', '_', ' '])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
