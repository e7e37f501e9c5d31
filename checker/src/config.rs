//! Checker configuration: where the base ontology, queries, contracts and
//! exported reports live.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

/// Paths used by the compliance checker.
///
/// Relative paths are resolved against the working directory. Keys missing
/// from a configuration file take their default value.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CheckerConfig {
    /// The Data Act ontology merged into every contract graph.
    pub base_ontology: PathBuf,
    /// Directory holding the `*.sparql` query files.
    pub queries_dir: PathBuf,
    /// Directory scanned for contracts when none is named explicitly.
    pub contracts_dir: PathBuf,
    /// Directory receiving dated JSON exports.
    pub reports_dir: PathBuf,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            base_ontology: PathBuf::from("data/data_act_ontology.ttl"),
            queries_dir: PathBuf::from("data/queries"),
            contracts_dir: PathBuf::from("data/contracts"),
            reports_dir: PathBuf::from("compliance-reports"),
        }
    }
}

impl CheckerConfig {
    /// Reads a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileNotFound`] if `path` does not exist and
    /// [`Error::Config`] if the file is not valid TOML for this structure.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::from_io(path, e))?;
        Self::from_toml_str(&text).map_err(|message| Error::Config {
            path: path.to_path_buf(),
            message,
        })
    }

    fn from_toml_str(text: &str) -> std::result::Result<Self, String> {
        toml::from_str(text).map_err(|e| e.to_string())
    }

    /// Rebases every relative path onto `root`.
    #[must_use]
    pub fn rooted_at(self, root: &Path) -> Self {
        let join = |p: PathBuf| if p.is_absolute() { p } else { root.join(p) };
        Self {
            base_ontology: join(self.base_ontology),
            queries_dir: join(self.queries_dir),
            contracts_dir: join(self.contracts_dir),
            reports_dir: join(self.reports_dir),
        }
    }
}
