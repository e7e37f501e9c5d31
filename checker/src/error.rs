//! Error taxonomy for the compliance pipeline.
//!
//! Every failure is surfaced to the caller as-is: nothing is retried and no
//! partially built graph is ever returned alongside an error.

use std::path::{Path, PathBuf};

/// Errors raised while loading ontologies, loading queries, or evaluating them.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A file or directory that the pipeline needs does not exist.
    #[error("file not found: {}", .path.display())]
    FileNotFound {
        /// The missing path.
        path: PathBuf,
    },

    /// An ontology document is malformed or holds a term the graph cannot store.
    #[error("failed to parse {}: {message}", .path.display())]
    Parse {
        /// The document being parsed (`<inline>` for in-memory text).
        path: PathBuf,
        /// Parser diagnostic.
        message: String,
    },

    /// The query text is not valid SPARQL 1.1.
    #[error("invalid SPARQL{}: {message}", origin_suffix(.path.as_deref()))]
    QuerySyntax {
        /// The query file, when the query was loaded from disk.
        path: Option<PathBuf>,
        /// Parser diagnostic.
        message: String,
    },

    /// The query engine failed while evaluating a syntactically valid query.
    #[error("query execution failed: {message}")]
    QueryExecution {
        /// Engine diagnostic.
        message: String,
    },

    /// Any other I/O failure while reading or writing a file.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// The path being read or written.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A configuration file exists but cannot be decoded.
    #[error("invalid configuration in {}: {message}", .path.display())]
    Config {
        /// The configuration file.
        path: PathBuf,
        /// Decoder diagnostic.
        message: String,
    },
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Maps an I/O failure on `path`, turning `NotFound` into [`Error::FileNotFound`].
    pub fn from_io(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            Self::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }

    pub(crate) fn parse(path: &Path, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    pub(crate) fn execution(message: impl Into<String>) -> Self {
        Self::QueryExecution {
            message: message.into(),
        }
    }
}

fn origin_suffix(path: Option<&Path>) -> String {
    path.map(|p| format!(" in {}", p.display()))
        .unwrap_or_default()
}

/// Fails with [`Error::FileNotFound`] unless `path` exists.
///
/// # Errors
///
/// Returns [`Error::FileNotFound`] when nothing exists at `path`.
pub fn require_exists(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(Error::FileNotFound {
            path: path.to_path_buf(),
        })
    }
}
