//! Ontology store: loads RDF documents into triple sets and merges them.
//!
//! Documents are parsed with the sophia parsers (Turtle, N-Triples and
//! RDF/XML) and held as an oxigraph [`Graph`], which has set semantics: a
//! triple inserted twice is stored once.
//!
//! Blank node labels are local to the document that declares them. Each load
//! allocates fresh blank nodes, so `_:b0` in the base ontology and `_:b0` in a
//! contract never denote the same node after a merge.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use oxigraph::model::graph::CanonicalizationAlgorithm;
use oxigraph::model::{BlankNode, Graph, Literal, NamedNode, Subject, Term, Triple, TripleRef};
use sophia_api::source::{StreamError, TripleSource};
use sophia_api::term::{Term as RdfTerm, TermKind};
use sophia_api::triple::Triple as RdfTriple;

use crate::error::{Error, Result};

/// Serialization formats accepted by the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RdfFormat {
    /// Turtle 1.1.
    Turtle,
    /// N-Triples.
    NTriples,
    /// RDF/XML, the serialization Protégé writes to `.owl` files.
    RdfXml,
}

impl RdfFormat {
    /// Picks a format from the file extension, if it is a known one.
    #[must_use]
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "ttl" | "turtle" => Some(Self::Turtle),
            "nt" => Some(Self::NTriples),
            "owl" | "rdf" | "xml" => Some(Self::RdfXml),
            _ => None,
        }
    }

    /// Guesses the format from the document head: XML documents are RDF/XML,
    /// anything else is read as Turtle.
    #[must_use]
    pub fn sniff(text: &str) -> Self {
        let head = text.trim_start_matches('\u{feff}').trim_start();
        if head.starts_with("<?xml") || head.starts_with("<rdf:RDF") {
            Self::RdfXml
        } else {
            Self::Turtle
        }
    }
}

impl fmt::Display for RdfFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Turtle => "Turtle",
            Self::NTriples => "N-Triples",
            Self::RdfXml => "RDF/XML",
        })
    }
}

/// A set of RDF triples, immutable once loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OntologyGraph {
    graph: Graph,
}

impl OntologyGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads an ontology document, choosing the parser from the file extension
    /// (or from the document head when the extension is unknown).
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileNotFound`] if `path` does not exist and
    /// [`Error::Parse`] if the document is malformed. A malformed document
    /// never yields a partially populated graph.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = read_document(path)?;
        let format = RdfFormat::from_extension(path).unwrap_or_else(|| RdfFormat::sniff(&text));
        parse_document(&text, format, path)
    }

    /// Loads an ontology document with an explicit format.
    ///
    /// # Errors
    ///
    /// Same as [`OntologyGraph::load`].
    pub fn load_with_format(path: impl AsRef<Path>, format: RdfFormat) -> Result<Self> {
        let path = path.as_ref();
        let text = read_document(path)?;
        parse_document(&text, format, path)
    }

    /// Parses an in-memory document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] if the text is malformed.
    pub fn parse_str(text: &str, format: RdfFormat) -> Result<Self> {
        parse_document(text, format, Path::new("<inline>"))
    }

    /// Returns the union of `self` and `other`. Neither input is modified.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let mut graph = self.graph.clone();
        for triple in other.graph.iter() {
            graph.insert(triple);
        }
        Self { graph }
    }

    /// Number of distinct triples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.graph.len()
    }

    /// Returns true if the graph holds no triple.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    /// Returns true if `triple` is in the graph.
    pub fn contains<'a>(&self, triple: impl Into<TripleRef<'a>>) -> bool {
        self.graph.contains(triple)
    }

    /// Iterates over the triples in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = TripleRef<'_>> {
        self.graph.iter()
    }

    /// Returns true if both graphs are equal up to blank node renaming.
    #[must_use]
    pub fn is_isomorphic(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        let mut left = self.graph.clone();
        let mut right = other.graph.clone();
        left.canonicalize(CanonicalizationAlgorithm::Unstable);
        right.canonicalize(CanonicalizationAlgorithm::Unstable);
        left == right
    }

    /// Serializes the graph as N-Triples, one triple per line in sorted order.
    #[must_use]
    pub fn to_ntriples(&self) -> String {
        let mut lines: Vec<String> = self.graph.iter().map(|t| format!("{t} .\n")).collect();
        lines.sort_unstable();
        lines.concat()
    }
}

/// Merges two graphs into their triple-set union.
///
/// Duplicate triples collapse, and merging a graph with itself returns an
/// equal graph.
#[must_use]
pub fn merge(a: &OntologyGraph, b: &OntologyGraph) -> OntologyGraph {
    let merged = a.union(b);
    tracing::debug!(
        left = a.len(),
        right = b.len(),
        merged = merged.len(),
        "merged graphs"
    );
    merged
}

fn read_document(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| Error::from_io(path, e))
}

fn parse_document(text: &str, format: RdfFormat, path: &Path) -> Result<OntologyGraph> {
    let graph = match format {
        RdfFormat::Turtle => collect(sophia_turtle::parser::turtle::parse_str(text), path)?,
        RdfFormat::NTriples => collect(sophia_turtle::parser::nt::parse_str(text), path)?,
        RdfFormat::RdfXml => collect(sophia_xml::parser::parse_str(text), path)?,
    };
    tracing::debug!(
        path = %path.display(),
        %format,
        triples = graph.len(),
        "parsed ontology document"
    );
    Ok(graph)
}

/// Drains a triple source into a fresh graph.
fn collect<S: TripleSource>(mut source: S, path: &Path) -> Result<OntologyGraph> {
    let mut scope = DocumentScope::new(path);
    let mut graph = Graph::new();
    source
        .try_for_each_triple(|t| -> Result<()> {
            let triple = scope.triple(&t)?;
            graph.insert(&triple);
            Ok(())
        })
        .map_err(|e| match e {
            StreamError::SourceError(e) => Error::parse(path, e.to_string()),
            StreamError::SinkError(e) => e,
        })?;
    Ok(OntologyGraph { graph })
}

/// Per-document term conversion. Owns the blank node label table.
struct DocumentScope {
    path: PathBuf,
    blank_nodes: HashMap<String, BlankNode>,
}

impl DocumentScope {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            blank_nodes: HashMap::new(),
        }
    }

    fn triple<T: RdfTriple>(&mut self, t: &T) -> Result<Triple> {
        let subject = self.subject(&t.s())?;
        let predicate = self.named_node(&t.p())?;
        let object = self.object(&t.o())?;
        Ok(Triple::new(subject, predicate, object))
    }

    fn subject<T: RdfTerm>(&mut self, term: &T) -> Result<Subject> {
        match term.kind() {
            TermKind::Iri => Ok(self.named_node(term)?.into()),
            TermKind::BlankNode => Ok(self.blank_node(term)?.into()),
            kind => Err(self.unsupported(kind, "subject")),
        }
    }

    fn object<T: RdfTerm>(&mut self, term: &T) -> Result<Term> {
        match term.kind() {
            TermKind::Iri => Ok(self.named_node(term)?.into()),
            TermKind::BlankNode => Ok(self.blank_node(term)?.into()),
            TermKind::Literal => Ok(self.literal(term)?.into()),
            kind => Err(self.unsupported(kind, "object")),
        }
    }

    fn named_node<T: RdfTerm>(&self, term: &T) -> Result<NamedNode> {
        let iri = term
            .iri()
            .ok_or_else(|| Error::parse(&self.path, "expected an IRI"))?;
        NamedNode::new(iri.as_str())
            .map_err(|e| Error::parse(&self.path, format!("invalid IRI <{}>: {e}", iri.as_str())))
    }

    fn blank_node<T: RdfTerm>(&mut self, term: &T) -> Result<BlankNode> {
        let label = term
            .bnode_id()
            .ok_or_else(|| Error::parse(&self.path, "expected a blank node"))?;
        Ok(self
            .blank_nodes
            .entry(label.as_str().to_owned())
            .or_default()
            .clone())
    }

    fn literal<T: RdfTerm>(&self, term: &T) -> Result<Literal> {
        let lexical = term
            .lexical_form()
            .ok_or_else(|| Error::parse(&self.path, "expected a literal"))?;
        if let Some(tag) = term.language_tag() {
            return Literal::new_language_tagged_literal(&*lexical, tag.as_str())
                .map_err(|e| {
                    Error::parse(&self.path, format!("invalid language tag {}: {e}", tag.as_str()))
                });
        }
        match term.datatype() {
            Some(datatype) => {
                let datatype = NamedNode::new(datatype.as_str()).map_err(|e| {
                    Error::parse(&self.path, format!("invalid datatype IRI: {e}"))
                })?;
                Ok(Literal::new_typed_literal(&*lexical, datatype))
            }
            None => Ok(Literal::new_simple_literal(&*lexical)),
        }
    }

    fn unsupported(&self, kind: TermKind, position: &str) -> Error {
        let what = match kind {
            TermKind::Iri => "IRI",
            TermKind::BlankNode => "blank node",
            TermKind::Literal => "literal",
            TermKind::Triple => "quoted triple",
            TermKind::Variable => "variable",
        };
        Error::parse(&self.path, format!("a {what} cannot be used as {position}"))
    }
}
