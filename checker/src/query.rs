//! Query runner: evaluates SPARQL 1.1 text against a merged ontology graph.
//!
//! Each query file is authored to select exactly one class of outcome. The
//! class is declared in the file header:
//!
//! ```text
//! # outcome: violated
//! PREFIX dataact: <http://www.semanticweb.org/dataact#>
//! SELECT ?contract ?violationType ?details WHERE { ... }
//! ```
//!
//! Files without the directive are treated as `violated` queries, so every
//! row they return is reported as a finding.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use oxigraph::model::{GraphNameRef, Term};
use oxigraph::sparql::{Query, QueryResults, QuerySolution, QuerySolutionIter};
use oxigraph::store::Store;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::report::Row;
use crate::store::OntologyGraph;

const OUTCOME_DIRECTIVE: &str = "outcome:";

/// The class of outcome a query selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Rows are obligations the contract meets.
    Fulfilled,
    /// Rows are breaches; any row makes the contract non-compliant.
    Violated,
    /// Rows are obligations whose deadline has not passed yet.
    Pending,
}

impl Outcome {
    /// Lower-case name used in directives and JSON.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fulfilled => "fulfilled",
            Self::Violated => "violated",
            Self::Pending => "pending",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Outcome {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fulfilled" => Ok(Self::Fulfilled),
            "violated" => Ok(Self::Violated),
            "pending" => Ok(Self::Pending),
            other => Err(format!(
                "unknown outcome class `{other}` (expected fulfilled, violated or pending)"
            )),
        }
    }
}

/// A SPARQL query loaded from disk, parsed, and tagged with its outcome class.
#[derive(Debug, Clone)]
pub struct QueryFile {
    /// Where the query was read from.
    pub path: PathBuf,
    /// The raw query text.
    pub text: String,
    /// The outcome class the rows of this query belong to.
    pub outcome: Outcome,
    query: Query,
}

impl QueryFile {
    /// Reads and parses a query file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileNotFound`] if `path` does not exist and
    /// [`Error::QuerySyntax`] if the text is not valid SPARQL or declares an
    /// unknown outcome class.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::from_io(path, e))?;
        Self::parse(text, Some(path))
    }

    /// Parses query text that did not come from a file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::QuerySyntax`] on invalid SPARQL or an unknown outcome class.
    pub fn from_text(text: impl Into<String>) -> Result<Self> {
        Self::parse(text.into(), None)
    }

    fn parse(text: String, path: Option<&Path>) -> Result<Self> {
        let syntax_error = |message: String| Error::QuerySyntax {
            path: path.map(Path::to_path_buf),
            message,
        };
        let outcome = match outcome_directive(&text) {
            Some(value) => value.parse().map_err(syntax_error)?,
            None => Outcome::Violated,
        };
        let query = Query::parse(&text, None).map_err(|e| syntax_error(e.to_string()))?;
        Ok(Self {
            path: path.map(Path::to_path_buf).unwrap_or_default(),
            text,
            outcome,
            query,
        })
    }

    /// File stem, used as the check identifier for ad-hoc queries.
    #[must_use]
    pub fn name(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "inline".to_string())
    }
}

/// Reads the `# outcome: <class>` directive from the comment header.
fn outcome_directive(text: &str) -> Option<&str> {
    for line in text.lines().map(str::trim) {
        if line.is_empty() {
            continue;
        }
        let comment = line.strip_prefix('#')?.trim();
        if let Some(value) = comment
            .get(..OUTCOME_DIRECTIVE.len())
            .filter(|head| head.eq_ignore_ascii_case(OUTCOME_DIRECTIVE))
            .and(comment.get(OUTCOME_DIRECTIVE.len()..))
        {
            return Some(value.trim());
        }
    }
    None
}

/// Evaluates queries against a snapshot of a merged graph.
///
/// The runner copies the graph into an in-memory SPARQL store once; the
/// source graph is never modified.
pub struct QueryRunner {
    store: Store,
}

impl QueryRunner {
    /// Builds a runner over `graph`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::QueryExecution`] if the in-memory store cannot be created.
    pub fn new(graph: &OntologyGraph) -> Result<Self> {
        let store = Store::new().map_err(|e| Error::execution(e.to_string()))?;
        for triple in graph.iter() {
            store
                .insert(triple.in_graph(GraphNameRef::DefaultGraph))
                .map_err(|e| Error::execution(e.to_string()))?;
        }
        tracing::debug!(triples = graph.len(), "query store ready");
        Ok(Self { store })
    }

    /// Runs a SELECT query given as text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::QuerySyntax`] for invalid SPARQL and
    /// [`Error::QueryExecution`] if evaluation fails or the query is not a SELECT.
    pub fn select(&self, text: &str) -> Result<Bindings> {
        self.select_file(&QueryFile::from_text(text)?)
    }

    /// Runs a loaded SELECT query.
    ///
    /// # Errors
    ///
    /// Returns [`Error::QueryExecution`] if evaluation fails or the query is not a SELECT.
    pub fn select_file(&self, query: &QueryFile) -> Result<Bindings> {
        match self.evaluate(query)? {
            QueryResults::Solutions(solutions) => Ok(Bindings::new(solutions)),
            QueryResults::Boolean(_) => Err(Error::execution(
                "expected a SELECT query, got an ASK query",
            )),
            QueryResults::Graph(_) => Err(Error::execution(
                "expected a SELECT query, got a CONSTRUCT or DESCRIBE query",
            )),
        }
    }

    /// Runs an ASK query given as text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::QuerySyntax`] for invalid SPARQL and
    /// [`Error::QueryExecution`] if evaluation fails or the query is not an ASK.
    pub fn ask(&self, text: &str) -> Result<bool> {
        match self.evaluate(&QueryFile::from_text(text)?)? {
            QueryResults::Boolean(answer) => Ok(answer),
            _ => Err(Error::execution("expected an ASK query")),
        }
    }

    fn evaluate(&self, query: &QueryFile) -> Result<QueryResults> {
        self.store
            .query(query.query.clone())
            .map_err(|e| Error::execution(e.to_string()))
    }
}

/// Lazy, one-shot sequence of SELECT results.
///
/// Rows are produced as the engine enumerates them; their order is only
/// stable when the query has an `ORDER BY`.
pub struct Bindings {
    variables: Vec<String>,
    solutions: QuerySolutionIter,
}

impl Bindings {
    fn new(solutions: QuerySolutionIter) -> Self {
        let variables = solutions
            .variables()
            .iter()
            .map(|v| v.as_str().to_string())
            .collect();
        Self {
            variables,
            solutions,
        }
    }

    /// Projected variable names, in projection order.
    #[must_use]
    pub fn variables(&self) -> &[String] {
        &self.variables
    }
}

impl Iterator for Bindings {
    type Item = Result<Binding>;

    fn next(&mut self) -> Option<Self::Item> {
        let solution = self.solutions.next()?;
        Some(
            solution
                .map(|s| Binding::from_solution(&s))
                .map_err(|e| Error::execution(e.to_string())),
        )
    }
}

/// One result row: projected variables mapped to the terms they are bound to.
/// Unbound variables are absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    values: Vec<(String, Term)>,
}

impl Binding {
    fn from_solution(solution: &QuerySolution) -> Self {
        Self {
            values: solution
                .iter()
                .map(|(var, term)| (var.as_str().to_string(), term.clone()))
                .collect(),
        }
    }

    /// The term bound to `variable`.
    #[must_use]
    pub fn get(&self, variable: &str) -> Option<&Term> {
        self.values
            .iter()
            .find(|(name, _)| name == variable)
            .map(|(_, term)| term)
    }

    /// The plain value bound to `variable`; see [`term_value`].
    #[must_use]
    pub fn value_of(&self, variable: &str) -> Option<String> {
        self.get(variable).map(term_value)
    }

    /// Iterates over bound variables in projection order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Term)> {
        self.values.iter().map(|(name, term)| (name.as_str(), term))
    }

    /// Number of bound variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no variable is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Renders the row as `variable -> value` strings, keeping projection
    /// order.
    #[must_use]
    pub fn to_row(&self) -> Row {
        self.values
            .iter()
            .map(|(name, term)| (name.clone(), term_value(term)))
            .collect()
    }
}

/// Plain rendering of a term: the IRI text, the literal's lexical value, or
/// `_:label` for a blank node.
#[must_use]
pub fn term_value(term: &Term) -> String {
    match term {
        Term::NamedNode(node) => node.as_str().to_string(),
        Term::BlankNode(node) => format!("_:{}", node.as_str()),
        Term::Literal(literal) => literal.value().to_string(),
        #[allow(unreachable_patterns)]
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::RdfFormat;

    const GRAPH: &str = r#"
@prefix ex: <http://example.org/> .
ex:a ex:knows ex:b .
ex:b ex:knows ex:c .
ex:c ex:name "Carol" .
"#;

    fn runner() -> QueryRunner {
        let graph = OntologyGraph::parse_str(GRAPH, RdfFormat::Turtle).unwrap();
        QueryRunner::new(&graph).unwrap()
    }

    #[test]
    fn outcome_directive_is_read_from_header() {
        let q = QueryFile::from_text("# outcome: Pending\nSELECT * WHERE { ?s ?p ?o }").unwrap();
        assert_eq!(q.outcome, Outcome::Pending);
    }

    #[test]
    fn outcome_defaults_to_violated() {
        let q = QueryFile::from_text("# a comment\nSELECT * WHERE { ?s ?p ?o }").unwrap();
        assert_eq!(q.outcome, Outcome::Violated);
    }

    #[test]
    fn directive_after_query_body_is_ignored() {
        let q = QueryFile::from_text("SELECT * WHERE { ?s ?p ?o }\n# outcome: fulfilled").unwrap();
        assert_eq!(q.outcome, Outcome::Violated);
    }

    #[test]
    fn unknown_outcome_is_rejected() {
        let err = QueryFile::from_text("# outcome: maybe\nASK {}").unwrap_err();
        assert!(matches!(err, Error::QuerySyntax { .. }));
    }

    #[test]
    fn select_yields_bindings_in_projection_order() {
        let rows: Vec<Binding> = runner()
            .select(
                "PREFIX ex: <http://example.org/>
                 SELECT ?x ?y WHERE { ?x ex:knows ?y } ORDER BY ?x",
            )
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0].value_of("x").as_deref(),
            Some("http://example.org/a")
        );
        let names: Vec<&str> = rows[1].iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["x", "y"]);
    }

    #[test]
    fn unbound_optional_variables_are_absent() {
        let rows: Vec<Binding> = runner()
            .select(
                "PREFIX ex: <http://example.org/>
                 SELECT ?x ?name WHERE { ?x ex:knows ?y OPTIONAL { ?x ex:name ?name } }",
            )
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert!(rows.iter().all(|row| row.get("name").is_none()));
        assert!(rows.iter().all(|row| row.len() == 1));
    }

    #[test]
    fn no_match_yields_empty_sequence() {
        let mut bindings = runner()
            .select("SELECT ?s WHERE { ?s <http://example.org/missing> ?o }")
            .unwrap();
        assert_eq!(bindings.variables(), ["s"]);
        assert!(bindings.next().is_none());
    }

    #[test]
    fn invalid_sparql_is_a_syntax_error() {
        let err = runner().select("SELEKT ?s WHERE { ?s ?p ?o }").err().unwrap();
        assert!(matches!(err, Error::QuerySyntax { .. }), "got {err:?}");
    }

    #[test]
    fn ask_and_select_forms_are_not_interchangeable() {
        let runner = runner();
        assert!(runner.ask("ASK { ?s ?p \"Carol\" }").unwrap());
        assert!(matches!(
            runner.select("ASK { ?s ?p ?o }").err().unwrap(),
            Error::QueryExecution { .. }
        ));
        assert!(matches!(
            runner.ask("SELECT * WHERE { ?s ?p ?o }").unwrap_err(),
            Error::QueryExecution { .. }
        ));
    }

    #[test]
    fn literal_values_render_without_quotes() {
        let row = runner()
            .select("SELECT ?n WHERE { ?s <http://example.org/name> ?n }")
            .unwrap()
            .next()
            .unwrap()
            .unwrap();
        assert_eq!(row.value_of("n").as_deref(), Some("Carol"));
        assert_eq!(row.to_row().get("n"), Some("Carol"));
    }

    #[test]
    fn rows_keep_projection_order() {
        let row = runner()
            .select("SELECT ?s ?n WHERE { ?s <http://example.org/name> ?n }")
            .unwrap()
            .next()
            .unwrap()
            .unwrap()
            .to_row();
        let names: Vec<&str> = row.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["s", "n"]);
    }
}
