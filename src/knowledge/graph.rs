//! In-memory knowledge graph: a set of subject/predicate/object triples bound to a topic.

use crate::error::ApiError;
use crate::knowledge::namespaces::{expand, RDFS_LABEL};
use crate::knowledge::terms::term_to_name;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// A single fact
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Triple {
    pub subject: String,
    pub predicate: String,
    pub object: String,
}

impl Triple {
    pub fn new(
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }
}

/// Topic a knowledge graph was built for
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Topic {
    pub uri: String,
}

impl Topic {
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into() }
    }

    /// Human-readable topic name derived from its IRI
    pub fn name(&self) -> String {
        term_to_name(&self.uri)
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<Topic {}>", self.uri)
    }
}

/// Triple pattern; `None` positions match anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct TriplePattern<'p> {
    pub subject: Option<&'p str>,
    pub predicate: Option<&'p str>,
    pub object: Option<&'p str>,
}

impl<'p> TriplePattern<'p> {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn subject(mut self, subject: &'p str) -> Self {
        self.subject = Some(subject);
        self
    }

    pub fn predicate(mut self, predicate: &'p str) -> Self {
        self.predicate = Some(predicate);
        self
    }

    pub fn object(mut self, object: &'p str) -> Self {
        self.object = Some(object);
        self
    }

    pub fn matches(&self, triple: &Triple) -> bool {
        self.subject.map_or(true, |s| s == triple.subject)
            && self.predicate.map_or(true, |p| p == triple.predicate)
            && self.object.map_or(true, |o| o == triple.object)
    }
}

/// Knowledge graph for one topic.
///
/// Triples keep insertion order and set semantics (adding an existing triple is a no-op),
/// so queries are deterministic for a given construction sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GraphDocument")]
pub struct KnowledgeGraph {
    graph_id: String,
    topic: Topic,
    triples: Vec<Triple>,
    #[serde(skip)]
    index: HashSet<Triple>,
}

/// On-disk form of a graph; names may use `prefix:local` shorthands
#[derive(Deserialize)]
struct GraphDocument {
    graph_id: String,
    topic: Topic,
    #[serde(default)]
    triples: Vec<Triple>,
}

impl TryFrom<GraphDocument> for KnowledgeGraph {
    type Error = String;

    fn try_from(document: GraphDocument) -> Result<Self, Self::Error> {
        if document.graph_id.trim().is_empty() {
            return Err("graph_id cannot be empty".to_string());
        }
        let mut graph = KnowledgeGraph::new(document.graph_id, Topic::new(expand(&document.topic.uri)));
        for triple in document.triples {
            graph.insert(Triple::new(
                expand(&triple.subject),
                expand(&triple.predicate),
                expand(&triple.object),
            ));
        }
        Ok(graph)
    }
}

impl KnowledgeGraph {
    pub fn new(graph_id: impl Into<String>, topic: Topic) -> Self {
        Self {
            graph_id: graph_id.into(),
            topic,
            triples: Vec::new(),
            index: HashSet::new(),
        }
    }

    /// Load a graph from its JSON representation.
    ///
    /// Duplicate triples are dropped and `dbpedia:`, `rdf:`, `rdfs:`,
    /// `dbpedia-owl:` and `drill:` names are expanded to full IRIs.
    pub fn from_json(json: &str) -> Result<Self, ApiError> {
        serde_json::from_str(json)
            .map_err(|e| ApiError::InvalidGraph(format!("Failed to parse graph: {}", e)))
    }

    /// Load a graph from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self, ApiError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ApiError::InvalidGraph(format!("Failed to read graph file {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    pub fn graph_id(&self) -> &str {
        &self.graph_id
    }

    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    pub fn triples(&self) -> &[Triple] {
        &self.triples
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    /// Insert a triple; returns false if it was already present
    pub fn insert(&mut self, triple: Triple) -> bool {
        if !self.index.insert(triple.clone()) {
            return false;
        }
        self.triples.push(triple);
        true
    }

    pub fn add(
        &mut self,
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: impl Into<String>,
    ) -> &mut Self {
        self.insert(Triple::new(subject, predicate, object));
        self
    }

    /// Builder-style variant of [`KnowledgeGraph::add`]
    pub fn with_triple(
        mut self,
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        self.add(subject, predicate, object);
        self
    }

    /// All triples matching the pattern, in insertion order
    ///
    /// Results borrow from the graph only; the iterator itself lives as long as the pattern.
    pub fn matching<'g: 'p, 'p>(
        &'g self,
        pattern: TriplePattern<'p>,
    ) -> impl Iterator<Item = &'g Triple> + 'p {
        self.triples.iter().filter(move |t| pattern.matches(t))
    }

    pub fn objects<'g: 'p, 'p>(
        &'g self,
        subject: &'p str,
        predicate: &'p str,
    ) -> impl Iterator<Item = &'g str> + 'p {
        self.matching(TriplePattern::any().subject(subject).predicate(predicate))
            .map(|t| t.object.as_str())
    }

    pub fn subjects<'g: 'p, 'p>(
        &'g self,
        predicate: &'p str,
        object: &'p str,
    ) -> impl Iterator<Item = &'g str> + 'p {
        self.matching(TriplePattern::any().predicate(predicate).object(object))
            .map(|t| t.subject.as_str())
    }

    /// First object for (subject, predicate)
    pub fn value(&self, subject: &str, predicate: &str) -> Option<&str> {
        self.triples
            .iter()
            .find(|t| t.subject == subject && t.predicate == predicate)
            .map(|t| t.object.as_str())
    }

    /// Human-readable label of a node: its `rdfs:label` if present, otherwise
    /// the name derived from its IRI.
    pub fn label(&self, node: &str) -> String {
        match self.value(node, RDFS_LABEL) {
            Some(label) => label.to_string(),
            None => term_to_name(node),
        }
    }
}

impl std::fmt::Display for KnowledgeGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "<KnowledgeGraph {}; topic={}; triples={}>",
            self.graph_id,
            self.topic.uri,
            self.triples.len()
        )
    }
}
