//! Knowledge graph collaborator.
//!
//! A read-only triple set bound to a topic. Generator behaviors pattern-match
//! facts in it; graders only see its topic.

pub mod graph;
pub mod namespaces;
pub mod terms;

pub use graph::{KnowledgeGraph, Topic, Triple, TriplePattern};
