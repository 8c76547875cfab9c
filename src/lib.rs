//! Drill: idempotent exercise generation and grading
//!
//! Multiple-choice exercises are generated from a topic's knowledge graph by
//! pluggable generator behaviors, persisted as they are produced, and graded by
//! pluggable grader behaviors. Each (graph, creator) set is computed at most
//! once and each (exercise, grader) pair is graded at most once.

pub mod api;
pub mod behavior;
pub mod cli;
pub mod component;
pub mod config;
pub mod error;
pub mod exercise;
pub mod knowledge;
pub mod logging;
pub mod pipeline;
pub mod store;
pub mod types;
