//! Pipelines driving behaviors over a knowledge graph.
//!
//! Generation yields a lazy, persisted sequence of exercises; grading consumes
//! any such sequence and persists one grade per (exercise, grader).

pub mod generation;
pub mod grading;

pub use generation::{ExerciseGenerationPipeline, ExerciseRun, RunMode};
pub use grading::{GradingPipeline, GradingSummary};
