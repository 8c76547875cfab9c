//! Behaviors: interchangeable exercise generation and grading algorithms.
//!
//! A behavior is selected by name from the [`BehaviorRegistry`] and constructed
//! from an opaque parameter bag. Each role has its own capability trait.

pub mod generators;
pub mod graders;
pub mod registry;

pub use registry::{to_camel_case, Behavior, BehaviorFactory, BehaviorRegistry};

use crate::error::BehaviorError;
use crate::exercise::{Exercise, ExerciseDraft, GradeDraft};
use crate::knowledge::{KnowledgeGraph, Topic};
use crate::types::Parameters;
use serde::{Deserialize, Serialize};

/// Role a behavior plays; each role has a separate lookup namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BehaviorRole {
    /// Creates exercises from a knowledge graph
    Generator,
    /// Grades created exercises
    Grader,
}

impl BehaviorRole {
    pub fn all() -> [BehaviorRole; 2] {
        [BehaviorRole::Generator, BehaviorRole::Grader]
    }
}

impl std::fmt::Display for BehaviorRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BehaviorRole::Generator => write!(f, "generator"),
            BehaviorRole::Grader => write!(f, "grader"),
        }
    }
}

/// Lazy stream of drafts borrowed from a knowledge graph
pub type DraftStream<'g> = Box<dyn Iterator<Item = Result<ExerciseDraft, BehaviorError>> + 'g>;

/// Exercise generation behavior
pub trait GeneratorBehavior: Send {
    /// Produce drafts for the graph.
    ///
    /// Must be a pure function of the graph and the behavior's parameters. The
    /// stream may be unbounded; callers only pull what they need.
    fn generate<'g>(&self, graph: &'g KnowledgeGraph) -> DraftStream<'g>;
}

/// Exercise grading behavior
pub trait GraderBehavior: Send {
    /// Precompute topic-scoped state; called once before any exercise is graded
    fn setup(&mut self, topic: &Topic) -> Result<(), BehaviorError>;

    fn grade_one(&self, exercise: &Exercise) -> Result<GradeDraft, BehaviorError>;
}

/// Read an optional probability parameter, falling back to `default`
pub fn probability_param(
    parameters: &Parameters,
    name: &str,
    default: f64,
) -> Result<f64, BehaviorError> {
    match parameters.get(name) {
        None => Ok(default),
        Some(value) => {
            let number = value.as_f64().ok_or_else(|| BehaviorError::InvalidParameter {
                name: name.to_string(),
                reason: format!("expected a number, got {}", value),
            })?;
            if !(0.0..=1.0).contains(&number) {
                return Err(BehaviorError::InvalidParameter {
                    name: name.to_string(),
                    reason: format!("{} is outside [0, 1]", number),
                });
            }
            Ok(number)
        }
    }
}

/// Read an optional positive integer parameter, falling back to `default`
pub fn count_param(
    parameters: &Parameters,
    name: &str,
    default: usize,
) -> Result<usize, BehaviorError> {
    match parameters.get(name) {
        None => Ok(default),
        Some(value) => match value.as_u64() {
            Some(n) if n > 0 => Ok(n as usize),
            _ => Err(BehaviorError::InvalidParameter {
                name: name.to_string(),
                reason: format!("expected a positive integer, got {}", value),
            }),
        },
    }
}
