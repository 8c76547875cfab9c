//! Error types for exercise generation and grading.

use crate::behavior::BehaviorRole;
use crate::types::ExerciseID;
use thiserror::Error;

/// Key whose uniqueness constraint was violated by a concurrent writer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DuplicateKey {
    /// The exercise set of (knowledge graph, creator) is owned by another run
    ExerciseSet {
        knowledge_graph: String,
        exercises_creator: String,
    },
    /// An exercise with the same identity is already persisted
    Exercise(ExerciseID),
    /// The exercise was already graded by this grader
    Grade {
        exercise_id: ExerciseID,
        exercises_grader: String,
    },
}

impl std::fmt::Display for DuplicateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DuplicateKey::ExerciseSet {
                knowledge_graph,
                exercises_creator,
            } => write!(
                f,
                "exercise set (graph={}, creator={})",
                knowledge_graph, exercises_creator
            ),
            DuplicateKey::Exercise(id) => write!(f, "exercise {}", hex::encode(id)),
            DuplicateKey::Grade {
                exercise_id,
                exercises_grader,
            } => write!(
                f,
                "grade (exercise={}, grader={})",
                hex::encode(exercise_id),
                exercises_grader
            ),
        }
    }
}

/// Storage-related errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Duplicate key race on {0}")]
    DuplicateKeyRace(DuplicateKey),

    #[error("Exercise not found: {0}")]
    ExerciseNotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors raised by behavior implementations
#[derive(Debug, Error)]
pub enum BehaviorError {
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Behavior used before setup")]
    NotSetUp,

    #[error("Invalid grade: {0}")]
    InvalidGrade(String),

    #[error("{0}")]
    Failed(String),
}

/// Errors surfaced to callers of the registry, components and pipelines
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Behavior not found: no {role} named '{behavior_name}' (type {type_name})")]
    BehaviorNotFound {
        role: BehaviorRole,
        behavior_name: String,
        type_name: String,
    },

    #[error("Failed to load {role} behavior '{behavior_name}': {source}")]
    BehaviorLoadError {
        role: BehaviorRole,
        behavior_name: String,
        #[source]
        source: BehaviorError,
    },

    #[error("Behavior '{behavior_name}' failed: {source}")]
    BehaviorRuntimeError {
        behavior_name: String,
        #[source]
        source: BehaviorError,
    },

    #[error("Persistence error: {0}")]
    PersistenceError(#[from] StorageError),

    #[error("Component not found: {0}")]
    ComponentNotFound(String),

    #[error("Component disabled: {0}")]
    ComponentDisabled(String),

    #[error("Invalid knowledge graph: {0}")]
    InvalidGraph(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
