//! Exercise Store
//!
//! Persistence port for exercises and grades. Implementations must provide
//! exact-match lookups by composite key, insertion-ordered iteration of an
//! exercise set, and atomic insert-if-absent primitives that report conflicts
//! as [`StorageError::DuplicateKeyRace`].

pub mod persistence;

pub use persistence::SledExerciseStore;

use crate::error::StorageError;
use crate::exercise::{Exercise, GradedExercise};
use crate::types::ExerciseID;

/// Exercise Store interface
pub trait ExerciseStore: Send + Sync {
    /// Allocate an identifier for a generation run, unique for the store's lifetime
    fn allocate_run_id(&self) -> Result<u64, StorageError>;

    /// Exercises of the set (knowledge graph, creator) in insertion order
    fn exercises_for(
        &self,
        knowledge_graph: &str,
        exercises_creator: &str,
    ) -> Result<Vec<Exercise>, StorageError>;

    fn get_exercise(&self, exercise_id: &ExerciseID) -> Result<Option<Exercise>, StorageError>;

    /// Insert an exercise produced by run `run_id`.
    ///
    /// The first insert into a set claims it for the run. Fails with
    /// `DuplicateKeyRace(ExerciseSet)` if another run owns the set and with
    /// `DuplicateKeyRace(Exercise)` if the exercise is already stored.
    fn insert_exercise(&self, exercise: &Exercise, run_id: u64) -> Result<(), StorageError>;

    fn get_grade(
        &self,
        exercise_id: &ExerciseID,
        exercises_grader: &str,
    ) -> Result<Option<GradedExercise>, StorageError>;

    fn has_grade(&self, exercise_id: &ExerciseID, exercises_grader: &str) -> Result<bool, StorageError> {
        Ok(self.get_grade(exercise_id, exercises_grader)?.is_some())
    }

    /// Insert a grade if none exists for (exercise, grader).
    ///
    /// Fails with `DuplicateKeyRace(Grade)` if one does, and with
    /// `ExerciseNotFound` if the exercise is not stored.
    fn insert_grade(&self, grade: &GradedExercise) -> Result<(), StorageError>;

    /// Flush pending writes to durable storage
    fn flush(&self) -> Result<(), StorageError>;
}
