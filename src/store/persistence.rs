//! Sled-backed exercise store.

use crate::error::{DuplicateKey, StorageError};
use crate::exercise::{Exercise, GradedExercise};
use crate::store::ExerciseStore;
use crate::types::ExerciseID;
use sled::transaction::{ConflictableTransactionError, TransactionError, Transactional};
use sled::{Db, Tree};
use std::io;
use std::path::Path;
use tracing::debug;

const TREE_EXERCISES: &str = "exercises";
const TREE_EXERCISE_INDEX: &str = "exercise_index";
const TREE_EXERCISE_SETS: &str = "exercise_sets";
const TREE_GRADES: &str = "graded_exercises";
const SEQ_KEY_PAD: usize = 20;

/// Sled-based implementation of ExerciseStore
///
/// Trees:
/// - `exercises`: `{set}{seq:020}` -> exercise JSON, so a prefix scan yields a set in insertion order
/// - `exercise_index`: exercise id -> key in `exercises`
/// - `exercise_sets`: `{set}` -> id of the run owning the set
/// - `graded_exercises`: `{exercise hex}:{grader}` -> grade JSON
#[derive(Clone)]
pub struct SledExerciseStore {
    db: Db,
    exercises: Tree,
    index: Tree,
    sets: Tree,
    grades: Tree,
    durable_writes: bool,
}

impl SledExerciseStore {
    /// Open (or create) a store at the given path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = sled::open(path).map_err(|e| {
            StorageError::IoError(io::Error::new(
                io::ErrorKind::Other,
                format!("Failed to open sled database: {}", e),
            ))
        })?;
        Self::from_db(db)
    }

    pub fn from_db(db: Db) -> Result<Self, StorageError> {
        let exercises = db.open_tree(TREE_EXERCISES).map_err(to_storage_io)?;
        let index = db.open_tree(TREE_EXERCISE_INDEX).map_err(to_storage_io)?;
        let sets = db.open_tree(TREE_EXERCISE_SETS).map_err(to_storage_io)?;
        let grades = db.open_tree(TREE_GRADES).map_err(to_storage_io)?;
        Ok(Self {
            db,
            exercises,
            index,
            sets,
            grades,
            durable_writes: true,
        })
    }

    /// Flush after every insert (default) or leave flushing to sled's background thread
    pub fn with_durable_writes(mut self, durable_writes: bool) -> Self {
        self.durable_writes = durable_writes;
        self
    }

    /// Get the underlying sled database (for advanced operations)
    pub fn db(&self) -> &Db {
        &self.db
    }

    /// Id of the run that claimed the set, if any
    pub fn set_owner(&self, knowledge_graph: &str, exercises_creator: &str) -> Result<Option<u64>, StorageError> {
        let set = encode_set_prefix(knowledge_graph, exercises_creator);
        let Some(raw) = self.sets.get(set.as_bytes()).map_err(to_storage_io)? else {
            return Ok(None);
        };
        let bytes: [u8; 8] = raw.as_ref().try_into().map_err(|_| {
            StorageError::Serialization(format!("Invalid run id for set {:?}", set))
        })?;
        Ok(Some(u64::from_be_bytes(bytes)))
    }

    fn after_write(&self) -> Result<(), StorageError> {
        if self.durable_writes {
            self.flush()?;
        }
        Ok(())
    }
}

impl ExerciseStore for SledExerciseStore {
    fn allocate_run_id(&self) -> Result<u64, StorageError> {
        self.db.generate_id().map_err(to_storage_io)
    }

    fn exercises_for(
        &self,
        knowledge_graph: &str,
        exercises_creator: &str,
    ) -> Result<Vec<Exercise>, StorageError> {
        let prefix = encode_set_prefix(knowledge_graph, exercises_creator);
        let mut out = Vec::new();
        for result in self.exercises.scan_prefix(prefix.as_bytes()) {
            let (_, value) = result.map_err(to_storage_io)?;
            let exercise: Exercise = serde_json::from_slice(&value).map_err(to_storage_data)?;
            out.push(exercise);
        }
        Ok(out)
    }

    fn get_exercise(&self, exercise_id: &ExerciseID) -> Result<Option<Exercise>, StorageError> {
        let Some(key) = self.index.get(exercise_id).map_err(to_storage_io)? else {
            return Ok(None);
        };
        let Some(raw) = self.exercises.get(key).map_err(to_storage_io)? else {
            return Ok(None);
        };
        let exercise = serde_json::from_slice(&raw).map_err(to_storage_data)?;
        Ok(Some(exercise))
    }

    fn insert_exercise(&self, exercise: &Exercise, run_id: u64) -> Result<(), StorageError> {
        let set = encode_set_prefix(&exercise.knowledge_graph, &exercise.exercises_creator);
        let seq = self.db.generate_id().map_err(to_storage_io)?;
        let key = encode_exercise_key(&set, seq);
        let value = serde_json::to_vec(exercise).map_err(to_storage_data)?;
        let owner = run_id.to_be_bytes();

        let result = (&self.sets, &self.exercises, &self.index).transaction(
            |(sets, exercises, index)| {
                match sets.get(set.as_bytes())? {
                    Some(current) if current.as_ref() != owner.as_slice() => {
                        return Err(ConflictableTransactionError::Abort(DuplicateKey::ExerciseSet {
                            knowledge_graph: exercise.knowledge_graph.clone(),
                            exercises_creator: exercise.exercises_creator.clone(),
                        }));
                    }
                    Some(_) => {}
                    None => {
                        sets.insert(set.as_bytes(), &owner[..])?;
                    }
                }
                if index.get(&exercise.exercise_id[..])?.is_some() {
                    return Err(ConflictableTransactionError::Abort(DuplicateKey::Exercise(
                        exercise.exercise_id,
                    )));
                }
                exercises.insert(key.as_bytes(), value.as_slice())?;
                index.insert(&exercise.exercise_id[..], key.as_bytes())?;
                Ok(())
            },
        );

        match result {
            Ok(()) => {}
            Err(TransactionError::Abort(duplicate)) => {
                return Err(StorageError::DuplicateKeyRace(duplicate))
            }
            Err(TransactionError::Storage(e)) => return Err(to_storage_io(e)),
        }
        debug!(exercise = %exercise.id_hex(), run_id, "Stored exercise");
        self.after_write()
    }

    fn get_grade(
        &self,
        exercise_id: &ExerciseID,
        exercises_grader: &str,
    ) -> Result<Option<GradedExercise>, StorageError> {
        let key = encode_grade_key(exercise_id, exercises_grader);
        let Some(raw) = self.grades.get(key.as_bytes()).map_err(to_storage_io)? else {
            return Ok(None);
        };
        let grade = serde_json::from_slice(&raw).map_err(to_storage_data)?;
        Ok(Some(grade))
    }

    fn has_grade(&self, exercise_id: &ExerciseID, exercises_grader: &str) -> Result<bool, StorageError> {
        let key = encode_grade_key(exercise_id, exercises_grader);
        self.grades.contains_key(key.as_bytes()).map_err(to_storage_io)
    }

    fn insert_grade(&self, grade: &GradedExercise) -> Result<(), StorageError> {
        if !self
            .index
            .contains_key(&grade.exercise_id)
            .map_err(to_storage_io)?
        {
            return Err(StorageError::ExerciseNotFound(hex::encode(grade.exercise_id)));
        }

        let key = encode_grade_key(&grade.exercise_id, &grade.exercises_grader);
        let value = serde_json::to_vec(grade).map_err(to_storage_data)?;
        let swapped = self
            .grades
            .compare_and_swap(key.as_bytes(), None::<&[u8]>, Some(value))
            .map_err(to_storage_io)?;
        if swapped.is_err() {
            return Err(StorageError::DuplicateKeyRace(DuplicateKey::Grade {
                exercise_id: grade.exercise_id,
                exercises_grader: grade.exercises_grader.clone(),
            }));
        }
        debug!(exercise = %hex::encode(grade.exercise_id), grader = %grade.exercises_grader, "Stored grade");
        self.after_write()
    }

    fn flush(&self) -> Result<(), StorageError> {
        self.db.flush().map_err(to_storage_io)?;
        Ok(())
    }
}

/// Unambiguous prefix for the set (knowledge graph, creator)
fn encode_set_prefix(knowledge_graph: &str, exercises_creator: &str) -> String {
    format!(
        "{}:{}{}:{}/",
        knowledge_graph.len(),
        knowledge_graph,
        exercises_creator.len(),
        exercises_creator
    )
}

fn encode_exercise_key(set: &str, seq: u64) -> String {
    format!("{set}{seq:0SEQ_KEY_PAD$}")
}

fn encode_grade_key(exercise_id: &ExerciseID, exercises_grader: &str) -> String {
    format!("{}:{}", hex::encode(exercise_id), exercises_grader)
}

fn to_storage_io(err: sled::Error) -> StorageError {
    StorageError::IoError(io::Error::new(io::ErrorKind::Other, err.to_string()))
}

fn to_storage_data(err: serde_json::Error) -> StorageError {
    StorageError::Serialization(err.to_string())
}
