//! Exercise entities: drafts produced by behaviors and their persisted forms.

use crate::error::BehaviorError;
use crate::knowledge::terms::name_to_term;
use crate::types::ExerciseID;
use blake3::Hasher;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Semantics key holding pairs of term names the learner has to tell apart
pub const TERM_PAIRS: &str = "term-pairs";

/// Exercise produced by a generator behavior, not yet persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseDraft {
    pub data: Value,
    #[serde(default = "empty_object")]
    pub semantics: Value,
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

impl ExerciseDraft {
    pub fn new(data: Value) -> Self {
        Self {
            data,
            semantics: empty_object(),
        }
    }

    pub fn with_semantics(mut self, semantics: Value) -> Self {
        self.semantics = semantics;
        self
    }
}

/// Multiple-choice payload shape used by the built-in behaviors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultipleChoice {
    pub question: String,
    pub choices: Vec<String>,
    #[serde(rename = "correct-answer")]
    pub correct_answer: String,
}

impl MultipleChoice {
    pub fn into_data(self) -> Value {
        json!({
            "question": self.question,
            "choices": self.choices,
            "correct-answer": self.correct_answer,
        })
    }

    pub fn from_data(data: &Value) -> Option<Self> {
        serde_json::from_value(data.clone()).ok()
    }

    /// Non-empty question, pairwise distinct choices, correct answer among them
    pub fn is_well_formed(&self) -> bool {
        if self.question.trim().is_empty() || self.choices.is_empty() {
            return false;
        }
        let mut seen = std::collections::HashSet::new();
        if !self.choices.iter().all(|c| seen.insert(c.as_str())) {
            return false;
        }
        self.choices.contains(&self.correct_answer)
    }
}

/// Persisted exercise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub exercise_id: ExerciseID,
    pub knowledge_graph: String,
    pub exercises_creator: String,
    pub data: Value,
    pub semantics: Value,
}

impl Exercise {
    /// Attach provenance to a draft and derive its identity
    pub fn from_draft(draft: ExerciseDraft, knowledge_graph: &str, exercises_creator: &str) -> Self {
        let exercise_id = compute_exercise_id(knowledge_graph, exercises_creator, &draft.data);
        Self {
            exercise_id,
            knowledge_graph: knowledge_graph.to_string(),
            exercises_creator: exercises_creator.to_string(),
            data: draft.data,
            semantics: draft.semantics,
        }
    }

    pub fn id_hex(&self) -> String {
        hex::encode(self.exercise_id)
    }

    pub fn multiple_choice(&self) -> Option<MultipleChoice> {
        MultipleChoice::from_data(&self.data)
    }

    /// Pairs of terms which need to be distinguished to solve the exercise.
    ///
    /// Stored names are mapped back to resource IRIs; malformed entries are ignored.
    pub fn term_pairs(&self) -> Vec<(String, String)> {
        let Some(pairs) = self.semantics.get(TERM_PAIRS).and_then(Value::as_array) else {
            return Vec::new();
        };
        pairs
            .iter()
            .filter_map(|pair| match pair.as_array().map(Vec::as_slice) {
                Some([Value::String(a), Value::String(b)]) => Some((name_to_term(a), name_to_term(b))),
                _ => None,
            })
            .collect()
    }

    /// Number of occurrences of each term in the term pairs
    pub fn terms_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for (a, b) in self.term_pairs() {
            *counts.entry(a).or_insert(0) += 1;
            *counts.entry(b).or_insert(0) += 1;
        }
        counts
    }
}

impl std::fmt::Display for Exercise {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<Exercise {} {}>", &self.id_hex()[..12], self.data)
    }
}

/// Compute the identity of an exercise
///
/// ExerciseID = hash("graph:" || graph || "creator:" || creator || "data:" || json(data))
///
/// `serde_json` serializes maps with sorted keys, so equal payloads hash equally.
pub fn compute_exercise_id(knowledge_graph: &str, exercises_creator: &str, data: &Value) -> ExerciseID {
    let mut hasher = Hasher::new();
    hasher.update(b"graph:");
    hasher.update(&(knowledge_graph.len() as u64).to_be_bytes());
    hasher.update(knowledge_graph.as_bytes());
    hasher.update(b"creator:");
    hasher.update(&(exercises_creator.len() as u64).to_be_bytes());
    hasher.update(exercises_creator.as_bytes());
    hasher.update(b"data:");
    hasher.update(data.to_string().as_bytes());
    *hasher.finalize().as_bytes()
}

/// Grades produced by a grader behavior for one exercise
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradeDraft {
    /// Probability that a user answers incorrectly
    pub difficulty: f64,
    /// Probability that the exercise is well-formed
    pub correctness: f64,
    /// Probability that the exercise pertains to the topic
    pub relevance: f64,
}

impl GradeDraft {
    pub fn new(difficulty: f64, correctness: f64, relevance: f64) -> Self {
        Self {
            difficulty,
            correctness,
            relevance,
        }
    }

    /// Every score must lie in [0, 1]
    pub fn validate(&self) -> Result<(), BehaviorError> {
        for (name, value) in [
            ("difficulty", self.difficulty),
            ("correctness", self.correctness),
            ("relevance", self.relevance),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(BehaviorError::InvalidGrade(format!(
                    "{} = {} is outside [0, 1]",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// Persisted grades of one exercise by one grader
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradedExercise {
    pub exercise_id: ExerciseID,
    pub exercises_grader: String,
    pub difficulty: f64,
    pub correctness: f64,
    pub relevance: f64,
}

impl GradedExercise {
    pub fn new(exercise: &Exercise, exercises_grader: &str, grades: GradeDraft) -> Self {
        Self {
            exercise_id: exercise.exercise_id,
            exercises_grader: exercises_grader.to_string(),
            difficulty: grades.difficulty,
            correctness: grades.correctness,
            relevance: grades.relevance,
        }
    }

    /// Probability that the exercise is both correct and on topic
    pub fn quality(&self) -> f64 {
        self.correctness * self.relevance
    }
}

impl std::fmt::Display for GradedExercise {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "<GradedExercise exercise={} difficulty={}, correctness={}, relevance={}>",
            &hex::encode(self.exercise_id)[..12],
            self.difficulty,
            self.correctness,
            self.relevance
        )
    }
}
