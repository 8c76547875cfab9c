//! Grading pipeline.

use crate::behavior::BehaviorRegistry;
use crate::component::ExercisesGrader;
use crate::error::{ApiError, BehaviorError, StorageError};
use crate::exercise::{Exercise, GradedExercise};
use crate::knowledge::KnowledgeGraph;
use crate::store::ExerciseStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Counts reported by a grading run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradingSummary {
    /// Grades persisted by this run
    pub graded: usize,
    /// Exercises already graded by the same grader
    pub skipped: usize,
}

impl GradingSummary {
    /// Exercises pulled from upstream
    pub fn exercises(&self) -> usize {
        self.graded + self.skipped
    }
}

/// Grades exercise sequences with grader components
#[derive(Clone)]
pub struct GradingPipeline {
    registry: Arc<BehaviorRegistry>,
    store: Arc<dyn ExerciseStore>,
}

impl GradingPipeline {
    pub fn new(registry: Arc<BehaviorRegistry>, store: Arc<dyn ExerciseStore>) -> Self {
        Self { registry, store }
    }

    /// Grade every exercise pulled from `exercises`.
    ///
    /// The grader is set up for the graph's topic before the first pull and
    /// stays locked until the upstream is exhausted. Errors stop the run;
    /// grades persisted before the failure remain.
    pub fn run<I>(
        &self,
        graph: &KnowledgeGraph,
        grader: &ExercisesGrader,
        exercises: I,
    ) -> Result<GradingSummary, ApiError>
    where
        I: IntoIterator<Item = Result<Exercise, ApiError>>,
    {
        let mut behavior = grader.behavior(&self.registry)?;
        behavior
            .setup(graph.topic())
            .map_err(|source| runtime_error(grader, source))?;
        info!(
            graph = graph.graph_id(),
            grader = grader.id(),
            behavior = grader.behavior_name(),
            topic = %graph.topic(),
            "Grading exercises"
        );

        let mut summary = GradingSummary::default();
        for exercise in exercises {
            let exercise = exercise?;
            if self.store.has_grade(&exercise.exercise_id, grader.id())? {
                debug!(exercise = %exercise.id_hex(), grader = grader.id(), "Already graded");
                summary.skipped += 1;
                continue;
            }

            let grades = behavior
                .grade_one(&exercise)
                .and_then(|grades| grades.validate().map(|()| grades))
                .map_err(|source| runtime_error(grader, source))?;
            let graded = GradedExercise::new(&exercise, grader.id(), grades);
            match self.store.insert_grade(&graded) {
                Ok(()) => {
                    debug!(exercise = %exercise.id_hex(), grader = grader.id(), "Graded exercise");
                    summary.graded += 1;
                }
                Err(StorageError::DuplicateKeyRace(key)) => {
                    warn!(%key, "Grade persisted by another run");
                    summary.skipped += 1;
                }
                Err(err) => return Err(err.into()),
            }
        }

        info!(
            graph = graph.graph_id(),
            grader = grader.id(),
            graded = summary.graded,
            skipped = summary.skipped,
            "Grading finished"
        );
        Ok(summary)
    }
}

fn runtime_error(grader: &ExercisesGrader, source: BehaviorError) -> ApiError {
    ApiError::BehaviorRuntimeError {
        behavior_name: grader.behavior_name().to_string(),
        source,
    }
}
