//! Exercises API
//!
//! Session-level orchestration over the configured components: selects a
//! creator and a grader, refuses disabled components, streams generation into
//! grading and reports what happened.

use crate::behavior::BehaviorRegistry;
use crate::component::{ComponentRecord, ExercisesCreator, ExercisesGrader};
use crate::config::{validation_failed, DrillConfig};
use crate::error::ApiError;
use crate::exercise::{Exercise, GradedExercise};
use crate::knowledge::KnowledgeGraph;
use crate::pipeline::{ExerciseGenerationPipeline, ExerciseRun, GradingPipeline, RunMode};
use crate::store::{ExerciseStore, SledExerciseStore};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Outcome of preparing the exercises of a graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// `None` when generation failed before the first exercise
    pub mode: Option<RunMode>,
    /// Exercises yielded by generation
    pub exercises: usize,
    /// Exercises persisted by this run
    pub persisted: usize,
    /// Grades persisted by this run
    pub graded: usize,
    /// Exercises that already had a grade
    pub skipped: usize,
    /// Another run claimed the exercise set while this one was generating.
    ///
    /// The exercises are then the other run's set as stored at that moment,
    /// which may still be growing; a later call sees the complete set.
    #[serde(default)]
    pub raced: bool,
}

/// Exercise with its grade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedExercise {
    pub exercise: Exercise,
    pub grade: GradedExercise,
}

/// Exercises API service
pub struct ExercisesApi {
    registry: Arc<BehaviorRegistry>,
    store: Arc<dyn ExerciseStore>,
    creators: BTreeMap<String, ExercisesCreator>,
    graders: BTreeMap<String, ExercisesGrader>,
    generation: ExerciseGenerationPipeline,
    grading: GradingPipeline,
}

impl ExercisesApi {
    /// Create an API without components
    pub fn new(registry: Arc<BehaviorRegistry>, store: Arc<dyn ExerciseStore>) -> Self {
        Self {
            generation: ExerciseGenerationPipeline::new(registry.clone(), store.clone()),
            grading: GradingPipeline::new(registry.clone(), store.clone()),
            registry,
            store,
            creators: BTreeMap::new(),
            graders: BTreeMap::new(),
        }
    }

    /// Build from validated configuration, opening the sled store of the workspace
    pub fn from_config(
        config: &DrillConfig,
        workspace_root: &Path,
        registry: BehaviorRegistry,
    ) -> Result<Self, ApiError> {
        config.validate().map_err(validation_failed)?;
        config.validate_behaviors(&registry).map_err(validation_failed)?;

        let store_path = config.storage.resolve_store_path(workspace_root);
        let store = SledExerciseStore::new(&store_path)?
            .with_durable_writes(config.storage.durable_writes);
        info!(store = %store_path.display(), "Opened exercise store");

        let mut api = Self::new(Arc::new(registry), Arc::new(store));
        for record in config.creators.values() {
            api.add_creator(record.clone());
        }
        for record in config.graders.values() {
            api.add_grader(record.clone());
        }
        Ok(api)
    }

    /// Add or replace a creator component
    pub fn add_creator(&mut self, record: ComponentRecord) -> &mut Self {
        self.creators
            .insert(record.component_id.clone(), ExercisesCreator::new(record));
        self
    }

    /// Add or replace a grader component
    pub fn add_grader(&mut self, record: ComponentRecord) -> &mut Self {
        self.graders
            .insert(record.component_id.clone(), ExercisesGrader::new(record));
        self
    }

    pub fn registry(&self) -> &BehaviorRegistry {
        &self.registry
    }

    pub fn store(&self) -> &Arc<dyn ExerciseStore> {
        &self.store
    }

    pub fn creators(&self) -> impl Iterator<Item = &ExercisesCreator> {
        self.creators.values()
    }

    pub fn graders(&self) -> impl Iterator<Item = &ExercisesGrader> {
        self.graders.values()
    }

    pub fn creator(&self, component_id: &str) -> Result<&ExercisesCreator, ApiError> {
        self.creators
            .get(component_id)
            .ok_or_else(|| ApiError::ComponentNotFound(format!("creator '{}'", component_id)))
    }

    pub fn grader(&self, component_id: &str) -> Result<&ExercisesGrader, ApiError> {
        self.graders
            .get(component_id)
            .ok_or_else(|| ApiError::ComponentNotFound(format!("grader '{}'", component_id)))
    }

    /// Lazy exercise sequence of an enabled creator
    pub fn exercises<'a>(
        &'a self,
        graph: &'a KnowledgeGraph,
        creator_id: &str,
    ) -> Result<ExerciseRun<'a>, ApiError> {
        let creator = self.creator(creator_id)?;
        if !creator.is_enabled() {
            return Err(ApiError::ComponentDisabled(creator.to_string()));
        }
        Ok(self.generation.run(graph, creator))
    }

    /// Generate (or replay) the exercises of a graph and grade them as they are produced.
    ///
    /// `Ok` with zero exercises means the creator produced nothing; any failure
    /// is an `Err`, with the items persisted before it left in place.
    pub fn prepare(
        &self,
        graph: &KnowledgeGraph,
        creator_id: &str,
        grader_id: &str,
    ) -> Result<RunSummary, ApiError> {
        let grader = self.grader(grader_id)?;
        if !grader.is_enabled() {
            return Err(ApiError::ComponentDisabled(grader.to_string()));
        }
        let mut run = self.exercises(graph, creator_id)?;

        let grading = self.grading.run(graph, grader, run.by_ref())?;
        let summary = RunSummary {
            mode: run.mode(),
            exercises: grading.exercises(),
            persisted: run.persisted(),
            graded: grading.graded,
            skipped: grading.skipped,
            raced: run.raced(),
        };
        info!(
            graph = graph.graph_id(),
            creator = creator_id,
            grader = grader_id,
            exercises = summary.exercises,
            graded = summary.graded,
            raced = summary.raced,
            "Prepared exercises"
        );
        Ok(summary)
    }

    /// Graded exercises of (graph, creator), best first.
    ///
    /// Ranked by quality (correctness times relevance) descending, then by
    /// difficulty ascending; ties keep storage order. Ungraded exercises are left out.
    pub fn graded_exercises(
        &self,
        graph_id: &str,
        creator_id: &str,
        grader_id: &str,
    ) -> Result<Vec<RankedExercise>, ApiError> {
        let mut ranked = Vec::new();
        for exercise in self.store.exercises_for(graph_id, creator_id)? {
            if let Some(grade) = self.store.get_grade(&exercise.exercise_id, grader_id)? {
                ranked.push(RankedExercise { exercise, grade });
            }
        }
        ranked.sort_by(|a, b| {
            b.grade
                .quality()
                .partial_cmp(&a.grade.quality())
                .unwrap_or(Ordering::Equal)
                .then_with(|| {
                    a.grade
                        .difficulty
                        .partial_cmp(&b.grade.difficulty)
                        .unwrap_or(Ordering::Equal)
                })
        });
        Ok(ranked)
    }
}
