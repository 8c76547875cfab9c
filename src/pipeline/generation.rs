//! Exercise generation pipeline.
//!
//! A run is a state machine advanced only by [`Iterator::next`]:
//!
//! ```text
//! Unstarted -> Replaying -> Done
//! Unstarted -> Generating -> Done
//! Generating -> Replaying        (another run claimed the set first)
//! ```
//!
//! Replay yields the persisted set of (graph, creator) in storage order without
//! binding the behavior. Generation persists every exercise before yielding it.

use crate::behavior::{BehaviorRegistry, DraftStream};
use crate::component::ExercisesCreator;
use crate::error::{ApiError, DuplicateKey, StorageError};
use crate::exercise::Exercise;
use crate::knowledge::KnowledgeGraph;
use crate::store::ExerciseStore;
use serde::{Deserialize, Serialize};
use std::iter::FusedIterator;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// How a run obtained its exercises
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Persisted exercises were returned, nothing was generated
    Replay,
    /// Exercises were generated and persisted by this run
    Fresh,
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunMode::Replay => write!(f, "replay"),
            RunMode::Fresh => write!(f, "fresh"),
        }
    }
}

/// Drives generator components over knowledge graphs
#[derive(Clone)]
pub struct ExerciseGenerationPipeline {
    registry: Arc<BehaviorRegistry>,
    store: Arc<dyn ExerciseStore>,
}

impl ExerciseGenerationPipeline {
    pub fn new(registry: Arc<BehaviorRegistry>, store: Arc<dyn ExerciseStore>) -> Self {
        Self { registry, store }
    }

    /// Lazy sequence of the exercises of (graph, creator).
    ///
    /// Nothing is read, generated or stored until the first pull.
    pub fn run<'a>(&'a self, graph: &'a KnowledgeGraph, creator: &'a ExercisesCreator) -> ExerciseRun<'a> {
        ExerciseRun {
            pipeline: self,
            graph,
            creator,
            state: RunState::Unstarted,
            mode: None,
            persisted: 0,
            raced: false,
        }
    }
}

enum RunState<'a> {
    Unstarted,
    Replaying(std::vec::IntoIter<Exercise>),
    Generating { run_id: u64, drafts: DraftStream<'a> },
    Done,
}

/// One generation run over (graph, creator)
pub struct ExerciseRun<'a> {
    pipeline: &'a ExerciseGenerationPipeline,
    graph: &'a KnowledgeGraph,
    creator: &'a ExercisesCreator,
    state: RunState<'a>,
    mode: Option<RunMode>,
    persisted: usize,
    raced: bool,
}

impl<'a> ExerciseRun<'a> {
    /// `None` until the first pull
    pub fn mode(&self) -> Option<RunMode> {
        self.mode
    }

    /// Number of exercises persisted by this run
    pub fn persisted(&self) -> usize {
        self.persisted
    }

    /// Whether this run lost the set claim to a concurrent run.
    ///
    /// A losing run replays the winner's exercises persisted up to the moment
    /// of the lost claim. The winner may still be adding to the set, so the
    /// replay can be a prefix of the final set.
    pub fn raced(&self) -> bool {
        self.raced
    }

    fn start(&mut self) -> Result<RunState<'a>, ApiError> {
        let graph_id = self.graph.graph_id();
        let existing = self.pipeline.store.exercises_for(graph_id, self.creator.id())?;
        if !existing.is_empty() {
            info!(
                graph = graph_id,
                creator = self.creator.id(),
                exercises = existing.len(),
                "Replaying persisted exercises"
            );
            return Ok(self.replay(existing));
        }

        let run_id = self.pipeline.store.allocate_run_id()?;
        let drafts = {
            let behavior = self.creator.behavior(&self.pipeline.registry)?;
            behavior.generate(self.graph)
        };
        info!(
            graph = graph_id,
            creator = self.creator.id(),
            behavior = self.creator.behavior_name(),
            run_id,
            "Generating exercises"
        );
        self.mode = Some(RunMode::Fresh);
        Ok(RunState::Generating { run_id, drafts })
    }

    fn replay(&mut self, exercises: Vec<Exercise>) -> RunState<'a> {
        self.mode = Some(RunMode::Replay);
        RunState::Replaying(exercises.into_iter())
    }

    fn finish(&self) {
        if self.mode == Some(RunMode::Fresh) {
            info!(
                graph = self.graph.graph_id(),
                creator = self.creator.id(),
                persisted = self.persisted,
                "Generation finished"
            );
        }
    }
}

impl<'a> Iterator for ExerciseRun<'a> {
    type Item = Result<Exercise, ApiError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match std::mem::replace(&mut self.state, RunState::Done) {
                RunState::Unstarted => match self.start() {
                    Ok(state) => self.state = state,
                    Err(err) => return Some(Err(err)),
                },
                RunState::Replaying(mut exercises) => {
                    let exercise = exercises.next()?;
                    self.state = RunState::Replaying(exercises);
                    return Some(Ok(exercise));
                }
                RunState::Generating { run_id, mut drafts } => {
                    let draft = match drafts.next() {
                        None => {
                            self.finish();
                            return None;
                        }
                        Some(Ok(draft)) => draft,
                        Some(Err(source)) => {
                            warn!(
                                creator = self.creator.id(),
                                persisted = self.persisted,
                                error = %source,
                                "Generation failed"
                            );
                            return Some(Err(ApiError::BehaviorRuntimeError {
                                behavior_name: self.creator.behavior_name().to_string(),
                                source,
                            }));
                        }
                    };

                    let exercise = Exercise::from_draft(draft, self.graph.graph_id(), self.creator.id());
                    match self.pipeline.store.insert_exercise(&exercise, run_id) {
                        Ok(()) => {
                            self.persisted += 1;
                            debug!(exercise = %exercise.id_hex(), "Generated exercise");
                            self.state = RunState::Generating { run_id, drafts };
                            return Some(Ok(exercise));
                        }
                        Err(StorageError::DuplicateKeyRace(DuplicateKey::Exercise(_))) => {
                            debug!(exercise = %exercise.id_hex(), "Skipping duplicate exercise");
                            self.state = RunState::Generating { run_id, drafts };
                        }
                        Err(StorageError::DuplicateKeyRace(DuplicateKey::ExerciseSet { .. })) => {
                            warn!(
                                graph = self.graph.graph_id(),
                                creator = self.creator.id(),
                                run_id,
                                "Exercise set claimed by another run, replaying its exercises"
                            );
                            self.raced = true;
                            let winner = match self
                                .pipeline
                                .store
                                .exercises_for(self.graph.graph_id(), self.creator.id())
                            {
                                Ok(exercises) => exercises,
                                Err(err) => return Some(Err(err.into())),
                            };
                            self.state = self.replay(winner);
                        }
                        Err(err) => return Some(Err(err.into())),
                    }
                }
                RunState::Done => return None,
            }
        }
    }
}

impl FusedIterator for ExerciseRun<'_> {}
