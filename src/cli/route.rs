//! CLI route: builds the run context and dispatches commands.

use crate::api::ExercisesApi;
use crate::behavior::{BehaviorRegistry, BehaviorRole};
use crate::cli::parse::Commands;
use crate::cli::presentation::{
    format_behaviors, format_components, format_ranked_exercises, format_run_summary,
};
use crate::config::{ConfigLoader, DrillConfig};
use crate::error::ApiError;
use crate::knowledge::KnowledgeGraph;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Everything a command needs: configuration and the exercises API
pub struct RunContext {
    api: ExercisesApi,
    config: DrillConfig,
    workspace_root: PathBuf,
}

impl RunContext {
    /// Create run context from workspace root and optional config path.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = match config_path {
            Some(ref path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };
        let api = ExercisesApi::from_config(&config, &workspace_root, BehaviorRegistry::with_builtins())?;
        Ok(Self {
            api,
            config,
            workspace_root,
        })
    }

    pub fn api(&self) -> &ExercisesApi {
        &self.api
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Behaviors { format } => Ok(format_behaviors(self.api.registry(), *format)),
            Commands::Components { format } => {
                let components = BehaviorRole::all().into_iter().flat_map(|role| {
                    self.config
                        .components(role)
                        .values()
                        .map(move |record| (role, record))
                });
                Ok(format_components(components, *format))
            }
            Commands::Run {
                graph,
                creator,
                grader,
                format,
            } => {
                let graph_path = if graph.is_absolute() {
                    graph.clone()
                } else {
                    self.workspace_root.join(graph)
                };
                let graph = KnowledgeGraph::from_json_file(&graph_path)?;
                debug!(graph = graph.graph_id(), triples = graph.len(), "Loaded knowledge graph");
                let summary = self.api.prepare(&graph, creator, grader)?;
                Ok(format_run_summary(graph.graph_id(), &summary, *format))
            }
            Commands::Show {
                graph_id,
                creator,
                grader,
                limit,
                format,
            } => {
                self.api.creator(creator)?;
                self.api.grader(grader)?;
                let mut ranked = self.api.graded_exercises(graph_id, creator, grader)?;
                if let Some(limit) = limit {
                    ranked.truncate(*limit);
                }
                Ok(format_ranked_exercises(&ranked, *format))
            }
        }
    }
}
