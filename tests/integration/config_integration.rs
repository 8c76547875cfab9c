//! Integration tests for Configuration System

use crate::integration::test_utils::{lincoln_graph, with_xdg_env};
use drill::api::ExercisesApi;
use drill::behavior::{BehaviorRegistry, BehaviorRole, DraftStream, GeneratorBehavior};
use drill::cli::{Commands, OutputFormat, RunContext};
use drill::config::{ConfigLoader, DrillConfig};
use drill::error::{ApiError, BehaviorError};
use drill::exercise::ExerciseDraft;
use drill::knowledge::KnowledgeGraph;
use drill::pipeline::RunMode;
use drill::types::Parameters;
use serde_json::json;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

const WORKSPACE_CONFIG: &str = r#"
[storage]
store_path = ".drill/store"

[creators.quasi]
behavior_name = "quasi"
parameters = { max-distractors = 2 }

[graders.constant]
behavior_name = "constant"
parameters = { difficulty = 0.5, correctness = 1.0, relevance = 1.0 }

[graders.blind]
behavior_name = "blind-guess"
enabled = false
"#;

fn write_workspace_config(workspace: &TempDir, content: &str) {
    let config_dir = workspace.path().join("config");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(config_dir.join("config.toml"), content).unwrap();
}

#[test]
fn test_config_builds_api_with_components() {
    let xdg = TempDir::new().unwrap();
    let workspace = TempDir::new().unwrap();
    write_workspace_config(&workspace, WORKSPACE_CONFIG);

    let config = with_xdg_env(&xdg, || ConfigLoader::load(workspace.path())).unwrap();
    assert!(config.validate().is_ok());

    let api = ExercisesApi::from_config(&config, workspace.path(), BehaviorRegistry::with_builtins())
        .unwrap();
    assert_eq!(api.creators().count(), 1);
    assert_eq!(api.graders().count(), 2);
    assert!(!api.grader("blind").unwrap().is_enabled());
    assert!(workspace.path().join(".drill").join("store").exists());

    let summary = api.prepare(&lincoln_graph(), "quasi", "constant").unwrap();
    assert_eq!(summary.mode, Some(RunMode::Fresh));
    assert_eq!(summary.graded, 1);
    assert!(matches!(
        api.prepare(&lincoln_graph(), "quasi", "blind"),
        Err(ApiError::ComponentDisabled(_))
    ));
}

#[test]
fn test_unknown_behavior_fails_api_construction() {
    let workspace = TempDir::new().unwrap();
    let mut config = DrillConfig::default();
    config.creators.insert(
        "mystery".to_string(),
        drill::component::ComponentRecord::new("mystery", "mystery"),
    );

    let err = ExercisesApi::from_config(&config, workspace.path(), BehaviorRegistry::with_builtins())
        .err()
        .unwrap();
    match err {
        ApiError::ConfigError(msg) => assert!(msg.contains("unknown behavior 'mystery'")),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_environment_overrides_files() {
    let xdg = TempDir::new().unwrap();
    let workspace = TempDir::new().unwrap();
    write_workspace_config(&workspace, WORKSPACE_CONFIG);

    let config = with_xdg_env(&xdg, || {
        std::env::set_var("DRILL__STORAGE__DURABLE_WRITES", "false");
        let config = ConfigLoader::load(workspace.path());
        std::env::remove_var("DRILL__STORAGE__DURABLE_WRITES");
        config
    })
    .unwrap();
    assert!(!config.storage.durable_writes);
    assert_eq!(config.storage.store_path, PathBuf::from(".drill/store"));
}

#[test]
fn test_env_specific_workspace_file() {
    let xdg = TempDir::new().unwrap();
    let workspace = TempDir::new().unwrap();
    write_workspace_config(&workspace, WORKSPACE_CONFIG);
    std::fs::write(
        workspace.path().join("config").join("ci.toml"),
        r#"
[graders.blind]
behavior_name = "blind-guess"
enabled = true
"#,
    )
    .unwrap();

    let config = with_xdg_env(&xdg, || {
        std::env::set_var("DRILL_ENV", "ci");
        ConfigLoader::load(workspace.path())
    })
    .unwrap();
    assert!(config.graders["blind"].enabled);
    assert!(config.components(BehaviorRole::Grader).contains_key("constant"));
}

#[test]
fn test_cli_context_runs_commands() {
    let workspace = TempDir::new().unwrap();
    let config_file = workspace.path().join("drill.toml");
    std::fs::write(&config_file, WORKSPACE_CONFIG).unwrap();
    std::fs::write(
        workspace.path().join("lincoln.json"),
        serde_json::to_string(&lincoln_graph()).unwrap(),
    )
    .unwrap();

    let context = RunContext::new(workspace.path().to_path_buf(), Some(config_file)).unwrap();

    let behaviors = context
        .execute(&Commands::Behaviors {
            format: OutputFormat::Text,
        })
        .unwrap();
    assert!(behaviors.contains("Quasi"));
    assert!(behaviors.contains("BlindGuess"));

    let components = context
        .execute(&Commands::Components {
            format: OutputFormat::Json,
        })
        .unwrap();
    let components: serde_json::Value = serde_json::from_str(&components).unwrap();
    assert_eq!(components["total"], 3);

    let run = context
        .execute(&Commands::Run {
            graph: PathBuf::from("lincoln.json"),
            creator: "quasi".to_string(),
            grader: "constant".to_string(),
            format: OutputFormat::Json,
        })
        .unwrap();
    let run: serde_json::Value = serde_json::from_str(&run).unwrap();
    assert_eq!(run["summary"]["mode"], "fresh");
    assert_eq!(run["summary"]["graded"], 1);

    let shown = context
        .execute(&Commands::Show {
            graph_id: "kg-lincoln".to_string(),
            creator: "quasi".to_string(),
            grader: "constant".to_string(),
            limit: Some(5),
            format: OutputFormat::Text,
        })
        .unwrap();
    assert!(shown.contains("Lincoln was born in _______ in 1809"));

    assert!(matches!(
        context.execute(&Commands::Show {
            graph_id: "kg-lincoln".to_string(),
            creator: "missing".to_string(),
            grader: "constant".to_string(),
            limit: None,
            format: OutputFormat::Text,
        }),
        Err(ApiError::ComponentNotFound(_))
    ));
}

/// Generator producing nothing
struct Silent;

impl GeneratorBehavior for Silent {
    fn generate<'g>(&self, _graph: &'g KnowledgeGraph) -> DraftStream<'g> {
        Box::new(std::iter::empty::<Result<ExerciseDraft, BehaviorError>>())
    }
}

#[test]
fn test_parameters_reach_factory_verbatim() {
    let xdg = TempDir::new().unwrap();
    let workspace = TempDir::new().unwrap();
    write_workspace_config(
        &workspace,
        r#"
[creators.QuasiMain]
behavior_name = "capture"
parameters = { maxDistractors = 2, Nested = { InnerKey = 1 } }
"#,
    );

    let received: Arc<Mutex<Option<Parameters>>> = Arc::default();
    let mut registry = BehaviorRegistry::with_builtins();
    let slot = received.clone();
    registry.register_generator("Capture", move |params: &Parameters| {
        *slot.lock().unwrap() = Some(params.clone());
        Ok(Box::new(Silent) as Box<dyn GeneratorBehavior>)
    });

    let config = with_xdg_env(&xdg, || ConfigLoader::load(workspace.path())).unwrap();
    let api = ExercisesApi::from_config(&config, workspace.path(), registry).unwrap();
    let graph = lincoln_graph();
    let mut run = api.exercises(&graph, "QuasiMain").unwrap();
    assert!(run.next().is_none());

    let params = received.lock().unwrap().clone().unwrap();
    assert_eq!(
        serde_json::Value::Object(params),
        json!({ "maxDistractors": 2, "Nested": { "InnerKey": 1 } })
    );
    assert_eq!(api.creator("QuasiMain").unwrap().id(), "QuasiMain");
}
