//! End-to-end tests through the exercises API with the built-in behaviors

use crate::integration::test_utils::{lincoln_graph, KANSAS, KENTUCKIANA, KENTUCKY};
use drill::api::ExercisesApi;
use drill::behavior::BehaviorRegistry;
use drill::component::ComponentRecord;
use drill::error::ApiError;
use drill::knowledge::KnowledgeGraph;
use drill::pipeline::RunMode;
use drill::store::{ExerciseStore, SledExerciseStore};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

fn api(temp_dir: &TempDir) -> ExercisesApi {
    let store = SledExerciseStore::new(temp_dir.path().join("store")).unwrap();
    let mut api = ExercisesApi::new(Arc::new(BehaviorRegistry::with_builtins()), Arc::new(store));
    api.add_creator(ComponentRecord::new("quasi", "quasi"))
        .add_creator(ComponentRecord::new("quasi-off", "quasi").disabled())
        .add_grader(
            ComponentRecord::new("constant", "constant")
                .with_parameter("difficulty", json!(0.5))
                .with_parameter("correctness", json!(1.0))
                .with_parameter("relevance", json!(1.0)),
        )
        .add_grader(ComponentRecord::new("blind", "blind-guess"));
    api
}

#[test]
fn test_lincoln_exercise_generated_and_graded() {
    let temp_dir = TempDir::new().unwrap();
    let api = api(&temp_dir);
    let graph = lincoln_graph();

    let summary = api.prepare(&graph, "quasi", "constant").unwrap();
    assert_eq!(summary.mode, Some(RunMode::Fresh));
    assert_eq!(summary.exercises, 1);
    assert_eq!(summary.persisted, 1);
    assert_eq!(summary.graded, 1);

    let exercises = api.store().exercises_for("kg-lincoln", "quasi").unwrap();
    assert_eq!(exercises.len(), 1);
    let exercise = &exercises[0];
    assert_eq!(exercise.knowledge_graph, "kg-lincoln");
    assert_eq!(exercise.exercises_creator, "quasi");

    let mc = exercise.multiple_choice().unwrap();
    assert_eq!(mc.question, "Lincoln was born in _______ in 1809");
    assert_eq!(mc.choices, vec!["Kansas", "Kentuckiana", "Kentucky"]);
    assert_eq!(mc.correct_answer, "Kentucky");
    assert_eq!(
        exercise.semantics["term-pairs"],
        json!([["Kentucky", "Kansas"], ["Kentucky", "Kentuckiana"]])
    );
    assert_eq!(exercise.terms_counts()[KENTUCKY], 2);
    assert_eq!(exercise.terms_counts()[KANSAS], 1);
    assert_eq!(exercise.terms_counts()[KENTUCKIANA], 1);

    let grade = api
        .store()
        .get_grade(&exercise.exercise_id, "constant")
        .unwrap()
        .unwrap();
    assert_eq!(
        (grade.difficulty, grade.correctness, grade.relevance),
        (0.5, 1.0, 1.0)
    );
    assert_eq!(grade.exercises_grader, "constant");

    let ranked = api.graded_exercises("kg-lincoln", "quasi", "constant").unwrap();
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].grade, grade);
}

#[test]
fn test_second_preparation_replays_and_skips() {
    let temp_dir = TempDir::new().unwrap();
    let api = api(&temp_dir);
    let graph = lincoln_graph();

    api.prepare(&graph, "quasi", "constant").unwrap();
    let again = api.prepare(&graph, "quasi", "constant").unwrap();

    assert_eq!(again.mode, Some(RunMode::Replay));
    assert_eq!(again.exercises, 1);
    assert_eq!(again.persisted, 0);
    assert_eq!(again.graded, 0);
    assert_eq!(again.skipped, 1);
    assert_eq!(api.graded_exercises("kg-lincoln", "quasi", "constant").unwrap().len(), 1);
}

#[test]
fn test_blind_guess_grades_lincoln_exercise() {
    let temp_dir = TempDir::new().unwrap();
    let api = api(&temp_dir);
    let graph = lincoln_graph();

    api.prepare(&graph, "quasi", "blind").unwrap();
    let ranked = api.graded_exercises("kg-lincoln", "quasi", "blind").unwrap();
    assert_eq!(ranked.len(), 1);

    let grade = &ranked[0].grade;
    assert!((grade.difficulty - 2.0 / 3.0).abs() < 1e-9);
    assert_eq!(grade.correctness, 1.0);
    assert_eq!(grade.relevance, 1.0);
}

#[test]
fn test_disabled_creator_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let api = api(&temp_dir);
    let graph = lincoln_graph();

    let err = api.prepare(&graph, "quasi-off", "constant").unwrap_err();
    assert!(matches!(err, ApiError::ComponentDisabled(_)));
    assert!(api.store().exercises_for("kg-lincoln", "quasi-off").unwrap().is_empty());
}

#[test]
fn test_graph_loaded_from_json() {
    let temp_dir = TempDir::new().unwrap();
    let api = api(&temp_dir);
    let graph_file = temp_dir.path().join("lincoln.json");
    std::fs::write(
        &graph_file,
        serde_json::to_string(&lincoln_graph()).unwrap(),
    )
    .unwrap();

    let graph = KnowledgeGraph::from_json_file(&graph_file).unwrap();
    assert_eq!(graph, lincoln_graph());
    assert_eq!(api.prepare(&graph, "quasi", "constant").unwrap().graded, 1);
}

#[test]
fn test_store_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let graph = lincoln_graph();
    {
        let api = api(&temp_dir);
        api.prepare(&graph, "quasi", "constant").unwrap();
    }
    let api = api(&temp_dir);
    let summary = api.prepare(&graph, "quasi", "constant").unwrap();
    assert_eq!(summary.mode, Some(RunMode::Replay));
    assert_eq!(summary.skipped, 1);
}
