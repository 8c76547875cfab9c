//! Shared test utilities for integration tests
//!
//! Isolated XDG directories, temporary stores, the Lincoln knowledge graph and
//! instrumented behaviors that record what the pipelines ask of them.

use drill::behavior::{BehaviorRegistry, DraftStream, GeneratorBehavior, GraderBehavior};
use drill::error::BehaviorError;
use drill::exercise::{Exercise, ExerciseDraft, GradeDraft};
use drill::knowledge::namespaces::{
    PART_AFTER_TERM, PART_BEFORE_TERM, RDF_TYPE, SIMILAR_TERM, TERM, TERM_IN_SENTENCE,
};
use drill::knowledge::{KnowledgeGraph, Topic};
use drill::pipeline::{ExerciseGenerationPipeline, GradingPipeline};
use drill::store::{ExerciseStore, SledExerciseStore};
use drill::types::Parameters;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// Global mutex to serialize XDG environment variable access across all tests
static XDG_ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Environment variable state to restore after test
struct EnvState {
    home: Option<String>,
    xdg_config_home: Option<String>,
    drill_env: Option<String>,
}

impl EnvState {
    fn capture() -> Self {
        Self {
            home: std::env::var("HOME").ok(),
            xdg_config_home: std::env::var("XDG_CONFIG_HOME").ok(),
            drill_env: std::env::var("DRILL_ENV").ok(),
        }
    }

    fn restore(self) {
        for (name, value) in [
            ("HOME", self.home),
            ("XDG_CONFIG_HOME", self.xdg_config_home),
            ("DRILL_ENV", self.drill_env),
        ] {
            match value {
                Some(orig) => std::env::set_var(name, orig),
                None => std::env::remove_var(name),
            }
        }
    }
}

/// Run `f` with XDG_CONFIG_HOME and HOME pointing into `test_dir`
///
/// Environment variables are restored afterwards; a global mutex keeps
/// parallel tests from observing each other's environment.
pub fn with_xdg_env<F, R>(test_dir: &TempDir, f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = XDG_ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let env_state = EnvState::capture();

    let test_home = test_dir.path().join("home");
    std::fs::create_dir_all(&test_home).unwrap();
    std::env::set_var("HOME", &test_home);
    std::env::set_var("XDG_CONFIG_HOME", test_dir.path());
    std::env::remove_var("DRILL_ENV");

    let result = f();

    env_state.restore();
    result
}

pub const LINCOLN: &str = "http://dbpedia.org/resource/Abraham_Lincoln";
pub const KENTUCKY: &str = "http://dbpedia.org/resource/Kentucky";
pub const KANSAS: &str = "http://dbpedia.org/resource/Kansas";
pub const KENTUCKIANA: &str = "http://dbpedia.org/resource/Kentuckiana";

/// One term-in-sentence quasi-fact about Lincoln with two similar terms
pub fn lincoln_graph() -> KnowledgeGraph {
    KnowledgeGraph::new("kg-lincoln", Topic::new(LINCOLN))
        .with_triple("_:fact", RDF_TYPE, TERM_IN_SENTENCE)
        .with_triple("_:fact", PART_BEFORE_TERM, "Lincoln was born in")
        .with_triple("_:fact", TERM, KENTUCKY)
        .with_triple("_:fact", PART_AFTER_TERM, "in 1809")
        .with_triple(KENTUCKY, SIMILAR_TERM, KANSAS)
        .with_triple(KENTUCKIANA, SIMILAR_TERM, KENTUCKY)
}

pub fn numbered_draft(n: usize) -> ExerciseDraft {
    ExerciseDraft::new(json!({ "n": n }))
}

pub fn number_of(exercise: &Exercise) -> usize {
    exercise.data["n"].as_u64().unwrap() as usize
}

/// Shared, ordered log of behavior calls
#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn push(&self, event: impl Into<String>) {
        self.0.lock().unwrap().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count_prefix(&self, prefix: &str) -> usize {
        self.0.lock().unwrap().iter().filter(|e| e.starts_with(prefix)).count()
    }
}

/// Counters shared between a test and the behaviors it registers
#[derive(Clone, Default)]
pub struct Recorder {
    pub constructions: Arc<AtomicUsize>,
    pub generate_calls: Arc<AtomicUsize>,
    pub pulled: Arc<AtomicUsize>,
    pub log: EventLog,
}

impl Recorder {
    pub fn constructions(&self) -> usize {
        self.constructions.load(Ordering::SeqCst)
    }

    pub fn generate_calls(&self) -> usize {
        self.generate_calls.load(Ordering::SeqCst)
    }

    pub fn pulled(&self) -> usize {
        self.pulled.load(Ordering::SeqCst)
    }
}

/// Generator yielding `count` numbered drafts (unbounded without `count`),
/// failing after `fail_after` drafts when set
struct Numbers {
    count: Option<usize>,
    fail_after: Option<usize>,
    recorder: Recorder,
}

impl GeneratorBehavior for Numbers {
    fn generate<'g>(&self, _graph: &'g KnowledgeGraph) -> DraftStream<'g> {
        self.recorder.generate_calls.fetch_add(1, Ordering::SeqCst);
        let recorder = self.recorder.clone();
        let fail_after = self.fail_after;
        let numbers = (0..).take(self.count.unwrap_or(usize::MAX));
        Box::new(numbers.map(move |n| {
            recorder.pulled.fetch_add(1, Ordering::SeqCst);
            if fail_after == Some(n) {
                return Err(BehaviorError::Failed(format!("failed at draft {}", n)));
            }
            recorder.log.push(format!("generate:{}", n));
            Ok(numbered_draft(n))
        }))
    }
}

/// Generator yielding `count` numbered drafts, pausing before each one
struct Slow {
    count: usize,
    delay: Duration,
}

impl GeneratorBehavior for Slow {
    fn generate<'g>(&self, _graph: &'g KnowledgeGraph) -> DraftStream<'g> {
        let delay = self.delay;
        Box::new((0..self.count).map(move |n| {
            std::thread::sleep(delay);
            Ok::<_, BehaviorError>(numbered_draft(n))
        }))
    }
}

/// Generator whose draft duplicates the previous one
struct Repeating;

impl GeneratorBehavior for Repeating {
    fn generate<'g>(&self, _graph: &'g KnowledgeGraph) -> DraftStream<'g> {
        Box::new([0, 0, 1].into_iter().map(|n| Ok::<_, BehaviorError>(numbered_draft(n))))
    }
}

/// Generator that lets a rival run claim the exercise set right before
/// yielding its own first draft
struct Rival {
    store: Arc<SledExerciseStore>,
    creator_id: String,
}

impl GeneratorBehavior for Rival {
    fn generate<'g>(&self, graph: &'g KnowledgeGraph) -> DraftStream<'g> {
        let store = self.store.clone();
        let creator_id = self.creator_id.clone();
        let graph_id = graph.graph_id().to_string();
        Box::new((100..102).map(move |n| -> Result<ExerciseDraft, BehaviorError> {
            if n == 100 {
                let winner = Exercise::from_draft(numbered_draft(7), &graph_id, &creator_id);
                store
                    .insert_exercise(&winner, u64::MAX)
                    .map_err(|e| BehaviorError::Failed(e.to_string()))?;
            }
            Ok(numbered_draft(n))
        }))
    }
}

/// Grader logging its calls; grades `fail_on` with an error when set
struct Recording {
    fail_on: Option<usize>,
    recorder: Recorder,
}

impl GraderBehavior for Recording {
    fn setup(&mut self, topic: &Topic) -> Result<(), BehaviorError> {
        self.recorder.log.push(format!("setup:{}", topic.name()));
        Ok(())
    }

    fn grade_one(&self, exercise: &Exercise) -> Result<GradeDraft, BehaviorError> {
        let n = number_of(exercise);
        if self.fail_on == Some(n) {
            return Err(BehaviorError::Failed(format!("cannot grade {}", n)));
        }
        self.recorder.log.push(format!("grade:{}", n));
        Ok(GradeDraft::new(0.25, 1.0, 0.75))
    }
}

fn optional_count(params: &Parameters, name: &str) -> Option<usize> {
    params.get(name).and_then(|v| v.as_u64()).map(|n| n as usize)
}

/// Temporary store plus a registry with the built-ins and the test behaviors:
///
/// - generators `numbers` (`count`, `fail-after`), `slow` (`count`, `delay-ms`),
///   `repeating`, `rival`
/// - grader `recording` (`fail-on`)
pub struct Harness {
    _temp_dir: TempDir,
    pub store: Arc<SledExerciseStore>,
    pub registry: Arc<BehaviorRegistry>,
    pub recorder: Recorder,
}

impl Harness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(SledExerciseStore::new(temp_dir.path().join("store")).unwrap());
        let recorder = Recorder::default();

        let mut registry = BehaviorRegistry::with_builtins();
        let numbers_recorder = recorder.clone();
        registry.register_generator("Numbers", move |params: &Parameters| {
            numbers_recorder.constructions.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(Numbers {
                count: optional_count(params, "count"),
                fail_after: optional_count(params, "fail-after"),
                recorder: numbers_recorder.clone(),
            }) as Box<dyn GeneratorBehavior>)
        });
        registry.register_generator("Slow", |params: &Parameters| {
            Ok(Box::new(Slow {
                count: optional_count(params, "count").unwrap_or(1),
                delay: Duration::from_millis(optional_count(params, "delay-ms").unwrap_or(0) as u64),
            }) as Box<dyn GeneratorBehavior>)
        });
        registry.register_generator("Repeating", |_: &Parameters| {
            Ok(Box::new(Repeating) as Box<dyn GeneratorBehavior>)
        });
        let rival_store = store.clone();
        registry.register_generator("Rival", move |params: &Parameters| {
            let creator_id = params
                .get("creator-id")
                .and_then(|v| v.as_str())
                .ok_or_else(|| BehaviorError::InvalidParameter {
                    name: "creator-id".to_string(),
                    reason: "missing".to_string(),
                })?;
            Ok(Box::new(Rival {
                store: rival_store.clone(),
                creator_id: creator_id.to_string(),
            }) as Box<dyn GeneratorBehavior>)
        });
        let grader_recorder = recorder.clone();
        registry.register_grader("Recording", move |params: &Parameters| {
            Ok(Box::new(Recording {
                fail_on: optional_count(params, "fail-on"),
                recorder: grader_recorder.clone(),
            }) as Box<dyn GraderBehavior>)
        });

        Self {
            _temp_dir: temp_dir,
            store,
            registry: Arc::new(registry),
            recorder,
        }
    }

    pub fn generation(&self) -> ExerciseGenerationPipeline {
        ExerciseGenerationPipeline::new(self.registry.clone(), self.store.clone())
    }

    pub fn grading(&self) -> GradingPipeline {
        GradingPipeline::new(self.registry.clone(), self.store.clone())
    }

    pub fn stored_numbers(&self, graph_id: &str, creator_id: &str) -> Vec<usize> {
        self.store
            .exercises_for(graph_id, creator_id)
            .unwrap()
            .iter()
            .map(number_of)
            .collect()
    }
}
