//! CLI presentation: text and json formatters per command.

use crate::api::{RankedExercise, RunSummary};
use crate::behavior::{BehaviorRegistry, BehaviorRole};
use crate::cli::OutputFormat;
use crate::component::ComponentRecord;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use serde_json::{json, Value};

fn to_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

fn table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(header);
    table
}

pub fn format_behaviors(registry: &BehaviorRegistry, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => {
            let roles: serde_json::Map<String, Value> = BehaviorRole::all()
                .into_iter()
                .map(|role| (role.to_string(), json!(registry.list(role))))
                .collect();
            to_json(&Value::Object(roles))
        }
        OutputFormat::Text => {
            let mut table = table(vec!["Role", "Behavior"]);
            for role in BehaviorRole::all() {
                for type_name in registry.list(role) {
                    table.add_row(vec![role.to_string(), type_name.to_string()]);
                }
            }
            table.to_string()
        }
    }
}

pub fn format_components<'a, I>(components: I, format: OutputFormat) -> String
where
    I: IntoIterator<Item = (BehaviorRole, &'a ComponentRecord)>,
{
    let components: Vec<(BehaviorRole, &ComponentRecord)> = components.into_iter().collect();
    match format {
        OutputFormat::Json => {
            let list: Vec<Value> = components
                .iter()
                .map(|(role, record)| {
                    json!({
                        "role": role,
                        "component_id": record.component_id,
                        "behavior_name": record.behavior_name,
                        "parameters": record.parameters,
                        "enabled": record.enabled,
                    })
                })
                .collect();
            to_json(&json!({ "components": list, "total": components.len() }))
        }
        OutputFormat::Text => {
            if components.is_empty() {
                return "No components configured.\n\nAdd [creators.<id>] or [graders.<id>] tables to config/config.toml.".to_string();
            }
            let mut table = table(vec!["Role", "Id", "Behavior", "Enabled", "Parameters"]);
            for (role, record) in &components {
                table.add_row(vec![
                    role.to_string(),
                    record.component_id.clone(),
                    record.behavior_name.clone(),
                    if record.enabled { "yes" } else { "no" }.to_string(),
                    Value::Object(record.parameters.clone()).to_string(),
                ]);
            }
            format!("{}\n\nTotal: {} component(s)", table, components.len())
        }
    }
}

pub fn format_run_summary(graph_id: &str, summary: &RunSummary, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => to_json(&json!({ "graph": graph_id, "summary": summary })),
        OutputFormat::Text => {
            let mode = summary
                .mode
                .map(|mode| mode.to_string())
                .unwrap_or_else(|| "-".to_string());
            let mut table = table(vec!["Graph", "Mode", "Exercises", "New", "Graded", "Already graded"]);
            table.add_row(vec![
                graph_id.to_string(),
                mode,
                summary.exercises.to_string(),
                summary.persisted.to_string(),
                summary.graded.to_string(),
                summary.skipped.to_string(),
            ]);
            if summary.raced {
                format!(
                    "{}\n\nAnother run was generating this set concurrently; run again for the complete set.",
                    table
                )
            } else {
                table.to_string()
            }
        }
    }
}

pub fn format_ranked_exercises(ranked: &[RankedExercise], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => {
            let list: Vec<Value> = ranked
                .iter()
                .map(|r| {
                    json!({
                        "exercise_id": r.exercise.id_hex(),
                        "data": r.exercise.data,
                        "difficulty": r.grade.difficulty,
                        "correctness": r.grade.correctness,
                        "relevance": r.grade.relevance,
                    })
                })
                .collect();
            to_json(&json!({ "exercises": list, "total": ranked.len() }))
        }
        OutputFormat::Text => {
            if ranked.is_empty() {
                return "No graded exercises.\n\nUse 'drill run' to generate and grade exercises.".to_string();
            }
            let mut table = table(vec!["Question", "Choices", "Answer", "Difficulty", "Quality"]);
            for r in ranked {
                let mut row = match r.exercise.multiple_choice() {
                    Some(mc) => vec![mc.question, mc.choices.join(", "), mc.correct_answer],
                    None => vec![r.exercise.data.to_string(), "-".to_string(), "-".to_string()],
                };
                row.push(format!("{:.2}", r.grade.difficulty));
                row.push(format!("{:.2}", r.grade.quality()));
                table.add_row(row);
            }
            table.to_string()
        }
    }
}
