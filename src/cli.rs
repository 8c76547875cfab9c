//! CLI domain: parse, route, output and presentation only.
//! No orchestration here; the route table dispatches to [`crate::api::ExercisesApi`].

mod output;
mod parse;
mod presentation;
mod route;

pub use output::map_error;
pub use parse::{Cli, Commands, OutputFormat};
pub use presentation::{
    format_behaviors, format_components, format_ranked_exercises, format_run_summary,
};
pub use route::RunContext;
