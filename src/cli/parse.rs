//! CLI parse: clap types for drill. No behavior; definitions only.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Drill CLI - exercise generation and grading over knowledge graphs
#[derive(Parser)]
#[command(name = "drill")]
#[command(about = "Generate and grade multiple-choice exercises from knowledge graphs")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,
}

/// Output format of listing commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List installed behaviors per role
    Behaviors {
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// List configured components
    Components {
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Generate (or replay) exercises for a knowledge graph and grade them
    Run {
        /// Knowledge graph JSON file
        graph: PathBuf,
        /// Creator component id
        #[arg(long)]
        creator: String,
        /// Grader component id
        #[arg(long)]
        grader: String,
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Show graded exercises of a knowledge graph, best first
    Show {
        /// Knowledge graph id
        graph_id: String,
        /// Creator component id
        #[arg(long)]
        creator: String,
        /// Grader component id
        #[arg(long)]
        grader: String,
        /// Maximum number of exercises to show
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}
