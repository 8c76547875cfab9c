//! Configuration sources.

pub mod component_tables;
pub mod environment;
pub mod global_file;
pub mod workspace_file;
