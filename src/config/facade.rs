//! Configuration loader composing the layered sources.

use super::merge::merge_policy;
use super::sources::{component_tables, environment, global_file, workspace_file};
use super::{DrillConfig, StorageConfig};
use crate::logging::LoggingConfig;
use config::{ConfigError, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Sections resolved through `config`; component tables are read separately
#[derive(Deserialize)]
struct Settings {
    #[serde(default)]
    storage: StorageConfig,
    #[serde(default)]
    logging: LoggingConfig,
}

/// Loads [`DrillConfig`] from its layered sources
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace.
    ///
    /// Defaults, then the global file, then `config/config.toml` and
    /// `config/{DRILL_ENV}.toml` under `workspace_root`, then environment
    /// variables. Environment variables reach `storage` and `logging` only.
    pub fn load(workspace_root: &Path) -> Result<DrillConfig, ConfigError> {
        let mut files: Vec<PathBuf> = global_file::existing_path().into_iter().collect();
        files.extend(workspace_file::layered_files(
            workspace_root,
            &workspace_file::env_name()?,
        ));

        let config = Self::assemble(&files, true)?;
        debug!(
            workspace = %workspace_root.display(),
            files = files.len(),
            creators = config.creators.len(),
            graders = config.graders.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Load configuration from a single file on top of the defaults
    pub fn load_from_file(path: &Path) -> Result<DrillConfig, ConfigError> {
        Self::assemble(&[path.to_path_buf()], false)
    }

    fn assemble(files: &[PathBuf], with_environment: bool) -> Result<DrillConfig, ConfigError> {
        let mut builder = merge_policy::builder_with_defaults()?;
        for path in files {
            builder = builder.add_source(File::from(path.as_path()).required(true));
        }
        if with_environment {
            builder = environment::add_to_builder(builder);
        }
        let settings: Settings = builder.build()?.try_deserialize()?;
        let tables = component_tables::load(files)?;

        let mut config = DrillConfig {
            storage: settings.storage,
            creators: tables.creators,
            graders: tables.graders,
            logging: settings.logging,
        };
        config.normalize();
        Ok(config)
    }
}
