//! Configuration System
//!
//! Hierarchical configuration for the store, the configured components and
//! logging. Sources, lowest precedence first: built-in defaults, the global
//! file, workspace files, `DRILL__SECTION__KEY` environment variables.
//!
//! Components live in two tables keyed by component id. Ids and parameter
//! keys are kept exactly as written; environment variables do not reach them.
//!
//! ```toml
//! [creators.quasi]
//! behavior_name = "quasi"
//! parameters = { max-distractors = 3 }
//!
//! [graders.blind]
//! behavior_name = "blind-guess"
//! enabled = false
//! ```

use crate::behavior::{BehaviorRegistry, BehaviorRole};
use crate::component::ComponentRecord;
use crate::error::ApiError;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;
pub use sources::global_file::global_config_path;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DrillConfig {
    /// Exercise store settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Exercise creator components by id
    #[serde(default)]
    pub creators: BTreeMap<String, ComponentRecord>,

    /// Exercise grader components by id
    #[serde(default)]
    pub graders: BTreeMap<String, ComponentRecord>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Storage configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Sled database directory, relative paths resolve against the workspace root
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    /// Flush after every insert
    #[serde(default = "default_durable_writes")]
    pub durable_writes: bool,
}

fn default_store_path() -> PathBuf {
    PathBuf::from(".drill/store")
}

fn default_durable_writes() -> bool {
    true
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            durable_writes: default_durable_writes(),
        }
    }
}

impl StorageConfig {
    pub fn resolve_store_path(&self, workspace_root: &Path) -> PathBuf {
        if self.store_path.is_absolute() {
            self.store_path.clone()
        } else {
            workspace_root.join(&self.store_path)
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    Storage(String),
    Component(BehaviorRole, String, String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Storage(msg) => write!(f, "Storage: {}", msg),
            ValidationError::Component(role, id, msg) => {
                write!(f, "{} component '{}': {}", role, id, msg)
            }
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl DrillConfig {
    /// Component tables for a role
    pub fn components(&self, role: BehaviorRole) -> &BTreeMap<String, ComponentRecord> {
        match role {
            BehaviorRole::Generator => &self.creators,
            BehaviorRole::Grader => &self.graders,
        }
    }

    /// Fill omitted component ids from their table keys
    pub fn normalize(&mut self) {
        for (id, record) in self.creators.iter_mut().chain(self.graders.iter_mut()) {
            if record.component_id.is_empty() {
                record.component_id = id.clone();
            }
        }
    }

    /// Validate the entire configuration, reporting every invalid entry
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.storage.store_path.as_os_str().is_empty() {
            errors.push(ValidationError::Storage("Store path cannot be empty".to_string()));
        }

        for role in BehaviorRole::all() {
            for (id, record) in self.components(role) {
                if let Err(e) = record.validate() {
                    errors.push(ValidationError::Component(role, id.clone(), e));
                } else if record.component_id != *id {
                    errors.push(ValidationError::Component(
                        role,
                        id.clone(),
                        format!("component_id '{}' does not match its table key", record.component_id),
                    ));
                }
            }
        }

        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Check every configured behavior resolves in its role
    pub fn validate_behaviors(&self, registry: &BehaviorRegistry) -> Result<(), Vec<ValidationError>> {
        let errors: Vec<ValidationError> = BehaviorRole::all()
            .into_iter()
            .flat_map(|role| {
                self.components(role)
                    .iter()
                    .filter(move |(_, record)| !registry.contains(role, &record.behavior_name))
                    .map(move |(id, record)| {
                        ValidationError::Component(
                            role,
                            id.clone(),
                            format!("unknown behavior '{}'", record.behavior_name),
                        )
                    })
            })
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Join validation errors into a single configuration error
pub fn validation_failed(errors: Vec<ValidationError>) -> ApiError {
    let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
    ApiError::ConfigError(format!(
        "Configuration validation failed:\n{}",
        messages.join("\n")
    ))
}
