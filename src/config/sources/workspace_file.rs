//! Workspace layer: `config/config.toml` under the workspace root, then the
//! file named after the active environment.

use config::ConfigError;
use std::path::{Path, PathBuf};

/// Environment variable selecting the env-specific workspace file
pub const ENV_NAME_VAR: &str = "DRILL_ENV";

const DEFAULT_ENV: &str = "development";

/// Active environment name; must be a plain file stem
pub fn env_name() -> Result<String, ConfigError> {
    let name = match std::env::var(ENV_NAME_VAR) {
        Ok(name) if !name.trim().is_empty() => name.trim().to_string(),
        _ => return Ok(DEFAULT_ENV.to_string()),
    };
    if name.contains(['/', '\\']) || name.starts_with('.') {
        return Err(ConfigError::Message(format!(
            "{} must name a file in config/, got '{}'",
            ENV_NAME_VAR, name
        )));
    }
    Ok(name)
}

/// Existing workspace config files, lowest precedence first
pub fn layered_files(workspace_root: &Path, env_name: &str) -> Vec<PathBuf> {
    let config_dir = workspace_root.join("config");
    [
        config_dir.join("config.toml"),
        config_dir.join(format!("{}.toml", env_name)),
    ]
    .into_iter()
    .filter(|path| path.is_file())
    .collect()
}
