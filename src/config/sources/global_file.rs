//! Global config file source: $XDG_CONFIG_HOME/drill/config.toml or ~/.config/drill/config.toml

use std::path::PathBuf;
use tracing::debug;

/// Path to global config file.
pub fn global_config_path() -> Option<PathBuf> {
    let base = match std::env::var_os("XDG_CONFIG_HOME") {
        Some(xdg) if !xdg.is_empty() => PathBuf::from(xdg),
        _ => PathBuf::from(std::env::var_os("HOME")?).join(".config"),
    };
    Some(base.join("drill").join("config.toml"))
}

/// The global config file, if one exists
pub fn existing_path() -> Option<PathBuf> {
    let path = global_config_path()?;
    if !path.is_file() {
        debug!(config_path = %path.display(), "No global configuration file");
        return None;
    }
    Some(path.canonicalize().unwrap_or(path))
}
