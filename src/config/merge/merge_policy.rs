//! Built-in defaults, the lowest precedence layer. Later layers override
//! individual keys; tables such as `[creators.<id>]` merge key by key.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

/// Create a Config builder with the defaults applied
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("storage.store_path", ".drill/store")?
        .set_default("storage.durable_writes", true)?
        .set_default("logging.level", "info")?
        .set_default("logging.format", "text")?
        .set_default("logging.output", "stderr")
}
