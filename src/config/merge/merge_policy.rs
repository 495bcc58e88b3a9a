//! Built-in defaults every load starts from.

use crate::config::{default_api_version, default_base_url, default_timeout_secs};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

/// Builder seeded with the lowest-precedence defaults.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("remote.base_url", default_base_url())?
        .set_default("remote.api_version", default_api_version())?
        .set_default("remote.timeout_secs", default_timeout_secs() as i64)?
        .set_default("logging.level", "info")?
        .set_default("logging.format", "text")?
        .set_default("logging.output", "stderr")
}
