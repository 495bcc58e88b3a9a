//! `MARKDRIVE__SECTION__KEY` environment overlay.

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, Environment};

const ENV_PREFIX: &str = "MARKDRIVE";

/// `MARKDRIVE__REMOTE__BASE_URL=https://notes.example` sets `remote.base_url`.
/// Single-underscore variables such as `MARKDRIVE_LOG` are left to logging.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    ))
}
