//! MergeService: orchestrates sources, applies merge policy, deserializes to MarkdriveConfig.

use crate::config::sources::{environment, explicit_file, global_file};
use crate::config::MarkdriveConfig;
use config::ConfigError;
use std::path::Path;

use super::merge_policy;

/// Merge service for config composition.
pub struct MergeService;

impl MergeService {
    /// Load config from the standard sources.
    /// Precedence: defaults (lowest) -> global file -> explicit file -> environment (highest).
    pub fn load(explicit: Option<&Path>) -> Result<MarkdriveConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = match explicit {
            Some(path) => explicit_file::add_to_builder(builder, path)?,
            None => builder,
        };
        let builder = environment::add_to_builder(builder)?;

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Load config from a specific file over the defaults, without the
    /// global file or environment.
    pub fn load_from_file(path: &Path) -> Result<MarkdriveConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = explicit_file::add_to_builder(builder, path)?;

        let config = builder.build()?;
        config.try_deserialize()
    }
}
