//! Entry point for loading [`MarkdriveConfig`].

use super::merge::service::MergeService;
use super::MarkdriveConfig;
use config::ConfigError;
use std::path::Path;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Defaults, then the global file, then `explicit`, then `MARKDRIVE__*`
    /// variables. Validation is left to the caller.
    pub fn load(explicit: Option<&Path>) -> Result<MarkdriveConfig, ConfigError> {
        MergeService::load(explicit)
    }
}
