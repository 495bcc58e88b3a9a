//! CacheConfig and resolve_path for the edit cache database.

use crate::config::xdg;
use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Edit cache location.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Database directory; None means `$XDG_DATA_HOME/markdrive/edit-cache`
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl CacheConfig {
    /// Resolve the database directory to an actual filesystem location.
    pub fn resolve_path(&self) -> Result<PathBuf, ApiError> {
        match &self.path {
            Some(path) if !path.as_os_str().is_empty() => Ok(path.clone()),
            _ => Ok(xdg::app_data_dir()?.join("edit-cache")),
        }
    }
}
