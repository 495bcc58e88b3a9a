//! Configuration
//!
//! Layered with the `config` crate. Precedence, lowest first: built-in
//! defaults, the global file `$XDG_CONFIG_HOME/markdrive/config.toml`, an
//! explicit `--config` file, then `MARKDRIVE__SECTION__KEY` environment
//! variables.

mod facade;
pub mod merge;
pub mod paths;
pub mod sources;
pub mod storage;

pub use facade::ConfigLoader;
pub use paths::xdg_root as xdg;
pub use storage::cache_paths::CacheConfig;

use crate::error::ApiError;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};

/// Environment variable holding the remote password, outside any config file.
pub const PASSWORD_ENV: &str = "MARKDRIVE_PASSWORD";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarkdriveConfig {
    #[serde(default)]
    pub remote: RemoteConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl MarkdriveConfig {
    /// Check values the deserializer cannot.
    pub fn validate(&self) -> Result<(), ApiError> {
        self.remote.validate()
    }
}

/// Remote Markdown service connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Service root, e.g. `http://localhost:8080`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub username: String,

    /// Prefer `MARKDRIVE_PASSWORD` over storing this in a file.
    #[serde(default, skip_serializing)]
    pub password: Option<String>,

    /// Sent as the `Api-Version` header.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

pub(crate) fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

pub(crate) fn default_api_version() -> String {
    "0.1".to_string()
}

pub(crate) fn default_timeout_secs() -> u64 {
    30
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            username: String::new(),
            password: None,
            api_version: default_api_version(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl RemoteConfig {
    /// Password from `MARKDRIVE_PASSWORD`, falling back to the configured one.
    pub fn resolved_password(&self) -> Option<String> {
        match std::env::var(PASSWORD_ENV) {
            Ok(value) if !value.is_empty() => Some(value),
            _ => self.password.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ApiError::ConfigError(format!(
                "remote.base_url must start with http:// or https://: {}",
                self.base_url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(ApiError::ConfigError(
                "remote.timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
