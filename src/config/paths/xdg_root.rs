//! XDG base directories for markdrive's config file and local data.

use crate::error::ApiError;
use std::path::PathBuf;

/// Directory name used under the XDG roots.
pub const APP_DIR: &str = "markdrive";

/// `$<var>` when set and non-empty, else `$HOME/<fallback>`.
fn xdg_dir(var: &str, fallback: &[&str]) -> Option<PathBuf> {
    match std::env::var(var) {
        Ok(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
        _ => std::env::var("HOME").ok().map(|home| {
            fallback
                .iter()
                .fold(PathBuf::from(home), |path, part| path.join(part))
        }),
    }
}

fn no_home(kind: &str) -> ApiError {
    ApiError::ConfigError(format!(
        "Could not determine XDG {} directory (HOME not set)",
        kind
    ))
}

pub fn data_home() -> Option<PathBuf> {
    xdg_dir("XDG_DATA_HOME", &[".local", "share"])
}

pub fn config_home() -> Result<PathBuf, ApiError> {
    xdg_dir("XDG_CONFIG_HOME", &[".config"]).ok_or_else(|| no_home("config home"))
}

/// `$XDG_CONFIG_HOME/markdrive/config.toml`
pub fn global_config_path() -> Result<PathBuf, ApiError> {
    Ok(config_home()?.join(APP_DIR).join("config.toml"))
}

/// `$XDG_DATA_HOME/markdrive`
pub fn app_data_dir() -> Result<PathBuf, ApiError> {
    data_home()
        .map(|dir| dir.join(APP_DIR))
        .ok_or_else(|| no_home("data home"))
}
