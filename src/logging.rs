//! Structured logging via `tracing`.
//!
//! [`LoggingConfig`] is what the config layers and CLI flags produce. It is
//! resolved against the `MARKDRIVE_LOG*` environment variables into
//! [`LogSettings`] before the subscriber is installed. Logs go to stderr
//! unless told otherwise so command output on stdout stays clean.

use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

pub const LOG_ENV: &str = "MARKDRIVE_LOG";
pub const LOG_FORMAT_ENV: &str = "MARKDRIVE_LOG_FORMAT";
pub const LOG_OUTPUT_ENV: &str = "MARKDRIVE_LOG_OUTPUT";
pub const LOG_FILE_ENV: &str = "MARKDRIVE_LOG_FILE";
pub const LOG_MODULES_ENV: &str = "MARKDRIVE_LOG_MODULES";

const LOG_FILE_NAME: &str = "markdrive.log";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,

    /// trace, debug, info, warn, error or off
    #[serde(default = "default_level")]
    pub level: String,

    /// json or text
    #[serde(default = "default_format")]
    pub format: String,

    /// stdout, stderr, file, file+stderr or both
    #[serde(default = "default_output")]
    pub output: String,

    /// Log file when the output includes a file; the platform state dir otherwise.
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// ANSI colours for text logs on a terminal.
    #[serde(default = "enabled_by_default")]
    pub color: bool,

    /// Per-target levels, e.g. `markdrive::conflict = "debug"`.
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

fn enabled_by_default() -> bool {
    true
}

fn default_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "text".to_string()
}

fn default_output() -> String {
    "stderr".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_level(),
            format: default_format(),
            output: default_output(),
            file: None,
            color: true,
            modules: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(ApiError::ConfigError(format!(
                "Unknown log format '{}', expected json or text",
                other
            ))),
        }
    }
}

/// Where log lines are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSink {
    Stdout,
    Stderr,
    File,
    FileAndStderr,
    StdoutAndStderr,
}

impl LogSink {
    fn uses_file(self) -> bool {
        matches!(self, LogSink::File | LogSink::FileAndStderr)
    }
}

impl FromStr for LogSink {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stdout" => Ok(LogSink::Stdout),
            "stderr" => Ok(LogSink::Stderr),
            "file" => Ok(LogSink::File),
            "file+stderr" => Ok(LogSink::FileAndStderr),
            "both" => Ok(LogSink::StdoutAndStderr),
            other => Err(ApiError::ConfigError(format!(
                "Unknown log output '{}', expected stdout, stderr, file, file+stderr or both",
                other
            ))),
        }
    }
}

/// Logging settings after environment overrides are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub level: String,
    pub format: LogFormat,
    pub sink: LogSink,
    pub file: Option<PathBuf>,
    pub color: bool,
    /// `target=level` pairs in the order they are added to the filter.
    pub modules: Vec<(String, String)>,
}

impl LogSettings {
    /// Environment variables win over `config`. `cli_file` (the
    /// `--log-file` flag) wins over both.
    pub fn resolve(config: &LoggingConfig, cli_file: Option<&Path>) -> Result<Self, ApiError> {
        Self::resolve_with(config, cli_file, |key| std::env::var(key).ok())
    }

    fn resolve_with(
        config: &LoggingConfig,
        cli_file: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ApiError> {
        let present = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let format = present(LOG_FORMAT_ENV)
            .unwrap_or_else(|| config.format.clone())
            .parse()?;
        let sink = present(LOG_OUTPUT_ENV)
            .unwrap_or_else(|| config.output.clone())
            .parse()?;

        let mut modules: Vec<(String, String)> = config
            .modules
            .iter()
            .map(|(target, level)| (target.clone(), level.clone()))
            .collect();
        modules.sort();
        if let Some(spec) = present(LOG_MODULES_ENV) {
            modules.extend(spec.split(',').filter_map(|pair| {
                pair.split_once('=')
                    .map(|(target, level)| (target.trim().to_string(), level.trim().to_string()))
            }));
        }

        Ok(Self {
            level: config.level.clone(),
            format,
            sink,
            file: pick_log_file(
                cli_file.map(Path::to_path_buf),
                present(LOG_FILE_ENV).map(PathBuf::from),
                config.file.clone(),
            ),
            color: config.color,
            modules,
        })
    }

    fn filter(&self) -> Result<EnvFilter, ApiError> {
        if let Ok(filter) = EnvFilter::try_from_env(LOG_ENV) {
            return Ok(filter);
        }
        if self.level.eq_ignore_ascii_case("off") {
            return Ok(EnvFilter::new("off"));
        }
        self.modules
            .iter()
            .try_fold(EnvFilter::new(&self.level), |filter, (target, level)| {
                Ok(filter.add_directive(parse_directive(target, level)?))
            })
    }

    fn writer(&self) -> Result<BoxMakeWriter, ApiError> {
        Ok(match self.sink {
            LogSink::Stdout => BoxMakeWriter::new(std::io::stdout),
            LogSink::Stderr => BoxMakeWriter::new(std::io::stderr),
            LogSink::StdoutAndStderr => BoxMakeWriter::new(std::io::stdout.and(std::io::stderr)),
            LogSink::File | LogSink::FileAndStderr => {
                let path = match &self.file {
                    Some(path) => path.clone(),
                    None => platform_log_file()?,
                };
                let file = open_append(&path)?;
                if self.sink == LogSink::FileAndStderr {
                    BoxMakeWriter::new(file.and(std::io::stderr))
                } else {
                    BoxMakeWriter::new(file)
                }
            }
        })
    }
}

/// Log file precedence: CLI flag, `MARKDRIVE_LOG_FILE`, config. `None` means
/// the platform default.
fn pick_log_file(
    cli_file: Option<PathBuf>,
    env_file: Option<PathBuf>,
    config_file: Option<PathBuf>,
) -> Option<PathBuf> {
    [cli_file, env_file, config_file]
        .into_iter()
        .flatten()
        .find(|p| !p.as_os_str().is_empty())
}

fn platform_log_file() -> Result<PathBuf, ApiError> {
    let dirs = directories::ProjectDirs::from("", "markdrive", "markdrive").ok_or_else(|| {
        ApiError::ConfigError("No home directory to place the log file in".to_string())
    })?;
    // Only Linux has a state dir.
    let base = dirs.state_dir().unwrap_or_else(|| dirs.data_local_dir());
    Ok(base.join(LOG_FILE_NAME))
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(
    config: Option<&LoggingConfig>,
    cli_file: Option<&Path>,
) -> Result<(), ApiError> {
    let defaults = LoggingConfig::default();
    let config = config.unwrap_or(&defaults);

    if !config.enabled {
        return Registry::default()
            .with(EnvFilter::new("off"))
            .try_init()
            .map_err(install_error);
    }

    let settings = LogSettings::resolve(config, cli_file)?;
    let filter = settings.filter()?;
    let writer = settings.writer()?;
    let layer = fmt::layer()
        .with_target(true)
        .with_timer(ChronoUtc::rfc_3339());

    let registry = Registry::default().with(filter);
    let installed = match settings.format {
        LogFormat::Json => registry.with(layer.json().with_writer(writer)).try_init(),
        LogFormat::Text => registry
            .with(
                layer
                    .with_ansi(settings.color && !settings.sink.uses_file())
                    .with_writer(writer),
            )
            .try_init(),
    };
    installed.map_err(install_error)
}

fn install_error(err: impl std::fmt::Display) -> ApiError {
    ApiError::ConfigError(format!("Failed to install log subscriber: {}", err))
}

fn open_append(path: &Path) -> Result<File, ApiError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| {
            ApiError::ConfigError(format!("Cannot create log directory {}: {}", dir.display(), e))
        })?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| ApiError::ConfigError(format!("Cannot open log file {}: {}", path.display(), e)))
}

fn parse_directive(target: &str, level: &str) -> Result<Directive, ApiError> {
    format!("{}={}", target.trim(), level.trim())
        .parse()
        .map_err(|e| ApiError::ConfigError(format!("Bad log directive {}={}: {}", target, level, e)))
}
