//! CLI Tooling
//!
//! Command-line front end over [`Session`]. Each invocation loads the tree
//! when the command needs it, runs one operation and renders the result as
//! text or JSON.

use crate::cache::{EditCacheStore, SledEditCache};
use crate::config::MarkdriveConfig;
use crate::conflict::DecisionPrompt;
use crate::error::{ApiError, StorageError};
use crate::remote::{HttpRemoteStore, RemoteStore, WriteOutcome};
use crate::session::{DeleteOutcome, Session};
use crate::tooling::format::{
    format_attachments_text, format_file_list_text, format_history_text, format_nav_text,
    format_pending_edits_text, format_search_text, format_tree_text,
};
use crate::tooling::prompt::DialoguerPrompt;
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing::info;

/// Markdrive CLI - browse and edit a remote Markdown store
#[derive(Parser)]
#[command(name = "markdrive")]
#[command(about = "Browse and edit a remote Markdown store without losing unsaved edits")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (layered over the global config)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Fold the level, format and output flags into `config`. `--log-file`
    /// is handed to `init_logging` separately so it outranks the environment.
    pub fn apply_log_overrides(&self, config: &mut MarkdriveConfig) {
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.logging.format = format.clone();
        }
        if let Some(output) = &self.log_output {
            config.logging.output = output.clone();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the full file and folder tree
    Tree {
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Show folders with their Markdown file counts
    Folders {
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// List Markdown files directly inside a folder (root when omitted)
    Ls {
        folder: Option<String>,
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Print a file, resolving any cached unsaved edit first
    Open { path: String },
    /// Save a file from stdin or --file, staging it locally until the server confirms
    Save {
        path: String,
        /// Read content from this file instead of stdin
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Create a folder
    Mkdir {
        name: String,
        /// Parent folder (root when omitted)
        #[arg(long = "in")]
        parent: Option<String>,
    },
    /// Create an empty Markdown file
    Touch {
        name: String,
        /// Parent folder (root when omitted)
        #[arg(long = "in")]
        parent: Option<String>,
    },
    /// Rename a file or folder; a target containing '/' moves a file
    Mv {
        path: String,
        target: String,
        #[arg(long)]
        folder: bool,
    },
    /// Move to Recycle, or delete permanently when already there
    Rm {
        path: String,
        #[arg(long)]
        folder: bool,
    },
    /// List a file's versions, newest first
    History {
        path: String,
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Print one historical version
    Version { path: String, id: u64 },
    /// Write a historical version back as the current content
    Revert {
        path: String,
        id: u64,
        #[arg(long)]
        comment: Option<String>,
    },
    /// Full-text search
    Search {
        query: String,
        #[arg(long)]
        regex: bool,
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// List or delete a file's attachments
    Attachments {
        path: String,
        /// Delete this attachment path instead of listing
        #[arg(long)]
        delete: Option<String>,
    },
    /// Inspect the local edit cache
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum CacheCommands {
    /// List edits that have not reached the server
    List {
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration as TOML
    Show,
}

/// CLI context owning the runtime and the session
pub struct CliContext {
    runtime: Runtime,
    session: Session,
    config: MarkdriveConfig,
    prompt: Box<dyn DecisionPrompt>,
}

impl CliContext {
    /// Connect to the configured remote and open the edit cache on disk.
    pub fn new(config: MarkdriveConfig) -> Result<Self, ApiError> {
        config.validate()?;
        let remote = Arc::new(HttpRemoteStore::new(&config.remote)?);
        let cache_path = config.cache.resolve_path()?;
        let cache = Arc::new(SledEditCache::open(&cache_path)?);
        info!(cache = %cache_path.display(), remote = %config.remote.base_url, "Starting session");
        Self::with_parts(config, remote, cache, Box::new(DialoguerPrompt))
    }

    /// Assemble a context from explicit parts.
    pub fn with_parts(
        config: MarkdriveConfig,
        remote: Arc<dyn RemoteStore>,
        cache: Arc<dyn EditCacheStore>,
        prompt: Box<dyn DecisionPrompt>,
    ) -> Result<Self, ApiError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|e| ApiError::StorageError(StorageError::IoError(e)))?;
        Ok(Self {
            runtime,
            session: Session::new(remote, cache),
            config,
            prompt,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Execute a CLI command
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        self.runtime.block_on(self.execute_inner(command))
    }

    async fn execute_inner(&self, command: &Commands) -> Result<String, ApiError> {
        let session = &self.session;
        match command {
            Commands::Tree { format } => {
                let snapshot = session.load_tree().await?;
                match format {
                    OutputFormat::Json => to_json(snapshot.full_tree()),
                    OutputFormat::Text => Ok(format_tree_text(snapshot.full_tree())),
                }
            }
            Commands::Folders { format } => {
                let snapshot = session.load_tree().await?;
                match format {
                    OutputFormat::Json => to_json(&json!({
                        "markdown_files": snapshot.markdown_files(),
                        "folders": snapshot.nav_tree(),
                    })),
                    OutputFormat::Text => Ok(format_nav_text(
                        snapshot.nav_tree(),
                        snapshot.markdown_files(),
                    )),
                }
            }
            Commands::Ls { folder, format } => {
                session.load_tree().await?;
                let folder = folder.as_deref().unwrap_or("");
                let selection = session.select_folder(Some(folder))?;
                match format {
                    OutputFormat::Json => to_json(selection.files_in_folder()),
                    OutputFormat::Text => {
                        Ok(format_file_list_text(folder, selection.files_in_folder()))
                    }
                }
            }
            Commands::Open { path } => {
                session.load_tree().await?;
                let opened = session.open_file(path, self.prompt.as_ref()).await?;
                Ok(opened.content)
            }
            Commands::Save { path, file } => {
                let content = read_input(file.as_ref())?;
                match session.save_file(path, &content).await? {
                    WriteOutcome::Written { new_hash } => {
                        Ok(format!("Saved {} ({})", path, short_hash(&new_hash)))
                    }
                    WriteOutcome::NoChange => Ok(format!("No changes to save for {}", path)),
                }
            }
            Commands::Mkdir { name, parent } => {
                session.load_tree().await?;
                let in_root = parent.is_none();
                if let Some(parent) = parent {
                    session.select_folder(Some(parent.as_str()))?;
                }
                let created = session.create_folder(name, in_root).await?;
                Ok(format!("Created folder {}", created))
            }
            Commands::Touch { name, parent } => {
                session.load_tree().await?;
                session.select_folder(Some(parent.as_deref().unwrap_or("")))?;
                let created = session.create_file(name).await?;
                Ok(format!("Created {}", created))
            }
            Commands::Mv {
                path,
                target,
                folder,
            } => {
                session.load_tree().await?;
                let new_path = if *folder {
                    session.rename_folder(path, target).await?
                } else if target.contains('/') {
                    session.move_file(path, target).await?;
                    target.clone()
                } else {
                    session.rename_file(path, target).await?
                };
                Ok(format!("Moved {} -> {}", path, new_path))
            }
            Commands::Rm { path, folder } => {
                session.load_tree().await?;
                match session.delete(path, *folder).await? {
                    DeleteOutcome::Recycled { new_path } => {
                        Ok(format!("Moved {} to {}", path, new_path))
                    }
                    DeleteOutcome::Purged => Ok(format!("Deleted {} permanently", path)),
                }
            }
            Commands::History { path, format } => {
                let history = session.file_history(path).await?;
                match format {
                    OutputFormat::Json => to_json(&history),
                    OutputFormat::Text => Ok(format_history_text(path, &history)),
                }
            }
            Commands::Version { path, id } => session.file_version(path, *id).await,
            Commands::Revert { path, id, comment } => {
                session.apply_version(path, *id, comment.as_deref()).await?;
                Ok(format!("Reverted {} to version {}", path, id))
            }
            Commands::Search {
                query,
                regex,
                format,
            } => {
                let hits = session.search(query, *regex).await?;
                match format {
                    OutputFormat::Json => to_json(&hits),
                    OutputFormat::Text => Ok(format_search_text(query, &hits)),
                }
            }
            Commands::Attachments { path, delete } => match delete {
                Some(attach_path) => {
                    session.delete_attachment(path, attach_path).await?;
                    Ok(format!("Deleted attachment {}", attach_path))
                }
                None => {
                    let attachments = session.list_attachments(path).await?;
                    Ok(format_attachments_text(path, &attachments))
                }
            },
            Commands::Cache {
                command: CacheCommands::List { format },
            } => {
                let entries = session.pending_edits()?;
                match format {
                    OutputFormat::Json => to_json(&json!(entries
                        .iter()
                        .map(|e| json!({
                            "path": e.path,
                            "timestamp": e.timestamp.to_rfc3339(),
                            "bytes": e.content.len(),
                        }))
                        .collect::<Vec<_>>())),
                    OutputFormat::Text => Ok(format_pending_edits_text(&entries)),
                }
            }
            Commands::Config {
                command: ConfigCommands::Show,
            } => toml::to_string_pretty(&self.config)
                .map_err(|e| ApiError::ConfigError(format!("Failed to render config: {}", e))),
        }
    }
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ApiError::StorageError(StorageError::from(e)))
}

fn short_hash(hash: &str) -> &str {
    &hash[..hash.len().min(7)]
}

fn read_input(file: Option<&PathBuf>) -> Result<String, ApiError> {
    let content = match file {
        Some(path) => std::fs::read_to_string(path),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).map(|_| buf)
        }
    };
    content.map_err(|e| ApiError::StorageError(StorageError::IoError(e)))
}
