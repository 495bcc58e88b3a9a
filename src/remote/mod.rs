//! Remote Store Client contract
//!
//! The narrow interface the core consumes from the backend: listing, file
//! read/write/rename/delete, directories, attachments, history and search.
//! Transport and authentication live behind this trait.

pub mod http;
pub mod memory;

use crate::error::ApiError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use http::HttpRemoteStore;
pub use memory::MemoryRemoteStore;

/// One entry of a listing; `children` is only populated by recursive listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteEntry {
    pub name: String,
    pub is_dir: bool,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub mod_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attach_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<RemoteEntry>>,
}

impl RemoteEntry {
    pub fn file(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            is_dir: false,
            size,
            mod_time: None,
            attach_count: None,
            children: None,
        }
    }

    pub fn directory(name: impl Into<String>, children: Vec<RemoteEntry>) -> Self {
        Self {
            name: name.into(),
            is_dir: true,
            size: 0,
            mod_time: None,
            attach_count: None,
            children: Some(children),
        }
    }
}

/// Body and hash of a Markdown file as stored remotely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileContent {
    #[serde(rename = "Path")]
    pub path: String,
    #[serde(rename = "SHA1")]
    pub content_hash: String,
    #[serde(rename = "Content")]
    pub content: String,
}

/// Result of a successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Written { new_hash: String },
    /// The remote already held identical content.
    NoChange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    #[serde(rename = "attachPath")]
    pub attach_path: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub mod_time: Option<DateTime<Utc>>,
}

/// One entry of a file's version history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionRecord {
    pub id: u64,
    #[serde(default)]
    pub old_sha1: String,
    #[serde(default)]
    pub new_sha1: String,
    #[serde(default)]
    pub patch: String,
    /// `full` or `patch`
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub comment: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub path: String,
    #[serde(default)]
    pub context: Vec<String>,
}

/// Remote store operations consumed by the core.
///
/// Each call is a single attempt; retries are the caller's decision. Listing
/// and reads fail with [`ApiError::RemoteFetch`] (or [`ApiError::NotFound`]),
/// mutations with [`ApiError::RemoteWrite`], and Markdown-only operations
/// reject other paths with [`ApiError::Validation`] before any network call.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn list_tree(&self, path: &str, recursive: bool) -> Result<Vec<RemoteEntry>, ApiError>;

    async fn read_file(&self, path: &str) -> Result<FileContent, ApiError>;

    async fn write_file(
        &self,
        path: &str,
        content: &str,
        comment: Option<&str>,
    ) -> Result<WriteOutcome, ApiError>;

    async fn create_directory(&self, path: &str) -> Result<(), ApiError>;

    async fn delete_directory(&self, path: &str) -> Result<(), ApiError>;

    async fn rename_directory(&self, old_path: &str, new_path: &str) -> Result<(), ApiError>;

    async fn rename_file(&self, old_path: &str, new_path: &str) -> Result<(), ApiError>;

    async fn delete_file(&self, path: &str) -> Result<(), ApiError>;

    async fn list_attachments(&self, md_path: &str) -> Result<Vec<Attachment>, ApiError>;

    async fn delete_attachment(&self, md_path: &str, attach_path: &str) -> Result<(), ApiError>;

    async fn file_history(&self, path: &str) -> Result<Vec<VersionRecord>, ApiError>;

    async fn file_version(&self, path: &str, version_id: u64) -> Result<String, ApiError>;

    async fn search(&self, query: &str, regex: bool) -> Result<Vec<SearchHit>, ApiError>;
}
