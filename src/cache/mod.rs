//! Edit Cache
//!
//! Local durable staging area keyed by file path. An entry is written right
//! before every remote save attempt and removed once the save is confirmed;
//! a surviving entry means an edit may not have reached the server.

pub mod persistence;

use crate::error::StorageError;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

pub use persistence::SledEditCache;

/// Prefix namespacing cache keys.
pub const CACHE_KEY_PREFIX: &str = "filecache_";

/// Storage key for a file path.
pub fn cache_key(path: &str) -> String {
    format!("{}{}", CACHE_KEY_PREFIX, path)
}

/// Staged body for one file path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditCacheEntry {
    pub path: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl EditCacheEntry {
    /// Entry stamped with the current time, at the millisecond precision
    /// the record is persisted with.
    pub fn stage(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            timestamp: Utc::now().trunc_subsecs(3),
        }
    }

    pub(crate) fn to_record(&self) -> CacheRecord {
        CacheRecord {
            content: self.content.clone(),
            timestamp: self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    pub(crate) fn from_record(path: &str, record: CacheRecord) -> Result<Self, StorageError> {
        let timestamp = DateTime::parse_from_rfc3339(&record.timestamp)
            .map_err(|e| {
                StorageError::Serialization(format!(
                    "Invalid cache timestamp for {}: {}",
                    path, e
                ))
            })?
            .with_timezone(&Utc);
        Ok(Self {
            path: path.to_string(),
            content: record.content,
            timestamp,
        })
    }
}

/// Persisted value layout: `{content, timestamp}` with an RFC 3339 timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct CacheRecord {
    pub content: String,
    pub timestamp: String,
}

/// Edit cache interface. At most one entry per path; `put` overwrites.
pub trait EditCacheStore: Send + Sync {
    fn get(&self, path: &str) -> Result<Option<EditCacheEntry>, StorageError>;

    /// Persist durably before returning.
    fn put(&self, entry: &EditCacheEntry) -> Result<(), StorageError>;

    /// Returns whether an entry existed.
    fn remove(&self, path: &str) -> Result<bool, StorageError>;

    fn list(&self) -> Result<Vec<EditCacheEntry>, StorageError>;
}
