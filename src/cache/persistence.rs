//! Sled-backed edit cache.

use super::{cache_key, CacheRecord, EditCacheEntry, EditCacheStore, CACHE_KEY_PREFIX};
use crate::error::StorageError;
use std::path::Path;

const TREE_NAME: &str = "edit_cache";

/// Edit cache persisted in a sled tree; every mutation is flushed.
pub struct SledEditCache {
    tree: sled::Tree,
}

impl SledEditCache {
    /// Open (or create) the cache database at `path`.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        std::fs::create_dir_all(path)?;
        let db = sled::open(path)?;
        Self::from_db(&db)
    }

    /// Throwaway database, removed on drop.
    pub fn temporary() -> Result<Self, StorageError> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(&db)
    }

    pub fn from_db(db: &sled::Db) -> Result<Self, StorageError> {
        Ok(Self {
            tree: db.open_tree(TREE_NAME)?,
        })
    }
}

impl EditCacheStore for SledEditCache {
    fn get(&self, path: &str) -> Result<Option<EditCacheEntry>, StorageError> {
        match self.tree.get(cache_key(path).as_bytes())? {
            Some(bytes) => {
                let record: CacheRecord = serde_json::from_slice(&bytes)?;
                Ok(Some(EditCacheEntry::from_record(path, record)?))
            }
            None => Ok(None),
        }
    }

    fn put(&self, entry: &EditCacheEntry) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec(&entry.to_record())?;
        self.tree.insert(cache_key(&entry.path).as_bytes(), bytes)?;
        self.tree.flush()?;
        Ok(())
    }

    fn remove(&self, path: &str) -> Result<bool, StorageError> {
        let existed = self.tree.remove(cache_key(path).as_bytes())?.is_some();
        self.tree.flush()?;
        Ok(existed)
    }

    fn list(&self) -> Result<Vec<EditCacheEntry>, StorageError> {
        let mut entries = Vec::new();
        for item in self.tree.scan_prefix(CACHE_KEY_PREFIX.as_bytes()) {
            let (key, value) = item?;
            let key = String::from_utf8(key.to_vec())
                .map_err(|e| StorageError::Serialization(format!("Invalid cache key: {}", e)))?;
            let path = &key[CACHE_KEY_PREFIX.len()..];
            let record: CacheRecord = serde_json::from_slice(&value)?;
            entries.push(EditCacheEntry::from_record(path, record)?);
        }
        Ok(entries)
    }
}
