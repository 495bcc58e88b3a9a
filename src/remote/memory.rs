//! In-process remote store
//!
//! Keeps the whole tree in a path-keyed map. Used by the test suites and for
//! offline experiments; supports failure injection for listings and writes.

use super::{
    Attachment, FileContent, RemoteEntry, RemoteStore, SearchHit, VersionRecord, WriteOutcome,
};
use crate::error::ApiError;
use crate::tree::path;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

#[derive(Debug, Clone)]
enum MemEntry {
    Directory {
        mod_time: DateTime<Utc>,
    },
    File {
        content: String,
        hash: String,
        mod_time: DateTime<Utc>,
    },
}

#[derive(Debug, Clone)]
struct StoredVersion {
    record: VersionRecord,
    content: String,
}

#[derive(Default)]
struct MemState {
    entries: BTreeMap<String, MemEntry>,
    history: HashMap<String, Vec<StoredVersion>>,
    attachments: HashMap<String, Vec<Attachment>>,
    next_version_id: u64,
}

/// Remote store backed by memory.
#[derive(Default)]
pub struct MemoryRemoteStore {
    state: RwLock<MemState>,
    fail_listing: AtomicBool,
    fail_writes: AtomicBool,
    list_calls: AtomicUsize,
    write_calls: AtomicUsize,
}

/// Stable hex digest standing in for the server's content hash.
fn content_hash(content: &str) -> String {
    blake3::hash(content.as_bytes()).to_hex().to_string()
}

impl MemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a directory, creating missing ancestors.
    pub fn with_dir(self, dir: &str) -> Self {
        self.insert_dir_all(dir);
        self
    }

    /// Add a file, creating missing ancestors. Not recorded in history.
    pub fn with_file(self, file: &str, content: &str) -> Self {
        self.insert_dir_all(path::parent(file));
        self.state.write().entries.insert(
            file.to_string(),
            MemEntry::File {
                content: content.to_string(),
                hash: content_hash(content),
                mod_time: Utc::now(),
            },
        );
        self
    }

    /// Register an attachment for a Markdown file.
    pub fn with_attachment(self, md_path: &str, name: &str, size: u64) -> Self {
        let attach_path = format!("{}.attach/{}", path::file_name(md_path), name);
        self.state
            .write()
            .attachments
            .entry(md_path.to_string())
            .or_default()
            .push(Attachment {
                name: name.to_string(),
                attach_path,
                size,
                mod_time: Some(Utc::now()),
            });
        self
    }

    fn insert_dir_all(&self, dir: &str) {
        if dir.is_empty() {
            return;
        }
        let mut state = self.state.write();
        let mut current = String::new();
        for segment in dir.split('/') {
            current = path::join(&current, segment);
            state
                .entries
                .entry(current.clone())
                .or_insert(MemEntry::Directory {
                    mod_time: Utc::now(),
                });
        }
    }

    /// Make every listing fail until reset.
    pub fn set_fail_listing(&self, fail: bool) {
        self.fail_listing.store(fail, Ordering::SeqCst);
    }

    /// Make every mutating call fail until reset.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn write_calls(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }

    pub fn content_of(&self, file: &str) -> Option<String> {
        match self.state.read().entries.get(file) {
            Some(MemEntry::File { content, .. }) => Some(content.clone()),
            _ => None,
        }
    }

    pub fn exists(&self, entry: &str) -> bool {
        self.state.read().entries.contains_key(entry)
    }

    /// Paths of every entry, in key order.
    pub fn paths(&self) -> Vec<String> {
        self.state.read().entries.keys().cloned().collect()
    }

    fn begin_write(&self) -> Result<(), ApiError> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ApiError::RemoteWrite(
                "simulated network failure".to_string(),
            ));
        }
        Ok(())
    }

    fn parent_exists(state: &MemState, entry: &str) -> bool {
        let parent = path::parent(entry);
        parent.is_empty()
            || matches!(state.entries.get(parent), Some(MemEntry::Directory { .. }))
    }

    fn children_of(state: &MemState, dir: &str, recursive: bool) -> Vec<RemoteEntry> {
        state
            .entries
            .iter()
            .filter(|(key, _)| !key.is_empty() && path::parent(key) == dir && key.as_str() != dir)
            .map(|(key, entry)| match entry {
                MemEntry::Directory { mod_time } => RemoteEntry {
                    name: path::file_name(key).to_string(),
                    is_dir: true,
                    size: 0,
                    mod_time: Some(*mod_time),
                    attach_count: None,
                    children: if recursive {
                        Some(Self::children_of(state, key, true))
                    } else {
                        None
                    },
                },
                MemEntry::File {
                    content, mod_time, ..
                } => RemoteEntry {
                    name: path::file_name(key).to_string(),
                    is_dir: false,
                    size: content.len() as u64,
                    mod_time: Some(*mod_time),
                    attach_count: state
                        .attachments
                        .get(key)
                        .map(|list| list.len() as u32)
                        .filter(|count| *count > 0),
                    children: None,
                },
            })
            .collect()
    }

    /// Move `old` and everything beneath it to `new`.
    fn move_subtree(state: &mut MemState, old: &str, new: &str) {
        let prefix = format!("{}/", old);
        let moved: Vec<(String, MemEntry)> = state
            .entries
            .iter()
            .filter(|(key, _)| key.as_str() == old || key.starts_with(&prefix))
            .map(|(key, entry)| (key.clone(), entry.clone()))
            .collect();
        for (key, entry) in moved {
            state.entries.remove(&key);
            let renamed = format!("{}{}", new, &key[old.len()..]);
            if let Some(history) = state.history.remove(&key) {
                state.history.insert(renamed.clone(), history);
            }
            state.entries.insert(renamed, entry);
        }
    }
}

#[async_trait]
impl RemoteStore for MemoryRemoteStore {
    async fn list_tree(&self, dir: &str, recursive: bool) -> Result<Vec<RemoteEntry>, ApiError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(ApiError::RemoteFetch(
                "simulated listing failure".to_string(),
            ));
        }
        let state = self.state.read();
        if !dir.is_empty() && !matches!(state.entries.get(dir), Some(MemEntry::Directory { .. })) {
            return Err(ApiError::NotFound(dir.to_string()));
        }
        Ok(Self::children_of(&state, dir, recursive))
    }

    async fn read_file(&self, file: &str) -> Result<FileContent, ApiError> {
        match self.state.read().entries.get(file) {
            Some(MemEntry::File { content, hash, .. }) => Ok(FileContent {
                path: file.to_string(),
                content_hash: hash.clone(),
                content: content.clone(),
            }),
            _ => Err(ApiError::NotFound(file.to_string())),
        }
    }

    async fn write_file(
        &self,
        file: &str,
        content: &str,
        comment: Option<&str>,
    ) -> Result<WriteOutcome, ApiError> {
        path::ensure_markdown(file)?;
        self.begin_write()?;
        let mut state = self.state.write();
        if !Self::parent_exists(&state, file) {
            return Err(ApiError::RemoteWrite(format!(
                "Parent directory does not exist: {}",
                path::parent(file)
            )));
        }
        let old_hash = match state.entries.get(file) {
            Some(MemEntry::File { hash, content: existing, .. }) => {
                if existing == content {
                    return Ok(WriteOutcome::NoChange);
                }
                hash.clone()
            }
            Some(MemEntry::Directory { .. }) => {
                return Err(ApiError::RemoteWrite(format!("{} is a directory", file)));
            }
            None => String::new(),
        };
        let new_hash = content_hash(content);
        let now = Utc::now();
        state.entries.insert(
            file.to_string(),
            MemEntry::File {
                content: content.to_string(),
                hash: new_hash.clone(),
                mod_time: now,
            },
        );
        state.next_version_id += 1;
        let record = VersionRecord {
            id: state.next_version_id,
            kind: if old_hash.is_empty() { "full" } else { "patch" }.to_string(),
            old_sha1: old_hash,
            new_sha1: new_hash.clone(),
            patch: String::new(),
            comment: comment.unwrap_or_default().to_string(),
            timestamp: now,
        };
        state
            .history
            .entry(file.to_string())
            .or_default()
            .push(StoredVersion {
                record,
                content: content.to_string(),
            });
        Ok(WriteOutcome::Written { new_hash })
    }

    async fn create_directory(&self, dir: &str) -> Result<(), ApiError> {
        self.begin_write()?;
        let mut state = self.state.write();
        if !Self::parent_exists(&state, dir) {
            return Err(ApiError::RemoteWrite(format!(
                "Parent directory does not exist: {}",
                path::parent(dir)
            )));
        }
        match state.entries.get(dir) {
            Some(MemEntry::File { .. }) => Err(ApiError::RemoteWrite(format!(
                "A file already exists at {}",
                dir
            ))),
            Some(MemEntry::Directory { .. }) => Ok(()),
            None => {
                state.entries.insert(
                    dir.to_string(),
                    MemEntry::Directory {
                        mod_time: Utc::now(),
                    },
                );
                Ok(())
            }
        }
    }

    async fn delete_directory(&self, dir: &str) -> Result<(), ApiError> {
        self.begin_write()?;
        let mut state = self.state.write();
        if !matches!(state.entries.get(dir), Some(MemEntry::Directory { .. })) {
            return Err(ApiError::NotFound(dir.to_string()));
        }
        let prefix = format!("{}/", dir);
        state
            .entries
            .retain(|key, _| key.as_str() != dir && !key.starts_with(&prefix));
        Ok(())
    }

    async fn rename_directory(&self, old_path: &str, new_path: &str) -> Result<(), ApiError> {
        self.begin_write()?;
        let mut state = self.state.write();
        if !matches!(state.entries.get(old_path), Some(MemEntry::Directory { .. })) {
            return Err(ApiError::NotFound(old_path.to_string()));
        }
        if state.entries.contains_key(new_path) {
            return Err(ApiError::RemoteWrite(format!("{} already exists", new_path)));
        }
        if !Self::parent_exists(&state, new_path) {
            return Err(ApiError::RemoteWrite(format!(
                "Parent directory does not exist: {}",
                path::parent(new_path)
            )));
        }
        Self::move_subtree(&mut state, old_path, new_path);
        Ok(())
    }

    async fn rename_file(&self, old_path: &str, new_path: &str) -> Result<(), ApiError> {
        path::ensure_markdown(new_path)?;
        self.begin_write()?;
        let mut state = self.state.write();
        if !matches!(state.entries.get(old_path), Some(MemEntry::File { .. })) {
            return Err(ApiError::NotFound(old_path.to_string()));
        }
        if state.entries.contains_key(new_path) {
            return Err(ApiError::RemoteWrite(format!("{} already exists", new_path)));
        }
        if !Self::parent_exists(&state, new_path) {
            return Err(ApiError::RemoteWrite(format!(
                "Parent directory does not exist: {}",
                path::parent(new_path)
            )));
        }
        Self::move_subtree(&mut state, old_path, new_path);
        if let Some(attachments) = state.attachments.remove(old_path) {
            state.attachments.insert(new_path.to_string(), attachments);
        }
        Ok(())
    }

    async fn delete_file(&self, file: &str) -> Result<(), ApiError> {
        self.begin_write()?;
        let mut state = self.state.write();
        match state.entries.get(file) {
            Some(MemEntry::File { .. }) => {
                state.entries.remove(file);
                state.attachments.remove(file);
                Ok(())
            }
            _ => Err(ApiError::NotFound(file.to_string())),
        }
    }

    async fn list_attachments(&self, md_path: &str) -> Result<Vec<Attachment>, ApiError> {
        let state = self.state.read();
        if !matches!(state.entries.get(md_path), Some(MemEntry::File { .. })) {
            return Err(ApiError::NotFound(md_path.to_string()));
        }
        Ok(state.attachments.get(md_path).cloned().unwrap_or_default())
    }

    async fn delete_attachment(&self, md_path: &str, attach_path: &str) -> Result<(), ApiError> {
        self.begin_write()?;
        let mut state = self.state.write();
        let list = state
            .attachments
            .get_mut(md_path)
            .ok_or_else(|| ApiError::NotFound(md_path.to_string()))?;
        let before = list.len();
        list.retain(|a| a.attach_path != attach_path);
        if list.len() == before {
            return Err(ApiError::NotFound(attach_path.to_string()));
        }
        Ok(())
    }

    async fn file_history(&self, file: &str) -> Result<Vec<VersionRecord>, ApiError> {
        Ok(self
            .state
            .read()
            .history
            .get(file)
            .map(|versions| versions.iter().map(|v| v.record.clone()).collect())
            .unwrap_or_default())
    }

    async fn file_version(&self, file: &str, version_id: u64) -> Result<String, ApiError> {
        self.state
            .read()
            .history
            .get(file)
            .and_then(|versions| versions.iter().find(|v| v.record.id == version_id))
            .map(|v| v.content.clone())
            .ok_or_else(|| ApiError::NotFound(format!("{} version {}", file, version_id)))
    }

    async fn search(&self, query: &str, regex: bool) -> Result<Vec<SearchHit>, ApiError> {
        if regex {
            return Err(ApiError::Validation(
                "Regex search is not supported by the in-memory store".to_string(),
            ));
        }
        let state = self.state.read();
        let hits = state
            .entries
            .iter()
            .filter_map(|(key, entry)| match entry {
                MemEntry::File { content, .. } if path::is_markdown(key) => {
                    let context: Vec<String> = content
                        .lines()
                        .enumerate()
                        .filter(|(_, line)| line.contains(query))
                        .map(|(idx, line)| format!("{}: {}", idx + 1, line))
                        .collect();
                    if context.is_empty() {
                        None
                    } else {
                        Some(SearchHit {
                            path: key.clone(),
                            context,
                        })
                    }
                }
                _ => None,
            })
            .collect();
        Ok(hits)
    }
}
