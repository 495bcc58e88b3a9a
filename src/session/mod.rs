//! Session
//!
//! Ties the tree projector, tree store, edit cache, conflict resolver and
//! selection together. Every operation a front end performs goes through
//! here: loading the tree, opening and saving files, structural mutations,
//! history, search and attachments.

pub mod recycle;

use crate::cache::{EditCacheEntry, EditCacheStore};
use crate::concurrency::PathGuardRegistry;
use crate::conflict::{ConflictResolver, DecisionPrompt, Resolution};
use crate::error::ApiError;
use crate::remote::{Attachment, RemoteStore, SearchHit, VersionRecord, WriteOutcome};
use crate::selection::SelectionState;
use crate::store::{TreeSnapshot, TreeStore};
use crate::tree::path;
use crate::tree::TreeProjector;
use chrono::Utc;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Comment recorded when a historical version is written back.
pub const DEFAULT_REVERT_COMMENT: &str = "Reverted to an older version";

/// A file ready for editing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedFile {
    pub path: String,
    pub content: String,
    /// Remote content hash, when known.
    pub content_hash: Option<String>,
    /// The content came from a restored cache entry.
    pub restored: bool,
}

/// Where a deleted item ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Recycled { new_path: String },
    Purged,
}

pub struct Session {
    remote: Arc<dyn RemoteStore>,
    cache: Arc<dyn EditCacheStore>,
    projector: TreeProjector,
    tree: TreeStore,
    resolver: ConflictResolver,
    selection: RwLock<SelectionState>,
}

impl Session {
    pub fn new(remote: Arc<dyn RemoteStore>, cache: Arc<dyn EditCacheStore>) -> Self {
        Self {
            projector: TreeProjector::new(Arc::clone(&remote)),
            tree: TreeStore::new(),
            resolver: ConflictResolver::new(
                Arc::clone(&remote),
                Arc::clone(&cache),
                PathGuardRegistry::new(),
            ),
            selection: RwLock::new(SelectionState::new()),
            remote,
            cache,
        }
    }

    /// Current tree snapshot (empty until the first successful load).
    pub fn tree(&self) -> Arc<TreeSnapshot> {
        self.tree.snapshot()
    }

    pub fn selection(&self) -> SelectionState {
        self.selection.read().clone()
    }

    /// Reload both tree views from the remote and publish them together.
    ///
    /// On failure the previous snapshot and selection stay as they were.
    pub async fn load_tree(&self) -> Result<Arc<TreeSnapshot>, ApiError> {
        let snapshot = self.projector.load_tree().await?;
        let snapshot = self.tree.replace(snapshot);
        self.selection.write().revalidate(&snapshot);
        info!(
            generation = snapshot.generation(),
            markdown_files = snapshot.markdown_files(),
            "Tree loaded"
        );
        Ok(snapshot)
    }

    pub fn select_folder(&self, folder: Option<&str>) -> Result<SelectionState, ApiError> {
        let snapshot = self.tree.snapshot();
        let mut selection = self.selection.write();
        selection.select_folder(&snapshot, folder)?;
        Ok(selection.clone())
    }

    pub fn select_file(&self, file: Option<&str>) -> Result<SelectionState, ApiError> {
        let snapshot = self.tree.snapshot();
        let mut selection = self.selection.write();
        selection.select_file(&snapshot, file)?;
        Ok(selection.clone())
    }

    /// Open a Markdown file for editing.
    ///
    /// A surviving cache entry for `file` is resolved through `prompt` first.
    /// After a restore the cached body is returned as is; otherwise the
    /// remote body is read. The selection follows the opened file when the
    /// current snapshot knows it.
    pub async fn open_file(
        &self,
        file: &str,
        prompt: &dyn DecisionPrompt,
    ) -> Result<OpenedFile, ApiError> {
        path::ensure_markdown(file)?;

        let opened = match self.resolver.resolve(file, prompt).await? {
            Resolution::Restored { content, new_hash } => OpenedFile {
                path: file.to_string(),
                content,
                content_hash: new_hash,
                restored: true,
            },
            Resolution::NoCache | Resolution::Discarded => {
                let remote = self.remote.read_file(file).await?;
                OpenedFile {
                    path: file.to_string(),
                    content: remote.content,
                    content_hash: Some(remote.content_hash),
                    restored: false,
                }
            }
        };

        let snapshot = self.tree.snapshot();
        if snapshot.file_exists(file) {
            self.selection.write().select_file(&snapshot, Some(file))?;
        } else {
            debug!(path = file, "Opened file is not in the current snapshot");
        }
        info!(path = file, restored = opened.restored, "Opened file");
        Ok(opened)
    }

    /// Save with write-ahead caching.
    ///
    /// The edit is persisted locally before the remote write is issued and
    /// removed only once the remote confirms. On failure the entry stays and
    /// the error is returned.
    pub async fn save_file(&self, file: &str, content: &str) -> Result<WriteOutcome, ApiError> {
        self.write_ahead(file, content, None).await
    }

    async fn write_ahead(
        &self,
        file: &str,
        content: &str,
        comment: Option<&str>,
    ) -> Result<WriteOutcome, ApiError> {
        path::ensure_markdown(file)?;
        if self.resolver.is_resolving(file) {
            return Err(ApiError::ResolutionInProgress(file.to_string()));
        }

        self.cache.put(&EditCacheEntry::stage(file, content))?;

        match self.remote.write_file(file, content, comment).await {
            Ok(outcome) => {
                self.cache.remove(file)?;
                info!(path = file, ?outcome, "Saved file");
                Ok(outcome)
            }
            Err(err) => {
                warn!(path = file, error = %err, "Save failed; edit kept in local cache");
                Err(match err {
                    ApiError::RemoteFetch(msg) => ApiError::RemoteWrite(msg),
                    other => other,
                })
            }
        }
    }

    /// Create a folder in the selected folder, or at the root.
    pub async fn create_folder(&self, name: &str, in_root: bool) -> Result<String, ApiError> {
        path::validate_segment(name)?;
        let parent = if in_root {
            String::new()
        } else {
            self.selection.read().target_folder().to_string()
        };
        let folder = path::join(&parent, name.trim());
        self.remote.create_directory(&folder).await?;
        info!(path = %folder, "Created folder");
        self.load_tree().await?;
        Ok(folder)
    }

    /// Create an empty Markdown file in the selected folder.
    pub async fn create_file(&self, name: &str) -> Result<String, ApiError> {
        path::validate_segment(name)?;
        let name = name.trim();
        path::ensure_markdown(name)?;
        let parent = self.selection.read().target_folder().to_string();
        let file = path::join(&parent, name);
        if self.tree.snapshot().find(&file).is_some() {
            return Err(ApiError::Validation(format!("{} already exists", file)));
        }
        self.remote.write_file(&file, "", None).await?;
        info!(path = %file, "Created file");
        self.load_tree().await?;
        Ok(file)
    }

    /// Rename a folder in place; returns the new path.
    pub async fn rename_folder(&self, folder: &str, new_name: &str) -> Result<String, ApiError> {
        path::validate_segment(new_name)?;
        if folder.is_empty() || folder == path::RECYCLE_DIR {
            return Err(ApiError::Validation(format!("{} cannot be renamed", folder)));
        }
        let target = path::sibling(folder, new_name.trim());
        self.remote.rename_directory(folder, &target).await?;
        info!(from = folder, to = %target, "Renamed folder");
        self.relocate_cached_edits(folder, &target)?;

        let (old_folder, old_file) = {
            let selection = self.selection.read();
            (
                selection.selected_folder().map(str::to_string),
                selection.selected_file().map(str::to_string),
            )
        };
        let snapshot = self.load_tree().await?;
        let mut selection = self.selection.write();
        if let Some(moved) = old_folder.and_then(|p| path::rebase(&p, folder, &target)) {
            if snapshot.directory_exists(&moved) {
                selection.select_folder(&snapshot, Some(moved.as_str()))?;
            }
        }
        if let Some(moved) = old_file.and_then(|p| path::rebase(&p, folder, &target)) {
            if snapshot.file_exists(&moved) {
                selection.select_file(&snapshot, Some(moved.as_str()))?;
            }
        }
        Ok(target)
    }

    /// Rename a file in place; returns the new path.
    pub async fn rename_file(&self, file: &str, new_name: &str) -> Result<String, ApiError> {
        path::validate_segment(new_name)?;
        let target = path::sibling(file, new_name.trim());
        self.move_file(file, &target).await?;
        Ok(target)
    }

    /// Move a file to `target`, which may be in another folder.
    pub async fn move_file(&self, file: &str, target: &str) -> Result<(), ApiError> {
        path::ensure_markdown(target)?;
        self.remote.rename_file(file, target).await?;
        info!(from = file, to = target, "Moved file");
        self.relocate_cached_edits(file, target)?;

        let was_selected = self.selection.read().selected_file() == Some(file);
        let snapshot = self.load_tree().await?;
        if was_selected && snapshot.file_exists(target) {
            self.selection.write().select_file(&snapshot, Some(target))?;
        }
        Ok(())
    }

    /// Staged edits follow their file through renames and moves.
    fn relocate_cached_edits(&self, from: &str, to: &str) -> Result<(), ApiError> {
        for entry in self.cache.list()? {
            let Some(new_path) = path::rebase(&entry.path, from, to) else {
                continue;
            };
            debug!(from = %entry.path, to = %new_path, "Relocating cached edit");
            self.cache.put(&EditCacheEntry {
                path: new_path,
                ..entry.clone()
            })?;
            self.cache.remove(&entry.path)?;
        }
        Ok(())
    }

    /// Staged edits for a purged item have nothing left to restore into.
    fn drop_cached_edits(&self, item: &str) -> Result<(), ApiError> {
        for entry in self.cache.list()? {
            if path::rebase(&entry.path, item, "").is_some() {
                debug!(path = %entry.path, "Dropping cached edit of purged item");
                self.cache.remove(&entry.path)?;
            }
        }
        Ok(())
    }

    /// Move an item into the retention directory, or purge it if it is
    /// already there.
    pub async fn delete(&self, item: &str, is_folder: bool) -> Result<DeleteOutcome, ApiError> {
        if item.is_empty() || item == path::RECYCLE_DIR {
            return Err(ApiError::Validation(format!("{} cannot be deleted", item)));
        }

        let outcome = if path::is_in_recycle(item) {
            if is_folder {
                self.remote.delete_directory(item).await?;
            } else {
                self.remote.delete_file(item).await?;
            }
            info!(path = item, "Deleted permanently");
            self.drop_cached_edits(item)?;
            DeleteOutcome::Purged
        } else {
            let new_path = recycle::recycle_target(item, is_folder, Utc::now().timestamp_millis());
            if is_folder {
                self.remote.rename_directory(item, &new_path).await?;
            } else {
                self.remote.rename_file(item, &new_path).await?;
            }
            info!(path = item, to = %new_path, "Moved to recycle");
            self.relocate_cached_edits(item, &new_path)?;
            DeleteOutcome::Recycled { new_path }
        };

        {
            let mut selection = self.selection.write();
            if is_folder {
                selection.clear();
            } else {
                let snapshot = self.tree.snapshot();
                selection.select_file(&snapshot, None)?;
            }
        }
        self.load_tree().await?;
        Ok(outcome)
    }

    /// Version history, newest first.
    pub async fn file_history(&self, file: &str) -> Result<Vec<VersionRecord>, ApiError> {
        let mut history = self.remote.file_history(file).await?;
        history.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        Ok(history)
    }

    pub async fn file_version(&self, file: &str, version_id: u64) -> Result<String, ApiError> {
        self.remote.file_version(file, version_id).await
    }

    /// Write a historical version back as the current content.
    pub async fn apply_version(
        &self,
        file: &str,
        version_id: u64,
        comment: Option<&str>,
    ) -> Result<String, ApiError> {
        let content = self.remote.file_version(file, version_id).await?;
        let comment = comment.unwrap_or(DEFAULT_REVERT_COMMENT);
        self.write_ahead(file, &content, Some(comment)).await?;
        info!(path = file, version_id, "Applied historical version");
        Ok(content)
    }

    pub async fn search(&self, query: &str, regex: bool) -> Result<Vec<SearchHit>, ApiError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        self.remote.search(query, regex).await
    }

    pub async fn list_attachments(&self, md_file: &str) -> Result<Vec<Attachment>, ApiError> {
        path::ensure_markdown(md_file)?;
        self.remote.list_attachments(md_file).await
    }

    pub async fn delete_attachment(&self, md_file: &str, attach_path: &str) -> Result<(), ApiError> {
        path::ensure_markdown(md_file)?;
        self.remote.delete_attachment(md_file, attach_path).await?;
        info!(path = md_file, attachment = attach_path, "Deleted attachment");
        Ok(())
    }

    /// Every edit still waiting in the local cache.
    pub fn pending_edits(&self) -> Result<Vec<EditCacheEntry>, ApiError> {
        Ok(self.cache.list()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::SledEditCache;
    use crate::conflict::{ScriptedPrompt, UserDecision};
    use crate::remote::MemoryRemoteStore;

    fn session_with(remote: MemoryRemoteStore) -> (Arc<MemoryRemoteStore>, Arc<SledEditCache>, Session) {
        let remote = Arc::new(remote);
        let cache = Arc::new(SledEditCache::temporary().unwrap());
        let session = Session::new(remote.clone(), cache.clone());
        (remote, cache, session)
    }

    #[tokio::test]
    async fn failed_load_keeps_previous_snapshot() {
        let (remote, _cache, session) =
            session_with(MemoryRemoteStore::new().with_file("Notes/a.md", "a"));
        let first = session.load_tree().await.unwrap();
        remote.set_fail_listing(true);
        assert!(session.load_tree().await.is_err());
        assert_eq!(session.tree().generation(), first.generation());
    }

    #[tokio::test]
    async fn save_clears_cache_on_success() {
        let (remote, cache, session) =
            session_with(MemoryRemoteStore::new().with_file("a.md", "old"));
        let outcome = session.save_file("a.md", "new").await.unwrap();
        assert!(matches!(outcome, WriteOutcome::Written { .. }));
        assert_eq!(remote.content_of("a.md").unwrap(), "new");
        assert!(cache.get("a.md").unwrap().is_none());
    }

    #[tokio::test]
    async fn failed_save_keeps_edit_for_next_open() {
        let (remote, cache, session) =
            session_with(MemoryRemoteStore::new().with_file("a.md", "old"));
        remote.set_fail_writes(true);

        let err = session.save_file("a.md", "unsaved").await.unwrap_err();
        assert!(matches!(err, ApiError::RemoteWrite(_)));
        assert_eq!(cache.get("a.md").unwrap().unwrap().content, "unsaved");

        remote.set_fail_writes(false);
        let prompt = ScriptedPrompt::new([UserDecision::Restore]);
        let opened = session.open_file("a.md", &prompt).await.unwrap();
        assert!(opened.restored);
        assert_eq!(opened.content, "unsaved");
        assert_eq!(remote.content_of("a.md").unwrap(), "unsaved");
        assert!(session.pending_edits().unwrap().is_empty());
    }

    #[tokio::test]
    async fn non_markdown_save_is_rejected_before_caching() {
        let (remote, cache, session) = session_with(MemoryRemoteStore::new());
        assert!(matches!(
            session.save_file("photo.png", "x").await,
            Err(ApiError::Validation(_))
        ));
        assert!(cache.list().unwrap().is_empty());
        assert_eq!(remote.write_calls(), 0);
    }

    #[tokio::test]
    async fn open_follows_selection() {
        let (_remote, _cache, session) = session_with(
            MemoryRemoteStore::new()
                .with_file("Notes/a.md", "a")
                .with_file("Other/b.md", "b"),
        );
        session.load_tree().await.unwrap();
        session.select_folder(Some("Other")).unwrap();

        let opened = session
            .open_file("Notes/a.md", &ScriptedPrompt::default())
            .await
            .unwrap();
        assert_eq!(opened.content, "a");
        assert!(!opened.restored);
        let selection = session.selection();
        assert_eq!(selection.selected_folder(), Some("Notes"));
        assert_eq!(selection.selected_file(), Some("Notes/a.md"));
    }

    #[tokio::test]
    async fn discarded_cache_opens_remote_body() {
        let (_remote, cache, session) =
            session_with(MemoryRemoteStore::new().with_file("a.md", "server"));
        cache.put(&EditCacheEntry::stage("a.md", "stale")).unwrap();
        let prompt = ScriptedPrompt::new([UserDecision::Discard, UserDecision::ConfirmDiscard]);
        let opened = session.open_file("a.md", &prompt).await.unwrap();
        assert_eq!(opened.content, "server");
        assert!(cache.get("a.md").unwrap().is_none());
    }

    #[tokio::test]
    async fn create_uses_selected_folder() {
        let (remote, _cache, session) = session_with(MemoryRemoteStore::new().with_dir("Notes"));
        session.load_tree().await.unwrap();
        session.select_folder(Some("Notes")).unwrap();

        assert_eq!(session.create_file("new.md").await.unwrap(), "Notes/new.md");
        assert_eq!(remote.content_of("Notes/new.md").unwrap(), "");
        assert_eq!(session.create_folder("Sub", false).await.unwrap(), "Notes/Sub");
        assert_eq!(session.create_folder("Top", true).await.unwrap(), "Top");
        assert!(session.tree().directory_exists("Notes/Sub"));
        assert_eq!(
            session.selection().files_in_folder().len(),
            1,
            "reload refreshes the open listing"
        );
    }

    #[tokio::test]
    async fn create_file_refuses_existing_and_non_markdown() {
        let (_remote, _cache, session) =
            session_with(MemoryRemoteStore::new().with_file("a.md", "keep"));
        session.load_tree().await.unwrap();
        assert!(matches!(
            session.create_file("a.md").await,
            Err(ApiError::Validation(_))
        ));
        assert!(matches!(
            session.create_file("notes.txt").await,
            Err(ApiError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn rename_moves_cached_edits_and_selection() {
        let (_remote, cache, session) =
            session_with(MemoryRemoteStore::new().with_file("Notes/a.md", "a"));
        session.load_tree().await.unwrap();
        session.select_file(Some("Notes/a.md")).unwrap();
        cache.put(&EditCacheEntry::stage("Notes/a.md", "draft")).unwrap();

        let renamed = session.rename_folder("Notes", "Journal").await.unwrap();

        assert_eq!(renamed, "Journal");
        assert!(cache.get("Notes/a.md").unwrap().is_none());
        assert_eq!(cache.get("Journal/a.md").unwrap().unwrap().content, "draft");
        let selection = session.selection();
        assert_eq!(selection.selected_folder(), Some("Journal"));
        assert_eq!(selection.selected_file(), Some("Journal/a.md"));
    }

    #[tokio::test]
    async fn renaming_an_ancestor_keeps_nested_selection() {
        let (_remote, _cache, session) =
            session_with(MemoryRemoteStore::new().with_file("Notes/Sub/b.md", "b"));
        session.load_tree().await.unwrap();
        session.select_file(Some("Notes/Sub/b.md")).unwrap();

        session.rename_folder("Notes", "Journal").await.unwrap();

        let selection = session.selection();
        assert_eq!(selection.selected_folder(), Some("Journal/Sub"));
        assert_eq!(selection.selected_file(), Some("Journal/Sub/b.md"));
    }

    #[tokio::test]
    async fn soft_delete_then_purge() {
        let (remote, _cache, session) =
            session_with(MemoryRemoteStore::new().with_file("Notes/a.md", "a"));
        session.load_tree().await.unwrap();
        session.select_file(Some("Notes/a.md")).unwrap();

        let outcome = session.delete("Notes/a.md", false).await.unwrap();
        let DeleteOutcome::Recycled { new_path } = outcome else {
            panic!("expected soft delete");
        };
        assert!(new_path.starts_with("Recycle/a_"));
        assert!(new_path.ends_with(".md"));
        assert!(!remote.exists("Notes/a.md"));
        assert!(remote.exists(&new_path));
        assert_eq!(session.selection().selected_file(), None);
        assert_eq!(session.selection().selected_folder(), Some("Notes"));

        assert_eq!(
            session.delete(&new_path, false).await.unwrap(),
            DeleteOutcome::Purged
        );
        assert!(!remote.exists(&new_path));
    }

    #[tokio::test]
    async fn recycled_file_takes_its_staged_edit_along() {
        let (_remote, cache, session) =
            session_with(MemoryRemoteStore::new().with_file("Notes/a.md", "a"));
        session.load_tree().await.unwrap();
        cache.put(&EditCacheEntry::stage("Notes/a.md", "draft")).unwrap();

        let DeleteOutcome::Recycled { new_path } =
            session.delete("Notes/a.md", false).await.unwrap()
        else {
            panic!("expected soft delete");
        };
        assert!(cache.get("Notes/a.md").unwrap().is_none());
        assert_eq!(cache.get(&new_path).unwrap().unwrap().content, "draft");

        // A new file at the old path opens without a restore prompt.
        session.select_folder(Some("Notes")).unwrap();
        session.create_file("a.md").await.unwrap();
        let prompt = ScriptedPrompt::default();
        let opened = session.open_file("Notes/a.md", &prompt).await.unwrap();
        assert_eq!(opened.content, "");
        assert!(!opened.restored);
        assert!(prompt.asked().is_empty());

        session.delete(&new_path, false).await.unwrap();
        assert!(session.pending_edits().unwrap().is_empty());
    }

    #[tokio::test]
    async fn recycled_folder_takes_nested_edits_along() {
        let (_remote, cache, session) =
            session_with(MemoryRemoteStore::new().with_file("Notes/Sub/b.md", "b"));
        session.load_tree().await.unwrap();
        cache.put(&EditCacheEntry::stage("Notes/Sub/b.md", "draft")).unwrap();

        let DeleteOutcome::Recycled { new_path } = session.delete("Notes", true).await.unwrap()
        else {
            panic!("expected soft delete");
        };
        let pending: Vec<String> = session
            .pending_edits()
            .unwrap()
            .into_iter()
            .map(|entry| entry.path)
            .collect();
        assert_eq!(pending, vec![format!("{}/Sub/b.md", new_path)]);
    }

    #[tokio::test]
    async fn open_after_successful_save_asks_nothing() {
        let (_remote, _cache, session) =
            session_with(MemoryRemoteStore::new().with_file("a.md", "old"));
        session.save_file("a.md", "new").await.unwrap();

        let prompt = ScriptedPrompt::default();
        let opened = session.open_file("a.md", &prompt).await.unwrap();
        assert_eq!(opened.content, "new");
        assert!(!opened.restored);
        assert!(prompt.asked().is_empty());
    }

    #[tokio::test]
    async fn recycle_itself_cannot_be_deleted() {
        let (_remote, _cache, session) = session_with(MemoryRemoteStore::new());
        session.load_tree().await.unwrap();
        assert!(matches!(
            session.delete("Recycle", true).await,
            Err(ApiError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn history_is_newest_first_and_revert_writes_back() {
        let (remote, cache, session) =
            session_with(MemoryRemoteStore::new().with_dir("Notes"));
        session.save_file("Notes/a.md", "v1").await.unwrap();
        session.save_file("Notes/a.md", "v2").await.unwrap();

        let history = session.file_history("Notes/a.md").await.unwrap();
        assert_eq!(history.len(), 2);
        assert!(history[0].id > history[1].id);

        let oldest = history[1].id;
        let content = session.apply_version("Notes/a.md", oldest, None).await.unwrap();
        assert_eq!(content, "v1");
        assert_eq!(remote.content_of("Notes/a.md").unwrap(), "v1");
        assert!(cache.get("Notes/a.md").unwrap().is_none());

        let latest = session.file_history("Notes/a.md").await.unwrap();
        assert_eq!(latest[0].comment, DEFAULT_REVERT_COMMENT);
    }

    #[tokio::test]
    async fn blank_search_skips_remote() {
        let (remote, _cache, session) = session_with(MemoryRemoteStore::new());
        remote.set_fail_listing(true);
        assert!(session.search("   ", false).await.unwrap().is_empty());
    }
}
