//! Tree Store
//!
//! Holds the current tree snapshot behind a single swap point. Readers get an
//! `Arc` to an immutable snapshot, so the full tree and the navigation tree
//! they see always come from the same fetch.

use crate::tree::index;
use crate::tree::node::{DirectoryNavNode, FileRef, TreeNode};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::Arc;

/// One complete, internally consistent fetch of the remote tree.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeSnapshot {
    full_tree: Vec<TreeNode>,
    nav_tree: Vec<DirectoryNavNode>,
    markdown_files: usize,
    loaded_at: Option<DateTime<Utc>>,
    generation: u64,
}

impl TreeSnapshot {
    pub fn new(
        full_tree: Vec<TreeNode>,
        nav_tree: Vec<DirectoryNavNode>,
        markdown_files: usize,
    ) -> Self {
        Self {
            full_tree,
            nav_tree,
            markdown_files,
            loaded_at: Some(Utc::now()),
            generation: 0,
        }
    }

    /// The snapshot held before the first successful load.
    pub fn empty() -> Self {
        Self {
            full_tree: Vec::new(),
            nav_tree: Vec::new(),
            markdown_files: 0,
            loaded_at: None,
            generation: 0,
        }
    }

    pub fn full_tree(&self) -> &[TreeNode] {
        &self.full_tree
    }

    pub fn nav_tree(&self) -> &[DirectoryNavNode] {
        &self.nav_tree
    }

    /// Markdown files in the whole tree.
    pub fn markdown_files(&self) -> usize {
        self.markdown_files
    }

    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded_at
    }

    /// Number of snapshots published before this one.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded_at.is_some()
    }

    pub fn find(&self, target: &str) -> Option<&TreeNode> {
        index::find_by_path(&self.full_tree, target)
    }

    pub fn markdown_files_in(&self, folder: &str) -> Option<Vec<FileRef>> {
        index::markdown_files_in(&self.full_tree, folder)
    }

    pub fn directory_exists(&self, folder: &str) -> bool {
        index::directory_exists(&self.full_tree, folder)
    }

    pub fn file_exists(&self, file: &str) -> bool {
        self.find(file).map_or(false, |node| !node.is_directory())
    }
}

impl Default for TreeSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

/// Owner of the current snapshot.
pub struct TreeStore {
    current: RwLock<Arc<TreeSnapshot>>,
}

impl TreeStore {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(TreeSnapshot::empty())),
        }
    }

    /// The snapshot readers should search; stays valid across later swaps.
    pub fn snapshot(&self) -> Arc<TreeSnapshot> {
        Arc::clone(&self.current.read())
    }

    /// Publish a freshly built snapshot, replacing both views at once.
    pub fn replace(&self, mut snapshot: TreeSnapshot) -> Arc<TreeSnapshot> {
        let mut current = self.current.write();
        snapshot.generation = current.generation + 1;
        let snapshot = Arc::new(snapshot);
        *current = Arc::clone(&snapshot);
        snapshot
    }
}

impl Default for TreeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::RemoteEntry;
    use crate::tree::projector::{build_full_tree, build_nav_tree};
    use std::thread;

    fn snapshot_of(entries: &[RemoteEntry]) -> TreeSnapshot {
        let full = build_full_tree(entries, "");
        let (nav, count) = build_nav_tree(&full);
        TreeSnapshot::new(full, nav, count)
    }

    #[test]
    fn starts_empty_and_counts_generations() {
        let store = TreeStore::new();
        assert!(!store.snapshot().is_loaded());
        let first = store.replace(snapshot_of(&[RemoteEntry::file("a.md", 1)]));
        assert_eq!(first.generation(), 1);
        let second = store.replace(snapshot_of(&[]));
        assert_eq!(second.generation(), 2);
        assert_eq!(first.full_tree().len(), 1);
    }

    #[test]
    fn held_snapshot_survives_replacement() {
        let store = TreeStore::new();
        store.replace(snapshot_of(&[RemoteEntry::directory(
            "Old",
            vec![RemoteEntry::file("a.md", 1)],
        )]));
        let held = store.snapshot();
        store.replace(snapshot_of(&[RemoteEntry::directory("New", vec![])]));
        assert!(held.find("Old/a.md").is_some());
        assert!(store.snapshot().find("Old/a.md").is_none());
    }

    #[test]
    fn readers_never_see_mixed_views() {
        let store = Arc::new(TreeStore::new());
        let writer = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..200 {
                    let name = format!("D{}", i);
                    let files: Vec<RemoteEntry> =
                        (0..(i % 5)).map(|j| RemoteEntry::file(format!("{}.md", j), 1)).collect();
                    store.replace(snapshot_of(&[RemoteEntry::directory(name, files)]));
                }
            })
        };
        let reader = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for _ in 0..200 {
                    let snap = store.snapshot();
                    let full_names: Vec<&str> =
                        snap.full_tree().iter().map(|n| n.name.as_str()).collect();
                    let nav_names: Vec<&str> =
                        snap.nav_tree().iter().map(|n| n.name.as_str()).collect();
                    assert_eq!(full_names, nav_names);
                    if let Some(nav) = snap.nav_tree().first() {
                        assert_eq!(nav.markdown_file_count, snap.full_tree()[0].children().len());
                    }
                }
            })
        };
        writer.join().unwrap();
        reader.join().unwrap();
    }
}
