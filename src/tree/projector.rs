//! Tree Projector
//!
//! Fetches one recursive snapshot of the remote tree and derives both views:
//! the full file+directory tree and the directory-only navigation tree with
//! recursive Markdown-file counts. Both are built from scratch in isolation;
//! publishing them is the caller's job (see [`crate::store::TreeStore`]).

use super::node::{DirectoryNavNode, NodeType, TreeNode};
use super::path::{self, RECYCLE_DIR};
use super::sort::{compare_nav_nodes, compare_tree_nodes};
use crate::error::ApiError;
use crate::remote::{RemoteEntry, RemoteStore};
use crate::store::TreeSnapshot;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Builds tree snapshots from the remote store.
pub struct TreeProjector {
    remote: Arc<dyn RemoteStore>,
    recycle_ensured: AtomicBool,
}

impl TreeProjector {
    pub fn new(remote: Arc<dyn RemoteStore>) -> Self {
        Self {
            remote,
            recycle_ensured: AtomicBool::new(false),
        }
    }

    /// Make sure the retention directory exists at the root.
    ///
    /// Checks a shallow listing and creates the directory when absent.
    /// Returns whether it had to be created.
    pub async fn ensure_recycle_directory(&self) -> Result<bool, ApiError> {
        let entries = self.remote.list_tree("", false).await?;
        match entries.iter().find(|entry| entry.name == RECYCLE_DIR) {
            Some(entry) if entry.is_dir => return Ok(false),
            Some(_) => {
                return Err(ApiError::Validation(format!(
                    "{} exists at the root but is not a directory; rename or remove it",
                    RECYCLE_DIR
                )))
            }
            None => {}
        }
        info!(path = RECYCLE_DIR, "Creating retention directory");
        self.remote.create_directory(RECYCLE_DIR).await?;
        Ok(true)
    }

    /// Fetch the whole tree with one recursive listing and project both views.
    ///
    /// The first call also ensures the retention directory. On error nothing
    /// is returned, so whatever snapshot the caller holds stays authoritative.
    pub async fn load_tree(&self) -> Result<TreeSnapshot, ApiError> {
        if !self.recycle_ensured.load(Ordering::SeqCst) {
            self.ensure_recycle_directory().await?;
            self.recycle_ensured.store(true, Ordering::SeqCst);
        }

        let entries = self.remote.list_tree("", true).await?;
        let full_tree = build_full_tree(&entries, "");
        let (nav_tree, markdown_files) = build_nav_tree(&full_tree);
        debug!(
            top_level = full_tree.len(),
            markdown_files, "Projected tree snapshot"
        );
        Ok(TreeSnapshot::new(full_tree, nav_tree, markdown_files))
    }
}

/// Convert raw listing entries into sorted [`TreeNode`]s rooted at `parent`.
pub fn build_full_tree(entries: &[RemoteEntry], parent: &str) -> Vec<TreeNode> {
    let mut nodes: Vec<TreeNode> = entries
        .iter()
        .map(|entry| {
            let node_path = path::join(parent, &entry.name);
            let children = if entry.is_dir {
                Some(build_full_tree(
                    entry.children.as_deref().unwrap_or(&[]),
                    &node_path,
                ))
            } else {
                None
            };
            TreeNode {
                name: entry.name.clone(),
                path: node_path,
                node_type: if entry.is_dir {
                    NodeType::Directory
                } else {
                    NodeType::File
                },
                size: entry.size,
                modified_at: entry.mod_time,
                children,
            }
        })
        .collect();
    nodes.sort_by(compare_tree_nodes);
    nodes
}

/// Directory-only projection of a full tree.
///
/// Returns the navigation nodes for this level together with the total
/// number of Markdown files beneath it.
pub fn build_nav_tree(nodes: &[TreeNode]) -> (Vec<DirectoryNavNode>, usize) {
    let mut markdown_files = 0;
    let mut directories = Vec::new();
    for node in nodes {
        match node.node_type {
            NodeType::Directory => {
                let (children, count) = build_nav_tree(node.children());
                markdown_files += count;
                directories.push(DirectoryNavNode {
                    name: node.name.clone(),
                    path: node.path.clone(),
                    children,
                    markdown_file_count: count,
                });
            }
            NodeType::File => {
                if path::is_markdown(&node.name) {
                    markdown_files += 1;
                }
            }
        }
    }
    directories.sort_by(compare_nav_nodes);
    (directories, markdown_files)
}
