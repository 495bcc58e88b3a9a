//! Node Index
//!
//! Path lookups over a full-tree snapshot. Callers pass the snapshot they
//! intend to search, never a live handle, so a concurrent reload cannot
//! change the tree under a lookup.

use super::node::{FileRef, TreeNode};
use super::path;

/// Depth-first search for the node whose path equals `target`.
pub fn find_by_path<'a>(nodes: &'a [TreeNode], target: &str) -> Option<&'a TreeNode> {
    for node in nodes {
        if node.path == target {
            return Some(node);
        }
        if node.is_directory() {
            if let Some(found) = find_by_path(node.children(), target) {
                return Some(found);
            }
        }
    }
    None
}

/// Direct Markdown children of a folder; the empty path addresses the root.
///
/// Returns `None` when `folder` is not a directory in the tree.
pub fn markdown_files_in(nodes: &[TreeNode], folder: &str) -> Option<Vec<FileRef>> {
    let children = if folder.is_empty() {
        nodes
    } else {
        let node = find_by_path(nodes, folder)?;
        if !node.is_directory() {
            return None;
        }
        node.children()
    };
    Some(
        children
            .iter()
            .filter(|child| !child.is_directory() && path::is_markdown(&child.name))
            .map(FileRef::from)
            .collect(),
    )
}

/// Whether `folder` resolves to a directory (the root always does).
pub fn directory_exists(nodes: &[TreeNode], folder: &str) -> bool {
    folder.is_empty() || find_by_path(nodes, folder).map_or(false, TreeNode::is_directory)
}
