//! Tree node types for the full tree and the navigation projection

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Node kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    File,
    Directory,
}

/// One remote entry of the full tree.
///
/// Directories always carry a `children` sequence (empty when childless);
/// files carry none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    pub name: String,
    pub path: String,
    pub node_type: NodeType,
    pub size: u64,
    pub modified_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<TreeNode>>,
}

impl TreeNode {
    pub fn is_directory(&self) -> bool {
        self.node_type == NodeType::Directory
    }

    pub fn children(&self) -> &[TreeNode] {
        self.children.as_deref().unwrap_or(&[])
    }
}

/// Directory-only projection with recursive Markdown-file counts.
///
/// `markdown_file_count` equals the sum of the children's counts plus the
/// directory's own direct Markdown files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryNavNode {
    pub name: String,
    pub path: String,
    pub children: Vec<DirectoryNavNode>,
    pub markdown_file_count: usize,
}

/// A Markdown file listed in a folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    pub name: String,
    pub path: String,
}

impl From<&TreeNode> for FileRef {
    fn from(node: &TreeNode) -> Self {
        Self {
            name: node.name.clone(),
            path: node.path.clone(),
        }
    }
}
