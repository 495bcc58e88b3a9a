//! Remote tree model: node types, path helpers, ordering, projection and lookup.

pub mod index;
pub mod node;
pub mod path;
pub mod projector;
pub mod sort;

pub use index::{directory_exists, find_by_path, markdown_files_in};
pub use node::{DirectoryNavNode, FileRef, NodeType, TreeNode};
pub use projector::TreeProjector;
