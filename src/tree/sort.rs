//! Sibling ordering shared by both tree views.
//!
//! The retention directory sorts last, directories precede files, and names
//! compare case-insensitively with the raw name as tie-break so the order is
//! total and independent of the input order.

use super::node::{DirectoryNavNode, TreeNode};
use super::path::RECYCLE_DIR;
use std::cmp::Ordering;

fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

fn compare(a_name: &str, a_dir: bool, b_name: &str, b_dir: bool) -> Ordering {
    let a_recycle = a_name == RECYCLE_DIR;
    let b_recycle = b_name == RECYCLE_DIR;
    match (a_recycle, b_recycle) {
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        _ => {}
    }
    match (a_dir, b_dir) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => compare_names(a_name, b_name),
    }
}

pub fn compare_tree_nodes(a: &TreeNode, b: &TreeNode) -> Ordering {
    compare(&a.name, a.is_directory(), &b.name, b.is_directory())
}

pub fn compare_nav_nodes(a: &DirectoryNavNode, b: &DirectoryNavNode) -> Ordering {
    compare(&a.name, true, &b.name, true)
}
