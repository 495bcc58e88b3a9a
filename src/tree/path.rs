//! Slash-joined remote path helpers.
//!
//! Paths are relative to the store root, which is the empty string:
//! `Notes/Sub/b.md` lives in folder `Notes/Sub`, and `README.md` in the root.

use crate::error::ApiError;

/// Extension identifying Markdown files (compared case-insensitively).
pub const MARKDOWN_EXTENSION: &str = ".md";

/// Name of the retention directory soft-deleted items are moved into.
pub const RECYCLE_DIR: &str = "Recycle";

/// Join a parent path and a child name.
pub fn join(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", parent, name)
    }
}

/// Containing folder of a path; the root's children have parent `""`.
pub fn parent(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// Last path segment.
pub fn file_name(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

pub fn is_markdown(name: &str) -> bool {
    name.to_lowercase().ends_with(MARKDOWN_EXTENSION)
}

/// Reject non-Markdown paths before anything touches the network.
pub fn ensure_markdown(path: &str) -> Result<(), ApiError> {
    if is_markdown(path) {
        Ok(())
    } else {
        Err(ApiError::Validation(format!(
            "File path must end with {}: {}",
            MARKDOWN_EXTENSION, path
        )))
    }
}

/// Whether `path` is the retention directory or lies inside it.
pub fn is_in_recycle(path: &str) -> bool {
    path == RECYCLE_DIR || path.starts_with(&format!("{}/", RECYCLE_DIR))
}

/// Replace the last segment of `path` with `new_name`, keeping the parent.
pub fn sibling(path: &str, new_name: &str) -> String {
    join(parent(path), new_name)
}

/// `path` re-rooted from `from` to `to` when it is `from` or lies under it.
pub fn rebase(path: &str, from: &str, to: &str) -> Option<String> {
    if path == from {
        return Some(to.to_string());
    }
    path.strip_prefix(from)
        .filter(|rest| rest.starts_with('/'))
        .map(|rest| format!("{}{}", to, rest))
}

/// Split a file name into stem and extension (extension keeps its dot).
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => (&name[..idx], &name[idx..]),
        _ => (name, ""),
    }
}

/// Validate a single user-supplied name segment.
pub fn validate_segment(name: &str) -> Result<(), ApiError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ApiError::Validation("Name must not be empty".to_string()));
    }
    if trimmed.contains('/') || trimmed == "." || trimmed == ".." {
        return Err(ApiError::Validation(format!("Invalid name: {}", name)));
    }
    Ok(())
}
