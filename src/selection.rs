//! Selection Projection
//!
//! Selected folder, selected file and the folder's Markdown listing, all
//! resolved against a tree snapshot. A selected file always lives in the
//! selected folder; the root folder is represented by `None` once its listing
//! is loaded.

use crate::error::ApiError;
use crate::store::TreeSnapshot;
use crate::tree::node::FileRef;
use crate::tree::path;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    selected_folder: Option<String>,
    selected_file: Option<String>,
    files_in_folder: Vec<FileRef>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected_folder(&self) -> Option<&str> {
        self.selected_folder.as_deref()
    }

    pub fn selected_file(&self) -> Option<&str> {
        self.selected_file.as_deref()
    }

    /// Markdown files directly inside the selected folder.
    pub fn files_in_folder(&self) -> &[FileRef] {
        &self.files_in_folder
    }

    /// Folder new files are created in; the root when nothing is selected.
    pub fn target_folder(&self) -> &str {
        self.selected_folder.as_deref().unwrap_or("")
    }

    /// Select `folder` and recompute its file listing.
    ///
    /// `Some("")` lists the root. `None` clears the folder and its listing.
    /// A selected file outside the new folder is deselected.
    pub fn select_folder(
        &mut self,
        snapshot: &TreeSnapshot,
        folder: Option<&str>,
    ) -> Result<(), ApiError> {
        match folder {
            None => {
                self.selected_folder = None;
                self.files_in_folder.clear();
            }
            Some(folder) => {
                let files = snapshot
                    .markdown_files_in(folder)
                    .ok_or_else(|| ApiError::NotFound(format!("Folder {}", folder)))?;
                self.selected_folder = if folder.is_empty() {
                    None
                } else {
                    Some(folder.to_string())
                };
                self.files_in_folder = files;
            }
        }

        let target = self.target_folder().to_string();
        if let Some(file) = &self.selected_file {
            if path::parent(file) != target {
                self.selected_file = None;
            }
        }
        Ok(())
    }

    /// Select `file`, switching the folder to its parent when needed.
    pub fn select_file(
        &mut self,
        snapshot: &TreeSnapshot,
        file: Option<&str>,
    ) -> Result<(), ApiError> {
        let Some(file) = file else {
            self.selected_file = None;
            return Ok(());
        };
        if !snapshot.file_exists(file) {
            return Err(ApiError::NotFound(format!("File {}", file)));
        }
        let parent = path::parent(file);
        if parent != self.target_folder() || self.files_in_folder.is_empty() {
            self.select_folder(snapshot, Some(parent))?;
        }
        self.selected_file = Some(file.to_string());
        Ok(())
    }

    /// Re-resolve the selection against a newer snapshot.
    ///
    /// Paths that no longer exist are dropped silently; the listing of a
    /// surviving folder is recomputed.
    pub fn revalidate(&mut self, snapshot: &TreeSnapshot) {
        let listing = self.selected_folder.is_some() || !self.files_in_folder.is_empty();
        if listing {
            match snapshot.markdown_files_in(self.target_folder()) {
                Some(files) => self.files_in_folder = files,
                None => {
                    self.selected_folder = None;
                    self.files_in_folder.clear();
                }
            }
        }
        if let Some(file) = &self.selected_file {
            if !snapshot.file_exists(file) || path::parent(file) != self.target_folder() {
                self.selected_file = None;
            }
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::RemoteEntry;
    use crate::tree::projector::{build_full_tree, build_nav_tree};

    fn snapshot(entries: &[RemoteEntry]) -> TreeSnapshot {
        let full = build_full_tree(entries, "");
        let (nav, count) = build_nav_tree(&full);
        TreeSnapshot::new(full, nav, count)
    }

    fn sample() -> TreeSnapshot {
        snapshot(&[
            RemoteEntry::directory(
                "Notes",
                vec![
                    RemoteEntry::file("a.md", 1),
                    RemoteEntry::file("photo.png", 1),
                    RemoteEntry::directory("Sub", vec![RemoteEntry::file("b.md", 1)]),
                ],
            ),
            RemoteEntry::file("README.md", 1),
        ])
    }

    fn names(state: &SelectionState) -> Vec<&str> {
        state.files_in_folder().iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn selecting_folder_lists_direct_markdown_files() {
        let snap = sample();
        let mut state = SelectionState::new();
        state.select_folder(&snap, Some("Notes")).unwrap();
        assert_eq!(state.selected_folder(), Some("Notes"));
        assert_eq!(names(&state), vec!["a.md"]);
    }

    #[test]
    fn unknown_folder_is_not_found_and_leaves_state() {
        let snap = sample();
        let mut state = SelectionState::new();
        state.select_folder(&snap, Some("Notes")).unwrap();
        let before = state.clone();
        assert!(matches!(
            state.select_folder(&snap, Some("Gone")),
            Err(ApiError::NotFound(_))
        ));
        assert_eq!(state, before);
    }

    #[test]
    fn selecting_file_elsewhere_moves_folder() {
        let snap = sample();
        let mut state = SelectionState::new();
        state.select_folder(&snap, Some("Notes")).unwrap();
        state.select_file(&snap, Some("Notes/Sub/b.md")).unwrap();
        assert_eq!(state.selected_folder(), Some("Notes/Sub"));
        assert_eq!(state.selected_file(), Some("Notes/Sub/b.md"));
        assert_eq!(names(&state), vec!["b.md"]);
    }

    #[test]
    fn root_level_file_selects_root_listing() {
        let snap = sample();
        let mut state = SelectionState::new();
        state.select_folder(&snap, Some("Notes")).unwrap();
        state.select_file(&snap, Some("README.md")).unwrap();
        assert_eq!(state.selected_folder(), None);
        assert_eq!(names(&state), vec!["README.md"]);
    }

    #[test]
    fn changing_folder_drops_file_from_other_folder() {
        let snap = sample();
        let mut state = SelectionState::new();
        state.select_file(&snap, Some("Notes/a.md")).unwrap();
        state.select_folder(&snap, Some("Notes/Sub")).unwrap();
        assert_eq!(state.selected_file(), None);
        state.select_folder(&snap, None).unwrap();
        assert!(state.files_in_folder().is_empty());
    }

    #[test]
    fn missing_file_is_rejected() {
        let snap = sample();
        let mut state = SelectionState::new();
        assert!(state.select_file(&snap, Some("Notes/zzz.md")).is_err());
        assert!(state.select_file(&snap, Some("Notes")).is_err());
    }

    #[test]
    fn revalidate_drops_stale_paths_silently() {
        let mut state = SelectionState::new();
        state.select_file(&sample(), Some("Notes/Sub/b.md")).unwrap();

        let renamed = snapshot(&[RemoteEntry::directory(
            "Notes",
            vec![RemoteEntry::directory(
                "Renamed",
                vec![RemoteEntry::file("b.md", 1)],
            )],
        )]);
        state.revalidate(&renamed);
        assert_eq!(state, SelectionState::new());
    }

    #[test]
    fn revalidate_refreshes_surviving_listing() {
        let mut state = SelectionState::new();
        state.select_file(&sample(), Some("Notes/a.md")).unwrap();

        let grown = snapshot(&[RemoteEntry::directory(
            "Notes",
            vec![RemoteEntry::file("a.md", 1), RemoteEntry::file("c.md", 1)],
        )]);
        state.revalidate(&grown);
        assert_eq!(state.selected_file(), Some("Notes/a.md"));
        assert_eq!(names(&state), vec!["a.md", "c.md"]);
    }
}
