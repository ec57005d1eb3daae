//! Recently opened files.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Entries kept in the list
pub const MAX_RECENT_FILES: usize = 20;

/// Entries shown in the menu
pub const MENU_RECENT_FILES: usize = 10;

/// Most-recent-first list of file paths, without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecentFiles {
    paths: Vec<PathBuf>,
}

impl RecentFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves `path` to the front, adding it if needed, and truncates the
    /// list to [`MAX_RECENT_FILES`].
    pub fn push(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        self.paths.retain(|p| *p != path);
        self.paths.insert(0, path);
        self.paths.truncate(MAX_RECENT_FILES);
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.paths.clear();
    }

    /// Removes a single entry; returns true if it was present.
    pub fn remove(&mut self, path: &Path) -> bool {
        let before = self.paths.len();
        self.paths.retain(|p| p != path);
        self.paths.len() != before
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.paths.iter().map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// The entries the menu shows: the first [`MENU_RECENT_FILES`] of the
    /// list, skipping those that no longer exist on disk.
    pub fn menu_entries(&self) -> Vec<&Path> {
        self.iter()
            .take(MENU_RECENT_FILES)
            .filter(|p| p.exists())
            .collect()
    }

    /// Restores the size and uniqueness bounds on a list read from disk.
    pub(crate) fn normalize(&mut self) {
        let mut seen = Vec::with_capacity(self.paths.len());
        self.paths.retain(|p| {
            if seen.contains(p) {
                false
            } else {
                seen.push(p.clone());
                true
            }
        });
        self.paths.truncate(MAX_RECENT_FILES);
    }
}
