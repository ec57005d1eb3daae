//! File explorer tree.
//!
//! Only the root's children are listed up front; a directory's children are
//! read the first time it is expanded.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

/// Most entries listed for one directory
pub const MAX_ENTRIES: usize = 100;

/// Dotfiles that are still listed
const VISIBLE_DOTFILES: &[&str] = &[".git", ".gitignore"];

/// A lazily loaded directory tree.
#[derive(Debug, Clone)]
pub struct FileTree {
    /// Root node
    pub root: FileNode,
}

impl FileTree {
    /// Lists `path` as the tree root.
    ///
    /// An unreadable or missing directory gives a root with no children.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let mut root = FileNode::new(path.to_path_buf(), NodeKind::Directory);
        root.children = list_directory(path);
        root.expanded = true;
        Self { root }
    }

    /// Returns the root directory.
    pub fn root_path(&self) -> &Path {
        &self.root.path
    }

    /// Re-reads the root, dropping every expanded subtree.
    pub fn refresh(&mut self) {
        *self = Self::open(&self.root.path);
    }

    /// Finds the node at `path`.
    pub fn find(&self, path: &Path) -> Option<&FileNode> {
        Self::find_node(&self.root, path)
    }

    fn find_node<'a>(node: &'a FileNode, target: &Path) -> Option<&'a FileNode> {
        if node.path == target {
            return Some(node);
        }
        node.children
            .iter()
            .filter(|child| target.starts_with(&child.path))
            .find_map(|child| Self::find_node(child, target))
    }

    /// Expands a directory, listing its children on first expansion.
    ///
    /// Returns false if `path` is not a directory in the tree.
    pub fn expand(&mut self, path: &Path) -> bool {
        Self::expand_node(&mut self.root, path)
    }

    fn expand_node(node: &mut FileNode, target: &Path) -> bool {
        if node.path == target {
            if !node.is_directory() {
                return false;
            }
            if !node.loaded {
                node.children = list_directory(&node.path);
                node.loaded = true;
            }
            node.expanded = true;
            return true;
        }

        node.children
            .iter_mut()
            .filter(|child| target.starts_with(&child.path))
            .any(|child| Self::expand_node(child, target))
    }

    /// Collapses a directory, keeping its loaded children.
    pub fn collapse(&mut self, path: &Path) -> bool {
        let mut node = &mut self.root;
        loop {
            if node.path == path {
                node.expanded = false;
                return node.is_directory();
            }
            match node.children.iter_mut().find(|c| path.starts_with(&c.path)) {
                Some(child) => node = child,
                None => return false,
            }
        }
    }

    /// Returns `path` if it is a file in the tree. Directories cannot be
    /// opened in the editor.
    pub fn openable(&self, path: &Path) -> Option<&Path> {
        self.find(path)
            .filter(|node| node.is_file())
            .map(|node| node.path.as_path())
    }

    /// Flattens the visible part of the tree as (depth, node) pairs, in
    /// display order. The root itself is not included.
    pub fn visible(&self) -> Vec<(usize, &FileNode)> {
        let mut out = Vec::new();
        Self::collect_visible(&self.root, 0, &mut out);
        out
    }

    fn collect_visible<'a>(node: &'a FileNode, depth: usize, out: &mut Vec<(usize, &'a FileNode)>) {
        if !node.expanded {
            return;
        }
        for child in &node.children {
            out.push((depth, child));
            Self::collect_visible(child, depth + 1, out);
        }
    }
}

/// Reads one directory level: directories first, then files, each sorted
/// case-insensitively. The sorted listing is cut to [`MAX_ENTRIES`] before
/// hidden entries are skipped, so a directory full of dotfiles can list
/// fewer entries than exist.
///
/// Errors are logged and give an empty listing.
pub fn list_directory(path: &Path) -> Vec<FileNode> {
    let entries = match std::fs::read_dir(path) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::error!("Tree error: {}: {}", path.display(), err);
            return Vec::new();
        }
    };

    let mut nodes: Vec<FileNode> = entries
        .flatten()
        .map(|entry| {
            let path = entry.path();
            let kind = if path.is_dir() {
                NodeKind::Directory
            } else {
                NodeKind::File
            };
            FileNode::new(path, kind)
        })
        .collect();

    nodes.sort_by(|a, b| match (a.kind, b.kind) {
        (NodeKind::Directory, NodeKind::File) => Ordering::Less,
        (NodeKind::File, NodeKind::Directory) => Ordering::Greater,
        _ => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
    });
    nodes.truncate(MAX_ENTRIES);
    nodes.retain(|node| {
        !node.name.starts_with('.') || VISIBLE_DOTFILES.iter().any(|d| node.name == *d)
    });
    nodes
}

/// A node in the file tree.
#[derive(Debug, Clone)]
pub struct FileNode {
    /// File/directory name
    pub name: String,

    /// Full path
    pub path: PathBuf,

    /// Node type
    pub kind: NodeKind,

    /// Child nodes (for directories)
    pub children: Vec<FileNode>,

    /// Whether the node is expanded (for directories)
    pub expanded: bool,

    /// Whether the children have been read
    loaded: bool,
}

impl FileNode {
    fn new(path: PathBuf, kind: NodeKind) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            name,
            path,
            kind,
            children: Vec::new(),
            expanded: false,
            loaded: kind == NodeKind::File,
        }
    }

    /// Returns true if this is a directory.
    pub fn is_directory(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    /// Returns true if this is a file.
    pub fn is_file(&self) -> bool {
        self.kind == NodeKind::File
    }

    /// Icon name for the tree row.
    pub fn icon(&self) -> &'static str {
        match self.kind {
            NodeKind::Directory => "folder",
            NodeKind::File => match self.path.extension().and_then(|e| e.to_str()) {
                Some("py") => "python",
                _ => "file",
            },
        }
    }
}

/// Type of file tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    File,
    Directory,
}
