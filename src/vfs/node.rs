//! File and directory records that make up the tree.

use serde::{Deserialize, Serialize};

use super::path;

/// A text file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileNode {
    /// Last path segment.
    pub name: String,
    /// Absolute path; always equal to the snapshot key.
    pub path: String,
    /// Path of the owning directory.
    pub parent: Option<String>,
    /// Text content.
    #[serde(default)]
    pub content: String,
}

/// A directory and the ordered paths of its children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryNode {
    /// Last path segment; empty for the root.
    pub name: String,
    /// Absolute path; always equal to the snapshot key.
    pub path: String,
    /// Path of the owning directory, `None` only for the root.
    pub parent: Option<String>,
    /// Child paths in insertion order.
    #[serde(default)]
    pub children: Vec<String>,
}

/// A node in the virtual filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    /// A text file.
    File(FileNode),
    /// A directory.
    Directory(DirectoryNode),
}

impl Node {
    /// Creates an empty file at `path`.
    #[must_use]
    pub fn file(path: &str) -> Self {
        Self::File(FileNode {
            name: path::name_of(path).to_string(),
            path: path.to_string(),
            parent: Some(path::parent_of(path)),
            content: String::new(),
        })
    }

    /// Creates an empty directory at `path`. The root gets no parent.
    #[must_use]
    pub fn directory(path: &str) -> Self {
        let parent = (path != path::ROOT).then(|| path::parent_of(path));
        Self::Directory(DirectoryNode {
            name: path::name_of(path).to_string(),
            path: path.to_string(),
            parent,
            children: Vec::new(),
        })
    }

    /// Last path segment.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::File(f) => &f.name,
            Self::Directory(d) => &d.name,
        }
    }

    /// Absolute path.
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::File(f) => &f.path,
            Self::Directory(d) => &d.path,
        }
    }

    /// Path of the owning directory.
    #[must_use]
    pub fn parent(&self) -> Option<&str> {
        match self {
            Self::File(f) => f.parent.as_deref(),
            Self::Directory(d) => d.parent.as_deref(),
        }
    }

    /// Returns `true` for directories.
    #[must_use]
    pub fn is_directory(&self) -> bool {
        matches!(self, Self::Directory(_))
    }

    /// Returns `true` for files.
    #[must_use]
    pub fn is_file(&self) -> bool {
        matches!(self, Self::File(_))
    }

    /// Child paths of a directory; empty for files.
    #[must_use]
    pub fn children(&self) -> &[String] {
        match self {
            Self::File(_) => &[],
            Self::Directory(d) => &d.children,
        }
    }

    /// Points the node at a new location, keeping its payload.
    pub(crate) fn relocate(&mut self, new_path: &str, new_parent: Option<String>) {
        let name = path::name_of(new_path).to_string();
        match self {
            Self::File(f) => {
                f.name = name;
                f.path = new_path.to_string();
                f.parent = new_parent;
            }
            Self::Directory(d) => {
                d.name = name;
                d.path = new_path.to_string();
                d.parent = new_parent;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_directory_has_no_parent() {
        let root = Node::directory("/");
        assert_eq!(root.parent(), None);
        assert_eq!(root.name(), "");
    }

    #[test]
    fn file_takes_name_and_parent_from_path() {
        let node = Node::file("/home/guest/notes.txt");
        assert_eq!(node.name(), "notes.txt");
        assert_eq!(node.parent(), Some("/home/guest"));
        assert!(node.children().is_empty());
    }

    #[test]
    fn serializes_with_type_tag() {
        let json = serde_json::to_value(Node::directory("/tmp")).unwrap();
        assert_eq!(json["type"], "directory");
        assert_eq!(json["parent"], "/");

        let back: Node = serde_json::from_value(serde_json::json!({
            "type": "file",
            "name": "motd",
            "path": "/etc/motd",
            "parent": "/etc"
        }))
        .unwrap();
        assert!(back.is_file());
    }
}
