//! The path-keyed node map and the structural algorithms over it.
//!
//! `Snapshot` is the unit of persistence and hydration. All mutations
//! validate first and only then touch the map, so a returned error means the
//! snapshot is exactly as it was before the call.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::node::{DirectoryNode, FileNode, Node};
use super::path::{self, ROOT};
use crate::error::FsError;

/// Directory that the nesting policy applies to.
pub const HOME: &str = "/home";

/// Deepest directory allowed under [`HOME`], counted in path segments.
pub const MAX_HOME_DEPTH: usize = 3;

/// A structural inconsistency found by [`Snapshot::check_invariants`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    /// There is no root directory.
    #[error("missing root directory")]
    MissingRoot,
    /// The root claims a parent.
    #[error("root directory has a parent")]
    RootHasParent,
    /// A node is stored under a key that differs from its own path.
    #[error("node at key {key} reports path {path}")]
    KeyMismatch {
        /// Map key.
        key: String,
        /// Path recorded in the node.
        path: String,
    },
    /// A node's name is not the last segment of its path.
    #[error("node {path} has name {name:?}")]
    NameMismatch {
        /// Node path.
        path: String,
        /// Recorded name.
        name: String,
    },
    /// A non-root node has no parent, or its parent is missing or a file.
    #[error("node {path} has no parent directory")]
    Orphaned {
        /// Node path.
        path: String,
    },
    /// A parent directory does not list the node as a child.
    #[error("{parent} does not list child {child}")]
    MissingChildLink {
        /// Parent path.
        parent: String,
        /// Child path.
        child: String,
    },
    /// A directory lists a child that does not point back at it.
    #[error("{parent} lists {child} which does not belong to it")]
    DanglingChild {
        /// Parent path.
        parent: String,
        /// Child path.
        child: String,
    },
    /// A directory lists the same child twice.
    #[error("{parent} lists {child} more than once")]
    DuplicateChild {
        /// Parent path.
        parent: String,
        /// Child path.
        child: String,
    },
}

/// Complete in-memory state of the virtual filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    nodes: BTreeMap<String, Node>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::empty()
    }
}

impl Snapshot {
    /// A snapshot holding only the root directory.
    #[must_use]
    pub fn empty() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(ROOT.to_string(), Node::directory(ROOT));
        Self { nodes }
    }

    /// The default tree a new player starts with.
    ///
    /// `user` names the home directory; anything that is not a single path
    /// segment falls back to `guest`.
    #[must_use]
    pub fn bootstrap(user: &str) -> Self {
        let user = match path::segments(user).collect::<Vec<_>>().as_slice() {
            [single] if *single != "." && *single != ".." => (*single).to_string(),
            _ => "guest".to_string(),
        };
        let home = path::join(HOME, &user);

        let mut snapshot = Self::empty();
        snapshot.seed_dir(HOME);
        snapshot.seed_dir(&home);
        snapshot.seed_file(
            &path::join(&home, "readme.txt"),
            "Welcome, operator.\nType `help` in the terminal to get started.\n",
        );
        snapshot.seed_dir(&path::join(&home, "documents"));
        snapshot.seed_dir("/etc");
        snapshot.seed_file("/etc/motd", "Unauthorized access is prohibited.\n");
        snapshot.seed_dir("/var");
        snapshot.seed_dir("/var/log");
        snapshot.seed_file("/var/log/system.log", "");
        snapshot.seed_dir("/tmp");
        snapshot
    }

    /// Builds a snapshot keyed by each node's own path, without validation.
    pub fn from_nodes(nodes: impl IntoIterator<Item = Node>) -> Self {
        Self { nodes: nodes.into_iter().map(|n| (n.path().to_string(), n)).collect() }
    }

    /// Returns `true` when the snapshot has a root directory and can replace
    /// the live state.
    #[must_use]
    pub fn is_hydratable(&self) -> bool {
        matches!(self.nodes.get(ROOT), Some(Node::Directory(_)))
    }

    /// Number of nodes, root included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` when there are no nodes at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates over all nodes in path order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Looks up a node.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Node> {
        self.nodes.get(&path::normalize(path))
    }

    /// Returns `true` if a node exists at `path`.
    #[must_use]
    pub fn exists(&self, path: &str) -> bool {
        self.nodes.contains_key(&path::normalize(path))
    }

    /// Returns `true` if `path` is a directory.
    #[must_use]
    pub fn is_directory(&self, path: &str) -> bool {
        self.get(path).is_some_and(Node::is_directory)
    }

    /// Children of a directory in listing order; empty for anything else.
    #[must_use]
    pub fn list(&self, path: &str) -> Vec<&Node> {
        match self.get(path) {
            Some(Node::Directory(dir)) => {
                dir.children.iter().filter_map(|c| self.nodes.get(c)).collect()
            }
            _ => Vec::new(),
        }
    }

    /// The file at `path`, if it is one.
    #[must_use]
    pub fn read(&self, path: &str) -> Option<&FileNode> {
        match self.get(path) {
            Some(Node::File(file)) => Some(file),
            _ => None,
        }
    }

    /// Replaces a file's content.
    ///
    /// # Errors
    ///
    /// [`FsError::NotAFile`] if the path is missing or a directory.
    pub fn write(&mut self, path: &str, content: &str) -> Result<(), FsError> {
        let path = path::normalize(path);
        match self.nodes.get_mut(&path) {
            Some(Node::File(file)) => {
                content.clone_into(&mut file.content);
                Ok(())
            }
            _ => Err(FsError::NotAFile { path }),
        }
    }

    /// Creates an empty directory. Returns `false` if the path already
    /// existed.
    ///
    /// # Errors
    ///
    /// [`FsError::ParentNotDirectory`] or [`FsError::NestingLimitExceeded`].
    pub fn mkdir(&mut self, path: &str) -> Result<bool, FsError> {
        let path = path::normalize(path);
        if self.nodes.contains_key(&path) {
            return Ok(false);
        }
        self.require_parent_directory(&path)?;
        if exceeds_home_depth(&path) {
            return Err(FsError::NestingLimitExceeded { path, limit: MAX_HOME_DEPTH });
        }
        self.attach(Node::directory(&path));
        Ok(true)
    }

    /// Creates an empty file. Returns `false` if the path already existed.
    ///
    /// # Errors
    ///
    /// [`FsError::ParentNotDirectory`].
    pub fn touch(&mut self, path: &str) -> Result<bool, FsError> {
        let path = path::normalize(path);
        if self.nodes.contains_key(&path) {
            return Ok(false);
        }
        self.require_parent_directory(&path)?;
        self.attach(Node::file(&path));
        Ok(true)
    }

    /// Removes a node and, for directories, everything beneath it.
    ///
    /// Returns `false` if nothing existed at `path`.
    ///
    /// # Errors
    ///
    /// [`FsError::RootImmutable`] for `/`.
    pub fn remove(&mut self, path: &str) -> Result<bool, FsError> {
        let path = path::normalize(path);
        if path == ROOT {
            return Err(FsError::RootImmutable);
        }
        if !self.nodes.contains_key(&path) {
            return Ok(false);
        }
        for doomed in self.subtree_post_order(&path) {
            self.detach(&doomed);
        }
        Ok(true)
    }

    /// Moves or renames a node, rewriting every descendant of a directory.
    ///
    /// # Errors
    ///
    /// [`FsError::SourceNotFound`], [`FsError::DestinationExists`],
    /// [`FsError::DestinationParentNotDirectory`],
    /// [`FsError::DestinationInsideSource`] or [`FsError::RootImmutable`].
    pub fn move_node(&mut self, from: &str, to: &str) -> Result<(), FsError> {
        let from = path::normalize(from);
        let to = path::normalize(to);
        if from == ROOT {
            return Err(FsError::RootImmutable);
        }
        let Some(source) = self.nodes.get(&from) else {
            return Err(FsError::SourceNotFound { path: from });
        };
        let source_is_dir = source.is_directory();
        if self.nodes.contains_key(&to) {
            return Err(FsError::DestinationExists { path: to });
        }
        let new_parent = path::parent_of(&to);
        if !self.is_directory(&new_parent) {
            return Err(FsError::DestinationParentNotDirectory { path: to });
        }
        if source_is_dir && path::is_within(&to, &from) {
            return Err(FsError::DestinationInsideSource { from, to });
        }

        let descendants = if source_is_dir { self.descendants(&from) } else { Vec::new() };

        let Some(mut node) = self.detach(&from) else {
            return Err(FsError::SourceNotFound { path: from });
        };
        node.relocate(&to, Some(new_parent));
        rebase_children(&mut node, &from, &to);

        for old_path in descendants {
            let Some(mut child) = self.nodes.remove(&old_path) else { continue };
            let Some(new_path) = path::rebase(&old_path, &from, &to) else { continue };
            let parent = child.parent().map(|p| path::rebase(p, &from, &to).unwrap_or_else(|| p.to_string()));
            child.relocate(&new_path, parent);
            rebase_children(&mut child, &from, &to);
            self.nodes.insert(new_path, child);
        }

        self.attach(node);
        Ok(())
    }

    /// Creates every missing proper ancestor of `path`, root first.
    ///
    /// `path` itself is never created. Returns the directories that were
    /// made.
    ///
    /// # Errors
    ///
    /// [`FsError::ParentNotDirectory`] when an existing ancestor is a file,
    /// or [`FsError::NestingLimitExceeded`]. Nothing is created on error.
    pub fn ensure_path(&mut self, path: &str) -> Result<Vec<String>, FsError> {
        let missing: Vec<String> =
            path::ancestors(path).into_iter().filter(|a| !self.nodes.contains_key(a)).collect();
        for dir in &missing {
            let parent = path::parent_of(dir);
            if self.nodes.get(&parent).is_some_and(Node::is_file) {
                return Err(FsError::ParentNotDirectory { path: dir.clone() });
            }
            if exceeds_home_depth(dir) {
                return Err(FsError::NestingLimitExceeded { path: dir.clone(), limit: MAX_HOME_DEPTH });
            }
        }
        for dir in &missing {
            self.mkdir(dir)?;
        }
        Ok(missing)
    }

    /// Counts files whose name ends with `ext`, optionally only those within
    /// `base`.
    #[must_use]
    pub fn count_files_by_ext(&self, ext: &str, base: Option<&str>) -> usize {
        self.nodes
            .values()
            .filter_map(|n| match n {
                Node::File(f) => Some(f),
                Node::Directory(_) => None,
            })
            .filter(|f| f.name.ends_with(ext))
            .filter(|f| base.is_none_or(|b| path::is_within(&f.path, b)))
            .count()
    }

    /// Renders a directory as an indented tree.
    #[must_use]
    pub fn tree(&self, path: &str) -> Option<String> {
        let path = path::normalize(path);
        if !self.is_directory(&path) {
            return None;
        }
        let mut lines = vec![if path == ROOT { ROOT.to_string() } else { format!("{}/", path::name_of(&path)) }];
        let mut visited = HashSet::from([path.clone()]);
        self.render_tree(&path, "", &mut lines, &mut visited);
        Some(lines.join("\n"))
    }

    /// Verifies the structural invariants and reports the first violation.
    ///
    /// # Errors
    ///
    /// The first [`InvariantViolation`] found.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        match self.nodes.get(ROOT) {
            Some(Node::Directory(root)) if root.parent.is_none() => {}
            Some(Node::Directory(_)) => return Err(InvariantViolation::RootHasParent),
            _ => return Err(InvariantViolation::MissingRoot),
        }

        for (key, node) in &self.nodes {
            if key != node.path() {
                return Err(InvariantViolation::KeyMismatch { key: key.clone(), path: node.path().to_string() });
            }
            if node.name() != path::name_of(key) {
                return Err(InvariantViolation::NameMismatch { path: key.clone(), name: node.name().to_string() });
            }
            if key != ROOT {
                let Some(Node::Directory(parent)) = node.parent().and_then(|p| self.nodes.get(p)) else {
                    return Err(InvariantViolation::Orphaned { path: key.clone() });
                };
                if !parent.children.contains(key) {
                    return Err(InvariantViolation::MissingChildLink {
                        parent: parent.path.clone(),
                        child: key.clone(),
                    });
                }
            }
            if let Node::Directory(dir) = node {
                let mut seen = HashSet::new();
                for child in &dir.children {
                    if !seen.insert(child) {
                        return Err(InvariantViolation::DuplicateChild { parent: key.clone(), child: child.clone() });
                    }
                    if self.nodes.get(child).and_then(Node::parent) != Some(key.as_str()) {
                        return Err(InvariantViolation::DanglingChild { parent: key.clone(), child: child.clone() });
                    }
                }
            }
        }
        Ok(())
    }

    fn require_parent_directory(&self, path: &str) -> Result<(), FsError> {
        if self.is_directory(&path::parent_of(path)) {
            Ok(())
        } else {
            Err(FsError::ParentNotDirectory { path: path.to_string() })
        }
    }

    /// Inserts a node and appends it to its parent's children.
    fn attach(&mut self, node: Node) {
        let node_path = node.path().to_string();
        if let Some(parent) = node.parent().map(str::to_string) {
            if let Some(dir) = self.directory_mut(&parent) {
                dir.children.push(node_path.clone());
            }
        }
        self.nodes.insert(node_path, node);
    }

    /// Removes a node from the map and from its parent's children.
    fn detach(&mut self, path: &str) -> Option<Node> {
        let node = self.nodes.remove(path)?;
        if let Some(parent) = node.parent() {
            if let Some(dir) = self.directory_mut(parent) {
                dir.children.retain(|c| c != path);
            }
        }
        Some(node)
    }

    fn directory_mut(&mut self, path: &str) -> Option<&mut DirectoryNode> {
        match self.nodes.get_mut(path) {
            Some(Node::Directory(dir)) => Some(dir),
            _ => None,
        }
    }

    /// Paths under `base` (excluding it) in depth-first pre-order.
    fn descendants(&self, base: &str) -> Vec<String> {
        let mut visited = HashSet::from([base.to_string()]);
        let mut order = Vec::new();
        let mut stack: Vec<String> = self.child_paths(base).rev().cloned().collect();
        while let Some(current) = stack.pop() {
            if !visited.insert(current.clone()) {
                continue;
            }
            stack.extend(self.child_paths(&current).rev().filter(|c| !visited.contains(*c)).cloned());
            order.push(current);
        }
        order
    }

    /// `base` and everything beneath it, children before their parent.
    fn subtree_post_order(&self, base: &str) -> Vec<String> {
        let mut visited = HashSet::new();
        let mut order = Vec::new();
        let mut stack = vec![(base.to_string(), false)];
        while let Some((current, expanded)) = stack.pop() {
            if expanded {
                order.push(current);
                continue;
            }
            if !visited.insert(current.clone()) {
                continue;
            }
            let children: Vec<String> =
                self.child_paths(&current).rev().filter(|c| !visited.contains(*c)).cloned().collect();
            stack.push((current, true));
            stack.extend(children.into_iter().map(|c| (c, false)));
        }
        order
    }

    fn child_paths(&self, path: &str) -> std::slice::Iter<'_, String> {
        self.nodes.get(path).map(Node::children).unwrap_or_default().iter()
    }

    fn render_tree(&self, dir: &str, prefix: &str, lines: &mut Vec<String>, visited: &mut HashSet<String>) {
        let children = self.list(dir);
        let count = children.len();
        for (i, child) in children.into_iter().enumerate() {
            let last = i + 1 == count;
            let connector = if last { "\u{2514}\u{2500}\u{2500} " } else { "\u{251c}\u{2500}\u{2500} " };
            if child.is_directory() {
                lines.push(format!("{prefix}{connector}{}/", child.name()));
                if visited.insert(child.path().to_string()) {
                    let nested = format!("{prefix}{}", if last { "    " } else { "\u{2502}   " });
                    self.render_tree(child.path(), &nested, lines, visited);
                }
            } else {
                lines.push(format!("{prefix}{connector}{}", child.name()));
            }
        }
    }

    fn seed_dir(&mut self, path: &str) {
        self.attach(Node::directory(path));
    }

    fn seed_file(&mut self, path: &str, content: &str) {
        let mut node = Node::file(path);
        if let Node::File(file) = &mut node {
            content.clone_into(&mut file.content);
        }
        self.attach(node);
    }
}

fn exceeds_home_depth(path: &str) -> bool {
    path::is_within(path, HOME) && path::segments(path).count() > MAX_HOME_DEPTH
}

fn rebase_children(node: &mut Node, from: &str, to: &str) {
    if let Node::Directory(dir) = node {
        for child in &mut dir.children {
            if let Some(rebased) = path::rebase(child, from, to) {
                *child = rebased;
            }
        }
    }
}
