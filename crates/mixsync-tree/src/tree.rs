use std::sync::Arc;

use tracing::{debug, warn};

use crate::node::{is_valid_name, Node, NodeBody, NodeKind, NodePatch};

/// An immutable snapshot of a project's file hierarchy.
///
/// Every mutating operation returns a new `ProjectTree`. Only the nodes on
/// the root-to-target spine are reallocated; every other subtree is shared
/// with the input by `Arc`. Operations that change nothing return a tree
/// whose root is pointer-identical to the input (see [`Self::same_as`]).
#[derive(Clone, Debug)]
pub struct ProjectTree {
    root: Arc<Node>,
}

impl ProjectTree {
    /// An empty project consisting of a single root folder.
    pub fn new(root_name: impl Into<String>) -> Self {
        let name = root_name.into();
        Self {
            root: Arc::new(Node::folder(name.clone(), name)),
        }
    }

    /// Wrap an existing root node.
    pub fn from_root(root: Node) -> Self {
        Self { root: Arc::new(root) }
    }

    pub fn root(&self) -> &Arc<Node> {
        &self.root
    }

    /// Name of the root folder (also its path).
    pub fn name(&self) -> &str {
        self.root.name()
    }

    /// Returns `true` if both snapshots share the same root allocation,
    /// i.e. nothing changed between them.
    pub fn same_as(&self, other: &ProjectTree) -> bool {
        Arc::ptr_eq(&self.root, &other.root)
    }

    /// Merkle digest of the whole tree.
    pub fn digest(&self) -> [u8; 32] {
        self.root.digest()
    }

    // ---------------------------------------------------------------
    // Lookup
    // ---------------------------------------------------------------

    /// Find a node by its full path. A missing path is `None`, not an error.
    pub fn find(&self, path: &str) -> Option<&Arc<Node>> {
        let segments = self.segments(path)?;
        let mut node = &self.root;
        for segment in segments {
            let index = node.child_index(segment)?;
            node = &node.children()[index];
        }
        Some(node)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.find(path).is_some()
    }

    /// Depth-first iterator over file leaves in stored order.
    ///
    /// The iterator borrows the snapshot; call again to restart.
    pub fn files(&self) -> Files<'_> {
        Files {
            stack: vec![&self.root],
        }
    }

    /// Paths of all files, in [`Self::files`] order.
    pub fn file_paths(&self) -> Vec<String> {
        self.files().map(|n| n.path().to_string()).collect()
    }

    // ---------------------------------------------------------------
    // Copy-on-write edits
    // ---------------------------------------------------------------

    /// Apply `patch` to the file at `path`.
    ///
    /// Missing paths, folders and empty patches leave the tree unchanged.
    pub fn update(&self, path: &str, patch: &NodePatch) -> ProjectTree {
        if patch.is_empty() {
            return self.clone();
        }
        let Some(segments) = self.segments(path) else {
            debug!(path, "update outside project root ignored");
            return self.clone();
        };
        let edited = rebuild(&self.root, &segments, &mut |target: &Arc<Node>| {
            if target.is_file() {
                Some(Arc::new(target.patched(patch)))
            } else {
                None
            }
        });
        match edited {
            Some(root) => ProjectTree { root },
            None => {
                debug!(path, "update target missing or not a file");
                self.clone()
            }
        }
    }

    /// Insert `node` as a child of the folder at `parent_path`.
    ///
    /// The node (and any descendants) is re-pathed under the parent, so
    /// callers only need to get the name right. If the slot is already
    /// occupied: a file replaces a file, a folder onto a folder is a no-op,
    /// and a kind mismatch leaves the tree unchanged. A node whose name (or
    /// any descendant's name) is not a single path segment is rejected.
    pub fn insert_under(&self, parent_path: &str, node: Node) -> ProjectTree {
        if !names_are_segments(&node) {
            warn!(parent_path, name = node.name(), "node name is not a single path segment");
            return self.clone();
        }
        let Some(segments) = self.segments(parent_path) else {
            debug!(parent_path, "insert outside project root ignored");
            return self.clone();
        };
        let edited = rebuild(&self.root, &segments, &mut |parent: &Arc<Node>| {
            if !parent.is_folder() {
                warn!(parent = parent.path(), "cannot insert under a file");
                return None;
            }
            let incoming = Arc::new(node.rebased(parent.path()));
            let mut children = parent.children().to_vec();
            match parent.child_index(incoming.name()) {
                Some(index) => match (children[index].kind(), incoming.kind()) {
                    (NodeKind::File, NodeKind::File) => children[index] = incoming,
                    (NodeKind::Folder, NodeKind::Folder) => return None,
                    (existing, _) => {
                        warn!(
                            path = incoming.path(),
                            %existing,
                            "path already occupied by a different kind"
                        );
                        return None;
                    }
                },
                None => children.push(incoming),
            }
            Some(Arc::new(parent.with_children(children)))
        });
        match edited {
            Some(root) => ProjectTree { root },
            None => self.clone(),
        }
    }

    /// Insert or update a file, creating any missing ancestor folders first
    /// (mkdir -p semantics).
    ///
    /// `relative_file_path` is relative to the project root; a leading
    /// `<root>/` prefix is accepted and stripped. Re-running with the same
    /// path updates the file in place.
    pub fn insert_with_ancestors(
        &self,
        relative_file_path: &str,
        content: impl Into<String>,
    ) -> ProjectTree {
        let root_prefix = format!("{}/", self.root.path());
        let relative = relative_file_path
            .strip_prefix(&root_prefix)
            .unwrap_or(relative_file_path);

        let mut parts: Vec<&str> = relative
            .split('/')
            .filter(|p| !p.is_empty() && *p != ".")
            .collect();
        if parts.contains(&"..") {
            warn!(path = relative_file_path, "parent traversal is not allowed");
            return self.clone();
        }
        let Some(file_name) = parts.pop() else {
            warn!(path = relative_file_path, "invalid file path for creation");
            return self.clone();
        };

        let mut tree = self.clone();
        let mut parent_path = self.root.path().to_string();
        for folder in parts {
            let folder_path = format!("{parent_path}/{folder}");
            match tree.find(&folder_path).map(|n| n.kind()) {
                Some(NodeKind::Folder) => {}
                Some(NodeKind::File) => {
                    warn!(path = %folder_path, "a file occupies an ancestor folder slot");
                    return self.clone();
                }
                None => {
                    tree = tree.insert_under(&parent_path, Node::folder(folder, folder_path.clone()));
                }
            }
            parent_path = folder_path;
        }

        let file_path = format!("{parent_path}/{file_name}");
        let content = content.into();
        match tree.find(&file_path).map(|n| n.kind()) {
            Some(NodeKind::File) => tree.update(&file_path, &NodePatch::content(content)),
            Some(NodeKind::Folder) => {
                warn!(path = %file_path, "a folder occupies the file slot");
                self.clone()
            }
            None => tree.insert_under(
                &parent_path,
                Node::file(file_name, file_path.clone(), Some(content)),
            ),
        }
    }

    /// Split a full path into child-name segments below the root.
    fn segments<'a>(&self, path: &'a str) -> Option<Vec<&'a str>> {
        let root_path = self.root.path();
        if path == root_path {
            return Some(Vec::new());
        }
        let rest = path.strip_prefix(root_path)?.strip_prefix('/')?;
        let segments: Vec<&str> = rest.split('/').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return None;
        }
        Some(segments)
    }
}

fn names_are_segments(node: &Node) -> bool {
    is_valid_name(node.name()) && node.children().iter().all(|c| names_are_segments(c))
}

/// Rebuild the spine from `node` down along `segments`, applying `edit` at
/// the target. Returns `None` when nothing changed.
fn rebuild<F>(node: &Arc<Node>, segments: &[&str], edit: &mut F) -> Option<Arc<Node>>
where
    F: FnMut(&Arc<Node>) -> Option<Arc<Node>>,
{
    match segments.split_first() {
        None => edit(node),
        Some((head, rest)) => {
            let index = node.child_index(head)?;
            let replaced = rebuild(&node.children()[index], rest, edit)?;
            let mut children = node.children().to_vec();
            children[index] = replaced;
            Some(Arc::new(node.with_children(children)))
        }
    }
}

/// Iterator over the file leaves of a [`ProjectTree`].
pub struct Files<'a> {
    stack: Vec<&'a Arc<Node>>,
}

impl<'a> Iterator for Files<'a> {
    type Item = &'a Arc<Node>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.stack.pop() {
            match node.body() {
                NodeBody::File { .. } => return Some(node),
                NodeBody::Folder { children } => self.stack.extend(children.iter().rev()),
            }
        }
        None
    }
}
