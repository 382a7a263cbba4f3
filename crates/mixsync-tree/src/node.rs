use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::language::LanguageTag;

/// Names starting with this character sort ahead of all other siblings.
///
/// Keeps the reserved metadata folder visually first in listings.
pub const SORT_FIRST_MARKER: char = '.';

/// Whether a node is a file or a folder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Folder,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::Folder => write!(f, "folder"),
        }
    }
}

/// Kind-specific payload of a node.
///
/// Files carry content and a language tag, folders carry ordered children.
/// Making this an enum keeps "folders have no content, files have no
/// children" true by construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeBody {
    File {
        /// `None` until the file has been loaded.
        content: Option<String>,
        language: Option<LanguageTag>,
    },
    Folder {
        /// Children in sibling order, shared across tree versions.
        children: Vec<Arc<Node>>,
    },
}

/// A single file or folder in the project tree.
///
/// Nodes are immutable once built. Every edit produces a new node on the
/// root-to-target spine while untouched subtrees are shared via `Arc`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    name: String,
    path: String,
    body: NodeBody,
}

impl Node {
    /// Create a file node. The language tag is derived from `name`.
    pub fn file(name: impl Into<String>, path: impl Into<String>, content: Option<String>) -> Self {
        let name = name.into();
        let language = LanguageTag::from_file_name(&name);
        Self {
            name,
            path: path.into(),
            body: NodeBody::File { content, language },
        }
    }

    /// Create an empty folder node.
    pub fn folder(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::folder_with_children(name, path, Vec::new())
    }

    pub(crate) fn folder_with_children(
        name: impl Into<String>,
        path: impl Into<String>,
        mut children: Vec<Arc<Node>>,
    ) -> Self {
        children.sort_by(|a, b| sibling_order(a, b));
        Self {
            name: name.into(),
            path: path.into(),
            body: NodeBody::Folder { children },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Globally unique path: `parent.path + "/" + name`.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn body(&self) -> &NodeBody {
        &self.body
    }

    pub fn kind(&self) -> NodeKind {
        match self.body {
            NodeBody::File { .. } => NodeKind::File,
            NodeBody::Folder { .. } => NodeKind::Folder,
        }
    }

    pub fn is_file(&self) -> bool {
        self.kind() == NodeKind::File
    }

    pub fn is_folder(&self) -> bool {
        self.kind() == NodeKind::Folder
    }

    /// File content, if this is a loaded file.
    pub fn content(&self) -> Option<&str> {
        match &self.body {
            NodeBody::File { content, .. } => content.as_deref(),
            NodeBody::Folder { .. } => None,
        }
    }

    pub fn language(&self) -> Option<LanguageTag> {
        match &self.body {
            NodeBody::File { language, .. } => *language,
            NodeBody::Folder { .. } => None,
        }
    }

    /// Children in sibling order. Empty for files.
    pub fn children(&self) -> &[Arc<Node>] {
        match &self.body {
            NodeBody::Folder { children } => children,
            NodeBody::File { .. } => &[],
        }
    }

    pub(crate) fn child_index(&self, name: &str) -> Option<usize> {
        self.children().iter().position(|c| c.name == name)
    }

    /// Copy of this folder with `children` replacing the current ones.
    pub(crate) fn with_children(&self, children: Vec<Arc<Node>>) -> Self {
        Self::folder_with_children(self.name.clone(), self.path.clone(), children)
    }

    /// Copy of this node with `patch` applied. Folders ignore the patch.
    pub(crate) fn patched(&self, patch: &NodePatch) -> Self {
        match &self.body {
            NodeBody::File { content, language } => Self {
                name: self.name.clone(),
                path: self.path.clone(),
                body: NodeBody::File {
                    content: patch.content.clone().or_else(|| content.clone()),
                    language: patch.language.or(*language),
                },
            },
            NodeBody::Folder { .. } => self.clone(),
        }
    }

    /// Re-home this node (and its descendants) under `parent_path`.
    pub(crate) fn rebased(&self, parent_path: &str) -> Self {
        let path = format!("{parent_path}/{}", self.name);
        match &self.body {
            NodeBody::File { .. } => Self {
                name: self.name.clone(),
                path,
                body: self.body.clone(),
            },
            NodeBody::Folder { children } => {
                let children = children
                    .iter()
                    .map(|c| Arc::new(c.rebased(&path)))
                    .collect();
                Self::folder_with_children(self.name.clone(), path, children)
            }
        }
    }

    /// BLAKE3 Merkle digest of this subtree.
    ///
    /// Covers names, kinds, content and language tags. Two subtrees with the
    /// same digest render identically.
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        match &self.body {
            NodeBody::File { content, language } => {
                hasher.update(b"mixsync-file-v1:");
                hasher.update(self.name.as_bytes());
                hasher.update(&[0]);
                hasher.update(language.map(|l| l.as_str()).unwrap_or("").as_bytes());
                hasher.update(&[0]);
                match content {
                    Some(text) => {
                        hasher.update(&[1]);
                        hasher.update(text.as_bytes());
                    }
                    None => {
                        hasher.update(&[0]);
                    }
                }
            }
            NodeBody::Folder { children } => {
                hasher.update(b"mixsync-folder-v1:");
                hasher.update(self.name.as_bytes());
                hasher.update(&[0]);
                for child in children {
                    hasher.update(&child.digest());
                }
            }
        }
        *hasher.finalize().as_bytes()
    }

    /// Hex-encoded [`Self::digest`].
    pub fn digest_hex(&self) -> String {
        hex::encode(self.digest())
    }
}

/// Partial update applied to a file node by [`crate::ProjectTree::update`].
///
/// Unset fields keep their current value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodePatch {
    pub content: Option<String>,
    pub language: Option<LanguageTag>,
}

impl NodePatch {
    /// Patch that replaces file content.
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            language: None,
        }
    }

    pub fn with_language(mut self, language: LanguageTag) -> Self {
        self.language = Some(language);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.language.is_none()
    }
}

/// Whether `name` can be a single path segment: non-empty, not `.` or `..`,
/// and free of `/`.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains('/')
}

/// Sibling ordering: marker-prefixed names first, then folders before files,
/// then case-sensitive byte order of the name.
pub fn sibling_order(a: &Node, b: &Node) -> Ordering {
    let a_marked = a.name.starts_with(SORT_FIRST_MARKER);
    let b_marked = b.name.starts_with(SORT_FIRST_MARKER);
    b_marked
        .cmp(&a_marked)
        .then_with(|| match (a.kind(), b.kind()) {
            (NodeKind::Folder, NodeKind::File) => Ordering::Less,
            (NodeKind::File, NodeKind::Folder) => Ordering::Greater,
            _ => Ordering::Equal,
        })
        .then_with(|| a.name.cmp(&b.name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(nodes: &[Arc<Node>]) -> Vec<&str> {
        nodes.iter().map(|n| n.name()).collect()
    }

    #[test]
    fn file_derives_language_from_name() {
        let node = Node::file("main.ts", "p/main.ts", None);
        assert_eq!(node.kind(), NodeKind::File);
        assert_eq!(node.language(), Some(LanguageTag::TypeScript));
        assert!(node.content().is_none());
        assert!(node.children().is_empty());
    }

    #[test]
    fn folder_has_no_content() {
        let node = Node::folder("src", "p/src");
        assert!(node.is_folder());
        assert!(node.content().is_none());
        assert!(node.language().is_none());
    }

    #[test]
    fn children_are_ordered() {
        let children = vec![
            Arc::new(Node::file("b.txt", "p/b.txt", None)),
            Arc::new(Node::file("B.txt", "p/B.txt", None)),
            Arc::new(Node::folder("zeta", "p/zeta")),
            Arc::new(Node::file("a.txt", "p/a.txt", None)),
            Arc::new(Node::folder(".mixsync", "p/.mixsync")),
            Arc::new(Node::file(".env", "p/.env", None)),
            Arc::new(Node::folder("alpha", "p/alpha")),
        ];
        let root = Node::folder_with_children("p", "p", children);
        assert_eq!(
            names(root.children()),
            vec![".mixsync", ".env", "alpha", "zeta", "B.txt", "a.txt", "b.txt"]
        );
    }

    #[test]
    fn patch_keeps_unset_fields() {
        let node = Node::file("notes.md", "p/notes.md", Some("old".into()));
        let patched = node.patched(&NodePatch::content("new"));
        assert_eq!(patched.content(), Some("new"));
        assert_eq!(patched.language(), Some(LanguageTag::Markdown));

        let relabeled = node.patched(&NodePatch::default().with_language(LanguageTag::Mermaid));
        assert_eq!(relabeled.content(), Some("old"));
        assert_eq!(relabeled.language(), Some(LanguageTag::Mermaid));
    }

    #[test]
    fn patch_on_folder_is_ignored() {
        let node = Node::folder("src", "p/src");
        assert_eq!(node.patched(&NodePatch::content("x")), node);
    }

    #[test]
    fn rebase_rewrites_descendant_paths() {
        let inner = Node::folder_with_children(
            "lib",
            "old/lib",
            vec![Arc::new(Node::file("a.py", "old/lib/a.py", None))],
        );
        let moved = inner.rebased("new/pkg");
        assert_eq!(moved.path(), "new/pkg/lib");
        assert_eq!(moved.children()[0].path(), "new/pkg/lib/a.py");
    }

    #[test]
    fn digest_tracks_content() {
        let a = Node::file("a.txt", "p/a.txt", Some("one".into()));
        let b = Node::file("a.txt", "p/a.txt", Some("one".into()));
        let c = Node::file("a.txt", "p/a.txt", Some("two".into()));
        assert_eq!(a.digest(), b.digest());
        assert_ne!(a.digest(), c.digest());
        assert_eq!(a.digest_hex().len(), 64);
    }

    #[test]
    fn digest_distinguishes_unloaded_from_empty() {
        let unloaded = Node::file("a.txt", "p/a.txt", None);
        let empty = Node::file("a.txt", "p/a.txt", Some(String::new()));
        assert_ne!(unloaded.digest(), empty.digest());
    }
}
