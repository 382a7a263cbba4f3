//! Building a [`ProjectTree`] from a flat path enumeration.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::node::{is_valid_name, Node};
use crate::tree::ProjectTree;

/// One file reported by an import source (folder picker, scaffold
/// generator, ...).
///
/// `path` is relative to the import location and its first segment names the
/// project root, e.g. `my-app/src/main.ts`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportEntry {
    pub path: String,
    /// `None` when the content has not been read yet.
    pub content: Option<String>,
}

impl ImportEntry {
    pub fn file(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: Some(content.into()),
        }
    }

    /// An entry whose content will be loaded later.
    pub fn unloaded(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: None,
        }
    }
}

enum Draft {
    File(Option<String>),
    Folder(BTreeMap<String, Draft>),
}

impl ProjectTree {
    /// Build a tree from a flat list of file entries.
    ///
    /// The root name is taken from the first entry. Intermediate folders are
    /// implied by the paths. The result is deterministic for a given set of
    /// entries; duplicate paths collapse to a single node (last one wins).
    /// Entries outside the root, or that collide with an existing node of the
    /// other kind, are skipped with a warning. Returns `None` when no entry
    /// names a root.
    pub fn from_entries<I>(entries: I) -> Option<ProjectTree>
    where
        I: IntoIterator<Item = ImportEntry>,
    {
        let mut root_name: Option<String> = None;
        let mut top: BTreeMap<String, Draft> = BTreeMap::new();

        'entries: for entry in entries {
            let segments: Vec<&str> = entry.path.split('/').filter(|s| !s.is_empty()).collect();
            if segments.iter().any(|s| !is_valid_name(s)) {
                warn!(path = %entry.path, "skipping path with `.` or `..` segments");
                continue;
            }
            let Some((first, rest)) = segments.split_first() else {
                warn!(path = %entry.path, "skipping empty import path");
                continue;
            };
            let root = root_name.get_or_insert_with(|| first.to_string());
            if root.as_str() != *first {
                warn!(path = %entry.path, root = %root, "skipping entry outside project root");
                continue;
            }
            let Some((file_name, folders)) = rest.split_last() else {
                warn!(path = %entry.path, "skipping entry that names the root itself");
                continue;
            };

            let mut dir = &mut top;
            for folder in folders {
                dir = match dir
                    .entry(folder.to_string())
                    .or_insert_with(|| Draft::Folder(BTreeMap::new()))
                {
                    Draft::Folder(children) => children,
                    Draft::File(_) => {
                        warn!(path = %entry.path, folder, "a file occupies an ancestor folder slot");
                        continue 'entries;
                    }
                };
            }
            if let Some(Draft::Folder(_)) = dir.get(*file_name) {
                warn!(path = %entry.path, "a folder occupies the file slot");
                continue;
            }
            dir.insert(file_name.to_string(), Draft::File(entry.content));
        }

        let name = root_name?;
        let children = freeze_children(&name, top);
        Some(ProjectTree::from_root(Node::folder_with_children(
            name.clone(),
            name,
            children,
        )))
    }
}

fn freeze_children(parent_path: &str, drafts: BTreeMap<String, Draft>) -> Vec<Arc<Node>> {
    drafts
        .into_iter()
        .map(|(name, draft)| {
            let path = format!("{parent_path}/{name}");
            let node = match draft {
                Draft::File(content) => Node::file(name, path, content),
                Draft::Folder(children) => {
                    let children = freeze_children(&path, children);
                    Node::folder_with_children(name, path, children)
                }
            };
            Arc::new(node)
        })
        .collect()
}
