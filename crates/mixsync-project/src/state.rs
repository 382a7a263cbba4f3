use std::collections::HashMap;
use std::fmt;

use mixsync_plugins::{PluginsConfig, Suggestion};
use mixsync_tree::ProjectTree;
use serde::{Deserialize, Serialize};

use crate::error::{MetadataError, ProjectError, ProjectResult};
use crate::metadata::{self, ChatMessage, Metadata, MetadataDocument, SessionMeta};

/// Lifecycle of a [`crate::Project`].
///
/// `Closed -> Loading -> Ready -> Closed`. Reads and writes are accepted
/// only while `Ready`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectPhase {
    #[default]
    Closed,
    Loading,
    Ready,
}

impl fmt::Display for ProjectPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Closed => "closed",
            Self::Loading => "loading",
            Self::Ready => "ready",
        })
    }
}

/// Everything held in memory while a project is open.
#[derive(Debug, Default)]
pub(crate) struct ProjectState {
    pub phase: ProjectPhase,
    /// Bumped by every `open`; a load only installs if it still matches.
    pub generation: u64,
    pub tree: Option<ProjectTree>,
    pub active_file: Option<String>,
    pub history: Vec<ChatMessage>,
    pub plugins: PluginsConfig,
    pub ast_map: serde_json::Value,
    pub diagnostics: HashMap<String, Vec<Suggestion>>,
}

impl ProjectState {
    /// The committed snapshot, if the project is ready.
    pub fn ready_tree(&self) -> ProjectResult<&ProjectTree> {
        match (&self.tree, self.phase) {
            (Some(tree), ProjectPhase::Ready) => Ok(tree),
            _ => Err(ProjectError::NotReady(self.phase)),
        }
    }

    /// Transition to `Ready` with a freshly loaded tree and its metadata.
    pub fn install(&mut self, tree: ProjectTree, metadata: Metadata) {
        self.active_file = existing_file(&tree, metadata.session.active_file);
        self.history = metadata.history;
        self.plugins = metadata.plugins;
        self.ast_map = metadata.ast_map;
        self.diagnostics.clear();
        self.tree = Some(tree);
        self.phase = ProjectPhase::Ready;
    }

    /// Re-derive in-memory state after a metadata document was rewritten.
    ///
    /// On error the current state is kept.
    pub fn refresh(&mut self, document: MetadataDocument, text: &str) -> Result<(), MetadataError> {
        match document {
            MetadataDocument::Session => {
                let session: SessionMeta = metadata::parse(document, text)?;
                if let Some(tree) = &self.tree {
                    self.active_file = existing_file(tree, session.active_file);
                }
            }
            MetadataDocument::History => self.history = metadata::parse(document, text)?,
            MetadataDocument::Plugins => self.plugins = metadata::parse(document, text)?,
            MetadataDocument::AstMap => self.ast_map = metadata::parse(document, text)?,
        }
        Ok(())
    }

    /// Drop the tree and every piece of derived state.
    pub fn reset(&mut self) {
        let generation = self.generation;
        *self = Self::default();
        self.generation = generation;
    }
}

/// `path`, if it names a file in `tree`.
fn existing_file(tree: &ProjectTree, path: Option<String>) -> Option<String> {
    path.filter(|p| tree.find(p).is_some_and(|n| n.is_file()))
}
