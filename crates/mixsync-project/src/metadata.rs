//! The well-known documents under the reserved `.mixsync/` folder.
//!
//! All four are JSON, stored sealed by the crypto overlay and held in memory
//! as plaintext. Each one is loaded independently: a document that is
//! missing or malformed falls back to its defaults without affecting the
//! others.

use std::fmt;

use mixsync_crypto::{CipherResult, ContentCipher, METADATA_DIR};
use mixsync_plugins::PluginsConfig;
use mixsync_tree::{ImportEntry, ProjectTree};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::MetadataError;

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MetadataDocument {
    /// `session.meta`: the active-file pointer.
    Session,
    /// `history.json`: the assistant conversation.
    History,
    /// `plugins.json`: plugin enablement.
    Plugins,
    /// `ast-map.json`: opaque output of an external analysis collaborator.
    AstMap,
}

impl MetadataDocument {
    pub const ALL: [Self; 4] = [Self::Session, Self::History, Self::Plugins, Self::AstMap];

    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Session => "session.meta",
            Self::History => "history.json",
            Self::Plugins => "plugins.json",
            Self::AstMap => "ast-map.json",
        }
    }

    /// Full path of this document in the project rooted at `root`.
    pub fn path_in(&self, root: &str) -> String {
        format!("{root}/{METADATA_DIR}/{}", self.file_name())
    }

    /// The document stored at `path`, if any.
    pub fn from_path(root: &str, path: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|doc| doc.path_in(root) == path)
    }
}

impl fmt::Display for MetadataDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

// ---------------------------------------------------------------------------
// Document payloads
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMeta {
    #[serde(rename = "activeFile", default, skip_serializing_if = "Option::is_none")]
    pub active_file: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One entry of `history.json`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: Role,
    pub text: String,
}

impl ChatMessage {
    /// A new message with a time-ordered UUID v7 id.
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::now_v7().to_string(),
            role,
            text: text.into(),
        }
    }
}

/// Parsed contents of all four documents.
#[derive(Clone, Debug, PartialEq)]
pub struct Metadata {
    pub session: SessionMeta,
    pub history: Vec<ChatMessage>,
    pub plugins: PluginsConfig,
    pub ast_map: serde_json::Value,
}

impl Metadata {
    /// What a project with no (readable) metadata starts with.
    pub fn defaults(default_plugins: &PluginsConfig) -> Self {
        Self {
            session: SessionMeta::default(),
            history: Vec::new(),
            plugins: default_plugins.clone(),
            ast_map: empty_object(),
        }
    }

    /// Decrypt and parse every document found in `tree`.
    pub fn load(tree: &ProjectTree, cipher: &ContentCipher, default_plugins: &PluginsConfig) -> Self {
        let mut metadata = Self::defaults(default_plugins);
        for document in MetadataDocument::ALL {
            let text = match read_document(tree, cipher, document) {
                Ok(Some(text)) => text,
                Ok(None) => {
                    debug!(%document, "metadata document absent; using defaults");
                    continue;
                }
                Err(err) => {
                    warn!(error = %err, "metadata document unreadable; using defaults");
                    continue;
                }
            };
            if let Err(err) = metadata.apply(document, &text) {
                warn!(error = %err, "metadata document malformed; using defaults");
            }
        }
        metadata
    }

    /// Replace one document's contents from its plaintext JSON.
    ///
    /// On error the current value is left untouched.
    pub fn apply(&mut self, document: MetadataDocument, text: &str) -> Result<(), MetadataError> {
        match document {
            MetadataDocument::Session => self.session = parse(document, text)?,
            MetadataDocument::History => self.history = parse(document, text)?,
            MetadataDocument::Plugins => self.plugins = parse(document, text)?,
            MetadataDocument::AstMap => self.ast_map = parse(document, text)?,
        }
        Ok(())
    }
}

pub(crate) fn parse<T: DeserializeOwned>(
    document: MetadataDocument,
    text: &str,
) -> Result<T, MetadataError> {
    serde_json::from_str(text).map_err(|e| MetadataError::new(document, e))
}

pub(crate) fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

/// The plaintext of `document`, or `None` when it is missing, unloaded or
/// blank.
fn read_document(
    tree: &ProjectTree,
    cipher: &ContentCipher,
    document: MetadataDocument,
) -> Result<Option<String>, MetadataError> {
    let path = document.path_in(tree.name());
    let Some(stored) = tree.find(&path).and_then(|node| node.content()) else {
        return Ok(None);
    };
    let text = cipher
        .decrypt_with_policy(stored)
        .map_err(|e| MetadataError::new(document, e))?;
    Ok((!text.trim().is_empty()).then_some(text))
}

/// Sealed default documents for a brand-new project named `root`.
pub fn scaffold(
    root: &str,
    cipher: &ContentCipher,
    default_plugins: &PluginsConfig,
) -> CipherResult<Vec<ImportEntry>> {
    let plugins = serde_json::to_string_pretty(default_plugins).unwrap_or_else(|_| "{}".into());
    [
        (MetadataDocument::History, "[]".to_string()),
        (MetadataDocument::Plugins, plugins),
        (MetadataDocument::Session, "{}".to_string()),
        (MetadataDocument::AstMap, "{}".to_string()),
    ]
    .into_iter()
    .map(|(document, plain)| {
        cipher
            .encrypt(&plain)
            .map(|sealed| ImportEntry::file(document.path_in(root), sealed))
    })
    .collect()
}
