use mixsync_crypto::CipherError;
use thiserror::Error;

use crate::metadata::MetadataDocument;
use crate::state::ProjectPhase;

/// A metadata document that could not be parsed.
///
/// On load this is logged and the document's defaults apply; it is only
/// returned to callers that submit a malformed document themselves.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("malformed {document}: {reason}")]
pub struct MetadataError {
    pub document: MetadataDocument,
    pub reason: String,
}

impl MetadataError {
    pub fn new(document: MetadataDocument, reason: impl ToString) -> Self {
        Self {
            document,
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("project is not ready (currently {0})")]
    NotReady(ProjectPhase),

    #[error("a project is already open")]
    AlreadyOpen,

    #[error("import source produced no usable entries")]
    EmptyProject,

    #[error("import failed: {0}")]
    Import(String),

    #[error("path is outside the project: {0}")]
    OutsideProject(String),

    #[error("path not found: {0}")]
    NotFound(String),

    #[error("not a file: {0}")]
    NotAFile(String),

    #[error("path conflicts with an existing node: {0}")]
    PathConflict(String),

    #[error("cipher error: {0}")]
    Cipher(#[from] CipherError),

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ProjectResult<T> = Result<T, ProjectError>;
