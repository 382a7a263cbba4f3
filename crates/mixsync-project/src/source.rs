use async_trait::async_trait;
use mixsync_tree::ImportEntry;

use crate::error::ProjectResult;

/// Supplies the flat `(path, content)` enumeration a project is built from:
/// a folder picker, a directory walk or a scaffold generator.
///
/// Every path's first segment names the project root.
#[async_trait]
pub trait ImportSource: Send + Sync {
    async fn enumerate(&self) -> ProjectResult<Vec<ImportEntry>>;
}

/// An in-memory enumeration.
#[async_trait]
impl ImportSource for Vec<ImportEntry> {
    async fn enumerate(&self) -> ProjectResult<Vec<ImportEntry>> {
        Ok(self.clone())
    }
}
