use std::path::{Path, PathBuf};

use async_trait::async_trait;
use mixsync_project::{ImportSource, ProjectError, ProjectResult};
use mixsync_tree::ImportEntry;
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Directories never imported.
const SKIPPED_DIRS: &[&str] = &[".git", "target", "node_modules"];

/// Imports a directory on disk. The directory's own name becomes the
/// project root; files that are not UTF-8 are imported unloaded.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn walk(dir: &Path) -> ProjectResult<Vec<ImportEntry>> {
        let dir = dir
            .canonicalize()
            .map_err(|e| ProjectError::Import(format!("{}: {e}", dir.display())))?;
        let root = dir
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| ProjectError::Import(format!("{} has no usable name", dir.display())))?
            .to_string();

        let mut entries = Vec::new();
        let walker = WalkDir::new(&dir)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !is_skipped(entry));
        for entry in walker {
            let entry = entry.map_err(|e| ProjectError::Import(e.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&dir) else {
                continue;
            };
            let segments: Option<Vec<&str>> = relative.iter().map(|s| s.to_str()).collect();
            let Some(segments) = segments else {
                debug!(path = %entry.path().display(), "skipping non UTF-8 path");
                continue;
            };
            let path = format!("{root}/{}", segments.join("/"));
            entries.push(match std::fs::read_to_string(entry.path()) {
                Ok(content) => ImportEntry::file(path, content),
                Err(_) => ImportEntry::unloaded(path),
            });
        }
        debug!(root = %root, files = entries.len(), "directory enumerated");
        Ok(entries)
    }
}

fn is_skipped(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| SKIPPED_DIRS.contains(&name))
}

#[async_trait]
impl ImportSource for DirectorySource {
    async fn enumerate(&self) -> ProjectResult<Vec<ImportEntry>> {
        let dir = self.dir.clone();
        tokio::task::spawn_blocking(move || Self::walk(&dir))
            .await
            .map_err(|e| ProjectError::Import(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[tokio::test]
    async fn walks_with_root_prefix_and_skips_vcs() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("demo");
        fs::create_dir_all(dir.join("src/util")).unwrap();
        fs::create_dir_all(dir.join(".git")).unwrap();
        fs::create_dir_all(dir.join(".mixsync")).unwrap();
        fs::write(dir.join("src/util/a.ts"), "let a = 1;").unwrap();
        fs::write(dir.join("README.md"), "# demo").unwrap();
        fs::write(dir.join(".git/HEAD"), "ref").unwrap();
        fs::write(dir.join(".mixsync/plugins.json"), "{}").unwrap();
        fs::write(dir.join("logo.bin"), [0xff, 0xfe, 0x00]).unwrap();

        let entries = DirectorySource::new(&dir).enumerate().await.unwrap();
        let paths: Vec<&str> = entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "demo/.mixsync/plugins.json",
                "demo/README.md",
                "demo/logo.bin",
                "demo/src/util/a.ts",
            ]
        );
        assert_eq!(entries[1].content.as_deref(), Some("# demo"));
        assert_eq!(entries[2].content, None);
    }

    #[tokio::test]
    async fn missing_directory_is_an_import_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = DirectorySource::new(tmp.path().join("nope"))
            .enumerate()
            .await
            .unwrap_err();
        assert!(matches!(err, ProjectError::Import(_)));
    }
}
