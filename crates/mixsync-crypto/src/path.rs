/// Name of the reserved metadata folder at the project root.
pub const METADATA_DIR: &str = ".mixsync";

/// Whether content stored at `path` is protected by the overlay.
///
/// A path is protected when any of its folder segments is
/// [`METADATA_DIR`]. The folder itself and files that merely share the
/// name are not.
pub fn is_protected(path: &str) -> bool {
    let mut segments = path.split('/').filter(|s| !s.is_empty()).peekable();
    while let Some(segment) = segments.next() {
        if segments.peek().is_some() && segment == METADATA_DIR {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_documents_are_protected() {
        assert!(is_protected("proj/.mixsync/history.json"));
        assert!(is_protected("proj/.mixsync/session.meta"));
        assert!(is_protected("proj/nested/.mixsync/notes.txt"));
    }

    #[test]
    fn ordinary_files_are_not() {
        assert!(!is_protected("proj/src/main.ts"));
        assert!(!is_protected("proj/.mixsyncrc"));
        assert!(!is_protected("proj/my.mixsync/file.txt"));
    }

    #[test]
    fn the_folder_itself_is_not() {
        assert!(!is_protected("proj/.mixsync"));
        assert!(!is_protected("proj/.mixsync/"));
        assert!(!is_protected(""));
    }
}
