//! Path-addressed project tree for MixSync.
//!
//! A [`ProjectTree`] is an immutable snapshot of a project's files and
//! folders. It is built once from a flat path enumeration and then evolves
//! only through copy-on-write edits that reallocate the root-to-target spine
//! and share every other subtree by reference.
//!
//! # Key Types
//!
//! - [`ProjectTree`]: snapshot with `find`, `update`, `insert_under`,
//!   `insert_with_ancestors` and `files`
//! - [`Node`]: a file or folder; folders own ordered `Arc<Node>` children
//! - [`ImportEntry`]: one `(path, content)` pair from an import source
//! - [`LanguageTag`]: extension-derived language classification
//!
//! # Example
//!
//! ```rust
//! use mixsync_tree::{ImportEntry, NodePatch, ProjectTree};
//!
//! let tree = ProjectTree::from_entries(vec![
//!     ImportEntry::file("demo/src/main.ts", "let x = 1;"),
//!     ImportEntry::file("demo/README.md", "# demo"),
//! ])
//! .unwrap();
//!
//! let next = tree.update("demo/src/main.ts", &NodePatch::content("const x = 1;"));
//! assert_eq!(next.find("demo/src/main.ts").unwrap().content(), Some("const x = 1;"));
//! assert!(std::sync::Arc::ptr_eq(
//!     tree.find("demo/README.md").unwrap(),
//!     next.find("demo/README.md").unwrap(),
//! ));
//! ```

pub mod import;
pub mod language;
pub mod node;
pub mod tree;

pub use import::ImportEntry;
pub use language::LanguageTag;
pub use node::{is_valid_name, sibling_order, Node, NodeBody, NodeKind, NodePatch, SORT_FIRST_MARKER};
pub use tree::{Files, ProjectTree};
