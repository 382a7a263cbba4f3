//! # mixsync-project
//!
//! The project state coordinator: imports a project into an immutable
//! [`mixsync_tree::ProjectTree`], keeps the reserved `.mixsync/` metadata
//! documents sealed at rest, tracks the active file and runs the plugin
//! pipeline with stale-pass protection.
//!
//! ```text
//! ImportSource ──open──> Project ──read/write──> ProjectTree snapshots
//!                          │
//!                          ├── ContentCipher   (.mixsync/ overlay)
//!                          ├── Metadata        (session, history, plugins, ast map)
//!                          └── PluginPipeline  (guarded by PassTracker)
//! ```

pub mod config;
pub mod error;
pub mod metadata;
pub mod profile;
pub mod project;
pub mod source;
pub mod state;

pub use config::ProjectConfig;
pub use error::{MetadataError, ProjectError, ProjectResult};
pub use metadata::{ChatMessage, Metadata, MetadataDocument, Role, SessionMeta};
pub use profile::{Profile, UnknownProfile};
pub use project::{DiagnosticsPass, Project};
pub use source::ImportSource;
pub use state::ProjectPhase;
