//! Analyzer plugins for MixSync.
//!
//! Plugins inspect file content through two optional hooks:
//!
//! - `on_code_change`: diagnostics ([`Suggestion`]s) for the editor; results
//!   of every enabled plugin are concatenated in registration order.
//! - `on_open_file`: a single follow-up [`OpenFilePrompt`]; the first enabled
//!   plugin with a non-blank prompt wins.
//!
//! The [`PluginPipeline`] guards every hook call. Errors, panics and
//! timeouts are logged and recorded as a failed [`HookOutcome`]; they never
//! abort a run or hide other plugins' results.
//!
//! [`PassTracker`] hands out per-file pass tokens so that a slow, stale
//! diagnostics pass cannot overwrite a newer one.

pub mod builtin;
pub mod config;
pub mod error;
pub mod pass;
pub mod pipeline;
pub mod plugin;
pub mod registry;
pub mod suggestion;

pub use config::{PipelineConfig, PluginSettings, PluginsConfig};
pub use error::{PluginError, PluginResult};
pub use pass::{PassToken, PassTracker};
pub use pipeline::{CodeChangeReport, HookOutcome, HookStatus, OpenFileReport, PluginPipeline};
pub use plugin::{Capability, FileContext, Plugin, PluginDescriptor};
pub use registry::PluginRegistry;
pub use suggestion::{fence_label, OpenFilePrompt, PromptBuilder, Remediation, Suggestion, TextRange};
