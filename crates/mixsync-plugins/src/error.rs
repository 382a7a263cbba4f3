use std::time::Duration;

/// Errors raised by plugins or by the registry.
///
/// Hook errors never leave the pipeline: they are logged, recorded in the
/// run's [`crate::HookOutcome`] and treated as an empty result for that
/// plugin.
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    /// The hook returned an error.
    #[error("plugin '{plugin}' failed: {message}")]
    Hook { plugin: String, message: String },

    /// The hook panicked while being polled.
    #[error("plugin '{plugin}' panicked")]
    Panicked { plugin: String },

    /// The hook exceeded the pipeline's per-hook time budget.
    #[error("plugin '{plugin}' timed out after {after:?}")]
    TimedOut { plugin: String, after: Duration },

    /// A plugin with this name is already registered.
    #[error("a plugin named '{0}' is already registered")]
    DuplicateName(String),
}

impl PluginError {
    /// Create a hook error with a plugin name and message.
    pub fn hook(plugin: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Hook {
            plugin: plugin.into(),
            message: message.into(),
        }
    }
}

pub type PluginResult<T> = Result<T, PluginError>;
