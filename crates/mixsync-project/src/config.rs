use mixsync_crypto::CipherConfig;
use mixsync_plugins::builtin::{CODE_DIAGRAMMER, SMART_LINTER};
use mixsync_plugins::{PipelineConfig, PluginsConfig};
use serde::{Deserialize, Serialize};

/// Configuration for a [`crate::Project`].
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub cipher: CipherConfig,
    pub pipeline: PipelineConfig,
    /// Enablement used when a project has no readable `plugins.json`, and
    /// written into the metadata scaffold of new projects.
    pub default_plugins: PluginsConfig,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            cipher: CipherConfig::default(),
            pipeline: PipelineConfig::default(),
            default_plugins: [(SMART_LINTER, true), (CODE_DIAGRAMMER, true)]
                .into_iter()
                .collect(),
        }
    }
}
