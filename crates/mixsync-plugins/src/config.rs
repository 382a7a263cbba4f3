use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Per-plugin settings in a project's enablement map.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginSettings {
    #[serde(default)]
    pub enabled: bool,
}

/// Plugin name to settings, as stored in `plugins.json`.
///
/// Serializes as a bare JSON object: `{"Smart Linter": {"enabled": true}}`.
/// Names that match no registered plugin are kept but have no effect.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PluginsConfig(BTreeMap<String, PluginSettings>);

impl PluginsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `name` is present and enabled. Unknown names are disabled.
    pub fn is_enabled(&self, name: &str) -> bool {
        self.0.get(name).is_some_and(|s| s.enabled)
    }

    pub fn set_enabled(&mut self, name: impl Into<String>, enabled: bool) {
        self.0.insert(name.into(), PluginSettings { enabled });
    }

    /// Overlay every entry of `other` onto this map.
    pub fn merge(&mut self, other: &PluginsConfig) {
        for (name, settings) in &other.0 {
            self.0.insert(name.clone(), *settings);
        }
    }

    pub fn get(&self, name: &str) -> Option<&PluginSettings> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PluginSettings)> {
        self.0.iter().map(|(name, settings)| (name.as_str(), settings))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, bool)> for PluginsConfig {
    fn from_iter<I: IntoIterator<Item = (S, bool)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, enabled)| (name.into(), PluginSettings { enabled }))
                .collect(),
        )
    }
}

/// Configuration for the hook pipeline.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Maximum wall-clock time a single hook call may take.
    pub hook_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            hook_timeout: Duration::from_secs(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_enablement_map() {
        let config: PluginsConfig = serde_json::from_str(
            r#"{"Smart Linter": {"enabled": true}, "Code Diagrammer": {"enabled": false}}"#,
        )
        .unwrap();
        assert!(config.is_enabled("Smart Linter"));
        assert!(!config.is_enabled("Code Diagrammer"));
        assert!(!config.is_enabled("Unknown"));
        assert_eq!(config.len(), 2);
    }

    #[test]
    fn missing_enabled_flag_means_disabled() {
        let config: PluginsConfig = serde_json::from_str(r#"{"Smart Linter": {}}"#).unwrap();
        assert!(!config.is_enabled("Smart Linter"));
    }

    #[test]
    fn serializes_as_bare_object() {
        let config: PluginsConfig = [("Smart Linter", true)].into_iter().collect();
        assert_eq!(
            serde_json::to_string(&config).unwrap(),
            r#"{"Smart Linter":{"enabled":true}}"#
        );
    }

    #[test]
    fn merge_overlays_entries() {
        let mut base: PluginsConfig = [("A", true), ("B", true)].into_iter().collect();
        let overlay: PluginsConfig = [("B", false), ("C", true)].into_iter().collect();
        base.merge(&overlay);
        assert!(base.is_enabled("A"));
        assert!(!base.is_enabled("B"));
        assert!(base.is_enabled("C"));
    }

    #[test]
    fn default_hook_timeout() {
        assert_eq!(PipelineConfig::default().hook_timeout, Duration::from_secs(5));
    }
}
