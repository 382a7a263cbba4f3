use std::fmt;
use std::str::FromStr;

use mixsync_plugins::builtin::{CODE_DIAGRAMMER, SMART_LINTER};
use mixsync_plugins::PluginsConfig;
use serde::{Deserialize, Serialize};

/// Working-style presets. Applying one replaces the project's plugin
/// enablement map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Diagnostics on, diagrams off.
    Analytic,
    /// Diagrams on, linting off.
    Creative,
    /// Fast feedback: linting on, diagrams off.
    Agile,
}

impl Profile {
    pub const ALL: [Self; 3] = [Self::Analytic, Self::Creative, Self::Agile];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Analytic => "analytic",
            Self::Creative => "creative",
            Self::Agile => "agile",
        }
    }

    pub fn plugins(&self) -> PluginsConfig {
        let (linter, diagrammer) = match self {
            Self::Analytic | Self::Agile => (true, false),
            Self::Creative => (false, true),
        };
        [(SMART_LINTER, linter), (CODE_DIAGRAMMER, diagrammer)]
            .into_iter()
            .collect()
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown profile '{0}' (expected analytic, creative or agile)")]
pub struct UnknownProfile(pub String);

impl FromStr for Profile {
    type Err = UnknownProfile;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownProfile(s.to_string()))
    }
}
