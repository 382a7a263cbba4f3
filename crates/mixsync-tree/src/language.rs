use std::fmt;

use serde::{Deserialize, Serialize};

/// Language classification attached to file nodes.
///
/// Derived from the file extension when a file enters the tree. Analyzers use
/// it to decide whether a file is in scope, and remediation prompts use it to
/// label fenced code blocks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageTag {
    TypeScript,
    JavaScript,
    Python,
    Json,
    Markdown,
    Mermaid,
    Yaml,
}

impl LanguageTag {
    /// Classify a file by the extension of its name (or full path).
    ///
    /// Matching is case-insensitive. Unknown extensions yield `None`.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let file_name = name.rsplit('/').next().unwrap_or(name);
        let (_, ext) = file_name.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "ts" | "tsx" => Some(Self::TypeScript),
            "js" | "jsx" => Some(Self::JavaScript),
            "py" => Some(Self::Python),
            "json" => Some(Self::Json),
            "md" => Some(Self::Markdown),
            "mmd" | "mermaid" => Some(Self::Mermaid),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }

    /// Lowercase identifier, as used in fenced code blocks.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TypeScript => "typescript",
            Self::JavaScript => "javascript",
            Self::Python => "python",
            Self::Json => "json",
            Self::Markdown => "markdown",
            Self::Mermaid => "mermaid",
            Self::Yaml => "yaml",
        }
    }

    /// Returns `true` for the JavaScript family (JS and TS).
    pub fn is_script(&self) -> bool {
        matches!(self, Self::TypeScript | Self::JavaScript)
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
