use async_trait::async_trait;
use mixsync_tree::LanguageTag;
use serde::{Deserialize, Serialize};

use crate::error::PluginError;
use crate::suggestion::{OpenFilePrompt, Suggestion};

/// A named extension point a plugin may implement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Capability {
    OnCodeChange,
    OnOpenFile,
}

/// Static description of a plugin.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginDescriptor {
    /// Unique name; also the key in the per-project enablement map.
    pub name: String,
    pub description: String,
    /// Hooks the pipeline will dispatch to this plugin.
    pub capabilities: Vec<Capability>,
}

impl PluginDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            capabilities: Vec::new(),
        }
    }

    pub fn with_capability(mut self, capability: Capability) -> Self {
        if !self.capabilities.contains(&capability) {
            self.capabilities.push(capability);
        }
        self
    }

    pub fn supports(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}

/// What a hook sees of a file: a read-only projection, never persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContext {
    pub path: String,
    pub content: String,
    pub language: Option<LanguageTag>,
}

impl FileContext {
    /// Build a context, classifying the language from the path.
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        let path = path.into();
        let language = LanguageTag::from_file_name(&path);
        Self {
            path,
            content: content.into(),
            language,
        }
    }

    pub fn with_language(mut self, language: Option<LanguageTag>) -> Self {
        self.language = language;
        self
    }

    /// Lines of the content, split on `\n`.
    pub fn lines(&self) -> std::str::Split<'_, char> {
        self.content.split('\n')
    }
}

/// An analyzer that inspects file content.
///
/// Both hooks default to "no result", so a plugin implements only what it
/// declares in [`PluginDescriptor::capabilities`]. The pipeline only calls a
/// hook the descriptor declares.
///
/// The trait is object-safe and `Send + Sync` so plugins can be stored in a
/// shared registry.
#[async_trait]
pub trait Plugin: Send + Sync {
    fn descriptor(&self) -> &PluginDescriptor;

    fn name(&self) -> &str {
        &self.descriptor().name
    }

    /// Diagnostics for the current content.
    async fn on_code_change(&self, _context: &FileContext) -> Result<Vec<Suggestion>, PluginError> {
        Ok(Vec::new())
    }

    /// A follow-up prompt for a freshly opened file.
    async fn on_open_file(
        &self,
        _context: &FileContext,
    ) -> Result<Option<OpenFilePrompt>, PluginError> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_capabilities_are_a_set() {
        let d = PluginDescriptor::new("x", "")
            .with_capability(Capability::OnOpenFile)
            .with_capability(Capability::OnOpenFile);
        assert_eq!(d.capabilities, vec![Capability::OnOpenFile]);
        assert!(d.supports(Capability::OnOpenFile));
        assert!(!d.supports(Capability::OnCodeChange));
    }

    #[test]
    fn context_derives_language() {
        let ctx = FileContext::new("p/src/app.ts", "let a = 1;");
        assert_eq!(ctx.language, Some(LanguageTag::TypeScript));
        let ctx = FileContext::new("p/notes.txt", "").with_language(Some(LanguageTag::Markdown));
        assert_eq!(ctx.language, Some(LanguageTag::Markdown));
    }

    #[test]
    fn capability_serde_names() {
        let json = serde_json::to_string(&Capability::OnCodeChange).unwrap();
        assert_eq!(json, "\"onCodeChange\"");
    }
}
