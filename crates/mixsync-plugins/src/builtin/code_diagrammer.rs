use async_trait::async_trait;
use mixsync_tree::LanguageTag;

use super::CODE_DIAGRAMMER;
use crate::error::PluginError;
use crate::plugin::{Capability, FileContext, Plugin, PluginDescriptor};
use crate::suggestion::{fence_label, OpenFilePrompt};

/// Files shorter than this (in characters) are not worth a diagram.
const MIN_CONTENT_CHARS: usize = 50;

/// Asks the assistant for a Mermaid structure diagram when a source file is
/// opened.
pub struct CodeDiagrammer {
    descriptor: PluginDescriptor,
}

impl CodeDiagrammer {
    pub fn new() -> Self {
        Self {
            descriptor: PluginDescriptor::new(
                CODE_DIAGRAMMER,
                "Requests a Mermaid diagram of the code structure when a file is opened.",
            )
            .with_capability(Capability::OnOpenFile),
        }
    }
}

impl Default for CodeDiagrammer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Plugin for CodeDiagrammer {
    fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }

    async fn on_open_file(&self, context: &FileContext) -> Result<Option<OpenFilePrompt>, PluginError> {
        let supported = matches!(
            context.language,
            Some(LanguageTag::TypeScript | LanguageTag::JavaScript | LanguageTag::Python)
        );
        if !supported || context.content.chars().count() < MIN_CONTENT_CHARS {
            return Ok(None);
        }

        Ok(Some(OpenFilePrompt::new(format!(
            "Please generate a Mermaid.js graph (using graph TD) that illustrates the high-level \
             structure of the following code from the file \"{}\". The diagram should show key \
             functions, classes, and their relationships. Provide only the Mermaid code block.\
             \n\n```{}\n{}\n```",
            context.path,
            fence_label(context.language),
            context.content
        ))))
    }
}
