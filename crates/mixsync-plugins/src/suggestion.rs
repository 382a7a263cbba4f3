use std::fmt;

use mixsync_tree::LanguageTag;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// TextRange
// ---------------------------------------------------------------------------

/// A span in a text document.
///
/// Lines and columns are 1-based. The end column is exclusive, so a token
/// of length 3 at the start of a line spans columns `1..4`. Columns count
/// characters, not bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRange {
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

impl TextRange {
    pub fn new(start_line: u32, start_col: u32, end_line: u32, end_col: u32) -> Self {
        Self {
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }

    /// The whole of `text`, which sits on 1-based line `line`.
    pub fn whole_line(line: u32, text: &str) -> Self {
        Self::new(line, 1, line, column_after(text))
    }

    /// The byte range `start..end` of `text` on 1-based line `line`.
    ///
    /// Byte offsets must fall on character boundaries (as regex match
    /// offsets always do).
    pub fn from_byte_span(line: u32, text: &str, start: usize, end: usize) -> Self {
        Self::new(
            line,
            column_after(&text[..start]),
            line,
            column_after(&text[..end]),
        )
    }
}

/// The 1-based column just past `prefix`.
fn column_after(prefix: &str) -> u32 {
    u32::try_from(prefix.chars().count()).map_or(u32::MAX, |n| n.saturating_add(1))
}

// ---------------------------------------------------------------------------
// Remediation
// ---------------------------------------------------------------------------

/// Builds a follow-up request for the assistant from the flagged code and its
/// language.
///
/// A plain function pointer: builders cannot capture state, so the same
/// diagnostic always produces the same request text.
pub type PromptBuilder = fn(&str, Option<LanguageTag>) -> String;

/// The action offered alongside a suggestion.
#[derive(Clone, Serialize)]
pub struct Remediation {
    pub title: String,
    #[serde(skip)]
    prompt_builder: PromptBuilder,
}

impl Remediation {
    pub fn new(title: impl Into<String>, prompt_builder: PromptBuilder) -> Self {
        Self {
            title: title.into(),
            prompt_builder,
        }
    }

    /// Render the assistant request for `snippet`.
    pub fn prompt(&self, snippet: &str, language: Option<LanguageTag>) -> String {
        (self.prompt_builder)(snippet, language)
    }
}

impl fmt::Debug for Remediation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Remediation")
            .field("title", &self.title)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Suggestion / OpenFilePrompt
// ---------------------------------------------------------------------------

/// One diagnostic produced by an `on_code_change` hook.
#[derive(Clone, Debug, Serialize)]
pub struct Suggestion {
    pub message: String,
    pub range: TextRange,
    pub remediation: Remediation,
}

impl Suggestion {
    pub fn new(message: impl Into<String>, range: TextRange, remediation: Remediation) -> Self {
        Self {
            message: message.into(),
            range,
            remediation,
        }
    }

    /// The assistant request for fixing this diagnostic in `snippet`.
    pub fn remediation_prompt(&self, snippet: &str, language: Option<LanguageTag>) -> String {
        self.remediation.prompt(snippet, language)
    }
}

/// The single follow-up prompt surfaced when a file is opened.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenFilePrompt {
    pub prompt: String,
}

impl OpenFilePrompt {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
        }
    }

    /// Whether the prompt carries no text.
    pub fn is_blank(&self) -> bool {
        self.prompt.trim().is_empty()
    }
}

/// The fenced-code-block label for `language` (empty when unknown).
pub fn fence_label(language: Option<LanguageTag>) -> &'static str {
    language.map_or("", |lang| lang.as_str())
}
