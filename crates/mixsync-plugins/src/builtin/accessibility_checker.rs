use std::sync::LazyLock;

use async_trait::async_trait;
use mixsync_tree::LanguageTag;
use regex::Regex;

use super::{line_suggestion, ACCESSIBILITY_CHECKER};
use crate::error::PluginError;
use crate::plugin::{Capability, FileContext, Plugin, PluginDescriptor};
use crate::suggestion::{OpenFilePrompt, PromptBuilder, Suggestion};

static HEX_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#[0-9a-fA-F]{6}").expect("valid literal pattern"));

struct MarkupRule {
    matches: fn(&str) -> bool,
    message: &'static str,
    title: &'static str,
    prompt_builder: PromptBuilder,
}

fn image_without_alt(text: &str) -> bool {
    text.contains("<img") && !text.contains("alt=")
}

fn unlabeled_button(line: &str) -> bool {
    line.contains("<button")
        && !line.contains("aria-label")
        && !line.contains('>')
        && !line.contains("</button>")
}

fn unlabeled_input(text: &str) -> bool {
    text.contains("<input") && !text.contains("aria-label") && !text.contains("id=")
}

fn hardcoded_color(line: &str) -> bool {
    line.contains("color:") && line.contains('#') && !line.contains("/*") && HEX_COLOR.is_match(line)
}

fn clickable_div_without_role(line: &str) -> bool {
    line.contains("<div") && line.contains("onClick") && !line.contains("role=")
}

fn unordered_heading(line: &str) -> bool {
    line.contains("<h") && !line.contains("h1") && !line.contains("h2") && !line.contains("h3")
}

fn mouse_only_handler(line: &str) -> bool {
    line.contains("onClick") && !line.contains("tabIndex") && !line.contains("onKeyDown")
}

fn alt_prompt(snippet: &str, _: Option<LanguageTag>) -> String {
    format!(
        "Please add an appropriate alt attribute to this image for accessibility:\n\n{snippet}\n\n\
         Provide a descriptive alt text."
    )
}

fn button_prompt(snippet: &str, _: Option<LanguageTag>) -> String {
    format!(
        "Please add accessible text or aria-label to this button:\n\n{snippet}\n\n\
         Provide either button text or aria-label."
    )
}

fn input_prompt(snippet: &str, _: Option<LanguageTag>) -> String {
    format!(
        "Please add a proper label or aria-label to this input for accessibility:\n\n{snippet}\n\n\
         Provide either a label element or aria-label attribute."
    )
}

fn contrast_prompt(snippet: &str, _: Option<LanguageTag>) -> String {
    format!(
        "Please check if this color provides sufficient contrast for accessibility:\n\n\
         {snippet}\n\nConsider using a color with better contrast ratio."
    )
}

fn role_prompt(snippet: &str, _: Option<LanguageTag>) -> String {
    format!(
        "Please add a semantic role to this interactive div for accessibility:\n\n{snippet}\n\n\
         Consider using role=\"button\" or similar."
    )
}

fn heading_prompt(snippet: &str, _: Option<LanguageTag>) -> String {
    format!(
        "Please ensure proper heading hierarchy for accessibility:\n\n{snippet}\n\n\
         Use h1, h2, h3, etc. in logical order."
    )
}

fn keyboard_prompt(snippet: &str, _: Option<LanguageTag>) -> String {
    format!(
        "Please make this interactive element keyboard accessible:\n\n{snippet}\n\n\
         Add tabIndex and onKeyDown handlers."
    )
}

static MARKUP_RULES: [MarkupRule; 7] = [
    MarkupRule {
        matches: image_without_alt,
        message: "Image missing alt attribute - accessibility issue",
        title: "Add alt attribute to image",
        prompt_builder: alt_prompt,
    },
    MarkupRule {
        matches: unlabeled_button,
        message: "Button missing accessible text or aria-label",
        title: "Add accessible text to button",
        prompt_builder: button_prompt,
    },
    MarkupRule {
        matches: unlabeled_input,
        message: "Input missing label or aria-label - accessibility issue",
        title: "Add label to input",
        prompt_builder: input_prompt,
    },
    MarkupRule {
        matches: hardcoded_color,
        message: "Consider checking color contrast for accessibility",
        title: "Check color contrast",
        prompt_builder: contrast_prompt,
    },
    MarkupRule {
        matches: clickable_div_without_role,
        message: "Interactive div should have a semantic role",
        title: "Add semantic role to interactive div",
        prompt_builder: role_prompt,
    },
    MarkupRule {
        matches: unordered_heading,
        message: "Consider using proper heading hierarchy (h1, h2, h3, etc.)",
        title: "Fix heading hierarchy",
        prompt_builder: heading_prompt,
    },
    MarkupRule {
        matches: mouse_only_handler,
        message: "Interactive element should be keyboard accessible",
        title: "Add keyboard accessibility",
        prompt_builder: keyboard_prompt,
    },
];

/// Markup accessibility checks for JSX/HTML-ish sources.
pub struct AccessibilityChecker {
    descriptor: PluginDescriptor,
}

impl AccessibilityChecker {
    pub fn new() -> Self {
        Self {
            descriptor: PluginDescriptor::new(
                ACCESSIBILITY_CHECKER,
                "Checks markup for accessibility problems.",
            )
            .with_capability(Capability::OnCodeChange)
            .with_capability(Capability::OnOpenFile),
        }
    }
}

impl Default for AccessibilityChecker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Plugin for AccessibilityChecker {
    fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }

    async fn on_code_change(&self, context: &FileContext) -> Result<Vec<Suggestion>, PluginError> {
        let mut suggestions = Vec::new();
        for (index, line) in context.lines().enumerate() {
            for rule in MARKUP_RULES.iter().filter(|rule| (rule.matches)(line)) {
                suggestions.push(line_suggestion(
                    index,
                    line,
                    rule.message,
                    rule.title,
                    rule.prompt_builder,
                ));
            }
        }
        Ok(suggestions)
    }

    async fn on_open_file(&self, context: &FileContext) -> Result<Option<OpenFilePrompt>, PluginError> {
        let content = context.content.as_str();
        let issues: Vec<&str> = [
            (image_without_alt(content), "Images without alt attributes"),
            (
                content.contains("<button") && !content.contains("aria-label"),
                "Buttons without accessible text",
            ),
            (unlabeled_input(content), "Inputs without labels"),
        ]
        .into_iter()
        .filter_map(|(found, label)| found.then_some(label))
        .collect();

        if issues.is_empty() {
            return Ok(None);
        }
        Ok(Some(OpenFilePrompt::new(format!(
            "This file contains accessibility issues: {}. Please review and suggest improvements \
             to make the code more accessible to users with disabilities.",
            issues.join(", ")
        ))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn check(content: &str) -> Vec<String> {
        AccessibilityChecker::new()
            .on_code_change(&FileContext::new("p/App.jsx", content))
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.message)
            .collect()
    }

    #[tokio::test]
    async fn image_needs_alt() {
        assert_eq!(
            check(r#"<img src="logo.png" />"#).await,
            vec!["Image missing alt attribute - accessibility issue"]
        );
        assert!(check(r#"<img src="logo.png" alt="Logo" />"#).await.is_empty());
    }

    #[tokio::test]
    async fn clickable_div_needs_role_and_keyboard() {
        let found = check("<div onClick={open}>").await;
        assert_eq!(
            found,
            vec![
                "Interactive div should have a semantic role",
                "Interactive element should be keyboard accessible",
            ]
        );
        let accessible = check(r#"<div role="button" tabIndex={0} onClick={open}>"#).await;
        assert!(accessible.is_empty());
    }

    #[tokio::test]
    async fn colour_and_input_rules() {
        let found = check("  color: #1a2b3c;\n<input type=\"text\" />").await;
        assert_eq!(
            found,
            vec![
                "Consider checking color contrast for accessibility",
                "Input missing label or aria-label - accessibility issue",
            ]
        );
        assert!(check("  color: #fff; /* short */").await.is_empty());
    }

    #[tokio::test]
    async fn open_file_lists_document_level_issues() {
        let prompt = AccessibilityChecker::new()
            .on_open_file(&FileContext::new(
                "p/App.jsx",
                "<img src=\"a.png\">\n<button>Go</button>",
            ))
            .await
            .unwrap()
            .unwrap();
        assert!(prompt.prompt.contains(
            "accessibility issues: Images without alt attributes, Buttons without accessible text."
        ));
    }

    #[tokio::test]
    async fn open_file_on_accessible_markup() {
        let prompt = AccessibilityChecker::new()
            .on_open_file(&FileContext::new("p/App.jsx", "<p>Hello</p>"))
            .await
            .unwrap();
        assert!(prompt.is_none());
    }
}
