use std::sync::LazyLock;

use async_trait::async_trait;
use mixsync_tree::LanguageTag;
use regex::Regex;

use super::{line_number, SMART_LINTER};
use crate::error::PluginError;
use crate::plugin::{Capability, FileContext, Plugin, PluginDescriptor};
use crate::suggestion::{fence_label, PromptBuilder, Remediation, Suggestion, TextRange};

static VAR_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bvar\b").expect("valid literal pattern"));
static EVAL_CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"eval\s*\(").expect("valid literal pattern"));

struct Rule {
    pattern: &'static LazyLock<Regex>,
    message: &'static str,
    title: &'static str,
    prompt_builder: PromptBuilder,
}

static RULES: [Rule; 2] = [
    Rule {
        pattern: &VAR_KEYWORD,
        message: "'var' is deprecated. Use 'let' or 'const' instead.",
        title: "✨ Fix with MixCode AI",
        prompt_builder: var_prompt,
    },
    Rule {
        pattern: &EVAL_CALL,
        message: "Use of 'eval()' is discouraged due to security risks.",
        title: "✨ Explain risk with AI",
        prompt_builder: eval_prompt,
    },
];

fn var_prompt(snippet: &str, language: Option<LanguageTag>) -> String {
    format!(
        "The linter found an issue: \"'var' is deprecated\". Please fix the following code \
         snippet by replacing 'var' with 'let' or 'const' appropriately:\n```{}\n{snippet}\n```",
        fence_label(language)
    )
}

fn eval_prompt(snippet: &str, language: Option<LanguageTag>) -> String {
    format!(
        "The linter found a potential security risk: \"Use of 'eval()' is discouraged\". \
         Please explain the security risks of using 'eval()' in the context of the following \
         code snippet:\n```{}\n{snippet}\n```",
        fence_label(language)
    )
}

/// Token-level lint for JavaScript and TypeScript: flags `var` declarations
/// and `eval(` calls.
pub struct SmartLinter {
    descriptor: PluginDescriptor,
}

impl SmartLinter {
    pub fn new() -> Self {
        Self {
            descriptor: PluginDescriptor::new(
                SMART_LINTER,
                "Flags deprecated and risky JavaScript constructs with assistant fixes.",
            )
            .with_capability(Capability::OnCodeChange),
        }
    }
}

impl Default for SmartLinter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Plugin for SmartLinter {
    fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }

    async fn on_code_change(&self, context: &FileContext) -> Result<Vec<Suggestion>, PluginError> {
        if !context.language.is_some_and(|l| l.is_script()) {
            return Ok(Vec::new());
        }

        let mut suggestions = Vec::new();
        // Rule-major order: all `var` hits, then all `eval(` hits.
        for rule in &RULES {
            for (index, line) in context.lines().enumerate() {
                for hit in rule.pattern.find_iter(line) {
                    suggestions.push(Suggestion::new(
                        rule.message,
                        TextRange::from_byte_span(line_number(index), line, hit.start(), hit.end()),
                        Remediation::new(rule.title, rule.prompt_builder),
                    ));
                }
            }
        }
        Ok(suggestions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn lint(path: &str, content: &str) -> Vec<Suggestion> {
        SmartLinter::new()
            .on_code_change(&FileContext::new(path, content))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn flags_var_at_exact_columns() {
        let found = lint("p/a.js", "var x = 1;").await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].range, TextRange::new(1, 1, 1, 4));
        assert_eq!(found[0].remediation.title, "✨ Fix with MixCode AI");
    }

    #[tokio::test]
    async fn var_must_be_a_whole_word() {
        assert!(lint("p/a.ts", "let variable = vary;").await.is_empty());
        let found = lint("p/a.ts", "let a;\n  var b; var c;").await;
        let ranges: Vec<_> = found.iter().map(|s| s.range).collect();
        assert_eq!(ranges, vec![TextRange::new(2, 3, 2, 6), TextRange::new(2, 10, 2, 13)]);
    }

    #[tokio::test]
    async fn flags_eval_calls_after_var() {
        let found = lint("p/a.js", "eval (code);\nvar y;").await;
        assert_eq!(found.len(), 2);
        assert!(found[0].message.contains("'var'"));
        assert_eq!(found[0].range.start_line, 2);
        assert!(found[1].message.contains("eval"));
        assert_eq!(found[1].range, TextRange::new(1, 1, 1, 7));
    }

    #[tokio::test]
    async fn ignores_non_script_languages() {
        assert!(lint("p/a.py", "var = eval(x)").await.is_empty());
        assert!(lint("p/README", "var x").await.is_empty());
    }

    #[tokio::test]
    async fn prompt_embeds_snippet_and_language() {
        let found = lint("p/a.ts", "var x = 1;").await;
        let prompt = found[0].remediation_prompt("var x = 1;", Some(LanguageTag::TypeScript));
        assert!(prompt.contains("```typescript\nvar x = 1;\n```"));
    }
}
