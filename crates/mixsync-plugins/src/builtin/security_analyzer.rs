use async_trait::async_trait;
use mixsync_tree::LanguageTag;

use super::{line_suggestion, SECURITY_ANALYZER};
use crate::error::PluginError;
use crate::plugin::{Capability, FileContext, Plugin, PluginDescriptor};
use crate::suggestion::{OpenFilePrompt, PromptBuilder, Suggestion};

struct LineRule {
    matches: fn(&str) -> bool,
    message: &'static str,
    title: &'static str,
    prompt_builder: PromptBuilder,
}

fn sql_injection(line: &str) -> bool {
    line.contains("query") && line.contains("${") && !line.contains("prepared")
}

fn html_sink(text: &str) -> bool {
    text.contains("innerHTML") || text.contains("outerHTML")
}

fn hardcoded_password(text: &str) -> bool {
    text.contains("password") && text.contains('=') && !text.contains("process.env")
}

fn eval_call(text: &str) -> bool {
    text.contains("eval(")
}

fn logs_secret(line: &str) -> bool {
    line.contains("console.log")
        && ["password", "token", "secret", "key"]
            .iter()
            .any(|word| line.contains(word))
}

fn wildcard_cors(line: &str) -> bool {
    line.contains("Access-Control-Allow-Origin") && line.contains('*')
}

fn sql_injection_prompt(snippet: &str, _: Option<LanguageTag>) -> String {
    format!(
        "Please fix this potential SQL injection vulnerability by using parameterized queries \
         or prepared statements:\n\n{snippet}\n\nProvide a secure version."
    )
}

fn xss_prompt(snippet: &str, _: Option<LanguageTag>) -> String {
    format!(
        "Please fix this potential XSS vulnerability by using textContent or proper \
         sanitization:\n\n{snippet}\n\nProvide a secure version."
    )
}

fn password_prompt(snippet: &str, _: Option<LanguageTag>) -> String {
    format!(
        "Please replace this hardcoded password with an environment variable:\n\n{snippet}\n\n\
         Use process.env or similar secure configuration."
    )
}

fn eval_prompt(snippet: &str, _: Option<LanguageTag>) -> String {
    format!(
        "Please replace this eval() usage with a safer alternative:\n\n{snippet}\n\n\
         Consider using JSON.parse() or other safer parsing methods."
    )
}

fn logging_prompt(snippet: &str, _: Option<LanguageTag>) -> String {
    format!(
        "Please remove or mask sensitive information from this console.log:\n\n{snippet}\n\n\
         Use [REDACTED] or similar masking."
    )
}

fn cors_prompt(snippet: &str, _: Option<LanguageTag>) -> String {
    format!(
        "Please fix this wildcard CORS policy to be more restrictive:\n\n{snippet}\n\n\
         Specify allowed origins explicitly."
    )
}

static LINE_RULES: [LineRule; 6] = [
    LineRule {
        matches: sql_injection,
        message: "Potential SQL injection vulnerability detected",
        title: "Fix SQL injection",
        prompt_builder: sql_injection_prompt,
    },
    LineRule {
        matches: html_sink,
        message: "Potential XSS vulnerability - avoid innerHTML/outerHTML with user input",
        title: "Fix XSS vulnerability",
        prompt_builder: xss_prompt,
    },
    LineRule {
        matches: hardcoded_password,
        message: "Hardcoded password detected - use environment variables",
        title: "Use environment variables",
        prompt_builder: password_prompt,
    },
    LineRule {
        matches: eval_call,
        message: "eval() usage detected - security risk",
        title: "Replace eval() with safer alternative",
        prompt_builder: eval_prompt,
    },
    LineRule {
        matches: logs_secret,
        message: "Sensitive data being logged - remove or mask sensitive information",
        title: "Remove sensitive data from logs",
        prompt_builder: logging_prompt,
    },
    LineRule {
        matches: wildcard_cors,
        message: "Wildcard CORS policy detected - security risk",
        title: "Fix CORS policy",
        prompt_builder: cors_prompt,
    },
];

/// Flags common web security smells line by line (injection, XSS sinks,
/// hardcoded credentials, `eval`, secret logging, wildcard CORS).
pub struct SecurityAnalyzer {
    descriptor: PluginDescriptor,
}

impl SecurityAnalyzer {
    pub fn new() -> Self {
        Self {
            descriptor: PluginDescriptor::new(
                SECURITY_ANALYZER,
                "Detects common security vulnerabilities in code.",
            )
            .with_capability(Capability::OnCodeChange)
            .with_capability(Capability::OnOpenFile),
        }
    }
}

impl Default for SecurityAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Plugin for SecurityAnalyzer {
    fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }

    async fn on_code_change(&self, context: &FileContext) -> Result<Vec<Suggestion>, PluginError> {
        let mut suggestions = Vec::new();
        for (index, line) in context.lines().enumerate() {
            for rule in LINE_RULES.iter().filter(|rule| (rule.matches)(line)) {
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
            (eval_call(content), "eval() usage detected"),
            (html_sink(content), "innerHTML/outerHTML usage detected"),
            (hardcoded_password(content), "Hardcoded credentials detected"),
        ]
        .into_iter()
        .filter_map(|(found, label)| found.then_some(label))
        .collect();

        if issues.is_empty() {
            return Ok(None);
        }
        Ok(Some(OpenFilePrompt::new(format!(
            "This file contains potential security vulnerabilities: {}. Please review the code \
             and suggest security improvements to make it more secure.",
            issues.join(", ")
        ))))
    }
}
