use std::sync::LazyLock;

use async_trait::async_trait;
use mixsync_tree::LanguageTag;
use regex::Regex;

use super::{line_number, line_suggestion, CODE_OPTIMIZER};
use crate::error::PluginError;
use crate::plugin::{Capability, FileContext, Plugin, PluginDescriptor};
use crate::suggestion::{OpenFilePrompt, Remediation, Suggestion, TextRange};

/// Body length, in lines past the opening line, above which a function is
/// reported as too long.
const LONG_FUNCTION_LINES: usize = 20;

static DECLARATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:const|let|var)\s+(\w+)").expect("valid literal pattern"));

fn nested_loop_prompt(snippet: &str, _: Option<LanguageTag>) -> String {
    format!(
        "Please optimize this nested loop code for better performance and readability. \
         Consider using array methods like map, filter, or reduce:\n\n{snippet}\n\n\
         Provide the optimized version."
    )
}

fn unused_variable_prompt(snippet: &str, _: Option<LanguageTag>) -> String {
    format!("Please remove the unused variable and clean up the code:\n\n{snippet}")
}

fn long_function_prompt(snippet: &str, _: Option<LanguageTag>) -> String {
    format!(
        "Please refactor this long function into smaller, more focused functions:\n\n\
         {snippet}\n\nBreak it down into logical parts with clear responsibilities."
    )
}

fn opens_loop(line: &str) -> bool {
    line.contains("for") && line.contains('{')
}

fn is_control_flow(line: &str) -> bool {
    ["if", "for", "while", "switch"]
        .iter()
        .any(|keyword| line.contains(keyword))
}

/// Index of the line that closes the block opened on `start`, by brace
/// balance. Returns `start` when the block never closes.
fn block_end(lines: &[&str], start: usize) -> usize {
    let mut depth: i64 = 0;
    for (j, line) in lines.iter().enumerate().skip(start) {
        depth += line.matches('{').count() as i64;
        depth -= line.matches('}').count() as i64;
        if depth == 0 && j > start {
            return j;
        }
    }
    start
}

/// Performance and readability heuristics: nested loops, unused
/// declarations, over-long functions and, on open, control-flow density.
pub struct CodeOptimizer {
    descriptor: PluginDescriptor,
}

impl CodeOptimizer {
    pub fn new() -> Self {
        Self {
            descriptor: PluginDescriptor::new(
                CODE_OPTIMIZER,
                "Suggests performance and readability improvements.",
            )
            .with_capability(Capability::OnCodeChange)
            .with_capability(Capability::OnOpenFile),
        }
    }
}

impl Default for CodeOptimizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Plugin for CodeOptimizer {
    fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }

    async fn on_code_change(&self, context: &FileContext) -> Result<Vec<Suggestion>, PluginError> {
        let content = context.content.as_str();
        let lines: Vec<&str> = context.lines().collect();
        let mut suggestions = Vec::new();

        for (i, line) in lines.iter().copied().enumerate() {
            if opens_loop(line) && lines[i + 1..].iter().any(|l| opens_loop(l)) {
                suggestions.push(line_suggestion(
                    i,
                    line,
                    "Consider using array methods like map/filter/reduce instead of nested loops",
                    "Optimize nested loops",
                    nested_loop_prompt,
                ));
            }

            if line.contains("const ") || line.contains("let ") || line.contains("var ") {
                if let Some(name) = DECLARATION.captures(line).and_then(|c| c.get(1)) {
                    // Anything after the first occurrence of this line counts as a use.
                    let rest = content
                        .find(line)
                        .map_or("", |pos| &content[pos + line.len()..]);
                    if !rest.contains(name.as_str()) {
                        suggestions.push(line_suggestion(
                            i,
                            line,
                            format!("Unused variable '{}' detected", name.as_str()),
                            "Remove unused variable",
                            unused_variable_prompt,
                        ));
                    }
                }
            }

            if line.contains("function ") || line.contains("=>") {
                let end = block_end(&lines, i);
                if end - i > LONG_FUNCTION_LINES {
                    suggestions.push(Suggestion::new(
                        "Function is too long. Consider breaking it into smaller functions",
                        TextRange::new(
                            line_number(i),
                            1,
                            line_number(end),
                            TextRange::whole_line(1, lines[end]).end_col,
                        ),
                        Remediation::new("Refactor long function", long_function_prompt),
                    ));
                }
            }
        }

        Ok(suggestions)
    }

    async fn on_open_file(&self, context: &FileContext) -> Result<Option<OpenFilePrompt>, PluginError> {
        if context.content.is_empty() {
            return Ok(None);
        }
        let total = context.lines().count();
        let complexity = context.lines().filter(|l| is_control_flow(l)).count();

        // More than 30% of lines branch or loop.
        if complexity * 10 > total * 3 {
            return Ok(Some(OpenFilePrompt::new(format!(
                "This file has high cyclomatic complexity ({complexity} control flow statements \
                 in {total} lines). Please analyze the code and suggest ways to reduce complexity \
                 by simplifying conditional logic, extracting methods, or using design patterns."
            ))));
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn optimize(content: &str) -> Vec<Suggestion> {
        CodeOptimizer::new()
            .on_code_change(&FileContext::new("p/a.js", content))
            .await
            .unwrap()
    }

    fn with_message<'a>(found: &'a [Suggestion], needle: &str) -> Vec<&'a Suggestion> {
        found.iter().filter(|s| s.message.contains(needle)).collect()
    }

    #[tokio::test]
    async fn flags_outer_loop_of_nested_pair() {
        let found = optimize(
            "for (const row of rows) {\n  for (const cell of row) {\n    use(cell);\n  }\n}",
        )
        .await;
        let nested = with_message(&found, "nested loops");
        assert_eq!(nested.len(), 1);
        assert_eq!(nested[0].range.start_line, 1);
    }

    #[tokio::test]
    async fn flags_unused_declarations_only() {
        let found = optimize("const total = 1;\nreport(total);\nconst orphan = 2;\nreturn;").await;
        let unused = with_message(&found, "Unused variable");
        assert_eq!(unused.len(), 1);
        assert_eq!(unused[0].message, "Unused variable 'orphan' detected");
        assert_eq!(unused[0].range.start_line, 3);
    }

    #[tokio::test]
    async fn flags_long_functions_across_their_span() {
        let mut content = String::from("function big() {\n");
        for _ in 0..21 {
            content.push_str("  step();\n");
        }
        content.push('}');
        let found = optimize(&content).await;
        let long = with_message(&found, "too long");
        assert_eq!(long.len(), 1);
        assert_eq!(long[0].range, TextRange::new(1, 1, 23, 2));

        let short = optimize("const f = () => {\n  step(f);\n};").await;
        assert!(with_message(&short, "too long").is_empty());
    }

    #[tokio::test]
    async fn open_file_reports_dense_control_flow() {
        let optimizer = CodeOptimizer::new();
        let dense = "if (a) {\n  while (b) {\n    step();\n  }\n}";
        let prompt = optimizer
            .on_open_file(&FileContext::new("p/a.js", dense))
            .await
            .unwrap()
            .unwrap();
        assert!(prompt.prompt.contains("(2 control flow statements in 5 lines)"));

        let sparse = "step();\nstep();\nstep();\nif (x) step();";
        assert!(optimizer
            .on_open_file(&FileContext::new("p/a.js", sparse))
            .await
            .unwrap()
            .is_none());
    }
}
