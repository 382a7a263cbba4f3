//! Analyzers shipped with MixSync.
//!
//! Each is a line-oriented heuristic: cheap, synchronous, and free of I/O.
//! They are registered in the order returned by [`all`].

use std::sync::Arc;

use crate::plugin::Plugin;
use crate::suggestion::{PromptBuilder, Remediation, Suggestion, TextRange};

pub mod accessibility_checker;
pub mod code_diagrammer;
pub mod code_optimizer;
pub mod security_analyzer;
pub mod smart_linter;

pub use accessibility_checker::AccessibilityChecker;
pub use code_diagrammer::CodeDiagrammer;
pub use code_optimizer::CodeOptimizer;
pub use security_analyzer::SecurityAnalyzer;
pub use smart_linter::SmartLinter;

pub const SMART_LINTER: &str = "Smart Linter";
pub const CODE_DIAGRAMMER: &str = "Code Diagrammer";
pub const CODE_OPTIMIZER: &str = "Code Optimizer";
pub const SECURITY_ANALYZER: &str = "Security Analyzer";
pub const ACCESSIBILITY_CHECKER: &str = "Accessibility Checker";

/// Every built-in analyzer, in registration order.
pub fn all() -> Vec<Arc<dyn Plugin>> {
    vec![
        Arc::new(SmartLinter::new()),
        Arc::new(CodeDiagrammer::new()),
        Arc::new(CodeOptimizer::new()),
        Arc::new(SecurityAnalyzer::new()),
        Arc::new(AccessibilityChecker::new()),
    ]
}

/// A suggestion spanning the whole of line `index` (0-based).
pub(crate) fn line_suggestion(
    index: usize,
    line: &str,
    message: impl Into<String>,
    title: &str,
    prompt_builder: PromptBuilder,
) -> Suggestion {
    Suggestion::new(
        message,
        TextRange::whole_line(line_number(index), line),
        Remediation::new(title, prompt_builder),
    )
}

/// 1-based line number for a 0-based index.
pub(crate) fn line_number(index: usize) -> u32 {
    u32::try_from(index).map_or(u32::MAX, |n| n.saturating_add(1))
}
