use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use tracing::{debug, warn};

use crate::config::{PipelineConfig, PluginsConfig};
use crate::error::PluginError;
use crate::plugin::{Capability, FileContext, Plugin};
use crate::registry::PluginRegistry;
use crate::suggestion::{OpenFilePrompt, Suggestion};

// ---------------------------------------------------------------------------
// HookOutcome
// ---------------------------------------------------------------------------

/// How a single hook call ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HookStatus {
    /// The hook returned normally (possibly with an empty result).
    Completed,
    /// The hook errored, panicked or timed out; its result was dropped.
    Failed { reason: String },
}

/// Recorded result of one hook call in a pipeline run.
#[derive(Clone, Debug)]
pub struct HookOutcome {
    /// Name of the plugin whose hook ran.
    pub plugin: String,
    /// Wall-clock time the hook took.
    pub elapsed: Duration,
    pub status: HookStatus,
}

impl HookOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self.status, HookStatus::Failed { .. })
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// The outcome of an `on_code_change` run.
#[derive(Clone, Debug, Default)]
pub struct CodeChangeReport {
    /// All suggestions, concatenated in registration order.
    pub suggestions: Vec<Suggestion>,
    /// Per-plugin outcomes in invocation order.
    pub outcomes: Vec<HookOutcome>,
}

impl CodeChangeReport {
    pub fn failures(&self) -> impl Iterator<Item = &HookOutcome> {
        self.outcomes.iter().filter(|o| o.is_failure())
    }
}

/// The outcome of an `on_open_file` run.
#[derive(Clone, Debug, Default)]
pub struct OpenFileReport {
    /// The first non-blank prompt, if any plugin produced one.
    pub prompt: Option<OpenFilePrompt>,
    /// Name of the plugin that produced [`Self::prompt`].
    pub source: Option<String>,
    /// Outcomes of the hooks that were invoked before the run stopped.
    pub outcomes: Vec<HookOutcome>,
}

// ---------------------------------------------------------------------------
// PluginPipeline
// ---------------------------------------------------------------------------

/// Runs registered plugins' hooks against a file.
///
/// Only plugins that are enabled in the supplied [`PluginsConfig`] and that
/// declare the hook's [`Capability`] are invoked. Every call is isolated: an
/// error, a panic or a timeout is logged and counts as an empty result for
/// that plugin alone.
#[derive(Debug)]
pub struct PluginPipeline {
    registry: PluginRegistry,
    config: PipelineConfig,
}

impl PluginPipeline {
    pub fn new(registry: PluginRegistry, config: PipelineConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Plugins that are enabled and implement `capability`, in registration
    /// order.
    pub fn eligible<'a>(
        &'a self,
        plugins: &'a PluginsConfig,
        capability: Capability,
    ) -> impl Iterator<Item = &'a Arc<dyn Plugin>> + 'a {
        self.registry
            .plugins()
            .iter()
            .filter(move |p| plugins.is_enabled(p.name()) && p.descriptor().supports(capability))
    }

    /// Invoke every eligible `on_code_change` hook and concatenate the
    /// results.
    pub async fn run_code_change(
        &self,
        context: &FileContext,
        plugins: &PluginsConfig,
    ) -> CodeChangeReport {
        let mut report = CodeChangeReport::default();

        for plugin in self.eligible(plugins, Capability::OnCodeChange) {
            let (result, elapsed) = self.guarded(plugin.name(), plugin.on_code_change(context)).await;
            let status = match result {
                Ok(suggestions) => {
                    debug!(
                        plugin = plugin.name(),
                        path = %context.path,
                        count = suggestions.len(),
                        "on_code_change completed"
                    );
                    report.suggestions.extend(suggestions);
                    HookStatus::Completed
                }
                Err(err) => Self::failed(plugin.name(), &context.path, err),
            };
            report.outcomes.push(HookOutcome {
                plugin: plugin.name().to_string(),
                elapsed,
                status,
            });
        }

        report
    }

    /// Invoke eligible `on_open_file` hooks until one yields a non-blank
    /// prompt.
    pub async fn run_open_file(&self, context: &FileContext, plugins: &PluginsConfig) -> OpenFileReport {
        let mut report = OpenFileReport::default();

        for plugin in self.eligible(plugins, Capability::OnOpenFile) {
            let (result, elapsed) = self.guarded(plugin.name(), plugin.on_open_file(context)).await;
            let (status, prompt) = match result {
                Ok(prompt) => (HookStatus::Completed, prompt.filter(|p| !p.is_blank())),
                Err(err) => (Self::failed(plugin.name(), &context.path, err), None),
            };
            report.outcomes.push(HookOutcome {
                plugin: plugin.name().to_string(),
                elapsed,
                status,
            });

            // Short-circuit: one prompt per file open.
            if let Some(prompt) = prompt {
                debug!(plugin = plugin.name(), path = %context.path, "open-file prompt produced");
                report.prompt = Some(prompt);
                report.source = Some(plugin.name().to_string());
                break;
            }
        }

        report
    }

    /// Poll a hook future under the time budget, converting panics and
    /// timeouts into [`PluginError`]s.
    async fn guarded<T, F>(&self, plugin: &str, hook: F) -> (Result<T, PluginError>, Duration)
    where
        F: Future<Output = Result<T, PluginError>>,
    {
        let started = Instant::now();
        let budget = self.config.hook_timeout;
        let result = match tokio::time::timeout(budget, AssertUnwindSafe(hook).catch_unwind()).await {
            Ok(Ok(result)) => result,
            Ok(Err(_panic)) => Err(PluginError::Panicked {
                plugin: plugin.to_string(),
            }),
            Err(_elapsed) => Err(PluginError::TimedOut {
                plugin: plugin.to_string(),
                after: budget,
            }),
        };
        (result, started.elapsed())
    }

    fn failed(plugin: &str, path: &str, err: PluginError) -> HookStatus {
        warn!(plugin, path, error = %err, "plugin hook failed; contributing no result");
        HookStatus::Failed {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use mixsync_tree::LanguageTag;

    use super::*;
    use crate::builtin;
    use crate::plugin::PluginDescriptor;
    use crate::suggestion::{Remediation, TextRange};

    fn echo(snippet: &str, _: Option<LanguageTag>) -> String {
        snippet.to_string()
    }

    /// Test plugin with scripted behavior.
    struct Scripted {
        descriptor: PluginDescriptor,
        behavior: Behavior,
    }

    #[derive(Clone)]
    enum Behavior {
        Suggest(&'static str),
        Prompt(&'static str),
        Fail,
        Panic,
        Hang,
    }

    impl Scripted {
        fn new(name: &str, behavior: Behavior) -> Arc<dyn Plugin> {
            let descriptor = PluginDescriptor::new(name, "scripted")
                .with_capability(Capability::OnCodeChange)
                .with_capability(Capability::OnOpenFile);
            Arc::new(Self {
                descriptor,
                behavior,
            })
        }
    }

    #[async_trait]
    impl Plugin for Scripted {
        fn descriptor(&self) -> &PluginDescriptor {
            &self.descriptor
        }

        async fn on_code_change(&self, _context: &FileContext) -> Result<Vec<Suggestion>, PluginError> {
            match self.behavior {
                Behavior::Suggest(message) => Ok(vec![Suggestion::new(
                    message,
                    TextRange::new(1, 1, 1, 2),
                    Remediation::new("Fix", echo),
                )]),
                Behavior::Prompt(_) => Ok(Vec::new()),
                Behavior::Fail => Err(PluginError::hook(self.name(), "boom")),
                Behavior::Panic => panic!("scripted panic"),
                Behavior::Hang => {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok(Vec::new())
                }
            }
        }

        async fn on_open_file(
            &self,
            _context: &FileContext,
        ) -> Result<Option<OpenFilePrompt>, PluginError> {
            match self.behavior {
                Behavior::Prompt(text) => Ok(Some(OpenFilePrompt::new(text))),
                Behavior::Fail => Err(PluginError::hook(self.name(), "boom")),
                Behavior::Panic => panic!("scripted panic"),
                _ => Ok(None),
            }
        }
    }

    fn pipeline(plugins: Vec<Arc<dyn Plugin>>) -> PluginPipeline {
        let mut registry = PluginRegistry::new();
        for plugin in plugins {
            registry.register(plugin).unwrap();
        }
        PluginPipeline::new(
            registry,
            PipelineConfig {
                hook_timeout: Duration::from_millis(100),
            },
        )
    }

    fn all_enabled(names: &[&str]) -> PluginsConfig {
        names.iter().map(|n| (*n, true)).collect()
    }

    fn messages(report: &CodeChangeReport) -> Vec<&str> {
        report.suggestions.iter().map(|s| s.message.as_str()).collect()
    }

    fn ctx() -> FileContext {
        FileContext::new("p/a.js", "x")
    }

    // -----------------------------------------------------------------------
    // on_code_change
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn concatenates_in_registration_order() {
        let p = pipeline(vec![
            Scripted::new("second", Behavior::Suggest("from second")),
            Scripted::new("first", Behavior::Suggest("from first")),
        ]);
        let report = p.run_code_change(&ctx(), &all_enabled(&["first", "second"])).await;
        assert_eq!(messages(&report), vec!["from second", "from first"]);
        assert_eq!(report.failures().count(), 0);
    }

    #[tokio::test]
    async fn failing_plugin_does_not_suppress_others() {
        let p = pipeline(vec![
            Scripted::new("bad", Behavior::Fail),
            Scripted::new("good", Behavior::Suggest("ok")),
        ]);
        let report = p.run_code_change(&ctx(), &all_enabled(&["bad", "good"])).await;
        assert_eq!(messages(&report), vec!["ok"]);
        assert_eq!(report.outcomes.len(), 2);
        assert!(report.outcomes[0].is_failure());
        assert_eq!(report.outcomes[1].status, HookStatus::Completed);
    }

    #[tokio::test]
    async fn panicking_plugin_is_isolated() {
        let p = pipeline(vec![
            Scripted::new("a", Behavior::Suggest("a")),
            Scripted::new("panics", Behavior::Panic),
            Scripted::new("c", Behavior::Suggest("c")),
        ]);
        let report = p.run_code_change(&ctx(), &all_enabled(&["a", "panics", "c"])).await;
        assert_eq!(messages(&report), vec!["a", "c"]);
        let failed: Vec<_> = report.failures().map(|o| o.plugin.as_str()).collect();
        assert_eq!(failed, vec!["panics"]);
    }

    #[tokio::test]
    async fn hanging_plugin_times_out() {
        let p = pipeline(vec![
            Scripted::new("slow", Behavior::Hang),
            Scripted::new("fast", Behavior::Suggest("fast")),
        ]);
        let report = p.run_code_change(&ctx(), &all_enabled(&["slow", "fast"])).await;
        assert_eq!(messages(&report), vec!["fast"]);
        match &report.outcomes[0].status {
            HookStatus::Failed { reason } => assert!(reason.contains("timed out")),
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn disabled_and_unknown_plugins_are_skipped() {
        let p = pipeline(vec![
            Scripted::new("on", Behavior::Suggest("on")),
            Scripted::new("off", Behavior::Suggest("off")),
            Scripted::new("unlisted", Behavior::Suggest("unlisted")),
        ]);
        let mut config = all_enabled(&["on", "ghost"]);
        config.set_enabled("off", false);
        let report = p.run_code_change(&ctx(), &config).await;
        assert_eq!(messages(&report), vec!["on"]);
        assert_eq!(report.outcomes.len(), 1);
    }

    #[tokio::test]
    async fn hooks_run_only_for_declared_capabilities() {
        let mut registry = PluginRegistry::new();
        registry
            .register(Arc::new(Scripted {
                descriptor: PluginDescriptor::new("open-only", "")
                    .with_capability(Capability::OnOpenFile),
                behavior: Behavior::Suggest("should not appear"),
            }))
            .unwrap();
        let p = PluginPipeline::new(registry, PipelineConfig::default());
        let report = p.run_code_change(&ctx(), &all_enabled(&["open-only"])).await;
        assert!(report.suggestions.is_empty());
        assert!(report.outcomes.is_empty());
    }

    // -----------------------------------------------------------------------
    // on_open_file
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn open_file_short_circuits_on_first_prompt() {
        let p = pipeline(vec![
            Scripted::new("silent", Behavior::Suggest("x")),
            Scripted::new("blank", Behavior::Prompt("   ")),
            Scripted::new("first", Behavior::Prompt("first prompt")),
            Scripted::new("second", Behavior::Prompt("second prompt")),
        ]);
        let report = p
            .run_open_file(&ctx(), &all_enabled(&["silent", "blank", "first", "second"]))
            .await;
        assert_eq!(report.prompt, Some(OpenFilePrompt::new("first prompt")));
        assert_eq!(report.source.as_deref(), Some("first"));
        assert_eq!(report.outcomes.len(), 3);
    }

    #[tokio::test]
    async fn open_file_skips_failures() {
        let p = pipeline(vec![
            Scripted::new("bad", Behavior::Fail),
            Scripted::new("panics", Behavior::Panic),
            Scripted::new("good", Behavior::Prompt("good prompt")),
        ]);
        let report = p
            .run_open_file(&ctx(), &all_enabled(&["bad", "panics", "good"]))
            .await;
        assert_eq!(report.prompt, Some(OpenFilePrompt::new("good prompt")));
        assert_eq!(report.outcomes.iter().filter(|o| o.is_failure()).count(), 2);
    }

    #[tokio::test]
    async fn open_file_without_prompts() {
        let p = pipeline(vec![Scripted::new("silent", Behavior::Suggest("x"))]);
        let report = p.run_open_file(&ctx(), &all_enabled(&["silent"])).await;
        assert!(report.prompt.is_none());
        assert!(report.source.is_none());
    }

    #[tokio::test]
    async fn disabling_excludes_plugin_from_both_hooks() {
        let p = pipeline(vec![
            Scripted::new("muted", Behavior::Prompt("muted prompt")),
            Scripted::new("other", Behavior::Suggest("other")),
        ]);
        let mut config = all_enabled(&["muted", "other"]);
        config.set_enabled("muted", false);
        assert!(p.run_open_file(&ctx(), &config).await.prompt.is_none());
        let report = p.run_code_change(&ctx(), &config).await;
        assert!(report.outcomes.iter().all(|o| o.plugin != "muted"));
        assert_eq!(p.registry().len(), 2);
    }

    // -----------------------------------------------------------------------
    // Built-ins through the pipeline
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn smart_linter_flags_var_token() {
        let p = PluginPipeline::new(PluginRegistry::with_builtin(), PipelineConfig::default());
        let config = all_enabled(&[builtin::SMART_LINTER]);
        let report = p
            .run_code_change(&FileContext::new("p/index.js", "var x = 1;"), &config)
            .await;
        assert_eq!(report.suggestions.len(), 1);
        let s = &report.suggestions[0];
        assert_eq!(s.range, TextRange::new(1, 1, 1, 4));
        assert!(s.message.contains("var"));
        assert!(!s.remediation.title.is_empty());
    }
}
