use std::sync::Arc;

use mixsync_crypto::{is_protected, ContentCipher, Keyring};
use mixsync_plugins::{
    CodeChangeReport, FileContext, OpenFileReport, PassToken, PassTracker, PluginPipeline,
    PluginRegistry, PluginsConfig, Suggestion,
};
use mixsync_tree::{ImportEntry, LanguageTag, NodePatch, ProjectTree};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::ProjectConfig;
use crate::error::{ProjectError, ProjectResult};
use crate::metadata::{self, ChatMessage, Metadata, MetadataDocument, Role, SessionMeta};
use crate::profile::Profile;
use crate::source::ImportSource;
use crate::state::{ProjectPhase, ProjectState};

/// Result of a token-guarded diagnostics pass.
#[derive(Debug)]
pub struct DiagnosticsPass {
    pub token: PassToken,
    /// `false` when a newer pass for the same file was issued before this
    /// one finished; its suggestions were then discarded.
    pub applied: bool,
    pub report: CodeChangeReport,
}

/// The project state coordinator.
///
/// Owns the current [`ProjectTree`] snapshot and the state derived from the
/// metadata documents, and is the only way to mutate either. Protected
/// content is sealed on the way in and opened on the way out, so the tree
/// always holds ciphertext under `.mixsync/` and callers only ever see
/// plaintext.
///
/// Every write is applied to the latest committed snapshot under the state
/// lock. Writes to different paths interleave safely; writes to the same
/// path are last-write-wins.
pub struct Project {
    cipher: Arc<ContentCipher>,
    pipeline: Arc<PluginPipeline>,
    config: ProjectConfig,
    state: RwLock<ProjectState>,
    passes: PassTracker,
}

impl Project {
    pub fn new(cipher: Arc<ContentCipher>, pipeline: Arc<PluginPipeline>, config: ProjectConfig) -> Self {
        Self {
            cipher,
            pipeline,
            config,
            state: RwLock::new(ProjectState::default()),
            passes: PassTracker::new(),
        }
    }

    /// A coordinator with the built-in analyzers registered.
    pub fn with_builtin(keyring: Keyring, config: ProjectConfig) -> Self {
        let cipher = ContentCipher::with_config(keyring, config.cipher.clone());
        let pipeline = PluginPipeline::new(PluginRegistry::with_builtin(), config.pipeline.clone());
        Self::new(Arc::new(cipher), Arc::new(pipeline), config)
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    pub fn cipher(&self) -> &ContentCipher {
        &self.cipher
    }

    pub fn pipeline(&self) -> &PluginPipeline {
        &self.pipeline
    }

    // ---- Lifecycle ----

    pub async fn phase(&self) -> ProjectPhase {
        self.state.read().await.phase
    }

    /// Enumerate `source`, build the tree and load the metadata documents.
    ///
    /// The project is `Loading` while the source is being enumerated.
    pub async fn open<S>(&self, source: &S) -> ProjectResult<()>
    where
        S: ImportSource + ?Sized,
    {
        let generation = {
            let mut state = self.state.write().await;
            if state.phase != ProjectPhase::Closed {
                return Err(ProjectError::AlreadyOpen);
            }
            state.phase = ProjectPhase::Loading;
            state.generation += 1;
            state.generation
        };
        debug!(generation, "loading project");

        let loaded = self.load(source).await;

        let mut state = self.state.write().await;
        if state.generation != generation || state.phase != ProjectPhase::Loading {
            warn!(generation, "project was closed while loading; discarding");
            return Err(ProjectError::NotReady(state.phase));
        }
        match loaded {
            Ok((tree, metadata)) => {
                info!(
                    root = tree.name(),
                    files = tree.files().count(),
                    active_file = ?metadata.session.active_file,
                    "project ready"
                );
                state.install(tree, metadata);
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "project failed to load");
                state.reset();
                Err(err)
            }
        }
    }

    async fn load<S>(&self, source: &S) -> ProjectResult<(ProjectTree, Metadata)>
    where
        S: ImportSource + ?Sized,
    {
        let entries = source.enumerate().await?;
        let tree = ProjectTree::from_entries(entries).ok_or(ProjectError::EmptyProject)?;
        let metadata = Metadata::load(&tree, &self.cipher, &self.config.default_plugins);
        Ok((tree, metadata))
    }

    /// Discard the tree and reset all derived state.
    pub async fn close(&self) {
        let mut state = self.state.write().await;
        state.reset();
        self.passes.reset();
        info!("project closed");
    }

    // ---- Reads ----

    /// The current snapshot. Cheap: the tree is shared, not copied.
    pub async fn tree(&self) -> ProjectResult<ProjectTree> {
        Ok(self.state.read().await.ready_tree()?.clone())
    }

    /// Plaintext content of the file at `path`.
    ///
    /// `Ok(None)` when the path does not exist or the file's content has not
    /// been loaded.
    pub async fn read(&self, path: &str) -> ProjectResult<Option<String>> {
        let stored = {
            let state = self.state.read().await;
            match state.ready_tree()?.find(path) {
                None => return Ok(None),
                Some(node) if node.is_folder() => return Err(ProjectError::NotAFile(path.into())),
                Some(node) => node.content().map(str::to_owned),
            }
        };
        match stored {
            Some(stored) if is_protected(path) => Ok(Some(self.cipher.decrypt_with_policy(&stored)?)),
            other => Ok(other),
        }
    }

    pub async fn active_file(&self) -> Option<String> {
        self.state.read().await.active_file.clone()
    }

    pub async fn history(&self) -> Vec<ChatMessage> {
        self.state.read().await.history.clone()
    }

    pub async fn plugins_config(&self) -> PluginsConfig {
        self.state.read().await.plugins.clone()
    }

    pub async fn ast_map(&self) -> serde_json::Value {
        self.state.read().await.ast_map.clone()
    }

    /// Suggestions from the latest applied diagnostics pass for `path`.
    pub async fn diagnostics(&self, path: &str) -> Vec<Suggestion> {
        self.state
            .read()
            .await
            .diagnostics
            .get(path)
            .cloned()
            .unwrap_or_default()
    }

    // ---- Writes ----

    /// Store `content` at `path`, creating the file and any missing ancestor
    /// folders. Protected paths are sealed first.
    pub async fn write(&self, path: &str, content: &str) -> ProjectResult<()> {
        let stored = self.seal(path, content)?;
        let mut state = self.state.write().await;
        let next = apply_write(state.ready_tree()?, path, stored)?;
        state.tree = Some(next);
        refresh_if_metadata(&mut state, path, content);
        debug!(path, protected = is_protected(path), "write committed");
        Ok(())
    }

    /// Write a batch of generated files as one snapshot.
    ///
    /// Paths may be root-relative or full. Either every file is written or,
    /// on the first failure, none is. Returns the full paths written.
    pub async fn apply_generated<I>(&self, files: I) -> ProjectResult<Vec<String>>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let root = self.state.read().await.ready_tree()?.name().to_string();
        let sealed = files
            .into_iter()
            .map(|(path, content)| -> ProjectResult<(String, String, String)> {
                let full = if path.starts_with(&format!("{root}/")) {
                    path
                } else {
                    format!("{root}/{}", path.trim_start_matches('/'))
                };
                let stored = self.seal(&full, &content)?;
                Ok((full, stored, content))
            })
            .collect::<ProjectResult<Vec<_>>>()?;

        let mut state = self.state.write().await;
        let mut tree = state.ready_tree()?.clone();
        for (path, stored, _) in &sealed {
            tree = apply_write(&tree, path, stored.clone())?;
        }
        state.tree = Some(tree);
        for (path, _, content) in &sealed {
            refresh_if_metadata(&mut state, path, content);
        }
        info!(files = sealed.len(), "generated files applied");
        Ok(sealed.into_iter().map(|(path, _, _)| path).collect())
    }

    /// Make `path` the active file, persist the pointer to `session.meta`
    /// and run the open-file hooks over its content.
    pub async fn select(&self, path: &str) -> ProjectResult<OpenFileReport> {
        let (context, plugins) = {
            let mut state = self.state.write().await;
            let (stored, language) = {
                let node = state
                    .ready_tree()?
                    .find(path)
                    .ok_or_else(|| ProjectError::NotFound(path.into()))?;
                if !node.is_file() {
                    return Err(ProjectError::NotAFile(path.into()));
                }
                (node.content().unwrap_or_default().to_string(), node.language())
            };
            let content = if is_protected(path) {
                self.cipher.decrypt_with_policy(&stored)?
            } else {
                stored
            };

            let session = SessionMeta {
                active_file: Some(path.to_string()),
            };
            self.commit_document(&mut state, MetadataDocument::Session, &session)?;
            state.active_file = Some(path.to_string());

            let context = FileContext::new(path, content).with_language(language);
            (context, state.plugins.clone())
        };
        debug!(path, "file selected");
        Ok(self.pipeline.run_open_file(&context, &plugins).await)
    }

    /// Run the `on_code_change` hooks over `content` (the editor's current
    /// text for `path`) and record the suggestions, unless a newer pass for
    /// the same file was started in the meantime.
    pub async fn run_code_change(&self, path: &str, content: &str) -> ProjectResult<DiagnosticsPass> {
        // Issued under the guard: the token belongs to this generation.
        let (context, plugins, generation, token) = {
            let state = self.state.read().await;
            let language = state
                .ready_tree()?
                .find(path)
                .and_then(|node| node.language())
                .or_else(|| LanguageTag::from_file_name(path));
            (
                FileContext::new(path, content).with_language(language),
                state.plugins.clone(),
                state.generation,
                self.passes.issue(path),
            )
        };

        let report = self.pipeline.run_code_change(&context, &plugins).await;

        let mut state = self.state.write().await;
        let applied = state.phase == ProjectPhase::Ready
            && state.generation == generation
            && self.passes.is_latest(&token);
        if applied {
            state
                .diagnostics
                .insert(path.to_string(), report.suggestions.clone());
        } else {
            debug!(path, seq = token.seq(), "discarding stale diagnostics pass");
        }
        Ok(DiagnosticsPass {
            token,
            applied,
            report,
        })
    }

    // ---- Metadata ----

    pub async fn set_plugin_enabled(&self, name: &str, enabled: bool) -> ProjectResult<()> {
        let mut state = self.state.write().await;
        let mut plugins = state.plugins.clone();
        plugins.set_enabled(name, enabled);
        self.commit_document(&mut state, MetadataDocument::Plugins, &plugins)?;
        state.plugins = plugins;
        info!(plugin = name, enabled, "plugin enablement changed");
        Ok(())
    }

    /// Replace the plugin enablement map with `profile`'s preset.
    pub async fn apply_profile(&self, profile: Profile) -> ProjectResult<()> {
        let mut state = self.state.write().await;
        let plugins = profile.plugins();
        self.commit_document(&mut state, MetadataDocument::Plugins, &plugins)?;
        state.plugins = plugins;
        info!(%profile, "profile applied");
        Ok(())
    }

    /// Append to the conversation history and persist it.
    pub async fn append_message(&self, role: Role, text: &str) -> ProjectResult<ChatMessage> {
        let message = ChatMessage::new(role, text);
        let mut state = self.state.write().await;
        let mut history = state.history.clone();
        history.push(message.clone());
        self.commit_document(&mut state, MetadataDocument::History, &history)?;
        state.history = history;
        Ok(message)
    }

    /// Store the analysis collaborator's map. Only well-formed JSON is
    /// accepted.
    pub async fn store_ast_map(&self, raw: &str) -> ProjectResult<()> {
        let value: serde_json::Value = metadata::parse(MetadataDocument::AstMap, raw)?;
        let mut state = self.state.write().await;
        let sealed = self.cipher.encrypt(raw)?;
        let path = MetadataDocument::AstMap.path_in(state.ready_tree()?.name());
        let next = apply_write(state.ready_tree()?, &path, sealed)?;
        state.tree = Some(next);
        state.ast_map = value;
        Ok(())
    }

    /// Sealed default metadata documents for a new project named `root`,
    /// ready to be merged into a scaffold's import entries.
    pub fn metadata_scaffold(&self, root: &str) -> ProjectResult<Vec<ImportEntry>> {
        Ok(metadata::scaffold(root, &self.cipher, &self.config.default_plugins)?)
    }

    // ---- Internals ----

    fn seal(&self, path: &str, content: &str) -> ProjectResult<String> {
        if is_protected(path) {
            Ok(self.cipher.encrypt(content)?)
        } else {
            Ok(content.to_string())
        }
    }

    /// Serialize, seal and write one metadata document into the held state.
    fn commit_document<T: serde::Serialize>(
        &self,
        state: &mut ProjectState,
        document: MetadataDocument,
        value: &T,
    ) -> ProjectResult<()> {
        let tree = state.ready_tree()?;
        let path = document.path_in(tree.name());
        let sealed = self.cipher.encrypt(&serde_json::to_string_pretty(value)?)?;
        let next = apply_write(tree, &path, sealed)?;
        state.tree = Some(next);
        Ok(())
    }
}

impl std::fmt::Debug for Project {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Project")
            .field("cipher", &self.cipher)
            .field("pipeline", &self.pipeline)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Apply one file write to `tree`: update in place when the file exists,
/// otherwise create it with its ancestors.
fn apply_write(tree: &ProjectTree, path: &str, content: String) -> ProjectResult<ProjectTree> {
    let inside = path
        .strip_prefix(tree.name())
        .and_then(|rest| rest.strip_prefix('/'))
        .is_some_and(|rest| {
            rest.split('/')
                .all(|segment| !segment.is_empty() && segment != "." && segment != "..")
        });
    if !inside {
        return Err(ProjectError::OutsideProject(path.into()));
    }

    match tree.find(path) {
        Some(node) if node.is_folder() => Err(ProjectError::NotAFile(path.into())),
        Some(_) => Ok(tree.update(path, &NodePatch::content(content))),
        None => {
            let next = tree.insert_with_ancestors(path, content);
            if next.find(path).is_some_and(|node| node.is_file()) {
                Ok(next)
            } else {
                Err(ProjectError::PathConflict(path.into()))
            }
        }
    }
}

/// Keep derived state in step when a metadata document is written directly.
fn refresh_if_metadata(state: &mut ProjectState, path: &str, plaintext: &str) {
    let Some(root) = state.tree.as_ref().map(|t| t.name().to_string()) else {
        return;
    };
    if let Some(document) = MetadataDocument::from_path(&root, path) {
        if let Err(err) = state.refresh(document, plaintext) {
            warn!(error = %err, "written metadata document is malformed; keeping previous state");
        }
    }
}
