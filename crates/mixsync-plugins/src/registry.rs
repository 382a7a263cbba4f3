use std::fmt;
use std::sync::Arc;

use tracing::info;

use crate::builtin;
use crate::error::{PluginError, PluginResult};
use crate::plugin::Plugin;

/// Ordered, append-only set of registered plugins.
///
/// Registration order is the order in which hooks run and in which their
/// results are aggregated. Names are unique. Enablement is not decided here:
/// a registered plugin stays dormant until a project's config enables it.
#[derive(Clone, Default)]
pub struct PluginRegistry {
    plugins: Vec<Arc<dyn Plugin>>,
}

impl PluginRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in analyzers.
    pub fn with_builtin() -> Self {
        Self {
            plugins: builtin::all(),
        }
    }

    /// Append a plugin. Fails if its name is already taken.
    pub fn register(&mut self, plugin: Arc<dyn Plugin>) -> PluginResult<()> {
        let name = plugin.name();
        if self.get(name).is_some() {
            return Err(PluginError::DuplicateName(name.to_string()));
        }
        info!(plugin = name, "registering plugin");
        self.plugins.push(plugin);
        Ok(())
    }

    /// Look up a plugin by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Plugin>> {
        self.plugins.iter().find(|p| p.name() == name)
    }

    /// All plugins in registration order.
    pub fn plugins(&self) -> &[Arc<dyn Plugin>] {
        &self.plugins
    }

    pub fn names(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::PluginDescriptor;

    struct Named(PluginDescriptor);

    impl Plugin for Named {
        fn descriptor(&self) -> &PluginDescriptor {
            &self.0
        }
    }

    fn named(name: &str) -> Arc<dyn Plugin> {
        Arc::new(Named(PluginDescriptor::new(name, "")))
    }

    #[test]
    fn preserves_registration_order() {
        let mut registry = PluginRegistry::new();
        registry.register(named("b")).unwrap();
        registry.register(named("a")).unwrap();
        registry.register(named("c")).unwrap();
        assert_eq!(registry.names(), vec!["b", "a", "c"]);
    }

    #[test]
    fn rejects_duplicate_names() {
        let mut registry = PluginRegistry::new();
        registry.register(named("a")).unwrap();
        let err = registry.register(named("a")).unwrap_err();
        assert!(matches!(err, PluginError::DuplicateName(ref n) if n == "a"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn builtin_set() {
        let registry = PluginRegistry::with_builtin();
        assert_eq!(
            registry.names(),
            vec![
                builtin::SMART_LINTER,
                builtin::CODE_DIAGRAMMER,
                builtin::CODE_OPTIMIZER,
                builtin::SECURITY_ANALYZER,
                builtin::ACCESSIBILITY_CHECKER,
            ]
        );
        let mut extended = registry.clone();
        assert!(extended.register(named(builtin::SMART_LINTER)).is_err());
        extended.register(named("Custom")).unwrap();
        assert_eq!(extended.len(), 6);
        assert_eq!(registry.len(), 5);
    }
}
