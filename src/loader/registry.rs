//! Module registry: the explicit allow-list from module path to loader

use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Name of the export a game module must provide
pub const DEFAULT_EXPORT: &str = "default";

/// Async function that fetches one game module
pub type ModuleLoaderFn<C> =
    Arc<dyn Fn() -> BoxFuture<'static, anyhow::Result<LoadedModule<C>>> + Send + Sync>;

/// The exports of a loaded game module
pub struct LoadedModule<C> {
    exports: HashMap<String, Arc<C>>,
}

impl<C> LoadedModule<C> {
    /// A module with no exports
    pub fn empty() -> Self {
        Self {
            exports: HashMap::new(),
        }
    }

    /// A module whose default export is `component`
    pub fn with_default(component: C) -> Self {
        Self::empty().with_export(DEFAULT_EXPORT, component)
    }

    /// Add a named export
    pub fn with_export(mut self, name: impl Into<String>, component: C) -> Self {
        self.exports.insert(name.into(), Arc::new(component));
        self
    }

    pub fn export(&self, name: &str) -> Option<&Arc<C>> {
        self.exports.get(name)
    }

    /// Take the default export, consuming the module
    pub fn into_default(mut self) -> Option<Arc<C>> {
        self.exports.remove(DEFAULT_EXPORT)
    }
}

impl<C> fmt::Debug for LoadedModule<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.exports.keys().collect();
        names.sort();
        f.debug_struct("LoadedModule").field("exports", &names).finish()
    }
}

/// Allow-list of loadable modules.
///
/// Paths not registered here are never loaded.
pub struct ModuleRegistry<C> {
    loaders: HashMap<String, ModuleLoaderFn<C>>,
}

impl<C> Default for ModuleRegistry<C> {
    fn default() -> Self {
        Self {
            loaders: HashMap::new(),
        }
    }
}

impl<C: Send + Sync + 'static> ModuleRegistry<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a loader for `module_path`, replacing any previous one
    pub fn register<F, Fut>(&mut self, module_path: impl Into<String>, loader: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<LoadedModule<C>>> + Send + 'static,
    {
        let loader: ModuleLoaderFn<C> = Arc::new(move || loader().boxed());
        self.loaders.insert(module_path.into(), loader);
    }

    /// Builder form of [`register`](Self::register)
    pub fn with_module<F, Fut>(mut self, module_path: impl Into<String>, loader: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<LoadedModule<C>>> + Send + 'static,
    {
        self.register(module_path, loader);
        self
    }

    pub fn resolve(&self, module_path: &str) -> Option<ModuleLoaderFn<C>> {
        self.loaders.get(module_path).cloned()
    }

    pub fn contains(&self, module_path: &str) -> bool {
        self.loaders.contains_key(module_path)
    }

    /// Registered module paths, sorted
    pub fn paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.loaders.keys().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }

    pub fn len(&self) -> usize {
        self.loaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }
}

impl<C> fmt::Debug for ModuleRegistry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("modules", &self.loaders.len())
            .finish()
    }
}
