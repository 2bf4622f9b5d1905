//! Build modules and the search scopes that filter by them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Name of the synthetic module owning workspace resource classes.
pub const WORKSPACE_MODULE_NAME: &str = ".workspace";

/// A build module, compared by name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Module {
    name: Arc<str>,
}

impl Module {
    /// Creates a module handle.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self { name: name.into() }
    }

    /// The synthetic workspace module.
    #[must_use]
    pub fn workspace() -> Self {
        Self::new(WORKSPACE_MODULE_NAME)
    }

    /// Name of the module.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true for the synthetic workspace module.
    #[must_use]
    pub fn is_workspace(&self) -> bool {
        &*self.name == WORKSPACE_MODULE_NAME
    }
}

impl std::fmt::Display for Module {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// A region of the project that lookups are restricted to.
pub trait SearchScope {
    /// Returns true if the content of `module` is part of this scope.
    fn contains_module(&self, module: &Module) -> bool;
}

/// Scope covering every module.
#[derive(Debug, Clone, Copy, Default)]
pub struct EverythingScope;

impl SearchScope for EverythingScope {
    fn contains_module(&self, _module: &Module) -> bool {
        true
    }
}

/// Scope covering nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NothingScope;

impl SearchScope for NothingScope {
    fn contains_module(&self, _module: &Module) -> bool {
        false
    }
}

/// Scope covering an explicit set of modules.
#[derive(Debug, Clone, Default)]
pub struct ModuleScope {
    modules: BTreeSet<Module>,
}

impl ModuleScope {
    /// Scope over `modules`.
    pub fn new(modules: impl IntoIterator<Item = Module>) -> Self {
        Self {
            modules: modules.into_iter().collect(),
        }
    }

    /// Adds `module` to the scope.
    #[must_use]
    pub fn with(mut self, module: Module) -> Self {
        self.modules.insert(module);
        self
    }
}

impl SearchScope for ModuleScope {
    fn contains_module(&self, module: &Module) -> bool {
        self.modules.contains(module)
    }
}
