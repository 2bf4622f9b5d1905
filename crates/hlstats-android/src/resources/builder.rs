//! Builder collecting the resource classes of one sync.

use super::class::{qualified_r_class, LightPackage, LightRClass};
use super::module::Module;

use hlstats_core::{Experiment, FeatureFlags};

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Collects resource classes and packages before they are installed into a
/// [`LightResourceClassService`](super::LightResourceClassService).
///
/// Obtain one from
/// [`LightResourceClassService::builder`](super::LightResourceClassService::builder)
/// so it shares the service's flags.
#[derive(Debug)]
pub struct RClassBuilder {
    flags: Arc<FeatureFlags>,
    pub(super) fixed: BTreeMap<String, Arc<LightRClass>>,
    pub(super) packages: BTreeMap<String, Arc<LightPackage>>,
    pub(super) workspace_packages: BTreeSet<String>,
    pub(super) workspace_module: Option<Module>,
}

impl RClassBuilder {
    pub(super) fn new(flags: Arc<FeatureFlags>) -> Self {
        Self {
            flags,
            fixed: BTreeMap::new(),
            packages: BTreeMap::new(),
            workspace_packages: BTreeSet::new(),
            workspace_module: None,
        }
    }

    /// Adds the `R` class of `package`, owned by `module`.
    ///
    /// A later call for the same package replaces the earlier class.
    pub fn add_class(&mut self, package: &str, module: Module) -> &mut Self {
        self.fixed.insert(
            qualified_r_class(package),
            Arc::new(LightRClass::new(package, module)),
        );
        if self.flags.is_enabled(Experiment::CreateStubResourcePackages) {
            self.add_stub_packages(package);
        }
        self
    }

    /// Declares workspace resource packages, whose classes are created on
    /// first lookup and owned by `module`.
    ///
    /// Replaces the packages and module of any earlier call. Stub packages
    /// added by that call are kept. Ignored unless workspace resources are
    /// enabled.
    pub fn add_workspace_packages<I, S>(&mut self, packages: I, module: Module) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if !self.flags.is_enabled(Experiment::WorkspaceResources) {
            return self;
        }
        self.workspace_module = Some(module);
        self.workspace_packages.clear();
        for package in packages {
            let package = package.as_ref();
            self.workspace_packages.insert(qualified_r_class(package));
            self.add_stub_packages(package);
        }
        self
    }

    /// Adds `name` and each of its dotted prefixes as packages.
    ///
    /// Stops at the first prefix already present, since its own prefixes were
    /// added with it.
    fn add_stub_packages(&mut self, name: &str) {
        let mut current = name;
        while !current.is_empty() && !self.packages.contains_key(current) {
            self.packages
                .insert(current.to_string(), Arc::new(LightPackage::new(current)));
            match current.rfind('.') {
                Some(dot) => current = &current[..dot],
                None => break,
            }
        }
    }

    /// Number of fixed classes added so far.
    #[must_use]
    pub fn class_count(&self) -> usize {
        self.fixed.len()
    }

    /// Number of workspace packages declared so far.
    #[must_use]
    pub fn workspace_package_count(&self) -> usize {
        self.workspace_packages.len()
    }

    /// Returns true if nothing was added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fixed.is_empty() && self.workspace_packages.is_empty() && self.packages.is_empty()
    }
}
