//! Live directory of light resource classes.

use super::builder::RClassBuilder;
use super::class::{LightPackage, LightRClass, R_CLASS_NAME};
use super::module::{Module, SearchScope};

use hlstats_core::{Experiment, FeatureFlags};

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::debug;

/// Shared list of classes handed out by queries.
pub type ClassList = Arc<[Arc<LightRClass>]>;

/// Union of fixed and workspace classes, recomputed only when marked stale.
#[derive(Debug)]
struct AllClassesCache {
    fixed: ClassList,
    cached: ClassList,
    is_stale: bool,
}

impl AllClassesCache {
    fn new(fixed: ClassList) -> Self {
        Self {
            cached: Arc::clone(&fixed),
            fixed,
            is_stale: false,
        }
    }

    fn notify_updated(&mut self, workspace_enabled: bool) {
        self.is_stale = workspace_enabled;
    }

    fn get(&mut self, workspace: &BTreeMap<String, Arc<LightRClass>>) -> ClassList {
        if self.is_stale {
            self.cached = self
                .fixed
                .iter()
                .chain(workspace.values())
                .cloned()
                .collect();
            self.is_stale = false;
        }
        Arc::clone(&self.cached)
    }
}

/// State mutated by lookups, guarded by one lock.
#[derive(Debug)]
struct WorkspaceClasses {
    classes: BTreeMap<String, Arc<LightRClass>>,
    cache: AllClassesCache,
}

/// Tables published by one [`LightResourceClassService::install`].
#[derive(Debug)]
struct Installed {
    fixed: BTreeMap<String, Arc<LightRClass>>,
    fixed_classes: ClassList,
    packages: BTreeMap<String, Arc<LightPackage>>,
    workspace_packages: BTreeSet<String>,
    workspace_module: Option<Module>,
    workspace: Mutex<WorkspaceClasses>,
}

impl Installed {
    fn from_builder(builder: RClassBuilder) -> Self {
        let fixed_classes: ClassList = builder.fixed.values().cloned().collect();
        Self {
            fixed: builder.fixed,
            packages: builder.packages,
            workspace_packages: builder.workspace_packages,
            workspace_module: builder.workspace_module,
            workspace: Mutex::new(WorkspaceClasses {
                classes: BTreeMap::new(),
                cache: AllClassesCache::new(Arc::clone(&fixed_classes)),
            }),
            fixed_classes,
        }
    }

    fn empty() -> Self {
        Self {
            fixed: BTreeMap::new(),
            fixed_classes: Arc::new([]),
            packages: BTreeMap::new(),
            workspace_packages: BTreeSet::new(),
            workspace_module: None,
            workspace: Mutex::new(WorkspaceClasses {
                classes: BTreeMap::new(),
                cache: AllClassesCache::new(Arc::new([])),
            }),
        }
    }

    fn is_workspace_module(&self, module: &Module) -> bool {
        match &self.workspace_module {
            Some(workspace) => workspace == module,
            None => module.is_workspace(),
        }
    }
}

/// Supplies light `R` classes and their packages to the host's resolver.
///
/// Sync code fills an [`RClassBuilder`] and publishes it with [`install`];
/// readers always see one complete set of tables. Classes of workspace
/// packages are created lazily on first lookup.
///
/// [`install`]: Self::install
#[derive(Debug)]
pub struct LightResourceClassService {
    flags: Arc<FeatureFlags>,
    installed: ArcSwap<Installed>,
}

impl LightResourceClassService {
    /// Creates an empty service.
    #[must_use]
    pub fn new(flags: Arc<FeatureFlags>) -> Self {
        Self {
            flags,
            installed: ArcSwap::from_pointee(Installed::empty()),
        }
    }

    /// A new builder sharing this service's flags.
    #[must_use]
    pub fn builder(&self) -> RClassBuilder {
        RClassBuilder::new(Arc::clone(&self.flags))
    }

    fn workspace_enabled(&self) -> bool {
        self.flags.is_enabled(Experiment::WorkspaceResources)
    }

    /// Replaces every table with the contents of `builder`.
    ///
    /// Lazily created workspace classes are discarded.
    pub fn install(&self, builder: RClassBuilder) {
        let installed = Installed::from_builder(builder);
        debug!(
            "Installing {} resource class(es), {} package(s), {} workspace package(s)",
            installed.fixed.len(),
            installed.packages.len(),
            installed.workspace_packages.len()
        );
        self.installed.store(Arc::new(installed));
    }

    /// Finds the class named `qualified_name` (`<package>.R`), if its module
    /// is inside `scope`.
    ///
    /// Returns at most one class.
    #[must_use]
    pub fn lookup(&self, qualified_name: &str, scope: &dyn SearchScope) -> Vec<Arc<LightRClass>> {
        let installed = self.installed.load();
        let class = match installed.fixed.get(qualified_name) {
            Some(class) => Some(Arc::clone(class)),
            None if self.workspace_enabled() => self.workspace_class(&installed, qualified_name),
            None => None,
        };
        match class {
            Some(class) if scope.contains_module(class.module()) => vec![class],
            _ => Vec::new(),
        }
    }

    fn workspace_class(&self, installed: &Installed, qualified_name: &str) -> Option<Arc<LightRClass>> {
        let mut workspace = installed.workspace.lock();
        if let Some(class) = workspace.classes.get(qualified_name) {
            return Some(Arc::clone(class));
        }
        if !installed.workspace_packages.contains(qualified_name) {
            return None;
        }
        let module = installed.workspace_module.clone()?;
        let package = qualified_name.strip_suffix(R_CLASS_NAME)?.strip_suffix('.')?;
        let class = Arc::new(LightRClass::new(package, module));
        debug!("Created workspace resource class {}", qualified_name);
        workspace
            .classes
            .insert(qualified_name.to_string(), Arc::clone(&class));
        workspace.cache.notify_updated(self.workspace_enabled());
        Some(class)
    }

    /// Classes visible from `module`.
    ///
    /// The workspace module sees fixed and workspace classes; any other
    /// module sees the fixed classes only.
    #[must_use]
    pub fn accessible_from_module(&self, module: &Module, _include_tests: bool) -> ClassList {
        let installed = self.installed.load();
        if self.workspace_enabled() && installed.is_workspace_module(module) {
            let mut workspace = installed.workspace.lock();
            let WorkspaceClasses { classes, cache } = &mut *workspace;
            return cache.get(classes);
        }
        Arc::clone(&installed.fixed_classes)
    }

    /// Classes providing resources to `module`.
    #[must_use]
    pub fn containing_module_resources(&self, _module: &Module) -> ClassList {
        Arc::clone(&self.installed.load().fixed_classes)
    }

    /// Package named `qualified_name`, if known.
    #[must_use]
    pub fn find_package(&self, qualified_name: &str) -> Option<Arc<LightPackage>> {
        self.installed.load().packages.get(qualified_name).cloned()
    }

    /// Every known class, fixed and workspace.
    #[must_use]
    pub fn all(&self) -> ClassList {
        let installed = self.installed.load();
        let mut workspace = installed.workspace.lock();
        let WorkspaceClasses { classes, cache } = &mut *workspace;
        cache.get(classes)
    }

    /// Names of every known package, sorted.
    #[must_use]
    pub fn package_names(&self) -> Vec<String> {
        self.installed.load().packages.keys().cloned().collect()
    }

    /// Number of workspace classes created so far.
    #[must_use]
    pub fn workspace_class_count(&self) -> usize {
        self.installed.load().workspace.lock().classes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::module::{EverythingScope, ModuleScope, NothingScope};

    fn service() -> (Arc<FeatureFlags>, LightResourceClassService) {
        let flags = Arc::new(FeatureFlags::new());
        (Arc::clone(&flags), LightResourceClassService::new(flags))
    }

    fn names(classes: &[Arc<LightRClass>]) -> Vec<String> {
        classes.iter().map(|c| c.qualified_name()).collect()
    }

    #[test]
    fn empty_service_returns_nothing() {
        let (_, service) = service();
        assert!(service.lookup("com.example.R", &EverythingScope).is_empty());
        assert!(service.all().is_empty());
        assert!(service.find_package("com").is_none());
        assert!(service
            .accessible_from_module(&Module::workspace(), false)
            .is_empty());
    }

    #[test]
    fn lookup_respects_scope() {
        let (_, service) = service();
        let app = Module::new("app");
        let mut builder = service.builder();
        builder.add_class("com.example.app", app.clone());
        service.install(builder);

        let found = service.lookup("com.example.app.R", &EverythingScope);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].module(), &app);

        assert!(service.lookup("com.example.app.R", &NothingScope).is_empty());
        assert!(service
            .lookup("com.example.app.R", &ModuleScope::new([Module::new("lib")]))
            .is_empty());
        assert!(service.lookup("com.example.R", &EverythingScope).is_empty());
    }

    #[test]
    fn workspace_class_is_created_once() {
        let (_, service) = service();
        let mut builder = service.builder();
        builder.add_workspace_packages(["ws.pkg"], Module::workspace());
        service.install(builder);

        let first = service.lookup("ws.pkg.R", &EverythingScope);
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].package_name(), "ws.pkg");
        assert!(first[0].module().is_workspace());

        let second = service.lookup("ws.pkg.R", &EverythingScope);
        assert!(Arc::ptr_eq(&first[0], &second[0]));
        assert_eq!(service.workspace_class_count(), 1);
    }

    #[test]
    fn workspace_lookup_outside_scope_still_creates() {
        let (_, service) = service();
        let mut builder = service.builder();
        builder.add_workspace_packages(["ws.pkg"], Module::workspace());
        service.install(builder);

        assert!(service.lookup("ws.pkg.R", &NothingScope).is_empty());
        assert_eq!(service.workspace_class_count(), 1);
    }

    #[test]
    fn all_includes_workspace_classes_after_lookup() {
        let (_, service) = service();
        let mut builder = service.builder();
        builder
            .add_class("com.example.app", Module::new("app"))
            .add_workspace_packages(["ws.pkg"], Module::workspace());
        service.install(builder);

        assert_eq!(names(&service.all()), vec!["com.example.app.R"]);
        service.lookup("ws.pkg.R", &EverythingScope);
        assert_eq!(names(&service.all()), vec!["com.example.app.R", "ws.pkg.R"]);
        assert_eq!(
            names(&service.accessible_from_module(&Module::workspace(), false)),
            vec!["com.example.app.R", "ws.pkg.R"]
        );
        assert_eq!(
            names(&service.accessible_from_module(&Module::new("app"), true)),
            vec!["com.example.app.R"]
        );
        assert_eq!(
            names(&service.containing_module_resources(&Module::new("app"))),
            vec!["com.example.app.R"]
        );
    }

    #[test]
    fn disabled_workspace_skips_workspace_tables() {
        let (flags, service) = service();
        let mut builder = service.builder();
        builder.add_workspace_packages(["ws.pkg"], Module::workspace());
        service.install(builder);

        flags.set(Experiment::WorkspaceResources, false);
        assert!(service.lookup("ws.pkg.R", &EverythingScope).is_empty());
        assert_eq!(service.workspace_class_count(), 0);
        assert!(service
            .accessible_from_module(&Module::workspace(), false)
            .is_empty());
    }

    #[test]
    fn install_resets_workspace_classes() {
        let (_, service) = service();
        let mut builder = service.builder();
        builder.add_workspace_packages(["ws.pkg"], Module::workspace());
        service.install(builder);
        service.lookup("ws.pkg.R", &EverythingScope);
        assert_eq!(service.all().len(), 1);

        let mut builder = service.builder();
        builder.add_workspace_packages(["ws.pkg"], Module::workspace());
        service.install(builder);
        assert_eq!(service.workspace_class_count(), 0);
        assert!(service.all().is_empty());
    }

    #[test]
    fn unknown_names_are_not_workspace_classes() {
        let (_, service) = service();
        let mut builder = service.builder();
        builder.add_workspace_packages(["ws.pkg"], Module::workspace());
        service.install(builder);

        assert!(service.lookup("ws.other.R", &EverythingScope).is_empty());
        assert!(service.lookup("ws.pkg", &EverythingScope).is_empty());
        assert_eq!(service.workspace_class_count(), 0);
    }

    #[test]
    fn packages_are_sorted() {
        let (_, service) = service();
        let mut builder = service.builder();
        builder
            .add_class("org.b", Module::new("b"))
            .add_class("com.a", Module::new("a"));
        service.install(builder);
        assert_eq!(service.package_names(), vec!["com", "com.a", "org", "org.b"]);
        assert_eq!(
            service.find_package("org").unwrap().qualified_name(),
            "org"
        );
    }

    #[test]
    fn cache_recomputes_only_when_stale() {
        let fixed: ClassList = vec![Arc::new(LightRClass::new("a", Module::new("m")))].into();
        let mut cache = AllClassesCache::new(fixed);
        let mut workspace = BTreeMap::new();
        workspace.insert(
            "w.R".to_string(),
            Arc::new(LightRClass::new("w", Module::workspace())),
        );

        assert_eq!(cache.get(&workspace).len(), 1);
        cache.notify_updated(false);
        assert_eq!(cache.get(&workspace).len(), 1);
        cache.notify_updated(true);
        assert_eq!(cache.get(&workspace).len(), 2);
    }

    #[test]
    fn concurrent_lookups_create_one_workspace_class() {
        let (_, service) = service();
        let mut builder = service.builder();
        builder.add_workspace_packages(["ws.pkg"], Module::workspace());
        service.install(builder);

        let found: Vec<Arc<LightRClass>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| {
                        let mut first = None;
                        for _ in 0..200 {
                            let class = service.lookup("ws.pkg.R", &EverythingScope);
                            assert_eq!(class.len(), 1);
                            assert!(service.all().len() <= 1);
                            first.get_or_insert_with(|| Arc::clone(&class[0]));
                        }
                        first
                    })
                })
                .collect();
            handles
                .into_iter()
                .filter_map(|handle| handle.join().unwrap())
                .collect()
        });

        assert_eq!(found.len(), 8);
        assert!(found.iter().all(|class| Arc::ptr_eq(class, &found[0])));
        assert_eq!(service.workspace_class_count(), 1);
        assert_eq!(service.all().len(), 1);
        assert!(Arc::ptr_eq(&service.all()[0], &found[0]));
    }
}
