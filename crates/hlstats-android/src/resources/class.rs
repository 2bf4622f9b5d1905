//! Light resource classes and the packages that contain them.

use super::module::Module;

use serde::Serialize;

/// Simple name of every generated resource class.
pub const R_CLASS_NAME: &str = "R";

/// A lightweight `R` class standing in for the generated one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct LightRClass {
    package: String,
    module: Module,
}

impl LightRClass {
    /// Creates the `R` class of `package`, owned by `module`.
    #[must_use]
    pub fn new(package: impl Into<String>, module: Module) -> Self {
        Self {
            package: package.into(),
            module,
        }
    }

    /// Package declaring the class.
    #[must_use]
    pub fn package_name(&self) -> &str {
        &self.package
    }

    /// Fully qualified name, `<package>.R`.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        qualified_r_class(&self.package)
    }

    /// Module owning the class.
    #[must_use]
    pub fn module(&self) -> &Module {
        &self.module
    }
}

impl std::fmt::Display for LightRClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{} ({})", self.package, R_CLASS_NAME, self.module)
    }
}

/// A package known to contain, or to be an ancestor of, a resource class.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct LightPackage {
    qualified_name: String,
}

impl LightPackage {
    /// Creates a package from its dotted name.
    #[must_use]
    pub fn new(qualified_name: impl Into<String>) -> Self {
        Self {
            qualified_name: qualified_name.into(),
        }
    }

    /// Dotted name of the package.
    #[must_use]
    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    /// Last segment of the name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.qualified_name
            .rsplit_once('.')
            .map_or(self.qualified_name.as_str(), |(_, last)| last)
    }

    /// Dotted name of the enclosing package, if any.
    #[must_use]
    pub fn parent_name(&self) -> Option<&str> {
        self.qualified_name.rsplit_once('.').map(|(parent, _)| parent)
    }
}

/// `<package>.R`.
#[must_use]
pub fn qualified_r_class(package: &str) -> String {
    format!("{package}.{R_CLASS_NAME}")
}
