//! Light `R` classes handed to the host's symbol resolver.

mod builder;
mod class;
mod module;
mod service;

pub use builder::RClassBuilder;
pub use class::{qualified_r_class, LightPackage, LightRClass, R_CLASS_NAME};
pub use module::{
    EverythingScope, Module, ModuleScope, NothingScope, SearchScope, WORKSPACE_MODULE_NAME,
};
pub use service::{ClassList, LightResourceClassService};
