//! # hlstats-android
//!
//! Android-specific pieces of hlstats.
//!
//! ## Contents
//!
//! | Item | Purpose |
//! |------|---------|
//! | [`find_resource_expression`] | Finds the `R.<type>.<name>` accessor around a node |
//! | [`UnresolvedResourceStatsCollector`] | Counts unresolved accessors per project |
//! | [`LightResourceClassService`] | Serves light `R` classes to the symbol resolver |
//!
//! ## Usage
//!
//! ```ignore
//! use hlstats_android::{EverythingScope, LightResourceClassService, Module};
//!
//! let service = LightResourceClassService::new(flags);
//! let mut builder = service.builder();
//! builder.add_class("com.example.app", Module::new("app"));
//! service.install(builder);
//!
//! let classes = service.lookup("com.example.app.R", &EverythingScope);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod resource_expr;
pub mod resources;
mod stats;

pub use resource_expr::{
    find_resource_expression, is_resource_accessor, is_resource_qualifier,
    parse_resource_accessor, ResourceExpression, ResourceType, MAX_ANCESTOR_STEPS,
    RESOURCE_CLASS,
};
pub use resources::{
    EverythingScope, LightPackage, LightRClass, LightResourceClassService, Module, ModuleScope,
    NothingScope, RClassBuilder, SearchScope,
};
pub use stats::{ProjectUnresolvedResourceStats, UnresolvedResourceStatsCollector};
