//! # hlstats-core
//!
//! Core framework for collecting statistics from an editor's highlighting pass.
//!
//! This crate provides the foundational traits and types shared by all
//! collectors. It includes:
//!
//! - Host capability traits ([`SyntaxNode`], [`SourceFile`], [`DiagnosticHolder`])
//! - [`HighlightStatsCollector`] for pluggable diagnostic consumers
//! - [`CollectorRegistry`] and [`DiagnosticKindIndex`] for routing diagnostics
//! - [`HighlightVisitor`] adapting the host's per-file visitor contract
//! - [`FeatureFlags`] and [`Config`] for runtime experiments
//! - [`TelemetrySink`] implementations for emitting [`HighlightStats`]
//!
//! ## Example
//!
//! ```ignore
//! use hlstats_core::{CollectorRegistry, FeatureFlags, HighlightVisitor};
//!
//! let registry = Arc::new(CollectorRegistry::builder().collector(MyCollector::new()).build());
//! let mut visitor = HighlightVisitor::new(registry, Arc::new(FeatureFlags::new()));
//!
//! if visitor.suitable_for_file(&file) {
//!     visitor.analyze(&file, true, holder, |v| {
//!         for node in file.preorder() {
//!             v.visit(&node);
//!         }
//!     });
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod collector;
mod config;
mod host;
mod registry;
mod telemetry;
mod types;
mod visitor;

/// In-memory syntax trees for hosts without their own.
pub mod tree;

pub use collector::{CollectorRef, HighlightStatsCollector};
pub use config::{Config, ConfigError, Experiment, FeatureFlags};
pub use host::{
    CancellationFlag, DiagnosticBuffer, DiagnosticHolder, FileRef, NodeRef,
    ProjectLifecycleListener, SourceFile, SyncListener, SyntaxNode,
};
pub use registry::{CollectorRegistry, CollectorRegistryBuilder, DiagnosticKindIndex};
pub use telemetry::{JsonLinesSink, MemorySink, TelemetryError, TelemetrySink};
pub use types::{
    Diagnostic, DiagnosticKind, FileHighlights, FileId, FileKind, HighlightRecord,
    HighlightStats, HighlightStatsKind, PerFileHighlights, ProjectId, Severity, SyncMode,
    SyncResult,
};
pub use visitor::HighlightVisitor;
