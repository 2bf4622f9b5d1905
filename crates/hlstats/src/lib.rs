//! # hlstats
//!
//! Edit-time statistics over an editor's highlighting pass, and light `R`
//! classes for Android resource resolution.
//!
//! This is the facade crate re-exporting the core framework and the Android
//! collectors.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use hlstats::{default_collectors, CollectorRegistry, FeatureFlags, HighlightVisitor, MemorySink};
//!
//! let flags = Arc::new(FeatureFlags::new());
//! let collectors = default_collectors(Arc::clone(&flags), Arc::new(MemorySink::new()));
//! let registry = Arc::new(collectors.registry());
//! let template = HighlightVisitor::new(registry, flags);
//!
//! // Per file:
//! let mut visitor = template.fresh();
//! if visitor.suitable_for_file(&file) {
//!     visitor.analyze(&file, true, holder, |v| {
//!         for node in file.preorder() {
//!             v.visit(&node);
//!         }
//!     });
//! }
//!
//! // Host events:
//! collectors.unresolved_resources.on_sync_start(&project, SyncMode::Incremental);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub use hlstats_core::*;

/// Android resource collectors and the light `R` class service.
pub mod android {
    pub use hlstats_android::*;
}

use hlstats_android::UnresolvedResourceStatsCollector;
use std::sync::Arc;

/// The collectors shipped with hlstats, kept as concrete handles so the
/// host can also route sync and project events to them.
#[derive(Debug, Clone)]
pub struct DefaultCollectors {
    /// Unresolved `R.<type>.<name>` references per project.
    pub unresolved_resources: Arc<UnresolvedResourceStatsCollector>,
}

impl DefaultCollectors {
    /// Registry containing every default collector.
    #[must_use]
    pub fn registry(&self) -> CollectorRegistry {
        CollectorRegistry::builder()
            .collector_ref(self.unresolved_resources.clone())
            .build()
    }

    /// Listeners for build-graph sync events.
    #[must_use]
    pub fn sync_listeners(&self) -> Vec<Arc<dyn SyncListener>> {
        vec![self.unresolved_resources.clone() as Arc<dyn SyncListener>]
    }

    /// Listeners for project open and close events.
    #[must_use]
    pub fn lifecycle_listeners(&self) -> Vec<Arc<dyn ProjectLifecycleListener>> {
        vec![self.unresolved_resources.clone() as Arc<dyn ProjectLifecycleListener>]
    }
}

/// Creates the default collectors, emitting batches to `sink`.
#[must_use]
pub fn default_collectors(
    flags: Arc<FeatureFlags>,
    sink: Arc<dyn TelemetrySink>,
) -> DefaultCollectors {
    DefaultCollectors {
        unresolved_resources: Arc::new(UnresolvedResourceStatsCollector::new(flags, sink)),
    }
}
