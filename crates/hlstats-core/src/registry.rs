//! Collector registry and per-kind dispatch index.

use crate::collector::{CollectorRef, HighlightStatsCollector};
use crate::host::{SourceFile, SyntaxNode};
use crate::types::{Diagnostic, DiagnosticKind};

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, warn};

/// Builder for configuring a [`CollectorRegistry`].
#[derive(Default)]
pub struct CollectorRegistryBuilder {
    collectors: Vec<CollectorRef>,
}

impl CollectorRegistryBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a collector to the registry.
    #[must_use]
    pub fn collector<C: HighlightStatsCollector + 'static>(mut self, collector: C) -> Self {
        self.collectors.push(Arc::new(collector));
        self
    }

    /// Adds a shared collector, keeping the caller's handle usable.
    #[must_use]
    pub fn collector_ref(mut self, collector: CollectorRef) -> Self {
        self.collectors.push(collector);
        self
    }

    /// Builds the registry.
    #[must_use]
    pub fn build(self) -> CollectorRegistry {
        debug!("Registered {} highlight collector(s)", self.collectors.len());
        CollectorRegistry {
            collectors: self.collectors,
        }
    }
}

/// The set of collectors loaded at startup.
///
/// Use [`CollectorRegistry::builder()`] to construct an instance.
#[derive(Default)]
pub struct CollectorRegistry {
    collectors: Vec<CollectorRef>,
}

impl CollectorRegistry {
    /// Creates a new builder.
    #[must_use]
    pub fn builder() -> CollectorRegistryBuilder {
        CollectorRegistryBuilder::new()
    }

    /// Number of registered collectors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.collectors.len()
    }

    /// Returns true if no collector is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.collectors.is_empty()
    }

    /// Iterates over the registered collectors.
    pub fn iter(&self) -> impl Iterator<Item = &CollectorRef> {
        self.collectors.iter()
    }

    /// Collectors whose [`HighlightStatsCollector::can_process_file`] accepts `file`.
    #[must_use]
    pub fn collectors_for_file(&self, file: &dyn SourceFile) -> Vec<CollectorRef> {
        self.collectors
            .iter()
            .filter(|c| guarded(c.name(), || c.can_process_file(file)).unwrap_or(false))
            .cloned()
            .collect()
    }
}

/// Maps each diagnostic kind to the collectors that declared interest in it.
#[derive(Default, Clone)]
pub struct DiagnosticKindIndex {
    by_kind: HashMap<DiagnosticKind, Vec<CollectorRef>>,
}

impl DiagnosticKindIndex {
    /// Builds the index from the kinds each collector currently declares.
    #[must_use]
    pub fn build(collectors: &[CollectorRef]) -> Self {
        let mut by_kind: HashMap<DiagnosticKind, Vec<CollectorRef>> = HashMap::new();
        for collector in collectors {
            for kind in collector.supported_diagnostic_kinds() {
                let entry = by_kind.entry(kind).or_default();
                if !entry.iter().any(|c| Arc::ptr_eq(c, collector)) {
                    entry.push(Arc::clone(collector));
                }
            }
        }
        Self { by_kind }
    }

    /// Collectors registered for `kind`.
    #[must_use]
    pub fn collectors_for(&self, kind: DiagnosticKind) -> &[CollectorRef] {
        self.by_kind.get(&kind).map_or(&[], Vec::as_slice)
    }

    /// Routes `diagnostic` on `node` to every interested collector.
    ///
    /// Returns the number of collectors that recorded it.
    pub fn dispatch(&self, node: &dyn SyntaxNode, diagnostic: &Diagnostic) -> usize {
        let mut recorded = 0;
        for collector in self.collectors_for(diagnostic.kind) {
            let accepted = guarded(collector.name(), || {
                if collector.can_process_diagnostic(node, diagnostic) {
                    collector.record(node, diagnostic);
                    true
                } else {
                    false
                }
            });
            if accepted == Some(true) {
                recorded += 1;
            }
        }
        recorded
    }
}

/// Runs a collector callback, containing any panic to this call.
///
/// The host pass must never fail because of a collector.
fn guarded<T>(collector: &str, f: impl FnOnce() -> T) -> Option<T> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => Some(value),
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(ToString::to_string)
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            warn!("Collector {} failed: {}", collector, message);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{InMemoryFile, TreeBuilder};
    use crate::types::{FileKind, ProjectId, Severity};
    use parking_lot::Mutex;

    struct Recording {
        name: &'static str,
        files: Vec<FileKind>,
        kinds: Vec<DiagnosticKind>,
        seen: Mutex<Vec<String>>,
    }

    impl Recording {
        fn new(name: &'static str, files: Vec<FileKind>, kinds: Vec<DiagnosticKind>) -> Self {
            Self {
                name,
                files,
                kinds,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl HighlightStatsCollector for Recording {
        fn name(&self) -> &'static str {
            self.name
        }
        fn supported_file_kinds(&self) -> Vec<FileKind> {
            self.files.clone()
        }
        fn supported_diagnostic_kinds(&self) -> Vec<DiagnosticKind> {
            self.kinds.clone()
        }
        fn record(&self, node: &dyn SyntaxNode, _diagnostic: &Diagnostic) {
            self.seen.lock().push(node.text().into_owned());
        }
    }

    struct Panicking;

    impl HighlightStatsCollector for Panicking {
        fn name(&self) -> &'static str {
            "panicking"
        }
        fn supported_file_kinds(&self) -> Vec<FileKind> {
            vec![FileKind::JavaSource]
        }
        fn supported_diagnostic_kinds(&self) -> Vec<DiagnosticKind> {
            vec![DiagnosticKind::Error]
        }
        fn record(&self, _node: &dyn SyntaxNode, _diagnostic: &Diagnostic) {
            panic!("collector bug");
        }
    }

    fn file(kind: FileKind) -> InMemoryFile {
        let mut b = TreeBuilder::new("f", kind, ProjectId::new("p"));
        b.token("node");
        b.finish()
    }

    #[test]
    fn collectors_for_file_filters_by_kind() {
        let java = Arc::new(Recording::new(
            "java",
            vec![FileKind::JavaSource],
            vec![DiagnosticKind::Error],
        ));
        let xml = Arc::new(Recording::new(
            "xml",
            vec![FileKind::Xml],
            vec![DiagnosticKind::Error],
        ));
        let registry = CollectorRegistry::builder()
            .collector_ref(java)
            .collector_ref(xml)
            .build();

        let selected = registry.collectors_for_file(&file(FileKind::JavaSource));
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].name(), "java");
        assert!(registry
            .collectors_for_file(&file(FileKind::BuildFile))
            .is_empty());
    }

    #[test]
    fn index_groups_collectors_by_kind() {
        let a: CollectorRef = Arc::new(Recording::new(
            "a",
            vec![FileKind::JavaSource],
            vec![DiagnosticKind::Error, DiagnosticKind::UnresolvedReference],
        ));
        let b: CollectorRef = Arc::new(Recording::new(
            "b",
            vec![FileKind::JavaSource],
            vec![DiagnosticKind::UnresolvedReference],
        ));
        let index = DiagnosticKindIndex::build(&[a, b]);

        assert_eq!(index.collectors_for(DiagnosticKind::Error).len(), 1);
        assert_eq!(
            index
                .collectors_for(DiagnosticKind::UnresolvedReference)
                .len(),
            2
        );
        assert!(index.collectors_for(DiagnosticKind::Warning).is_empty());
    }

    #[test]
    fn dispatch_routes_only_matching_kinds() {
        let java = Arc::new(Recording::new(
            "java",
            vec![FileKind::JavaSource],
            vec![DiagnosticKind::UnresolvedReference],
        ));
        let index = DiagnosticKindIndex::build(&[java.clone() as CollectorRef]);
        let f = file(FileKind::JavaSource);
        let node = f.roots()[0].clone();

        let unresolved = Diagnostic::new(
            Severity::Error,
            DiagnosticKind::UnresolvedReference,
            0,
            4,
        );
        let error = Diagnostic::new(Severity::Error, DiagnosticKind::Error, 0, 4);
        assert_eq!(index.dispatch(&node, &unresolved), 1);
        assert_eq!(index.dispatch(&node, &error), 0);
        assert_eq!(*java.seen.lock(), vec!["node".to_string()]);
    }

    #[test]
    fn panicking_collector_does_not_break_dispatch() {
        let good = Arc::new(Recording::new(
            "good",
            vec![FileKind::JavaSource],
            vec![DiagnosticKind::Error],
        ));
        let index =
            DiagnosticKindIndex::build(&[Arc::new(Panicking) as CollectorRef, good.clone()]);
        let f = file(FileKind::JavaSource);
        let node = f.roots()[0].clone();
        let error = Diagnostic::new(Severity::Error, DiagnosticKind::Error, 0, 4);

        assert_eq!(index.dispatch(&node, &error), 1);
        assert_eq!(good.seen.lock().len(), 1);
    }
}
