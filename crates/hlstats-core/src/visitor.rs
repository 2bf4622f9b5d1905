//! Adapter between the host's highlighting pass and the collectors.
//!
//! Call order, per file:
//!
//! 1. [`HighlightVisitor::fresh`]: once for each file.
//! 2. [`HighlightVisitor::suitable_for_file`]: the host skips the visitor on `false`.
//! 3. [`HighlightVisitor::analyze`]: wraps the host's traversal. The callback
//!    must be run and the method must return `true`.
//! 4. [`HighlightVisitor::visit`]: called by the traversal once per node, while
//!    the holder contains the diagnostics produced so far.

use crate::config::{Experiment, FeatureFlags};
use crate::host::{CancellationFlag, DiagnosticHolder, SourceFile, SyntaxNode};
use crate::registry::{CollectorRegistry, DiagnosticKindIndex};

use std::ops::Deref;
use std::sync::Arc;
use tracing::debug;

/// Per-file visitor forwarding diagnostics to interested collectors.
pub struct HighlightVisitor {
    registry: Arc<CollectorRegistry>,
    flags: Arc<FeatureFlags>,
    cancellation: CancellationFlag,
    index: DiagnosticKindIndex,
    holder: Option<Arc<dyn DiagnosticHolder>>,
}

impl HighlightVisitor {
    /// Creates a visitor over `registry`.
    #[must_use]
    pub fn new(registry: Arc<CollectorRegistry>, flags: Arc<FeatureFlags>) -> Self {
        Self {
            registry,
            flags,
            cancellation: CancellationFlag::new(),
            index: DiagnosticKindIndex::default(),
            holder: None,
        }
    }

    /// Uses `cancellation` to stop forwarding between diagnostics.
    #[must_use]
    pub fn with_cancellation(mut self, cancellation: CancellationFlag) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// A new visitor for the next file, sharing registry, flags and cancellation.
    #[must_use]
    pub fn fresh(&self) -> Self {
        Self::new(Arc::clone(&self.registry), Arc::clone(&self.flags))
            .with_cancellation(self.cancellation.clone())
    }

    /// Selects the collectors for `file` and indexes them by diagnostic kind.
    ///
    /// Returns false if the visitor is disabled or no collector wants the file.
    pub fn suitable_for_file(&mut self, file: &dyn SourceFile) -> bool {
        if !self.flags.is_enabled(Experiment::HighlightVisitor) {
            return false;
        }
        let collectors = self.registry.collectors_for_file(file);
        if collectors.is_empty() {
            return false;
        }
        self.index = DiagnosticKindIndex::build(&collectors);
        debug!(
            "Visiting {} with {} collector(s)",
            file.path().display(),
            collectors.len()
        );
        true
    }

    /// Runs the host traversal `runnable`, exposing `holder` to [`Self::visit`]
    /// for its duration.
    ///
    /// Partial passes and a disabled visitor still run `runnable`, but nothing
    /// is forwarded. The holder is released even if `runnable` unwinds.
    /// Always returns `true`.
    pub fn analyze<F>(
        &mut self,
        _file: &dyn SourceFile,
        update_whole_file: bool,
        holder: Arc<dyn DiagnosticHolder>,
        runnable: F,
    ) -> bool
    where
        F: FnOnce(&Self),
    {
        if !self.flags.is_enabled(Experiment::HighlightVisitor) || !update_whole_file {
            runnable(self);
            return true;
        }
        let guard = HolderGuard::install(self, holder);
        runnable(&*guard);
        true
    }

    /// Forwards every diagnostic currently held to the collectors registered
    /// for its kind, with `node` as context.
    pub fn visit(&self, node: &dyn SyntaxNode) {
        let Some(holder) = &self.holder else {
            return;
        };
        for i in 0..holder.len() {
            if self.cancellation.is_cancelled() {
                debug!("Highlight visit cancelled");
                return;
            }
            let Some(diagnostic) = holder.get(i) else {
                break;
            };
            self.index.dispatch(node, &diagnostic);
        }
    }

    /// Returns true while inside [`Self::analyze`] on a whole-file pass.
    #[must_use]
    pub fn is_collecting(&self) -> bool {
        self.holder.is_some()
    }
}

/// Keeps the holder installed for the guard's lifetime.
struct HolderGuard<'a> {
    visitor: &'a mut HighlightVisitor,
}

impl<'a> HolderGuard<'a> {
    fn install(visitor: &'a mut HighlightVisitor, holder: Arc<dyn DiagnosticHolder>) -> Self {
        visitor.holder = Some(holder);
        Self { visitor }
    }
}

impl Deref for HolderGuard<'_> {
    type Target = HighlightVisitor;

    fn deref(&self) -> &HighlightVisitor {
        self.visitor
    }
}

impl Drop for HolderGuard<'_> {
    fn drop(&mut self) {
        self.visitor.holder = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::HighlightStatsCollector;
    use crate::host::DiagnosticBuffer;
    use crate::tree::{InMemoryFile, TreeBuilder};
    use crate::types::{Diagnostic, DiagnosticKind, FileKind, ProjectId, Severity};
    use parking_lot::Mutex;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    #[derive(Default)]
    struct Seen(Mutex<Vec<(String, DiagnosticKind)>>);

    impl HighlightStatsCollector for Seen {
        fn name(&self) -> &'static str {
            "seen"
        }
        fn supported_file_kinds(&self) -> Vec<FileKind> {
            vec![FileKind::JavaSource]
        }
        fn supported_diagnostic_kinds(&self) -> Vec<DiagnosticKind> {
            vec![DiagnosticKind::UnresolvedReference]
        }
        fn record(&self, node: &dyn SyntaxNode, diagnostic: &Diagnostic) {
            self.0
                .lock()
                .push((node.text().into_owned(), diagnostic.kind));
        }
    }

    fn setup() -> (Arc<Seen>, HighlightVisitor, Arc<FeatureFlags>) {
        let seen = Arc::new(Seen::default());
        let registry = Arc::new(
            CollectorRegistry::builder()
                .collector_ref(seen.clone())
                .build(),
        );
        let flags = Arc::new(FeatureFlags::new());
        let visitor = HighlightVisitor::new(registry, Arc::clone(&flags));
        (seen, visitor, flags)
    }

    fn java_file() -> InMemoryFile {
        let mut b = TreeBuilder::new("Main.java", FileKind::JavaSource, ProjectId::new("p"));
        b.reference_expression("a.b");
        b.finish()
    }

    fn holder() -> Arc<DiagnosticBuffer> {
        Arc::new(DiagnosticBuffer::from_diagnostics(vec![
            Diagnostic::new(Severity::Error, DiagnosticKind::UnresolvedReference, 2, 3),
            Diagnostic::new(Severity::Warning, DiagnosticKind::Warning, 0, 1),
        ]))
    }

    #[test]
    fn declines_files_without_collectors() {
        let (_, visitor, _) = setup();
        let mut b = TreeBuilder::new("BUILD", FileKind::BuildFile, ProjectId::new("p"));
        b.token("x");
        let build = b.finish();
        assert!(!visitor.fresh().suitable_for_file(&build));
        assert!(visitor.fresh().suitable_for_file(&java_file()));
    }

    #[test]
    fn whole_file_pass_forwards_matching_kinds() {
        let (seen, visitor, _) = setup();
        let file = java_file();
        let mut visitor = visitor.fresh();
        assert!(visitor.suitable_for_file(&file));

        let accepted = visitor.analyze(&file, true, holder(), |v| {
            assert!(v.is_collecting());
            for node in file.preorder() {
                v.visit(&node);
            }
        });

        assert!(accepted);
        assert!(!visitor.is_collecting());
        let seen = seen.0.lock();
        assert_eq!(seen.len(), file.node_count());
        assert!(seen
            .iter()
            .all(|(_, k)| *k == DiagnosticKind::UnresolvedReference));
        assert_eq!(seen[0].0, "a.b");
    }

    #[test]
    fn partial_pass_runs_but_forwards_nothing() {
        let (seen, visitor, _) = setup();
        let file = java_file();
        let mut visitor = visitor.fresh();
        assert!(visitor.suitable_for_file(&file));

        let mut ran = false;
        assert!(visitor.analyze(&file, false, holder(), |v| {
            ran = true;
            for node in file.preorder() {
                v.visit(&node);
            }
        }));
        assert!(ran);
        assert!(seen.0.lock().is_empty());
    }

    #[test]
    fn disabled_visitor_declines_and_forwards_nothing() {
        let (seen, visitor, flags) = setup();
        flags.set(Experiment::HighlightVisitor, false);
        let file = java_file();
        let mut visitor = visitor.fresh();
        assert!(!visitor.suitable_for_file(&file));
        assert!(visitor.analyze(&file, true, holder(), |v| {
            for node in file.preorder() {
                v.visit(&node);
            }
        }));
        assert!(seen.0.lock().is_empty());
    }

    #[test]
    fn holder_is_released_when_traversal_unwinds() {
        let (_, visitor, _) = setup();
        let file = java_file();
        let mut visitor = visitor.fresh();
        assert!(visitor.suitable_for_file(&file));

        let result = catch_unwind(AssertUnwindSafe(|| {
            visitor.analyze(&file, true, holder(), |_| panic!("host traversal failed"));
        }));
        assert!(result.is_err());
        assert!(!visitor.is_collecting());
    }

    #[test]
    fn cancellation_stops_forwarding() {
        let (seen, visitor, _) = setup();
        let cancel = CancellationFlag::new();
        let file = java_file();
        let mut visitor = visitor.with_cancellation(cancel.clone()).fresh();
        assert!(visitor.suitable_for_file(&file));

        visitor.analyze(&file, true, holder(), |v| {
            let nodes = file.preorder();
            v.visit(&nodes[0]);
            cancel.cancel();
            for node in &nodes[1..] {
                v.visit(node);
            }
        });
        assert_eq!(seen.0.lock().len(), 1);
    }
}
