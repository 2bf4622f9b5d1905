//! Integration test: host pass → visitor → registry → collectors.
//!
//! Simulates the host driving several files through fresh visitors the way
//! a highlighting pass does, with collectors that only want some kinds.

use hlstats_core::tree::{InMemoryFile, TreeBuilder};
use hlstats_core::{
    CollectorRegistry, Diagnostic, DiagnosticBuffer, DiagnosticKind, FeatureFlags, FileKind,
    HighlightStatsCollector, HighlightVisitor, ProjectId, Severity, SourceFile, SyntaxNode,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct KindCounter {
    name: &'static str,
    files: Vec<FileKind>,
    kinds: Vec<DiagnosticKind>,
    count: AtomicUsize,
}

impl KindCounter {
    fn new(name: &'static str, files: Vec<FileKind>, kinds: Vec<DiagnosticKind>) -> Arc<Self> {
        Arc::new(Self {
            name,
            files,
            kinds,
            count: AtomicUsize::new(0),
        })
    }

    fn count(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }
}

impl HighlightStatsCollector for KindCounter {
    fn name(&self) -> &'static str {
        self.name
    }
    fn supported_file_kinds(&self) -> Vec<FileKind> {
        self.files.clone()
    }
    fn supported_diagnostic_kinds(&self) -> Vec<DiagnosticKind> {
        self.kinds.clone()
    }
    fn record(&self, _node: &dyn SyntaxNode, _diagnostic: &Diagnostic) {
        self.count.fetch_add(1, Ordering::Relaxed);
    }
}

fn file(path: &str, kind: FileKind) -> InMemoryFile {
    let mut b = TreeBuilder::new(path, kind, ProjectId::new("app"));
    b.start_node();
    b.token("call(");
    b.reference_expression("x.y");
    b.token(");");
    b.finish_node();
    b.finish()
}

/// Runs one whole-file pass; returns false if the visitor declined the file.
fn run_pass(template: &HighlightVisitor, file: &InMemoryFile, diags: Vec<Diagnostic>) -> bool {
    let mut visitor = template.fresh();
    if !visitor.suitable_for_file(file) {
        return false;
    }
    let holder = Arc::new(DiagnosticBuffer::from_diagnostics(diags));
    visitor.analyze(file, true, holder, |v| {
        // One visited node forwards each held diagnostic exactly once.
        if let Some(node) = file.element_at(0) {
            v.visit(node.as_ref());
        }
    })
}

#[test]
fn routes_each_kind_to_its_collectors() {
    let unresolved = KindCounter::new(
        "unresolved",
        vec![FileKind::JavaSource],
        vec![DiagnosticKind::UnresolvedReference],
    );
    let errors = KindCounter::new(
        "errors",
        vec![FileKind::JavaSource, FileKind::KotlinSource],
        vec![DiagnosticKind::Error, DiagnosticKind::UnresolvedReference],
    );
    let registry = Arc::new(
        CollectorRegistry::builder()
            .collector_ref(unresolved.clone())
            .collector_ref(errors.clone())
            .build(),
    );
    let template = HighlightVisitor::new(registry, Arc::new(FeatureFlags::new()));

    let diags = vec![
        Diagnostic::new(Severity::Error, DiagnosticKind::UnresolvedReference, 7, 8),
        Diagnostic::new(Severity::Error, DiagnosticKind::Error, 0, 4),
        Diagnostic::new(Severity::Warning, DiagnosticKind::Deprecated, 0, 4),
    ];

    assert!(run_pass(&template, &file("A.java", FileKind::JavaSource), diags.clone()));
    assert_eq!(unresolved.count(), 1);
    assert_eq!(errors.count(), 2);

    assert!(run_pass(&template, &file("B.kt", FileKind::KotlinSource), diags.clone()));
    assert_eq!(unresolved.count(), 1, "kotlin files are not for this collector");
    assert_eq!(errors.count(), 4);

    assert!(!run_pass(&template, &file("c.xml", FileKind::Xml), diags));
    assert_eq!(errors.count(), 4);
}

#[test]
fn empty_registry_declines_everything() {
    let template = HighlightVisitor::new(
        Arc::new(CollectorRegistry::builder().build()),
        Arc::new(FeatureFlags::new()),
    );
    assert!(!run_pass(&template, &file("A.java", FileKind::JavaSource), Vec::new()));
}
