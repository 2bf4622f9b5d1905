//! Collector trait for consuming host diagnostics.

use crate::host::{SourceFile, SyntaxNode};
use crate::types::{Diagnostic, DiagnosticKind, FileKind};

use std::sync::Arc;

/// A pluggable consumer of highlighting diagnostics.
///
/// Every method may be called several times for the same file during one
/// pass, so implementations must tolerate repeats.
///
/// # Example
///
/// ```ignore
/// use hlstats_core::{Diagnostic, DiagnosticKind, FileKind, HighlightStatsCollector};
///
/// pub struct CountErrors(AtomicUsize);
///
/// impl HighlightStatsCollector for CountErrors {
///     fn name(&self) -> &'static str { "count-errors" }
///     fn supported_file_kinds(&self) -> Vec<FileKind> { vec![FileKind::JavaSource] }
///     fn supported_diagnostic_kinds(&self) -> Vec<DiagnosticKind> { vec![DiagnosticKind::Error] }
///
///     fn record(&self, _node: &dyn SyntaxNode, _diagnostic: &Diagnostic) {
///         self.0.fetch_add(1, Ordering::Relaxed);
///     }
/// }
/// ```
pub trait HighlightStatsCollector: Send + Sync {
    /// Returns the kebab-case name of this collector.
    fn name(&self) -> &'static str;

    /// File kinds this collector is interested in.
    fn supported_file_kinds(&self) -> Vec<FileKind>;

    /// Diagnostic kinds this collector is interested in.
    ///
    /// May change at runtime, e.g. when a feature flag is flipped.
    fn supported_diagnostic_kinds(&self) -> Vec<DiagnosticKind>;

    /// Coarse per-file filter.
    ///
    /// If this returns false, no diagnostic of `file` reaches [`Self::record`]
    /// during the current pass.
    fn can_process_file(&self, file: &dyn SourceFile) -> bool {
        self.supported_file_kinds().contains(&file.kind())
    }

    /// Fine-grained gate, called after [`Self::can_process_file`] accepted the
    /// containing file.
    fn can_process_diagnostic(&self, _node: &dyn SyntaxNode, diagnostic: &Diagnostic) -> bool {
        self.supported_diagnostic_kinds().contains(&diagnostic.kind)
    }

    /// Consumes one diagnostic reported on `node`.
    ///
    /// Runs on the host's analysis thread under its read privilege, so it
    /// must not block.
    fn record(&self, node: &dyn SyntaxNode, diagnostic: &Diagnostic);
}

/// Shared handle to a collector.
pub type CollectorRef = Arc<dyn HighlightStatsCollector>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::TreeBuilder;
    use crate::types::{ProjectId, Severity};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountErrors(AtomicUsize);

    impl HighlightStatsCollector for CountErrors {
        fn name(&self) -> &'static str {
            "count-errors"
        }

        fn supported_file_kinds(&self) -> Vec<FileKind> {
            vec![FileKind::JavaSource]
        }

        fn supported_diagnostic_kinds(&self) -> Vec<DiagnosticKind> {
            vec![DiagnosticKind::Error]
        }

        fn record(&self, _node: &dyn SyntaxNode, _diagnostic: &Diagnostic) {
            self.0.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[test]
    fn default_filters_use_declared_kinds() {
        let collector = CountErrors(AtomicUsize::new(0));
        let mut b = TreeBuilder::new("A.java", FileKind::JavaSource, ProjectId::new("p"));
        b.token("x");
        let java = b.finish();
        let mut b = TreeBuilder::new("a.xml", FileKind::Xml, ProjectId::new("p"));
        b.token("<a/>");
        let xml = b.finish();

        assert!(collector.can_process_file(&java));
        assert!(!collector.can_process_file(&xml));

        let node = java.roots()[0].clone();
        let error = Diagnostic::new(Severity::Error, DiagnosticKind::Error, 0, 1);
        let warning = Diagnostic::new(Severity::Warning, DiagnosticKind::Warning, 0, 1);
        assert!(collector.can_process_diagnostic(&node, &error));
        assert!(!collector.can_process_diagnostic(&node, &warning));

        collector.record(&node, &error);
        assert_eq!(collector.0.load(Ordering::Relaxed), 1);
    }
}
