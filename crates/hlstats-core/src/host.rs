//! Capability traits the host editor provides to collectors.
//!
//! Collectors see the host only through these traits. A real integration
//! wraps the editor's syntax tree and project model; tests and the replay
//! CLI use [`crate::tree`].

use crate::types::{Diagnostic, FileId, FileKind, ProjectId, SyncMode, SyncResult};

use parking_lot::RwLock;
use std::borrow::Cow;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared handle to a syntax node.
pub type NodeRef = Arc<dyn SyntaxNode>;

/// Shared handle to a source file.
pub type FileRef = Arc<dyn SourceFile>;

/// A node of the host's syntax tree.
///
/// Only the three capabilities needed to recognise expressions are exposed.
pub trait SyntaxNode: Send + Sync {
    /// Source text covered by this node.
    fn text(&self) -> Cow<'_, str>;

    /// Parent node, or `None` at the root.
    fn parent(&self) -> Option<NodeRef>;

    /// File this node belongs to.
    fn containing_file(&self) -> FileRef;
}

/// A source file open in the host.
pub trait SourceFile: Send + Sync {
    /// Identity of this file session.
    fn id(&self) -> FileId;

    /// Path of the file.
    fn path(&self) -> &Path;

    /// Kind of the file.
    fn kind(&self) -> FileKind;

    /// Project the file belongs to.
    fn project(&self) -> ProjectId;

    /// Innermost node covering `offset`, if any.
    fn element_at(&self, offset: usize) -> Option<NodeRef>;
}

/// The host's per-pass diagnostic container.
///
/// The host keeps adding diagnostics while a pass runs, so readers index
/// into it instead of taking a slice.
pub trait DiagnosticHolder: Send + Sync {
    /// Number of diagnostics currently held.
    fn len(&self) -> usize;

    /// Diagnostic at `index`, if still present.
    fn get(&self, index: usize) -> Option<Diagnostic>;

    /// Returns true if no diagnostics are held.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A growable [`DiagnosticHolder`] backed by a vector.
#[derive(Debug, Default)]
pub struct DiagnosticBuffer {
    diagnostics: RwLock<Vec<Diagnostic>>,
}

impl DiagnosticBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a buffer holding `diagnostics`.
    #[must_use]
    pub fn from_diagnostics(diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            diagnostics: RwLock::new(diagnostics),
        }
    }

    /// Appends a diagnostic.
    pub fn push(&self, diagnostic: Diagnostic) {
        self.diagnostics.write().push(diagnostic);
    }

    /// Removes every diagnostic.
    pub fn clear(&self) {
        self.diagnostics.write().clear();
    }
}

impl DiagnosticHolder for DiagnosticBuffer {
    fn len(&self) -> usize {
        self.diagnostics.read().len()
    }

    fn get(&self, index: usize) -> Option<Diagnostic> {
        self.diagnostics.read().get(index).cloned()
    }
}

/// Receives build-graph synchronisation events.
pub trait SyncListener: Send + Sync {
    /// Called when a sync starts for `project`.
    fn on_sync_start(&self, project: &ProjectId, mode: SyncMode);

    /// Called when a sync finishes for `project`.
    fn on_sync_complete(&self, project: &ProjectId, mode: SyncMode, result: SyncResult);
}

/// Receives project open/close events.
pub trait ProjectLifecycleListener: Send + Sync {
    /// Called after `project` is opened.
    fn project_opened(&self, project: &ProjectId);

    /// Called before `project` is closed.
    fn project_closing(&self, project: &ProjectId);
}

/// Cancellation signal raised by the host between analysis steps.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    /// Creates a flag that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the flag. Every clone observes it.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Lowers the flag, for reuse across passes.
    pub fn reset(&self) {
        self.0.store(false, Ordering::Release);
    }

    /// Returns true once [`Self::cancel`] was called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}
