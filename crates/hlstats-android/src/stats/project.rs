//! Per-project aggregation of unresolved resource references.

use crate::resource_expr::find_resource_expression;

use hlstats_core::{
    CancellationFlag, Diagnostic, FileHighlights, HighlightRecord, HighlightStats,
    HighlightStatsKind, PerFileHighlights, ProjectId, SourceFile, SyncMode, SyncResult,
    SyntaxNode, TelemetrySink,
};

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Default)]
struct StatsState {
    file_to_highlights: PerFileHighlights,
    last_sync_mode: Option<SyncMode>,
    last_sync_result: Option<SyncResult>,
}

impl StatsState {
    fn snapshot(&self, project: &ProjectId) -> Option<HighlightStats> {
        if self.file_to_highlights.is_empty() {
            return None;
        }
        Some(HighlightStats {
            kind: HighlightStatsKind::AndroidResourceMissingRef,
            project: project.clone(),
            last_sync_mode: self.last_sync_mode?,
            last_sync_result: self.last_sync_result?,
            file_to_highlights: self.file_to_highlights.clone(),
        })
    }
}

/// Unresolved `R.<type>.<name>` references seen in one project since the
/// last sync started.
///
/// All methods take `&self`; the state is guarded by a single lock so that
/// analysis threads and sync notifications can race safely.
pub struct ProjectUnresolvedResourceStats {
    project: ProjectId,
    sink: Arc<dyn TelemetrySink>,
    state: Mutex<StatsState>,
}

impl ProjectUnresolvedResourceStats {
    /// Creates an empty aggregator for `project`, emitting to `sink`.
    #[must_use]
    pub fn new(project: ProjectId, sink: Arc<dyn TelemetrySink>) -> Self {
        Self {
            project,
            sink,
            state: Mutex::new(StatsState::default()),
        }
    }

    /// Project this aggregator belongs to.
    #[must_use]
    pub fn project(&self) -> &ProjectId {
        &self.project
    }

    /// Returns true if `file` has no records yet.
    ///
    /// Files already recorded since the last sync are not analysed again.
    #[must_use]
    pub fn will_accept(&self, file: &dyn SourceFile) -> bool {
        !self.state.lock().file_to_highlights.contains_key(&file.id())
    }

    /// Records `diagnostic` if `node` is part of an `R.<type>.<name>`
    /// accessor. Returns true if a record was added.
    pub fn record(&self, node: &dyn SyntaxNode, diagnostic: &Diagnostic) -> bool {
        let Some(expression) = find_resource_expression(node) else {
            return false;
        };
        let record = HighlightRecord::from_diagnostic(expression.text(), diagnostic);
        let file = node.containing_file();

        let mut state = self.state.lock();
        state
            .file_to_highlights
            .entry(file.id())
            .or_insert_with(|| FileHighlights::new(file.path()))
            .highlights
            .push(record);
        true
    }

    /// Records every diagnostic of `file`, resolving each to the node at its
    /// start offset. Stops early if `cancellation` is raised.
    ///
    /// Returns the number of records added.
    pub fn record_all(
        &self,
        file: &dyn SourceFile,
        diagnostics: &[Diagnostic],
        cancellation: &CancellationFlag,
    ) -> usize {
        let mut added = 0;
        for diagnostic in diagnostics {
            if cancellation.is_cancelled() {
                debug!("Recording highlights of {} cancelled", file.path().display());
                break;
            }
            if let Some(node) = file.element_at(diagnostic.start_offset) {
                if self.record(node.as_ref(), diagnostic) {
                    added += 1;
                }
            }
        }
        added
    }

    /// Emits the current records, then starts a new collection window.
    pub fn on_sync_start(&self, mode: SyncMode) {
        let stats = {
            let mut state = self.state.lock();
            let stats = state.snapshot(&self.project);
            state.file_to_highlights.clear();
            state.last_sync_mode = Some(mode);
            state.last_sync_result = None;
            stats
        };
        self.emit(stats);
    }

    /// Remembers the outcome of the sync that just finished.
    pub fn on_sync_complete(&self, mode: SyncMode, result: SyncResult) {
        let mut state = self.state.lock();
        state.last_sync_mode = Some(mode);
        state.last_sync_result = Some(result);
    }

    /// Emits a copy of the current records without clearing them.
    ///
    /// Nothing is emitted if there are no records or no sync has completed
    /// yet. Returns true if a batch was handed to the sink.
    pub fn flush(&self) -> bool {
        let stats = self.state.lock().snapshot(&self.project);
        self.emit(stats)
    }

    /// Current records, if a batch would be emitted now.
    #[must_use]
    pub fn stats(&self) -> Option<HighlightStats> {
        self.state.lock().snapshot(&self.project)
    }

    /// Number of records across all files.
    #[must_use]
    pub fn highlight_count(&self) -> usize {
        self.state
            .lock()
            .file_to_highlights
            .values()
            .map(|f| f.highlights.len())
            .sum()
    }

    /// Number of files with at least one record.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.state.lock().file_to_highlights.len()
    }

    /// Mode of the last sync seen.
    #[must_use]
    pub fn last_sync_mode(&self) -> Option<SyncMode> {
        self.state.lock().last_sync_mode
    }

    /// Result of the last completed sync, or `None` while one is running.
    #[must_use]
    pub fn last_sync_result(&self) -> Option<SyncResult> {
        self.state.lock().last_sync_result
    }

    fn emit(&self, stats: Option<HighlightStats>) -> bool {
        let Some(stats) = stats else {
            return false;
        };
        debug!("Emitting {}", stats.summary());
        if let Err(e) = self.sink.log_highlight_stats(stats) {
            warn!(
                "Dropping unresolved resource stats for {}: {}",
                self.project, e
            );
        }
        true
    }
}

impl std::fmt::Debug for ProjectUnresolvedResourceStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectUnresolvedResourceStats")
            .field("project", &self.project)
            .field("state", &*self.state.lock())
            .finish_non_exhaustive()
    }
}
