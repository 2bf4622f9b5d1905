//! Collector routing unresolved resource references to per-project aggregators.

use super::project::ProjectUnresolvedResourceStats;

use hlstats_core::{
    Diagnostic, DiagnosticKind, Experiment, FeatureFlags, FileKind, HighlightStatsCollector,
    ProjectId, ProjectLifecycleListener, SourceFile, SyncListener, SyncMode, SyncResult,
    SyntaxNode, TelemetrySink,
};

use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// Collects unresolved references to `R.<type>.<name>` accessors in Java
/// sources, one aggregator per open project.
///
/// Gated by [`Experiment::UnresolvedResourceStats`]. Projects that were never
/// announced through [`ProjectLifecycleListener::project_opened`] get an
/// aggregator on first use. Once a project is closing, late events for it are
/// dropped until it is opened again.
pub struct UnresolvedResourceStatsCollector {
    flags: Arc<FeatureFlags>,
    sink: Arc<dyn TelemetrySink>,
    projects: Mutex<Projects>,
}

#[derive(Default)]
struct Projects {
    live: HashMap<ProjectId, Arc<ProjectUnresolvedResourceStats>>,
    closed: HashSet<ProjectId>,
}

impl UnresolvedResourceStatsCollector {
    /// Name reported through [`HighlightStatsCollector::name`].
    pub const NAME: &'static str = "unresolved-resource-stats";

    /// Creates a collector emitting batches to `sink`.
    #[must_use]
    pub fn new(flags: Arc<FeatureFlags>, sink: Arc<dyn TelemetrySink>) -> Self {
        Self {
            flags,
            sink,
            projects: Mutex::new(Projects::default()),
        }
    }

    fn enabled(&self) -> bool {
        self.flags.is_enabled(Experiment::UnresolvedResourceStats)
    }

    /// Aggregator of `project`, if one exists.
    #[must_use]
    pub fn project_stats(&self, project: &ProjectId) -> Option<Arc<ProjectUnresolvedResourceStats>> {
        self.projects.lock().live.get(project).cloned()
    }

    /// Projects with a live aggregator, sorted by name.
    #[must_use]
    pub fn projects(&self) -> Vec<ProjectId> {
        let mut projects: Vec<ProjectId> = self.projects.lock().live.keys().cloned().collect();
        projects.sort();
        projects
    }

    fn stats_for(&self, project: &ProjectId) -> Option<Arc<ProjectUnresolvedResourceStats>> {
        let mut projects = self.projects.lock();
        if projects.closed.contains(project) {
            return None;
        }
        let stats = projects.live.entry(project.clone()).or_insert_with(|| {
            Arc::new(ProjectUnresolvedResourceStats::new(
                project.clone(),
                Arc::clone(&self.sink),
            ))
        });
        Some(Arc::clone(stats))
    }
}

impl HighlightStatsCollector for UnresolvedResourceStatsCollector {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn supported_file_kinds(&self) -> Vec<FileKind> {
        vec![FileKind::JavaSource]
    }

    fn supported_diagnostic_kinds(&self) -> Vec<DiagnosticKind> {
        if self.enabled() {
            vec![DiagnosticKind::UnresolvedReference]
        } else {
            Vec::new()
        }
    }

    fn can_process_file(&self, file: &dyn SourceFile) -> bool {
        self.enabled()
            && file.kind() == FileKind::JavaSource
            && self
                .stats_for(&file.project())
                .is_some_and(|stats| stats.will_accept(file))
    }

    fn can_process_diagnostic(&self, _node: &dyn SyntaxNode, diagnostic: &Diagnostic) -> bool {
        self.enabled() && diagnostic.kind == DiagnosticKind::UnresolvedReference
    }

    fn record(&self, node: &dyn SyntaxNode, diagnostic: &Diagnostic) {
        if !self.enabled() {
            return;
        }
        let project = node.containing_file().project();
        if let Some(stats) = self.stats_for(&project) {
            stats.record(node, diagnostic);
        }
    }
}

impl SyncListener for UnresolvedResourceStatsCollector {
    fn on_sync_start(&self, project: &ProjectId, mode: SyncMode) {
        if !self.enabled() {
            return;
        }
        if let Some(stats) = self.stats_for(project) {
            stats.on_sync_start(mode);
        }
    }

    fn on_sync_complete(&self, project: &ProjectId, mode: SyncMode, result: SyncResult) {
        if !self.enabled() {
            return;
        }
        if let Some(stats) = self.stats_for(project) {
            stats.on_sync_complete(mode, result);
        }
    }
}

impl ProjectLifecycleListener for UnresolvedResourceStatsCollector {
    fn project_opened(&self, project: &ProjectId) {
        if !self.enabled() {
            return;
        }
        debug!("Tracking unresolved resource references in {}", project);
        self.projects.lock().closed.remove(project);
        self.stats_for(project);
    }

    fn project_closing(&self, project: &ProjectId) {
        if !self.enabled() {
            return;
        }
        let removed = {
            let mut projects = self.projects.lock();
            projects.closed.insert(project.clone());
            projects.live.remove(project)
        };
        if let Some(stats) = removed {
            stats.flush();
        }
    }
}

impl std::fmt::Debug for UnresolvedResourceStatsCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnresolvedResourceStatsCollector")
            .field("projects", &self.projects())
            .finish_non_exhaustive()
    }
}
