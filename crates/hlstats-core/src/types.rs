//! Core value types for diagnostics, highlight records and telemetry batches.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

/// Severity of a host diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Severity {
    /// Informational annotation, not shown as a problem.
    Information,
    /// Weak warning, usually rendered as a subtle underline.
    WeakWarning,
    /// Warning that should be addressed.
    Warning,
    /// Error that breaks compilation.
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Information => write!(f, "information"),
            Self::WeakWarning => write!(f, "weak-warning"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Kind of a host diagnostic, as reported by the highlighting pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticKind {
    /// Generic error.
    Error,
    /// Generic warning.
    Warning,
    /// Generic weak warning.
    WeakWarning,
    /// Informational annotation.
    Information,
    /// Reference that the host could not resolve.
    UnresolvedReference,
    /// Declared symbol that is never used.
    UnusedSymbol,
    /// Use of a deprecated symbol.
    Deprecated,
}

impl DiagnosticKind {
    /// Returns the kebab-case identifier of this kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::WeakWarning => "weak-warning",
            Self::Information => "information",
            Self::UnresolvedReference => "unresolved-reference",
            Self::UnusedSymbol => "unused-symbol",
            Self::Deprecated => "deprecated",
        }
    }
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of a source file, as classified by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileKind {
    /// Java source file.
    JavaSource,
    /// Kotlin source file.
    KotlinSource,
    /// XML file (layouts, manifests, resource values).
    Xml,
    /// Build file of the underlying build system.
    BuildFile,
    /// Anything else.
    Other,
}

/// Mode of a build-graph synchronisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncMode {
    /// Sync run when the project is opened.
    Startup,
    /// Incremental sync of changed targets.
    Incremental,
    /// Full rebuild of the project model.
    Full,
    /// Sync that only refreshes the project view, without building.
    NoBuild,
    /// Sync of a subset of targets.
    Partial,
}

impl std::fmt::Display for SyncMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Startup => write!(f, "startup"),
            Self::Incremental => write!(f, "incremental"),
            Self::Full => write!(f, "full"),
            Self::NoBuild => write!(f, "no-build"),
            Self::Partial => write!(f, "partial"),
        }
    }
}

/// Outcome of a build-graph synchronisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncResult {
    /// Sync completed without errors.
    Success,
    /// Sync completed, but some targets failed.
    PartialSuccess,
    /// Sync was cancelled by the user.
    Cancelled,
    /// Sync failed.
    Failure,
}

impl std::fmt::Display for SyncResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::PartialSuccess => write!(f, "partial-success"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Failure => write!(f, "failure"),
        }
    }
}

/// Identity of an open project.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub String);

impl ProjectId {
    /// Creates a project identity from its name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl std::fmt::Display for ProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

static NEXT_FILE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of an opened source file.
///
/// Two sessions on the same path get distinct ids, so per-file state never
/// leaks across a close/reopen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(pub u64);

impl FileId {
    /// Allocates a fresh, process-unique file identity.
    #[must_use]
    pub fn fresh() -> Self {
        Self(NEXT_FILE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for FileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A diagnostic produced by the host's highlighting pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity of the diagnostic.
    pub severity: Severity,
    /// Kind of the diagnostic.
    pub kind: DiagnosticKind,
    /// Start offset in the file, inclusive.
    pub start_offset: usize,
    /// End offset in the file, exclusive.
    pub end_offset: usize,
    /// Human-readable description, if the host supplied one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Diagnostic {
    /// Creates a new diagnostic over `start_offset..end_offset`.
    #[must_use]
    pub fn new(
        severity: Severity,
        kind: DiagnosticKind,
        start_offset: usize,
        end_offset: usize,
    ) -> Self {
        Self {
            severity,
            kind,
            start_offset,
            end_offset: end_offset.max(start_offset),
            description: None,
        }
    }

    /// Attaches a description to this diagnostic.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Immutable snapshot of one diagnostic accepted by a collector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RecordFields")]
pub struct HighlightRecord {
    text: String,
    severity: Severity,
    kind: DiagnosticKind,
    start_offset: usize,
    end_offset: usize,
}

/// Wire form of [`HighlightRecord`]; converted through
/// [`HighlightRecord::new`] so the offset clamp also applies when reading.
#[derive(Deserialize)]
struct RecordFields {
    text: String,
    severity: Severity,
    kind: DiagnosticKind,
    start_offset: usize,
    end_offset: usize,
}

impl From<RecordFields> for HighlightRecord {
    fn from(f: RecordFields) -> Self {
        Self::new(f.text, f.severity, f.kind, f.start_offset, f.end_offset)
    }
}

impl HighlightRecord {
    /// Creates a record; `end_offset` is clamped to be at least `start_offset`.
    #[must_use]
    pub fn new(
        text: impl Into<String>,
        severity: Severity,
        kind: DiagnosticKind,
        start_offset: usize,
        end_offset: usize,
    ) -> Self {
        Self {
            text: text.into(),
            severity,
            kind,
            start_offset,
            end_offset: end_offset.max(start_offset),
        }
    }

    /// Creates a record for `diagnostic`, labelled with `text`.
    #[must_use]
    pub fn from_diagnostic(text: impl Into<String>, diagnostic: &Diagnostic) -> Self {
        Self::new(
            text,
            diagnostic.severity,
            diagnostic.kind,
            diagnostic.start_offset,
            diagnostic.end_offset,
        )
    }

    /// Text of the expression the diagnostic refers to.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Severity of the original diagnostic.
    #[must_use]
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Kind of the original diagnostic.
    #[must_use]
    pub fn kind(&self) -> DiagnosticKind {
        self.kind
    }

    /// Start offset of the original diagnostic.
    #[must_use]
    pub fn start_offset(&self) -> usize {
        self.start_offset
    }

    /// End offset of the original diagnostic.
    #[must_use]
    pub fn end_offset(&self) -> usize {
        self.end_offset
    }
}

impl std::fmt::Display for HighlightRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}..{}: {} [{}] {}",
            self.start_offset, self.end_offset, self.severity, self.kind, self.text
        )
    }
}

/// Records observed in one file, in observation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileHighlights {
    /// Path of the file when the first record was taken.
    pub path: PathBuf,
    /// Records in the order they were observed.
    pub highlights: Vec<HighlightRecord>,
}

impl FileHighlights {
    /// Creates an empty bucket for the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            highlights: Vec::new(),
        }
    }
}

/// Per-file highlight buckets, keyed by file identity.
pub type PerFileHighlights = BTreeMap<FileId, FileHighlights>;

/// Type tag of a telemetry batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HighlightStatsKind {
    /// Unresolved references to Android `R.<type>.<name>` accessors.
    AndroidResourceMissingRef,
}

impl std::fmt::Display for HighlightStatsKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AndroidResourceMissingRef => write!(f, "ANDROID_RESOURCE_MISSING_REF"),
        }
    }
}

/// Aggregated highlight statistics for one project, emitted as one telemetry batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightStats {
    /// Type tag of this batch.
    pub kind: HighlightStatsKind,
    /// Project the statistics were collected in.
    pub project: ProjectId,
    /// Mode of the last sync seen before the batch was taken.
    pub last_sync_mode: SyncMode,
    /// Result of the last completed sync.
    pub last_sync_result: SyncResult,
    /// Records grouped by file.
    pub file_to_highlights: PerFileHighlights,
}

impl HighlightStats {
    /// Total number of records across all files.
    #[must_use]
    pub fn highlight_count(&self) -> usize {
        self.file_to_highlights
            .values()
            .map(|f| f.highlights.len())
            .sum()
    }

    /// Formats a one-line summary of this batch.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{} project={} sync={}/{} files={} highlights={}",
            self.kind,
            self.project,
            self.last_sync_mode,
            self.last_sync_result,
            self.file_to_highlights.len(),
            self.highlight_count()
        )
    }
}
