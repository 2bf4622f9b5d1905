//! Replay command implementation.
//!
//! A trace is a TOML file with a default `project` and a list of `events`.
//! Highlight events describe a Java file as a list of references; the file
//! is built in memory and run through a whole-file pass the way the host
//! would run it.

use anyhow::{bail, Context, Result};
use hlstats::android::{EverythingScope, LightRClass, LightResourceClassService, Module, ModuleScope};
use hlstats::tree::{InMemoryFile, TreeBuilder};
use hlstats::{
    default_collectors, DefaultCollectors, Diagnostic, DiagnosticBuffer, DiagnosticKind,
    Experiment, FeatureFlags, FileKind, HighlightStats, HighlightVisitor, MemorySink, ProjectId,
    ProjectLifecycleListener, Severity, SyncListener, SyncMode, SyncResult,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::OutputFormat;

/// A recorded sequence of host events.
#[derive(Debug, Deserialize)]
pub struct Trace {
    /// Project used by events that do not name one.
    #[serde(default = "default_project")]
    pub project: String,
    /// Events, in the order the host emitted them.
    #[serde(default)]
    pub events: Vec<Event>,
}

fn default_project() -> String {
    "default".to_string()
}

fn default_file_kind() -> FileKind {
    FileKind::JavaSource
}

impl Trace {
    /// Parses a trace from TOML.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid trace")
    }
}

/// One host event.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Event {
    /// A project was opened.
    ProjectOpened { project: Option<String> },
    /// A project is about to close.
    ProjectClosing { project: Option<String> },
    /// A sync started.
    SyncStart {
        project: Option<String>,
        mode: SyncMode,
    },
    /// A sync finished; resource classes, if any, are installed first.
    SyncComplete {
        project: Option<String>,
        mode: SyncMode,
        result: SyncResult,
        #[serde(default)]
        classes: Vec<ClassDef>,
        #[serde(default)]
        workspace_packages: Vec<String>,
    },
    /// A whole-file highlighting pass.
    Highlight {
        project: Option<String>,
        path: PathBuf,
        #[serde(default = "default_file_kind")]
        kind: FileKind,
        #[serde(default)]
        references: Vec<ReferenceDef>,
    },
    /// A resolver lookup; without `modules` the scope covers everything.
    Lookup {
        name: String,
        modules: Option<Vec<String>>,
    },
    /// An experiment flipped at runtime.
    SetFlag { key: String, enabled: bool },
}

/// A resource class produced by a sync.
#[derive(Debug, Deserialize)]
pub struct ClassDef {
    /// Package declaring the class.
    pub package: String,
    /// Module owning the class.
    pub module: String,
}

/// A qualified reference written in a highlighted file.
#[derive(Debug, Deserialize)]
pub struct ReferenceDef {
    /// The reference, e.g. `R.string.app_name`.
    pub text: String,
    /// Whether the host reports it as unresolved.
    #[serde(default)]
    pub unresolved: bool,
}

/// Outcome of one lookup event.
#[derive(Debug, Serialize)]
pub struct LookupOutcome {
    /// Qualified name looked up.
    pub name: String,
    /// Classes returned.
    pub classes: Vec<LightRClass>,
}

/// Everything a replay produced.
#[derive(Debug, Default, Serialize)]
pub struct ReplayReport {
    /// Telemetry batches, in emission order.
    pub batches: Vec<HighlightStats>,
    /// Lookup results, in event order.
    pub lookups: Vec<LookupOutcome>,
    /// Files the visitor accepted.
    pub files_highlighted: usize,
    /// Files the visitor declined.
    pub files_skipped: usize,
}

/// Runs the replay command.
pub fn run(path: &Path, format: OutputFormat, flags: FeatureFlags) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read trace: {}", path.display()))?;
    let trace = Trace::parse(&content)
        .with_context(|| format!("Failed to parse trace: {}", path.display()))?;

    tracing::info!(
        "Replaying {} event(s) from {}",
        trace.events.len(),
        path.display()
    );

    let report = replay(&trace, Arc::new(flags))?;
    super::output::print(&report, format)
}

/// Drives every event of `trace` through a fresh pipeline.
pub fn replay(trace: &Trace, flags: Arc<FeatureFlags>) -> Result<ReplayReport> {
    let mut replayer = Replayer::new(ProjectId::new(&trace.project), flags);
    for (i, event) in trace.events.iter().enumerate() {
        replayer
            .apply(event)
            .with_context(|| format!("Event {} failed", i + 1))?;
    }
    Ok(replayer.finish())
}

struct Replayer {
    default_project: ProjectId,
    flags: Arc<FeatureFlags>,
    sink: Arc<MemorySink>,
    collectors: DefaultCollectors,
    visitor: HighlightVisitor,
    service: LightResourceClassService,
    report: ReplayReport,
}

impl Replayer {
    fn new(default_project: ProjectId, flags: Arc<FeatureFlags>) -> Self {
        let sink = Arc::new(MemorySink::new());
        let collectors = default_collectors(Arc::clone(&flags), sink.clone());
        let visitor = HighlightVisitor::new(Arc::new(collectors.registry()), Arc::clone(&flags));
        let service = LightResourceClassService::new(Arc::clone(&flags));
        Self {
            default_project,
            flags,
            sink,
            collectors,
            visitor,
            service,
            report: ReplayReport::default(),
        }
    }

    fn project(&self, project: Option<&String>) -> ProjectId {
        project.map_or_else(|| self.default_project.clone(), ProjectId::new)
    }

    fn apply(&mut self, event: &Event) -> Result<()> {
        match event {
            Event::ProjectOpened { project } => {
                let project = self.project(project.as_ref());
                for listener in self.collectors.lifecycle_listeners() {
                    listener.project_opened(&project);
                }
            }
            Event::ProjectClosing { project } => {
                let project = self.project(project.as_ref());
                for listener in self.collectors.lifecycle_listeners() {
                    listener.project_closing(&project);
                }
            }
            Event::SyncStart { project, mode } => {
                let project = self.project(project.as_ref());
                for listener in self.collectors.sync_listeners() {
                    listener.on_sync_start(&project, *mode);
                }
            }
            Event::SyncComplete {
                project,
                mode,
                result,
                classes,
                workspace_packages,
            } => {
                if !classes.is_empty() || !workspace_packages.is_empty() {
                    self.install(classes, workspace_packages);
                }
                let project = self.project(project.as_ref());
                for listener in self.collectors.sync_listeners() {
                    listener.on_sync_complete(&project, *mode, *result);
                }
            }
            Event::Highlight {
                project,
                path,
                kind,
                references,
            } => {
                let project = self.project(project.as_ref());
                let (file, diagnostics) = build_file(project, path, *kind, references);
                if highlight(&self.visitor, &file, &diagnostics) {
                    self.report.files_highlighted += 1;
                } else {
                    tracing::debug!("Skipped {}", path.display());
                    self.report.files_skipped += 1;
                }
            }
            Event::Lookup { name, modules } => {
                let classes = match modules {
                    Some(modules) => self.service.lookup(
                        name,
                        &ModuleScope::new(modules.iter().map(|m| Module::new(m))),
                    ),
                    None => self.service.lookup(name, &EverythingScope),
                };
                self.report.lookups.push(LookupOutcome {
                    name: name.clone(),
                    classes: classes.iter().map(|c| LightRClass::clone(c)).collect(),
                });
            }
            Event::SetFlag { key, enabled } => {
                let Some(experiment) = Experiment::from_key(key) else {
                    bail!("Unknown experiment: {key}");
                };
                self.flags.set(experiment, *enabled);
            }
        }
        Ok(())
    }

    fn install(&self, classes: &[ClassDef], workspace_packages: &[String]) {
        let mut builder = self.service.builder();
        for class in classes {
            builder.add_class(&class.package, Module::new(&class.module));
        }
        builder.add_workspace_packages(workspace_packages, Module::workspace());
        self.service.install(builder);
    }

    fn finish(mut self) -> ReplayReport {
        self.report.batches = self.sink.take();
        self.report
    }
}

/// Builds a file with one statement per reference, and an unresolved
/// diagnostic on the last identifier of each unresolved one.
fn build_file(
    project: ProjectId,
    path: &Path,
    kind: FileKind,
    references: &[ReferenceDef],
) -> (InMemoryFile, Vec<Diagnostic>) {
    let mut b = TreeBuilder::new(path, kind, project);
    let mut diagnostics = Vec::new();
    b.start_node();
    for (i, reference) in references.iter().enumerate() {
        b.start_node();
        b.token(&format!("int v{i} = "));
        let range = b.reference_expression(&reference.text);
        b.token(";\n");
        b.finish_node();
        if reference.unresolved {
            let name = reference.text.rsplit('.').next().unwrap_or_default();
            diagnostics.push(
                Diagnostic::new(
                    Severity::Error,
                    DiagnosticKind::UnresolvedReference,
                    range.start,
                    range.end,
                )
                .with_description(format!("Cannot resolve symbol '{name}'")),
            );
        }
    }
    b.finish_node();
    (b.finish(), diagnostics)
}

/// Runs one whole-file pass. Each diagnostic is produced while visiting the
/// innermost node covering exactly its range.
fn highlight(template: &HighlightVisitor, file: &InMemoryFile, diagnostics: &[Diagnostic]) -> bool {
    let mut visitor = template.fresh();
    if !visitor.suitable_for_file(file) {
        return false;
    }

    let nodes = file.preorder();
    let mut produced: Vec<Vec<Diagnostic>> = vec![Vec::new(); nodes.len()];
    for diagnostic in diagnostics {
        let range = diagnostic.start_offset..diagnostic.end_offset;
        if let Some(i) = nodes.iter().rposition(|n| n.range() == range) {
            produced[i].push(diagnostic.clone());
        }
    }

    let holder = Arc::new(DiagnosticBuffer::new());
    visitor.analyze(file, true, holder.clone(), |v| {
        for (node, diagnostics) in nodes.iter().zip(&produced) {
            holder.clear();
            for diagnostic in diagnostics {
                holder.push(diagnostic.clone());
            }
            v.visit(node);
        }
    })
}
