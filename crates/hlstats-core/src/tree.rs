//! Minimal in-memory syntax tree implementing the host traits.
//!
//! Files are built with [`TreeBuilder`]: nodes are opened and closed around
//! tokens, and a node's text is the source slice its tokens span.
//!
//! ```ignore
//! let mut b = TreeBuilder::new("src/Main.java", FileKind::JavaSource, ProjectId::new("app"));
//! b.start_node();
//! b.reference_expression("R.string.app_name");
//! b.token(";");
//! b.finish_node();
//! let file = b.finish();
//! ```

use crate::host::{FileRef, NodeRef, SourceFile, SyntaxNode};
use crate::types::{FileId, FileKind, ProjectId};

use std::borrow::Cow;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug)]
struct NodeData {
    range: Range<usize>,
    parent: Option<usize>,
    children: Vec<usize>,
}

#[derive(Debug)]
struct FileData {
    id: FileId,
    path: PathBuf,
    kind: FileKind,
    project: ProjectId,
    source: String,
    nodes: Vec<NodeData>,
    roots: Vec<usize>,
}

/// A source file backed by an in-memory syntax tree.
#[derive(Debug, Clone)]
pub struct InMemoryFile(Arc<FileData>);

impl InMemoryFile {
    /// Full source text.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.0.source
    }

    /// Number of nodes, tokens included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.0.nodes.len()
    }

    /// Top-level nodes, in source order.
    #[must_use]
    pub fn roots(&self) -> Vec<TreeNode> {
        self.0.roots.iter().map(|&id| self.node(id)).collect()
    }

    /// Every node in pre-order, the order a highlighting pass visits them.
    #[must_use]
    pub fn preorder(&self) -> Vec<TreeNode> {
        let mut out = Vec::with_capacity(self.0.nodes.len());
        let mut stack: Vec<usize> = self.0.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(self.node(id));
            stack.extend(self.0.nodes[id].children.iter().rev());
        }
        out
    }

    /// Innermost node whose text is exactly `text`.
    ///
    /// Among equally deep matches the last one in pre-order wins.
    #[must_use]
    pub fn find_text(&self, text: &str) -> Option<TreeNode> {
        self.preorder()
            .into_iter()
            .filter(|n| n.text_str() == text)
            .max_by_key(TreeNode::depth)
    }

    fn node(&self, id: usize) -> TreeNode {
        TreeNode {
            file: self.clone(),
            id,
        }
    }
}

impl SourceFile for InMemoryFile {
    fn id(&self) -> FileId {
        self.0.id
    }

    fn path(&self) -> &Path {
        &self.0.path
    }

    fn kind(&self) -> FileKind {
        self.0.kind
    }

    fn project(&self) -> ProjectId {
        self.0.project.clone()
    }

    fn element_at(&self, offset: usize) -> Option<NodeRef> {
        let mut current = self
            .0
            .roots
            .iter()
            .copied()
            .find(|&id| self.0.nodes[id].range.contains(&offset))?;
        while let Some(&child) = self.0.nodes[current]
            .children
            .iter()
            .find(|&&c| self.0.nodes[c].range.contains(&offset))
        {
            current = child;
        }
        Some(Arc::new(self.node(current)))
    }
}

/// Handle to one node of an [`InMemoryFile`].
#[derive(Debug, Clone)]
pub struct TreeNode {
    file: InMemoryFile,
    id: usize,
}

impl TreeNode {
    /// Text of the node as a borrowed slice.
    #[must_use]
    pub fn text_str(&self) -> &str {
        let range = self.range();
        &self.file.0.source[range]
    }

    /// Byte range of the node in the source.
    #[must_use]
    pub fn range(&self) -> Range<usize> {
        self.file.0.nodes[self.id].range.clone()
    }

    /// Number of ancestors above this node.
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self.file.0.nodes[self.id].parent;
        while let Some(p) = current {
            depth += 1;
            current = self.file.0.nodes[p].parent;
        }
        depth
    }

    /// Parent as a concrete handle.
    #[must_use]
    pub fn parent_node(&self) -> Option<TreeNode> {
        self.file.0.nodes[self.id].parent.map(|p| self.file.node(p))
    }

    /// Wraps this handle for use through [`SyntaxNode`].
    #[must_use]
    pub fn to_ref(&self) -> NodeRef {
        Arc::new(self.clone())
    }
}

impl SyntaxNode for TreeNode {
    fn text(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.text_str())
    }

    fn parent(&self) -> Option<NodeRef> {
        self.parent_node().map(|p| Arc::new(p) as NodeRef)
    }

    fn containing_file(&self) -> FileRef {
        Arc::new(self.file.clone())
    }
}

/// Builds an [`InMemoryFile`] node by node.
#[derive(Debug)]
pub struct TreeBuilder {
    path: PathBuf,
    kind: FileKind,
    project: ProjectId,
    source: String,
    nodes: Vec<NodeData>,
    roots: Vec<usize>,
    open: Vec<usize>,
}

impl TreeBuilder {
    /// Creates a builder for a file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, kind: FileKind, project: ProjectId) -> Self {
        Self {
            path: path.into(),
            kind,
            project,
            source: String::new(),
            nodes: Vec::new(),
            roots: Vec::new(),
            open: Vec::new(),
        }
    }

    /// Current end offset of the source.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.source.len()
    }

    /// Opens a node at the current offset.
    pub fn start_node(&mut self) {
        let id = self.push_node();
        self.open.push(id);
    }

    /// Closes the innermost open node. Does nothing if none is open.
    pub fn finish_node(&mut self) {
        if let Some(id) = self.open.pop() {
            self.nodes[id].range.end = self.source.len();
        }
    }

    /// Appends a leaf token and returns its range.
    pub fn token(&mut self, text: &str) -> Range<usize> {
        let id = self.push_node();
        self.source.push_str(text);
        let end = self.source.len();
        self.nodes[id].range.end = end;
        self.nodes[id].range.clone()
    }

    /// Appends a qualified reference such as `R.string.app_name`, nested the
    /// way Java parsers nest them: `((R).string).app_name`, with each segment
    /// wrapped in its own reference node around an identifier token.
    ///
    /// Returns the range of the last identifier, where unresolved-reference
    /// diagnostics are reported.
    pub fn reference_expression(&mut self, path: &str) -> Range<usize> {
        let segments: Vec<&str> = path.split('.').collect();
        for _ in 1..segments.len() {
            self.start_node();
        }
        let mut last = self.offset()..self.offset();
        for (i, segment) in segments.iter().enumerate() {
            if i == 0 {
                self.start_node();
                last = self.token(segment);
                self.finish_node();
            } else {
                self.token(".");
                last = self.token(segment);
                self.finish_node();
            }
        }
        last
    }

    /// Closes any open node and freezes the file under a fresh identity.
    #[must_use]
    pub fn finish(mut self) -> InMemoryFile {
        while !self.open.is_empty() {
            self.finish_node();
        }
        InMemoryFile(Arc::new(FileData {
            id: FileId::fresh(),
            path: self.path,
            kind: self.kind,
            project: self.project,
            source: self.source,
            nodes: self.nodes,
            roots: self.roots,
        }))
    }

    fn push_node(&mut self) -> usize {
        let id = self.nodes.len();
        let start = self.source.len();
        let parent = self.open.last().copied();
        self.nodes.push(NodeData {
            range: start..start,
            parent,
            children: Vec::new(),
        });
        match parent {
            Some(p) => self.nodes[p].children.push(id),
            None => self.roots.push(id),
        }
        id
    }
}
