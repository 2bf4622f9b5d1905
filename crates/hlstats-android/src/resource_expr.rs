//! Recognition of Android resource accessors of the form `R.<type>.<name>`.
//!
//! An accessor surfaces as several nested syntax nodes: the leading `R`, the
//! `R.<type>` qualifier, and the full `R.<type>.<name>` reference. Starting
//! from any of them, [`find_resource_expression`] walks a bounded number of
//! parents to find the node spanning the whole accessor.

use hlstats_core::{NodeRef, SyntaxNode};

use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

/// Maximum number of parent steps taken before giving up.
pub const MAX_ANCESTOR_STEPS: usize = 4;

/// Name of the generated resource class.
pub const RESOURCE_CLASS: &str = "R";

/// Resource types that can appear in an accessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceType {
    /// `R.animator`
    Animator,
    /// `R.anim`
    Anim,
    /// `R.color`
    Color,
    /// `R.drawable`
    Drawable,
    /// `R.layout`
    Layout,
    /// `R.id`
    Id,
    /// `R.menu`
    Menu,
    /// `R.string`
    String,
    /// `R.style`
    Style,
    /// `R.font`
    Font,
    /// `R.bool`
    Bool,
    /// `R.integer`
    Integer,
    /// `R.dimen`
    Dimen,
    /// `R.array`
    Array,
}

impl ResourceType {
    /// Every resource type.
    pub const ALL: [Self; 14] = [
        Self::Animator,
        Self::Anim,
        Self::Color,
        Self::Drawable,
        Self::Layout,
        Self::Id,
        Self::Menu,
        Self::String,
        Self::Style,
        Self::Font,
        Self::Bool,
        Self::Integer,
        Self::Dimen,
        Self::Array,
    ];

    /// Name of the type as written in source.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Animator => "animator",
            Self::Anim => "anim",
            Self::Color => "color",
            Self::Drawable => "drawable",
            Self::Layout => "layout",
            Self::Id => "id",
            Self::Menu => "menu",
            Self::String => "string",
            Self::Style => "style",
            Self::Font => "font",
            Self::Bool => "bool",
            Self::Integer => "integer",
            Self::Dimen => "dimen",
            Self::Array => "array",
        }
    }

    /// Parses a type name as written in source.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn type_alternation() -> String {
    let types: Vec<&str> = ResourceType::ALL.iter().map(|t| t.as_str()).collect();
    format!(r"{RESOURCE_CLASS}\.({})", types.join("|"))
}

// Both patterns are built from constants; compilation cannot fail.
#[allow(clippy::expect_used)]
static RESOURCE_TYPE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("^{}$", type_alternation())).expect("resource type pattern")
});

#[allow(clippy::expect_used)]
static RESOURCE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^{}\.[A-Za-z0-9_]+$", type_alternation())).expect("resource pattern")
});

/// Returns true if `text` is a complete `R.<type>.<name>` accessor.
#[must_use]
pub fn is_resource_accessor(text: &str) -> bool {
    RESOURCE_PATTERN.is_match(text)
}

/// Returns true if `text` is a bare `R.<type>` qualifier.
#[must_use]
pub fn is_resource_qualifier(text: &str) -> bool {
    RESOURCE_TYPE_PATTERN.is_match(text)
}

/// Splits a complete accessor into its type and name.
#[must_use]
pub fn parse_resource_accessor(text: &str) -> Option<(ResourceType, &str)> {
    if !is_resource_accessor(text) {
        return None;
    }
    let mut parts = text.splitn(3, '.');
    let _class = parts.next()?;
    let resource_type = ResourceType::from_name(parts.next()?)?;
    Some((resource_type, parts.next()?))
}

enum Handle<'a> {
    Start(&'a dyn SyntaxNode),
    Ancestor(NodeRef),
}

/// The node spanning a full resource accessor.
pub struct ResourceExpression<'a> {
    node: Handle<'a>,
    steps: usize,
}

impl ResourceExpression<'_> {
    /// The matched node.
    #[must_use]
    pub fn node(&self) -> &dyn SyntaxNode {
        match &self.node {
            Handle::Start(node) => *node,
            Handle::Ancestor(node) => node.as_ref(),
        }
    }

    /// Text of the matched node.
    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        self.node().text()
    }

    /// Number of parent steps from the start node; 0 if it matched itself.
    #[must_use]
    pub fn steps(&self) -> usize {
        self.steps
    }
}

impl std::fmt::Debug for ResourceExpression<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceExpression")
            .field("text", &self.text())
            .field("steps", &self.steps)
            .finish()
    }
}

/// Finds the smallest ancestor-or-self of `node` whose text is a complete
/// `R.<type>.<name>` accessor.
///
/// Only parents whose text is `R` or `R.<type>` are walked through; any
/// other text, a missing parent, or more than [`MAX_ANCESTOR_STEPS`] steps
/// means `node` is not part of an accessor.
///
/// The first match wins, even if it is a larger node whose text happens to
/// be an accessor.
#[must_use]
pub fn find_resource_expression(node: &dyn SyntaxNode) -> Option<ResourceExpression<'_>> {
    if is_resource_accessor(&node.text()) {
        return Some(ResourceExpression {
            node: Handle::Start(node),
            steps: 0,
        });
    }

    let mut current = node.parent()?;
    for steps in 1..=MAX_ANCESTOR_STEPS {
        let text = current.text().into_owned();
        if is_resource_accessor(&text) {
            return Some(ResourceExpression {
                node: Handle::Ancestor(current),
                steps,
            });
        }
        if text != RESOURCE_CLASS && !is_resource_qualifier(&text) {
            return None;
        }
        current = current.parent()?;
    }
    None
}
