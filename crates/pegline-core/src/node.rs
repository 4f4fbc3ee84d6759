//! Immutable AST node shared by the parser's internal parse tree and its
//! trimmed, user-facing output.

use serde::{Deserialize, Serialize};

/// Byte-offset span `[start, stop)` into the source text that produced a [`Node`].
///
/// Spans are informational only: they never participate in equality or hashing,
/// since two nodes produced from different input offsets but the same shape are
/// the same node for every purpose except error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub stop: usize,
}

impl Span {
    pub fn new(start: usize, stop: usize) -> Self {
        debug_assert!(start <= stop, "span start {start} must not exceed stop {stop}");
        Self { start, stop }
    }

    /// Smallest span covering both `self` and `other`.
    pub fn cover(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.stop.max(other.stop))
    }
}

/// A child of a [`Node`]: either a nested node or a leaf string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Child {
    Node(Node),
    Text(String),
}

impl PartialEq for Child {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Child::Node(a), Child::Node(b)) => a == b,
            (Child::Text(a), Child::Text(b)) => a == b,
            _ => false,
        }
    }
}
impl Eq for Child {}

impl std::hash::Hash for Child {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            Child::Node(n) => {
                0u8.hash(state);
                n.hash(state);
            }
            Child::Text(s) => {
                1u8.hash(state);
                s.hash(state);
            }
        }
    }
}

impl From<Node> for Child {
    fn from(n: Node) -> Self {
        Child::Node(n)
    }
}
impl From<String> for Child {
    fn from(s: String) -> Self {
        Child::Text(s)
    }
}
impl From<&str> for Child {
    fn from(s: &str) -> Self {
        Child::Text(s.to_owned())
    }
}

/// An immutable AST/parse-tree node: a symbolic `kind`, an ordered list of
/// children, and an optional source span.
///
/// Equality and hashing are structural over `(kind, children)` only — `span`
/// is excluded, so two nodes built from different offsets of equivalent input
/// compare equal. Nodes are values: once built they are never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub kind: String,
    pub children: Vec<Child>,
    pub span: Option<Span>,
}

impl Node {
    pub fn new(kind: impl Into<String>, children: Vec<Child>, span: Option<Span>) -> Self {
        Self {
            kind: kind.into(),
            children,
            span,
        }
    }

    /// Convenience constructor for a spanned node.
    pub fn spanned(kind: impl Into<String>, children: Vec<Child>, span: Span) -> Self {
        Self::new(kind, children, Some(span))
    }

    /// Convenience constructor for a synthetic node with no span.
    pub fn synthetic(kind: impl Into<String>, children: Vec<Child>) -> Self {
        Self::new(kind, children, None)
    }

    /// Iterate over child nodes, skipping leaf strings.
    pub fn child_nodes(&self) -> impl Iterator<Item = &Node> {
        self.children.iter().filter_map(|c| match c {
            Child::Node(n) => Some(n),
            Child::Text(_) => None,
        })
    }

    /// Iterate over leaf-string children, skipping nested nodes.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.children.iter().filter_map(|c| match c {
            Child::Text(s) => Some(s.as_str()),
            Child::Node(_) => None,
        })
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.children == other.children
    }
}
impl Eq for Node {}

impl std::hash::Hash for Node {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.children.hash(state);
    }
}
