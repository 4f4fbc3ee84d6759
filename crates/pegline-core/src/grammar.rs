//! Grammar model: the set of named rules a parser is built from.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::expr::ParseExpr;

/// A complete grammar: a name-to-rule-body map, preserving definition order.
///
/// Definition order matters for diagnostics and for `fmt`/golden-grammar
/// comparisons, even though lookup is by name. This mirrors how a tree-sitter
/// grammar definition preserves rule order while still being addressed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grammar {
    pub rules: IndexMap<String, ParseExpr>,
}

impl Grammar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rules(rules: IndexMap<String, ParseExpr>) -> Self {
        Self { rules }
    }

    pub fn get(&self, name: &str) -> Option<&ParseExpr> {
        self.rules.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, expr: ParseExpr) {
        self.rules.insert(name.into(), expr);
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(|s| s.as_str())
    }

    /// A rule is node-producing if its top-level body constructor is `Node`.
    /// Everything else is a pass-through label (see spec §3.2).
    pub fn is_node_producing(&self, name: &str) -> Option<bool> {
        self.rules.get(name).map(|e| matches!(e, ParseExpr::Node(..)))
    }
}
