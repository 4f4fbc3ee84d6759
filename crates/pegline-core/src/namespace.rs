//! A stack of scoped maps, for use by an AST-to-graph translator.
//!
//! This is plumbing only: the parser and graph engine never construct or
//! inspect a [`Namespace`]. It exists here because a translator that lowers
//! a trimmed AST into [`pegline_graph`](../pegline_graph) operations needs
//! lexical scoping, and this is the simplest correct shape for it.

use std::collections::HashMap;

/// Stack of scoped maps. Lookup walks top-down (innermost scope first);
/// definitions land in the innermost scope; scopes push on entry and pop on
/// exit.
#[derive(Debug, Clone)]
pub struct Namespace<V> {
    scopes: Vec<HashMap<String, V>>,
}

impl<V> Default for Namespace<V> {
    fn default() -> Self {
        Self {
            scopes: vec![HashMap::new()],
        }
    }
}

impl<V> Namespace<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a new, empty innermost scope.
    pub fn push(&mut self) {
        self.scopes.push(HashMap::new());
    }

    /// Pop the innermost scope.
    ///
    /// # Panics
    /// Panics if called on the outermost (global) scope — a `Namespace`
    /// always has at least one scope.
    pub fn pop(&mut self) {
        assert!(self.scopes.len() > 1, "cannot pop the global scope");
        self.scopes.pop();
    }

    /// Define `key` in the innermost scope, shadowing any outer definition.
    pub fn define(&mut self, key: impl Into<String>, value: V) {
        self.scopes
            .last_mut()
            .expect("namespace always has at least one scope")
            .insert(key.into(), value);
    }

    /// Look up `key`, walking from the innermost scope outward.
    pub fn get(&self, key: &str) -> Option<&V> {
        self.scopes.iter().rev().find_map(|scope| scope.get(key))
    }

    /// True if `key` is visible in any active scope.
    pub fn contains(&self, key: &str) -> bool {
        self.scopes.iter().any(|scope| scope.contains_key(key))
    }

    /// The outermost (global) scope.
    pub fn global(&self) -> &HashMap<String, V> {
        &self.scopes[0]
    }

    /// Current scope depth (1 means only the global scope is active).
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }
}

/// RAII scope guard returned by [`Namespace::scoped`]; pops the scope on drop.
pub struct ScopeGuard<'a, V> {
    namespace: &'a mut Namespace<V>,
}

impl<V> Namespace<V> {
    /// Push a scope and return a guard that pops it on drop, so scope exit
    /// can't be forgotten even if the caller returns early.
    pub fn scoped(&mut self) -> ScopeGuard<'_, V> {
        self.push();
        ScopeGuard { namespace: self }
    }
}

impl<V> std::ops::Deref for ScopeGuard<'_, V> {
    type Target = Namespace<V>;
    fn deref(&self) -> &Self::Target {
        self.namespace
    }
}
impl<V> std::ops::DerefMut for ScopeGuard<'_, V> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.namespace
    }
}
impl<V> Drop for ScopeGuard<'_, V> {
    fn drop(&mut self) {
        self.namespace.pop();
    }
}
