//! Operations: opaque `(opcode, args…)` tuples identified by a content hash.
//!
//! This crate never looks inside an opcode or argument string; the external
//! translator that builds operations from an AST owns their meaning.

use std::fmt;
use std::hash::{Hash, Hasher};

use fxhash::FxHasher;

/// Content hash identifying an [`Operation`]. Stable only within one process
/// run — good enough for deduplicating and ordering a single graph build,
/// which is all this crate ever needs it for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OpHash(pub(crate) u64);

impl fmt::Display for OpHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// One argument to an [`Operation`]: a literal value, or a reference to
/// another operation by its hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OpArg {
    Literal(String),
    Ref(OpHash),
}

impl From<&str> for OpArg {
    fn from(s: &str) -> Self {
        OpArg::Literal(s.to_string())
    }
}
impl From<String> for OpArg {
    fn from(s: String) -> Self {
        OpArg::Literal(s)
    }
}
impl From<OpHash> for OpArg {
    fn from(h: OpHash) -> Self {
        OpArg::Ref(h)
    }
}

/// A content-addressed operation: an opcode plus its ordered arguments.
/// Two operations with equal `(opcode, args)` are the same operation —
/// `Graph::add` fuses them rather than storing a duplicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub opcode: String,
    pub args: Vec<OpArg>,
}

impl Operation {
    pub fn new(opcode: impl Into<String>, args: impl IntoIterator<Item = impl Into<OpArg>>) -> Self {
        Self {
            opcode: opcode.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Hashes of operations this one's arguments reference directly. These
    /// are always predecessors; `Graph::add`'s `deps` parameter is for
    /// ordering edges that carry no argument value (see its doc comment).
    pub fn arg_refs(&self) -> impl Iterator<Item = OpHash> + '_ {
        self.args.iter().filter_map(|a| match a {
            OpArg::Ref(h) => Some(*h),
            OpArg::Literal(_) => None,
        })
    }

    /// Compute this operation's content hash.
    pub fn content_hash(&self) -> OpHash {
        let mut hasher = FxHasher::default();
        self.opcode.hash(&mut hasher);
        self.args.hash(&mut hasher);
        OpHash(hasher.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_tuples_hash_identically() {
        let a = Operation::new("add", vec![OpArg::Literal("1".into()), OpArg::Literal("2".into())]);
        let b = Operation::new("add", vec![OpArg::Literal("1".into()), OpArg::Literal("2".into())]);
        assert_eq!(a.content_hash(), b.content_hash());
    }

    #[test]
    fn differing_opcode_hashes_differently() {
        let a = Operation::new("add", vec![OpArg::Literal("1".into())]);
        let b = Operation::new("sub", vec![OpArg::Literal("1".into())]);
        assert_ne!(a.content_hash(), b.content_hash());
    }
}
