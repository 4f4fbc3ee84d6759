//! Errors raised by graph queries.

use thiserror::Error;

use crate::op::OpHash;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    /// A `preds` set referenced a hash with no stored operation.
    #[error("operation {0} is referenced as a dependency but was never added")]
    UnknownOperation(OpHash),

    /// The requested graph contains a cycle. Carries the hashes still
    /// unresolved (never reached zero in-degree) when the sort's ready-heap
    /// emptied.
    #[error("graph contains a cycle: {} operation(s) never became ready", .0.len())]
    CycleError(Vec<OpHash>),
}
