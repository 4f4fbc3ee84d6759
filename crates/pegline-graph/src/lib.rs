//! Content-addressed dataflow computation graph.
//!
//! Deliberately independent of `pegline-core`/`pegline-parser`: the
//! translator that turns an AST into [`Operation`]s is an external
//! collaborator, so `Operation` never mentions `Node`.

mod error;
mod graph;
mod op;
mod sort;

pub use error::GraphError;
pub use graph::Graph;
pub use op::{OpArg, OpHash, Operation};
