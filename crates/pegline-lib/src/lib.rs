//! Pegline: a self-describing packrat PEG parser paired with a
//! content-addressed dataflow computation graph.
//!
//! # Example
//!
//! ```
//! use pegline_lib::parser::{GrammarSource, Parser};
//!
//! let mut parser = Parser::new(GrammarSource::Text("a <- 'hi'\n".into())).expect("valid grammar");
//! let ast = parser.parse("hi", "a", true, true).expect("no parse error");
//! assert!(ast.is_some());
//! ```

pub mod graph {
    pub use pegline_graph::{GraphError, OpArg, OpHash, Operation, Graph};
}

pub mod parser {
    pub use pegline_parser::{default_grammar, GrammarError, GrammarSource, ParseError, Parser, CANONICAL_TEXT, START};
}

pub mod core {
    pub use pegline_core::{CharRange, Child, Grammar, Namespace, Node, ParseExpr, ScopeGuard, Span};
}

pub use graph::{GraphError, Graph};
pub use parser::{GrammarError, GrammarSource, ParseError, Parser};

/// Umbrella error covering every fallible surface this crate exposes.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Grammar(#[from] GrammarError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Result type for callers who want a single error type across both the
/// parser and the graph engine.
pub type Result<T> = std::result::Result<T, Error>;
