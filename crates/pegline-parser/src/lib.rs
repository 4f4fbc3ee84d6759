//! Self-describing packrat PEG parser: grammar loader, matcher, trimmer,
//! and error reporter.
//!
//! [`Parser`] is the entry point. Build one from a rule map, a grammar AST,
//! or grammar text via [`GrammarSource`], or start from the hard-coded
//! default engine with [`Parser::default_engine`].

mod bootstrap;
mod error;
mod loader;
mod matcher;
mod parser;
mod report;
mod trim;

pub use bootstrap::{default_grammar, CANONICAL_TEXT, START};
pub use error::{GrammarError, ParseError};
pub use loader::GrammarSource;
pub use parser::Parser;
