//! Error types raised while loading a grammar or running a parse.

use thiserror::Error;

/// Something wrong with a grammar, caught before any input is parsed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GrammarError {
    #[error("rule {0:?} is referenced but never defined")]
    UnknownRule(String),

    #[error("rule {name:?} references its own tail via {name}:{index}, but {name} only has {available} top-level alternative(s)")]
    IndexOutOfRange {
        name: String,
        index: usize,
        available: usize,
    },

    #[error("left recursion detected: {0}")]
    LeftRecursion(String),

    #[error("grammar text is malformed: {0}")]
    MalformedText(String),

    #[error("the bootstrap grammar does not describe itself: {0}")]
    BootstrapMismatch(String),
}

/// Something that went wrong while parsing a specific input.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The grammar's start rule failed to match, or matched without consuming
    /// all of the input. Carries a framed, human-readable report built from
    /// the furthest point of progress reached during the attempt.
    #[error("{0}")]
    Failure(String),

    /// The recursion-fuel budget was exhausted before the parse could finish.
    /// Distinguishes a pathological or adversarial grammar/input pair from an
    /// ordinary parse failure.
    #[error("recursion limit of {limit} exceeded at byte offset {offset}")]
    RecursionLimitExceeded { limit: u32, offset: usize },
}
