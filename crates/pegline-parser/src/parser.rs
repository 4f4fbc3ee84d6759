//! The public facade: wires the grammar loader, packrat matcher, trimmer,
//! and error reporter together into a single `Parser` type.

use pegline_core::{Child, Grammar, Node};

use crate::bootstrap;
use crate::error::{GrammarError, ParseError};
use crate::loader::{self, GrammarSource};
use crate::matcher::Matcher;
use crate::report::frame_failure;
use crate::trim;

/// Default recursion-fuel budget (spec §4.4's "reasonable default depth
/// guard"); overridable with [`Parser::with_depth_limit`].
const DEFAULT_DEPTH_LIMIT: u32 = 4_096;

/// A loaded grammar, ready to parse input text against any of its rules.
#[derive(Debug)]
pub struct Parser {
    grammar: Grammar,
    depth_limit: u32,
    last_error: Option<String>,
}

impl Parser {
    /// Load a grammar from a rule map, a grammar AST, or grammar text.
    /// Text is parsed with the default engine before loading.
    pub fn new(source: GrammarSource) -> Result<Self, GrammarError> {
        let grammar = match source {
            GrammarSource::RuleMap(g) => loader::from_rule_map(g)?,
            GrammarSource::Ast(ast) => loader::from_ast(&ast)?,
            GrammarSource::Text(text) => {
                let engine = Self::default_engine()?;
                let ast = engine.parse_grammar_text(&text)?;
                loader::from_ast(&ast)?
            }
        };
        Ok(Self {
            grammar,
            depth_limit: DEFAULT_DEPTH_LIMIT,
            last_error: None,
        })
    }

    /// The hard-coded default engine (a PEG for PEG), with the Index sugar
    /// in its own definition already resolved.
    pub fn default_engine() -> Result<Self, GrammarError> {
        let grammar = loader::from_rule_map(bootstrap::default_grammar())?;
        let parser = Self {
            grammar,
            depth_limit: DEFAULT_DEPTH_LIMIT,
            last_error: None,
        };
        parser.verify_fixed_point()?;
        Ok(parser)
    }

    pub fn with_depth_limit(mut self, limit: u32) -> Self {
        self.depth_limit = limit;
        self
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// The framed failure message from the most recent failed [`Parser::parse`]
    /// call, if any.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Parse `text` starting from rule `start`.
    ///
    /// `strict`: require the match to consume all of `text`, not just a
    /// prefix. `trim`: return the user-facing AST ([`trim`]) instead of the
    /// internal parse tree. On failure, `strict` selects between the two
    /// ways a caller can learn about it: when `strict` is true the failure
    /// is raised as `Err(ParseError::Failure)`; when false it is swallowed
    /// into `Ok(None)` and only reachable via [`Parser::last_error`]. Either
    /// way [`Parser::last_error`] is updated to the framed message, and
    /// cleared on a successful match.
    pub fn parse(&mut self, text: &str, start: &str, strict: bool, trim: bool) -> Result<Option<Child>, ParseError> {
        if self.grammar.get(start).is_none() {
            self.last_error = Some(format!("{:?} is not a defined rule", start));
            return Ok(None);
        }
        let mut matcher = Matcher::new(&self.grammar, text, self.depth_limit);
        let result = matcher.eval_rule(start, 0)?;
        match result {
            Some((end, node)) if !strict || end == text.len() => {
                self.last_error = None;
                Ok(Some(if trim { crate::trim::trim(&node) } else { Child::Node(node) }))
            }
            _ => {
                let message = frame_failure(text, matcher.extent());
                self.last_error = Some(message.clone());
                if strict {
                    Err(ParseError::Failure(message))
                } else {
                    Ok(None)
                }
            }
        }
    }

    /// Parse grammar-describing text into its trimmed AST, using this engine
    /// (expected to be [`Parser::default_engine`]).
    fn parse_grammar_text(&self, text: &str) -> Result<Node, GrammarError> {
        let mut matcher = Matcher::new(&self.grammar, text, self.depth_limit);
        match matcher.eval_rule(bootstrap::START, 0) {
            Ok(Some((end, node))) if end == text.len() => match trim::trim(&node) {
                Child::Node(n) => Ok(n),
                Child::Text(_) => Err(GrammarError::MalformedText("grammar text trimmed to a leaf string".into())),
            },
            Ok(_) => Err(GrammarError::MalformedText(frame_failure(text, matcher.extent()))),
            Err(_) => Err(GrammarError::MalformedText(frame_failure(text, matcher.extent()))),
        }
    }

    /// Spec property 1: parsing [`bootstrap::CANONICAL_TEXT`] with the
    /// default engine and loading the result must reproduce the same rule
    /// map the engine started with.
    fn verify_fixed_point(&self) -> Result<(), GrammarError> {
        let ast = self.parse_grammar_text(bootstrap::CANONICAL_TEXT).map_err(|e| {
            GrammarError::BootstrapMismatch(format!("canonical text failed to parse: {e}"))
        })?;
        let reloaded = loader::from_ast(&ast)?;
        if reloaded != self.grammar {
            return Err(GrammarError::BootstrapMismatch(
                "parsing the canonical text does not reproduce the hard-coded rule map".into(),
            ));
        }
        Ok(())
    }
}
