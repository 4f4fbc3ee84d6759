//! The packrat matcher: memoized per-rule, per-offset evaluation of a
//! [`ParseExpr`] tree against a text buffer, producing an internal parse
//! tree (kinds `Node`, `Argument`, `Label`, `Sequence`, `String`).

use std::collections::HashMap;

use pegline_core::{Child, Grammar, Node, Span};

use crate::error::ParseError;

/// One attempt to match `grammar`'s rules against `text`, starting over with
/// an empty memo table. Built fresh for each top-level `parse()` call.
pub(crate) struct Matcher<'g, 's> {
    text: &'s str,
    grammar: &'g Grammar,
    memo: HashMap<(String, usize), Option<(usize, Node)>>,
    extent: usize,
    depth: u32,
    depth_limit: u32,
}

impl<'g, 's> Matcher<'g, 's> {
    pub(crate) fn new(grammar: &'g Grammar, text: &'s str, depth_limit: u32) -> Self {
        Self {
            text,
            grammar,
            memo: HashMap::new(),
            extent: 0,
            depth: 0,
            depth_limit,
        }
    }

    pub(crate) fn extent(&self) -> usize {
        self.extent
    }

    fn note_extent(&mut self, offset: usize) {
        self.extent = self.extent.max(offset);
    }

    /// Evaluate the named rule's own body at `offset`, memoized on
    /// `(name, offset)`. This is the bare rule result — no `Label` wrapper —
    /// matching spec §4.4's "cache keys are (rule, offset) only".
    pub(crate) fn eval_rule(&mut self, name: &str, offset: usize) -> Result<Option<(usize, Node)>, ParseError> {
        let key = (name.to_string(), offset);
        if let Some(cached) = self.memo.get(&key) {
            return Ok(cached.clone());
        }
        // Insert a provisional `None` so a left-recursive probe (which the
        // loader should already have refused) fails fast instead of
        // looping; real left recursion never reaches here.
        self.memo.insert(key.clone(), None);

        self.depth += 1;
        if self.depth > self.depth_limit {
            let limit = self.depth_limit;
            self.depth -= 1;
            return Err(ParseError::RecursionLimitExceeded { limit, offset });
        }
        let body = self
            .grammar
            .get(name)
            .unwrap_or_else(|| panic!("eval_rule: undefined rule {name:?} (loader should have rejected this)"));
        let result = self.evaluate(body, offset)?;
        self.depth -= 1;

        if let Some((next, _)) = &result {
            self.note_extent(*next);
        }
        self.memo.insert(key, result.clone());
        Ok(result)
    }

    /// Evaluate a parse-expression operator at `offset`.
    pub(crate) fn evaluate(
        &mut self,
        expr: &pegline_core::ParseExpr,
        offset: usize,
    ) -> Result<Option<(usize, Node)>, ParseError> {
        use pegline_core::ParseExpr as E;
        match expr {
            E::Dot => Ok(self.match_char(offset, |_| true)),
            E::String(lit) => Ok(self.match_literal(offset, lit)),
            E::CharClass(ranges) => Ok(self.match_char(offset, |c| ranges.iter().any(|r| r.contains(c)))),
            E::Sequence(items) => self.eval_sequence(items, offset),
            E::Choice(items) => self.eval_choice(items, offset),
            E::ZeroOrOne(e) => self.eval_zero_or_one(e, offset),
            E::ZeroOrMore(e) => self.eval_repeat(e, offset, 0),
            E::OneOrMore(e) => self.eval_repeat(e, offset, 1),
            E::Lookahead(e) => {
                let matched = self.evaluate(e, offset)?.is_some();
                Ok(matched.then(|| (offset, Node::spanned("Sequence", vec![], Span::new(offset, offset)))))
            }
            E::NotLookahead(e) => {
                let matched = self.evaluate(e, offset)?.is_some();
                Ok((!matched).then(|| (offset, Node::spanned("Sequence", vec![], Span::new(offset, offset)))))
            }
            E::Argument(e) => Ok(self.evaluate(e, offset)?.map(|(next, inner)| {
                (next, Node::spanned("Argument", vec![Child::Node(inner)], Span::new(offset, next)))
            })),
            E::Node(name, e) => Ok(self.evaluate(e, offset)?.map(|(next, inner)| {
                let wrapped = Node::spanned(
                    "Node",
                    vec![Child::Text(name.clone()), Child::Node(inner)],
                    Span::new(offset, next),
                );
                (next, wrapped)
            })),
            E::Label(name) => Ok(self.eval_rule(name, offset)?.map(|(next, inner)| {
                let wrapped = Node::spanned(
                    "Label",
                    vec![Child::Text(name.clone()), Child::Node(inner)],
                    Span::new(offset, next),
                );
                (next, wrapped)
            })),
            E::Index(name, k) => {
                unreachable!("Index({name}, {k}) should have been resolved into Label at load time")
            }
        }
    }

    fn match_char(&mut self, offset: usize, pred: impl Fn(char) -> bool) -> Option<(usize, Node)> {
        let c = self.text[offset..].chars().next()?;
        if !pred(c) {
            return None;
        }
        let next = offset + c.len_utf8();
        self.note_extent(next);
        Some((next, Node::spanned("String", vec![Child::Text(c.to_string())], Span::new(offset, next))))
    }

    fn match_literal(&mut self, offset: usize, lit: &str) -> Option<(usize, Node)> {
        if !self.text.get(offset..)?.starts_with(lit) {
            return None;
        }
        let next = offset + lit.len();
        self.note_extent(next);
        Some((next, Node::spanned("String", vec![Child::Text(lit.to_string())], Span::new(offset, next))))
    }

    fn eval_sequence(
        &mut self,
        items: &[pegline_core::ParseExpr],
        offset: usize,
    ) -> Result<Option<(usize, Node)>, ParseError> {
        let mut cur = offset;
        let mut children = Vec::with_capacity(items.len());
        for item in items {
            match self.evaluate(item, cur)? {
                Some((next, node)) => {
                    cur = next;
                    children.push(Child::Node(node));
                }
                None => return Ok(None),
            }
        }
        Ok(Some((cur, Node::spanned("Sequence", children, Span::new(offset, cur)))))
    }

    fn eval_choice(
        &mut self,
        items: &[pegline_core::ParseExpr],
        offset: usize,
    ) -> Result<Option<(usize, Node)>, ParseError> {
        for item in items {
            if let Some(result) = self.evaluate(item, offset)? {
                return Ok(Some(result));
            }
        }
        Ok(None)
    }

    fn eval_zero_or_one(
        &mut self,
        e: &pegline_core::ParseExpr,
        offset: usize,
    ) -> Result<Option<(usize, Node)>, ParseError> {
        match self.evaluate(e, offset)? {
            Some(result) => Ok(Some(result)),
            None => Ok(Some((offset, Node::spanned("Sequence", vec![], Span::new(offset, offset))))),
        }
    }

    fn eval_repeat(
        &mut self,
        e: &pegline_core::ParseExpr,
        offset: usize,
        min: usize,
    ) -> Result<Option<(usize, Node)>, ParseError> {
        let mut cur = offset;
        let mut children = Vec::new();
        loop {
            match self.evaluate(e, cur)? {
                // Only accept matches that make progress: a repeated
                // zero-width match would otherwise loop forever.
                Some((next, node)) if next > cur => {
                    cur = next;
                    children.push(Child::Node(node));
                }
                _ => break,
            }
        }
        if children.len() < min {
            return Ok(None);
        }
        Ok(Some((cur, Node::spanned("Sequence", children, Span::new(offset, cur)))))
    }
}
