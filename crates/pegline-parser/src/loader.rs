//! Grammar loader (C3): turns a rule map, a grammar AST, or grammar text
//! into a validated [`Grammar`], resolving `Index` sugar and checking for
//! unknown labels and left recursion along the way.

use std::collections::HashSet;

use pegline_core::{Child, Grammar, Node, ParseExpr};

use crate::error::GrammarError;

/// How a caller may hand a grammar to [`crate::Parser::new`].
pub enum GrammarSource {
    /// Already a `name -> ParseExpr` map; copied as-is before validation.
    RuleMap(Grammar),
    /// The trimmed AST produced by parsing grammar text with the default
    /// engine: a top-level node whose children are `Definition` nodes.
    Ast(Node),
    /// Raw grammar text, parsed with the default engine and then loaded as
    /// an `Ast`.
    Text(String),
}

/// Finish loading a grammar that is already in rule-map form: resolve
/// `Index` sugar, then run the unknown-label and left-recursion passes.
pub(crate) fn from_rule_map(grammar: Grammar) -> Result<Grammar, GrammarError> {
    let grammar = resolve_indices(grammar)?;
    check_unknown_labels(&grammar)?;
    check_left_recursion(&grammar)?;
    Ok(grammar)
}

/// Build a rule map from a trimmed grammar AST (spec §4.2, case 2).
pub(crate) fn from_ast(ast: &Node) -> Result<Grammar, GrammarError> {
    let mut grammar = Grammar::new();
    for def in ast.child_nodes() {
        if def.kind != "Definition" || def.children.len() != 2 {
            return Err(GrammarError::MalformedText(format!(
                "expected a Definition(lhs, rhs) node, found {:?}",
                def.kind
            )));
        }
        let lhs = child_node(&def.children[0])?;
        let rhs = child_node(&def.children[1])?;
        let rhs_expr = node_to_parse_expr(rhs)?;
        match lhs.kind.as_str() {
            "Node" => {
                let name = identifier_name(lhs)?;
                grammar.insert(name.clone(), ParseExpr::Node(name, Box::new(rhs_expr)));
            }
            "Label" => {
                let name = identifier_name(lhs)?;
                grammar.insert(name, rhs_expr);
            }
            other => {
                return Err(GrammarError::MalformedText(format!(
                    "a Definition's left-hand side must be Node(Label) or Label(name), found {other:?}"
                )));
            }
        }
    }
    from_rule_map(grammar)
}

fn child_node(c: &Child) -> Result<&Node, GrammarError> {
    match c {
        Child::Node(n) => Ok(n),
        Child::Text(_) => Err(GrammarError::MalformedText("expected a node, found a leaf string".into())),
    }
}

fn leaf_text(c: &Child) -> Result<&str, GrammarError> {
    match c {
        Child::Text(s) => Ok(s),
        Child::Node(_) => Err(GrammarError::MalformedText("expected a leaf string, found a node".into())),
    }
}

/// Read the identifier name out of a `Label(name)` AST node, or out of a
/// `Node(Label(name))` wrapper (the Definition lhs `%name` sugar).
fn identifier_name(n: &Node) -> Result<String, GrammarError> {
    match n.kind.as_str() {
        "Label" => Ok(leaf_text(&n.children[0])?.to_string()),
        "Node" => identifier_name(child_node(&n.children[0])?),
        other => Err(GrammarError::MalformedText(format!("expected an identifier, found {other:?}"))),
    }
}

/// Convert one node of a grammar-describing AST into the [`ParseExpr`] it
/// denotes. Mirrors the default grammar's own node-producing rule names
/// (`bootstrap.rs`) one for one.
fn node_to_parse_expr(n: &Node) -> Result<ParseExpr, GrammarError> {
    match n.kind.as_str() {
        "Dot" => Ok(ParseExpr::Dot),
        "String" => Ok(ParseExpr::String(leaf_text(&n.children[0])?.to_string())),
        "CharClass" => Ok(ParseExpr::CharClass(ranges_from_child(&n.children[0])?)),
        "Choice" => Ok(ParseExpr::Choice(children_to_exprs(n)?)),
        "Sequence" => Ok(ParseExpr::Sequence(children_to_exprs(n)?)),
        "ZeroOrOne" => Ok(ParseExpr::ZeroOrOne(Box::new(node_to_parse_expr(child_node(&n.children[0])?)?))),
        "ZeroOrMore" => Ok(ParseExpr::ZeroOrMore(Box::new(node_to_parse_expr(child_node(&n.children[0])?)?))),
        "OneOrMore" => Ok(ParseExpr::OneOrMore(Box::new(node_to_parse_expr(child_node(&n.children[0])?)?))),
        "Lookahead" => Ok(ParseExpr::Lookahead(Box::new(node_to_parse_expr(child_node(&n.children[0])?)?))),
        "NotLookahead" => Ok(ParseExpr::NotLookahead(Box::new(node_to_parse_expr(child_node(&n.children[0])?)?))),
        "Argument" => Ok(ParseExpr::Argument(Box::new(node_to_parse_expr(child_node(&n.children[0])?)?))),
        "Label" => Ok(ParseExpr::Label(leaf_text(&n.children[0])?.to_string())),
        "Index" => {
            let name = identifier_name(child_node(&n.children[0])?)?;
            let k: usize = leaf_text(&n.children[1])?
                .parse()
                .map_err(|_| GrammarError::MalformedText("Index precedence level is not a number".into()))?;
            Ok(ParseExpr::Index(name, k))
        }
        other => Err(GrammarError::MalformedText(format!("unrecognized grammar AST node kind {other:?}"))),
    }
}

fn children_to_exprs(n: &Node) -> Result<Vec<ParseExpr>, GrammarError> {
    n.child_nodes().map(node_to_parse_expr).collect()
}

/// A `CharClass`'s single retained argument is either one `Range` node (the
/// common case, a singleton "tuple" collapsed by the trimmer) or a synthetic
/// `Tuple` node wrapping several.
fn ranges_from_child(c: &Child) -> Result<Vec<pegline_core::CharRange>, GrammarError> {
    let n = child_node(c)?;
    match n.kind.as_str() {
        "Range" => Ok(vec![range_from_node(n)?]),
        "Tuple" => n.child_nodes().map(range_from_node).collect(),
        other => Err(GrammarError::MalformedText(format!("expected a char-class Range, found {other:?}"))),
    }
}

fn range_from_node(n: &Node) -> Result<pegline_core::CharRange, GrammarError> {
    if n.kind != "Range" {
        return Err(GrammarError::MalformedText(format!("expected Range, found {:?}", n.kind)));
    }
    let lo = one_char(leaf_text(&n.children[0])?)?;
    let hi = match n.children.get(1) {
        Some(c) => one_char(leaf_text(c)?)?,
        None => lo,
    };
    Ok(pegline_core::CharRange::new(lo, hi))
}

fn one_char(s: &str) -> Result<char, GrammarError> {
    let decoded = crate::trim::decode_escapes(s);
    decoded
        .chars()
        .next()
        .filter(|_| decoded.chars().count() == 1)
        .ok_or_else(|| GrammarError::MalformedText(format!("expected a single character, found {s:?}")))
}

/// Resolve every `Index(name, k)` in `grammar` into a `Label("name:k")`,
/// introducing the synthetic `name:k` rule the first time each is seen.
/// Spec §4.3/§9: slices the indexed rule's *direct children* (the items of
/// a top-level `Choice`/`Sequence`, or the rule itself if neither), failing
/// to load if fewer than `k + 1` children exist.
fn resolve_indices(mut grammar: Grammar) -> Result<Grammar, GrammarError> {
    let mut needed: Vec<(String, usize)> = Vec::new();
    for expr in grammar.rules.values() {
        collect_indices(expr, &mut needed);
    }

    let mut synthesized = Vec::new();
    for (name, k) in &needed {
        let synthetic_name = format!("{name}:{k}");
        if grammar.get(&synthetic_name).is_some() {
            continue;
        }
        let body = grammar
            .get(name)
            .ok_or_else(|| GrammarError::UnknownRule(name.clone()))?;
        let children = top_level_children(body);
        if *k >= children.len() {
            return Err(GrammarError::IndexOutOfRange {
                name: name.clone(),
                index: *k,
                available: children.len(),
            });
        }
        let sliced = children[*k..].to_vec();
        synthesized.push((synthetic_name, rebuild(body, sliced)));
    }
    for (name, expr) in synthesized {
        grammar.insert(name, expr);
    }

    for expr in grammar.rules.values_mut() {
        rewrite_indices_to_labels(expr);
    }
    Ok(grammar)
}

fn collect_indices(expr: &ParseExpr, out: &mut Vec<(String, usize)>) {
    match expr {
        ParseExpr::Index(name, k) => out.push((name.clone(), *k)),
        ParseExpr::Choice(items) | ParseExpr::Sequence(items) => {
            for item in items {
                collect_indices(item, out);
            }
        }
        ParseExpr::ZeroOrOne(e)
        | ParseExpr::ZeroOrMore(e)
        | ParseExpr::OneOrMore(e)
        | ParseExpr::Lookahead(e)
        | ParseExpr::NotLookahead(e)
        | ParseExpr::Argument(e)
        | ParseExpr::Node(_, e) => collect_indices(e, out),
        ParseExpr::Dot | ParseExpr::String(_) | ParseExpr::CharClass(_) | ParseExpr::Label(_) => {}
    }
}

fn rewrite_indices_to_labels(expr: &mut ParseExpr) {
    match expr {
        ParseExpr::Index(name, k) => {
            *expr = ParseExpr::Label(format!("{name}:{k}"));
        }
        ParseExpr::Choice(items) | ParseExpr::Sequence(items) => {
            for item in items {
                rewrite_indices_to_labels(item);
            }
        }
        ParseExpr::ZeroOrOne(e)
        | ParseExpr::ZeroOrMore(e)
        | ParseExpr::OneOrMore(e)
        | ParseExpr::Lookahead(e)
        | ParseExpr::NotLookahead(e)
        | ParseExpr::Argument(e)
        | ParseExpr::Node(_, e) => rewrite_indices_to_labels(e),
        ParseExpr::Dot | ParseExpr::String(_) | ParseExpr::CharClass(_) | ParseExpr::Label(_) => {}
    }
}

fn top_level_children(e: &ParseExpr) -> Vec<ParseExpr> {
    match e {
        ParseExpr::Choice(items) | ParseExpr::Sequence(items) => items.clone(),
        other => vec![other.clone()],
    }
}

fn rebuild(original: &ParseExpr, children: Vec<ParseExpr>) -> ParseExpr {
    if children.len() == 1 {
        return children.into_iter().next().unwrap();
    }
    match original {
        ParseExpr::Choice(_) => ParseExpr::Choice(children),
        ParseExpr::Sequence(_) => ParseExpr::Sequence(children),
        _ => unreachable!("a single-expression body never slices to more than one child"),
    }
}

fn check_unknown_labels(grammar: &Grammar) -> Result<(), GrammarError> {
    for expr in grammar.rules.values() {
        let mut names = Vec::new();
        expr.referenced_names(&mut names);
        for name in names {
            if grammar.get(name).is_none() {
                return Err(GrammarError::UnknownRule(name.to_string()));
            }
        }
    }
    Ok(())
}

/// DFS over each rule's *leftmost* reachable references (spec §4.4): an edge
/// back to an ancestor rule is mutual left recursion.
fn check_left_recursion(grammar: &Grammar) -> Result<(), GrammarError> {
    let nullable = nullable_set(grammar);
    for name in grammar.names() {
        let mut ancestors = vec![name.to_string()];
        walk_leftmost(grammar, name, &nullable, &mut ancestors)?;
    }
    Ok(())
}

fn walk_leftmost(
    grammar: &Grammar,
    name: &str,
    nullable: &HashSet<String>,
    ancestors: &mut Vec<String>,
) -> Result<(), GrammarError> {
    let body = match grammar.get(name) {
        Some(b) => b,
        None => return Ok(()), // unknown-label pass already reports this
    };
    let mut refs = Vec::new();
    collect_leftmost(body, nullable, &mut refs);
    for r in refs {
        if ancestors.iter().any(|a| a == &r) {
            let mut path = ancestors.clone();
            path.push(r);
            return Err(GrammarError::LeftRecursion(path.join(" -> ")));
        }
        ancestors.push(r.clone());
        walk_leftmost(grammar, &r, nullable, ancestors)?;
        ancestors.pop();
    }
    Ok(())
}

/// Rule names reachable from `expr` without first consuming input.
fn collect_leftmost(expr: &ParseExpr, nullable: &HashSet<String>, out: &mut Vec<String>) {
    match expr {
        ParseExpr::Sequence(items) => {
            for item in items {
                collect_leftmost(item, nullable, out);
                if !is_nullable(item, nullable) {
                    break;
                }
            }
        }
        ParseExpr::Choice(items) => {
            for item in items {
                collect_leftmost(item, nullable, out);
            }
        }
        ParseExpr::ZeroOrOne(e)
        | ParseExpr::ZeroOrMore(e)
        | ParseExpr::OneOrMore(e)
        | ParseExpr::Lookahead(e)
        | ParseExpr::NotLookahead(e)
        | ParseExpr::Argument(e)
        | ParseExpr::Node(_, e) => collect_leftmost(e, nullable, out),
        ParseExpr::Label(name) | ParseExpr::Index(name, _) => out.push(name.clone()),
        ParseExpr::Dot | ParseExpr::String(_) | ParseExpr::CharClass(_) => {}
    }
}

fn is_nullable(expr: &ParseExpr, nullable: &HashSet<String>) -> bool {
    match expr {
        ParseExpr::Dot | ParseExpr::CharClass(_) => false,
        ParseExpr::String(s) => s.is_empty(),
        ParseExpr::Choice(items) => items.iter().any(|e| is_nullable(e, nullable)),
        ParseExpr::Sequence(items) => items.iter().all(|e| is_nullable(e, nullable)),
        ParseExpr::ZeroOrOne(_) | ParseExpr::ZeroOrMore(_) | ParseExpr::Lookahead(_) | ParseExpr::NotLookahead(_) => {
            true
        }
        ParseExpr::OneOrMore(e) | ParseExpr::Argument(e) | ParseExpr::Node(_, e) => is_nullable(e, nullable),
        ParseExpr::Label(name) | ParseExpr::Index(name, _) => nullable.contains(name),
    }
}

/// Fixpoint over which rules can match the empty string.
fn nullable_set(grammar: &Grammar) -> HashSet<String> {
    let mut nullable = HashSet::new();
    loop {
        let mut changed = false;
        for (name, expr) in &grammar.rules {
            if !nullable.contains(name) && is_nullable(expr, &nullable) {
                nullable.insert(name.clone());
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
    nullable
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn grammar_of(rules: Vec<(&str, ParseExpr)>) -> Grammar {
        let mut map = IndexMap::new();
        for (name, expr) in rules {
            map.insert(name.to_string(), expr);
        }
        Grammar::from_rules(map)
    }

    #[test]
    fn rejects_unknown_label() {
        let g = grammar_of(vec![("a", ParseExpr::Label("b".into()))]);
        assert!(matches!(from_rule_map(g), Err(GrammarError::UnknownRule(name)) if name == "b"));
    }

    #[test]
    fn rejects_direct_left_recursion() {
        let g = grammar_of(vec![(
            "a",
            ParseExpr::Sequence(vec![ParseExpr::Label("a".into()), ParseExpr::String(" ".into())]),
        )]);
        assert!(matches!(from_rule_map(g), Err(GrammarError::LeftRecursion(_))));
    }

    #[test]
    fn allows_non_left_recursive_self_reference() {
        let g = grammar_of(vec![(
            "a",
            ParseExpr::Sequence(vec![ParseExpr::String("(".into()), ParseExpr::Label("a".into())]),
        )]);
        assert!(from_rule_map(g).is_ok());
    }

    #[test]
    fn resolves_index_by_slicing_top_level_choice() {
        let g = grammar_of(vec![
            (
                "Expr",
                ParseExpr::Choice(vec![
                    ParseExpr::Label("Add".into()),
                    ParseExpr::Label("Mul".into()),
                    ParseExpr::Label("Value".into()),
                ]),
            ),
            ("Add", ParseExpr::String("+".into())),
            (
                "Mul",
                ParseExpr::Sequence(vec![ParseExpr::Index("Expr".into(), 1), ParseExpr::String("*".into())]),
            ),
            ("Value", ParseExpr::String("v".into())),
        ]);
        let loaded = from_rule_map(g).expect("loads");
        let synthetic = loaded.get("Expr:1").expect("synthetic rule created");
        assert_eq!(
            synthetic,
            &ParseExpr::Choice(vec![ParseExpr::Label("Mul".into()), ParseExpr::Label("Value".into())])
        );
    }

    #[test]
    fn index_out_of_range_fails_to_load() {
        let g = grammar_of(vec![
            ("Expr", ParseExpr::Label("Value".into())),
            (
                "Bad",
                ParseExpr::Sequence(vec![ParseExpr::Index("Expr".into(), 1), ParseExpr::String("x".into())]),
            ),
            ("Value", ParseExpr::String("v".into())),
        ]);
        assert!(matches!(from_rule_map(g), Err(GrammarError::IndexOutOfRange { .. })));
    }
}
