//! End-to-end scenarios and cross-cutting properties, exercised through the
//! public facade the way a downstream consumer of this lab would use it.

use indoc::indoc;
use pegline_lib::core::{Child, Node};
use pegline_lib::graph::{Graph, OpArg, Operation};
use pegline_lib::parser::{GrammarSource, Parser};

fn node(kind: &str, children: Vec<Child>) -> Child {
    Child::Node(Node::synthetic(kind, children))
}
fn text(s: &str) -> Child {
    Child::Text(s.to_string())
}

/// Spec property 1 and the bootstrap's own self-check.
#[test]
fn default_grammar_is_a_fixed_point() {
    Parser::default_engine().expect("the default grammar must describe itself");
}

/// S1: parsing grammar text with the default engine.
#[test]
fn s1_grammar_text_with_grouped_sequence() {
    let mut parser = Parser::default_engine().unwrap();
    let ast = parser
        .parse("a <- ( b cd)", pegline_lib::parser::START, true, true)
        .expect("no parse error")
        .expect("matches");

    let expected = node(
        "start",
        vec![node(
            "Definition",
            vec![
                node("Label", vec![text("a")]),
                node("Sequence", vec![node("Label", vec![text("b")]), node("Label", vec![text("cd")])]),
            ],
        )],
    );
    assert_eq!(ast, expected);
}

/// S2: a node-producing (`%X`) left-hand side.
#[test]
fn s2_node_producing_lhs() {
    let mut parser = Parser::default_engine().unwrap();
    let ast = parser
        .parse("%X <- 'y'", pegline_lib::parser::START, true, true)
        .expect("no parse error")
        .expect("matches");

    let expected = node(
        "start",
        vec![node(
            "Definition",
            vec![node("Node", vec![node("Label", vec![text("X")])]), node("String", vec![text("y")])],
        )],
    );
    assert_eq!(ast, expected);
}

const PRECEDENCE_GRAMMAR: &str = indoc! {"
    %start <- %Expr !.
    Expr   <- %Add / %Mul / '(' %Expr ')' / %Value
    %Add   <- %Expr:1 '+' %Expr
    %Mul   <- %Expr:2 ('*' %Expr:1)+
    %Value <- %[0-9]+
"};

fn load_precedence_grammar() -> Parser {
    Parser::new(GrammarSource::Text(PRECEDENCE_GRAMMAR.into())).expect("precedence grammar loads")
}

/// Spec property 4 and S3: left-associative `+`, higher-precedence `*`,
/// parenthesized grouping overriding precedence.
#[test]
fn precedence_climbing_examples() {
    let mut parser = load_precedence_grammar();

    let ast = parser.parse("6*7+3", "start", true, true).unwrap().unwrap();
    assert_eq!(
        ast,
        node(
            "start",
            vec![node(
                "Add",
                vec![
                    node("Mul", vec![node("Value", vec![text("6")]), node("Value", vec![text("7")])]),
                    node("Value", vec![text("3")]),
                ],
            )],
        )
    );

    let ast = parser.parse("1+2+3", "start", true, true).unwrap().unwrap();
    assert_eq!(
        ast,
        node(
            "start",
            vec![node(
                "Add",
                vec![
                    node("Value", vec![text("1")]),
                    node("Add", vec![node("Value", vec![text("2")]), node("Value", vec![text("3")])]),
                ],
            )],
        )
    );

    // S3
    let ast = parser.parse("(1+2)*3", "start", true, true).unwrap().unwrap();
    assert_eq!(
        ast,
        node(
            "start",
            vec![node(
                "Mul",
                vec![
                    node("Add", vec![node("Value", vec![text("1")]), node("Value", vec![text("2")])]),
                    node("Value", vec![text("3")]),
                ],
            )],
        )
    );
}

/// Spec property 3: determinism, and the trimmer's no-wrapper-kinds post-condition.
#[test]
fn trimming_is_deterministic_and_wrapper_free() {
    let mut parser = load_precedence_grammar();
    let first = parser.parse("6*7+3", "start", true, true).unwrap().unwrap();
    let second = parser.parse("6*7+3", "start", true, true).unwrap().unwrap();
    assert_eq!(first, second);

    fn assert_no_wrapper_kinds(c: &Child) {
        if let Child::Node(n) = c {
            assert!(!matches!(n.kind.as_str(), "Node" | "Argument" | "Label" | "Sequence"));
            for child in &n.children {
                assert_no_wrapper_kinds(child);
            }
        }
    }
    assert_no_wrapper_kinds(&first);
}

/// Spec property 5: mutual left recursion is refused at load time.
#[test]
fn left_recursive_grammar_is_refused() {
    let err = Parser::new(GrammarSource::Text("a <- a ' '\n".into())).unwrap_err();
    assert!(matches!(err, pegline_lib::GrammarError::LeftRecursion(_)));
}

/// Property 6 / S6: error framing on a failing parse against the default grammar.
/// Strict mode raises the framed failure as an `Err` rather than swallowing it.
#[test]
fn s6_error_framing_reports_the_stalled_line() {
    let mut parser = Parser::default_engine().unwrap();
    let err = parser.parse("a <-\n#oops\n@", pegline_lib::parser::START, true, true).unwrap_err();
    let message = err.to_string();
    assert!(message.contains('@'));
    assert!(message.contains('^'));
    assert!(message.contains("ParseError: failed after line=3 char=1"));
    assert_eq!(parser.last_error().unwrap(), message);
}

/// Property 6 (non-strict): `bogus <- 123` against the default grammar
/// still yields a non-empty diagnostic without returning an `Err`.
#[test]
fn malformed_rule_body_reports_without_erroring() {
    let mut parser = Parser::default_engine().unwrap();
    let out = parser.parse("bogus <- 123", pegline_lib::parser::START, false, true).unwrap();
    assert!(out.is_none());
    assert!(!parser.last_error().unwrap().is_empty());
}

fn literal(op: &str, arg: &str) -> Operation {
    Operation::new(op, vec![OpArg::Literal(arg.to_string())])
}

/// S4 / property 7-9: dedup, dependency ordering, reachability pruning.
#[test]
fn s4_graph_dedup_and_dependency_order() {
    let mut g = Graph::new();
    let h1 = g.add(literal("int", "1"), []);
    let h2 = g.add(literal("int", "2"), []);
    let h1_again = g.add(literal("int", "1"), []);
    assert_eq!(h1, h1_again, "identical tuples must fuse (property 7)");

    let h3 = g.add(Operation::new("add", vec![OpArg::Ref(h1), OpArg::Ref(h2)]), []);
    let unrelated = g.add(literal("int", "99"), []);
    g.add_target([h3]);

    let order = g.order().unwrap();
    assert_eq!(order.len(), 3, "unrelated ops are excluded (property 9)");
    assert!(!order.contains(&unrelated));
    let pos = |h| order.iter().position(|&x| x == h).unwrap();
    assert!(pos(h1) < pos(h3));
    assert!(pos(h2) < pos(h3));
}

/// S5: an explicit ordering dependency between two targeted effects.
#[test]
fn s5_graph_orders_explicit_side_effect_dependency() {
    let mut g = Graph::new();
    let p1 = g.add(literal("Print", "x"), []);
    let p2 = g.add(literal("Print", "y"), [p1]);
    g.add_target([p1, p2]);

    let order = g.order().unwrap();
    let pos = |h| order.iter().position(|&x| x == h).unwrap();
    assert!(pos(p1) < pos(p2));
}

/// Property 10: a cycle is reported rather than looping or panicking.
#[test]
fn graph_cycle_raises_cycle_error() {
    let mut g = Graph::new();
    let a = g.add(literal("a", "1"), []);
    let b = g.add(Operation::new("b", vec![OpArg::Ref(a)]), []);
    // `Graph` only ever learns about edges through `add`'s `deps`/arg-refs, so
    // this synthesizes a back edge the way a buggy translator might.
    g.add(Operation::new("a", vec![OpArg::Literal("1".into())]), [b]);
    g.add_target([a]);

    assert!(matches!(g.order(), Err(pegline_lib::GraphError::CycleError(_))));
}
