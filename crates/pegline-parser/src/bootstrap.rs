//! The hard-coded default grammar: a PEG for PEG, extended with `%` for
//! argument/node marking and `Name:k` for precedence-climbing sugar.
//!
//! This tree is built directly as [`ParseExpr`] values rather than parsed
//! from text, so it has no dependency on the matcher it bootstraps. The
//! textual rendering in [`CANONICAL_TEXT`] must describe exactly this same
//! grammar; their agreement is verified by the fixed-point self-test in
//! `parser.rs`.

use indexmap::IndexMap;
use pegline_core::{CharRange, Grammar, ParseExpr};

fn dot() -> ParseExpr {
    ParseExpr::Dot
}
fn s(lit: &str) -> ParseExpr {
    ParseExpr::String(lit.to_string())
}
fn cc(ranges: &[(char, char)]) -> ParseExpr {
    ParseExpr::CharClass(ranges.iter().map(|&(lo, hi)| CharRange::new(lo, hi)).collect())
}
fn choice(items: Vec<ParseExpr>) -> ParseExpr {
    ParseExpr::Choice(items)
}
fn seq(items: Vec<ParseExpr>) -> ParseExpr {
    ParseExpr::Sequence(items)
}
fn opt(e: ParseExpr) -> ParseExpr {
    ParseExpr::ZeroOrOne(Box::new(e))
}
fn star(e: ParseExpr) -> ParseExpr {
    ParseExpr::ZeroOrMore(Box::new(e))
}
fn plus(e: ParseExpr) -> ParseExpr {
    ParseExpr::OneOrMore(Box::new(e))
}
fn and(e: ParseExpr) -> ParseExpr {
    ParseExpr::Lookahead(Box::new(e))
}
fn not(e: ParseExpr) -> ParseExpr {
    ParseExpr::NotLookahead(Box::new(e))
}
fn arg(e: ParseExpr) -> ParseExpr {
    ParseExpr::Argument(Box::new(e))
}
fn lbl(name: &str) -> ParseExpr {
    ParseExpr::Label(name.to_string())
}
fn idx(name: &str, k: usize) -> ParseExpr {
    ParseExpr::Index(name.to_string(), k)
}
fn node(name: &str, e: ParseExpr) -> ParseExpr {
    ParseExpr::Node(name.to_string(), Box::new(e))
}

/// The name of the grammar's conventional start rule.
pub const START: &str = "start";

/// Build the hard-coded default grammar.
pub fn default_grammar() -> Grammar {
    let mut rules = IndexMap::new();
    let mut def = |name: &str, expr: ParseExpr| {
        rules.insert(name.to_string(), expr);
    };

    // Lexical layer: whitespace, comments, fixed tokens.
    def("SpaceChar", cc(&[(' ', ' '), ('\t', '\t'), ('\r', '\r'), ('\n', '\n')]));
    def("EndOfLine", choice(vec![s("\r\n"), s("\n"), s("\r")]));
    def(
        "Comment",
        seq(vec![s("#"), star(seq(vec![not(lbl("EndOfLine")), dot()])), opt(lbl("EndOfLine"))]),
    );
    def("Spacing", star(choice(vec![lbl("SpaceChar"), lbl("Comment")])));
    def("EndOfFile", not(dot()));

    def("LEFTARROW", seq(vec![s("<-"), lbl("Spacing")]));
    def("SLASH", seq(vec![s("/"), lbl("Spacing")]));
    def("AMP", seq(vec![s("&"), lbl("Spacing")]));
    def("BANG", seq(vec![s("!"), lbl("Spacing")]));
    def("QUESTION", seq(vec![s("?"), lbl("Spacing")]));
    def("STAR", seq(vec![s("*"), lbl("Spacing")]));
    def("PLUS", seq(vec![s("+"), lbl("Spacing")]));
    def("OPEN", seq(vec![s("("), lbl("Spacing")]));
    def("CLOSE", seq(vec![s(")"), lbl("Spacing")]));
    def("PERCENT", seq(vec![s("%"), lbl("Spacing")]));
    def("COLON", seq(vec![s(":"), lbl("Spacing")]));
    def("DOTLIT", seq(vec![s("."), lbl("Spacing")]));
    def("SQUOTE", s("'"));
    def("DQUOTE", s("\""));
    def("CLOSEBRACKET_LIT", s("]"));
    def("CLOSEBRACKET", seq(vec![s("]"), lbl("Spacing")]));

    def("IdentStart", cc(&[('a', 'z'), ('A', 'Z'), ('_', '_')]));
    def("IdentCont", cc(&[('a', 'z'), ('A', 'Z'), ('0', '9'), ('_', '_')]));
    def("Identifier", seq(vec![lbl("IdentStart"), star(lbl("IdentCont"))]));
    def("Digit", cc(&[('0', '9')]));
    def("Digits", plus(lbl("Digit")));

    def("EscapeLetter", cc(&[
        ('n', 'n'), ('r', 'r'), ('t', 't'), ('\\', '\\'), ('\'', '\''), ('"', '"'), ('[', '['), (']', ']'),
    ]));
    def("OctalDigit", cc(&[('0', '7')]));
    def("Octal", seq(vec![lbl("OctalDigit"), opt(lbl("OctalDigit")), opt(lbl("OctalDigit"))]));
    def("Escape", seq(vec![s("\\"), choice(vec![lbl("EscapeLetter"), lbl("Octal")])]));
    def(
        "StringChar",
        choice(vec![lbl("Escape"), seq(vec![not(choice(vec![lbl("SQUOTE"), lbl("DQUOTE")])), dot()])]),
    );
    def("ClassChar", choice(vec![lbl("Escape"), seq(vec![not(lbl("CLOSEBRACKET_LIT")), dot()])]));

    // Name/reference meta-rules, shared by every position an identifier can appear.
    def("Label", node("Label", seq(vec![arg(lbl("Identifier")), lbl("Spacing")])));
    def(
        "Index",
        node("Index", seq(vec![arg(lbl("Label")), lbl("COLON"), arg(lbl("Digits")), lbl("Spacing")])),
    );
    // LHS `%Name` sugar: marks a Definition's rule as node-producing. Distinct
    // from the RHS `%e` Argument operator below; both spellings share `%` but
    // only one of them is reachable from `Definition`'s lhs position.
    def("Node", node("Node", seq(vec![lbl("PERCENT"), arg(lbl("Label"))])));

    // Literal and character-class terminals.
    def("Dot", node("Dot", lbl("DOTLIT")));
    def(
        "String",
        node(
            "String",
            choice(vec![
                seq(vec![lbl("SQUOTE"), arg(star(lbl("StringChar"))), lbl("SQUOTE"), lbl("Spacing")]),
                seq(vec![lbl("DQUOTE"), arg(star(lbl("StringChar"))), lbl("DQUOTE"), lbl("Spacing")]),
            ]),
        ),
    );
    def(
        "Range",
        node("Range", seq(vec![arg(lbl("ClassChar")), opt(seq(vec![s("-"), arg(lbl("ClassChar"))]))])),
    );
    def(
        "CharClass",
        node("CharClass", seq(vec![s("["), arg(plus(lbl("Range"))), lbl("CLOSEBRACKET")])),
    );

    // Expression grammar, precedence-cascaded: Choice > Sequence > Repeat >
    // Predicate > Primary, each level falling through to the next on failure.
    def("Group", seq(vec![lbl("OPEN"), arg(lbl("ParseExpr")), lbl("CLOSE")]));
    def(
        "Primary",
        choice(vec![
            arg(lbl("Index")),
            arg(lbl("Label")),
            arg(lbl("Dot")),
            arg(lbl("String")),
            arg(lbl("CharClass")),
            lbl("Group"),
        ]),
    );
    def(
        "Lookahead",
        node("Lookahead", seq(vec![lbl("AMP"), arg(lbl("Primary"))])),
    );
    def(
        "NotLookahead",
        node("NotLookahead", seq(vec![lbl("BANG"), arg(lbl("Primary"))])),
    );
    def(
        "Argument",
        node("Argument", seq(vec![lbl("PERCENT"), arg(lbl("Primary"))])),
    );
    def(
        "Predicate",
        choice(vec![arg(lbl("Lookahead")), arg(lbl("NotLookahead")), arg(lbl("Argument")), lbl("Primary")]),
    );
    def(
        "ZeroOrOne",
        node("ZeroOrOne", seq(vec![arg(lbl("Predicate")), lbl("QUESTION")])),
    );
    def(
        "ZeroOrMore",
        node("ZeroOrMore", seq(vec![arg(lbl("Predicate")), lbl("STAR")])),
    );
    def(
        "OneOrMore",
        node("OneOrMore", seq(vec![arg(lbl("Predicate")), lbl("PLUS")])),
    );
    def(
        "Repeat",
        choice(vec![arg(lbl("ZeroOrOne")), arg(lbl("ZeroOrMore")), arg(lbl("OneOrMore")), lbl("Predicate")]),
    );
    def(
        "Sequence",
        node("Sequence", seq(vec![arg(lbl("Repeat")), plus(arg(lbl("Repeat")))])),
    );
    // `Choice`'s own branches must not loop back through `ParseExpr`/`Choice`
    // itself (that would be left recursion at zero progress); `ParseExpr:1`
    // is exactly "Sequence or Repeat", the precedence levels below Choice.
    def(
        "Choice",
        node(
            "Choice",
            seq(vec![
                arg(idx("ParseExpr", 1)),
                plus(seq(vec![lbl("SLASH"), arg(idx("ParseExpr", 1))])),
            ]),
        ),
    );
    def("ParseExpr", choice(vec![arg(lbl("Choice")), arg(lbl("Sequence")), lbl("Repeat")]));

    def(
        "Definition",
        node(
            "Definition",
            seq(vec![choice(vec![arg(lbl("Node")), arg(lbl("Label"))]), lbl("LEFTARROW"), arg(lbl("ParseExpr"))]),
        ),
    );
    def(
        START,
        node(START, seq(vec![lbl("Spacing"), star(arg(lbl("Definition"))), lbl("EndOfFile")])),
    );

    Grammar::from_rules(rules)
}

/// Canonical textual rendering of [`default_grammar`]. Parsing this text
/// with the default grammar must reproduce it exactly (the fixed-point
/// property, spec property 1).
pub const CANONICAL_TEXT: &str = r#"
SpaceChar        <- [ \t\r\n]
EndOfLine        <- '\r\n' / '\n' / '\r'
Comment          <- '#' (!EndOfLine .)* EndOfLine?
Spacing          <- (SpaceChar / Comment)*
EndOfFile        <- !.

LEFTARROW        <- '<-' Spacing
SLASH            <- '/' Spacing
AMP              <- '&' Spacing
BANG             <- '!' Spacing
QUESTION         <- '?' Spacing
STAR             <- '*' Spacing
PLUS             <- '+' Spacing
OPEN             <- '(' Spacing
CLOSE            <- ')' Spacing
PERCENT          <- '%' Spacing
COLON            <- ':' Spacing
DOTLIT           <- '.' Spacing
SQUOTE           <- '\''
DQUOTE           <- '"'
CLOSEBRACKET_LIT <- ']'
CLOSEBRACKET     <- ']' Spacing

IdentStart       <- [a-zA-Z_]
IdentCont        <- [a-zA-Z0-9_]
Identifier       <- IdentStart IdentCont*
Digit            <- [0-9]
Digits           <- Digit+

EscapeLetter     <- [nrt\\'"\[\]]
OctalDigit       <- [0-7]
Octal            <- OctalDigit OctalDigit? OctalDigit?
Escape           <- '\\' (EscapeLetter / Octal)
StringChar       <- Escape / (!(SQUOTE / DQUOTE) .)
ClassChar        <- Escape / (!CLOSEBRACKET_LIT .)

%Label           <- %Identifier Spacing
%Index           <- %Label COLON %Digits Spacing
%Node            <- PERCENT %Label

%Dot             <- DOTLIT
%String          <- (SQUOTE %(StringChar*) SQUOTE Spacing) / (DQUOTE %(StringChar*) DQUOTE Spacing)
%Range           <- %ClassChar ('-' %ClassChar)?
%CharClass       <- '[' %(Range+) CLOSEBRACKET

Group            <- OPEN %ParseExpr CLOSE
Primary          <- %Index / %Label / %Dot / %String / %CharClass / Group
%Lookahead       <- AMP %Primary
%NotLookahead    <- BANG %Primary
%Argument        <- PERCENT %Primary
Predicate        <- %Lookahead / %NotLookahead / %Argument / Primary
%ZeroOrOne       <- %Predicate QUESTION
%ZeroOrMore      <- %Predicate STAR
%OneOrMore       <- %Predicate PLUS
Repeat           <- %ZeroOrOne / %ZeroOrMore / %OneOrMore / Predicate
%Sequence        <- %Repeat %Repeat+
%Choice          <- %ParseExpr:1 (SLASH %ParseExpr:1)+
ParseExpr        <- %Choice / %Sequence / Repeat

%Definition      <- (%Node / %Label) LEFTARROW %ParseExpr
%start           <- Spacing %Definition* EndOfFile
"#;
