//! The trimmer (C5): collapses the internal parse tree (kinds `Node`,
//! `Argument`, `Label`, `Sequence`, `String`) into the user-facing AST.
//!
//! The trimmed tree uses only two shapes: [`Child::Node`] for a kind-tagged
//! AST node and [`Child::Text`] for a string leaf — see spec §4.5's
//! post-condition. A pass-through `Label` that collects more than one
//! argument has no natural home in that two-shape world; we materialize it
//! as a synthetic `Tuple`-kind node rather than inventing a third `Child`
//! variant. No grammar in this crate actually produces one, since every
//! multi-argument pass-through rule here wraps its own result in `Node`.

use pegline_core::{Child, Node};

/// Trim `root`, the internal parse tree produced by a top-level
/// `Matcher::eval_rule` call, into its final AST shape.
pub(crate) fn trim(root: &Node) -> Child {
    trim_value(root)
}

fn child_node(c: &Child) -> &Node {
    match c {
        Child::Node(n) => n,
        Child::Text(_) => panic!("trim: expected an internal node, found a leaf string"),
    }
}

fn leaf_text(c: &Child) -> &str {
    match c {
        Child::Text(s) => s,
        Child::Node(_) => panic!("trim: expected a leaf string, found an internal node"),
    }
}

fn trim_value(v: &Node) -> Child {
    match v.kind.as_str() {
        "Node" => {
            let name = leaf_text(&v.children[0]).to_string();
            let body = child_node(&v.children[1]);
            let mut args = Vec::new();
            collect_args(body, &mut args);
            Child::Node(Node::synthetic(name, args))
        }
        "Label" => {
            let body = child_node(&v.children[1]);
            let mut args = Vec::new();
            collect_args(body, &mut args);
            match args.len() {
                0 => trim_value(body),
                1 => args.into_iter().next().unwrap(),
                _ => Child::Node(Node::synthetic("Tuple", args)),
            }
        }
        "Sequence" => {
            let mut flat = Vec::new();
            flatten_sequence(v, &mut flat);
            if flat.len() == 1 {
                flat.into_iter().next().unwrap()
            } else if flat.iter().all(|c| matches!(c, Child::Text(_))) {
                let joined: String = flat
                    .into_iter()
                    .map(|c| match c {
                        Child::Text(s) => s,
                        Child::Node(_) => unreachable!(),
                    })
                    .collect();
                Child::Text(decode_escapes(&joined))
            } else {
                Child::Node(Node::synthetic("Tuple", flat))
            }
        }
        "String" => Child::Text(decode_escapes(leaf_text(&v.children[0]))),
        "Argument" => trim_value(child_node(&v.children[0])),
        other => panic!("trim: unexpected internal node kind {other:?}"),
    }
}

/// Collect the values of every `Argument`-marked subtree reachable from `v`
/// without crossing a nested `Node` or `Label`; `Sequence` is transparent.
fn collect_args(v: &Node, out: &mut Vec<Child>) {
    match v.kind.as_str() {
        "Argument" => out.push(trim_value(child_node(&v.children[0]))),
        "Sequence" => {
            for child in v.child_nodes() {
                collect_args(child, out);
            }
        }
        _ => {}
    }
}

/// Flatten nested internal `Sequence` nodes into one list, trimming every
/// other child in place.
fn flatten_sequence(v: &Node, out: &mut Vec<Child>) {
    for child in v.child_nodes() {
        if child.kind == "Sequence" {
            flatten_sequence(child, out);
        } else {
            out.push(trim_value(child));
        }
    }
}

/// Decode `\n \t \r \\ \' \" \[ \]` and up-to-3-digit octal escapes. Applied
/// both to a bare `String` leaf and to the text produced by concatenating an
/// all-string `Sequence`, so escapes that span adjacent single-character
/// matches (as produced by the default grammar's own `StringChar`/`ClassChar`
/// rules) are decoded once the pieces are joined.
pub(crate) fn decode_escapes(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.peek().copied() {
            Some('n') => {
                chars.next();
                out.push('\n');
            }
            Some('t') => {
                chars.next();
                out.push('\t');
            }
            Some('r') => {
                chars.next();
                out.push('\r');
            }
            Some('\\') => {
                chars.next();
                out.push('\\');
            }
            Some('\'') => {
                chars.next();
                out.push('\'');
            }
            Some('"') => {
                chars.next();
                out.push('"');
            }
            Some('[') => {
                chars.next();
                out.push('[');
            }
            Some(']') => {
                chars.next();
                out.push(']');
            }
            Some(d) if d.is_digit(8) => {
                let mut digits = String::new();
                for _ in 0..3 {
                    match chars.peek() {
                        Some(d) if d.is_digit(8) => {
                            digits.push(*d);
                            chars.next();
                        }
                        _ => break,
                    }
                }
                let value = u32::from_str_radix(&digits, 8).unwrap_or(0);
                out.push(char::from_u32(value).unwrap_or('\u{fffd}'));
            }
            _ => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_common_escapes() {
        assert_eq!(decode_escapes(r"\n"), "\n");
        assert_eq!(decode_escapes(r"\t\r"), "\t\r");
        assert_eq!(decode_escapes(r"\\"), "\\");
        assert_eq!(decode_escapes("a\\'b\\\"c"), "a'b\"c");
    }

    #[test]
    fn decodes_octal_escape() {
        assert_eq!(decode_escapes(r"\101"), "A");
    }

    #[test]
    fn leaves_lone_backslash_unmolested() {
        assert_eq!(decode_escapes(r"\x"), "\\x");
    }

    #[test]
    fn node_with_two_args_collects_both() {
        let body = Node::synthetic(
            "Sequence",
            vec![
                Child::Node(Node::synthetic("Argument", vec![Child::Node(Node::synthetic("String", vec!["a".into()]))])),
                Child::Node(Node::synthetic("Argument", vec![Child::Node(Node::synthetic("String", vec!["b".into()]))])),
            ],
        );
        let root = Node::synthetic("Node", vec!["Pair".into(), Child::Node(body)]);
        let trimmed = trim(&root);
        assert_eq!(trimmed, Child::Node(Node::synthetic("Pair", vec!["a".into(), "b".into()])));
    }
}
