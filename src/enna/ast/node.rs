//! Directive tree nodes
//!
//! Nodes reference the source buffer through byte ranges only. A `PlainText` node copies
//! `source[span]` verbatim, every other node carries an [`Argument`] whose span covers the
//! text between the directive delimiters (`$$ .. $$` or `{ .. }$`).
//!
//! Serialized form (used by `enna parse --format json`):
//!
//! ```text
//! {"type": "plain_text", "span": {"start": 0, "end": 6}}
//! {"type": "FOR", "argument": {"line": 2, "span": {...}}, "body": [...]}
//! ```

use serde::Serialize;
use std::ops::Range as ByteRange;

/// The text of a directive argument: its 1-based line and byte range
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Argument {
    pub line: usize,
    pub span: ByteRange<usize>,
}

impl Argument {
    pub fn new(line: usize, span: ByteRange<usize>) -> Self {
        Self { line, span }
    }

    /// The argument bytes inside `source`
    pub fn bytes<'a>(&self, source: &'a [u8]) -> &'a [u8] {
        &source[self.span.clone()]
    }
}

/// One branch of an `IF` chain; `condition == None` is the terminal `ELSE`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IfBranch {
    pub condition: Option<Argument>,
    pub body: Vec<Node>,
}

impl IfBranch {
    pub fn new(condition: Option<Argument>) -> Self {
        Self {
            condition,
            body: Vec::new(),
        }
    }

    pub fn is_else(&self) -> bool {
        self.condition.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum Node {
    #[serde(rename = "plain_text")]
    PlainText { span: ByteRange<usize> },
    #[serde(rename = "expression")]
    Expression { argument: Argument },
    #[serde(rename = "EXEC")]
    Exec { argument: Argument },
    #[serde(rename = "FOR")]
    For { argument: Argument, body: Vec<Node> },
    #[serde(rename = "IF")]
    If { branches: Vec<IfBranch> },
}

impl Node {
    /// Short type name, as used in serialized trees
    pub fn node_type(&self) -> &'static str {
        match self {
            Node::PlainText { .. } => "plain_text",
            Node::Expression { .. } => "expression",
            Node::Exec { .. } => "EXEC",
            Node::For { .. } => "FOR",
            Node::If { .. } => "IF",
        }
    }

    /// Visit this node and all its descendants, depth first, left to right
    pub fn walk<F: FnMut(&Node)>(&self, visit: &mut F) {
        visit(self);
        match self {
            Node::For { body, .. } => body.iter().for_each(|child| child.walk(visit)),
            Node::If { branches } => branches
                .iter()
                .flat_map(|branch| branch.body.iter())
                .for_each(|child| child.walk(visit)),
            _ => {}
        }
    }

    /// Render the tree structure as an indented outline (one node per line)
    pub fn outline(nodes: &[Node], source: &[u8]) -> String {
        let mut out = String::new();
        outline_into(nodes, source, 0, &mut out);
        out
    }
}

fn outline_into(nodes: &[Node], source: &[u8], depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    for node in nodes {
        match node {
            Node::PlainText { span } => {
                let text = String::from_utf8_lossy(&source[span.clone()]);
                out.push_str(&format!("{indent}plain_text {:?}\n", text));
            }
            Node::Expression { argument } | Node::Exec { argument } => {
                let text = String::from_utf8_lossy(argument.bytes(source));
                out.push_str(&format!("{indent}{} {:?}\n", node.node_type(), text.trim()));
            }
            Node::For { argument, body } => {
                let text = String::from_utf8_lossy(argument.bytes(source));
                out.push_str(&format!("{indent}FOR {:?}\n", text.trim()));
                outline_into(body, source, depth + 1, out);
            }
            Node::If { branches } => {
                for (i, branch) in branches.iter().enumerate() {
                    match &branch.condition {
                        Some(condition) => {
                            let keyword = if i == 0 { "IF" } else { "ELIF" };
                            let text = String::from_utf8_lossy(condition.bytes(source));
                            out.push_str(&format!("{indent}{keyword} {:?}\n", text.trim()));
                        }
                        None => out.push_str(&format!("{indent}ELSE\n")),
                    }
                    outline_into(&branch.body, source, depth + 1, out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Vec<u8>, Vec<Node>) {
        let source = b"a\n$FOR{ x in y }$\n$$ x $$\n$END$\n".to_vec();
        let tree = vec![
            Node::PlainText { span: 0..2 },
            Node::For {
                argument: Argument::new(2, 7..15),
                body: vec![Node::Expression {
                    argument: Argument::new(3, 20..23),
                }],
            },
        ];
        (source, tree)
    }

    #[test]
    fn test_walk_visits_depth_first() {
        let (_, tree) = sample();
        let mut seen = Vec::new();
        for node in &tree {
            node.walk(&mut |n| seen.push(n.node_type()));
        }
        assert_eq!(seen, vec!["plain_text", "FOR", "expression"]);
    }

    #[test]
    fn test_outline() {
        let (source, tree) = sample();
        insta::assert_snapshot!(Node::outline(&tree, &source).trim_end(), @r###"
        plain_text "a\n"
        FOR "x in y"
          expression "x"
        "###);
    }

    #[test]
    fn test_outline_if_chain() {
        let template = crate::enna::parsing::Template::parse(
            "a $$ x $$\n$IF{ c }$\nyes\n$ELIF{ d }$\nmaybe\n$ELSE$\nno\n$END$\n",
        );
        insta::assert_snapshot!(Node::outline(template.tree(), template.source()).trim_end(), @r###"
        plain_text "a "
        expression "x"
        plain_text "\n"
        IF "c"
          plain_text "yes\n"
        ELIF "d"
          plain_text "maybe\n"
        ELSE
          plain_text "no\n"
        "###);
    }

    #[test]
    fn test_serialize_tags() {
        let node = Node::Exec {
            argument: Argument::new(1, 6..9),
        };
        let json = serde_json::to_string(&node).unwrap();
        assert_eq!(
            json,
            r#"{"type":"EXEC","argument":{"line":1,"span":{"start":6,"end":9}}}"#
        );
    }

    #[test]
    fn test_else_branch() {
        assert!(IfBranch::new(None).is_else());
        assert!(!IfBranch::new(Some(Argument::new(1, 0..1))).is_else());
    }
}
