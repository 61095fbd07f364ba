//! Testing utilities for templates
//!
//! Two tools, meant to be used together:
//!
//! 1. [`samples`] - curated template files from `samples/`, embedded at compile time. Use
//!    them instead of ad-hoc strings whenever a test is about a realistic scenario.
//! 2. [`assert_tree`] - a fluent assertion over a parsed tree that checks node kinds and
//!    argument text in one pass.
//!
//! ```rust-example
//! let template = Template::parse(samples::get("020-loop.inp"));
//! assert_tree(&template)
//!     .len(4)
//!     .expression(1, "var_title")
//!     .for_block(3, "i, item in enumerate(var_items)", |body| {
//!         body.expression(0, "i + 1");
//!     });
//! ```

use crate::enna::ast::{ErrorCode, IfBranch, Node};
use crate::enna::parsing::Template;
use crate::enna::rendering::{RenderOutput, Renderer};
use crate::enna::script::{Scope, Value};

pub mod samples {
    //! Curated sample templates

    const SAMPLES: &[(&str, &str)] = &[
        ("010-hello.inp", include_str!("../../samples/010-hello.inp")),
        ("020-loop.inp", include_str!("../../samples/020-loop.inp")),
        ("030-branches.inp", include_str!("../../samples/030-branches.inp")),
        ("040-exec.inp", include_str!("../../samples/040-exec.inp")),
        ("900-unclosed-if.inp", include_str!("../../samples/900-unclosed-if.inp")),
        ("910-else-root.inp", include_str!("../../samples/910-else-root.inp")),
    ];

    pub fn names() -> impl Iterator<Item = &'static str> {
        SAMPLES.iter().map(|(name, _)| *name)
    }

    /// The sample's text; panics on an unknown name
    pub fn get(name: &str) -> &'static str {
        SAMPLES
            .iter()
            .find(|(sample, _)| *sample == name)
            .map(|(_, text)| *text)
            .unwrap_or_else(|| panic!("no sample named {}", name))
    }
}

/// Start a fluent assertion on the top level of `template`
pub fn assert_tree(template: &Template) -> TreeAssertion<'_> {
    TreeAssertion {
        source: template.source(),
        nodes: template.tree(),
        path: "root".to_string(),
    }
}

/// Codes of all syntax errors, in report order
pub fn error_codes(template: &Template) -> Vec<ErrorCode> {
    template.errors().iter().map(|e| e.code).collect()
}

/// Parse and render `source` against `bindings`
pub fn render_str<V: Into<Value>>(
    source: &str,
    bindings: impl IntoIterator<Item = (&'static str, V)>,
) -> RenderOutput {
    let scope: Scope = bindings.into_iter().collect();
    Renderer::new().render(&Template::parse(source), &scope)
}

pub struct TreeAssertion<'a> {
    source: &'a [u8],
    nodes: &'a [Node],
    path: String,
}

impl<'a> TreeAssertion<'a> {
    pub fn len(self, expected: usize) -> Self {
        assert_eq!(
            self.nodes.len(),
            expected,
            "{}: expected {} nodes, found {:?}",
            self.path,
            expected,
            self.kinds()
        );
        self
    }

    pub fn plain(self, index: usize, text: &str) -> Self {
        match self.node(index) {
            Node::PlainText { span } => assert_eq!(
                String::from_utf8_lossy(&self.source[span.clone()]),
                text,
                "{}[{}]: plain text",
                self.path,
                index
            ),
            other => self.wrong(index, "plain_text", other),
        }
        self
    }

    pub fn expression(self, index: usize, text: &str) -> Self {
        match self.node(index) {
            Node::Expression { argument } => self.check_argument(index, &argument.span, text),
            other => self.wrong(index, "expression", other),
        }
        self
    }

    pub fn exec(self, index: usize, text: &str) -> Self {
        match self.node(index) {
            Node::Exec { argument } => self.check_argument(index, &argument.span, text),
            other => self.wrong(index, "EXEC", other),
        }
        self
    }

    pub fn for_block(self, index: usize, header: &str, body: impl FnOnce(TreeAssertion<'a>)) -> Self {
        match self.node(index) {
            Node::For { argument, body: nodes } => {
                self.check_argument(index, &argument.span, header);
                body(self.child(nodes, format!("{}[{}].FOR", self.path, index)));
            }
            other => self.wrong(index, "FOR", other),
        }
        self
    }

    pub fn if_block(self, index: usize, branches: impl FnOnce(IfAssertion<'a>)) -> Self {
        match self.node(index) {
            Node::If { branches: chain } => branches(IfAssertion {
                source: self.source,
                branches: chain,
                path: format!("{}[{}].IF", self.path, index),
            }),
            other => self.wrong(index, "IF", other),
        }
        self
    }

    fn node(&self, index: usize) -> &'a Node {
        self.nodes.get(index).unwrap_or_else(|| {
            panic!(
                "{}: no node at {}, found {:?}",
                self.path,
                index,
                self.kinds()
            )
        })
    }

    fn child(&self, nodes: &'a [Node], path: String) -> TreeAssertion<'a> {
        TreeAssertion {
            source: self.source,
            nodes,
            path,
        }
    }

    fn check_argument(&self, index: usize, span: &std::ops::Range<usize>, text: &str) {
        assert_eq!(
            String::from_utf8_lossy(&self.source[span.clone()]).trim(),
            text,
            "{}[{}]: argument",
            self.path,
            index
        );
    }

    fn wrong(&self, index: usize, expected: &str, found: &Node) -> ! {
        panic!(
            "{}[{}]: expected {}, found {}",
            self.path,
            index,
            expected,
            found.node_type()
        )
    }

    fn kinds(&self) -> Vec<&'static str> {
        self.nodes.iter().map(Node::node_type).collect()
    }
}

pub struct IfAssertion<'a> {
    source: &'a [u8],
    branches: &'a [IfBranch],
    path: String,
}

impl<'a> IfAssertion<'a> {
    pub fn len(self, expected: usize) -> Self {
        assert_eq!(self.branches.len(), expected, "{}: branch count", self.path);
        self
    }

    /// Check one branch; `condition == None` expects the `ELSE` branch
    pub fn branch(
        self,
        index: usize,
        condition: Option<&str>,
        body: impl FnOnce(TreeAssertion<'a>),
    ) -> Self {
        let branch = self
            .branches
            .get(index)
            .unwrap_or_else(|| panic!("{}: no branch {}", self.path, index));
        let found = branch
            .condition
            .as_ref()
            .map(|c| String::from_utf8_lossy(c.bytes(self.source)).trim().to_string());
        assert_eq!(
            found.as_deref(),
            condition,
            "{}[{}]: condition",
            self.path,
            index
        );
        body(TreeAssertion {
            source: self.source,
            nodes: &branch.body,
            path: format!("{}[{}]", self.path, index),
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_sample_parses() {
        for name in samples::names() {
            let template = Template::parse(samples::get(name));
            let broken = name.starts_with('9');
            assert_eq!(template.errors().is_empty(), !broken, "{}", name);
        }
    }

    #[test]
    fn test_fluent_loop() {
        let template = Template::parse(samples::get("020-loop.inp"));
        assert_tree(&template)
            .len(4)
            .plain(0, "# ")
            .expression(1, "var_title")
            .plain(2, "\n")
            .for_block(3, "i, item in enumerate(var_items)", |body| {
                body.len(4)
                    .expression(0, "i + 1")
                    .plain(1, ". ")
                    .expression(2, "item")
                    .plain(3, "\n");
            });
    }

    #[test]
    #[should_panic(expected = "expected EXEC")]
    fn test_wrong_kind_panics() {
        let template = Template::parse("$$ x $$");
        assert_tree(&template).exec(0, "x");
    }

    #[test]
    fn test_render_str() {
        let output = render_str("$$ a + b $$", [("a", 1i64), ("b", 2i64)]);
        assert_eq!(output.text(), "3");
    }
}
