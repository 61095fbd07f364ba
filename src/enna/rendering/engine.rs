//! Tree-walking renderer
//!
//! Nodes are rendered depth first, left to right, into one output buffer. A failing node
//! records a [`RenderError`] and contributes nothing; its siblings still render.
//!
//! | Node | On failure |
//! |---|---|
//! | expression | no output for the node |
//! | `EXEC` | scope left as it was before the statements |
//! | `FOR` header | the loop is skipped |
//! | `IF`/`ELIF` condition | the branch counts as false |
//!
//! Each `FOR` iteration renders against its own scope snapshot, so bindings made inside a
//! loop body never leak into later iterations or past `$END$`. `IF` bodies share the scope
//! of the enclosing block.

use super::errors::{RenderError, RenderErrorKind};
use crate::enna::ast::{Argument, IfBranch, LineIndex, Node};
use crate::enna::parsing::Template;
use crate::enna::script::{Interpreter, Scope, ScriptEvaluator};
use log::debug;

/// Rendered bytes plus every node-level failure, in evaluation order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderOutput {
    pub bytes: Vec<u8>,
    pub errors: Vec<RenderError>,
}

impl RenderOutput {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Output as text, replacing invalid UTF-8
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Renderer<E = Interpreter> {
    evaluator: E,
}

impl Renderer<Interpreter> {
    pub fn new() -> Self {
        Self::with_evaluator(Interpreter::new())
    }
}

impl<E: ScriptEvaluator> Renderer<E> {
    pub fn with_evaluator(evaluator: E) -> Self {
        Self { evaluator }
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    /// Render a parsed template against `scope`
    ///
    /// `scope` is not modified; `EXEC` statements act on a private copy.
    pub fn render(&self, template: &Template, scope: &Scope) -> RenderOutput {
        let mut walk = Walk {
            evaluator: &self.evaluator,
            source: template.source(),
            line_index: template.line_index(),
            output: RenderOutput::default(),
        };
        let mut scope = scope.clone();
        walk.nodes(template.tree(), &mut scope);

        debug!(
            "rendered {} bytes with {} errors",
            walk.output.bytes.len(),
            walk.output.errors.len()
        );
        walk.output
    }
}

struct Walk<'r, E> {
    evaluator: &'r E,
    source: &'r [u8],
    line_index: &'r LineIndex,
    output: RenderOutput,
}

impl<E: ScriptEvaluator> Walk<'_, E> {
    fn nodes(&mut self, nodes: &[Node], scope: &mut Scope) {
        for node in nodes {
            self.node(node, scope);
        }
    }

    fn node(&mut self, node: &Node, scope: &mut Scope) {
        match node {
            Node::PlainText { span } => {
                self.output.bytes.extend_from_slice(&self.source[span.clone()]);
            }
            Node::Expression { argument } => {
                let text = self.text(argument);
                match self.evaluator.eval_expr(&text, scope) {
                    Ok(value) => self.output.bytes.extend_from_slice(value.to_string().as_bytes()),
                    Err(err) => self.fail(RenderErrorKind::Expression, argument, text, &err),
                }
            }
            Node::Exec { argument } => {
                let text = self.text(argument);
                let mut updated = scope.clone();
                match self.evaluator.exec_stmt(&text, &mut updated) {
                    Ok(()) => *scope = updated,
                    Err(err) => self.fail(RenderErrorKind::Command, argument, text, &err),
                }
            }
            Node::For { argument, body } => {
                let text = self.text(argument);
                match self.evaluator.eval_for_snapshots(&text, scope) {
                    Ok(snapshots) => {
                        for mut snapshot in snapshots {
                            self.nodes(body, &mut snapshot);
                        }
                    }
                    Err(err) => self.fail(RenderErrorKind::ForBlock, argument, text, &err),
                }
            }
            Node::If { branches } => {
                if let Some(branch) = self.choose(branches, scope) {
                    self.nodes(&branch.body, scope);
                }
            }
        }
    }

    /// The first branch whose condition holds; failed conditions count as false
    fn choose<'b>(&mut self, branches: &'b [IfBranch], scope: &Scope) -> Option<&'b IfBranch> {
        for branch in branches {
            let Some(condition) = &branch.condition else {
                return Some(branch);
            };
            let text = self.text(condition);
            match self.evaluator.eval_condition(&text, scope) {
                Ok(true) => return Some(branch),
                Ok(false) => {}
                Err(err) => self.fail(RenderErrorKind::IfBlock, condition, text, &err),
            }
        }
        None
    }

    fn text(&self, argument: &Argument) -> String {
        String::from_utf8_lossy(argument.bytes(self.source))
            .trim()
            .to_string()
    }

    fn fail(
        &mut self,
        kind: RenderErrorKind,
        argument: &Argument,
        text: String,
        err: &crate::enna::script::EvalError,
    ) {
        let position = self.line_index.locate(argument.span.start);
        debug!("{} failed at {}: {}", kind, position, err);
        self.output
            .errors
            .push(RenderError::new(kind, err, text).at(argument.line, position.column));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enna::script::Value;
    use rstest::rstest;

    fn render(source: &str, scope: &Scope) -> RenderOutput {
        Renderer::new().render(&Template::parse(source), scope)
    }

    #[test]
    fn test_hello_world() {
        let scope: Scope = [("val_name", "World")].into_iter().collect();
        let output = render("Hello $$ val_name $$!", &scope);
        assert_eq!(output.text(), "Hello World!");
        assert!(output.is_clean());
    }

    #[rstest]
    #[case::expression("a $$ 1 + 2 $$ b", "a 3 b")]
    #[case::exec_then_use("$EXEC{ x = 4 }$ $$ x * 2 $$", " 8")]
    #[case::for_loop("$FOR{ i in range(3) }$\n$$ i $$,\n$END$\n", "0,\n1,\n2,\n")]
    #[case::if_true("$IF{ 1 < 2 }$\nyes\n$ELSE$\nno\n$END$\n", "yes\n")]
    #[case::elif("$IF{ False }$\na\n$ELIF{ True }$\nb\n$ELSE$\nc\n$END$\n", "b\n")]
    #[case::else_branch("$IF{ False }$\na\n$ELSE$\nc\n$END$\n", "c\n")]
    #[case::no_branch("$IF{ False }$\na\n$END$\nz", "z")]
    fn test_node_semantics(#[case] source: &str, #[case] expected: &str) {
        let output = render(source, &Scope::new());
        assert!(output.is_clean(), "{:?}", output.errors);
        assert_eq!(output.text(), expected);
    }

    #[test]
    fn test_failing_expression_skips_only_itself() {
        let output = render("a $$ missing $$ b $$ 1 $$", &Scope::new());
        assert_eq!(output.text(), "a  b 1");
        assert_eq!(output.errors.len(), 1);
        let error = &output.errors[0];
        assert_eq!(error.kind, RenderErrorKind::Expression);
        assert_eq!(error.code, "NameError");
        assert_eq!(error.content, "missing");
        assert_eq!(error.line, Some(1));
        assert_eq!(error.column, Some(5));
    }

    #[rstest]
    #[case::string_repeat("a $$ 'ab' * 2 ** 62 $$ b")]
    #[case::list_repeat("a $$ [1] * 10 ** 12 $$ b")]
    #[case::zfill("a $$ 'x'.zfill(10 ** 15) $$ b")]
    #[case::format_width("a $$ f'{1:>99999999999999}' $$ b")]
    fn test_oversized_result_is_a_node_error(#[case] source: &str) {
        let output = render(source, &Scope::new());
        assert_eq!(output.text(), "a  b");
        assert_eq!(output.errors.len(), 1);
        assert_eq!(output.errors[0].kind, RenderErrorKind::Expression);
        assert_eq!(output.errors[0].code, "MemoryError");
    }

    #[test]
    fn test_failing_exec_leaves_scope() {
        let scope: Scope = [("x", 1i64)].into_iter().collect();
        let output = render("$EXEC{ x = 2; y = 1 / 0 }$ $$ x $$", &scope);
        assert_eq!(output.text(), " 1");
        assert_eq!(output.errors[0].kind, RenderErrorKind::Command);
        assert_eq!(output.errors[0].code, "ZeroDivisionError");
    }

    #[test]
    fn test_failing_for_header_skips_loop() {
        let output = render("a\n$FOR{ i in 5 }$\n$$ i $$\n$END$\nb", &Scope::new());
        assert_eq!(output.text(), "a\nb");
        assert_eq!(output.errors.len(), 1);
        assert_eq!(output.errors[0].kind, RenderErrorKind::ForBlock);
        assert_eq!(output.errors[0].line, Some(2));
    }

    #[test]
    fn test_failing_condition_counts_as_false() {
        let output = render(
            "$IF{ nope }$\na\n$ELIF{ True }$\nb\n$END$\n",
            &Scope::new(),
        );
        assert_eq!(output.text(), "b\n");
        assert_eq!(output.errors.len(), 1);
        assert_eq!(output.errors[0].kind, RenderErrorKind::IfBlock);
    }

    #[test]
    fn test_iteration_failure_is_local() {
        let source = "$FOR{ d in [1, 0, 2] }$\n$$ 2 // d $$\n$END$\n";
        let output = render(source, &Scope::new());
        assert_eq!(output.text(), "2\n\n1\n");
        assert_eq!(output.errors.len(), 1);
    }

    #[test]
    fn test_for_snapshots_do_not_leak() {
        let source = "$EXEC{ n = 0 }$\n$FOR{ i in range(3) }$\n$EXEC{ n += 1 }$ $$ n $$\n$END$\n$$ n $$";
        let output = render(source, &Scope::new());
        assert!(output.is_clean(), "{:?}", output.errors);
        assert_eq!(output.text(), "\n 1\n 1\n 1\n0");
    }

    #[test]
    fn test_if_body_shares_scope() {
        let source = "$IF{ True }$\n$EXEC{ n = 5 }$\n$END$\n$$ n $$";
        let output = render(source, &Scope::new());
        assert!(output.is_clean(), "{:?}", output.errors);
        assert_eq!(output.text(), "\n5");
    }

    #[test]
    fn test_render_is_deterministic() {
        let template = Template::parse("$FOR{ k, v in [('a', 1), ('b', 2)] }$\n$$ k $$=$$ v $$\n$END$\n");
        let scope = Scope::new();
        let renderer = Renderer::new();
        let first = renderer.render(&template, &scope);
        let second = renderer.render(&template, &scope);
        assert_eq!(first, second);
        assert_eq!(first.text(), "a=1\nb=2\n");
    }

    #[test]
    fn test_caller_scope_untouched() {
        let scope: Scope = [("x", Value::Int(1))].into_iter().collect();
        render("$EXEC{ x = 9 }$", &scope);
        assert_eq!(scope.get("x"), Some(&Value::Int(1)));
    }
}
