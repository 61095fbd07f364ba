//! Script evaluation for template arguments
//!
//! Templates hand their expressions, EXEC statements, FOR headers and IF conditions to a
//! [`ScriptEvaluator`]. The renderer only talks to that trait; [`Interpreter`] is the built-in
//! implementation, a Python-flavoured expression language covering what scenario templates
//! use in practice:
//!
//! - literals: `1`, `2.5`, `'text'`, `"text"`, `f'{x:>4}'`, `True`, `False`, `None`,
//!   `[a, b]`, `{'k': v}` and list comprehensions
//! - operators: `**`, `* / // %`, `+ -`, chained comparisons (`<`, `in`, `not in`, `is`),
//!   `not`, `and`, `or` and `a if cond else b`
//! - postfix forms: calls, `x[i]`, `x[a:b]`, `d.key` and method calls on strings, lists, dicts
//! - statements: `x = ...`, `a, b = ...`, `x += ...`, `pass`, `xs.append(...)`
//!
//! Failures are [`EvalError`]s named after the Python exception a template author would
//! recognise (`NameError`, `ZeroDivisionError`, ...).

pub mod builtins;
pub mod format;
pub mod grammar;
pub mod interpreter;
pub mod scope;
pub mod syntax;
pub mod value;

pub use interpreter::Interpreter;
pub use scope::Scope;
pub use value::Value;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("name '{0}' is not defined")]
    Name(String),

    #[error("{0}")]
    Type(String),

    #[error("{0}")]
    Value(String),

    #[error("{0}")]
    ZeroDivision(String),

    #[error("{0}")]
    Index(String),

    #[error("{0}")]
    Key(String),

    #[error("{0}")]
    Attribute(String),

    #[error("{0}")]
    Syntax(String),

    #[error("{0}")]
    Memory(String),
}

impl EvalError {
    /// The Python exception name for this failure, used as the render error code
    pub fn type_name(&self) -> &'static str {
        match self {
            EvalError::Name(_) => "NameError",
            EvalError::Type(_) => "TypeError",
            EvalError::Value(_) => "ValueError",
            EvalError::ZeroDivision(_) => "ZeroDivisionError",
            EvalError::Index(_) => "IndexError",
            EvalError::Key(_) => "KeyError",
            EvalError::Attribute(_) => "AttributeError",
            EvalError::Syntax(_) => "SyntaxError",
            EvalError::Memory(_) => "MemoryError",
        }
    }
}

/// Evaluates the script fragments a template contains
///
/// Scopes are plain values: FOR headers return one independent [`Scope`] per iteration,
/// statements mutate the scope they are given.
pub trait ScriptEvaluator {
    /// Evaluate an expression
    fn eval_expr(&self, text: &str, scope: &Scope) -> Result<Value, EvalError>;

    /// Execute statements (one per line or separated by `;`)
    fn exec_stmt(&self, text: &str, scope: &mut Scope) -> Result<(), EvalError>;

    /// Evaluate a FOR header `target in iterable` into one scope per iteration
    fn eval_for_snapshots(&self, header: &str, scope: &Scope) -> Result<Vec<Scope>, EvalError>;

    fn eval_condition(&self, text: &str, scope: &Scope) -> Result<bool, EvalError> {
        Ok(self.eval_expr(text, scope)?.is_truthy())
    }

    /// Format `template` the way an f-string body is formatted
    fn format_template(&self, template: &str, scope: &Scope) -> Result<String, EvalError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_names() {
        let err = EvalError::Name("x".to_string());
        assert_eq!(err.to_string(), "name 'x' is not defined");
        assert_eq!(err.type_name(), "NameError");
        assert_eq!(
            EvalError::ZeroDivision("division by zero".to_string()).type_name(),
            "ZeroDivisionError"
        );
    }
}
