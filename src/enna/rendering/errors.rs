//! Render-time error records
//!
//! Evaluation failures during a render are data, not `Err`s: every failure becomes a
//! [`RenderError`] row and rendering moves on to the next node or row.

use crate::enna::script::EvalError;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Where in the render a failure happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RenderErrorKind {
    /// A module failed to execute
    Import,
    /// A batch-wide `val_` binding failed
    Vals,
    /// A per-row `var_` binding failed
    Vars,
    /// The row's output file name could not be formatted
    Name,
    Expression,
    /// `EXEC` statements failed
    Command,
    #[serde(rename = "FOR Block")]
    ForBlock,
    #[serde(rename = "IF Block")]
    IfBlock,
}

impl RenderErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RenderErrorKind::Import => "Import",
            RenderErrorKind::Vals => "Vals",
            RenderErrorKind::Vars => "Vars",
            RenderErrorKind::Name => "Name",
            RenderErrorKind::Expression => "Expression",
            RenderErrorKind::Command => "Command",
            RenderErrorKind::ForBlock => "FOR Block",
            RenderErrorKind::IfBlock => "IF Block",
        }
    }

    /// Failures that abort the whole batch
    pub fn is_setup(self) -> bool {
        matches!(self, RenderErrorKind::Import | RenderErrorKind::Vals)
    }

    /// Failures that skip a single row
    pub fn is_row_setup(self) -> bool {
        matches!(self, RenderErrorKind::Vars | RenderErrorKind::Name)
    }
}

impl fmt::Display for RenderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One failed evaluation
///
/// `code` is the evaluator's error type name (`NameError`, `ZeroDivisionError`, ...).
/// For template nodes `line`/`column` point at the directive argument; for vars they are
/// the 1-based row and column of the offending cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderError {
    pub kind: RenderErrorKind,
    pub code: String,
    pub line: Option<usize>,
    pub column: Option<usize>,
    pub content: String,
    pub message: String,
}

impl RenderError {
    pub fn new(kind: RenderErrorKind, error: &EvalError, content: impl Into<String>) -> Self {
        Self {
            kind,
            code: error.type_name().to_string(),
            line: None,
            column: None,
            content: content.into(),
            message: error.to_string(),
        }
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn at(mut self, line: usize, column: usize) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.kind, self.code)?;
        match (self.line, self.column) {
            (Some(line), Some(column)) => write!(f, " at {}:{}", line, column)?,
            (Some(line), None) => write!(f, " at line {}", line)?,
            _ => {}
        }
        write!(f, ": {} ({})", self.message, self.content)
    }
}

/// A batch that could not finish
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("RENDER_WRITE: could not write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(RenderErrorKind::ForBlock.as_str(), "FOR Block");
        assert_eq!(
            serde_json::to_string(&RenderErrorKind::IfBlock).unwrap(),
            "\"IF Block\""
        );
        assert!(RenderErrorKind::Vals.is_setup());
        assert!(!RenderErrorKind::Vars.is_setup());
        assert!(RenderErrorKind::Name.is_row_setup());
    }

    #[test]
    fn test_from_eval_error() {
        let error = RenderError::new(
            RenderErrorKind::Expression,
            &EvalError::Name("x".to_string()),
            "x + 1",
        )
        .at(3, 5);
        assert_eq!(error.code, "NameError");
        assert_eq!(
            error.to_string(),
            "Expression [NameError] at 3:5: name 'x' is not defined (x + 1)"
        );
    }
}
