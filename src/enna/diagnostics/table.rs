//! Error table rows
//!
//! Syntax and render errors end up in one table with the columns
//! `Error Code | Error Type | Lin | Col | Content | What`.

use super::{messages, snippet};
use crate::enna::ast::{LineIndex, SyntaxError};
use crate::enna::rendering::RenderError;
use serde::Serialize;
use std::fmt::Write;

pub const COLUMNS: [&str; 6] = ["Error Code", "Error Type", "Lin", "Col", "Content", "What"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorRow {
    pub code: String,
    pub kind: String,
    pub line: Option<usize>,
    pub column: Option<usize>,
    pub content: String,
    pub message: String,
}

impl ErrorRow {
    /// A syntax error, with a caret snippet as content and the catalog text as message
    pub fn from_syntax(
        error: &SyntaxError,
        source: &[u8],
        index: &LineIndex,
        placeholder: &str,
    ) -> Self {
        let span = error.span();
        let column = index
            .line_start(error.line())
            .map(|start| span.start.saturating_sub(start) + 1);
        Self {
            code: error.code.as_str().to_string(),
            kind: "Syntax".to_string(),
            line: Some(error.line()),
            column,
            content: snippet::snippet(source, index, error.line(), &span, placeholder),
            message: messages::explanation(error.code).to_string(),
        }
    }

    pub fn cells(&self) -> [String; 6] {
        let number = |n: Option<usize>| n.map(|n| n.to_string()).unwrap_or_default();
        [
            self.code.clone(),
            self.kind.clone(),
            number(self.line),
            number(self.column),
            self.content.clone(),
            self.message.clone(),
        ]
    }
}

impl From<&RenderError> for ErrorRow {
    fn from(error: &RenderError) -> Self {
        Self {
            code: error.code.clone(),
            kind: error.kind.as_str().to_string(),
            line: error.line,
            column: error.column,
            content: error.content.clone(),
            message: error.message.clone(),
        }
    }
}

/// Plain-text listing of rows, one block per error
pub fn format_rows(rows: &[ErrorRow]) -> String {
    let mut out = String::new();
    for row in rows {
        let [code, kind, line, column, content, message] = row.cells();
        let _ = write!(out, "{} ({})", code, kind);
        match (line.is_empty(), column.is_empty()) {
            (false, false) => {
                let _ = write!(out, " at {}:{}", line, column);
            }
            (false, true) => {
                let _ = write!(out, " at line {}", line);
            }
            _ => {}
        }
        out.push('\n');
        for text in [content, message] {
            for piece in text.lines() {
                out.push_str("  | ");
                out.push_str(piece);
                out.push('\n');
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enna::ast::ErrorCode;
    use crate::enna::rendering::RenderErrorKind;
    use crate::enna::script::EvalError;

    #[test]
    fn test_syntax_row() {
        let source = b"a\n$ELSE$\n";
        let index = LineIndex::new(source);
        let error = SyntaxError::new(ErrorCode::ElseRoot, 2, 2..8);
        let row = ErrorRow::from_syntax(&error, source, &index, "°");
        assert_eq!(row.code, "ELSE_ROOT");
        assert_eq!(row.kind, "Syntax");
        assert_eq!((row.line, row.column), (Some(2), Some(1)));
        assert_eq!(row.content, "$ELSE$\n^^^^^^");
        assert!(row.message.starts_with("Error : ELSE without IF"));
    }

    #[test]
    fn test_render_row() {
        let error = RenderError::new(
            RenderErrorKind::Vals,
            &EvalError::Name("y".to_string()),
            "val_x = y",
        );
        let row = ErrorRow::from(&error);
        assert_eq!(
            row.cells(),
            [
                "NameError".to_string(),
                "Vals".to_string(),
                String::new(),
                String::new(),
                "val_x = y".to_string(),
                "name 'y' is not defined".to_string(),
            ]
        );
    }

    #[test]
    fn test_format_rows() {
        let rows = vec![ErrorRow {
            code: "EOF_OPN_BLK".to_string(),
            kind: "Syntax".to_string(),
            line: Some(3),
            column: Some(1),
            content: "$IF{°x°}$\n^^^^^^^^^".to_string(),
            message: "Error : Open block due to EOF\nThis error happens when a block is opened and never closed."
                .to_string(),
        }];
        insta::assert_snapshot!(format_rows(&rows), @r###"
        EOF_OPN_BLK (Syntax) at 3:1
          | $IF{°x°}$
          | ^^^^^^^^^
          | Error : Open block due to EOF
          | This error happens when a block is opened and never closed.
        "###);
    }
}
