//! Turning errors into something a template author can act on
//!
//! - [`snippet`] - the offending line with a caret underline
//! - [`messages`] - the fixed code to explanation catalog
//! - [`table`] - rows of the error table shared by syntax and render errors

pub mod messages;
pub mod snippet;
pub mod table;

pub use messages::message;
pub use snippet::{snippet, DEFAULT_PLACEHOLDER};
pub use table::{format_rows, ErrorRow};

use crate::enna::ast::{LineIndex, Position};
use crate::enna::parsing::Template;
use crate::enna::rendering::RenderError;

/// Line and column of a byte offset
pub fn locate(index: &LineIndex, offset: usize) -> Position {
    index.locate(offset)
}

/// One row per syntax error of `template`, in source order
pub fn syntax_rows(template: &Template, placeholder: &str) -> Vec<ErrorRow> {
    let mut errors: Vec<_> = template.errors().iter().collect();
    errors.sort_by_key(|error| (error.line(), error.span().start));
    errors
        .into_iter()
        .map(|error| {
            ErrorRow::from_syntax(error, template.source(), template.line_index(), placeholder)
        })
        .collect()
}

pub fn render_rows(errors: &[RenderError]) -> Vec<ErrorRow> {
    errors.iter().map(ErrorRow::from).collect()
}
