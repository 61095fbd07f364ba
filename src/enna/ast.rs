//! Directive tree, source ranges and syntax error records
//!
//! The tree never owns source text. Every node stores byte ranges into the buffer it was
//! parsed from, and that buffer travels with the tree (see [`Template`](crate::enna::parsing::Template)).
//!
//! ## Types
//!
//! - [`Node`] - one directive tree node (plain text, expression, exec, for, if)
//! - [`Argument`] - the line and byte range of a directive argument
//! - [`LineIndex`] - byte offset to line/column conversion
//! - [`SyntaxError`] - a parse-time error with a stable [`ErrorCode`]

pub mod error;
pub mod node;
pub mod range;

pub use error::{ErrorCode, ErrorLocation, SyntaxError};
pub use node::{Argument, IfBranch, Node};
pub use range::{LineIndex, Position};
