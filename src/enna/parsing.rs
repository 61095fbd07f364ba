//! Parsing: bytes to a directive tree
//!
//! [`parse`] never fails. It returns a [`ParseResult`] with the best-effort tree, every
//! syntax error found, the line index, the embedded cache region and the `val_`/`var_`
//! names referenced by the template.
//!
//! ## Directive syntax
//!
//! ```text
//! text $$ expression $$ text $EXEC{ statements }$ text
//! $FOR{ target in iterable }$
//! $IF{ condition }$
//! $ELIF{ condition }$
//! $ELSE$
//! $END$
//! ```
//!
//! Expressions and `EXEC` are inline and must close on the same line. Block directives must
//! be alone on their line; the whole line, newline included, produces no output.
//!
//! ## Modules
//!
//! - [`parser`] - the line-oriented tree builder
//! - [`block_stack`] - open `FOR`/`IF` frames
//! - [`cache_region`] - embedded cache block detection
//! - [`references`] - `val_`/`var_` discovery through the content automaton

pub mod block_stack;
pub mod cache_region;
pub mod parser;
pub mod references;

pub use cache_region::{CacheLine, CacheRegion};
pub use references::Names;

use crate::enna::ast::{LineIndex, Node, SyntaxError};
use log::debug;
use serde::Serialize;

/// Everything a single parse produces
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseResult {
    pub tree: Vec<Node>,
    pub errors: Vec<SyntaxError>,
    pub line_index: LineIndex,
    pub cache: CacheRegion,
    pub names: Names,
}

impl ParseResult {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// `MULT_CACHE` or `EOF_OPN_CACHE` was reported, so the cache block must not be trusted
    pub fn has_cache_error(&self) -> bool {
        self.errors.iter().any(|e| e.code.is_cache_error())
    }
}

/// Parse a template buffer
pub fn parse(source: &[u8]) -> ParseResult {
    let result = parser::Parser::new(source).parse();
    debug!(
        "parsed {} bytes: {} top-level nodes, {} errors, cache found: {}",
        source.len(),
        result.tree.len(),
        result.errors.len(),
        result.cache.found
    );
    result
}

/// A source buffer together with its parse
///
/// Node ranges index into the buffer the tree was parsed from. Keeping both in one value
/// means a tree can never be rendered against a foreign buffer.
#[derive(Debug, Clone)]
pub struct Template {
    source: Vec<u8>,
    result: ParseResult,
}

impl Template {
    pub fn parse(source: impl Into<Vec<u8>>) -> Self {
        let source = source.into();
        let result = parse(&source);
        Self { source, result }
    }

    pub fn source(&self) -> &[u8] {
        &self.source
    }

    pub fn result(&self) -> &ParseResult {
        &self.result
    }

    pub fn tree(&self) -> &[Node] {
        &self.result.tree
    }

    pub fn errors(&self) -> &[SyntaxError] {
        &self.result.errors
    }

    pub fn names(&self) -> &Names {
        &self.result.names
    }

    pub fn cache(&self) -> &CacheRegion {
        &self.result.cache
    }

    pub fn line_index(&self) -> &LineIndex {
        &self.result.line_index
    }

}
