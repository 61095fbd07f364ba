//! # enna
//!
//! A parser, cache codec and renderer for enna scenario templates.
//!
//! A scenario is a plain text file interleaved with directives:
//!
//! ```text
//! Hello $$ val_name $$!
//! $FOR{ item in var_items }$
//!     - $$ item $$
//! $END$
//! ```
//!
//! File Layout
//!
//! The library follows the data flow of a render:
//!
//!     raw bytes -> scanning -> parsing -> (tree, errors, cache region, names)
//!               -> codec (embedded cache payload) -> rendering -> output bytes
//!
//! src/enna
//!   ├── ast          Tree nodes, ranges and syntax error records
//!   ├── scanning     logos tokens and the explicit byte automata
//!   ├── parsing      Error tolerant, single pass tree builder
//!   ├── codec        Embedded cache encoding and file rewrite
//!   ├── script       Expression evaluation capability and built-in interpreter
//!   ├── rendering    Tree walking renderer and batch rendering
//!   ├── diagnostics  Snippets, message catalog and error tables
//!   ├── scenario     File level orchestration (load, sync, save, render)
//!   ├── io           Retrying reads and atomic writes
//!   └── config       Layered configuration

pub mod enna;

pub use enna::parsing::{parse, ParseResult, Template};
pub use enna::rendering::{RenderOutput, Renderer};
pub use enna::script::{Interpreter, Scope, ScriptEvaluator, Value};
