//! Rendering parsed templates
//!
//! [`Renderer`] walks one tree against one scope. [`BatchRenderer`] drives it once per row
//! of a [`BatchJob`], handling the shared setup (modules and vals), per-row bindings, output
//! names, cancellation and writing.
//!
//! Failures split in two classes. Setup failures (a syntax error in the template, a module
//! or a val that does not evaluate) abort the whole batch. Everything else is local: a bad
//! var skips its row, a bad node skips that node.

pub mod batch;
pub mod engine;
pub mod errors;
pub mod finalize;

pub use batch::{
    Abort, BatchJob, BatchRenderer, BatchReport, BatchSettings, Progress, RowOutcome, RowSpec,
    RowStatus,
};
pub use engine::{RenderOutput, Renderer};
pub use errors::{BatchError, RenderError, RenderErrorKind};
pub use finalize::strip_cache_artifacts;
