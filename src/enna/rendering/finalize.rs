//! Output cleanup before rendered bytes are written
//!
//! The `$$$` lines of a cache block never reach the tree, but its `R'''` and `'''` lines are
//! plain text. They render as an empty raw-string shell, which is removed here together
//! with the blank line that separated it from the body.

use once_cell::sync::Lazy;
use regex::bytes::{Captures, Regex};
use std::borrow::Cow;

static CACHE_SHELL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\n\n)?R'''\n+'''\n*").expect("cache shell pattern is a valid regex")
});

/// Strip empty cache shells from rendered output
pub fn strip_cache_artifacts(bytes: &[u8]) -> Cow<'_, [u8]> {
    CACHE_SHELL.replace_all(bytes, |caps: &Captures| {
        if caps.get(1).is_some() {
            b"\n".to_vec()
        } else {
            Vec::new()
        }
    })
}
