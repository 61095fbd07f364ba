//! Echoing an offending line with a caret underline
//!
//! ```text
//! $IF{°x°}$°°trailing
//! ^^^^^^^^^
//! ```
//!
//! Tabs are shown as single spaces and spaces as a visible placeholder so leading and
//! trailing blanks can be seen. Carets are aligned by character count, not bytes.

use crate::enna::ast::LineIndex;
use std::ops::Range as ByteRange;

pub const DEFAULT_PLACEHOLDER: &str = "°";

/// The line holding `span` with a caret line under the span
///
/// If the span boundaries split a multi-byte character the window is widened one byte at a
/// time on both sides until every piece decodes. When no window decodes, the bare line is
/// returned, or an empty string if the line itself is not valid UTF-8.
pub fn snippet(
    source: &[u8],
    index: &LineIndex,
    line: usize,
    span: &ByteRange<usize>,
    placeholder: &str,
) -> String {
    let Some(line_span) = index.line_span(line) else {
        return String::new();
    };
    let text: Vec<u8> = source[line_span.clone()]
        .iter()
        .map(|&b| if b == b'\t' { b' ' } else { b })
        .collect();

    // span relative to the line, clamped to it
    let len = text.len();
    let start = span.start.saturating_sub(line_span.start).min(len);
    let end = span.end.saturating_sub(line_span.start).clamp(start, len);

    let widest = start.max(len - end);
    for widen in 0..=widest {
        let window = start.saturating_sub(widen)..(end + widen).min(len);
        if let Some(snippet) = underline(&text, window, placeholder) {
            return snippet;
        }
    }

    std::str::from_utf8(&text)
        .map(|line| line.replace(' ', placeholder))
        .unwrap_or_default()
}

fn underline(text: &[u8], window: ByteRange<usize>, placeholder: &str) -> Option<String> {
    let prefix = std::str::from_utf8(&text[..window.start]).ok()?;
    let middle = std::str::from_utf8(&text[window.clone()]).ok()?;
    let postfix = std::str::from_utf8(&text[window.end..]).ok()?;

    let mut out = format!("{}{}{}", prefix, middle, postfix).replace(' ', placeholder);
    out.push('\n');
    out.push_str(&" ".repeat(prefix.chars().count()));
    out.push_str(&"^".repeat(middle.chars().count()));
    out.push_str(&" ".repeat(postfix.chars().count()));
    Some(out)
}
