//! Position and location tracking for template sources
//!
//! This module defines the data structures for representing positions and locations in a
//! template, as well as utilities for converting byte offsets to line/column positions.
//!
//! ## Types
//!
//! - [`Position`] - A line:column position (both 1-based)
//! - [`LineIndex`] - Utility for converting byte offsets to positions
//!
//! ## Key Design
//!
//! - **Byte based**: templates are raw bytes, columns count bytes from the start of the line
//! - **1-based**: line 1 column 1 is the first byte, matching what editors display
//! - **Efficient conversion**: O(log n) binary search for byte-to-position conversion
//! - **Total**: offsets past the end clamp to the last position instead of panicking

use serde::Serialize;
use std::fmt;
use std::ops::Range as ByteRange;

/// Represents a position in a template (line and column, 1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

/// Provides fast conversion from byte offsets to line/column positions
///
/// `line_starts[i]` is the byte offset where line `i + 1` begins. A buffer ending in a
/// newline has a final, empty line starting at `len`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineIndex {
    line_starts: Vec<usize>,
    #[serde(skip)]
    len: usize,
}

impl LineIndex {
    /// Build the index for a byte buffer
    pub fn new(source: &[u8]) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            source
                .iter()
                .enumerate()
                .filter(|(_, byte)| **byte == b'\n')
                .map(|(pos, _)| pos + 1),
        );

        Self {
            line_starts,
            len: source.len(),
        }
    }

    /// 1-based line number containing `offset`
    fn line_of(&self, offset: usize) -> usize {
        let offset = offset.min(self.len);
        match self.line_starts.binary_search(&offset) {
            Ok(line) => line + 1,
            Err(line) => line,
        }
    }

    /// Convert a byte offset to a line/column position
    pub fn locate(&self, offset: usize) -> Position {
        let offset = offset.min(self.len);
        let line = self.line_of(offset);
        let column = offset - self.line_starts[line - 1] + 1;

        Position::new(line, column)
    }

    /// Get the total number of lines in the source
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Get the byte offset for the start of a 1-based line
    pub fn line_start(&self, line: usize) -> Option<usize> {
        line.checked_sub(1)
            .and_then(|index| self.line_starts.get(index).copied())
    }

    /// Byte range of a 1-based line, excluding its newline
    pub fn line_span(&self, line: usize) -> Option<ByteRange<usize>> {
        let start = self.line_start(line)?;
        let end = match self.line_starts.get(line) {
            Some(next) => next - 1,
            None => self.len,
        };
        Some(start..end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_display() {
        assert_eq!(Position::new(5, 10).to_string(), "5:10");
    }

    #[test]
    fn test_line_index_starts() {
        let index = LineIndex::new(b"ab\ncd\n\nef");
        assert_eq!(index.line_starts, vec![0, 3, 6, 7]);
        assert_eq!(index.line_count(), 4);
    }

    #[test]
    fn test_locate() {
        let index = LineIndex::new(b"ab\ncd\n\nef");
        assert_eq!(index.locate(0), Position::new(1, 1));
        assert_eq!(index.locate(2), Position::new(1, 3));
        assert_eq!(index.locate(3), Position::new(2, 1));
        assert_eq!(index.locate(6), Position::new(3, 1));
        assert_eq!(index.locate(8), Position::new(4, 2));
    }

    #[test]
    fn test_locate_clamps_past_end() {
        let index = LineIndex::new(b"ab\n");
        assert_eq!(index.locate(100), Position::new(2, 1));
    }

    #[test]
    fn test_empty_source() {
        let index = LineIndex::new(b"");
        assert_eq!(index.line_count(), 1);
        assert_eq!(index.locate(0), Position::new(1, 1));
        assert_eq!(index.line_span(1), Some(0..0));
    }

    #[test]
    fn test_line_span_excludes_newline() {
        let index = LineIndex::new(b"ab\ncd\n");
        assert_eq!(index.line_span(1), Some(0..2));
        assert_eq!(index.line_span(2), Some(3..5));
        assert_eq!(index.line_span(3), Some(6..6));
        assert_eq!(index.line_span(4), None);
        assert_eq!(index.line_span(0), None);
    }
}
