//! Embedded cache block detection
//!
//! A cache block is a run of whole lines:
//!
//! ```text
//! R'''
//! $$$
//! <payload line>*
//! $$$
//! '''<anything>
//! ```
//!
//! The tracker sees every line before the directive parser does and decides its role: the
//! `$$$` fences and payload lines are hidden from the tree, the `'''` line is kept verbatim
//! as plain text, every other line is parsed normally. Only the first block counts; any
//! later one is `MULT_CACHE` and its lines are hidden without being recorded.

use crate::enna::ast::{ErrorCode, SyntaxError};
use serde::Serialize;
use std::ops::Range as ByteRange;

const RAW_OPEN: &[u8] = b"R'''";
const RAW_CLOSE: &[u8] = b"'''";
const FENCE: &[u8] = b"$$$";

/// One payload line of the cache block
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheLine {
    pub line: usize,
    pub span: ByteRange<usize>,
}

/// Where the embedded cache block sits in the source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheRegion {
    pub found: bool,
    /// From `R'''` to the end of the `'''` line, newline included
    pub location: Option<ByteRange<usize>>,
    pub lines: Vec<CacheLine>,
}

impl CacheRegion {
    /// The payload bytes, lines joined without separators
    pub fn payload(&self, source: &[u8]) -> Vec<u8> {
        self.lines
            .iter()
            .flat_map(|line| source[line.span.clone()].iter().copied())
            .collect()
    }
}

/// What the parser should do with a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineRole {
    /// Parse for directives
    Content,
    /// Keep the whole line as plain text
    Verbatim,
    /// Exclude from the tree
    Hidden,
}

#[derive(Debug)]
struct OpenBlock {
    line: usize,
    start: usize,
    lines: Vec<CacheLine>,
    /// Set once the closing `$$$` fence was seen
    fenced: bool,
    /// A block after the first one; nothing is recorded
    duplicate: bool,
}

#[derive(Debug, Default)]
enum Stage {
    #[default]
    Idle,
    /// The previous line was `R'''`
    Candidate { line: usize, start: usize },
    Open(OpenBlock),
}

#[derive(Debug, Default)]
pub struct CacheTracker {
    stage: Stage,
    opened: bool,
    region: CacheRegion,
}

impl CacheTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify one line; `span` excludes the newline, `end` includes it
    pub fn classify(
        &mut self,
        source: &[u8],
        line: usize,
        span: ByteRange<usize>,
        end: usize,
        errors: &mut Vec<SyntaxError>,
    ) -> LineRole {
        let text = &source[span.clone()];

        match std::mem::take(&mut self.stage) {
            Stage::Open(mut block) => {
                if text == RAW_OPEN {
                    errors.push(SyntaxError::new(
                        ErrorCode::MultCache,
                        line,
                        span.start..span.start + RAW_OPEN.len(),
                    ));
                    self.stage = Stage::Open(block);
                    return LineRole::Hidden;
                }
                if block.fenced && text.starts_with(RAW_CLOSE) {
                    self.close(block, end);
                    return LineRole::Verbatim;
                }
                if text == FENCE {
                    block.fenced = true;
                } else {
                    block.fenced = false;
                    if !block.duplicate {
                        block.lines.push(CacheLine { line, span });
                    }
                }
                self.stage = Stage::Open(block);
                LineRole::Hidden
            }
            Stage::Candidate { line: open_line, start } if text == FENCE => {
                let duplicate = self.opened;
                if duplicate {
                    errors.push(SyntaxError::new(
                        ErrorCode::MultCache,
                        open_line,
                        start..start + RAW_OPEN.len(),
                    ));
                }
                self.opened = true;
                self.stage = Stage::Open(OpenBlock {
                    line: open_line,
                    start,
                    lines: Vec::new(),
                    fenced: false,
                    duplicate,
                });
                LineRole::Hidden
            }
            Stage::Candidate { .. } | Stage::Idle => {
                if text == RAW_OPEN {
                    self.stage = Stage::Candidate {
                        line,
                        start: span.start,
                    };
                }
                LineRole::Content
            }
        }
    }

    fn close(&mut self, block: OpenBlock, end: usize) {
        if block.duplicate {
            return;
        }
        self.region = CacheRegion {
            found: true,
            location: Some(block.start..end),
            lines: block.lines,
        };
    }

    /// Report a block still open at end of input
    pub fn finish(self, errors: &mut Vec<SyntaxError>) -> CacheRegion {
        if let Stage::Open(block) = self.stage {
            errors.push(SyntaxError::new(
                ErrorCode::EofOpnCache,
                block.line,
                block.start..block.start + RAW_OPEN.len(),
            ));
        }
        self.region
    }
}
