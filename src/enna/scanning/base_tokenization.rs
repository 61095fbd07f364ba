//! Base tokenization for enna templates
//!
//! The parser lexes one line at a time with [`LineLexer`], a `logos` cursor that can be
//! repositioned after an argument has been delimited by a byte search. Bytes the lexer
//! cannot classify come back as [`Token::Text`], so every byte is covered by one token.

use crate::enna::scanning::tokens::Token;
use logos::Logos;
use std::ops::Range as ByteRange;

/// A restartable token cursor over `source[start..end]`
///
/// Spans returned are absolute offsets into `source`.
pub struct LineLexer<'s> {
    source: &'s [u8],
    pos: usize,
    end: usize,
}

impl<'s> LineLexer<'s> {
    pub fn new(source: &'s [u8], span: ByteRange<usize>) -> Self {
        Self {
            source,
            pos: span.start,
            end: span.end,
        }
    }

    /// Move the cursor; positions past the end of the line clamp to it
    pub fn seek(&mut self, pos: usize) {
        self.pos = pos.min(self.end);
    }

    /// Find `needle` at or after `from`, without moving the cursor
    pub fn find(&self, from: usize, needle: &[u8]) -> Option<usize> {
        if from >= self.end {
            return None;
        }
        self.source[from..self.end]
            .windows(needle.len())
            .position(|window| window == needle)
            .map(|offset| from + offset)
    }
}

impl<'s> Iterator for LineLexer<'s> {
    type Item = (Token, ByteRange<usize>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.end {
            return None;
        }
        let mut lexer = Token::lexer(&self.source[self.pos..self.end]);
        let token = lexer.next()?.unwrap_or(Token::Text);
        let span = lexer.span();
        let absolute = self.pos + span.start..self.pos + span.end;
        self.pos = absolute.end;
        Some((token, absolute))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenizes_line() {
        let source = b"hello world";
        let tokens: Vec<_> = LineLexer::new(source, 0..source.len()).collect();
        assert_eq!(
            tokens,
            vec![
                (Token::Text, 0..5),
                (Token::Whitespace, 5..6),
                (Token::Text, 6..11)
            ]
        );
    }

    #[test]
    fn test_empty_line() {
        assert_eq!(LineLexer::new(b"", 0..0).next(), None);
    }

    #[test]
    fn test_invalid_utf8_is_text() {
        let source = b"a\xff\xfeb";
        let tokens: Vec<_> = LineLexer::new(source, 0..source.len()).collect();
        let covered: usize = tokens.iter().map(|(_, span)| span.len()).sum();
        assert_eq!(covered, 4);
        assert!(tokens.iter().all(|(token, _)| *token == Token::Text));
    }

    #[test]
    fn test_line_lexer_absolute_spans() {
        let source = b"ab\n  $$ x $$\n";
        let mut lexer = LineLexer::new(source, 3..12);
        assert_eq!(lexer.next(), Some((Token::Whitespace, 3..5)));
        assert_eq!(lexer.next(), Some((Token::ExprDelim, 5..7)));
        assert_eq!(lexer.find(7, b"$$"), Some(10));
        lexer.seek(12);
        assert_eq!(lexer.next(), None);
    }

    #[test]
    fn test_line_lexer_resumes_inside_token() {
        // `$$$` closing an expression leaves a single `$` behind
        let source = b"$$ x $$$";
        let mut lexer = LineLexer::new(source, 0..source.len());
        lexer.seek(7);
        assert_eq!(lexer.next(), Some((Token::Dollar, 7..8)));
    }

    #[test]
    fn test_find_respects_line_end() {
        let source = b"$$ x\n$$";
        let lexer = LineLexer::new(source, 0..4);
        assert_eq!(lexer.find(2, b"$$"), None);
        assert_eq!(lexer.find(10, b"$$"), None);
    }
}
