//! Token definitions for enna templates
//!
//! The tokens are defined using the logos derive macro over byte slices, so templates do
//! not have to be valid UTF-8. Multi-byte markers win over their single-byte fallbacks by
//! longest match (`$$$` over `$$`, `R'''` over `R`).
use logos::Logos;

/// All possible tokens in an enna template
#[derive(Logos, Debug, PartialEq, Eq, Clone, Copy)]
#[logos(source = [u8])]
pub enum Token {
    // Cache block markers
    #[token("R'''")]
    RawOpen,
    #[token("'''")]
    RawClose,
    #[token("$$$")]
    CacheFence,

    // Expression delimiter, both open and close
    #[token("$$")]
    ExprDelim,

    // Directives taking an argument, closed by `}$`
    #[token("$FOR{")]
    ForOpen,
    #[token("$IF{")]
    IfOpen,
    #[token("$ELIF{")]
    ElifOpen,
    #[token("$EXEC{")]
    ExecOpen,
    #[token("}$")]
    ArgClose,

    // Bare directives
    #[token("$ELSE$")]
    Else,
    #[token("$END$")]
    End,

    #[token("\n")]
    Newline,

    // Spaces and tabs
    #[regex(r"[ \t]+")]
    Whitespace,

    // Text content (catch-all for bytes that cannot start a marker)
    #[regex(r"[^ \t\n$}R']+")]
    Text,

    // Single-byte fallbacks for marker prefixes that did not complete
    #[token("$")]
    Dollar,
    #[token("}")]
    Brace,
    #[token("R")]
    LetterR,
    #[token("'")]
    Quote,
}

/// The kind of block directive a token opens, if any
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveKind {
    For,
    If,
    Elif,
    Else,
    End,
}

impl DirectiveKind {
    pub fn name(&self) -> &'static str {
        match self {
            DirectiveKind::For => "FOR",
            DirectiveKind::If => "IF",
            DirectiveKind::Elif => "ELIF",
            DirectiveKind::Else => "ELSE",
            DirectiveKind::End => "END",
        }
    }

    /// Whether the directive is followed by a `{ .. }$` argument
    pub fn takes_argument(&self) -> bool {
        matches!(
            self,
            DirectiveKind::For | DirectiveKind::If | DirectiveKind::Elif
        )
    }
}

impl Token {
    /// Block directive carried by this token, if any
    pub fn directive(&self) -> Option<DirectiveKind> {
        match self {
            Token::ForOpen => Some(DirectiveKind::For),
            Token::IfOpen => Some(DirectiveKind::If),
            Token::ElifOpen => Some(DirectiveKind::Elif),
            Token::Else => Some(DirectiveKind::Else),
            Token::End => Some(DirectiveKind::End),
            _ => None,
        }
    }

    /// Check if this token opens an expression (`$$$` opens one followed by a `$`)
    pub fn opens_expression(&self) -> bool {
        matches!(self, Token::ExprDelim | Token::CacheFence)
    }

    /// Check if this token is blank content on a line
    pub fn is_whitespace(&self) -> bool {
        matches!(self, Token::Whitespace)
    }

    /// Check if this token is plain text
    pub fn is_text(&self) -> bool {
        matches!(
            self,
            Token::Text
                | Token::Dollar
                | Token::Brace
                | Token::LetterR
                | Token::Quote
                | Token::RawOpen
                | Token::RawClose
                | Token::ArgClose
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &[u8]) -> Vec<Token> {
        Token::lexer(source).map(|t| t.unwrap_or(Token::Text)).collect()
    }

    #[test]
    fn test_directive_tokens() {
        assert_eq!(lex(b"$FOR{"), vec![Token::ForOpen]);
        assert_eq!(lex(b"$IF{"), vec![Token::IfOpen]);
        assert_eq!(lex(b"$ELIF{"), vec![Token::ElifOpen]);
        assert_eq!(lex(b"$EXEC{"), vec![Token::ExecOpen]);
        assert_eq!(lex(b"$ELSE$"), vec![Token::Else]);
        assert_eq!(lex(b"$END$"), vec![Token::End]);
    }

    #[test]
    fn test_longest_marker_wins() {
        assert_eq!(lex(b"$$$"), vec![Token::CacheFence]);
        assert_eq!(lex(b"$$$$"), vec![Token::CacheFence, Token::Dollar]);
        assert_eq!(lex(b"R'''"), vec![Token::RawOpen]);
        assert_eq!(lex(b"R''"), vec![Token::LetterR, Token::Quote, Token::Quote]);
    }

    #[test]
    fn test_expression_line() {
        assert_eq!(
            lex(b"Hi $$ x $$!\n"),
            vec![
                Token::Text,
                Token::Whitespace,
                Token::ExprDelim,
                Token::Whitespace,
                Token::Text,
                Token::Whitespace,
                Token::ExprDelim,
                Token::Text,
                Token::Newline,
            ]
        );
    }

    #[test]
    fn test_text_stops_at_marker_bytes() {
        assert_eq!(lex(b"Roger"), vec![Token::LetterR, Token::Text]);
        assert_eq!(lex(b"a}b"), vec![Token::Text, Token::Brace, Token::Text]);
    }

    #[test]
    fn test_directive_kinds() {
        assert_eq!(Token::ForOpen.directive(), Some(DirectiveKind::For));
        assert_eq!(Token::ExecOpen.directive(), None);
        assert!(DirectiveKind::Elif.takes_argument());
        assert!(!DirectiveKind::End.takes_argument());
    }

    #[test]
    fn test_token_predicates() {
        assert!(Token::CacheFence.opens_expression());
        assert!(Token::ExprDelim.opens_expression());
        assert!(!Token::Dollar.opens_expression());
        assert!(Token::Quote.is_text());
        assert!(!Token::Newline.is_text());
        assert!(Token::Whitespace.is_whitespace());
    }
}
