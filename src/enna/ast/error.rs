//! Syntax error records
//!
//! Parsing never fails: malformed input produces a best-effort tree plus a list of
//! [`SyntaxError`]s. Each error carries a stable [`ErrorCode`] whose string form is part of
//! the public contract (the diagnostics catalog maps it to a human message).

use serde::{Serialize, Serializer};
use std::fmt;
use std::ops::Range as ByteRange;
use std::str::FromStr;

/// Stable identifiers for every syntax error the parser can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorCode {
    /// A second cache block was opened
    MultCache,
    /// A cache block was still open at end of file
    EofOpnCache,
    /// Line break inside an expression
    LbOpnExp,
    /// End of file inside an expression
    EofOpnExp,
    /// Line break inside a directive argument
    LbOpnArg,
    /// End of file inside a directive argument
    EofOpnArg,
    /// Directive argument is empty or blank
    EmptyArg,
    /// `val_`/`var_` followed by something that is not an identifier
    InvIdf,
    /// A block (`FOR`/`IF`) was still open at end of file
    EofOpnBlk,
    /// `$END$` with no open block
    CloseRoot,
    /// More than one block directive on one line
    MultDir,
    /// Code before a block directive
    InvDirPre,
    /// Code after a block directive
    InvDirPos,
    ElseRoot,
    ElseOut,
    ElifRoot,
    ElifOut,
    /// `ELIF` after `ELSE` in the same chain
    ElseElif,
    /// A second `ELSE` in the same chain
    MultElse,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 19] = [
        ErrorCode::MultCache,
        ErrorCode::EofOpnCache,
        ErrorCode::LbOpnExp,
        ErrorCode::EofOpnExp,
        ErrorCode::LbOpnArg,
        ErrorCode::EofOpnArg,
        ErrorCode::EmptyArg,
        ErrorCode::InvIdf,
        ErrorCode::EofOpnBlk,
        ErrorCode::CloseRoot,
        ErrorCode::MultDir,
        ErrorCode::InvDirPre,
        ErrorCode::InvDirPos,
        ErrorCode::ElseRoot,
        ErrorCode::ElseOut,
        ErrorCode::ElifRoot,
        ErrorCode::ElifOut,
        ErrorCode::ElseElif,
        ErrorCode::MultElse,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::MultCache => "MULT_CACHE",
            ErrorCode::EofOpnCache => "EOF_OPN_CACHE",
            ErrorCode::LbOpnExp => "LB_OPN_EXP",
            ErrorCode::EofOpnExp => "EOF_OPN_EXP",
            ErrorCode::LbOpnArg => "LB_OPN_ARG",
            ErrorCode::EofOpnArg => "EOF_OPN_ARG",
            ErrorCode::EmptyArg => "EMPTY_ARG",
            ErrorCode::InvIdf => "INV_IDF",
            ErrorCode::EofOpnBlk => "EOF_OPN_BLK",
            ErrorCode::CloseRoot => "CLOSE_ROOT",
            ErrorCode::MultDir => "MULT_DIR",
            ErrorCode::InvDirPre => "INV_DIR_PRE",
            ErrorCode::InvDirPos => "INV_DIR_POS",
            ErrorCode::ElseRoot => "ELSE_ROOT",
            ErrorCode::ElseOut => "ELSE_OUT",
            ErrorCode::ElifRoot => "ELIF_ROOT",
            ErrorCode::ElifOut => "ELIF_OUT",
            ErrorCode::ElseElif => "ELSE_ELIF",
            ErrorCode::MultElse => "MULT_ELSE",
        }
    }

    /// Errors that make the embedded cache block untrustworthy
    pub fn is_cache_error(&self) -> bool {
        matches!(self, ErrorCode::MultCache | ErrorCode::EofOpnCache)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ErrorCode::ALL
            .iter()
            .find(|code| code.as_str() == s)
            .copied()
            .ok_or_else(|| format!("Unknown error code {}", s))
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Where an error was found: the 1-based line and the offending byte range
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ErrorLocation {
    pub line: usize,
    pub span: ByteRange<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SyntaxError {
    pub code: ErrorCode,
    pub location: ErrorLocation,
}

impl SyntaxError {
    pub fn new(code: ErrorCode, line: usize, span: ByteRange<usize>) -> Self {
        Self {
            code,
            location: ErrorLocation { line, span },
        }
    }

    pub fn line(&self) -> usize {
        self.location.line
    }

    pub fn span(&self) -> ByteRange<usize> {
        self.location.span.clone()
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at line {} (bytes {}..{})",
            self.code, self.location.line, self.location.span.start, self.location.span.end
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip_through_strings() {
        for code in ErrorCode::ALL {
            assert_eq!(code.as_str().parse::<ErrorCode>(), Ok(code));
        }
    }

    #[test]
    fn test_unknown_code() {
        assert!("NOPE".parse::<ErrorCode>().is_err());
    }

    #[test]
    fn test_cache_errors() {
        assert!(ErrorCode::MultCache.is_cache_error());
        assert!(ErrorCode::EofOpnCache.is_cache_error());
        assert!(!ErrorCode::EofOpnBlk.is_cache_error());
    }

    #[test]
    fn test_display() {
        let error = SyntaxError::new(ErrorCode::ElseRoot, 3, 10..16);
        assert_eq!(error.to_string(), "ELSE_ROOT at line 3 (bytes 10..16)");
    }

    #[test]
    fn test_serialize_code_as_string() {
        let error = SyntaxError::new(ErrorCode::InvIdf, 1, 3..8);
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(json["code"], "INV_IDF");
        assert_eq!(json["location"]["line"], 1);
    }
}
