//! Human-readable explanations for syntax error codes
//!
//! The codes are stable identifiers shown in error tables; the texts below are what a
//! template author reads next to them.

use crate::enna::ast::ErrorCode;

/// Title and explanation for a known code
pub fn explanation(code: ErrorCode) -> &'static str {
    match code {
        ErrorCode::MultCache => {
            "Error : Multiple cache blocks\n\
             This error happens when a second cache block is opened."
        }
        ErrorCode::EofOpnCache => {
            "Error : Open cache block due to EOF\n\
             This error happens when a cache block is opened and never closed."
        }
        ErrorCode::LbOpnExp => {
            "Error : Open expression due to line break\n\
             This error happens when an expression is opened and a line break occurs before it is closed."
        }
        ErrorCode::EofOpnExp => {
            "Error : Open expression due to EOF\n\
             This error happens when an expression is opened and never closed."
        }
        ErrorCode::LbOpnArg => {
            "Error : Open directive argument due to line break\n\
             This error happens when a directive argument is opened and a line break occurs before it is closed."
        }
        ErrorCode::EofOpnArg => {
            "Error : Open directive argument due to EOF\n\
             This error happens when a directive argument is opened and never closed."
        }
        ErrorCode::EmptyArg => {
            "Error : Empty directive argument\n\
             This error happens when a directive argument has no content."
        }
        ErrorCode::InvIdf => {
            "Error : Invalid identifier\n\
             This error happens when the text immediately following \"val_\" or \"var_\" inside an expression is not a valid ASCII identifier."
        }
        ErrorCode::EofOpnBlk => {
            "Error : Open block due to EOF\n\
             This error happens when a block is opened and never closed."
        }
        ErrorCode::CloseRoot => {
            "Error : Attempted close on ROOT block\n\
             This error happens when there is an attempt to close a block while no block is open."
        }
        ErrorCode::MultDir => {
            "Error : Multiple directives\n\
             This error happens when there is more than one directive in the same line."
        }
        ErrorCode::InvDirPre => {
            "Error : Invalid directive prefix\n\
             This error happens when the line containing a directive also contains code before it. The line must be clear."
        }
        ErrorCode::InvDirPos => {
            "Error : Invalid directive postfix\n\
             This error happens when the line containing a directive also contains code after it. The line must be clear."
        }
        ErrorCode::ElseRoot | ErrorCode::ElseOut => {
            "Error : ELSE without IF\n\
             This error happens when there is an attempt to open an ELSE block without a parent IF block."
        }
        ErrorCode::ElifRoot | ErrorCode::ElifOut => {
            "Error : ELIF without IF\n\
             This error happens when there is an attempt to open an ELIF block without a parent IF block."
        }
        ErrorCode::ElseElif => {
            "Error : ELIF after ELSE\n\
             This error happens when there is an attempt to open an ELIF block after an ELSE block."
        }
        ErrorCode::MultElse => {
            "Error : Multiple ELSE blocks\n\
             This error happens when an IF block already has an ELSE block and another one is opened."
        }
    }
}

/// Message for any code string, known or not
pub fn message(code: &str) -> String {
    match code.parse::<ErrorCode>() {
        Ok(code) => explanation(code).to_string(),
        Err(_) => format!("Unknown error code {}.", code),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_code_has_a_titled_message() {
        for code in ErrorCode::ALL {
            let text = explanation(code);
            assert!(text.starts_with("Error : "), "{}", code);
            assert_eq!(text.lines().count(), 2, "{}", code);
        }
    }

    #[test]
    fn test_message_lookup() {
        insta::assert_snapshot!(message("ELSE_ROOT"), @r###"
        Error : ELSE without IF
        This error happens when there is an attempt to open an ELSE block without a parent IF block.
        "###);
        assert_eq!(message("NOPE"), "Unknown error code NOPE.");
    }
}
