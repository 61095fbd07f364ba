//! `val_` / `var_` reference discovery
//!
//! Directive arguments are run through [`CONTENT_DFA`] starting in the "just opened" state.
//! Whenever the automaton spells a `val_`/`var_` prefix followed by an identifier, the
//! identifier is registered. A prefix followed by anything else is `INV_IDF`; the raw word
//! after the prefix is still registered so the reference stays visible in the tables.
//!
//! The automaton does not require a word boundary before the prefix, so `interval_x` also
//! registers `x` as a val.

use crate::enna::ast::{ErrorCode, SyntaxError};
use crate::enna::scanning::dfa::{content, CONTENT_DFA};
use serde::Serialize;
use std::collections::BTreeSet;
use std::ops::Range as ByteRange;

/// Identifiers referenced through `var_<name>` and `val_<name>`, sorted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Names {
    pub vars: BTreeSet<String>,
    pub vals: BTreeSet<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Prefix {
    Val,
    Var,
}

impl Names {
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty() && self.vals.is_empty()
    }

    fn insert(&mut self, prefix: Prefix, name: &[u8]) {
        if name.is_empty() {
            return;
        }
        let name = String::from_utf8_lossy(name).into_owned();
        match prefix {
            Prefix::Val => self.vals.insert(name),
            Prefix::Var => self.vars.insert(name),
        };
    }
}

/// Scan one argument and register every reference it contains
///
/// `span` is the argument's byte range in `source`; errors are reported against `line`.
pub fn register_references(
    source: &[u8],
    span: ByteRange<usize>,
    line: usize,
    names: &mut Names,
    errors: &mut Vec<SyntaxError>,
) {
    let mut state = content::OPEN;
    let mut prefix_start = span.start;
    let mut prefix = Prefix::Val;
    let mut ident_start = span.start;

    for pos in span.clone() {
        let byte = source[pos];
        let next = CONTENT_DFA.next(state, byte);

        match (state, next) {
            (_, content::V) => prefix_start = pos,
            (content::VAL, content::PREFIX) => prefix = Prefix::Val,
            (content::VAR, content::PREFIX) => prefix = Prefix::Var,
            (content::PREFIX, content::IDENT) => ident_start = pos,
            (content::IDENT, next) if next != content::IDENT => {
                names.insert(prefix, &source[ident_start..pos]);
            }
            (content::PREFIX, _) => {
                errors.push(SyntaxError::new(
                    ErrorCode::InvIdf,
                    line,
                    prefix_start..pos + 1,
                ));
                names.insert(prefix, raw_word(&source[pos..span.end]));
            }
            _ => {}
        }

        state = match next {
            content::INVALID => content::BODY,
            content::PREFIX_NEWLINE => content::NEWLINE,
            content::COMMENT | content::NUL => return,
            other => other,
        };
    }

    match state {
        content::IDENT => names.insert(prefix, &source[ident_start..span.end]),
        content::PREFIX => errors.push(SyntaxError::new(
            ErrorCode::InvIdf,
            line,
            prefix_start..span.end,
        )),
        _ => {}
    }
}

/// The word starting at the offending byte: identifier bytes and anything non-ASCII
fn raw_word(bytes: &[u8]) -> &[u8] {
    let len = bytes
        .iter()
        .take_while(|b| b.is_ascii_alphanumeric() || **b == b'_' || **b >= 0x80)
        .count();
    &bytes[..len]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(argument: &[u8]) -> (Names, Vec<SyntaxError>) {
        let mut names = Names::default();
        let mut errors = Vec::new();
        register_references(argument, 0..argument.len(), 1, &mut names, &mut errors);
        (names, errors)
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_registers_vals_and_vars() {
        let (names, errors) = scan(b" val_name + var_count * 2 ");
        assert!(errors.is_empty());
        assert_eq!(names.vals, set(&["name"]));
        assert_eq!(names.vars, set(&["count"]));
    }

    #[test]
    fn test_identifier_at_end_of_argument() {
        let (names, _) = scan(b"var_x1_y");
        assert_eq!(names.vars, set(&["x1_y"]));
    }

    #[test]
    fn test_invalid_identifier_registers_raw_word() {
        let (names, errors) = scan(b" val_1abc ");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ErrorCode::InvIdf);
        assert_eq!(errors[0].span(), 1..6);
        assert_eq!(names.vals, set(&["1abc"]));
    }

    #[test]
    fn test_prefix_at_end_is_invalid() {
        let (names, errors) = scan(b" x + var_");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].span(), 5..9);
        assert!(names.is_empty());
    }

    #[test]
    fn test_scanning_continues_after_invalid() {
        let (names, errors) = scan(b"val_? + var_ok");
        assert_eq!(errors.len(), 1);
        assert_eq!(names.vars, set(&["ok"]));
    }

    #[test]
    fn test_comment_stops_scanning() {
        let (names, errors) = scan(b"# val_hidden");
        assert!(errors.is_empty());
        assert!(names.is_empty());
    }

    #[test]
    fn test_no_word_boundary_required() {
        let (names, _) = scan(b" interval_x ");
        assert_eq!(names.vals, set(&["x"]));
    }

    #[test]
    fn test_multiple_references_sorted() {
        let (names, _) = scan(b"var_b, var_a, var_b");
        assert_eq!(names.vars.iter().collect::<Vec<_>>(), vec!["a", "b"]);
    }
}
