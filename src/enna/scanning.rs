//! Scanning: raw bytes to tokens and byte-level automata
//!
//! Two complementary mechanisms live here:
//!
//! - [`tokens::Token`] is a `logos` lexer over raw bytes. The parser walks one line at a time
//!   and lexes lazily from any byte offset ([`base_tokenization::LineLexer`]), which lets it
//!   resume right after an argument close that splits a token (`$$$` closing an expression).
//! - [`dfa`] holds the two explicit 256-column transition tables: the 6-state version-run
//!   automaton used for file names and the 18-state content automaton that validates
//!   `val_`/`var_` references inside directive arguments.
//!
//! Tokenizing is total: bytes logos cannot classify (invalid UTF-8) become [`Token::Text`].

pub mod base_tokenization;
pub mod dfa;
pub mod tokens;

pub use base_tokenization::LineLexer;
pub use dfa::{default_script_stem, find_version, TransitionTable, CONTENT_DFA, NAME_DFA};
pub use tokens::Token;
