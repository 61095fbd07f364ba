//! Explicit byte automata
//!
//! Both automata are plain `N x 256` transition tables, built once by generator functions and
//! shared through `once_cell` statics. No regex engine runs over template content.
//!
//! ## Version automaton ([`NAME_DFA`], 6 states)
//!
//! Recognizes `digits(.digits)+` runs inside file names, e.g. the `1.2` in `case_1.2.enna`.
//!
//! | state | meaning                        |
//! |-------|--------------------------------|
//! | 0     | outside a run                  |
//! | 1     | digits                         |
//! | 2     | digits then `.`                |
//! | 3     | a complete version (accepting) |
//! | 4     | version then `.`               |
//! | 5     | run finished (sink)            |
//!
//! ## Content automaton ([`CONTENT_DFA`], 18 states)
//!
//! Classifies expression bytes from the `$$` opener on. Character classes: digits, lower,
//! upper, blank (space, tab), newline, `$`, `_`, `#`, the letters `v` `a` `l` `r`, NUL and
//! everything else. See [`content`] for the state names.

use once_cell::sync::Lazy;
use std::ops::Range as ByteRange;

const DIGIT_BYTES: &[u8] = b"0123456789";
const LOWER_BYTES: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const UPPER_BYTES: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const BLANK_BYTES: &[u8] = b" \t";

/// A deterministic automaton over bytes with `N` states
#[derive(Clone, PartialEq, Eq)]
pub struct TransitionTable<const N: usize> {
    table: [[u8; 256]; N],
}

impl<const N: usize> TransitionTable<N> {
    fn new() -> Self {
        Self {
            table: [[0; 256]; N],
        }
    }

    /// Set every byte of `state` to `target`
    fn fill(&mut self, state: u8, target: u8) {
        self.table[state as usize] = [target; 256];
    }

    fn set(&mut self, state: u8, bytes: &[u8], target: u8) {
        for &byte in bytes {
            self.table[state as usize][byte as usize] = target;
        }
    }

    fn set_states(&mut self, states: &[u8], bytes: &[u8], target: u8) {
        for &state in states {
            self.set(state, bytes, target);
        }
    }

    /// Next state after reading `byte` in `state`
    pub fn next(&self, state: u8, byte: u8) -> u8 {
        self.table[state as usize][byte as usize]
    }

    /// Final state after reading all of `bytes` from `start`
    pub fn run(&self, start: u8, bytes: &[u8]) -> u8 {
        bytes.iter().fold(start, |state, &byte| self.next(state, byte))
    }

    pub fn state_count(&self) -> usize {
        N
    }

    pub fn row(&self, state: u8) -> &[u8; 256] {
        &self.table[state as usize]
    }
}

impl<const N: usize> std::fmt::Debug for TransitionTable<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitionTable")
            .field("states", &N)
            .finish()
    }
}

/// State names of the version automaton
pub mod name {
    pub const OUTSIDE: u8 = 0;
    pub const DIGITS: u8 = 1;
    pub const DOT: u8 = 2;
    pub const VERSION: u8 = 3;
    pub const VERSION_DOT: u8 = 4;
    pub const DONE: u8 = 5;
}

/// State names of the content automaton
pub mod content {
    pub const TEXT: u8 = 0x00;
    pub const LINE_START: u8 = 0x01;
    pub const DOLLAR: u8 = 0x02;
    /// Just after `$$`
    pub const OPEN: u8 = 0x03;
    pub const BLANK: u8 = 0x04;
    pub const NEWLINE: u8 = 0x05;
    pub const BODY: u8 = 0x06;
    pub const V: u8 = 0x07;
    pub const VA: u8 = 0x08;
    pub const VAL: u8 = 0x09;
    pub const VAR: u8 = 0x0A;
    /// After `val_` or `var_`, an identifier must follow
    pub const PREFIX: u8 = 0x0B;
    pub const IDENT: u8 = 0x0C;
    /// A `$` inside the expression, a second one closes it
    pub const CLOSE: u8 = 0x0D;
    pub const COMMENT: u8 = 0x0E;
    pub const NUL: u8 = 0x0F;
    /// Newline right after a `val_`/`var_` prefix
    pub const PREFIX_NEWLINE: u8 = 0x10;
    /// Anything else right after a `val_`/`var_` prefix
    pub const INVALID: u8 = 0x11;
}

fn build_name_dfa() -> TransitionTable<6> {
    use name::*;

    let mut dfa = TransitionTable::new();
    for state in [OUTSIDE, DIGITS, DOT] {
        dfa.fill(state, OUTSIDE);
    }
    for state in [VERSION, VERSION_DOT, DONE] {
        dfa.fill(state, DONE);
    }

    dfa.set(DIGITS, b".", DOT);
    dfa.set(VERSION, b".", VERSION_DOT);

    dfa.set_states(&[OUTSIDE, DIGITS], DIGIT_BYTES, DIGITS);
    dfa.set_states(&[DOT, VERSION, VERSION_DOT], DIGIT_BYTES, VERSION);
    dfa
}

fn build_content_dfa() -> TransitionTable<18> {
    use content::*;

    let expression = [OPEN, BLANK, NEWLINE, BODY, V, VA, VAL, VAR, IDENT, CLOSE];

    let mut dfa = TransitionTable::new();
    for state in [TEXT, LINE_START, DOLLAR] {
        dfa.fill(state, TEXT);
    }
    for state in expression {
        dfa.fill(state, BODY);
    }
    dfa.fill(PREFIX, INVALID);
    for sink in [COMMENT, NUL, PREFIX_NEWLINE, INVALID] {
        dfa.fill(sink, sink);
    }

    // NUL sinks everything
    for state in 0..18 {
        dfa.set(state, &[0], NUL);
    }

    dfa.set_states(&[TEXT, LINE_START, DOLLAR], b"\n", LINE_START);
    dfa.set_states(&expression, b"\n", NEWLINE);
    dfa.set(PREFIX, b"\n", PREFIX_NEWLINE);

    dfa.set_states(&[TEXT, LINE_START], b"$", DOLLAR);
    dfa.set(DOLLAR, b"$", OPEN);
    dfa.set_states(
        &[OPEN, BLANK, NEWLINE, BODY, V, VA, VAL, VAR, IDENT],
        b"$",
        CLOSE,
    );
    dfa.set(CLOSE, b"$", TEXT);

    dfa.set_states(&[OPEN, BLANK], BLANK_BYTES, BLANK);

    dfa.set_states(&[PREFIX, IDENT], LOWER_BYTES, IDENT);
    dfa.set_states(&[PREFIX, IDENT], UPPER_BYTES, IDENT);
    dfa.set(IDENT, DIGIT_BYTES, IDENT);

    dfa.set_states(&[VAL, VAR], b"_", PREFIX);
    dfa.set(IDENT, b"_", IDENT);

    dfa.set(OPEN, b"#", COMMENT);
    dfa.set(CLOSE, b"#", INVALID);

    dfa.set_states(&[OPEN, BLANK, NEWLINE, BODY], b"v", V);
    dfa.set(V, b"a", VA);
    dfa.set(VA, b"l", VAL);
    dfa.set(VA, b"r", VAR);
    dfa
}

/// Version-run automaton over file names
pub static NAME_DFA: Lazy<TransitionTable<6>> = Lazy::new(build_name_dfa);

/// Expression content automaton
pub static CONTENT_DFA: Lazy<TransitionTable<18>> = Lazy::new(build_content_dfa);

/// Byte range of the first `digits(.digits)+` run in `name`
pub fn find_version(file_name: &[u8]) -> Option<ByteRange<usize>> {
    let mut state = name::OUTSIDE;
    let mut start = 0;

    for (pos, &byte) in file_name.iter().enumerate() {
        let next = NAME_DFA.next(state, byte);
        if state == name::OUTSIDE && next == name::DIGITS {
            start = pos;
        }
        if next == name::DONE {
            let end = if state == name::VERSION_DOT { pos - 1 } else { pos };
            return Some(start..end);
        }
        state = next;
    }

    match state {
        name::VERSION => Some(start..file_name.len()),
        name::VERSION_DOT => Some(start..file_name.len() - 1),
        _ => None,
    }
}

/// Script name template derived from a scenario file stem
///
/// The row index placeholder goes right after the first version run, or at the end:
/// `case_1.2_x` becomes `case_1.2.{script_index:0>3}_x`, `case` becomes
/// `case.{script_index:0>3}`.
pub fn default_script_stem(stem: &str) -> String {
    const PLACEHOLDER: &str = ".{script_index:0>3}";

    match find_version(stem.as_bytes()) {
        Some(run) => format!("{}{}{}", &stem[..run.end], PLACEHOLDER, &stem[run.end..]),
        None => format!("{}{}", stem, PLACEHOLDER),
    }
}
