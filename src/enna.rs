//! Main module for enna library functionality

pub mod ast;
pub mod codec;
pub mod config;
pub mod diagnostics;
pub mod io;
pub mod parsing;
pub mod rendering;
pub mod scanning;
pub mod scenario;
pub mod script;
pub mod testing;
