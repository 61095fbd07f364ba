//! Embedded cache codec
//!
//! A scenario carries its tables and settings inside the template itself, in a block that
//! survives external edits:
//!
//! ```text
//! R'''
//! $$$
//! <encoded payload, wrapped at 126 columns>
//! $$$
//! '''
//! ```
//!
//! [`encode`] compresses bytes with LZW ([`lzw`]) and packs the 16-bit codes into printable
//! 6-bit groups ([`sixbit`]). [`decode`] is its exact inverse. [`embed`] splices an encoded
//! block into a source buffer, [`payload`] defines the versioned JSON document stored in it.

pub mod embed;
pub mod lzw;
pub mod payload;
pub mod sixbit;

pub use embed::{read_payload, rewrite, DEFAULT_LINE_WIDTH};
pub use payload::{CachePayload, ModuleEntry, Settings, TableData, PAYLOAD_VERSION};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("CACHE_INVALID_BYTE: byte {byte:#04x} at offset {offset} is outside the cache alphabet")]
    InvalidByte { byte: u8, offset: usize },

    #[error("CACHE_INVALID_CODE: code {code} at position {position} is not in the dictionary")]
    InvalidCode { code: u16, position: usize },

    #[error("CACHE_JSON: {0}")]
    Json(String),
}

impl From<serde_json::Error> for CodecError {
    fn from(err: serde_json::Error) -> Self {
        CodecError::Json(err.to_string())
    }
}

/// Compress and pack `bytes` into the printable cache alphabet
pub fn encode(bytes: &[u8]) -> Vec<u8> {
    sixbit::pack(&lzw::compress(bytes))
}

/// Inverse of [`encode`]
pub fn decode(encoded: &[u8]) -> Result<Vec<u8>, CodecError> {
    lzw::decompress(&sixbit::unpack(encoded)?)
}

/// Split encoded bytes into lines of at most `width` bytes (`0` means no wrapping)
pub fn wrap(encoded: &[u8], width: usize) -> Vec<&[u8]> {
    if width == 0 {
        return vec![encoded];
    }
    encoded.chunks(width).collect()
}
