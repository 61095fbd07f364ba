//! Splicing the cache block into a source buffer
//!
//! Only the bytes of the cache region change. Everything before `R'''` and after the `'''`
//! line is copied untouched, so rewriting the same payload twice gives the same file.

use super::{encode, wrap};
use crate::enna::parsing::CacheRegion;

pub const DEFAULT_LINE_WIDTH: usize = 126;

const BLOCK_OPEN: &[u8] = b"R'''\n$$$\n";
const BLOCK_CLOSE: &[u8] = b"\n$$$\n'''\n";

/// The encoded payload stored in `region`, lines joined
pub fn read_payload(source: &[u8], region: &CacheRegion) -> Vec<u8> {
    region.payload(source)
}

/// A complete cache block holding `payload`
pub fn block(payload: &[u8], width: usize) -> Vec<u8> {
    let encoded = encode(payload);
    let mut out = Vec::with_capacity(encoded.len() + encoded.len() / width.max(1) + 20);
    out.extend_from_slice(BLOCK_OPEN);
    out.extend_from_slice(&wrap(&encoded, width).join(&b'\n'));
    out.extend_from_slice(BLOCK_CLOSE);
    out
}

/// Replace the cache region of `source` with a block holding `payload`
///
/// Without a region the block is appended after a blank line.
pub fn rewrite(source: &[u8], region: &CacheRegion, payload: &[u8], width: usize) -> Vec<u8> {
    let block = block(payload, width);

    match (&region.location, region.found) {
        (Some(location), true) => {
            let mut out = Vec::with_capacity(source.len() + block.len());
            out.extend_from_slice(&source[..location.start]);
            out.extend_from_slice(&block);
            out.extend_from_slice(&source[location.end..]);
            out
        }
        _ => {
            let mut out = Vec::with_capacity(source.len() + block.len() + 2);
            out.extend_from_slice(source);
            out.extend_from_slice(b"\n\n");
            out.extend_from_slice(&block);
            out
        }
    }
}
