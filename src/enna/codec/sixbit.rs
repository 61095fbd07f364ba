//! Printable packing of 16-bit codes
//!
//! Codes are streamed little-endian into a bit buffer and emitted six bits at a time as
//! `b'0' + group`, so every output byte lies in `0..=o` (48..=111). The alphabet contains no
//! newline, `$` or `'`, which keeps the payload from ever closing its own cache block.

use super::CodecError;

pub const ALPHABET_START: u8 = b'0';
pub const ALPHABET_END: u8 = ALPHABET_START + 63;

pub fn pack(codes: &[u16]) -> Vec<u8> {
    let mut output = Vec::with_capacity((16 * codes.len() + 5) / 6);
    let mut buffer: u32 = 0;
    let mut bits = 0u32;

    for &code in codes {
        buffer |= (code as u32) << bits;
        bits += 16;
        while bits >= 6 {
            output.push(ALPHABET_START + (buffer & 0x3F) as u8);
            buffer >>= 6;
            bits -= 6;
        }
    }

    if bits > 0 {
        output.push(ALPHABET_START + (buffer & 0x3F) as u8);
    }
    output
}

pub fn unpack(encoded: &[u8]) -> Result<Vec<u16>, CodecError> {
    let mut output = Vec::with_capacity(1 + 3 * encoded.len() / 8);
    let mut buffer: u32 = 0;
    let mut bits = 0u32;

    for (offset, &byte) in encoded.iter().enumerate() {
        if !(ALPHABET_START..=ALPHABET_END).contains(&byte) {
            return Err(CodecError::InvalidByte { byte, offset });
        }
        buffer |= ((byte - ALPHABET_START) as u32) << bits;
        bits += 6;
        while bits >= 16 {
            output.push((buffer & 0xFFFF) as u16);
            buffer >>= 16;
            bits -= 16;
        }
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_code() {
        // 16 bits need three groups, the last one partial
        let packed = pack(&[0xFFFF]);
        assert_eq!(packed, b"oo?".to_vec());
        assert_eq!(unpack(&packed).unwrap(), vec![0xFFFF]);
    }

    #[test]
    fn test_output_is_in_alphabet() {
        let packed = pack(&[0, 1, 0x1234, 0xFFFF, 42]);
        assert!(packed
            .iter()
            .all(|b| (ALPHABET_START..=ALPHABET_END).contains(b)));
        assert_eq!(unpack(&packed).unwrap(), vec![0, 1, 0x1234, 0xFFFF, 42]);
    }

    #[test]
    fn test_rejects_foreign_bytes() {
        assert_eq!(
            unpack(b"00\n0"),
            Err(CodecError::InvalidByte {
                byte: b'\n',
                offset: 2
            })
        );
        assert!(unpack(b"p").is_err());
    }

    #[test]
    fn test_empty() {
        assert!(pack(&[]).is_empty());
        assert_eq!(unpack(b""), Ok(vec![]));
    }
}
