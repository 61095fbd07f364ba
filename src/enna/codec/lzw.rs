//! LZW over bytes with 16-bit codes
//!
//! The dictionary starts with the 256 single bytes. Every step adds one entry until the
//! dictionary holds 65536 entries; from then on it is frozen on both sides, so codes always
//! fit in a `u16`.

use super::CodecError;
use std::collections::HashMap;

const DICTIONARY_LIMIT: usize = 1 << 16;

pub fn compress(input: &[u8]) -> Vec<u16> {
    let mut dictionary: HashMap<(u16, u8), u16> = HashMap::new();
    let mut next_code = 256usize;
    let mut output = Vec::with_capacity(input.len() / 2 + 1);

    let mut bytes = input.iter();
    let Some(&first) = bytes.next() else {
        return output;
    };
    let mut current = first as u16;

    for &byte in bytes {
        match dictionary.get(&(current, byte)) {
            Some(&code) => current = code,
            None => {
                output.push(current);
                if next_code < DICTIONARY_LIMIT {
                    dictionary.insert((current, byte), next_code as u16);
                    next_code += 1;
                }
                current = byte as u16;
            }
        }
    }

    output.push(current);
    output
}

pub fn decompress(codes: &[u16]) -> Result<Vec<u8>, CodecError> {
    let mut dictionary: Vec<Vec<u8>> = (0..=255u8).map(|b| vec![b]).collect();
    let mut output = Vec::new();

    let Some((&first, rest)) = codes.split_first() else {
        return Ok(output);
    };
    if first > 255 {
        return Err(CodecError::InvalidCode {
            code: first,
            position: 0,
        });
    }
    let mut previous = vec![first as u8];
    output.extend_from_slice(&previous);

    for (i, &code) in rest.iter().enumerate() {
        let entry = match dictionary.get(code as usize) {
            Some(entry) => entry.clone(),
            None if code as usize == dictionary.len() => {
                let mut entry = previous.clone();
                entry.push(previous[0]);
                entry
            }
            None => {
                return Err(CodecError::InvalidCode {
                    code,
                    position: i + 1,
                })
            }
        };

        output.extend_from_slice(&entry);

        if dictionary.len() < DICTIONARY_LIMIT {
            let mut added = previous;
            added.push(entry[0]);
            dictionary.push(added);
        }
        previous = entry;
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        assert!(compress(b"").is_empty());
        assert_eq!(decompress(&[]), Ok(vec![]));
    }

    #[test]
    fn test_repetition_compresses() {
        let input = b"abababababababab";
        let codes = compress(input);
        assert!(codes.len() < input.len());
        assert_eq!(decompress(&codes).unwrap(), input.to_vec());
    }

    #[test]
    fn test_kwkwk_case() {
        // "aaa" makes the decoder see a code that is not in its dictionary yet
        let codes = compress(b"aaaa");
        assert_eq!(codes, vec![97, 256, 97]);
        assert_eq!(decompress(&codes).unwrap(), b"aaaa".to_vec());
    }

    #[test]
    fn test_invalid_code() {
        assert_eq!(
            decompress(&[97, 300]),
            Err(CodecError::InvalidCode {
                code: 300,
                position: 1
            })
        );
        assert!(decompress(&[256]).is_err());
    }

    #[test]
    fn test_frozen_dictionary_round_trip() {
        // Enough distinct pairs to fill the dictionary
        let input: Vec<u8> = (0..200_000u32)
            .map(|i| (i.wrapping_mul(2_654_435_761) >> 13) as u8)
            .collect();
        let codes = compress(&input);
        assert_eq!(decompress(&codes).unwrap(), input);
    }
}
