//! Base-36 bit-unpacker for packed permission chunks.
//!
//! phpBB packs 31 permission bits into runs of 6 base-36 characters. One
//! chunk expands to a fixed-width 31-character binary string; chunks repeat
//! heavily across lines and users, so results are memoized process-wide.

use std::collections::HashMap;
use std::sync::Mutex;

use once_cell::sync::Lazy;

use crate::constants::GROUP_BITS;
use crate::error::{PhpbbError, Result};

static CHUNK_MEMO: Lazy<Mutex<HashMap<String, String>>> = Lazy::new(|| Mutex::new(HashMap::new()));

/// Expands one packed chunk into its 31-bit binary string.
///
/// The chunk must be 1 to 6 characters of `0-9a-z`. Values whose minimal
/// binary form is already 31 bits or wider are returned without padding
/// and without truncation.
///
/// # Errors
/// Returns [`PhpbbError::MalformedPermissionChunk`] when the chunk contains
/// a character outside the base-36 digit set. `forum` is only used to
/// report where in the blob the bad chunk sat.
pub fn unpack_chunk(chunk: &str, forum: usize) -> Result<String> {
    if let Ok(memo) = CHUNK_MEMO.lock() {
        if let Some(bits) = memo.get(chunk) {
            return Ok(bits.clone());
        }
    }

    let bits = unpack_chunk_uncached(chunk, forum)?;

    if let Ok(mut memo) = CHUNK_MEMO.lock() {
        memo.insert(chunk.to_string(), bits.clone());
    }
    Ok(bits)
}

/// The pure conversion behind [`unpack_chunk`]; correctness never depends
/// on the memo.
pub fn unpack_chunk_uncached(chunk: &str, forum: usize) -> Result<String> {
    // Reject what u64::from_str_radix would otherwise tolerate: an empty
    // chunk, a leading `+`, or uppercase digits phpBB never emits.
    let valid = !chunk.is_empty() && chunk.bytes().all(|b| b.is_ascii_digit() || b.is_ascii_lowercase());
    if !valid {
        return Err(PhpbbError::MalformedPermissionChunk {
            chunk: chunk.to_string(),
            forum,
        });
    }

    let value =
        u64::from_str_radix(chunk, 36).map_err(|_| PhpbbError::MalformedPermissionChunk {
            chunk: chunk.to_string(),
            forum,
        })?;

    let binary = format!("{value:b}");
    if binary.len() >= GROUP_BITS {
        return Ok(binary);
    }
    let mut bits = String::with_capacity(GROUP_BITS);
    for _ in 0..GROUP_BITS - binary.len() {
        bits.push('0');
    }
    bits.push_str(&binary);
    Ok(bits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unpack_is_31_bits_wide() {
        for chunk in ["000000", "000001", "zzzzz", "8vn08w", "hra0hs"] {
            let bits = unpack_chunk_uncached(chunk, 0).unwrap();
            assert_eq!(bits.len(), GROUP_BITS, "chunk {chunk}");
        }
    }

    #[test]
    fn unpack_value_round_trips() {
        for chunk in ["000000", "00000z", "01kre1", "zzzzz"] {
            let bits = unpack_chunk_uncached(chunk, 0).unwrap();
            let value = u64::from_str_radix(&bits, 2).unwrap();
            assert_eq!(value, u64::from_str_radix(chunk, 36).unwrap());
        }
    }

    #[test]
    fn unpack_zero_is_all_zeros() {
        assert_eq!(unpack_chunk_uncached("000000", 0).unwrap(), "0".repeat(31));
    }

    #[test]
    fn oversized_value_is_not_truncated() {
        // 36^6 - 1 needs 32 bits; the unpacker must pass it through intact.
        let bits = unpack_chunk_uncached("zzzzzz", 0).unwrap();
        assert_eq!(bits.len(), 32);
        assert_eq!(u64::from_str_radix(&bits, 2).unwrap(), 36u64.pow(6) - 1);
    }

    #[test]
    fn malformed_chunk_is_an_error() {
        for chunk in ["00!000", "ABCDEF", "0000 0", "", "+12345", "00-001"] {
            let err = unpack_chunk_uncached(chunk, 3).unwrap_err();
            assert!(
                matches!(err, PhpbbError::MalformedPermissionChunk { forum: 3, .. }),
                "chunk {chunk:?}"
            );
        }
    }

    #[test]
    fn memoized_path_agrees_with_uncached() {
        for chunk in ["abcdef", "abcdef", "01010z"] {
            assert_eq!(
                unpack_chunk(chunk, 0).unwrap(),
                unpack_chunk_uncached(chunk, 0).unwrap()
            );
        }
    }

    #[test]
    fn short_chunk_still_pads_to_31() {
        let bits = unpack_chunk_uncached("z", 0).unwrap();
        assert_eq!(bits.len(), GROUP_BITS);
        assert_eq!(u64::from_str_radix(&bits, 2).unwrap(), 35);
    }
}
