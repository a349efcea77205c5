//! Bit-packed palette index arrays.
//!
//! Both the Anvil section decoder and the Litematica encoder store palette
//! indices as a flat run of 64-bit words: entry `i` occupies bits
//! `[i*bits, i*bits + bits)` of the little-endian word concatenation, and an
//! entry may straddle a word boundary. The two container formats disagree
//! only on the minimum width: chunk sections never go below 4 bits per entry,
//! Litematica regions never below 2. Both minimums are real, keep them apart.

use crate::{Error, Result};

/// Bits per entry for the chunk-section decode path.
pub fn section_bits_per_entry(palette_len: usize) -> usize {
    bits_for(palette_len).max(4)
}

/// Bits per entry for the Litematica encode path.
pub fn schematic_bits_per_entry(palette_len: usize) -> usize {
    bits_for(palette_len).max(2)
}

/// ceil(log2(n)) via integer arithmetic; 0 for n <= 1.
fn bits_for(n: usize) -> usize {
    if n <= 1 {
        0
    } else {
        (usize::BITS - (n - 1).leading_zeros()) as usize
    }
}

/// Unpack `count` indices of `bits` width each from `words`.
///
/// Fails when the backing array holds fewer bits than `count` entries
/// require (truncated data).
pub fn unpack(words: &[i64], bits: usize, count: usize) -> Result<Vec<u16>> {
    debug_assert!(bits >= 1 && bits <= 16);
    if count * bits > words.len() * 64 {
        return Err(Error::Decode(format!(
            "packed array too short: {} words cannot hold {} entries of {} bits",
            words.len(),
            count,
            bits
        )));
    }

    let mask = (1u64 << bits) - 1;
    let mut indices = Vec::with_capacity(count);

    for i in 0..count {
        let bit_index = i * bits;
        let word_index = bit_index / 64;
        let offset = bit_index % 64;

        let value = if offset + bits <= 64 {
            ((words[word_index] as u64) >> offset) & mask
        } else {
            // Entry straddles the boundary: low bits from this word,
            // high bits from the next.
            let low = (words[word_index] as u64) >> offset;
            let high = (words[word_index + 1] as u64) << (64 - offset);
            (low | high) & mask
        };

        indices.push(value as u16);
    }

    Ok(indices)
}

/// Pack indices at `bits` width each. Output length is
/// `ceil(len * bits / 64)` words. Values are masked to `bits` width.
pub fn pack(indices: &[u16], bits: usize) -> Vec<i64> {
    debug_assert!(bits >= 1 && bits <= 16);
    let word_count = (indices.len() * bits + 63) / 64;
    let mask = (1u64 << bits) - 1;
    let mut words = vec![0u64; word_count];

    for (i, &index) in indices.iter().enumerate() {
        let value = (index as u64) & mask;
        let bit_index = i * bits;
        let word_index = bit_index / 64;
        let offset = bit_index % 64;

        words[word_index] |= value << offset;
        if offset + bits > 64 {
            words[word_index + 1] |= value >> (64 - offset);
        }
    }

    words.into_iter().map(|w| w as i64).collect()
}
