//! Selector-driven packing of small unsigned values into 64-bit words.
//!
//! The top 4 bits of every word are a selector; the remaining 60 bits hold the
//! values. Selectors 0 and 1 stand for a run of 128 zeros or 128 ones and carry
//! no payload. Selectors 2 to 15 split the payload into equal slots:
//!
//! | selector | 2 | 3 | 4 | 5 | 6 | 7 | 8 | 9 | 10 | 11 | 12 | 13 | 14 | 15 |
//! |----------|---|---|---|---|---|---|---|---|----|----|----|----|----|----|
//! | bits     | 1 | 2 | 3 | 4 | 5 | 6 | 7 | 8 | 10 | 12 | 15 | 20 | 30 | 60 |
//! | values   |60 |30 |20 |15 |12 |10 | 8 | 7 |  6 |  5 |  4 |  3 |  2 |  1 |
//!
//! Every word is full. The first value of a word sits in its least significant
//! bits. In byte form words are stored big-endian.

use byteorder::{BigEndian, ByteOrder};
use strata_arena::Arena;
use strata_common::{Result, error::Error};

use crate::kernels::Kernels;

mod index;

pub use index::PackedIndex;

/// Largest value that can be packed.
pub const MAX_VALUE: u64 = (1 << 60) - 1;

/// Number of values covered by a run selector (0 or 1).
pub const RUN_LENGTH: usize = 128;

pub(crate) const SELECTOR_SHIFT: u32 = 60;

/// `(bits per value, values per word)` for every selector.
pub(crate) const SELECTORS: [(u32, usize); 16] = [
    (0, RUN_LENGTH),
    (0, RUN_LENGTH),
    (1, 60),
    (2, 30),
    (3, 20),
    (4, 15),
    (5, 12),
    (6, 10),
    (7, 8),
    (8, 7),
    (10, 6),
    (12, 5),
    (15, 4),
    (20, 3),
    (30, 2),
    (60, 1),
];

/// Number of values held by a word with the given selector.
pub(crate) const SELECTOR_COUNTS: [usize; 16] = {
    let mut counts = [0; 16];
    let mut i = 0;
    while i < 16 {
        counts[i] = SELECTORS[i].1;
        i += 1;
    }
    counts
};

#[inline(always)]
pub(crate) fn selector_of(word: u64) -> usize {
    (word >> SELECTOR_SHIFT) as usize
}

/// Number of values held by `word`.
#[inline(always)]
pub fn word_count(word: u64) -> usize {
    SELECTOR_COUNTS[selector_of(word)]
}

/// Unpacks one word, appending its values to `out`.
#[inline]
pub(crate) fn unpack_word(word: u64, out: &mut Vec<u64>) {
    match selector_of(word) {
        0 => out.resize(out.len() + RUN_LENGTH, 0),
        1 => out.resize(out.len() + RUN_LENGTH, 1),
        selector => {
            let (bits, count) = SELECTORS[selector];
            let mask = (1u64 << bits) - 1;
            out.extend((0..count as u32).map(|j| (word >> (j * bits)) & mask));
        }
    }
}

/// Returns the value at position `pos` of `word`.
#[inline]
pub(crate) fn word_value_at(word: u64, pos: usize) -> u64 {
    match selector_of(word) {
        0 => 0,
        1 => 1,
        selector => {
            let bits = SELECTORS[selector].0;
            (word >> (pos as u32 * bits)) & ((1u64 << bits) - 1)
        }
    }
}

#[inline]
fn is_run(values: &[u64], value: u64) -> bool {
    values.len() >= RUN_LENGTH && values[..RUN_LENGTH].iter().all(|&v| v == value)
}

/// Packs as many leading values of `values` as fit into one word, returning the
/// word and the number of values consumed. All values must be at most
/// [`MAX_VALUE`].
#[inline]
fn pack_word(values: &[u64]) -> (u64, usize) {
    if is_run(values, 0) {
        return (0, RUN_LENGTH);
    }
    if is_run(values, 1) {
        return (1 << SELECTOR_SHIFT, RUN_LENGTH);
    }
    for (selector, &(bits, count)) in SELECTORS.iter().enumerate().skip(2) {
        if values.len() < count {
            continue;
        }
        let max = (1u64 << bits) - 1;
        let slots = &values[..count];
        if slots.iter().all(|&v| v <= max) {
            let word = slots
                .iter()
                .enumerate()
                .fold((selector as u64) << SELECTOR_SHIFT, |word, (j, &v)| {
                    word | (v << (j as u32 * bits))
                });
            return (word, count);
        }
    }
    // Selector 15 takes any single value up to MAX_VALUE.
    unreachable!("value {} exceeds MAX_VALUE", values[0])
}

/// Packs `values` into words appended to `out`, returning the number of words.
///
/// Fails with a value-out-of-range error if any value exceeds [`MAX_VALUE`];
/// nothing is appended in that case.
pub fn encode(values: &[u64], out: &mut Vec<u64>) -> Result<usize> {
    if let Some(pos) = values.iter().position(|&v| v > MAX_VALUE) {
        return Err(Error::value_out_of_range(
            "packed words",
            format!("value {} at position {pos} exceeds {MAX_VALUE}", values[pos]),
        ));
    }
    let start = out.len();
    let mut rest = values;
    while !rest.is_empty() {
        let (word, consumed) = pack_word(rest);
        out.push(word);
        rest = &rest[consumed..];
    }
    Ok(out.len() - start)
}

/// Packs `values` and appends the words to `target` as big-endian bytes.
/// Returns the number of bytes written.
pub fn encode_to_bytes(values: &[u64], target: &mut Vec<u8>) -> Result<usize> {
    let arena = Arena::global();
    // Every word holds at least one value.
    let mut words = arena.buffer::<u64>(values.len());
    encode(values, &mut words)?;
    let start = target.len();
    target.resize(start + words.len() * 8, 0);
    BigEndian::write_u64_into(&words, &mut target[start..]);
    Ok(words.len() * 8)
}

/// Unpacks `words`, appending the values to `out`. Returns the number of values.
pub fn decode(words: &[u64], out: &mut Vec<u64>) -> usize {
    let start = out.len();
    (Kernels::get().unpack_words)(words, out);
    out.len() - start
}

/// Unpacks big-endian words from `src`, appending the values to `out`.
/// Returns the number of values.
pub fn decode_bytes(src: &[u8], out: &mut Vec<u64>) -> Result<usize> {
    let words = read_words(src)?;
    Ok(decode(&words, out))
}

/// Total number of values stored in `words`.
pub fn count_values(words: &[u64]) -> usize {
    (Kernels::get().count_words)(words)
}

/// Total number of values stored in the big-endian words of `src`.
pub fn count_bytes(src: &[u8]) -> Result<usize> {
    let words = read_words(src)?;
    Ok(count_values(&words))
}

fn read_words(src: &[u8]) -> Result<strata_arena::ArenaBuffer<'static, u64>> {
    if src.len() % 8 != 0 {
        return Err(Error::short_buffer(
            "packed words",
            src.len().next_multiple_of(8),
            src.len(),
        ));
    }
    let mut words = Arena::global().zeroed::<u64>(src.len() / 8);
    BigEndian::read_u64_into(src, &mut words);
    Ok(words)
}
