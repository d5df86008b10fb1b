//! AVX2 kernels.
//!
//! The bodies are written over fixed-size batches with constant trip counts so
//! that, compiled with `avx2` enabled, the inner loops become vector code. Each
//! kernel finishes the leftover tail with the portable implementation and
//! produces exactly the same output.
//!
//! The safe entry points below are only installed in a [`Kernels`] table after
//! `avx2` support was detected at runtime.
//!
//! [`Kernels`]: super::Kernels

use strata_common::Result;

use super::portable;
use crate::{
    analyze::{Analysis, Scan},
    bitpack::{RUN_LENGTH, SELECTOR_COUNTS, selector_of},
    dictionary::{self, Dictionary, HashTable},
    value::{DictionaryValue, IntegerValue},
    zigzag::zigzag_decode,
};

const ANALYZE_BATCH: usize = 32;
const PREFIX_BATCH: usize = 8;
const COUNT_BATCH: usize = 8;
const HASH_BATCH: usize = 4;

pub fn unpack_words(words: &[u64], out: &mut Vec<u64>) {
    // SAFETY: avx2 support was detected before this kernel was installed.
    unsafe { unpack_words_avx2(words, out) }
}

pub fn count_words(words: &[u64]) -> usize {
    // SAFETY: see `unpack_words`.
    unsafe { count_words_avx2(words) }
}

pub fn delta_decode(data: &mut [u64]) {
    // SAFETY: see `unpack_words`.
    unsafe { delta_decode_avx2(data) }
}

pub fn zigzag_delta_decode(data: &mut [u64]) {
    // SAFETY: see `unpack_words`.
    unsafe { zigzag_delta_decode_avx2(data) }
}

pub fn analyze<T: IntegerValue>(values: &[T]) -> Analysis<T> {
    // SAFETY: see `unpack_words`.
    unsafe { analyze_avx2(values) }
}

pub fn build_dictionary<T: DictionaryValue>(
    values: &[T],
    cardinality_hint: usize,
) -> Result<Dictionary<T>> {
    dictionary::build_with(values, cardinality_hint, |table, values| {
        // SAFETY: see `unpack_words`.
        unsafe { insert_batched(table, values) }
    })
}

#[target_feature(enable = "avx2")]
unsafe fn unpack_words_avx2(words: &[u64], out: &mut Vec<u64>) {
    for &word in words {
        match selector_of(word) {
            0 => out.resize(out.len() + RUN_LENGTH, 0),
            1 => out.resize(out.len() + RUN_LENGTH, 1),
            2 => unpack_fixed::<1, 60>(word, out),
            3 => unpack_fixed::<2, 30>(word, out),
            4 => unpack_fixed::<3, 20>(word, out),
            5 => unpack_fixed::<4, 15>(word, out),
            6 => unpack_fixed::<5, 12>(word, out),
            7 => unpack_fixed::<6, 10>(word, out),
            8 => unpack_fixed::<7, 8>(word, out),
            9 => unpack_fixed::<8, 7>(word, out),
            10 => unpack_fixed::<10, 6>(word, out),
            11 => unpack_fixed::<12, 5>(word, out),
            12 => unpack_fixed::<15, 4>(word, out),
            13 => unpack_fixed::<20, 3>(word, out),
            14 => unpack_fixed::<30, 2>(word, out),
            _ => unpack_fixed::<60, 1>(word, out),
        }
    }
}

#[inline(always)]
fn unpack_fixed<const BITS: u32, const COUNT: usize>(word: u64, out: &mut Vec<u64>) {
    let mask = (1u64 << BITS) - 1;
    let mut values = [0u64; COUNT];
    for (j, v) in values.iter_mut().enumerate() {
        *v = (word >> (j as u32 * BITS)) & mask;
    }
    out.extend_from_slice(&values);
}

#[target_feature(enable = "avx2")]
unsafe fn count_words_avx2(words: &[u64]) -> usize {
    let mut chunks = words.chunks_exact(COUNT_BATCH);
    let mut total = 0;
    for chunk in &mut chunks {
        let mut lanes = [0usize; COUNT_BATCH];
        for (lane, &word) in lanes.iter_mut().zip(chunk) {
            *lane = SELECTOR_COUNTS[selector_of(word)];
        }
        total += lanes.iter().sum::<usize>();
    }
    total + portable::count_words(chunks.remainder())
}

#[target_feature(enable = "avx2")]
unsafe fn delta_decode_avx2(data: &mut [u64]) {
    prefix_sum_batched(data, |delta| delta);
}

#[target_feature(enable = "avx2")]
unsafe fn zigzag_delta_decode_avx2(data: &mut [u64]) {
    prefix_sum_batched(data, |delta| zigzag_decode(delta) as u64);
}

/// Running sum over `data[1..]` seeded with `data[0]`, with `map` applied to
/// every delta. Each batch is summed in log2(PREFIX_BATCH) shifted-add steps,
/// then offset by the carry from the previous batch.
#[inline(always)]
fn prefix_sum_batched(data: &mut [u64], map: impl Fn(u64) -> u64) {
    let Some((first, rest)) = data.split_first_mut() else {
        return;
    };
    let mut carry = *first;
    let mut chunks = rest.chunks_exact_mut(PREFIX_BATCH);
    for chunk in &mut chunks {
        let mut lanes = [0u64; PREFIX_BATCH];
        for (lane, &delta) in lanes.iter_mut().zip(chunk.iter()) {
            *lane = map(delta);
        }
        let mut step = 1;
        while step < PREFIX_BATCH {
            for i in (step..PREFIX_BATCH).rev() {
                lanes[i] = lanes[i].wrapping_add(lanes[i - step]);
            }
            step *= 2;
        }
        for (dst, &lane) in chunk.iter_mut().zip(&lanes) {
            *dst = lane.wrapping_add(carry);
        }
        carry = lanes[PREFIX_BATCH - 1].wrapping_add(carry);
    }
    for value in chunks.into_remainder() {
        carry = carry.wrapping_add(map(*value));
        *value = carry;
    }
}

#[target_feature(enable = "avx2")]
unsafe fn analyze_avx2<T: IntegerValue>(values: &[T]) -> Analysis<T> {
    let Some((mut scan, rest)) = Scan::start(values) else {
        return Analysis::default();
    };
    let mut chunks = rest.chunks_exact(ANALYZE_BATCH);
    for chunk in &mut chunks {
        scan.push_batch(chunk);
    }
    for &v in chunks.remainder() {
        scan.push(v);
    }
    scan.finish()
}

/// Hashes four values up front, then probes them in input order.
#[target_feature(enable = "avx2")]
unsafe fn insert_batched<T: DictionaryValue>(
    table: &mut HashTable<'_, T>,
    values: &[T],
) -> Result<()> {
    let mut chunks = values.chunks_exact(HASH_BATCH);
    for chunk in &mut chunks {
        let mut slots = [0usize; HASH_BATCH];
        for (slot, &v) in slots.iter_mut().zip(chunk) {
            *slot = dictionary::hash_slot(v);
        }
        for (&v, &slot) in chunk.iter().zip(&slots) {
            table.insert(v, slot)?;
        }
    }
    portable::insert_all(table, chunks.remainder())
}
