//! Item hashing for bloom filters.

use xxhash_rust::xxh3::xxh3_64_with_seed;

use crate::config::{BLOOM_FILTER_HASH_SEED, BLOOM_FILTER_STEP_SEED};

/// The two independent 64-bit hashes an item is reduced to.
///
/// Probe `i` of an item lands on bit `(h0 + h1 * i) mod m`. The step `h1` is
/// forced odd, so with a power-of-two `m` the first `min(k, m)` probes are
/// pairwise distinct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BloomHash {
    pub h0: u64,
    pub h1: u64,
}

impl BloomHash {
    /// Hashes `data` with the default seeds.
    #[inline]
    pub fn of(data: &[u8]) -> Self {
        Self::with_seeds(data, [BLOOM_FILTER_HASH_SEED, BLOOM_FILTER_STEP_SEED])
    }

    /// Hashes `data` with explicit seeds.
    #[inline]
    pub fn with_seeds(data: &[u8], seeds: [u64; 2]) -> Self {
        BloomHash {
            h0: xxh3_64_with_seed(data, seeds[0]),
            h1: xxh3_64_with_seed(data, seeds[1]) | 1,
        }
    }

    /// Hashes the little-endian bytes of a fixed-width value.
    #[inline]
    pub fn of_value<T: bytemuck::Pod>(value: T) -> Self {
        Self::of(bytemuck::bytes_of(&value))
    }

    /// Bit position of probe `i` in a filter with `mask + 1` bits.
    #[inline(always)]
    pub(crate) fn location(&self, i: u64, mask: u64) -> u64 {
        self.h0.wrapping_add(self.h1.wrapping_mul(i)) & mask
    }
}
