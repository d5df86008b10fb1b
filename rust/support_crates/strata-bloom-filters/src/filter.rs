//! The bloom filter bit array.

use strata_common::{Result, error::Error};

use crate::{
    config::{BloomFilterConfig, MIN_FILTER_BITS},
    hash::BloomHash,
    sizing::{estimate, false_positive_rate},
};

/// A bloom filter over a power-of-two bit array probed at `k` positions.
///
/// Bit `i` of the filter is bit `i & 7` of byte `i >> 3`, so [`Filter::as_bytes`]
/// and [`Filter::from_bytes`] exchange a stable representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    k: u32,
    mask: u64,
    bits: Vec<u8>,
    seeds: [u64; 2],
}

impl Filter {
    /// Creates an empty filter with `bits` rounded up to the next power of two
    /// (at least 8) and `k` hash probes (at least 1).
    pub fn new(bits: usize, k: u32) -> Self {
        let config = BloomFilterConfig::default();
        Self::with_seeds(bits, k, config.hash_seeds)
    }

    /// Creates an empty filter using custom hash seeds.
    pub fn with_seeds(bits: usize, k: u32, seeds: [u64; 2]) -> Self {
        let bits = round_bits(bits);
        Filter {
            k: k.max(1),
            mask: bits as u64 - 1,
            bits: vec![0; bits / 8],
            seeds,
        }
    }

    /// Creates a filter sized by [`estimate`] for `items` insertions at a false
    /// positive probability of `fpp`.
    pub fn with_capacity(items: usize, fpp: f64) -> Result<Self> {
        let config = BloomFilterConfig {
            target_fpp: fpp,
            ..Default::default()
        };
        Self::with_config(items, &config)
    }

    /// Creates a filter for `items` insertions from a validated configuration.
    pub fn with_config(items: usize, config: &BloomFilterConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|message| Error::invalid_arg("config", message))?;
        let (bits, k) = estimate(items, config.target_fpp);
        Ok(Self::with_seeds(bits, k, config.hash_seeds))
    }

    /// Wraps an existing bit array, e.g. one produced by [`Filter::into_bytes`].
    ///
    /// The bit count (`8 * bytes.len()`) must be a power of two.
    pub fn from_bytes(bytes: Vec<u8>, k: u32) -> Result<Self> {
        let bits = bytes.len() * 8;
        if bits < MIN_FILTER_BITS || !bits.is_power_of_two() {
            return Err(Error::invalid_arg(
                "bytes",
                format!("bloom filter bit count must be a power of two, got {bits}"),
            ));
        }
        Ok(Filter {
            k: k.max(1),
            mask: bits as u64 - 1,
            bits: bytes,
            seeds: BloomFilterConfig::default().hash_seeds,
        })
    }

    /// Number of bits in the filter.
    pub fn len_bits(&self) -> usize {
        self.bits.len() * 8
    }

    /// Number of hash probes per item.
    pub fn k(&self) -> u32 {
        self.k
    }

    pub fn seeds(&self) -> [u64; 2] {
        self.seeds
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bits
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bits
    }

    /// Hashes `data` with this filter's seeds.
    #[inline]
    pub fn hash(&self, data: &[u8]) -> BloomHash {
        BloomHash::with_seeds(data, self.seeds)
    }

    pub fn add(&mut self, data: &[u8]) {
        let hash = self.hash(data);
        self.add_hash(hash);
    }

    pub fn add_hash(&mut self, hash: BloomHash) {
        for i in 0..self.k as u64 {
            let loc = hash.location(i, self.mask);
            self.bits[(loc >> 3) as usize] |= 1 << (loc & 7);
        }
    }

    pub fn add_many<I>(&mut self, items: I)
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        for item in items {
            self.add(item.as_ref());
        }
    }

    /// Adds the little-endian bytes of a fixed-width value.
    pub fn add_value<T: bytemuck::Pod>(&mut self, value: T) {
        self.add(bytemuck::bytes_of(&value));
    }

    /// Returns `false` if `data` was definitely never added.
    pub fn contains(&self, data: &[u8]) -> bool {
        self.contains_hash(self.hash(data))
    }

    pub fn contains_hash(&self, hash: BloomHash) -> bool {
        (0..self.k as u64).all(|i| {
            let loc = hash.location(i, self.mask);
            self.bits[(loc >> 3) as usize] & (1 << (loc & 7)) != 0
        })
    }

    pub fn contains_value<T: bytemuck::Pod>(&self, value: T) -> bool {
        self.contains(bytemuck::bytes_of(&value))
    }

    /// Returns `true` if the filter may contain any of the hashed items.
    pub fn contains_any_hash(&self, hashes: &[BloomHash]) -> bool {
        hashes.iter().any(|&hash| self.contains_hash(hash))
    }

    /// ORs `other` into this filter.
    ///
    /// Both filters must agree on bit count, probe count and seeds; on mismatch
    /// this filter is left unchanged.
    pub fn merge(&mut self, other: &Filter) -> Result<()> {
        if self.bits.len() != other.bits.len() {
            return Err(Error::parameter_mismatch(
                "bits",
                self.len_bits() as u64,
                other.len_bits() as u64,
            ));
        }
        if self.k != other.k {
            return Err(Error::parameter_mismatch(
                "k",
                self.k as u64,
                other.k as u64,
            ));
        }
        if self.seeds != other.seeds {
            let index = if self.seeds[0] != other.seeds[0] { 0 } else { 1 };
            return Err(Error::parameter_mismatch(
                "hash_seeds",
                self.seeds[index],
                other.seeds[index],
            ));
        }
        for (dst, src) in self.bits.iter_mut().zip(&other.bits) {
            *dst |= *src;
        }
        Ok(())
    }

    /// Clears all bits.
    pub fn reset(&mut self) {
        self.bits.fill(0);
    }

    /// Number of bits currently set.
    pub fn count_ones(&self) -> usize {
        self.bits.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// Expected false positive probability after `items` distinct insertions.
    pub fn estimated_fpp(&self, items: usize) -> f64 {
        false_positive_rate(self.len_bits(), self.k, items)
    }
}

fn round_bits(bits: usize) -> usize {
    const MAX_BITS: usize = 1 << (usize::BITS - 1);
    bits.clamp(MIN_FILTER_BITS, MAX_BITS).next_power_of_two()
}
