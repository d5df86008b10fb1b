//! Bloom filter configuration and constants.

/// Seed of the first XXH3-64 hash (`h0`), the base probe position.
pub const BLOOM_FILTER_HASH_SEED: u64 = 0x5374_7261_7461_4246; // "StrataBF" in hex

/// Seed of the second XXH3-64 hash (`h1`), the probe step.
pub const BLOOM_FILTER_STEP_SEED: u64 = 0x5374_7261_7461_5354; // "StrataST" in hex

/// Smallest filter size in bits.
pub const MIN_FILTER_BITS: usize = 8;

/// Configuration for bloom filter construction.
#[derive(Debug, Clone, PartialEq)]
pub struct BloomFilterConfig {
    /// Target false positive probability used by [`Filter::with_capacity`](crate::Filter::with_capacity).
    pub target_fpp: f64,
    /// Seeds of the two hash functions.
    pub hash_seeds: [u64; 2],
}

impl Default for BloomFilterConfig {
    fn default() -> Self {
        Self {
            target_fpp: 0.01,
            hash_seeds: [BLOOM_FILTER_HASH_SEED, BLOOM_FILTER_STEP_SEED],
        }
    }
}

impl BloomFilterConfig {
    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.hash_seeds[0] == self.hash_seeds[1] {
            return Err("hash_seeds must differ".to_string());
        }

        if !(self.target_fpp > 0.0 && self.target_fpp < 1.0) {
            return Err("target_fpp must be between 0 and 1 (exclusive)".to_string());
        }

        Ok(())
    }
}
