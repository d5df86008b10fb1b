//! Bloom filter support for Strata.
//!
//! A fixed-size, power-of-two bit array probed at `k` positions derived from two
//! independent XXH3-64 hashes of each item (double hashing). Filters only grow
//! denser: there is no removal, and two filters with identical parameters can be
//! merged with a bitwise OR.
//!
//! - [`Filter`]: the bit array with add/contains/merge operations
//! - [`BloomHash`]: the pair of hashes an item is reduced to
//! - [`estimate`]: optimal `(bits, k)` for an expected item count and error rate

pub mod config;
pub mod filter;
pub mod hash;
pub mod sizing;


pub use config::*;
pub use filter::Filter;
pub use hash::BloomHash;
pub use sizing::{estimate, false_positive_rate};
