//! Block codecs.
//!
//! Every encoded block starts with a header byte: bits 7-4 carry the encoding
//! tag, bits 3-0 are reserved (integer and float blocks) or hold the
//! power-of-ten scale exponent (time blocks). Empty integer and time inputs
//! encode to an empty block, an empty float input to a bare terminator. Every
//! decoder reads an empty block as no values.
//!
//! - [`integer`]: 8/16/32/64-bit signed and unsigned integers
//! - [`time`]: `i64` timestamps with resolution detection
//! - [`float`]: `f32`/`f64` values, Gorilla bit stream

use strata_common::{Result, error::Error};
use strata_bits::varint;

pub mod float;
pub mod integer;
pub mod time;

/// Shortest block that is stored run-length encoded. Shorter blocks with a
/// constant delta stay bit-packed.
pub const MIN_RUN_LENGTH_VALUES: usize = 5;

/// Decoded form of a block header byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    /// Encoding tag, 0 to 15.
    pub tag: u8,
    /// Low nibble: reserved, or the scale exponent of a time block.
    pub param: u8,
}

impl BlockHeader {
    pub const fn new(tag: u8, param: u8) -> Self {
        BlockHeader { tag, param }
    }

    pub const fn from_byte(byte: u8) -> Self {
        BlockHeader {
            tag: byte >> 4,
            param: byte & 0x0F,
        }
    }

    pub const fn to_byte(self) -> u8 {
        (self.tag << 4) | (self.param & 0x0F)
    }

    /// Reads the header of an encoded block; `None` for an empty block.
    pub fn read(src: &[u8]) -> Option<Self> {
        src.first().map(|&byte| Self::from_byte(byte))
    }
}

/// Reads the uvarint at `*pos`, advancing `pos` past it.
pub(crate) fn read_uvarint_at(src: &[u8], pos: &mut usize) -> Result<u64> {
    let (value, len) = varint::read_uvarint(&src[(*pos).min(src.len())..])?;
    *pos += len;
    Ok(value)
}

/// Fails unless `src` holds at least `required` bytes.
#[inline]
pub(crate) fn ensure_len(element: &str, src: &[u8], required: usize) -> Result<()> {
    if src.len() < required {
        return Err(Error::short_buffer(element, required, src.len()));
    }
    Ok(())
}

/// Fails unless a destination of `available` values can take `required`.
#[inline]
pub(crate) fn ensure_capacity(required: usize, available: usize) -> Result<()> {
    if available < required {
        return Err(Error::dest_too_small(required, available));
    }
    Ok(())
}

/// Default upper bound on the number of values a decoder takes from one block.
pub const DEFAULT_MAX_BLOCK_VALUES: usize = 1 << 24;

/// Bounds a decoder applies to counts read from a block before allocating.
///
/// Bit-packed and uncompressed blocks are bounded by their own length; a
/// run-length block is not, so its repeat count is checked against
/// `max_values`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLimits {
    pub max_values: usize,
}

impl DecodeLimits {
    pub const fn new(max_values: usize) -> Self {
        DecodeLimits { max_values }
    }

    /// Total value count of a run-length block that repeats `count` times
    /// after its first value.
    pub(crate) fn run_length_total(&self, element: &str, count: u64) -> Result<usize> {
        let total = usize::try_from(count)
            .ok()
            .and_then(|count| count.checked_add(1))
            .filter(|&total| total <= self.max_values);
        total.ok_or_else(|| {
            Error::invalid_format(
                element,
                format!(
                    "run of {count} repeats exceeds the limit of {} values",
                    self.max_values
                ),
            )
        })
    }
}

impl Default for DecodeLimits {
    fn default() -> Self {
        DecodeLimits::new(DEFAULT_MAX_BLOCK_VALUES)
    }
}
