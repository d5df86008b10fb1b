//! Timestamp block codec.
//!
//! Timestamps are `i64` counts of some unit (typically nanoseconds). Before
//! delta encoding, the block is divided by the largest power of ten, up to
//! `10^12`, that divides every value; the exponent is kept in the low nibble of
//! the header byte. Deltas of a non-decreasing block are stored as they are,
//! deltas of any other block are zig-zag encoded, and the tag records which.

use byteorder::{BigEndian, ByteOrder};
use strata_arena::Arena;
use strata_bits::{bitcast, varint::put_uvarint};
use strata_common::{Result, error::Error, verify_data};

use super::{
    BlockHeader, DecodeLimits, MIN_RUN_LENGTH_VALUES, ensure_capacity, ensure_len,
    read_uvarint_at,
};
use crate::{bitpack, kernels::Kernels, zigzag};

pub const TAG_UNCOMPRESSED: u8 = 0;
pub const TAG_PACKED: u8 = 1;
pub const TAG_RUN_LENGTH: u8 = 2;
pub const TAG_ZIGZAG_PACKED: u8 = 3;
pub const TAG_ZIGZAG_RUN_LENGTH: u8 = 4;

/// Largest scale exponent tried by the resolution detection.
pub const MAX_SCALE_EXPONENT: u8 = 12;

const ELEMENT: &str = "time block";

const POWERS_OF_TEN: [i64; MAX_SCALE_EXPONENT as usize + 1] = {
    let mut powers = [1i64; MAX_SCALE_EXPONENT as usize + 1];
    let mut i = 1;
    while i < powers.len() {
        powers[i] = powers[i - 1] * 10;
        i += 1;
    }
    powers
};

/// Largest exponent `e <= 12` such that `10^e` divides every value.
pub fn detect_scale(values: &[i64]) -> u8 {
    (1..=MAX_SCALE_EXPONENT)
        .rev()
        .find(|&exp| {
            let div = POWERS_OF_TEN[exp as usize];
            values.iter().all(|&v| v % div == 0)
        })
        .unwrap_or(0)
}

/// Largest number of bytes [`encode`] can produce for `len` timestamps.
pub fn max_encoded_len(len: usize) -> usize {
    if len == 0 { 0 } else { 1 + len * 8 }
}

/// Encodes `values`, appending the block to `target`. Returns the number of
/// bytes written.
pub fn encode(values: &[i64], target: &mut Vec<u8>) -> Result<usize> {
    let start = target.len();
    let Some((&first, rest)) = values.split_first() else {
        return Ok(0);
    };
    if rest.is_empty() {
        write_uncompressed(values, target);
        return Ok(target.len() - start);
    }

    let exp = detect_scale(values);
    let div = POWERS_OF_TEN[exp as usize];
    let ordered = values.windows(2).all(|w| w[0] <= w[1]);

    let mut deltas = Arena::global().buffer::<u64>(rest.len());
    let mut max_delta = 0;
    let mut prev = first / div;
    for &v in rest {
        let scaled = v / div;
        let delta = scaled.wrapping_sub(prev);
        let delta = if ordered {
            delta as u64
        } else {
            zigzag::zigzag_encode(delta)
        };
        max_delta = max_delta.max(delta);
        deltas.push(delta);
        prev = scaled;
    }

    if values.len() >= MIN_RUN_LENGTH_VALUES && deltas.iter().all(|&d| d == deltas[0]) {
        let tag = if ordered {
            TAG_RUN_LENGTH
        } else {
            TAG_ZIGZAG_RUN_LENGTH
        };
        target.push(BlockHeader::new(tag, exp).to_byte());
        target.extend_from_slice(&first.to_be_bytes());
        put_uvarint(target, deltas[0]);
        put_uvarint(target, rest.len() as u64);
    } else if max_delta > bitpack::MAX_VALUE {
        write_uncompressed(values, target);
    } else {
        let tag = if ordered {
            TAG_PACKED
        } else {
            TAG_ZIGZAG_PACKED
        };
        target.push(BlockHeader::new(tag, exp).to_byte());
        target.extend_from_slice(&(first / div).to_be_bytes());
        bitpack::encode_to_bytes(&deltas, target)?;
    }
    Ok(target.len() - start)
}

fn write_uncompressed(values: &[i64], target: &mut Vec<u8>) {
    target.reserve(1 + values.len() * 8);
    target.push(BlockHeader::new(TAG_UNCOMPRESSED, 0).to_byte());
    for &v in values {
        target.extend_from_slice(&v.to_be_bytes());
    }
}

fn read_header(src: &[u8]) -> Result<Option<(BlockHeader, i64)>> {
    let Some(header) = BlockHeader::read(src) else {
        return Ok(None);
    };
    verify_data!(exponent, header.param <= MAX_SCALE_EXPONENT);
    if header.tag == TAG_UNCOMPRESSED {
        verify_data!(exponent, header.param == 0);
    }
    Ok(Some((header, POWERS_OF_TEN[header.param as usize])))
}

/// Decodes a block, appending the timestamps to `target`. Returns the number of
/// values decoded.
pub fn decode(src: &[u8], target: &mut Vec<i64>) -> Result<usize> {
    decode_with_limits(src, DecodeLimits::default(), target)
}

/// [`decode`] with caller-chosen bounds on the block's value count.
pub fn decode_with_limits(
    src: &[u8],
    limits: DecodeLimits,
    target: &mut Vec<i64>,
) -> Result<usize> {
    let Some((header, div)) = read_header(src)? else {
        return Ok(0);
    };
    let body = &src[1..];
    match header.tag {
        TAG_UNCOMPRESSED => decode_uncompressed(body, target),
        TAG_PACKED | TAG_ZIGZAG_PACKED => {
            decode_packed(body, header.tag == TAG_ZIGZAG_PACKED, div, target)
        }
        TAG_RUN_LENGTH | TAG_ZIGZAG_RUN_LENGTH => {
            let zigzagged = header.tag == TAG_ZIGZAG_RUN_LENGTH;
            decode_run_length(body, zigzagged, div, limits, target)
        }
        tag => Err(Error::unsupported_encoding(ELEMENT, tag)),
    }
}

/// Decodes a block into the front of `dst`. Returns the number of values.
///
/// Fails without writing if `dst` is shorter than the block.
pub fn decode_into(src: &[u8], dst: &mut [i64]) -> Result<usize> {
    let len = decoded_len(src)?;
    ensure_capacity(len, dst.len())?;
    let mut values = Arena::global().buffer::<i64>(len);
    decode(src, &mut *values)?;
    dst[..len].copy_from_slice(&values);
    Ok(len)
}

/// Number of timestamps in a block, without decoding it.
pub fn decoded_len(src: &[u8]) -> Result<usize> {
    decoded_len_with_limits(src, DecodeLimits::default())
}

/// [`decoded_len`] with caller-chosen bounds on the block's value count.
pub fn decoded_len_with_limits(src: &[u8], limits: DecodeLimits) -> Result<usize> {
    let Some((header, _)) = read_header(src)? else {
        return Ok(0);
    };
    let body = &src[1..];
    match header.tag {
        TAG_UNCOMPRESSED => uncompressed_len(body),
        TAG_PACKED | TAG_ZIGZAG_PACKED => {
            ensure_len(ELEMENT, src, 9)?;
            Ok(1 + bitpack::count_bytes(&body[8..])?)
        }
        TAG_RUN_LENGTH | TAG_ZIGZAG_RUN_LENGTH => Ok(read_run_length(body, limits)?.2),
        tag => Err(Error::unsupported_encoding(ELEMENT, tag)),
    }
}

fn uncompressed_len(body: &[u8]) -> Result<usize> {
    if body.len() % 8 != 0 {
        return Err(Error::invalid_format(
            ELEMENT,
            format!("expected multiple of 8 bytes, got {}", body.len()),
        ));
    }
    Ok(body.len() / 8)
}

fn decode_uncompressed(body: &[u8], target: &mut Vec<i64>) -> Result<usize> {
    let count = uncompressed_len(body)?;
    let start = target.len();
    target.resize(start + count, 0);
    BigEndian::read_i64_into(body, &mut target[start..]);
    Ok(count)
}

fn decode_packed(
    body: &[u8],
    zigzagged: bool,
    div: i64,
    target: &mut Vec<i64>,
) -> Result<usize> {
    if body.len() < 8 {
        return Err(Error::short_buffer(ELEMENT, 9, 1 + body.len()));
    }
    let first = BigEndian::read_i64(body);
    let words = &body[8..];

    let mut acc = Arena::global().buffer::<u64>(1 + bitpack::count_bytes(words)?);
    acc.push(first as u64);
    bitpack::decode_bytes(words, &mut acc)?;
    let kernels = Kernels::get();
    if zigzagged {
        (kernels.zigzag_delta_decode)(&mut acc);
    } else {
        (kernels.delta_decode)(&mut acc);
    }

    let scaled: &[i64] = bitcast::cast_slice(&acc);
    target.reserve(scaled.len());
    target.extend(scaled.iter().map(|&v| v.wrapping_mul(div)));
    Ok(acc.len())
}

/// Returns the first value, the stored delta and the total value count.
fn read_run_length(body: &[u8], limits: DecodeLimits) -> Result<(i64, u64, usize)> {
    if body.len() < 8 {
        return Err(Error::short_buffer(ELEMENT, 9, 1 + body.len()));
    }
    let first = BigEndian::read_i64(body);
    let mut pos = 8;
    let delta = read_uvarint_at(body, &mut pos)?;
    let count = read_uvarint_at(body, &mut pos)?;
    let total = limits.run_length_total(ELEMENT, count)?;
    Ok((first, delta, total))
}

fn decode_run_length(
    body: &[u8],
    zigzagged: bool,
    div: i64,
    limits: DecodeLimits,
    target: &mut Vec<i64>,
) -> Result<usize> {
    let (first, delta, total) = read_run_length(body, limits)?;
    let step = if zigzagged {
        zigzag::zigzag_decode(delta)
    } else {
        delta as i64
    };
    let step = step.wrapping_mul(div);
    target.extend((0..total as i64).map(|i| first.wrapping_add(step.wrapping_mul(i))));
    Ok(total)
}
