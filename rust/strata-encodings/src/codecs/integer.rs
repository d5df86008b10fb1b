//! Integer block codec.
//!
//! Values are delta encoded in a 64-bit accumulator and every delta is zig-zag
//! encoded. The block is then stored in one of three forms:
//!
//! - run-length, when the block has at least [`MIN_RUN_LENGTH_VALUES`] values
//!   and every delta is the same: the first value, the zig-zagged delta and the
//!   number of values after the first, both as uvarints;
//! - bit-packed, when every zig-zagged delta is at most the width's packing
//!   threshold: the first value followed by packed words;
//! - uncompressed otherwise, and always for a single value: every value as is.
//!
//! The first value of run-length and bit-packed blocks is zig-zag encoded at the
//! native width. All fixed-width fields are big-endian.

use byteorder::{BigEndian, ByteOrder};
use strata_arena::Arena;
use strata_bits::varint::put_uvarint;
use strata_common::{Result, error::Error};

use super::{
    BlockHeader, DecodeLimits, MIN_RUN_LENGTH_VALUES, ensure_capacity, ensure_len,
    read_uvarint_at,
};
use crate::{bitpack, kernels::Kernels, value::IntegerValue, zigzag};

/// Uncompressed values at native width (8- and 64-bit blocks).
pub const TAG_UNCOMPRESSED: u8 = 0;
pub const TAG_PACKED: u8 = 1;
pub const TAG_RUN_LENGTH: u8 = 2;
/// Uncompressed 16-bit values.
pub const TAG_UNCOMPRESSED_16: u8 = 3;
/// Uncompressed 32-bit values.
pub const TAG_UNCOMPRESSED_32: u8 = 4;

const ELEMENT: &str = "integer block";

/// Tag of an uncompressed block of `T`.
pub const fn uncompressed_tag<T: IntegerValue>() -> u8 {
    match T::SIZE {
        2 => TAG_UNCOMPRESSED_16,
        4 => TAG_UNCOMPRESSED_32,
        _ => TAG_UNCOMPRESSED,
    }
}

/// Largest number of bytes [`encode`] can produce for `len` values of `T`.
pub fn max_encoded_len<T: IntegerValue>(len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    // Bit-packed deltas never take more than one word per value.
    (1 + len * T::SIZE).max(1 + T::SIZE + (len - 1) * 8)
}

/// Encodes `values`, appending the block to `target`. Returns the number of
/// bytes written.
pub fn encode<T: IntegerValue>(values: &[T], target: &mut Vec<u8>) -> Result<usize> {
    let start = target.len();
    let Some((&first, rest)) = values.split_first() else {
        return Ok(0);
    };
    if rest.is_empty() {
        write_uncompressed(values, target);
        return Ok(target.len() - start);
    }

    let mut deltas = Arena::global().buffer::<u64>(rest.len());
    let mut max_delta = 0;
    let mut prev = first.to_acc();
    for &v in rest {
        let acc = v.to_acc();
        let delta = zigzag::zigzag_encode(acc.wrapping_sub(prev));
        max_delta = max_delta.max(delta);
        deltas.push(delta);
        prev = acc;
    }

    if values.len() >= MIN_RUN_LENGTH_VALUES && deltas.iter().all(|&d| d == deltas[0]) {
        target.push(BlockHeader::new(TAG_RUN_LENGTH, 0).to_byte());
        write_first::<T>(first, target);
        put_uvarint(target, deltas[0]);
        put_uvarint(target, rest.len() as u64);
    } else if max_delta > T::PACK_MAX {
        write_uncompressed(values, target);
    } else {
        target.push(BlockHeader::new(TAG_PACKED, 0).to_byte());
        write_first::<T>(first, target);
        bitpack::encode_to_bytes(&deltas, target)?;
    }
    Ok(target.len() - start)
}

fn write_first<T: IntegerValue>(first: T, target: &mut Vec<u8>) {
    let mut buf = [0u8; 8];
    BigEndian::write_uint(&mut buf, first.zigzag(), T::SIZE);
    target.extend_from_slice(&buf[..T::SIZE]);
}

fn read_first<T: IntegerValue>(src: &[u8]) -> T {
    T::unzigzag(BigEndian::read_uint(src, T::SIZE))
}

fn write_uncompressed<T: IntegerValue>(values: &[T], target: &mut Vec<u8>) {
    target.reserve(1 + values.len() * T::SIZE);
    target.push(BlockHeader::new(uncompressed_tag::<T>(), 0).to_byte());
    for &v in values {
        v.write_be(target);
    }
}

/// Decodes a block, appending the values to `target`. Returns the number of
/// values decoded.
pub fn decode<T: IntegerValue>(src: &[u8], target: &mut Vec<T>) -> Result<usize> {
    decode_with_limits(src, DecodeLimits::default(), target)
}

/// [`decode`] with caller-chosen bounds on the block's value count.
pub fn decode_with_limits<T: IntegerValue>(
    src: &[u8],
    limits: DecodeLimits,
    target: &mut Vec<T>,
) -> Result<usize> {
    let Some(header) = BlockHeader::read(src) else {
        return Ok(0);
    };
    let body = &src[1..];
    match header.tag {
        TAG_PACKED => decode_packed(body, target),
        TAG_RUN_LENGTH => decode_run_length(body, limits, target),
        tag if tag == uncompressed_tag::<T>() => decode_uncompressed(body, target),
        tag => Err(Error::unsupported_encoding(ELEMENT, tag)),
    }
}

/// Decodes a block into the front of `dst`. Returns the number of values.
///
/// Fails without writing if `dst` is shorter than the block.
pub fn decode_into<T: IntegerValue>(src: &[u8], dst: &mut [T]) -> Result<usize> {
    let len = decoded_len::<T>(src)?;
    ensure_capacity(len, dst.len())?;
    let mut values = Arena::global().buffer::<T>(len);
    decode::<T>(src, &mut values)?;
    dst[..len].copy_from_slice(&values);
    Ok(len)
}

/// Number of values in a block, without decoding it.
pub fn decoded_len<T: IntegerValue>(src: &[u8]) -> Result<usize> {
    decoded_len_with_limits::<T>(src, DecodeLimits::default())
}

/// [`decoded_len`] with caller-chosen bounds on the block's value count.
pub fn decoded_len_with_limits<T: IntegerValue>(
    src: &[u8],
    limits: DecodeLimits,
) -> Result<usize> {
    let Some(header) = BlockHeader::read(src) else {
        return Ok(0);
    };
    let body = &src[1..];
    match header.tag {
        TAG_PACKED => {
            ensure_len(ELEMENT, src, 1 + T::SIZE)?;
            Ok(1 + bitpack::count_bytes(&body[T::SIZE..])?)
        }
        TAG_RUN_LENGTH => Ok(read_run_length::<T>(body, limits)?.2),
        tag if tag == uncompressed_tag::<T>() => uncompressed_len::<T>(body),
        tag => Err(Error::unsupported_encoding(ELEMENT, tag)),
    }
}

fn uncompressed_len<T: IntegerValue>(body: &[u8]) -> Result<usize> {
    if body.len() % T::SIZE != 0 {
        return Err(Error::invalid_format(
            ELEMENT,
            format!(
                "expected multiple of {} bytes, got {}",
                T::SIZE,
                body.len()
            ),
        ));
    }
    Ok(body.len() / T::SIZE)
}

fn decode_uncompressed<T: IntegerValue>(body: &[u8], target: &mut Vec<T>) -> Result<usize> {
    let count = uncompressed_len::<T>(body)?;
    target.reserve(count);
    target.extend(body.chunks_exact(T::SIZE).map(T::read_be));
    Ok(count)
}

fn decode_packed<T: IntegerValue>(body: &[u8], target: &mut Vec<T>) -> Result<usize> {
    if body.len() < T::SIZE {
        return Err(Error::short_buffer(ELEMENT, 1 + T::SIZE, 1 + body.len()));
    }
    let first = read_first::<T>(body);
    let words = &body[T::SIZE..];

    let mut acc = Arena::global().buffer::<u64>(1 + bitpack::count_bytes(words)?);
    acc.push(first.to_acc() as u64);
    bitpack::decode_bytes(words, &mut acc)?;
    (Kernels::get().zigzag_delta_decode)(&mut acc);

    target.reserve(acc.len());
    target.extend(acc.iter().map(|&v| T::from_acc(v as i64)));
    Ok(acc.len())
}

/// Returns the first value, the zig-zagged delta and the total value count.
fn read_run_length<T: IntegerValue>(
    body: &[u8],
    limits: DecodeLimits,
) -> Result<(T, u64, usize)> {
    if body.len() < T::SIZE {
        return Err(Error::short_buffer(ELEMENT, 1 + T::SIZE, 1 + body.len()));
    }
    let first = read_first::<T>(body);
    let mut pos = T::SIZE;
    let delta = read_uvarint_at(body, &mut pos)?;
    let count = read_uvarint_at(body, &mut pos)?;
    let total = limits.run_length_total(ELEMENT, count)?;
    Ok((first, delta, total))
}

fn decode_run_length<T: IntegerValue>(
    body: &[u8],
    limits: DecodeLimits,
    target: &mut Vec<T>,
) -> Result<usize> {
    let (first, delta, total) = read_run_length::<T>(body, limits)?;
    let step = zigzag::zigzag_decode(delta);
    let start = first.to_acc();
    target.extend(
        (0..total as i64).map(|i| T::from_acc(start.wrapping_add(step.wrapping_mul(i)))),
    );
    Ok(total)
}
