//! Float block codec.
//!
//! Values are stored as a Gorilla bit stream over their 64-bit patterns (`f32`
//! values are promoted first). After the header byte comes the first pattern as
//! eight big-endian bytes, then, for every following value, its XOR with the
//! previous pattern:
//!
//! - `0`: same value as before;
//! - `10` + bits: the XOR fits the previous leading/trailing zero window, only
//!   the bits inside the window follow;
//! - `11` + 5-bit leading zero count + 6-bit significant bit count + bits: a new
//!   window.
//!
//! The stream ends with [`TERMINATOR`], a NaN pattern, encoded like any other
//! value and padded to a whole byte. NaN values cannot be encoded.

use byteorder::{BigEndian, ByteOrder};
use strata_arena::Arena;
use strata_bits::{
    bitcast,
    bitstream::{BitReader, BitWriter},
};
use strata_common::{Result, error::Error, verify_data};

use super::{BlockHeader, ensure_capacity, ensure_len};
use crate::value::FloatValue;

pub const TAG_GORILLA: u8 = 1;

/// Bit pattern that ends the stream.
pub const TERMINATOR: u64 = 0x7FF8_0000_0000_0001;

const ELEMENT: &str = "float block";

/// Leading zero counts are stored in 5 bits.
const MAX_LEADING: u32 = 31;

/// Largest number of bytes [`encode`] can produce for `len` values.
pub fn max_encoded_len(len: usize) -> usize {
    // Header, first pattern, then at most 2 + 5 + 6 + 64 bits for every other
    // value and the terminator.
    9 + (len * 77).div_ceil(8)
}

/// Encodes `values`, appending the block to `target`. Returns the number of
/// bytes written.
///
/// Fails with a value-out-of-range error if any value is NaN; nothing is
/// appended in that case.
pub fn encode<T: FloatValue>(values: &[T], target: &mut Vec<u8>) -> Result<usize> {
    let mut promoted = Arena::global().buffer::<f64>(values.len());
    promoted.extend(values.iter().map(|v| v.to_f64()));
    if let Some(pos) = promoted.iter().position(|v| v.is_nan()) {
        return Err(Error::value_out_of_range(
            ELEMENT,
            format!("NaN at position {pos}"),
        ));
    }
    let patterns: &[u64] = bitcast::cast_slice(&promoted);

    let start = target.len();
    target.push(BlockHeader::new(TAG_GORILLA, 0).to_byte());
    let Some((&first, rest)) = patterns.split_first() else {
        target.extend_from_slice(&TERMINATOR.to_be_bytes());
        return Ok(target.len() - start);
    };
    target.extend_from_slice(&first.to_be_bytes());

    let mut writer = BitWriter::new(target);
    let mut encoder = Encoder::new(first);
    for &pattern in rest {
        encoder.write(&mut writer, pattern);
    }
    encoder.write(&mut writer, TERMINATOR);
    writer.finish();
    Ok(target.len() - start)
}

struct Encoder {
    prev: u64,
    /// Leading and trailing zero counts of the current window.
    window: Option<(u32, u32)>,
}

impl Encoder {
    fn new(first: u64) -> Self {
        Encoder {
            prev: first,
            window: None,
        }
    }

    fn write(&mut self, writer: &mut BitWriter<'_>, pattern: u64) {
        let xor = pattern ^ self.prev;
        self.prev = pattern;
        if xor == 0 {
            writer.write_bit(false);
            return;
        }
        writer.write_bit(true);

        let leading = xor.leading_zeros().min(MAX_LEADING);
        let trailing = xor.trailing_zeros();
        match self.window {
            Some((prev_leading, prev_trailing))
                if leading >= prev_leading && trailing >= prev_trailing =>
            {
                writer.write_bit(false);
                writer.write_bits(xor >> prev_trailing, 64 - prev_leading - prev_trailing);
            }
            _ => {
                let significant = 64 - leading - trailing;
                writer.write_bit(true);
                writer.write_bits(leading as u64, 5);
                // 64 significant bits wrap to 0 in the 6-bit field.
                writer.write_bits(significant as u64, 6);
                writer.write_bits(xor >> trailing, significant);
                self.window = Some((leading, trailing));
            }
        }
    }
}

/// Walks a block, passing every decoded pattern to `sink`. Returns the number
/// of values.
fn walk(src: &[u8], mut sink: impl FnMut(u64)) -> Result<usize> {
    let Some(header) = BlockHeader::read(src) else {
        return Ok(0);
    };
    if header.tag != TAG_GORILLA {
        return Err(Error::unsupported_encoding(ELEMENT, header.tag));
    }
    ensure_len(ELEMENT, src, 9)?;
    let mut prev = BigEndian::read_u64(&src[1..9]);
    if prev == TERMINATOR {
        return Ok(0);
    }
    sink(prev);
    let mut count = 1;

    let mut reader = BitReader::new(&src[9..]);
    let mut window: Option<(u32, u32)> = None;
    loop {
        if reader.read_bit()? {
            let (leading, trailing) = if reader.read_bit()? {
                let leading = reader.read_bits(5)? as u32;
                let significant = match reader.read_bits(6)? as u32 {
                    0 => 64,
                    n => n,
                };
                verify_data!(significant, leading + significant <= 64);
                window = Some((leading, 64 - leading - significant));
                (leading, 64 - leading - significant)
            } else {
                window.ok_or_else(|| {
                    Error::invalid_format(ELEMENT, "window reuse before the first window")
                })?
            };
            let xor = reader.read_bits(64 - leading - trailing)? << trailing;
            prev ^= xor;
            if prev == TERMINATOR {
                break;
            }
        }
        sink(prev);
        count += 1;
    }
    Ok(count)
}

/// Decodes a block, appending the values to `target`. Returns the number of
/// values decoded.
pub fn decode<T: FloatValue>(src: &[u8], target: &mut Vec<T>) -> Result<usize> {
    let start = target.len();
    let result = walk(src, |pattern| target.push(T::from_f64(f64::from_bits(pattern))));
    if result.is_err() {
        target.truncate(start);
    }
    result
}

/// Decodes a block into the front of `dst`. Returns the number of values.
///
/// Fails without writing if `dst` is shorter than the block.
pub fn decode_into<T: FloatValue>(src: &[u8], dst: &mut [T]) -> Result<usize> {
    let len = decoded_len(src)?;
    ensure_capacity(len, dst.len())?;
    let mut pos = 0;
    walk(src, |pattern| {
        dst[pos] = T::from_f64(f64::from_bits(pattern));
        pos += 1;
    })
}

/// Number of values in a block. The stream has no count field, so this walks
/// the whole stream.
pub fn decoded_len(src: &[u8]) -> Result<usize> {
    walk(src, |_| {})
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip<T: FloatValue>(values: &[T]) -> Vec<u8> {
        let mut block = Vec::new();
        assert_eq!(encode(values, &mut block).unwrap(), block.len());
        assert!(block.len() <= max_encoded_len(values.len()));
        assert_eq!(decoded_len(&block).unwrap(), values.len());
        let mut decoded = Vec::<T>::new();
        decode(&block, &mut decoded).unwrap();
        assert_eq!(decoded.len(), values.len());
        for (a, b) in decoded.iter().zip(values) {
            assert_eq!(a.to_f64().to_bits(), b.to_f64().to_bits());
        }
        block
    }

    #[test]
    fn test_repeated_values() {
        let block = round_trip(&[12.5f64; 5]);
        // Four `0` bits, then the terminator with a new window.
        assert_eq!(block[0], 0x10);
        assert_eq!(&block[1..9], &12.5f64.to_bits().to_be_bytes());
        assert_eq!(block[9] >> 4, 0b0000);
    }

    #[test]
    fn test_special_values() {
        round_trip(&[
            0.0f64,
            -0.0,
            f64::INFINITY,
            f64::NEG_INFINITY,
            f64::MIN_POSITIVE,
            f64::MAX,
            f64::MIN,
            5e-324,
            1.0,
        ]);
        round_trip(&[f32::MAX, f32::MIN, 0.1, -0.0, f32::EPSILON, 1e-45]);
    }

    #[test]
    fn test_window_reuse() {
        let values: Vec<f64> = (0..200).map(|i| 100.0 + (i % 7) as f64 * 0.25).collect();
        let block = round_trip(&values);
        assert!(block.len() < values.len() * 4);
    }

    #[test]
    fn test_empty_block() {
        let block = round_trip::<f64>(&[]);
        assert_eq!(block, [&[0x10][..], &TERMINATOR.to_be_bytes()[..]].concat());
        assert_eq!(decode::<f32>(&[], &mut Vec::new()).unwrap(), 0);
    }

    #[test]
    fn test_nan_rejected() {
        let mut block = vec![0xAA];
        let err = encode(&[1.0f64, f64::NAN], &mut block).unwrap_err();
        assert_eq!(
            err.to_string(),
            "value out of range for 'float block': NaN at position 1"
        );
        assert_eq!(block, [0xAA]);
        assert!(encode(&[f32::NAN], &mut block).is_err());
    }

    #[test]
    fn test_decode_errors() {
        let mut block = Vec::new();
        encode(&[1.0f64, 2.0, 3.5, -7.25], &mut block).unwrap();

        let mut out = Vec::<f64>::new();
        let err = decode(&block[..5], &mut out).unwrap_err();
        assert!(err.is_corrupt_input());

        // Stream cut before the terminator.
        let err = decode(&block[..block.len() - 2], &mut out).unwrap_err();
        assert!(err.is_corrupt_input());
        assert!(out.is_empty());

        let mut wrong = block.clone();
        wrong[0] = 0x20;
        assert!(decode(&wrong, &mut out).is_err());

        // `10` control bits with no window yet.
        let mut orphan = block[..9].to_vec();
        orphan.push(0b1000_0000);
        assert!(decode(&orphan, &mut out).unwrap_err().is_corrupt_input());
    }

    #[test]
    fn test_decode_into() {
        let values = [3.0f32, 3.0, 4.5, -1.0, 1e10];
        let mut block = Vec::new();
        encode(&values, &mut block).unwrap();
        let mut dst = [0f32; 8];
        assert_eq!(decode_into(&block, &mut dst).unwrap(), 5);
        assert_eq!(&dst[..5], &values);

        let mut small = [0f32; 4];
        assert!(decode_into(&block, &mut small).is_err());
        assert_eq!(small, [0.0; 4]);
    }
}
