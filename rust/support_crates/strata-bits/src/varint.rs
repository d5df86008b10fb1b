//! Unsigned LEB128 variable-length integers.

use strata_common::{Result, error::Error};

/// Maximum number of bytes used by a varint-encoded `u64`.
pub const MAX_VARINT_LEN64: usize = 10;

/// Appends `value` to `target` as an unsigned varint and returns the number
/// of bytes written.
pub fn put_uvarint(target: &mut Vec<u8>, mut value: u64) -> usize {
    let start = target.len();
    while value >= 0x80 {
        target.push((value as u8) | 0x80);
        value >>= 7;
    }
    target.push(value as u8);
    target.len() - start
}

/// Reads an unsigned varint from the start of `src`.
///
/// Returns the decoded value together with the number of bytes consumed.
pub fn read_uvarint(src: &[u8]) -> Result<(u64, usize)> {
    let mut value = 0u64;
    let mut shift = 0u32;
    for (i, &byte) in src.iter().enumerate() {
        if i == MAX_VARINT_LEN64 {
            break;
        }
        if byte < 0x80 {
            if i == MAX_VARINT_LEN64 - 1 && byte > 1 {
                return Err(Error::invalid_format("uvarint", "value overflows 64 bits"));
            }
            return Ok((value | (byte as u64) << shift, i + 1));
        }
        value |= ((byte & 0x7F) as u64) << shift;
        shift += 7;
    }
    if src.len() >= MAX_VARINT_LEN64 {
        Err(Error::invalid_format("uvarint", "value overflows 64 bits"))
    } else {
        Err(Error::short_buffer("uvarint", src.len() + 1, src.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_encodings() {
        let mut buf = Vec::new();
        assert_eq!(put_uvarint(&mut buf, 0), 1);
        assert_eq!(put_uvarint(&mut buf, 127), 1);
        assert_eq!(put_uvarint(&mut buf, 300), 2);
        assert_eq!(buf, [0x00, 0x7F, 0xAC, 0x02]);

        assert_eq!(read_uvarint(&buf[2..]).unwrap(), (300, 2));
        assert_eq!(read_uvarint(&buf[1..]).unwrap(), (127, 1));
    }

    #[test]
    fn test_lengths() {
        let cases = [
            (0u64, 1),
            (127, 1),
            (128, 2),
            (16383, 2),
            (16384, 3),
            (u32::MAX as u64, 5),
            (u64::MAX, MAX_VARINT_LEN64),
        ];
        for (value, len) in cases {
            let mut buf = Vec::new();
            assert_eq!(put_uvarint(&mut buf, value), len);
            assert_eq!(read_uvarint(&buf).unwrap(), (value, len));
        }
    }

    #[test]
    fn test_random_values() {
        let mut buf = Vec::new();
        let values = (0..1000)
            .map(|_| fastrand::u64(..) >> fastrand::u32(0..64))
            .collect::<Vec<_>>();
        for &value in &values {
            put_uvarint(&mut buf, value);
        }
        let mut pos = 0;
        for &value in &values {
            let (decoded, n) = read_uvarint(&buf[pos..]).unwrap();
            assert_eq!(decoded, value);
            pos += n;
        }
        assert_eq!(pos, buf.len());
    }

    #[test]
    fn test_truncated_and_overflow() {
        assert!(read_uvarint(&[]).unwrap_err().is_corrupt_input());
        assert!(read_uvarint(&[0x80, 0x80]).unwrap_err().is_corrupt_input());

        let overflow = [0xFF; 10];
        assert!(read_uvarint(&overflow).is_err());
        let mut too_big = vec![0xFF; 9];
        too_big.push(0x02);
        assert!(read_uvarint(&too_big).is_err());
    }
}
