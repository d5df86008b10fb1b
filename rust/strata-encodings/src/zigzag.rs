//! Zig-zag mapping between signed and unsigned 64-bit integers.
//!
//! `0, -1, 1, -2, 2, ...` maps to `0, 1, 2, 3, 4, ...`, so deltas of small
//! magnitude stay small regardless of their sign.

#[inline(always)]
pub fn zigzag_encode(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

#[inline(always)]
pub fn zigzag_decode(value: u64) -> i64 {
    ((value >> 1) as i64) ^ (value & 1).wrapping_neg() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zigzag_mapping() {
        let signed = [0i64, -1, 1, -2, 2, i64::MAX, i64::MIN];
        let unsigned = [0u64, 1, 2, 3, 4, u64::MAX - 1, u64::MAX];
        for (&s, &u) in signed.iter().zip(&unsigned) {
            assert_eq!(zigzag_encode(s), u);
            assert_eq!(zigzag_decode(u), s);
        }
    }
}
