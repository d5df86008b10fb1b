//! MSB-first bit streams.
//!
//! [`BitWriter`] appends bit fields of up to 64 bits to a byte vector, most
//! significant bit first. [`BitReader`] reads them back through a 64-bit cache
//! register: the register is refilled eight bytes at a time and each field is
//! extracted by rotating the wanted bits into the low end of the word.

use byteorder::{BigEndian, ByteOrder};
use strata_common::{Result, error::Error};

#[inline(always)]
fn low_mask(count: u32) -> u64 {
    if count >= 64 {
        u64::MAX
    } else {
        (1u64 << count) - 1
    }
}

/// Appends bit fields to a byte vector.
pub struct BitWriter<'a> {
    target: &'a mut Vec<u8>,
    /// Pending bits, aligned to the most significant end.
    acc: u64,
    /// Number of pending bits in `acc`.
    used: u32,
    written: usize,
}

impl<'a> BitWriter<'a> {
    pub fn new(target: &'a mut Vec<u8>) -> Self {
        BitWriter {
            target,
            acc: 0,
            used: 0,
            written: 0,
        }
    }

    #[inline]
    pub fn write_bit(&mut self, bit: bool) {
        self.write_bits(bit as u64, 1);
    }

    /// Writes the `count` least significant bits of `value`, most significant first.
    #[inline]
    pub fn write_bits(&mut self, value: u64, count: u32) {
        debug_assert!(count <= 64);
        if count == 0 {
            return;
        }
        let value = value & low_mask(count);
        self.written += count as usize;
        let free = 64 - self.used;
        if count < free {
            self.acc |= value << (free - count);
            self.used += count;
        } else {
            let rest = count - free;
            self.acc |= value >> rest;
            self.flush_word();
            if rest > 0 {
                self.acc = value << (64 - rest);
                self.used = rest;
            }
        }
    }

    #[inline]
    fn flush_word(&mut self) {
        let mut word = [0u8; 8];
        BigEndian::write_u64(&mut word, self.acc);
        self.target.extend_from_slice(&word);
        self.acc = 0;
        self.used = 0;
    }

    /// Flushes pending bits, padding the last byte with zeros, and returns the
    /// total number of bits written.
    pub fn finish(mut self) -> usize {
        let bytes = self.used.div_ceil(8) as usize;
        let mut word = [0u8; 8];
        BigEndian::write_u64(&mut word, self.acc);
        self.target.extend_from_slice(&word[..bytes]);
        self.used = 0;
        self.written
    }
}

/// Reads bit fields written by [`BitWriter`].
pub struct BitReader<'a> {
    src: &'a [u8],
    pos: usize,
    /// Cache register; unread bits are aligned to the most significant end.
    cache: u64,
    avail: u32,
}

impl<'a> BitReader<'a> {
    pub fn new(src: &'a [u8]) -> Self {
        BitReader {
            src,
            pos: 0,
            cache: 0,
            avail: 0,
        }
    }

    fn refill(&mut self) {
        let remaining = &self.src[self.pos..];
        if remaining.len() >= 8 {
            self.cache = BigEndian::read_u64(remaining);
            self.avail = 64;
            self.pos += 8;
        } else {
            let mut cache = 0u64;
            for (i, &byte) in remaining.iter().enumerate() {
                cache |= (byte as u64) << (56 - 8 * i);
            }
            self.cache = cache;
            self.avail = remaining.len() as u32 * 8;
            self.pos = self.src.len();
        }
    }

    /// Takes `count` (1..=avail) bits off the top of the cache register.
    #[inline(always)]
    fn take(&mut self, count: u32) -> u64 {
        debug_assert!(count >= 1 && count <= self.avail);
        if count == 64 {
            let value = self.cache;
            self.cache = 0;
            self.avail = 0;
            return value;
        }
        let rotated = self.cache.rotate_left(count);
        let mask = low_mask(count);
        self.cache = rotated & !mask;
        self.avail -= count;
        rotated & mask
    }

    #[inline]
    pub fn read_bit(&mut self) -> Result<bool> {
        Ok(self.read_bits(1)? != 0)
    }

    /// Reads a field of `count` bits (at most 64).
    #[inline]
    pub fn read_bits(&mut self, count: u32) -> Result<u64> {
        debug_assert!(count <= 64);
        if count == 0 {
            return Ok(0);
        }
        if count <= self.avail {
            return Ok(self.take(count));
        }
        let head_bits = self.avail;
        let head = if head_bits > 0 { self.take(head_bits) } else { 0 };
        let tail_bits = count - head_bits;
        self.refill();
        if self.avail < tail_bits {
            return Err(Error::short_buffer(
                "bit stream",
                self.src.len() + (tail_bits - self.avail).div_ceil(8) as usize,
                self.src.len(),
            ));
        }
        let tail = self.take(tail_bits);
        if head_bits == 0 {
            Ok(tail)
        } else {
            Ok((head << tail_bits) | tail)
        }
    }

    /// Number of bits consumed so far.
    pub fn bits_read(&self) -> usize {
        self.pos * 8 - self.avail as usize
    }
}
