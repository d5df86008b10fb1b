use std::{cmp::Ordering, fmt::Debug, hash::Hash};

use num_traits::{PrimInt, WrappingAdd, WrappingSub};
use strata_arena::ArenaElement;

use crate::bitpack::MAX_VALUE;

/// Integer value type that can be encoded by the integer codec, analyzed and
/// dictionary-coded.
///
/// All delta arithmetic runs in a 64-bit accumulator: [`to_acc`](Self::to_acc)
/// widens a value (sign-extending signed types, keeping the bit pattern of
/// `u64`) and [`from_acc`](Self::from_acc) truncates back to the native width.
pub trait IntegerValue:
    PrimInt + WrappingAdd + WrappingSub + ArenaElement + Hash + Debug + Default
{
    const SIZE: usize;
    const BITS_COUNT: u32 = Self::SIZE as u32 * 8;

    /// Largest zig-zagged delta the bit-packed format accepts for this width.
    const PACK_MAX: u64;

    fn to_acc(self) -> i64;

    fn from_acc(acc: i64) -> Self;

    /// Zig-zag encodes the value at its native width, treating the bits as a
    /// signed integer. The result fits in `SIZE` bytes.
    fn zigzag(self) -> u64;

    /// Inverse of [`zigzag`](Self::zigzag); bits above the native width are ignored.
    fn unzigzag(value: u64) -> Self;

    fn write_be(self, target: &mut Vec<u8>);

    /// Reads a big-endian value from the first `SIZE` bytes of `src`.
    fn read_be(src: &[u8]) -> Self;
}

/// Value type a dictionary can be built over: the integers and the floats.
///
/// Two values are the same dictionary entry when their keys are equal, so
/// floats compare by bit pattern: `-0.0` and `0.0` are distinct entries and a
/// NaN matches only a NaN with the same payload.
pub trait DictionaryValue: ArenaElement + Debug {
    /// Bit pattern identifying the value within its type.
    fn key(self) -> u64;

    /// Total order of the sorted dictionary, consistent with [`key`](Self::key)
    /// equality.
    fn dict_cmp(&self, other: &Self) -> Ordering;
}

macro_rules! impl_integer_value {
    ($T:ty, $S:ty, $U:ty) => {
        impl IntegerValue for $T {
            const SIZE: usize = std::mem::size_of::<$T>();

            const PACK_MAX: u64 = if Self::SIZE == 8 {
                MAX_VALUE
            } else {
                <$U>::MAX as u64
            };

            #[inline(always)]
            fn to_acc(self) -> i64 {
                self as i64
            }

            #[inline(always)]
            fn from_acc(acc: i64) -> Self {
                acc as $T
            }

            #[inline(always)]
            fn zigzag(self) -> u64 {
                let s = self as $S;
                ((s << 1) ^ (s >> (<$S>::BITS - 1))) as $U as u64
            }

            #[inline(always)]
            fn unzigzag(value: u64) -> Self {
                let u = value as $U;
                (((u >> 1) as $S) ^ ((u & 1) as $S).wrapping_neg()) as $T
            }

            #[inline]
            fn write_be(self, target: &mut Vec<u8>) {
                target.extend_from_slice(&self.to_be_bytes());
            }

            #[inline]
            fn read_be(src: &[u8]) -> Self {
                let mut b = [0u8; Self::SIZE];
                b.copy_from_slice(&src[..Self::SIZE]);
                <$T>::from_be_bytes(b)
            }
        }

        impl DictionaryValue for $T {
            #[inline(always)]
            fn key(self) -> u64 {
                self as i64 as u64
            }

            #[inline]
            fn dict_cmp(&self, other: &Self) -> Ordering {
                self.cmp(other)
            }
        }
    };
}

impl_integer_value!(i8, i8, u8);
impl_integer_value!(i16, i16, u16);
impl_integer_value!(i32, i32, u32);
impl_integer_value!(i64, i64, u64);
impl_integer_value!(u8, i8, u8);
impl_integer_value!(u16, i16, u16);
impl_integer_value!(u32, i32, u32);
impl_integer_value!(u64, i64, u64);

/// Floating point value type accepted by the float codec. Values travel
/// through the codec as `f64`; `f32` promotion and demotion are lossless.
pub trait FloatValue: ArenaElement + PartialEq + Debug + Default {
    fn to_f64(self) -> f64;

    fn from_f64(value: f64) -> Self;
}

impl FloatValue for f32 {
    #[inline(always)]
    fn to_f64(self) -> f64 {
        self as f64
    }

    #[inline(always)]
    fn from_f64(value: f64) -> Self {
        value as f32
    }
}

impl FloatValue for f64 {
    #[inline(always)]
    fn to_f64(self) -> f64 {
        self
    }

    #[inline(always)]
    fn from_f64(value: f64) -> Self {
        value
    }
}

macro_rules! impl_float_dictionary_value {
    ($($T:ty),*) => {
        $(
            impl DictionaryValue for $T {
                #[inline(always)]
                fn key(self) -> u64 {
                    self.to_bits() as u64
                }

                #[inline]
                fn dict_cmp(&self, other: &Self) -> Ordering {
                    self.total_cmp(other)
                }
            }
        )*
    };
}

impl_float_dictionary_value!(f32, f64);
