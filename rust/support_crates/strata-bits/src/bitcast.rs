//! Same-width reinterpretation of numeric values and slices.
//!
//! Codecs frequently need to look at a buffer of signed integers as its unsigned
//! counterpart (or the other way around) without touching the bits. All such
//! views go through this module. Each function rejects, at compile time, any pair
//! of types whose size or alignment differ, so a mismatched cast never reaches
//! runtime.
//!
//! ```rust
//! use strata_bits::bitcast;
//!
//! let signed = [-1i64, 2, -3];
//! let unsigned: &[u64] = bitcast::cast_slice(&signed);
//! assert_eq!(unsigned[0], u64::MAX);
//! assert_eq!(bitcast::cast::<u8, i8>(0xFF), -1);
//! ```

use bytemuck::Pod;

#[inline(always)]
const fn assert_same_layout<T, U>() {
    assert!(
        std::mem::size_of::<T>() == std::mem::size_of::<U>(),
        "bitcast requires types of equal size"
    );
    assert!(
        std::mem::align_of::<T>() == std::mem::align_of::<U>(),
        "bitcast requires types of equal alignment"
    );
}

/// Reinterprets a single value as another type of the same width.
#[inline]
pub fn cast<T: Pod, U: Pod>(value: T) -> U {
    const { assert_same_layout::<T, U>() };
    bytemuck::cast(value)
}

/// Reinterprets a slice as a slice of another element type of the same width.
#[inline]
pub fn cast_slice<T: Pod, U: Pod>(values: &[T]) -> &[U] {
    const { assert_same_layout::<T, U>() };
    bytemuck::cast_slice(values)
}
