//! Process-wide selection of hot-loop implementations.
//!
//! The analyzer loop, the bit-pack unpack and count loops, the delta decode
//! loops and the dictionary builder each exist in a portable form and, on
//! x86-64, in an AVX2 form that works on fixed-size batches and finishes the
//! tail with the portable code. [`Kernels::get`] picks one set the first time it
//! is called and never changes it afterwards.

use std::sync::LazyLock;

use strata_common::Result;

use crate::{
    analyze::Analysis,
    dictionary::Dictionary,
    value::{DictionaryValue, IntegerValue},
};

#[cfg(target_arch = "x86_64")]
pub(crate) mod avx2;
pub(crate) mod portable;

/// Instruction set level of a kernel table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelLevel {
    Portable,
    Avx2,
}

/// Table of kernel entry points.
///
/// The non-generic kernels are plain function pointers. Generic kernels cannot
/// be stored that way and are exposed as methods that branch on the level.
#[derive(Debug, Clone, Copy)]
pub struct Kernels {
    level: KernelLevel,
    /// Unpacks packed words, appending the values to the vector.
    pub unpack_words: fn(&[u64], &mut Vec<u64>),
    /// Counts the values held by packed words.
    pub count_words: fn(&[u64]) -> usize,
    /// In-place running sum: `data[i] += data[i - 1]` for `i >= 1`, wrapping.
    pub delta_decode: fn(&mut [u64]),
    /// Like `delta_decode`, but every element after the first is a zig-zag
    /// encoded signed delta.
    pub zigzag_delta_decode: fn(&mut [u64]),
}

static KERNELS: LazyLock<Kernels> = LazyLock::new(|| {
    let kernels = Kernels::detect();
    log::debug!("strata-encodings: using {:?} kernels", kernels.level);
    kernels
});

impl Kernels {
    /// Returns the process-wide kernel table.
    #[inline]
    pub fn get() -> &'static Kernels {
        &KERNELS
    }

    /// The portable kernels, available on every target.
    pub fn portable() -> Kernels {
        Kernels {
            level: KernelLevel::Portable,
            unpack_words: portable::unpack_words,
            count_words: portable::count_words,
            delta_decode: portable::delta_decode,
            zigzag_delta_decode: portable::zigzag_delta_decode,
        }
    }

    /// The best kernels supported by the running CPU.
    pub fn detect() -> Kernels {
        Self::with_level(KernelLevel::Avx2).unwrap_or_else(Self::portable)
    }

    /// Returns the kernels of the requested level, or `None` if the running CPU
    /// does not support it.
    pub fn with_level(level: KernelLevel) -> Option<Kernels> {
        match level {
            KernelLevel::Portable => Some(Self::portable()),
            KernelLevel::Avx2 => Self::avx2(),
        }
    }

    #[cfg(target_arch = "x86_64")]
    fn avx2() -> Option<Kernels> {
        if !is_x86_feature_detected!("avx2") {
            return None;
        }
        Some(Kernels {
            level: KernelLevel::Avx2,
            unpack_words: avx2::unpack_words,
            count_words: avx2::count_words,
            delta_decode: avx2::delta_decode,
            zigzag_delta_decode: avx2::zigzag_delta_decode,
        })
    }

    #[cfg(not(target_arch = "x86_64"))]
    fn avx2() -> Option<Kernels> {
        None
    }

    pub fn level(&self) -> KernelLevel {
        self.level
    }

    /// Computes min, max, common delta and run count of `values`.
    pub fn analyze<T: IntegerValue>(&self, values: &[T]) -> Analysis<T> {
        match self.level {
            #[cfg(target_arch = "x86_64")]
            KernelLevel::Avx2 => avx2::analyze(values),
            _ => portable::analyze(values),
        }
    }

    /// Builds the sorted dictionary of `values` and the per-row codes.
    pub fn build_dictionary<T: DictionaryValue>(
        &self,
        values: &[T],
        cardinality_hint: usize,
    ) -> Result<Dictionary<T>> {
        match self.level {
            #[cfg(target_arch = "x86_64")]
            KernelLevel::Avx2 => avx2::build_dictionary(values, cardinality_hint),
            _ => portable::build_dictionary(values, cardinality_hint),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOUNDARY_LENGTHS: [usize; 11] = [0, 1, 31, 32, 33, 63, 64, 65, 127, 128, 129];

    fn accelerated() -> Option<Kernels> {
        Kernels::with_level(KernelLevel::Avx2)
    }

    #[test]
    fn test_global_is_detected_once() {
        let a = Kernels::get() as *const Kernels;
        let b = Kernels::get() as *const Kernels;
        assert_eq!(a, b);
        assert_eq!(Kernels::get().level(), Kernels::detect().level());
        assert_eq!(Kernels::portable().level(), KernelLevel::Portable);
    }

    #[test]
    fn test_prefix_sums_match() {
        let Some(fast) = accelerated() else {
            return;
        };
        let slow = Kernels::portable();
        let mut rng = fastrand::Rng::with_seed(11);
        for len in BOUNDARY_LENGTHS.into_iter().chain([1000, 4097]) {
            let data: Vec<u64> = (0..len).map(|_| rng.u64(..)).collect();

            let mut a = data.clone();
            let mut b = data.clone();
            (slow.delta_decode)(&mut a);
            (fast.delta_decode)(&mut b);
            assert_eq!(a, b, "delta_decode len {len}");

            let mut a = data.clone();
            let mut b = data;
            (slow.zigzag_delta_decode)(&mut a);
            (fast.zigzag_delta_decode)(&mut b);
            assert_eq!(a, b, "zigzag_delta_decode len {len}");
        }
    }

    #[test]
    fn test_word_kernels_match() {
        let Some(fast) = accelerated() else {
            return;
        };
        let slow = Kernels::portable();
        let mut rng = fastrand::Rng::with_seed(12);
        for len in BOUNDARY_LENGTHS {
            let words: Vec<u64> = (0..len).map(|_| rng.u64(..)).collect();
            assert_eq!((slow.count_words)(&words), (fast.count_words)(&words));
            let mut a = vec![];
            let mut b = vec![];
            (slow.unpack_words)(&words, &mut a);
            (fast.unpack_words)(&words, &mut b);
            assert_eq!(a, b, "unpack_words len {len}");
        }
    }

    #[test]
    fn test_analyze_matches() {
        let Some(fast) = accelerated() else {
            return;
        };
        let slow = Kernels::portable();
        let mut rng = fastrand::Rng::with_seed(13);
        for len in BOUNDARY_LENGTHS.into_iter().chain([200, 1025]) {
            let random: Vec<i32> = (0..len).map(|_| rng.i32(-3..3)).collect();
            assert_eq!(slow.analyze(&random), fast.analyze(&random), "len {len}");

            let progression: Vec<u16> = (0..len)
                .map(|i| 60_000u16.wrapping_add((i as u16).wrapping_mul(9)))
                .collect();
            assert_eq!(slow.analyze(&progression), fast.analyze(&progression));

            let mut broken = progression.clone();
            if let Some(last) = broken.last_mut() {
                *last = last.wrapping_add(1);
            }
            assert_eq!(slow.analyze(&broken), fast.analyze(&broken));
        }
    }
}
