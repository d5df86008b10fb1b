//! Single-pass statistics used to pick an encoding.

use crate::{kernels::Kernels, value::IntegerValue};

/// Statistics over one block of values.
///
/// An empty block yields all zeros.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Analysis<T> {
    pub min: T,
    pub max: T,
    /// The difference `v[1] - v[0]` (wrapping at the type's width) when every
    /// adjacent pair differs by exactly that amount, zero otherwise.
    pub delta: T,
    /// Number of maximal runs of equal adjacent values.
    pub run_count: usize,
}

/// Coarse classification of a block derived from its [`Analysis`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Empty,
    /// All values are equal.
    Constant,
    /// Values form an arithmetic progression with a non-zero step.
    Arithmetic,
    Irregular,
}

impl<T: IntegerValue> Analysis<T> {
    pub fn shape(&self) -> Shape {
        if self.run_count == 0 {
            Shape::Empty
        } else if self.run_count == 1 {
            Shape::Constant
        } else if self.delta != T::zero() {
            Shape::Arithmetic
        } else {
            Shape::Irregular
        }
    }
}

/// Analyzes `values` with the process-wide kernels.
pub fn analyze<T: IntegerValue>(values: &[T]) -> Analysis<T> {
    Kernels::get().analyze(values)
}

/// Running state of an analysis pass. Kernels feed it single values or whole
/// batches; both paths leave it in the same state.
pub(crate) struct Scan<T> {
    min: T,
    max: T,
    prev: T,
    delta: T,
    progression: bool,
    runs: usize,
}

impl<T: IntegerValue> Scan<T> {
    /// Starts a scan over a non-empty block. The candidate step is taken from
    /// the first two values.
    #[inline(always)]
    pub fn start(values: &[T]) -> Option<(Self, &[T])> {
        let (&first, rest) = values.split_first()?;
        let delta = rest
            .first()
            .map_or(T::zero(), |&second| second.wrapping_sub(&first));
        let scan = Scan {
            min: first,
            max: first,
            prev: first,
            delta,
            progression: true,
            runs: 1,
        };
        Some((scan, rest))
    }

    #[inline(always)]
    pub fn push(&mut self, value: T) {
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        self.runs += (value != self.prev) as usize;
        self.progression &= value.wrapping_sub(&self.prev) == self.delta;
        self.prev = value;
    }

    /// Feeds a batch with the same effect as pushing its values one by one.
    /// Each statistic gets its own branch-free loop.
    #[inline(always)]
    pub fn push_batch(&mut self, batch: &[T]) {
        let Some(&last) = batch.last() else {
            return;
        };

        let (mut min, mut max) = (self.min, self.max);
        for &v in batch {
            min = min.min(v);
            max = max.max(v);
        }

        let mut boundaries = (batch[0] != self.prev) as usize;
        for pair in batch.windows(2) {
            boundaries += (pair[0] != pair[1]) as usize;
        }

        if self.progression {
            let delta = self.delta;
            let mut matches = batch[0].wrapping_sub(&self.prev) == delta;
            for pair in batch.windows(2) {
                matches &= pair[1].wrapping_sub(&pair[0]) == delta;
            }
            self.progression = matches;
        }

        self.min = min;
        self.max = max;
        self.runs += boundaries;
        self.prev = last;
    }

    pub fn finish(self) -> Analysis<T> {
        Analysis {
            min: self.min,
            max: self.max,
            delta: if self.progression {
                self.delta
            } else {
                T::zero()
            },
            run_count: self.runs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernels::portable;

    #[test]
    fn test_analyze_basic() {
        let a = portable::analyze(&[1i64, 1, 2, 2, 3]);
        assert_eq!(
            a,
            Analysis {
                min: 1,
                max: 3,
                delta: 0,
                run_count: 3
            }
        );
        assert_eq!(a.shape(), Shape::Irregular);

        let a = portable::analyze(&[-1i32, 0, 1, 2]);
        assert_eq!((a.min, a.max, a.delta, a.run_count), (-1, 2, 1, 4));
        assert_eq!(a.shape(), Shape::Arithmetic);
    }

    #[test]
    fn test_analyze_empty_and_constant() {
        assert_eq!(portable::analyze::<u16>(&[]), Analysis::default());
        assert_eq!(portable::analyze::<u16>(&[]).shape(), Shape::Empty);

        let a = portable::analyze(&[7u8; 100]);
        assert_eq!((a.min, a.max, a.delta, a.run_count), (7, 7, 0, 1));
        assert_eq!(a.shape(), Shape::Constant);

        let a = portable::analyze(&[42i16]);
        assert_eq!((a.min, a.max, a.delta, a.run_count), (42, 42, 0, 1));
    }

    #[test]
    fn test_analyze_unsigned_negative_delta() {
        let a = portable::analyze(&[10u32, 7, 4, 1]);
        assert_eq!(a.delta, 3u32.wrapping_neg());
        assert_eq!((a.min, a.max, a.run_count), (1, 10, 4));

        let a = portable::analyze(&[250u8, 251, 252]);
        assert_eq!(a.delta, 1);
    }

    #[test]
    fn test_batch_matches_single_values() {
        let values: Vec<i64> = (0..100).map(|i| (i / 3) * 5 - 40).collect();
        let (mut single, rest) = Scan::start(&values).unwrap();
        for &v in rest {
            single.push(v);
        }
        let (mut batched, rest) = Scan::start(&values).unwrap();
        for chunk in rest.chunks(32) {
            batched.push_batch(chunk);
        }
        assert_eq!(single.finish(), batched.finish());
    }
}
