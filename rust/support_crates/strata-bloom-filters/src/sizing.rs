//! Optimal filter parameters.

use std::f64::consts::LN_2;

/// Computes the bit count and probe count for `items` insertions at a false
/// positive probability of `fpp`.
///
/// Uses the standard formulas `m = ceil(-n ln(p) / ln(2)^2)` and
/// `k = ceil(ln(2) m / n)`. An item count of zero is treated as one; `fpp` is
/// clamped into `(0, 1)`. The returned bit count is not rounded to a power of
/// two, [`Filter::new`](crate::Filter::new) does that.
pub fn estimate(items: usize, fpp: f64) -> (usize, u32) {
    let n = items.max(1) as f64;
    let p = fpp.clamp(f64::MIN_POSITIVE, 1.0 - f64::EPSILON);
    let m = (-n * p.ln() / (LN_2 * LN_2)).ceil().max(1.0);
    let k = (LN_2 * m / n).ceil().max(1.0);
    (m as usize, k as u32)
}

/// Expected false positive probability `(1 - e^(-k n / m))^k` of a filter with
/// `bits` bits and `k` probes after `items` insertions.
pub fn false_positive_rate(bits: usize, k: u32, items: usize) -> f64 {
    if bits == 0 {
        return 1.0;
    }
    let k = k as f64;
    (1.0 - (-k * items as f64 / bits as f64).exp()).powf(k)
}
