//! Wilson score interval for a binomial proportion.

use super::normal::z_for_alpha;

/// Conventional 95 % critical value.
pub const Z_95_FIXED: f64 = 1.96;

/// Wilson score interval for `k` successes out of `n` trials.
///
/// `z` is derived from `alpha` (1.959964 at alpha = 0.05). Returns `None` when
/// there were no trials, when `k > n`, or when `alpha` is outside (0, 1).
pub fn wilson_interval(k: u64, n: u64, alpha: f64) -> Option<(f64, f64)> {
    wilson_interval_z(k, n, z_for_alpha(alpha).ok()?)
}

/// Wilson interval with an explicit critical value.
///
/// Bounds are clamped to [0, 1] and widened if needed so that k/n always lies
/// inside the reported interval.
pub fn wilson_interval_z(k: u64, n: u64, z: f64) -> Option<(f64, f64)> {
    if n == 0 || k > n {
        return None;
    }

    let n = n as f64;
    let p = k as f64 / n;
    let z2 = z * z;
    let denom = 1.0 + z2 / n;

    let center = (p + z2 / (2.0 * n)) / denom;
    let half = z * ((p * (1.0 - p) + z2 / (4.0 * n)) / n).sqrt() / denom;

    let low = (center - half).min(p).max(0.0);
    let high = (center + half).max(p).min(1.0);
    Some((low, high))
}
