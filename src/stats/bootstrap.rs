//! Bootstrap confidence intervals.
//!
//! Two conventions live here:
//! - [`bootstrap_ci`]: reflected (basic/pivotal) interval around the
//!   statistic of the original sample.
//! - [`bootstrap_diversity`]: bootstrap mean with the plain 2.5 % / 97.5 %
//!   percentile interval, for Shannon, Simpson and richness together.
//!
//! Resamples run on the rayon pool. Resample `b` draws from its own RNG
//! seeded from `(seed, b)`, so a seeded run is reproducible regardless of
//! thread scheduling.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;

use super::diversity::{richness, shannon, simpson};
use super::ConfidenceInterval;

pub const DEFAULT_RESAMPLES: usize = 1000;

/// Settings for the generic reflected bootstrap.
#[derive(Debug, Clone, Copy)]
pub struct BootstrapConfig {
    pub resamples: usize,
    pub alpha: f64,
    /// `None` draws a fresh seed from the thread RNG.
    pub seed: Option<u64>,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            resamples: DEFAULT_RESAMPLES,
            alpha: 0.05,
            seed: None,
        }
    }
}

/// SplitMix64 finalizer, spreads (seed, index) over the seed space.
fn resample_seed(seed: u64, index: u64) -> u64 {
    let mut z = seed.wrapping_add(index.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Draw `resamples` same-size resamples with replacement and evaluate
/// `statistic` on each.
fn resample_statistics<T, F>(data: &[f64], resamples: usize, seed: u64, statistic: F) -> Vec<T>
where
    T: Send,
    F: Fn(&[f64]) -> T + Sync,
{
    let n = data.len();
    (0..resamples as u64)
        .into_par_iter()
        .map_init(
            || Vec::with_capacity(n),
            |buf, b| {
                let mut rng = StdRng::seed_from_u64(resample_seed(seed, b));
                buf.clear();
                buf.extend((0..n).map(|_| data[rng.gen_range(0..n)]));
                statistic(buf.as_slice())
            },
        )
        .collect()
}

/// Linear-interpolation quantile (numpy's default) of a sorted slice.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let h = (sorted.len() - 1) as f64 * q.clamp(0.0, 1.0);
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    Some(sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo]))
}

fn sorted(mut values: Vec<f64>) -> Vec<f64> {
    values.sort_by(f64::total_cmp);
    values
}

/// Reflected bootstrap interval for `statistic`.
///
/// `ci_low = 2·est − q(1 − α/2)`, `ci_high = 2·est − q(α/2)`. Returns `None`
/// for empty input or zero resamples.
pub fn bootstrap_ci<F>(
    data: &[f64],
    statistic: F,
    config: &BootstrapConfig,
) -> Option<ConfidenceInterval>
where
    F: Fn(&[f64]) -> f64 + Sync,
{
    if data.is_empty() || config.resamples == 0 {
        return None;
    }

    let estimate = statistic(data);
    let seed = config.seed.unwrap_or_else(|| rand::thread_rng().gen());
    let distribution = sorted(resample_statistics(data, config.resamples, seed, &statistic));

    let q_low = quantile_sorted(&distribution, config.alpha / 2.0)?;
    let q_high = quantile_sorted(&distribution, 1.0 - config.alpha / 2.0)?;

    Some(ConfidenceInterval::clamped(
        estimate,
        2.0 * estimate - q_high,
        2.0 * estimate - q_low,
    ))
}

pub fn mean(data: &[f64]) -> f64 {
    data.iter().sum::<f64>() / data.len() as f64
}

/// Bootstrap summaries of the three diversity statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DiversityBootstrap {
    pub shannon: ConfidenceInterval,
    pub simpson: ConfidenceInterval,
    pub richness: ConfidenceInterval,
}

/// Bootstrap mean and 2.5 % / 97.5 % percentile interval of Shannon, Simpson
/// and richness over resamples of an abundance vector.
///
/// Unlike [`bootstrap_ci`] the interval is not reflected. Always seeded.
pub fn bootstrap_diversity(
    counts: &[f64],
    resamples: usize,
    seed: u64,
) -> Option<DiversityBootstrap> {
    if counts.is_empty() || resamples == 0 {
        return None;
    }

    let draws = resample_statistics(counts, resamples, seed, |sample| {
        [shannon(sample), simpson(sample), richness(sample) as f64]
    });

    let summarize = |idx: usize| -> Option<ConfidenceInterval> {
        let values: Vec<f64> = draws.iter().map(|d| d[idx]).collect();
        let centre = mean(&values);
        let values = sorted(values);
        Some(ConfidenceInterval::clamped(
            centre,
            quantile_sorted(&values, 0.025)?,
            quantile_sorted(&values, 0.975)?,
        ))
    };

    Some(DiversityBootstrap {
        shannon: summarize(0)?,
        simpson: summarize(1)?,
        richness: summarize(2)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn seeded(resamples: usize) -> BootstrapConfig {
        BootstrapConfig {
            resamples,
            alpha: 0.05,
            seed: Some(7),
        }
    }

    #[test]
    fn test_quantile_matches_linear_interpolation() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert_relative_eq!(quantile_sorted(&v, 0.0).unwrap(), 1.0);
        assert_relative_eq!(quantile_sorted(&v, 0.5).unwrap(), 2.5);
        assert_relative_eq!(quantile_sorted(&v, 0.25).unwrap(), 1.75);
        assert_relative_eq!(quantile_sorted(&v, 1.0).unwrap(), 4.0);
        assert_eq!(quantile_sorted(&[], 0.5), None);
    }

    #[test]
    fn test_empty_input_undefined() {
        assert!(bootstrap_ci(&[], mean, &seeded(100)).is_none());
        assert!(bootstrap_diversity(&[], 100, 1).is_none());
    }

    #[test]
    fn test_constant_input_collapses() {
        let data = [2.5; 12];
        let ci = bootstrap_ci(&data, mean, &seeded(200)).unwrap();
        assert_eq!(ci.estimate, 2.5);
        assert_eq!(ci.low, 2.5);
        assert_eq!(ci.high, 2.5);
    }

    #[test]
    fn test_seeded_runs_reproducible() {
        let data: Vec<f64> = (0..40).map(|i| ((i * 37) % 11) as f64).collect();
        let a = bootstrap_ci(&data, mean, &seeded(300)).unwrap();
        let b = bootstrap_ci(&data, mean, &seeded(300)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_interval_brackets_mean() {
        let data: Vec<f64> = (0..50).map(|i| (i % 10) as f64).collect();
        let ci = bootstrap_ci(&data, mean, &seeded(500)).unwrap();
        assert_relative_eq!(ci.estimate, 4.5);
        assert!(ci.low < ci.estimate && ci.estimate < ci.high);
        // sd ≈ 2.87, se ≈ 0.41, 95% half-width ≈ 0.8
        assert!(ci.high - ci.low > 0.5 && ci.high - ci.low < 2.5);
    }

    #[test]
    fn test_reflection_differs_from_percentile_on_skewed_statistic() {
        // max() has a one-sided bootstrap distribution: every resample max is
        // ≤ the sample max, so the reflected interval sits at or above it.
        let data = [1.0, 2.0, 3.0, 4.0, 10.0];
        let max = |s: &[f64]| s.iter().copied().fold(f64::MIN, f64::max);
        let ci = bootstrap_ci(&data, max, &seeded(400)).unwrap();
        assert_eq!(ci.estimate, 10.0);
        assert!(ci.high > 10.0);
        assert_eq!(ci.low, 10.0);
    }

    #[test]
    fn test_diversity_bootstrap() {
        let counts = [10.0, 8.0, 3.0, 1.0, 0.0, 6.0];
        let boot = bootstrap_diversity(&counts, 500, 42).unwrap();

        for ci in [boot.shannon, boot.simpson, boot.richness] {
            assert!(ci.low <= ci.estimate && ci.estimate <= ci.high);
        }
        assert!(boot.richness.high <= 6.0);
        assert!(boot.simpson.high < 1.0);

        let again = bootstrap_diversity(&counts, 500, 42).unwrap();
        assert_eq!(boot, again);
    }

    #[test]
    fn test_diversity_bootstrap_constant_counts() {
        let boot = bootstrap_diversity(&[4.0, 4.0, 4.0], 100, 3).unwrap();
        assert_relative_eq!(boot.simpson.estimate, 2.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(boot.simpson.low, boot.simpson.high, epsilon = 1e-12);
        assert_eq!(boot.richness.estimate, 3.0);
    }
}
