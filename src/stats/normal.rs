//! Standard normal distribution helpers.

use statrs::distribution::{ContinuousCDF, Normal};

use crate::error::{Result, SurveyError};

fn standard_normal() -> Result<Normal> {
    Ok(Normal::new(0.0, 1.0)?)
}

/// Φ(x).
pub fn normal_cdf(x: f64) -> Result<f64> {
    Ok(standard_normal()?.cdf(x))
}

/// Two-sided p-value for a Wald z statistic.
pub fn two_sided_p(z: f64) -> Result<f64> {
    Ok(2.0 * standard_normal()?.sf(z.abs()))
}

/// Critical value z such that P(|Z| > z) = alpha.
pub fn z_for_alpha(alpha: f64) -> Result<f64> {
    if !(alpha > 0.0 && alpha < 1.0) {
        return Err(SurveyError::Config(format!(
            "alpha must be in (0, 1), got {alpha}"
        )));
    }
    Ok(standard_normal()?.inverse_cdf(1.0 - alpha / 2.0))
}
