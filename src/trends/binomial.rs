//! Binomial-proportion trend across years.
//!
//! The year is centered on its mean before fitting, so the intercept is the
//! logit of the proportion at the mean year and the slope is per year.

use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::stats::glm::{fit_binomial_glm, BinomialFit, GlmWeights};
use crate::stats::wilson::wilson_interval;

/// k detections out of n visits in one year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearlyProportion {
    pub year: i32,
    pub k: u64,
    pub n: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct YearPrediction {
    pub year: i32,
    pub k: u64,
    pub n: u64,
    pub proportion: f64,
    pub wilson_low: Option<f64>,
    pub wilson_high: Option<f64>,
    pub fitted: f64,
    pub ci_low: f64,
    pub ci_high: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProportionTrend {
    /// Change in log-odds per year.
    pub slope: f64,
    pub p_value: f64,
    pub mean_year: f64,
    pub predictions: Vec<YearPrediction>,
    #[serde(skip)]
    pub fit: BinomialFit,
}

/// Fit a binomial trend of k/n on centered year, with n as variance weights.
///
/// Years with n = 0 carry no information and are dropped. Returns `Ok(None)`
/// when fewer than two distinct years remain.
pub fn binomial_proportion_trend(
    points: &[YearlyProportion],
    alpha: f64,
) -> Result<Option<ProportionTrend>> {
    let used: Vec<&YearlyProportion> = points.iter().filter(|p| p.n > 0).collect();

    let mut years: Vec<i32> = used.iter().map(|p| p.year).collect();
    years.sort_unstable();
    years.dedup();
    if years.len() < 2 {
        debug!(years = years.len(), "not enough years for a proportion trend");
        return Ok(None);
    }

    let mean_year = used.iter().map(|p| p.year as f64).sum::<f64>() / used.len() as f64;
    let design: Vec<Vec<f64>> = used
        .iter()
        .map(|p| vec![1.0, p.year as f64 - mean_year])
        .collect();
    let response: Vec<f64> = used.iter().map(|p| p.k as f64 / p.n as f64).collect();
    let weights: Vec<f64> = used.iter().map(|p| p.n as f64).collect();

    let fit = fit_binomial_glm(&design, &response, &weights, GlmWeights::Variance)?;

    let predictions = used
        .iter()
        .zip(&design)
        .zip(&response)
        .map(|((p, row), &proportion)| {
            let band = fit.predict(row, alpha)?;
            let wilson = wilson_interval(p.k, p.n, alpha);
            Ok(YearPrediction {
                year: p.year,
                k: p.k,
                n: p.n,
                proportion,
                wilson_low: wilson.map(|w| w.0),
                wilson_high: wilson.map(|w| w.1),
                fitted: band.mean,
                ci_low: band.ci_low,
                ci_high: band.ci_high,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Some(ProportionTrend {
        slope: fit.coefficients[1],
        p_value: fit.p_values[1],
        mean_year,
        predictions,
        fit,
    }))
}
