//! Trend fitters over the detection table.
//!
//! Both fitters prepare inputs and delegate to the binomial GLM in
//! `stats::glm`:
//! - `binomial`: pooled yearly proportion, centered year, variance weights
//! - `transect`: per-transect detection rate, uncentered year, frequency weights

pub mod binomial;
pub mod transect;

pub use binomial::{binomial_proportion_trend, ProportionTrend, YearPrediction, YearlyProportion};
pub use transect::{
    transect_logistic_trend, transect_logistic_trend_with_fitted, MIN_TRANSECT_ROWS,
};

use std::collections::BTreeMap;

use crate::detection::DetectionRecord;

/// Pool one species' detections across transects, per year.
pub fn yearly_totals(records: &[DetectionRecord], species: &str) -> Vec<YearlyProportion> {
    let mut by_year: BTreeMap<i32, (u64, u64)> = BTreeMap::new();
    for r in records.iter().filter(|r| r.species == species) {
        let entry = by_year.entry(r.year).or_default();
        entry.0 += r.k_detects as u64;
        entry.1 += r.n_visits as u64;
    }
    by_year
        .into_iter()
        .map(|(year, (k, n))| YearlyProportion { year, k, n })
        .collect()
}
