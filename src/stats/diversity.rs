//! Shannon and Simpson diversity from abundance counts.

use serde::Serialize;

/// Guards ln(0) for zero-count categories, which stay in the sum.
pub const SHANNON_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DiversityIndices {
    pub shannon: f64,
    pub simpson: f64,
    pub richness: usize,
}

/// Per-category proportions. An all-zero (or empty) vector yields all zeros.
fn proportions(counts: &[f64]) -> impl Iterator<Item = f64> + '_ {
    let total: f64 = counts.iter().sum();
    counts
        .iter()
        .map(move |&c| if total > 0.0 { c / total } else { 0.0 })
}

/// H = −Σ p·ln(p + ε)
pub fn shannon(counts: &[f64]) -> f64 {
    -proportions(counts)
        .map(|p| p * (p + SHANNON_EPSILON).ln())
        .sum::<f64>()
}

/// 1 − Σp². An all-zero vector gives 1.0.
pub fn simpson(counts: &[f64]) -> f64 {
    1.0 - proportions(counts).map(|p| p * p).sum::<f64>()
}

/// Number of categories with a positive count.
pub fn richness(counts: &[f64]) -> usize {
    counts.iter().filter(|&&c| c > 0.0).count()
}

pub fn diversity_indices(counts: &[f64]) -> DiversityIndices {
    DiversityIndices {
        shannon: shannon(counts),
        simpson: simpson(counts),
        richness: richness(counts),
    }
}
