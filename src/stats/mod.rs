//! Statistical estimators over clean survey tables.
//!
//! - `wilson`: binomial proportion interval
//! - `bootstrap`: reflected bootstrap CI and the diversity bootstrap
//! - `diversity`: Shannon, Simpson, richness
//! - `glm`: binomial/logit GLM fitted by IRLS
//! - `normal`: normal CDF/quantile used by the above

pub mod bootstrap;
pub mod diversity;
pub mod glm;
pub mod normal;
pub mod wilson;

pub use bootstrap::{bootstrap_ci, bootstrap_diversity, BootstrapConfig, DiversityBootstrap};
pub use diversity::{diversity_indices, richness, shannon, simpson, DiversityIndices};
pub use glm::{fit_binomial_glm, BinomialFit, GlmWeights, Prediction};
pub use wilson::{wilson_interval, wilson_interval_z};

use serde::Serialize;

/// Point estimate with interval bounds; `low ≤ estimate ≤ high`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConfidenceInterval {
    pub estimate: f64,
    pub low: f64,
    pub high: f64,
}

impl ConfidenceInterval {
    /// Widen the bounds so they contain the estimate.
    pub fn clamped(estimate: f64, low: f64, high: f64) -> Self {
        Self {
            estimate,
            low: low.min(estimate),
            high: high.max(estimate),
        }
    }
}
