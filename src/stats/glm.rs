//! Binomial GLM with logit link, fitted by iteratively reweighted least
//! squares.
//!
//! Response values are proportions in [0, 1]; weights carry the number of
//! trials behind each proportion. Inference is Wald-based with dispersion
//! fixed at 1.

use nalgebra::{Cholesky, DMatrix, DVector, Dyn};
use serde::Serialize;
use tracing::{debug, warn};

use super::normal::{two_sided_p, z_for_alpha};
use crate::error::{Result, SurveyError};

const MAX_ITER: usize = 100;
const DEVIANCE_TOL: f64 = 1e-8;
const MU_EPS: f64 = 1e-10;
/// Pivot floor, relative to the largest diagonal entry of XᵀWX.
const PIVOT_TOL: f64 = 1e-12;

/// How observation weights are interpreted.
///
/// Point estimates and standard errors are identical for the binomial
/// family; only the residual degrees of freedom differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GlmWeights {
    /// Each row is one observation whose variance scales with 1/weight.
    Variance,
    /// Each row stands for `weight` identical observations.
    Frequency,
}

#[derive(Debug, Clone, Serialize)]
pub struct BinomialFit {
    pub coefficients: Vec<f64>,
    pub std_errors: Vec<f64>,
    pub p_values: Vec<f64>,
    pub covariance: Vec<Vec<f64>>,
    pub deviance: f64,
    pub df_resid: f64,
    pub iterations: usize,
    pub converged: bool,
    pub n_obs: usize,
}

/// Fitted mean and confidence band for one design row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prediction {
    pub mean: f64,
    pub ci_low: f64,
    pub ci_high: f64,
}

fn expit(eta: f64) -> f64 {
    if eta >= 0.0 {
        1.0 / (1.0 + (-eta).exp())
    } else {
        let e = eta.exp();
        e / (1.0 + e)
    }
}

fn logit(mu: f64) -> f64 {
    (mu / (1.0 - mu)).ln()
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// y·ln(y/mu) with 0·ln(0) = 0
fn ylogy(y: f64, mu: f64) -> f64 {
    if y > 0.0 {
        y * (y / mu).ln()
    } else {
        0.0
    }
}

fn binomial_deviance(y: &DVector<f64>, mu: &DVector<f64>, w: &DVector<f64>) -> f64 {
    y.iter()
        .zip(mu.iter())
        .zip(w.iter())
        .map(|((&y, &m), &w)| 2.0 * w * (ylogy(y, m) + ylogy(1.0 - y, 1.0 - m)))
        .sum()
}

/// Rows of `x` scaled by `w`, so that `scaled(x, w)ᵀ · x = XᵀWX`.
fn scaled(x: &DMatrix<f64>, w: &DVector<f64>) -> DMatrix<f64> {
    DMatrix::from_fn(x.nrows(), x.ncols(), |i, j| x[(i, j)] * w[i])
}

/// Cholesky factor of XᵀWX, rejecting numerically singular matrices.
fn factor(xtwx: DMatrix<f64>) -> Result<Cholesky<f64, Dyn>> {
    let scale = xtwx.diagonal().amax().max(1.0);
    let chol = xtwx
        .cholesky()
        .ok_or_else(|| SurveyError::Fit("singular information matrix".into()))?;
    let l = chol.l_dirty();
    if (0..l.nrows()).any(|i| l[(i, i)] * l[(i, i)] <= PIVOT_TOL * scale) {
        return Err(SurveyError::Fit("singular information matrix".into()));
    }
    Ok(chol)
}

fn validate(design: &[Vec<f64>], response: &[f64], weights: &[f64]) -> Result<usize> {
    let n = design.len();
    if n == 0 {
        return Err(SurveyError::Fit("empty design matrix".into()));
    }
    if response.len() != n || weights.len() != n {
        return Err(SurveyError::Fit(format!(
            "length mismatch: {} design rows, {} responses, {} weights",
            n,
            response.len(),
            weights.len()
        )));
    }
    let p = design[0].len();
    if p == 0 || design.iter().any(|row| row.len() != p) {
        return Err(SurveyError::Fit("design rows must share a non-zero width".into()));
    }
    if design.iter().flatten().any(|v| !v.is_finite()) {
        return Err(SurveyError::Fit("non-finite value in design matrix".into()));
    }
    if response.iter().any(|&y| !(0.0..=1.0).contains(&y)) {
        return Err(SurveyError::Fit("binomial response must lie in [0, 1]".into()));
    }
    if weights.iter().any(|&w| !w.is_finite() || w < 0.0) {
        return Err(SurveyError::Fit("weights must be finite and non-negative".into()));
    }
    Ok(p)
}

/// Fit a binomial/logit GLM.
///
/// `design` is row-major (include a column of ones for an intercept),
/// `response` holds proportions and `weights` the trial counts.
pub fn fit_binomial_glm(
    design: &[Vec<f64>],
    response: &[f64],
    weights: &[f64],
    kind: GlmWeights,
) -> Result<BinomialFit> {
    let p = validate(design, response, weights)?;
    let n = design.len();

    let x = DMatrix::from_fn(n, p, |i, j| design[i][j]);
    let y = DVector::from_column_slice(response);
    let w = DVector::from_column_slice(weights);

    let mut mu = y.zip_map(&w, |y, w| (w * y + 0.5) / (w + 1.0));
    let mut eta = mu.map(logit);
    let mut deviance = binomial_deviance(&y, &mu, &w);
    let mut beta = DVector::<f64>::zeros(p);
    let mut converged = false;
    let mut iterations = 0;

    while iterations < MAX_ITER {
        iterations += 1;

        let variance = mu.map(|m| m * (1.0 - m));
        let working_w = w.component_mul(&variance);
        let working_z = DVector::from_fn(n, |i, _| eta[i] + (y[i] - mu[i]) / variance[i]);

        let xw = scaled(&x, &working_w);
        let chol = factor(xw.transpose() * &x)?;
        beta = chol.solve(&(xw.transpose() * &working_z));

        eta = &x * &beta;
        mu = eta.map(|e| expit(e).clamp(MU_EPS, 1.0 - MU_EPS));

        let new_deviance = binomial_deviance(&y, &mu, &w);
        if !new_deviance.is_finite() {
            return Err(SurveyError::Fit("deviance is not finite".into()));
        }
        let change = (new_deviance - deviance).abs() / (new_deviance.abs() + 0.1);
        deviance = new_deviance;
        if change < DEVIANCE_TOL {
            converged = true;
            break;
        }
    }

    if !converged {
        warn!(iterations, deviance, "binomial GLM did not converge");
    }

    let working_w = w.component_mul(&mu.map(|m| m * (1.0 - m)));
    let cov = factor(scaled(&x, &working_w).transpose() * &x)?.inverse();
    let covariance: Vec<Vec<f64>> = (0..p)
        .map(|i| (0..p).map(|j| cov[(i, j)]).collect())
        .collect();

    let coefficients: Vec<f64> = beta.iter().copied().collect();
    let std_errors: Vec<f64> = (0..p).map(|i| cov[(i, i)].max(0.0).sqrt()).collect();
    let p_values = coefficients
        .iter()
        .zip(&std_errors)
        .map(|(b, se)| two_sided_p(b / se))
        .collect::<Result<Vec<_>>>()?;

    let df_resid = match kind {
        GlmWeights::Variance => n as f64 - p as f64,
        GlmWeights::Frequency => w.sum() - p as f64,
    };

    debug!(iterations, converged, deviance, "binomial GLM fitted");

    Ok(BinomialFit {
        coefficients,
        std_errors,
        p_values,
        covariance,
        deviance,
        df_resid,
        iterations,
        converged,
        n_obs: n,
    })
}

impl BinomialFit {
    /// Mean response and (1 − alpha) band for one design row.
    ///
    /// The band is built on the logit scale and mapped back, so it stays in
    /// (0, 1).
    pub fn predict(&self, row: &[f64], alpha: f64) -> Result<Prediction> {
        if row.len() != self.coefficients.len() {
            return Err(SurveyError::Fit(format!(
                "prediction row has {} columns, model has {}",
                row.len(),
                self.coefficients.len()
            )));
        }
        let eta = dot(row, &self.coefficients);
        let var: f64 = self
            .covariance
            .iter()
            .zip(row)
            .map(|(cov_row, &xi)| xi * dot(cov_row, row))
            .sum();
        let se = var.max(0.0).sqrt();
        let z = z_for_alpha(alpha)?;

        Ok(Prediction {
            mean: expit(eta),
            ci_low: expit(eta - z * se),
            ci_high: expit(eta + z * se),
        })
    }

    pub fn predict_all(&self, design: &[Vec<f64>], alpha: f64) -> Result<Vec<Prediction>> {
        design.iter().map(|row| self.predict(row, alpha)).collect()
    }
}
