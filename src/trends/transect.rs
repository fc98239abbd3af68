//! Per-transect logistic trend of detection rate on year.
//!
//! Rows are detection-table rows for one species at one transect. Only rows
//! with visits and a defined rate qualify; fewer than
//! [`MIN_TRANSECT_ROWS`] qualifying rows means insufficient data, reported as
//! `Ok(None)` for the caller to handle.

use polars::prelude::*;
use tracing::debug;

use crate::error::{Result, SurveyError};
use crate::schema::{detection as det, trend};
use crate::stats::glm::{fit_binomial_glm, BinomialFit, GlmWeights};

pub const MIN_TRANSECT_ROWS: usize = 3;

struct Qualifying {
    mask: BooleanChunked,
    design: Vec<Vec<f64>>,
    response: Vec<f64>,
    weights: Vec<f64>,
}

fn f64_values(rows: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = rows
        .column(name)
        .map_err(|_| SurveyError::MissingColumn(name.to_string()))?
        .cast(&DataType::Float64)?;
    Ok(column.f64()?.into_iter().collect())
}

fn qualifying_rows(rows: &DataFrame) -> Result<Qualifying> {
    let years = f64_values(rows, det::YEAR)?;
    let visits = f64_values(rows, det::N_VISITS)?;
    let rates = f64_values(rows, det::DET_RATE)?;

    let mut design = Vec::new();
    let mut response = Vec::new();
    let mut weights = Vec::new();
    let mut mask = Vec::with_capacity(rows.height());

    for i in 0..rows.height() {
        match (years[i], visits[i], rates[i]) {
            (Some(year), Some(n), Some(rate)) if n > 0.0 && rate.is_finite() => {
                design.push(vec![1.0, year]);
                response.push(rate);
                weights.push(n);
                mask.push(true);
            }
            _ => mask.push(false),
        }
    }

    Ok(Qualifying {
        mask: BooleanChunked::from_slice("qualifying".into(), &mask),
        design,
        response,
        weights,
    })
}

fn fit_qualifying(q: &Qualifying) -> Result<Option<BinomialFit>> {
    if q.design.len() < MIN_TRANSECT_ROWS {
        debug!(rows = q.design.len(), "insufficient rows for transect trend");
        return Ok(None);
    }
    fit_binomial_glm(&q.design, &q.response, &q.weights, GlmWeights::Frequency).map(Some)
}

/// Logistic trend of `det_rate` on uncentered year with visit counts as
/// frequency weights. Coefficients are `[intercept, year]`.
pub fn transect_logistic_trend(rows: &DataFrame) -> Result<Option<BinomialFit>> {
    fit_qualifying(&qualifying_rows(rows)?)
}

/// Same fit as [`transect_logistic_trend`], plus the qualifying rows with
/// `fitted`, `ci_low` and `ci_high` columns appended.
pub fn transect_logistic_trend_with_fitted(
    rows: &DataFrame,
    alpha: f64,
) -> Result<Option<(BinomialFit, DataFrame)>> {
    let q = qualifying_rows(rows)?;
    let Some(fit) = fit_qualifying(&q)? else {
        return Ok(None);
    };

    let predictions = fit.predict_all(&q.design, alpha)?;
    let mut fitted = rows.filter(&q.mask)?;
    fitted.with_column(Series::new(
        trend::FITTED.into(),
        predictions.iter().map(|p| p.mean).collect::<Vec<_>>(),
    ))?;
    fitted.with_column(Series::new(
        trend::CI_LOW.into(),
        predictions.iter().map(|p| p.ci_low).collect::<Vec<_>>(),
    ))?;
    fitted.with_column(Series::new(
        trend::CI_HIGH.into(),
        predictions.iter().map(|p| p.ci_high).collect::<Vec<_>>(),
    ))?;

    Ok(Some((fit, fitted)))
}
