//! Error types shared across cleaning, statistics and IO.

use thiserror::Error;

/// Which dimension of a raw sheet failed a fixed-offset requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Columns,
    Rows,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::Columns => write!(f, "columns"),
            Axis::Rows => write!(f, "rows"),
        }
    }
}

#[derive(Error, Debug)]
pub enum SurveyError {
    #[error("Shape error in sheet '{sheet}': expected at least {expected} {axis}, found {actual}")]
    Shape {
        sheet: &'static str,
        axis: Axis,
        expected: usize,
        actual: usize,
    },

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Model fit failed: {0}")]
    Fit(String),

    #[error("Config: {0}")]
    Config(String),

    #[error("Distribution error: {0}")]
    Distribution(#[from] statrs::StatsError),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SurveyError>;

impl SurveyError {
    /// Fail unless `actual >= expected` along `axis`.
    pub(crate) fn require(
        sheet: &'static str,
        axis: Axis,
        expected: usize,
        actual: usize,
    ) -> Result<()> {
        if actual < expected {
            return Err(SurveyError::Shape {
                sheet,
                axis,
                expected,
                actual,
            });
        }
        Ok(())
    }
}
