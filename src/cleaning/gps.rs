//! GPS-MILIEU sheet normalizer.

use polars::prelude::*;
use tracing::debug;

use super::coercion::{float_column, text_column};
use crate::error::{Axis, Result, SurveyError};
use crate::schema::{gps, sheets};

/// Normalize the raw GPS-MILIEU sheet into the six transect-point columns.
///
/// Drops the two filler columns and the label row above the data, so an input
/// of R rows yields R − 1 rows. Coordinates are coerced to `Float64`.
pub fn clean_gps(raw: &DataFrame) -> Result<DataFrame> {
    let needed = gps::FILLER_COLUMNS + gps::ALL.len();
    SurveyError::require(sheets::GPS, Axis::Columns, needed, raw.width())?;
    SurveyError::require(sheets::GPS, Axis::Rows, gps::FILLER_ROWS, raw.height())?;

    let height = raw.height() - gps::FILLER_ROWS;
    let kept = &raw.get_columns()[gps::FILLER_COLUMNS..needed];

    let columns = kept
        .iter()
        .zip(gps::ALL)
        .map(|(column, name)| {
            let data = column.slice(gps::FILLER_ROWS as i64, height);
            match name {
                gps::COORDINATE_X | gps::COORDINATE_Y => float_column(&data, name),
                _ => text_column(&data, name),
            }
        })
        .collect::<Result<Vec<_>>>()?;

    let df = DataFrame::new(columns)?;
    debug!(rows_in = raw.height(), rows_out = df.height(), "cleaned gps sheet");
    Ok(df)
}
