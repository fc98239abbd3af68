//! NOM FRANÇAIS (observation) sheet normalizer.
//!
//! Columns 0..12 are visit metadata and pass through untouched except for the
//! passage column rename. Columns 12..26 are the count block and are renamed
//! positionally, whatever their header says.

use polars::prelude::*;
use tracing::debug;

use super::coercion::{count_column, filled_text_column};
use crate::error::{Axis, Result, SurveyError};
use crate::schema::{observations as obs, sheets};

pub fn clean_observations(raw: &DataFrame) -> Result<DataFrame> {
    SurveyError::require(sheets::OBSERVATIONS, Axis::Columns, obs::COUNT_END, raw.width())?;
    SurveyError::require(sheets::OBSERVATIONS, Axis::Rows, obs::FILLER_ROWS, raw.height())?;

    let height = raw.height() - obs::FILLER_ROWS;

    let columns = raw
        .get_columns()
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            let data = column.slice(obs::FILLER_ROWS as i64, height);

            if (obs::COUNT_START..obs::COUNT_END).contains(&idx) {
                let name = obs::COUNT_FIELDS[idx - obs::COUNT_START];
                return if name == obs::COMPANIED {
                    filled_text_column(&data, name)
                } else {
                    count_column(&data, name)
                };
            }

            if data.name().as_str() == obs::PASSAGE_RAW {
                return Ok(data.with_name(obs::PASSAGE.into()));
            }
            Ok(data)
        })
        .collect::<Result<Vec<_>>>()?;

    let df = DataFrame::new(columns)?;
    debug!(rows_in = raw.height(), rows_out = df.height(), "cleaned observation sheet");
    Ok(df)
}
