//! ESPECES sheet normalizer.
//!
//! The sheet starts with two empty filler columns, and its first data row was
//! consumed as the header when the workbook was read. The header is pushed
//! back in as the first record.

use polars::prelude::*;
use tracing::debug;

use super::coercion::{is_placeholder_header, text_values};
use crate::error::{Axis, Result, SurveyError};
use crate::schema::{sheets, species};

/// Normalize the raw ESPECES sheet into `[ESPECIES_NAME, LATIN_NAME, NATURE]`.
pub fn clean_species(raw: &DataFrame) -> Result<DataFrame> {
    let needed = species::FILLER_COLUMNS + species::ALL.len();
    SurveyError::require(sheets::SPECIES, Axis::Columns, needed, raw.width())?;

    let kept = &raw.get_columns()[species::FILLER_COLUMNS..needed];
    let columns = kept
        .iter()
        .zip(species::ALL)
        .map(|(column, name)| {
            let header = column.name().as_str();
            let recovered = (!is_placeholder_header(header)).then(|| header.trim().to_string());

            let mut values = Vec::with_capacity(column.len() + 1);
            values.push(recovered);
            values.extend(text_values(column)?);

            if name == species::NATURE {
                let filled: Vec<String> = values.into_iter().map(Option::unwrap_or_default).collect();
                Ok(Series::new(name.into(), filled).into_column())
            } else {
                Ok(Series::new(name.into(), values).into_column())
            }
        })
        .collect::<Result<Vec<_>>>()?;

    let df = DataFrame::new(columns)?;
    debug!(rows_in = raw.height(), rows_out = df.height(), "cleaned species sheet");
    Ok(df)
}
