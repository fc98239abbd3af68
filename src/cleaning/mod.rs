//! Sheet normalizers: raw positional sheet → clean table.
//!
//! - `species`: ESPECES, recovers the data row read as header
//! - `gps`: GPS-MILIEU, drops filler columns and the label row
//! - `observations`: NOM FRANÇAIS, renames the count block and coerces counts
//! - `coercion`: numeric/text coercion shared by the three

pub mod coercion;
pub mod gps;
pub mod observations;
pub mod species;

pub use gps::clean_gps;
pub use observations::clean_observations;
pub use species::clean_species;

use polars::prelude::*;

use crate::error::{Result, SurveyError};
use crate::schema::sheets;

/// Dispatch a raw sheet to its normalizer by workbook sheet name.
pub fn normalize_sheet(sheet: &str, raw: &DataFrame) -> Result<DataFrame> {
    match sheet {
        sheets::SPECIES => clean_species(raw),
        sheets::GPS => clean_gps(raw),
        sheets::OBSERVATIONS => clean_observations(raw),
        other => Err(SurveyError::Config(format!("Unknown sheet: {other}"))),
    }
}
