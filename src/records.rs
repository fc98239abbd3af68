//! Typed row views over the clean tables.
//!
//! The pipeline works on `DataFrame`s; these structs are for callers that want
//! one value per row (and serde output).

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SurveyError};
use crate::schema::{gps, observations as obs, species};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesRecord {
    pub name: String,
    pub latin_name: String,
    pub nature: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransectPoint {
    pub transect_name: String,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub habitat_type: String,
    pub transect_id: String,
    pub point_id: String,
}

/// Integer count block of one observation row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountFields {
    pub al25: i64,
    pub vl25: i64,
    pub al50: i64,
    pub vl50: i64,
    pub al100: i64,
    pub vl100: i64,
    pub ag100: i64,
    pub vg100: i64,
    pub vol: i64,
    pub tot_a: i64,
    pub tot_v_sv: i64,
    pub tot_av_sv: i64,
    pub tot_av_v: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationRecord {
    /// The 12 visit-metadata cells, in sheet order.
    pub metadata: Vec<Option<String>>,
    pub counts: CountFields,
    pub companied: String,
}

fn str_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a StringChunked> {
    df.column(name)
        .map_err(|_| SurveyError::MissingColumn(name.to_string()))?
        .str()
        .map_err(SurveyError::from)
}

fn i64_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Int64Chunked> {
    df.column(name)
        .map_err(|_| SurveyError::MissingColumn(name.to_string()))?
        .i64()
        .map_err(SurveyError::from)
}

pub fn species_records(df: &DataFrame) -> Result<Vec<SpeciesRecord>> {
    let names = str_column(df, species::ESPECIES_NAME)?;
    let latin = str_column(df, species::LATIN_NAME)?;
    let nature = str_column(df, species::NATURE)?;

    Ok((0..df.height())
        .map(|i| SpeciesRecord {
            name: names.get(i).unwrap_or_default().to_string(),
            latin_name: latin.get(i).unwrap_or_default().to_string(),
            nature: nature.get(i).unwrap_or_default().to_string(),
        })
        .collect())
}

pub fn transect_points(df: &DataFrame) -> Result<Vec<TransectPoint>> {
    let names = str_column(df, gps::TRANSECT_NAME)?;
    let x = df.column(gps::COORDINATE_X)?.f64()?;
    let y = df.column(gps::COORDINATE_Y)?.f64()?;
    let habitat = str_column(df, gps::HABITAT_TYPE)?;
    let transect_id = str_column(df, gps::TRANSECT_ID)?;
    let point_id = str_column(df, gps::POINT_ID)?;

    Ok((0..df.height())
        .map(|i| TransectPoint {
            transect_name: names.get(i).unwrap_or_default().to_string(),
            x: x.get(i),
            y: y.get(i),
            habitat_type: habitat.get(i).unwrap_or_default().to_string(),
            transect_id: transect_id.get(i).unwrap_or_default().to_string(),
            point_id: point_id.get(i).unwrap_or_default().to_string(),
        })
        .collect())
}

pub fn observation_records(df: &DataFrame) -> Result<Vec<ObservationRecord>> {
    let metadata_text = df
        .get_columns()
        .iter()
        .take(obs::METADATA_COLUMNS)
        .map(|c| c.cast(&DataType::String))
        .collect::<PolarsResult<Vec<_>>>()?;
    let metadata = metadata_text
        .iter()
        .map(|c| c.str().map_err(SurveyError::from))
        .collect::<Result<Vec<_>>>()?;

    let counts = obs::INTEGER_FIELDS
        .iter()
        .map(|name| i64_column(df, name))
        .collect::<Result<Vec<_>>>()?;
    let companied = str_column(df, obs::COMPANIED)?;

    Ok((0..df.height())
        .map(|i| {
            let c = |field: usize| counts[field].get(i).unwrap_or(0);
            ObservationRecord {
                metadata: metadata.iter().map(|m| m.get(i).map(str::to_string)).collect(),
                counts: CountFields {
                    al25: c(0),
                    vl25: c(1),
                    al50: c(2),
                    vl50: c(3),
                    al100: c(4),
                    vl100: c(5),
                    ag100: c(6),
                    vg100: c(7),
                    vol: c(8),
                    tot_a: c(9),
                    tot_v_sv: c(10),
                    tot_av_sv: c(11),
                    tot_av_v: c(12),
                },
                companied: companied.get(i).unwrap_or_default().to_string(),
            }
        })
        .collect())
}
