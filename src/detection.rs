//! Detection table: species × transect × year visit counts.
//!
//! A visit is a distinct (transect, year, visit key) triple in the clean
//! observation table. A species is detected on a visit when its count
//! column is positive on any row of that visit.
//!
//! Records are emitted for every year a transect was visited, for every
//! species detected at that transect in at least one year, so years with
//! zero detections are explicit.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cleaning::coercion::{coerce_count, text_values};
use crate::config::DetectionColumns;
use crate::error::{Result, SurveyError};
use crate::schema::detection as det;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
    pub species: String,
    pub transect: String,
    pub year: i32,
    pub k_detects: u32,
    pub n_visits: u32,
}

impl DetectionRecord {
    /// K/N, undefined when there were no visits.
    pub fn det_rate(&self) -> Option<f64> {
        (self.n_visits > 0).then(|| self.k_detects as f64 / self.n_visits as f64)
    }
}

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%d/%m/%y", "%d-%m-%Y"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Survey year from a year cell or a date cell.
pub fn parse_year(raw: &str) -> Option<i32> {
    let raw = raw.trim();
    if let Ok(year) = raw.parse::<i32>() {
        return (1900..=2100).contains(&year).then_some(year);
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(date.year());
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.year());
        }
    }
    // Any standalone 4-digit run ("mai 2021", "2021/22")
    raw.split(|c: char| !c.is_ascii_digit())
        .filter(|run| run.len() == 4)
        .filter_map(|run| run.parse::<i32>().ok())
        .find(|year| (1900..=2100).contains(year))
}

fn column_text(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let column = df
        .column(name)
        .map_err(|_| SurveyError::MissingColumn(name.to_string()))?;
    text_values(column)
}

type TransectYear = (String, i32);

/// Build the detection records from a clean observation table.
pub fn detection_records(
    observations: &DataFrame,
    columns: &DetectionColumns,
) -> Result<Vec<DetectionRecord>> {
    let species = column_text(observations, &columns.species)?;
    let transects = column_text(observations, &columns.transect)?;
    let years = column_text(observations, &columns.year)?;
    let visits = column_text(observations, &columns.visit)?;
    let counts = column_text(observations, &columns.count)?;

    let mut visits_by_transect_year: FxHashMap<TransectYear, FxHashSet<String>> =
        FxHashMap::default();
    let mut detected: FxHashMap<(String, String, i32), FxHashSet<String>> = FxHashMap::default();
    let mut species_at_transect: FxHashMap<String, FxHashSet<String>> = FxHashMap::default();
    let mut skipped = 0usize;

    for i in 0..observations.height() {
        let (Some(transect), Some(year), Some(visit)) = (
            transects[i].as_deref(),
            years[i].as_deref().and_then(parse_year),
            visits[i].as_deref(),
        ) else {
            skipped += 1;
            continue;
        };

        visits_by_transect_year
            .entry((transect.to_string(), year))
            .or_default()
            .insert(visit.to_string());

        let Some(sp) = species[i].as_deref() else {
            continue;
        };
        if coerce_count(counts[i].as_deref()) > 0 {
            detected
                .entry((sp.to_string(), transect.to_string(), year))
                .or_default()
                .insert(visit.to_string());
            species_at_transect
                .entry(transect.to_string())
                .or_default()
                .insert(sp.to_string());
        }
    }

    if skipped > 0 {
        debug!(skipped, "observation rows without transect, year or visit");
    }

    let mut records = Vec::new();
    for ((transect, year), visit_set) in &visits_by_transect_year {
        let Some(species_set) = species_at_transect.get(transect) else {
            continue;
        };
        for sp in species_set {
            let k = detected
                .get(&(sp.clone(), transect.clone(), *year))
                .map_or(0, |v| v.len());
            records.push(DetectionRecord {
                species: sp.clone(),
                transect: transect.clone(),
                year: *year,
                k_detects: k as u32,
                n_visits: visit_set.len() as u32,
            });
        }
    }

    records.sort_by(|a, b| {
        (&a.species, &a.transect, a.year).cmp(&(&b.species, &b.transect, b.year))
    });
    debug!(records = records.len(), "built detection table");
    Ok(records)
}

/// Detection records as a table with columns
/// `[species, transect, year, K_detects, N_visits, det_rate]`.
pub fn detections_to_frame(records: &[DetectionRecord]) -> Result<DataFrame> {
    let df = DataFrame::new(vec![
        Series::new(
            det::SPECIES.into(),
            records.iter().map(|r| r.species.as_str()).collect::<Vec<_>>(),
        )
        .into_column(),
        Series::new(
            det::TRANSECT.into(),
            records.iter().map(|r| r.transect.as_str()).collect::<Vec<_>>(),
        )
        .into_column(),
        Series::new(det::YEAR.into(), records.iter().map(|r| r.year).collect::<Vec<_>>())
            .into_column(),
        Series::new(
            det::K_DETECTS.into(),
            records.iter().map(|r| r.k_detects).collect::<Vec<_>>(),
        )
        .into_column(),
        Series::new(
            det::N_VISITS.into(),
            records.iter().map(|r| r.n_visits).collect::<Vec<_>>(),
        )
        .into_column(),
        Series::new(
            det::DET_RATE.into(),
            records.iter().map(DetectionRecord::det_rate).collect::<Vec<_>>(),
        )
        .into_column(),
    ])?;
    Ok(df)
}

/// Build the detection table from a clean observation table.
pub fn detection_table(observations: &DataFrame, columns: &DetectionColumns) -> Result<DataFrame> {
    detections_to_frame(&detection_records(observations, columns)?)
}
