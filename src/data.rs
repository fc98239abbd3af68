//! Loading and saving the three survey tables.
//!
//! Each workbook sheet is exported to its own CSV (see `schema::sheets`).
//! Raw sheets are read entirely as text so that the normalizers, not the CSV
//! reader, decide how cells are coerced.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use polars::prelude::*;
use tracing::info;

use crate::cleaning::{clean_gps, clean_observations, clean_species};
use crate::error::{Result, SurveyError};
use crate::schema::sheets;

/// The three survey tables, raw or clean.
#[derive(Debug, Clone)]
pub struct SurveySheets {
    /// ESPECES
    pub species: DataFrame,
    /// GPS-MILIEU
    pub gps: DataFrame,
    /// NOM FRANÇAIS
    pub observations: DataFrame,
}

impl SurveySheets {
    /// Load the raw per-sheet CSV exports from `dir`.
    pub fn load_raw(dir: &Path) -> Result<Self> {
        info!(dir = %dir.display(), "loading raw survey sheets");
        let mut frames = BTreeMap::new();
        for (sheet, filename) in sheets::RAW_FILES {
            let df = read_raw_sheet(&dir.join(filename))?;
            info!(sheet, rows = df.height(), columns = df.width(), "loaded raw sheet");
            frames.insert(sheet, df);
        }
        Self::from_map(frames)
    }

    /// Load previously written clean tables from `dir`.
    pub fn load_clean(dir: &Path) -> Result<Self> {
        let mut frames = BTreeMap::new();
        for (sheet, filename) in sheets::CLEAN_FILES {
            frames.insert(sheet, read_csv(&dir.join(filename), None)?);
        }
        Self::from_map(frames)
    }

    fn from_map(mut frames: BTreeMap<&'static str, DataFrame>) -> Result<Self> {
        let mut take = |sheet: &str| {
            frames
                .remove(sheet)
                .ok_or_else(|| SurveyError::Config(format!("sheet '{sheet}' not loaded")))
        };
        Ok(Self {
            species: take(sheets::SPECIES)?,
            gps: take(sheets::GPS)?,
            observations: take(sheets::OBSERVATIONS)?,
        })
    }

    /// Run every sheet through its normalizer.
    pub fn normalize(&self) -> Result<Self> {
        let clean = Self {
            species: clean_species(&self.species)?,
            gps: clean_gps(&self.gps)?,
            observations: clean_observations(&self.observations)?,
        };
        info!(
            species = clean.species.height(),
            points = clean.gps.height(),
            observations = clean.observations.height(),
            "normalized survey sheets"
        );
        Ok(clean)
    }

    fn frames_mut(&mut self) -> [(&'static str, &mut DataFrame); 3] {
        [
            (sheets::SPECIES, &mut self.species),
            (sheets::GPS, &mut self.gps),
            (sheets::OBSERVATIONS, &mut self.observations),
        ]
    }

    /// Write the tables as CSV using `files` (sheet → filename); returns the
    /// written path per filename stem. Creates `dir` if needed.
    pub fn save(
        &mut self,
        dir: &Path,
        files: &[(&str, &str); 3],
    ) -> Result<BTreeMap<String, PathBuf>> {
        fs::create_dir_all(dir)?;
        let mut written = BTreeMap::new();
        for (sheet, df) in self.frames_mut() {
            let Some((_, filename)) = files.iter().find(|(s, _)| *s == sheet) else {
                continue;
            };
            let path = dir.join(filename);
            write_csv(df, &path)?;
            written.insert(stem(&path), path);
        }
        Ok(written)
    }

    /// Write the tables with the `_clean` filenames.
    pub fn save_clean(&mut self, dir: &Path) -> Result<BTreeMap<String, PathBuf>> {
        self.save(dir, &sheets::CLEAN_FILES)
    }

    /// Parquet copies of the clean tables, next to the CSVs.
    pub fn save_clean_parquet(&mut self, dir: &Path) -> Result<BTreeMap<String, PathBuf>> {
        fs::create_dir_all(dir)?;
        let mut written = BTreeMap::new();
        for (sheet, df) in self.frames_mut() {
            let Some((_, filename)) = sheets::CLEAN_FILES.iter().find(|(s, _)| *s == sheet) else {
                continue;
            };
            let path = dir.join(filename).with_extension("parquet");
            write_parquet(df, &path)?;
            written.insert(format!("{}_parquet", stem(&path)), path);
        }
        Ok(written)
    }
}

fn stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn read_csv(path: &Path, infer_schema_length: Option<usize>) -> Result<DataFrame> {
    if !path.exists() {
        return Err(SurveyError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("CSV not found: {}", path.display()),
        )));
    }
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(infer_schema_length)
        .try_into_reader_with_file_path(Some(path.into()))?
        .finish()?;
    Ok(df)
}

/// Read one raw sheet export with every column as `String`.
pub fn read_raw_sheet(path: &Path) -> Result<DataFrame> {
    read_csv(path, Some(0))
}

pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).include_header(true).finish(df)?;
    Ok(())
}

pub fn write_parquet(df: &mut DataFrame, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    ParquetWriter::new(file).finish(df)?;
    Ok(())
}
