//! End-to-end batch run: raw sheets → clean tables → analysis tables.

use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::info;

use crate::config::PipelineConfig;
use crate::data::{write_csv, SurveySheets};
use crate::detection::{detection_records, detections_to_frame};
use crate::error::Result;
use crate::summaries::{diversity_by_transect, species_trends, transect_trends};

pub const DETECTIONS_FILE: &str = "detections.csv";
pub const DIVERSITY_FILE: &str = "diversity_by_transect.csv";
pub const SPECIES_TRENDS_FILE: &str = "species_trends.csv";
pub const SPECIES_YEARLY_FILE: &str = "species_yearly.csv";
pub const TRANSECT_TRENDS_FILE: &str = "transect_trends.csv";

/// What a pipeline run produced.
#[derive(Debug, Default)]
pub struct PipelineReport {
    /// Logical name (file stem) → written path.
    pub written: BTreeMap<String, PathBuf>,
    pub species: usize,
    pub points: usize,
    pub observations: usize,
    pub detection_records: usize,
}

pub fn run_pipeline(config: &PipelineConfig) -> Result<PipelineReport> {
    config.validate()?;
    let out = &config.output_dir;

    let raw = SurveySheets::load_raw(&config.input_dir)?;
    let mut clean = raw.normalize()?;
    config.detection.check(&clean.observations)?;

    let mut report = PipelineReport {
        species: clean.species.height(),
        points: clean.gps.height(),
        observations: clean.observations.height(),
        ..Default::default()
    };
    report.written.extend(clean.save_clean(out)?);
    if config.write_parquet {
        report.written.extend(clean.save_clean_parquet(out)?);
    }

    let records = detection_records(&clean.observations, &config.detection)?;
    report.detection_records = records.len();

    let mut outputs = vec![
        (DETECTIONS_FILE, detections_to_frame(&records)?),
        (
            DIVERSITY_FILE,
            diversity_by_transect(
                &clean.observations,
                &config.detection,
                config.bootstrap_resamples,
                config.seed,
            )?,
        ),
        (TRANSECT_TRENDS_FILE, transect_trends(&records)?),
    ];
    let species = species_trends(&records, config.alpha)?;
    outputs.push((SPECIES_TRENDS_FILE, species.summary));
    outputs.push((SPECIES_YEARLY_FILE, species.yearly));

    for (filename, mut df) in outputs {
        let path = out.join(filename);
        write_csv(&mut df, &path)?;
        info!(file = filename, rows = df.height(), "wrote analysis table");
        let stem = filename.trim_end_matches(".csv").to_string();
        report.written.insert(stem, path);
    }

    Ok(report)
}
