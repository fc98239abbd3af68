//! Pipeline configuration, loaded from JSON.
//!
//! Every field has a default, so a config file only needs the keys it
//! changes:
//!
//! ```json
//! { "input_dir": "data/raw", "bootstrap_resamples": 2000, "seed": 7 }
//! ```

use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, SurveyError};
use crate::schema::observations as obs;
use crate::stats::bootstrap::DEFAULT_RESAMPLES;

/// Clean-observation columns used to derive detections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionColumns {
    pub species: String,
    pub transect: String,
    /// Year column, or a date column the year is parsed from.
    pub year: String,
    /// Distinguishes visits within a transect-year.
    pub visit: String,
    /// Count column; a positive value is a detection.
    pub count: String,
}

impl Default for DetectionColumns {
    fn default() -> Self {
        Self {
            species: "Espèce".to_string(),
            transect: "Transect".to_string(),
            year: "Date".to_string(),
            visit: obs::PASSAGE.to_string(),
            count: obs::TOT_AV_V.to_string(),
        }
    }
}

impl DetectionColumns {
    pub fn names(&self) -> [&str; 5] {
        [
            self.species.as_str(),
            self.transect.as_str(),
            self.year.as_str(),
            self.visit.as_str(),
            self.count.as_str(),
        ]
    }

    /// Fail with the first mapped column absent from `observations`.
    pub fn check(&self, observations: &DataFrame) -> Result<()> {
        match self
            .names()
            .into_iter()
            .find(|name| observations.column(name).is_err())
        {
            Some(missing) => Err(SurveyError::MissingColumn(missing.to_string())),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory holding the per-sheet raw CSV exports.
    pub input_dir: PathBuf,
    /// Directory for clean tables and analysis outputs (created if missing).
    pub output_dir: PathBuf,
    pub alpha: f64,
    pub bootstrap_resamples: usize,
    pub seed: u64,
    /// Also write parquet copies of the clean tables.
    pub write_parquet: bool,
    pub detection: DetectionColumns,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("data/raw"),
            output_dir: PathBuf::from("data/clean"),
            alpha: 0.05,
            bootstrap_resamples: DEFAULT_RESAMPLES,
            seed: 42,
            write_parquet: false,
            detection: DetectionColumns::default(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            SurveyError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;
        let config: PipelineConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(SurveyError::Config(format!(
                "alpha must be in (0, 1), got {}",
                self.alpha
            )));
        }
        if self.bootstrap_resamples == 0 {
            return Err(SurveyError::Config("bootstrap_resamples must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{ "seed": 7, "detection": { "count": "TOT_A" } }"#).unwrap();

        assert_eq!(config.seed, 7);
        assert_eq!(config.bootstrap_resamples, DEFAULT_RESAMPLES);
        assert_eq!(config.detection.count, "TOT_A");
        assert_eq!(config.detection.visit, obs::PASSAGE);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_check_reports_missing_detection_column() {
        let observations = df![
            "Espèce" => ["Rougegorge"],
            "Transect" => ["T1"],
            "Date" => ["2021-05-12"],
            obs::TOT_AV_V => [1i64],
        ]
        .unwrap();

        let err = DetectionColumns::default().check(&observations).unwrap_err();
        assert!(matches!(err, SurveyError::MissingColumn(name) if name == obs::PASSAGE));

        let cols = DetectionColumns {
            visit: "Date".into(),
            ..Default::default()
        };
        assert!(cols.check(&observations).is_ok());
    }

    #[test]
    fn test_invalid_alpha_rejected() {
        let config = PipelineConfig {
            alpha: 1.5,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(SurveyError::Config(_))));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = PipelineConfig::load(Path::new("/nonexistent/survey.json")).unwrap_err();
        assert!(err.to_string().contains("survey.json"));
    }
}
