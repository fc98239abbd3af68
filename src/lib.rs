//! Transect survey cleaning and statistics.
//!
//! Turns the three sheets of a field survey workbook (species list, GPS and
//! habitat metadata, per-visit observation counts) into clean tables, then
//! derives detection rates, diversity indices, bootstrap intervals and
//! binomial trend fits.
//!
//! - `cleaning/`: positional sheet normalizers
//! - `stats/`: Wilson interval, bootstrap, diversity, binomial GLM
//! - `detection`: species × transect × year detection table
//! - `trends/`: pooled and per-transect trend fitters
//! - `summaries`: batch tables written by the pipeline
//! - `data`, `pipeline`, `config`: IO and orchestration

pub mod cleaning;
pub mod config;
pub mod data;
pub mod detection;
pub mod error;
pub mod pipeline;
pub mod records;
pub mod schema;
pub mod stats;
pub mod summaries;
pub mod trends;

// Re-export commonly used types
pub use cleaning::{clean_gps, clean_observations, clean_species, normalize_sheet};
pub use config::{DetectionColumns, PipelineConfig};
pub use data::SurveySheets;
pub use detection::{detection_records, detection_table, DetectionRecord};
pub use error::{Result, SurveyError};
pub use pipeline::{run_pipeline, PipelineReport};
pub use records::{ObservationRecord, SpeciesRecord, TransectPoint};
pub use stats::{
    bootstrap_ci, bootstrap_diversity, wilson_interval, BootstrapConfig, ConfidenceInterval,
};
pub use trends::{
    binomial_proportion_trend, transect_logistic_trend, transect_logistic_trend_with_fitted,
};
