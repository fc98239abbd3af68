//! Pipeline Integration Tests
//!
//! Writes a small survey (three raw sheet exports, laid out the way the
//! workbook export produces them) to a scratch directory and runs the full
//! pipeline over it.

use std::fs;
use std::path::{Path, PathBuf};

use polars::prelude::*;
use transect_survey_rust::schema::{detection as det, gps, observations as obs, species, trend};
use transect_survey_rust::{run_pipeline, PipelineConfig, SurveyError, SurveySheets};

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "transect_survey_it_{}_{}",
        name,
        std::process::id()
    ));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_species(dir: &Path) {
    fs::write(
        dir.join("especes.csv"),
        "Unnamed: 0,Unnamed: 1,Rougegorge,Erithacus rubecula,Oiseau\n\
         ,,Troglodyte,Troglodytes troglodytes,Oiseau\n\
         ,,Merle noir,Turdus merula,\n",
    )
    .unwrap();
}

fn write_gps(dir: &Path) {
    fs::write(
        dir.join("gps_milieu.csv"),
        "Unnamed: 0,Unnamed: 1,Unnamed: 2,Unnamed: 3,Unnamed: 4,Unnamed: 5,Unnamed: 6,Unnamed: 7\n\
         ,,Transect,X,Y,Milieu,ID transect,ID point\n\
         ,,Bois,652301.5,6861200,forest,T1,T1P1\n\
         ,,Prairie,\"652400,5\",6861300,meadow,T2,T2P1\n",
    )
    .unwrap();
}

/// Robin at T1 is detected on more passages each year; everything else is
/// flat.
fn detected(species: &str, transect: &str, year: i32, passage: i32) -> bool {
    match (species, transect) {
        ("Rougegorge", "T1") => passage <= (year - 2017).min(3),
        ("Rougegorge", _) => passage == 1 && year % 2 == 0,
        (_, "T1") => passage == 1,
        _ => passage <= 2,
    }
}

fn write_observations(dir: &Path) {
    let mut header: Vec<String> = [
        "Date",
        "\"1er, 2e ou 3e passage\"",
        "Météo",
        "Vent",
        "Observateur",
        "Transect",
        "ID point",
        "Heure",
        "Durée",
        "Nuages",
        "Code",
        "Espèce",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    header.extend((12..26).map(|i| format!("Unnamed: {i}")));

    let mut lines = vec![header.join(",")];
    lines.push(format!(",,,,,,,,,,,,{}", obs::COUNT_FIELDS.join(",")));
    lines.push(",".repeat(25));

    for year in 2018..=2021 {
        for transect in ["T1", "T2"] {
            for passage in 1..=3 {
                for sp in ["Rougegorge", "Troglodyte"] {
                    let total = if detected(sp, transect, year, passage) { "2" } else { "0" };
                    let mut counts = vec!["1"; 14];
                    counts[0] = "abc";
                    counts[12] = total;
                    counts[13] = "";
                    lines.push(format!(
                        "{year}-05-0{passage},{passage},beau,0,AB,{transect},{transect}P1,07:30,5,0,{code},{sp},{counts}",
                        code = &sp[..4].to_uppercase(),
                        counts = counts.join(","),
                    ));
                }
            }
        }
    }
    fs::write(dir.join("observations.csv"), lines.join("\n") + "\n").unwrap();
}

fn write_survey(dir: &Path) {
    write_species(dir);
    write_gps(dir);
    write_observations(dir);
}

fn read(path: &Path) -> DataFrame {
    CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.into()))
        .unwrap()
        .finish()
        .unwrap()
}

fn config(name: &str) -> PipelineConfig {
    let root = scratch_dir(name);
    let input = root.join("raw");
    fs::create_dir_all(&input).unwrap();
    write_survey(&input);
    PipelineConfig {
        input_dir: input,
        output_dir: root.join("clean"),
        bootstrap_resamples: 200,
        ..Default::default()
    }
}

#[test]
fn test_normalize_raw_exports() {
    let cfg = config("normalize");
    let clean = SurveySheets::load_raw(&cfg.input_dir)
        .unwrap()
        .normalize()
        .unwrap();

    assert_eq!(clean.species.height(), 3);
    let names = clean.species.column(species::ESPECIES_NAME).unwrap().str().unwrap();
    assert_eq!(names.get(0), Some("Rougegorge"));
    let nature = clean.species.column(species::NATURE).unwrap().str().unwrap();
    assert_eq!(nature.get(2), Some(""));

    assert_eq!(clean.gps.height(), 2);
    let x = clean.gps.column(gps::COORDINATE_X).unwrap().f64().unwrap();
    assert_eq!(x.get(1), Some(652400.5));

    assert_eq!(clean.observations.height(), 48);
    assert!(clean.observations.column(obs::PASSAGE).is_ok());
    let al25 = clean.observations.column(obs::AL25).unwrap().i64().unwrap();
    assert!(al25.into_iter().all(|v| v == Some(0)));
    let companied = clean.observations.column(obs::COMPANIED).unwrap().str().unwrap();
    assert!(companied.into_iter().all(|v| v == Some("")));
}

#[test]
fn test_full_pipeline_outputs() {
    let cfg = config("full");
    let report = run_pipeline(&cfg).unwrap();

    for stem in [
        "especes_clean",
        "gps_milieu_clean",
        "observations_clean",
        "detections",
        "diversity_by_transect",
        "transect_trends",
        "species_trends",
        "species_yearly",
    ] {
        let path = report.written.get(stem).unwrap_or_else(|| panic!("missing {stem}"));
        assert!(path.exists(), "{stem} not written");
    }

    // 2 species × 2 transects × 4 years
    assert_eq!(report.detection_records, 16);
    let detections = read(&cfg.output_dir.join("detections.csv"));
    assert_eq!(detections.height(), 16);
    let n = detections.column(det::N_VISITS).unwrap().i64().unwrap();
    assert!(n.into_iter().all(|v| v == Some(3)));

    let trends = read(&cfg.output_dir.join("transect_trends.csv"));
    assert_eq!(trends.height(), 4);
    let sp = trends.column(det::SPECIES).unwrap().str().unwrap();
    let tr = trends.column(det::TRANSECT).unwrap().str().unwrap();
    let slope = trends.column(trend::SLOPE).unwrap().f64().unwrap();
    assert_eq!((sp.get(0), tr.get(0)), (Some("Rougegorge"), Some("T1")));
    assert!(slope.get(0).unwrap() > 0.0);

    let diversity = read(&cfg.output_dir.join("diversity_by_transect.csv"));
    assert_eq!(diversity.height(), 2);

    let reloaded = SurveySheets::load_clean(&cfg.output_dir).unwrap();
    assert_eq!(reloaded.observations.height(), report.observations);

    fs::remove_dir_all(cfg.output_dir.parent().unwrap()).ok();
}

#[test]
fn test_pipeline_is_reproducible() {
    let cfg = config("repro");
    run_pipeline(&cfg).unwrap();
    let first = read(&cfg.output_dir.join("diversity_by_transect.csv"));
    run_pipeline(&cfg).unwrap();
    let second = read(&cfg.output_dir.join("diversity_by_transect.csv"));
    assert!(first.equals_missing(&second));

    fs::remove_dir_all(cfg.output_dir.parent().unwrap()).ok();
}

#[test]
fn test_parquet_copies() {
    let mut cfg = config("parquet");
    cfg.write_parquet = true;
    let report = run_pipeline(&cfg).unwrap();
    assert!(report.written["observations_clean_parquet"].exists());

    fs::remove_dir_all(cfg.output_dir.parent().unwrap()).ok();
}

#[test]
fn test_narrow_observation_sheet_fails() {
    let cfg = config("narrow");
    fs::write(cfg.input_dir.join("observations.csv"), "a,b,c\n1,2,3\n4,5,6\n").unwrap();
    let err = run_pipeline(&cfg).unwrap_err();
    assert!(err.to_string().contains("expected at least 26 columns"));

    fs::remove_dir_all(cfg.output_dir.parent().unwrap()).ok();
}

#[test]
fn test_unmapped_detection_column_fails_before_writing() {
    let mut cfg = config("unmapped");
    cfg.detection.species = "Species".into();
    let err = run_pipeline(&cfg).unwrap_err();

    assert!(matches!(err, SurveyError::MissingColumn(ref name) if name == "Species"));
    assert!(!cfg.output_dir.join("observations_clean.csv").exists());
    assert!(!cfg.output_dir.join("especes_clean.csv").exists());

    fs::remove_dir_all(cfg.output_dir.parent().unwrap()).ok();
}
