//! Batch summaries written by the pipeline: diversity per transect and trend
//! tables per species and per species × transect.
//!
//! Single-group failures (a singular fit on one transect, say) are logged and
//! reported as null statistics instead of aborting the batch.

use std::collections::BTreeMap;

use polars::prelude::*;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use tracing::{info, warn};

use crate::cleaning::coercion::{coerce_count, text_values};
use crate::config::DetectionColumns;
use crate::detection::{detections_to_frame, DetectionRecord};
use crate::error::{Result, SurveyError};
use crate::schema::{detection as det, trend};
use crate::stats::bootstrap::bootstrap_diversity;
use crate::stats::diversity::diversity_indices;
use crate::trends::{binomial_proportion_trend, transect_logistic_trend, yearly_totals};

fn text(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let column = df
        .column(name)
        .map_err(|_| SurveyError::MissingColumn(name.to_string()))?;
    text_values(column)
}

fn col_f64(name: &str, values: Vec<f64>) -> Column {
    Series::new(name.into(), values).into_column()
}

fn col_opt_f64(name: &str, values: Vec<Option<f64>>) -> Column {
    Series::new(name.into(), values).into_column()
}

/// Summed abundance per species at each transect, species in name order.
pub fn abundance_by_transect(
    observations: &DataFrame,
    columns: &DetectionColumns,
) -> Result<BTreeMap<String, Vec<(String, f64)>>> {
    let species = text(observations, &columns.species)?;
    let transects = text(observations, &columns.transect)?;
    let counts = text(observations, &columns.count)?;

    let mut totals: FxHashMap<String, BTreeMap<String, f64>> = FxHashMap::default();
    for i in 0..observations.height() {
        if let (Some(tr), Some(sp)) = (&transects[i], &species[i]) {
            *totals
                .entry(tr.clone())
                .or_default()
                .entry(sp.clone())
                .or_default() += coerce_count(counts[i].as_deref()) as f64;
        }
    }

    Ok(totals
        .into_iter()
        .map(|(tr, by_species)| (tr, by_species.into_iter().collect()))
        .collect())
}

/// Shannon, Simpson and richness per transect with seeded bootstrap intervals.
pub fn diversity_by_transect(
    observations: &DataFrame,
    columns: &DetectionColumns,
    resamples: usize,
    seed: u64,
) -> Result<DataFrame> {
    let abundance = abundance_by_transect(observations, columns)?;

    let mut transect = Vec::new();
    let mut total = Vec::new();
    let mut shannon = Vec::new();
    let mut simpson = Vec::new();
    let mut richness = Vec::new();
    let mut boot: [Vec<Option<f64>>; 9] = Default::default();

    for (tr, species_counts) in &abundance {
        let counts: Vec<f64> = species_counts.iter().map(|(_, c)| *c).collect();
        let indices = diversity_indices(&counts);

        transect.push(tr.clone());
        total.push(counts.iter().sum::<f64>());
        shannon.push(indices.shannon);
        simpson.push(indices.simpson);
        richness.push(indices.richness as u32);

        let cis = bootstrap_diversity(&counts, resamples, seed)
            .map(|b| [b.shannon, b.simpson, b.richness]);
        for stat in 0..3 {
            let ci = cis.map(|c| c[stat]);
            boot[stat * 3].push(ci.map(|c| c.estimate));
            boot[stat * 3 + 1].push(ci.map(|c| c.low));
            boot[stat * 3 + 2].push(ci.map(|c| c.high));
        }
    }

    let [sh_mean, sh_low, sh_high, si_mean, si_low, si_high, ri_mean, ri_low, ri_high] = boot;
    let df = DataFrame::new(vec![
        Series::new(det::TRANSECT.into(), transect).into_column(),
        col_f64("total_abundance", total),
        Series::new("richness".into(), richness).into_column(),
        col_f64("shannon", shannon),
        col_f64("simpson", simpson),
        col_opt_f64("shannon_boot_mean", sh_mean),
        col_opt_f64("shannon_ci_low", sh_low),
        col_opt_f64("shannon_ci_high", sh_high),
        col_opt_f64("simpson_boot_mean", si_mean),
        col_opt_f64("simpson_ci_low", si_low),
        col_opt_f64("simpson_ci_high", si_high),
        col_opt_f64("richness_boot_mean", ri_mean),
        col_opt_f64("richness_ci_low", ri_low),
        col_opt_f64("richness_ci_high", ri_high),
    ])?;
    info!(transects = df.height(), "computed diversity by transect");
    Ok(df)
}

/// Per-species pooled trend summary and the per-year predictions behind it.
pub struct SpeciesTrendTables {
    /// One row per species: `species, n_years, slope, p_value`.
    pub summary: DataFrame,
    /// One row per species × year with Wilson and model bands.
    pub yearly: DataFrame,
}

pub fn species_trends(records: &[DetectionRecord], alpha: f64) -> Result<SpeciesTrendTables> {
    let mut species_names: Vec<&str> = records.iter().map(|r| r.species.as_str()).collect();
    species_names.sort_unstable();
    species_names.dedup();

    let mut s_species = Vec::new();
    let mut s_years = Vec::new();
    let mut s_slope = Vec::new();
    let mut s_p = Vec::new();

    let mut y_species = Vec::new();
    let mut y_year = Vec::new();
    let mut y_k = Vec::new();
    let mut y_n = Vec::new();
    let mut y_prop = Vec::new();
    let mut y_wl = Vec::new();
    let mut y_wh = Vec::new();
    let mut y_fit = Vec::new();
    let mut y_lo = Vec::new();
    let mut y_hi = Vec::new();

    for sp in species_names {
        let points = yearly_totals(records, sp);
        let fitted = match binomial_proportion_trend(&points, alpha) {
            Ok(t) => t,
            Err(e) => {
                warn!(species = sp, error = %e, "species trend fit failed");
                None
            }
        };

        s_species.push(sp.to_string());
        s_years.push(points.len() as u32);
        s_slope.push(fitted.as_ref().map(|t| t.slope));
        s_p.push(fitted.as_ref().map(|t| t.p_value));

        if let Some(t) = fitted {
            for p in t.predictions {
                y_species.push(sp.to_string());
                y_year.push(p.year);
                y_k.push(p.k);
                y_n.push(p.n);
                y_prop.push(p.proportion);
                y_wl.push(p.wilson_low);
                y_wh.push(p.wilson_high);
                y_fit.push(p.fitted);
                y_lo.push(p.ci_low);
                y_hi.push(p.ci_high);
            }
        }
    }

    let summary = DataFrame::new(vec![
        Series::new(det::SPECIES.into(), s_species).into_column(),
        Series::new("n_years".into(), s_years).into_column(),
        col_opt_f64(trend::SLOPE, s_slope),
        col_opt_f64(trend::P_VALUE, s_p),
    ])?;
    let yearly = DataFrame::new(vec![
        Series::new(det::SPECIES.into(), y_species).into_column(),
        Series::new(det::YEAR.into(), y_year).into_column(),
        Series::new(det::K_DETECTS.into(), y_k).into_column(),
        Series::new(det::N_VISITS.into(), y_n).into_column(),
        col_f64("proportion", y_prop),
        col_opt_f64("wilson_low", y_wl),
        col_opt_f64("wilson_high", y_wh),
        col_f64(trend::FITTED, y_fit),
        col_f64(trend::CI_LOW, y_lo),
        col_f64(trend::CI_HIGH, y_hi),
    ])?;

    info!(species = summary.height(), "fitted species trends");
    Ok(SpeciesTrendTables { summary, yearly })
}

struct TransectTrendRow {
    species: String,
    transect: String,
    n_rows: u32,
    intercept: Option<f64>,
    slope: Option<f64>,
    p_value: Option<f64>,
}

/// Per-transect logistic trend for every species × transect, fanned out on
/// rayon. Groups with insufficient data get null statistics.
pub fn transect_trends(records: &[DetectionRecord]) -> Result<DataFrame> {
    let mut groups: BTreeMap<(&str, &str), Vec<DetectionRecord>> = BTreeMap::new();
    for r in records {
        groups
            .entry((r.species.as_str(), r.transect.as_str()))
            .or_default()
            .push(r.clone());
    }

    let rows = groups
        .into_par_iter()
        .map(|((species, transect), group)| {
            let frame = detections_to_frame(&group)?;
            let fit = match transect_logistic_trend(&frame) {
                Ok(fit) => fit,
                Err(e) => {
                    warn!(species, transect, error = %e, "transect trend fit failed");
                    None
                }
            };
            Ok(TransectTrendRow {
                species: species.to_string(),
                transect: transect.to_string(),
                n_rows: group.iter().filter(|r| r.n_visits > 0).count() as u32,
                intercept: fit.as_ref().map(|f| f.coefficients[0]),
                slope: fit.as_ref().map(|f| f.coefficients[1]),
                p_value: fit.as_ref().map(|f| f.p_values[1]),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let insufficient = rows.iter().filter(|r| r.slope.is_none()).count();
    info!(groups = rows.len(), insufficient, "fitted transect trends");

    let df = DataFrame::new(vec![
        Series::new(
            det::SPECIES.into(),
            rows.iter().map(|r| r.species.as_str()).collect::<Vec<_>>(),
        )
        .into_column(),
        Series::new(
            det::TRANSECT.into(),
            rows.iter().map(|r| r.transect.as_str()).collect::<Vec<_>>(),
        )
        .into_column(),
        Series::new(
            trend::N_ROWS.into(),
            rows.iter().map(|r| r.n_rows).collect::<Vec<_>>(),
        )
        .into_column(),
        col_opt_f64("intercept", rows.iter().map(|r| r.intercept).collect()),
        col_opt_f64(trend::SLOPE, rows.iter().map(|r| r.slope).collect()),
        col_opt_f64(trend::P_VALUE, rows.iter().map(|r| r.p_value).collect()),
    ])?;
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(species: &str, transect: &str, year: i32, k: u32, n: u32) -> DetectionRecord {
        DetectionRecord {
            species: species.into(),
            transect: transect.into(),
            year,
            k_detects: k,
            n_visits: n,
        }
    }

    fn records() -> Vec<DetectionRecord> {
        vec![
            record("Robin", "T1", 2017, 0, 3),
            record("Robin", "T1", 2018, 1, 3),
            record("Robin", "T1", 2019, 2, 3),
            record("Robin", "T1", 2020, 2, 3),
            record("Robin", "T2", 2019, 1, 2),
            record("Robin", "T2", 2020, 2, 2),
            record("Wren", "T1", 2020, 1, 3),
        ]
    }

    #[test]
    fn test_transect_trends_mark_insufficient_groups() {
        let df = transect_trends(&records()).unwrap();
        assert_eq!(df.height(), 3);

        let species = df.column(det::SPECIES).unwrap().str().unwrap();
        let transects = df.column(det::TRANSECT).unwrap().str().unwrap();
        let slope = df.column(trend::SLOPE).unwrap().f64().unwrap();

        assert_eq!((species.get(0), transects.get(0)), (Some("Robin"), Some("T1")));
        assert!(slope.get(0).unwrap() > 0.0);
        // Robin@T2 has two rows, Wren@T1 one
        assert_eq!(slope.get(1), None);
        assert_eq!(slope.get(2), None);
    }

    #[test]
    fn test_species_trends_tables() {
        let tables = species_trends(&records(), 0.05).unwrap();
        assert_eq!(tables.summary.height(), 2);

        let slope = tables.summary.column(trend::SLOPE).unwrap().f64().unwrap();
        assert!(slope.get(0).unwrap() > 0.0);
        assert_eq!(slope.get(1), None); // Wren: single year

        // Robin: 2017..=2020 pooled across transects
        assert_eq!(tables.yearly.height(), 4);
        let n = tables.yearly.column(det::N_VISITS).unwrap().u64().unwrap();
        assert_eq!(n.get(3), Some(5));
    }

    #[test]
    fn test_diversity_by_transect() {
        let observations = df![
            "species" => ["Robin", "Wren", "Robin", "Tit", "Robin"],
            "transect" => ["T1", "T1", "T1", "T1", "T2"],
            "count" => ["2", "1", "1", "abc", "4"],
        ]
        .unwrap();
        let columns = DetectionColumns {
            species: "species".into(),
            transect: "transect".into(),
            year: "year".into(),
            visit: "visit".into(),
            count: "count".into(),
        };

        let df = diversity_by_transect(&observations, &columns, 200, 1).unwrap();
        assert_eq!(df.height(), 2);

        let richness = df.column("richness").unwrap().u32().unwrap();
        assert_eq!(richness.get(0), Some(2)); // Tit counted 0
        assert_eq!(richness.get(1), Some(1));

        let total = df.column("total_abundance").unwrap().f64().unwrap();
        assert_eq!(total.get(0), Some(4.0));

        let simpson = df.column("simpson").unwrap().f64().unwrap();
        assert_eq!(simpson.get(1), Some(0.0));
    }
}
