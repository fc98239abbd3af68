//! Survey pipeline: clean the three workbook sheets and write analysis tables.
//!
//! Usage:
//!   cargo run --release --bin survey_pipeline [config.json]
//!
//! Without a config file the defaults apply (data/raw → data/clean).
//! Log verbosity follows RUST_LOG (default: info).

use anyhow::{Context, Result};
use std::path::Path;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use transect_survey_rust::{run_pipeline, PipelineConfig};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("\n{}", "=".repeat(70));
    println!("Transect Survey Pipeline (Rust)");
    println!("{}", "=".repeat(70));

    let config = match std::env::args().nth(1) {
        Some(path) => PipelineConfig::load(Path::new(&path))
            .with_context(|| format!("Failed to load config: {}", path))?,
        None => PipelineConfig::default(),
    };

    println!("  Input:      {}", config.input_dir.display());
    println!("  Output:     {}", config.output_dir.display());
    println!("  Resamples:  {}", config.bootstrap_resamples);
    println!("  Seed:       {}", config.seed);
    println!();

    let start = Instant::now();
    let report = run_pipeline(&config).context("Pipeline failed")?;

    println!("Clean tables:");
    println!("  Species:      {}", report.species);
    println!("  GPS points:   {}", report.points);
    println!("  Observations: {}", report.observations);
    println!("  Detections:   {}", report.detection_records);
    println!("\nWritten:");
    for (name, path) in &report.written {
        println!("  {:<24} {}", name, path.display());
    }
    println!("\n✓ Done in {:.2}s", start.elapsed().as_secs_f64());

    Ok(())
}
