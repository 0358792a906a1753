use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use serde_json::json;

use survey_qc_lib::quality::{apply_quality_results, DirectoryPixelSource};
use survey_qc_lib::{
    apply_rtk_statuses, assess, compute_flight_metrics, run_quality_pass, CancellationToken,
    MetricsOptions, PhotoRecord, QcSettings, RtkLogParser,
};

#[derive(Parser, Debug)]
#[command(name = "survey-qc")]
#[command(about = "Flight-quality metrics for a drone survey", long_about = None)]
struct Args {
    /// JSON array of photo records
    #[arg(value_name = "PHOTOS")]
    photos: PathBuf,

    /// RTK log with one line per shot
    #[arg(long)]
    rtk_log: Option<PathBuf>,

    /// Drone preset name (defaults to the settings file)
    #[arg(long)]
    drone: Option<String>,

    /// Design flight height above ground, meters
    #[arg(long)]
    height: Option<f64>,

    /// Use the stricter turn threshold for curvature
    #[arg(long, default_value_t = false)]
    exclude_turns: bool,

    /// Directory holding the image files, enables the sharpness/exposure pass
    #[arg(long)]
    images: Option<PathBuf>,

    /// Settings file (defaults to the user config directory)
    #[arg(long)]
    settings: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let settings = match &args.settings {
        Some(path) => QcSettings::load_from(path)?,
        None => QcSettings::load()?,
    };

    let contents = fs::read_to_string(&args.photos)
        .with_context(|| format!("Failed to read photo list: {:?}", args.photos))?;
    let mut photos: Vec<PhotoRecord> =
        serde_json::from_str(&contents).context("Failed to parse photo list")?;
    info!("Loaded {} photos", photos.len());

    if let Some(log_path) = &args.rtk_log {
        let log = fs::read_to_string(log_path)
            .with_context(|| format!("Failed to read RTK log: {:?}", log_path))?;
        let statuses = RtkLogParser::new().parse(&log);
        apply_rtk_statuses(&mut photos, &statuses);
    }

    if let Some(dir) = &args.images {
        let source = DirectoryPixelSource::new(dir);
        let report = run_quality_pass(
            &photos,
            &source,
            &settings.quality,
            &CancellationToken::new(),
            |p| info!("Quality pass: {}/{} ({:.0}%)", p.current_photo, p.total_photos, p.percentage),
        );
        apply_quality_results(&mut photos, &report.results);
    }

    let drone = match &args.drone {
        Some(name) => settings.drone(name)?,
        None => settings.default_drone()?,
    };
    let height = args.height.unwrap_or(settings.default_flight_height_m);
    let options = MetricsOptions {
        exclude_turns: args.exclude_turns || settings.exclude_turns,
    };

    let metrics = compute_flight_metrics(&photos, drone, height, &options);
    let assessment = assess(&metrics, &settings.acceptance);

    let output = json!({
        "drone": drone,
        "metrics": metrics,
        "assessment": assessment,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
