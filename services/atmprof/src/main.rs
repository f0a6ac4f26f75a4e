//! Atmospheric profile extractor.
//!
//! Single-shot batch tool: resolve a site, snap the requested timestamp
//! to the archive's 3-hour grid, fetch the weekly GDAS archive if it is
//! not cached, decode the sounding at the site's grid cell, derive the
//! density and refractivity profile, fit the 5-layer overburden model
//! and write the profile file the shower simulator consumes.

mod locate;
mod sites;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use bytes::Bytes;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use atmo_model::{derive_profile, fit_layers, format_profile, resample, SamplingOptions};
use gdas_archive::ArchiveReader;

use locate::TimeSlot;

#[derive(Parser, Debug)]
#[command(name = "atmprof")]
#[command(about = "Generate a layered atmospheric profile from a GDAS sounding archive")]
struct Args {
    /// Unix timestamp (UTC seconds) of the requested profile
    #[arg(short = 't', long)]
    timestamp: i64,

    /// Observatory name from the built-in registry
    #[arg(short, long)]
    observatory: Option<String>,

    /// Explicit coordinates: latitude longitude [deg]
    #[arg(
        short,
        long,
        num_args = 2,
        value_names = ["LAT", "LON"],
        allow_negative_numbers = true,
        conflicts_with = "observatory"
    )]
    coordinates: Option<Vec<f64>>,

    /// Output file (default: atmprof-<timecode>.dat)
    #[arg(short = 'O', long)]
    output: Option<PathBuf>,

    /// Lowest tabulated altitude [m]
    #[arg(short = 'm', long, default_value_t = 0.0, allow_negative_numbers = true)]
    min_height: f64,

    /// Highest tabulated altitude [m] (default: top of the sounding data)
    #[arg(short = 'M', long)]
    max_height: Option<f64>,

    /// Altitude sampling step [m]
    #[arg(long, default_value_t = 10.0)]
    step: f64,

    /// Directory where weekly archives are cached
    #[arg(long, env = "GDAS_ARCHIVE_DIR", default_value = "gdas")]
    archive_dir: PathBuf,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if args.step <= 0.0 {
        bail!("--step must be positive");
    }

    let (latitude, longitude, site_name) = resolve_location(&args)?;
    let slot = TimeSlot::from_timestamp(args.timestamp)?;
    info!(
        site = site_name.as_str(),
        latitude,
        longitude,
        time_code = %slot.time_code(),
        instant = %slot.instant(),
        "extracting atmospheric profile"
    );

    let archive_path = locate::ensure_archive(&args.archive_dir, &slot)?;
    let data = std::fs::read(&archive_path)
        .with_context(|| format!("reading {}", archive_path.display()))?;
    let reader = ArchiveReader::new(Bytes::from(data))?;

    let (nx, ny) = reader.grid_dims();
    let (ix, iy) = grid_cell(latitude, longitude, nx, ny)?;
    info!(nx, ny, ix, iy, "located grid cell");

    let sounding = reader.read_sounding(&slot.time_code(), ix, iy)?;
    let derived = derive_profile(&sounding, latitude)?;
    info!(
        ground_km = derived.ground_km,
        top_km = derived.top_km(),
        "derived sounding profile"
    );

    let fit = fit_layers(&derived)?;
    info!(rms_residual = fit.rms_residual, "fitted 5-layer model");

    let options = SamplingOptions {
        step_m: args.step,
        min_height_m: args.min_height,
        max_height_m: args.max_height,
    };
    let profile = resample(&derived, &fit, &options)?;

    let title = format!("{} {}", site_name, slot.time_code());
    let text = format_profile(&fit, &profile, &title);

    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(format!("atmprof-{}.dat", slot.time_code())));
    // the profile is written in one shot only after the whole pipeline
    // succeeded; a failed extraction leaves no partial file
    std::fs::write(&output, text).with_context(|| format!("writing {}", output.display()))?;
    info!(
        path = %output.display(),
        samples = profile.samples.len(),
        "profile written"
    );

    Ok(())
}

/// Resolve the requested location to coordinates and a display name.
fn resolve_location(args: &Args) -> Result<(f64, f64, String)> {
    if let Some(name) = &args.observatory {
        let site = sites::lookup(name).with_context(|| {
            format!(
                "unknown observatory {name:?}; known sites: {}",
                sites::known_names().join(", ")
            )
        })?;
        return Ok((site.latitude, site.longitude, site.name.to_string()));
    }
    if let Some(coords) = &args.coordinates {
        let (latitude, longitude) = (coords[0], coords[1]);
        if !(-90.0..=90.0).contains(&latitude) {
            bail!("latitude {latitude} out of range [-90, 90]");
        }
        if !(-180.0..=360.0).contains(&longitude) {
            bail!("longitude {longitude} out of range [-180, 360]");
        }
        return Ok((latitude, longitude, format!("{latitude:.2}N_{longitude:.2}E")));
    }
    bail!("one of --observatory or --coordinates is required")
}

/// Derive the archive grid cell for a coordinate pair: one-degree global
/// grid, latitude row 0 at the south pole, longitude wrapped east of
/// Greenwich.
fn grid_cell(latitude: f64, longitude: f64, nx: usize, ny: usize) -> Result<(usize, usize)> {
    let iy = 90 + latitude.round() as i64;
    if iy < 0 || iy >= ny as i64 {
        bail!("latitude {latitude} maps to row {iy} outside the {ny}-row grid");
    }
    let ix = (longitude.round() as i64).rem_euclid(nx as i64);
    Ok((ix as usize, iy as usize))
}
