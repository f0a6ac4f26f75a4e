//! Archive location: timestamp rounding, weekly file naming, local-cache
//! lookup and download.
//!
//! GDAS archives are published as weekly files named
//! `gdas1.<mmm><yy>.w<n>` (lowercase month abbreviation, week number 1-5
//! by day of month), each holding one record block per 3-hour grid point.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Datelike, Utc};
use tracing::{debug, info};

/// Base URL of the NOAA ARL archive server.
pub const ARCHIVE_BASE_URL: &str = "https://www.ready.noaa.gov/data/archives/gdas1";

/// Seconds per 3-hour record grid point.
const GRID_SECONDS: i64 = 3 * 3600;

/// A requested timestamp snapped to the archive's 3-hour record grid.
#[derive(Debug, Clone, Copy)]
pub struct TimeSlot {
    rounded: DateTime<Utc>,
}

impl TimeSlot {
    /// Round a unix timestamp (UTC seconds) to the nearest 3-hour grid
    /// point.
    pub fn from_timestamp(timestamp: i64) -> Result<Self> {
        let rounded_secs =
            ((timestamp as f64 / GRID_SECONDS as f64).round() as i64) * GRID_SECONDS;
        let rounded = DateTime::<Utc>::from_timestamp(rounded_secs, 0)
            .with_context(|| format!("timestamp {timestamp} out of range"))?;
        Ok(Self { rounded })
    }

    /// The rounded instant.
    pub fn instant(&self) -> DateTime<Utc> {
        self.rounded
    }

    /// Record time code: `yymmddhh`.
    pub fn time_code(&self) -> String {
        self.rounded.format("%y%m%d%H").to_string()
    }

    /// Weekly archive file holding this slot.
    pub fn archive_file(&self) -> String {
        let month = self.rounded.format("%b").to_string().to_lowercase();
        let year = self.rounded.format("%y");
        let week = (self.rounded.day() - 1) / 7 + 1;
        format!("gdas1.{month}{year}.w{week}")
    }
}

/// Return the local path of the slot's weekly archive, downloading it
/// into `dir` when absent. One attempt, no partial files left behind.
pub fn ensure_archive(dir: &Path, slot: &TimeSlot) -> Result<PathBuf> {
    let path = dir.join(slot.archive_file());
    if path.exists() {
        debug!(path = %path.display(), "archive already cached");
        return Ok(path);
    }

    fs::create_dir_all(dir)
        .with_context(|| format!("creating archive directory {}", dir.display()))?;

    let url = format!("{}/{}", ARCHIVE_BASE_URL, slot.archive_file());
    info!(url = %url, "downloading weekly archive (several hundred MB)");

    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(3600))
        .connect_timeout(Duration::from_secs(30))
        .build()
        .context("building HTTP client")?;

    let response = client
        .get(&url)
        .send()
        .with_context(|| format!("requesting {url}"))?;
    if !response.status().is_success() {
        bail!("archive download failed: HTTP {} for {url}", response.status());
    }

    let body = response
        .bytes()
        .with_context(|| format!("reading body of {url}"))?;

    // write to a temp name and rename so an interrupted download never
    // masquerades as a cached archive
    let partial = path.with_extension("partial");
    fs::write(&partial, &body)
        .with_context(|| format!("writing {}", partial.display()))?;
    fs::rename(&partial, &path)
        .with_context(|| format!("renaming {} into place", partial.display()))?;

    info!(path = %path.display(), bytes = body.len(), "archive downloaded");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_the_nearest_grid_point() {
        // 2025-01-01 01:29:59 UTC rounds down to 00:00
        let slot = TimeSlot::from_timestamp(1_735_694_999).unwrap();
        assert_eq!(slot.time_code(), "25010100");

        // 2025-01-01 01:30:00 UTC rounds up to 03:00
        let slot = TimeSlot::from_timestamp(1_735_695_000).unwrap();
        assert_eq!(slot.time_code(), "25010103");
    }

    #[test]
    fn rounding_crosses_day_boundaries() {
        // 2024-12-31 23:00 UTC belongs to 2025-01-01 00:00
        let slot = TimeSlot::from_timestamp(1_735_686_000).unwrap();
        assert_eq!(slot.time_code(), "25010100");
        assert_eq!(slot.archive_file(), "gdas1.jan25.w1");
    }

    #[test]
    fn weekly_file_names_cover_the_month() {
        // days 1, 7 -> w1; 8 -> w2; 21 -> w3; 22 -> w4; 29 -> w5
        let cases = [
            ("2025-04-01T00:00:00Z", "gdas1.apr25.w1"),
            ("2025-04-07T12:00:00Z", "gdas1.apr25.w1"),
            ("2025-04-08T00:00:00Z", "gdas1.apr25.w2"),
            ("2025-04-21T00:00:00Z", "gdas1.apr25.w3"),
            ("2025-04-22T00:00:00Z", "gdas1.apr25.w4"),
            ("2025-04-29T00:00:00Z", "gdas1.apr25.w5"),
        ];
        for (iso, expected) in cases {
            let ts = iso.parse::<DateTime<Utc>>().unwrap().timestamp();
            let slot = TimeSlot::from_timestamp(ts).unwrap();
            assert_eq!(slot.archive_file(), expected, "for {iso}");
        }
    }

    #[test]
    fn cached_archive_is_reused_without_network() {
        let dir = tempfile::tempdir().unwrap();
        let slot = TimeSlot::from_timestamp(1_735_694_999).unwrap();
        let path = dir.path().join(slot.archive_file());
        fs::write(&path, b"cached").unwrap();

        let found = ensure_archive(dir.path(), &slot).unwrap();
        assert_eq!(found, path);
    }
}
