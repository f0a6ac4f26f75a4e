//! Sounding extraction: scan one time block and assemble the 24-level
//! record for a single grid cell.

use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, trace};

use crate::error::{ArchiveError, ArchiveResult};
use crate::index::{find_index, IndexHeader};
use crate::label::{parse_label, VarKeyword, LABEL_LEN};
use crate::unpack::decode_field;

/// Standard isobaric levels of the archive, in hPa, surface excluded.
pub const STD_LEVELS_HPA: [f64; 23] = [
    1000.0, 975.0, 950.0, 925.0, 900.0, 850.0, 800.0, 750.0, 700.0, 650.0, 600.0, 550.0, 500.0,
    450.0, 400.0, 350.0, 300.0, 250.0, 200.0, 150.0, 100.0, 50.0, 20.0,
];

/// Total number of vertical levels in a sounding (surface + isobaric).
pub const NUM_LEVELS: usize = STD_LEVELS_HPA.len() + 1;

/// Upper bound on records scanned for one time block. A real block holds
/// well under 200 records; exceeding this means the archive is corrupt.
const MAX_BLOCK_RECORDS: usize = 512;

/// Measurements at one vertical level.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct LevelSample {
    /// Pressure [Pa].
    pub pressure: f64,
    /// Geopotential height [m].
    pub geopotential: f64,
    /// Temperature [K].
    pub temperature: f64,
    /// Relative humidity [%].
    pub humidity: f64,
}

/// A complete 24-level sounding at one grid cell and time code.
///
/// Level 0 is the surface; levels 1..=23 are the standard isobaric levels
/// from 1000 hPa up to 20 hPa. Immutable once constructed.
#[derive(Debug, Clone, Serialize)]
pub struct SoundingRecord {
    levels: Vec<LevelSample>,
}

impl SoundingRecord {
    /// All levels, surface first.
    pub fn levels(&self) -> &[LevelSample] {
        &self.levels
    }

    /// The surface level.
    pub fn surface(&self) -> &LevelSample {
        &self.levels[0]
    }
}

/// Decoder over an in-memory archive buffer.
///
/// The buffer is handed in by the caller; this type performs no file or
/// network I/O.
pub struct ArchiveReader {
    data: Bytes,
    index: IndexHeader,
}

/// Collects required fields as records are decoded.
#[derive(Default)]
struct FieldSet {
    surface_pressure: Option<f64>,
    surface_humidity: Option<f64>,
    surface_geopotential: Option<f64>,
    surface_temperature: Option<f64>,
    heights: [Option<f64>; STD_LEVELS_HPA.len()],
    temperatures: [Option<f64>; STD_LEVELS_HPA.len()],
    humidities: [Option<f64>; STD_LEVELS_HPA.len()],
}

impl FieldSet {
    fn is_complete(&self) -> bool {
        self.surface_pressure.is_some()
            && self.surface_humidity.is_some()
            && self.surface_geopotential.is_some()
            && self.surface_temperature.is_some()
            && self.heights.iter().all(Option::is_some)
            && self.temperatures.iter().all(Option::is_some)
            && self.humidities.iter().all(Option::is_some)
    }

    fn missing(&self) -> Vec<String> {
        let mut missing = Vec::new();
        for (name, value) in [
            ("PRSS", &self.surface_pressure),
            ("RH2M", &self.surface_humidity),
            ("SHGT", &self.surface_geopotential),
            ("T02M", &self.surface_temperature),
        ] {
            if value.is_none() {
                missing.push(name.to_string());
            }
        }
        for (name, per_level) in [
            ("HGTS", &self.heights),
            ("TEMP", &self.temperatures),
            ("RELH", &self.humidities),
        ] {
            for (i, value) in per_level.iter().enumerate() {
                if value.is_none() {
                    missing.push(format!("{}@{}hPa", name, STD_LEVELS_HPA[i]));
                }
            }
        }
        missing
    }

    fn into_record(self) -> SoundingRecord {
        let mut levels = Vec::with_capacity(NUM_LEVELS);
        levels.push(LevelSample {
            // surface pressure arrives in hPa
            pressure: self.surface_pressure.unwrap_or_default() * 100.0,
            geopotential: self.surface_geopotential.unwrap_or_default(),
            temperature: self.surface_temperature.unwrap_or_default(),
            humidity: self.surface_humidity.unwrap_or_default(),
        });
        for i in 0..STD_LEVELS_HPA.len() {
            levels.push(LevelSample {
                pressure: STD_LEVELS_HPA[i] * 100.0,
                geopotential: self.heights[i].unwrap_or_default(),
                temperature: self.temperatures[i].unwrap_or_default(),
                humidity: self.humidities[i].unwrap_or_default(),
            });
        }
        SoundingRecord { levels }
    }
}

impl ArchiveReader {
    /// Wrap an archive buffer, locating and validating its index record.
    pub fn new(data: Bytes) -> ArchiveResult<Self> {
        let index = find_index(&data)?;
        debug!(
            nx = index.nx,
            ny = index.ny,
            nz = index.nz,
            "located archive index record"
        );
        Ok(Self { data, index })
    }

    /// Grid dimensions as (nx, ny).
    pub fn grid_dims(&self) -> (usize, usize) {
        (self.index.nx, self.index.ny)
    }

    /// Decode the sounding for `time_code` (`yymmddhh`) at grid cell
    /// (`ix`, `iy`).
    ///
    /// Scans forward through the buffer for records labeled with the time
    /// code, reconstructs each recognized field and extracts the cell.
    /// Fails hard when the time code is absent or any required field never
    /// appears; a partially decoded sounding is never returned.
    pub fn read_sounding(
        &self,
        time_code: &str,
        ix: usize,
        iy: usize,
    ) -> ArchiveResult<SoundingRecord> {
        let (nx, ny) = (self.index.nx, self.index.ny);
        if ix >= nx || iy >= ny {
            return Err(ArchiveError::CellOutOfRange { ix, iy, nx, ny });
        }

        let buf = &self.data[..];
        let record_len = self.index.record_len();
        let needle = time_code.as_bytes();
        let mut fields = FieldSet::default();
        let mut offset = self.index.offset;
        let mut scanned = 0usize;
        let mut matched_any = false;

        loop {
            let hit = match find_from(buf, needle, offset) {
                Some(hit) => hit,
                None if !matched_any => {
                    return Err(ArchiveError::TimeNotFound {
                        time_code: time_code.to_string(),
                        offset,
                    });
                }
                None => {
                    return Err(ArchiveError::FieldsMissing {
                        time_code: time_code.to_string(),
                        scanned,
                        missing: fields.missing(),
                    });
                }
            };

            // The time code can occur by chance inside packed payloads;
            // real labels lie on the fixed record stride from the index.
            if hit < self.index.offset || (hit - self.index.offset) % record_len != 0 {
                offset = hit + 1;
                continue;
            }

            matched_any = true;
            scanned += 1;
            if scanned > MAX_BLOCK_RECORDS {
                return Err(ArchiveError::FieldsMissing {
                    time_code: time_code.to_string(),
                    scanned,
                    missing: fields.missing(),
                });
            }

            let label = parse_label(buf, hit)?;
            let payload_start = hit + LABEL_LEN;
            offset = hit + record_len;

            let keyword = match VarKeyword::from_bytes(&label.keyword) {
                Some(keyword) => keyword,
                None => {
                    trace!(
                        keyword = %String::from_utf8_lossy(&label.keyword),
                        offset = hit,
                        "skipping record"
                    );
                    continue;
                }
            };

            let payload_end = payload_start + nx * ny;
            if buf.len() < payload_end {
                return Err(ArchiveError::Truncated {
                    offset: payload_start,
                    needed: payload_end - buf.len(),
                });
            }
            let field = decode_field(
                &buf[payload_start..payload_end],
                nx,
                ny,
                label.exponent,
                label.first_value,
                payload_start,
            )?;
            // cell bounds were checked up front
            let value = field.get(ix, iy).unwrap_or_default();

            match keyword {
                VarKeyword::SurfacePressure => fields.surface_pressure = Some(value),
                VarKeyword::SurfaceHumidity => fields.surface_humidity = Some(value),
                VarKeyword::SurfaceGeopotential => fields.surface_geopotential = Some(value),
                VarKeyword::SurfaceTemperature => fields.surface_temperature = Some(value),
                VarKeyword::GeopotentialHeight
                | VarKeyword::Temperature
                | VarKeyword::Humidity => {
                    if label.level == 0 || label.level > STD_LEVELS_HPA.len() {
                        return Err(ArchiveError::MalformedLabel {
                            offset: hit,
                            reason: format!(
                                "level {} out of range for upper-air record",
                                label.level
                            ),
                        });
                    }
                    let slot = label.level - 1;
                    match keyword {
                        VarKeyword::GeopotentialHeight => fields.heights[slot] = Some(value),
                        VarKeyword::Temperature => fields.temperatures[slot] = Some(value),
                        _ => fields.humidities[slot] = Some(value),
                    }
                }
            }

            if fields.is_complete() {
                debug!(scanned, time_code, "sounding complete");
                return Ok(fields.into_record());
            }
        }
    }
}

/// Position of the next occurrence of `needle` at or after `from`.
fn find_from(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from >= haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| p + from)
}
