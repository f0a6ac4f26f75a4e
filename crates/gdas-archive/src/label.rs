//! Fixed-layout ASCII record labels.
//!
//! Every record in the packed archive starts with a 50-byte ASCII label
//! followed by an nx*ny-byte binary payload. The label layout is fixed:
//!
//! ```text
//! Bytes  0-13: seven 2-digit integers
//!              (year, month, day, hour, forecast, level, grid id)
//! Bytes 14-17: 4-character variable keyword
//! Bytes 18-21: 4-digit packing exponent
//! Bytes 22-35: 14-character real, packing precision (unused here)
//! Bytes 36-49: 14-character real, reconstructed value of the first cell
//! ```

use crate::error::{ArchiveError, ArchiveResult};

/// Length of the ASCII label preceding every packed payload.
pub const LABEL_LEN: usize = 50;

/// Byte offset of the variable keyword within a label.
pub const KEYWORD_OFFSET: usize = 14;

/// Meteorological variables the decoder extracts. Records carrying any
/// other keyword are skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKeyword {
    /// `PRSS` - pressure at the surface (hPa).
    SurfacePressure,
    /// `RH2M` - relative humidity 2 m above ground (%).
    SurfaceHumidity,
    /// `SHGT` - geopotential height of the surface (m).
    SurfaceGeopotential,
    /// `T02M` - temperature 2 m above ground (K).
    SurfaceTemperature,
    /// `HGTS` - geopotential height of an isobaric level (m).
    GeopotentialHeight,
    /// `TEMP` - temperature of an isobaric level (K).
    Temperature,
    /// `RELH` - relative humidity of an isobaric level (%).
    Humidity,
}

impl VarKeyword {
    /// Map a 4-byte keyword to a recognized variable, `None` when the
    /// record should be skipped.
    pub fn from_bytes(keyword: &[u8]) -> Option<Self> {
        match keyword {
            b"PRSS" => Some(Self::SurfacePressure),
            b"RH2M" => Some(Self::SurfaceHumidity),
            b"SHGT" => Some(Self::SurfaceGeopotential),
            b"T02M" => Some(Self::SurfaceTemperature),
            b"HGTS" => Some(Self::GeopotentialHeight),
            b"TEMP" => Some(Self::Temperature),
            b"RELH" => Some(Self::Humidity),
            _ => None,
        }
    }

    /// Surface variables live on level 0; the rest are per isobaric level.
    pub fn is_surface(self) -> bool {
        matches!(
            self,
            Self::SurfacePressure
                | Self::SurfaceHumidity
                | Self::SurfaceGeopotential
                | Self::SurfaceTemperature
        )
    }
}

/// One parsed record label.
#[derive(Debug, Clone)]
pub struct RecordLabel {
    /// `yymmddhh` time code of the record.
    pub time_code: String,
    /// Forecast hour (0 for analysis fields).
    pub forecast: i32,
    /// Vertical level number: 0 = surface, 1.. = isobaric levels.
    pub level: usize,
    /// Raw 4-byte variable keyword.
    pub keyword: [u8; 4],
    /// Packing exponent; deltas are scaled by 2^(7 - exponent).
    pub exponent: i32,
    /// Reconstructed value of the first grid cell.
    pub first_value: f64,
}

/// Parse the 50-byte label starting at `offset`.
pub fn parse_label(buf: &[u8], offset: usize) -> ArchiveResult<RecordLabel> {
    if buf.len() < offset + LABEL_LEN {
        return Err(ArchiveError::Truncated {
            offset,
            needed: offset + LABEL_LEN - buf.len(),
        });
    }
    let label = &buf[offset..offset + LABEL_LEN];

    let time_code = std::str::from_utf8(&label[0..8])
        .map_err(|_| malformed(offset, "time code is not ASCII"))?
        .to_string();
    if !time_code.bytes().all(|b| b.is_ascii_digit() || b == b' ') {
        return Err(malformed(offset, "time code is not numeric"));
    }

    let forecast = parse_int(&label[8..10]).ok_or_else(|| malformed(offset, "bad forecast field"))?;
    let level = parse_int(&label[10..12]).ok_or_else(|| malformed(offset, "bad level field"))?;
    if level < 0 {
        return Err(malformed(offset, "negative level number"));
    }

    let keyword = [label[14], label[15], label[16], label[17]];
    let exponent =
        parse_int(&label[18..22]).ok_or_else(|| malformed(offset, "bad exponent field"))?;
    let first_value =
        parse_real(&label[36..50]).ok_or_else(|| malformed(offset, "bad first-value field"))?;

    Ok(RecordLabel {
        time_code,
        forecast,
        level: level as usize,
        keyword,
        exponent,
        first_value,
    })
}

fn malformed(offset: usize, reason: &str) -> ArchiveError {
    ArchiveError::MalformedLabel {
        offset,
        reason: reason.to_string(),
    }
}

/// Parse a space-padded ASCII integer field.
fn parse_int(field: &[u8]) -> Option<i32> {
    let text = std::str::from_utf8(field).ok()?.trim();
    if text.is_empty() {
        return Some(0);
    }
    text.parse().ok()
}

/// Parse a space-padded ASCII real field (Fortran-style `E` notation).
fn parse_real(field: &[u8]) -> Option<f64> {
    let text = std::str::from_utf8(field).ok()?.trim();
    text.parse().ok()
}
