//! Archive index record.
//!
//! The first record of every time block carries the keyword `INDX` and an
//! extended ASCII header in place of packed data. The extended header
//! starts right after the 50-byte label:
//!
//! ```text
//! Bytes   0-3: 4-character data source id
//! Bytes   4-6: forecast hour
//! Bytes   7-8: minutes
//! Bytes  9-92: twelve 7-character grid-definition reals
//! Bytes 93-95: nx, grid points along a parallel
//! Bytes 96-98: ny, grid points along a meridian
//! Bytes 99-101: nz, number of vertical levels
//! ```

use crate::error::{ArchiveError, ArchiveResult};
use crate::label::{KEYWORD_OFFSET, LABEL_LEN};

/// Marker token identifying the index record.
pub const INDEX_KEYWORD: &[u8; 4] = b"INDX";

/// Byte offset of nx within the extended header.
const DIMS_OFFSET: usize = 93;

/// Length of the extended header following the index label.
const EXTENDED_HEADER_LEN: usize = 108;

/// Grid geometry recovered from the archive index record.
#[derive(Debug, Clone, Copy)]
pub struct IndexHeader {
    /// Grid points along a parallel.
    pub nx: usize,
    /// Grid points along a meridian.
    pub ny: usize,
    /// Number of vertical levels (surface included).
    pub nz: usize,
    /// Byte offset of the index record's label. All records of the
    /// archive lie on a fixed stride from this base.
    pub offset: usize,
}

impl IndexHeader {
    /// Fixed length of every record: label plus one byte per grid cell.
    pub fn record_len(&self) -> usize {
        LABEL_LEN + self.nx * self.ny
    }
}

/// Locate the first index record and decode the grid dimensions.
pub fn find_index(buf: &[u8]) -> ArchiveResult<IndexHeader> {
    let marker = buf
        .windows(INDEX_KEYWORD.len())
        .position(|w| w == INDEX_KEYWORD)
        .ok_or(ArchiveError::MissingIndex {
            searched: buf.len(),
        })?;

    // The keyword sits 14 bytes into its label.
    if marker < KEYWORD_OFFSET {
        return Err(ArchiveError::MissingIndex {
            searched: buf.len(),
        });
    }
    let offset = marker - KEYWORD_OFFSET;

    let header_start = offset + LABEL_LEN;
    if buf.len() < header_start + EXTENDED_HEADER_LEN {
        return Err(ArchiveError::Truncated {
            offset: header_start,
            needed: header_start + EXTENDED_HEADER_LEN - buf.len(),
        });
    }
    let header = &buf[header_start..header_start + EXTENDED_HEADER_LEN];

    let nx = parse_dim(header, DIMS_OFFSET, offset, "nx")?;
    let ny = parse_dim(header, DIMS_OFFSET + 3, offset, "ny")?;
    let nz = parse_dim(header, DIMS_OFFSET + 6, offset, "nz")?;

    Ok(IndexHeader { nx, ny, nz, offset })
}

fn parse_dim(header: &[u8], at: usize, offset: usize, name: &str) -> ArchiveResult<usize> {
    let text = std::str::from_utf8(&header[at..at + 3])
        .ok()
        .map(str::trim)
        .unwrap_or("");
    match text.parse::<usize>() {
        Ok(v) if v > 0 => Ok(v),
        _ => Err(ArchiveError::MalformedLabel {
            offset,
            reason: format!("index header field {name} is not a positive integer"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthetic_index(nx: usize, ny: usize, nz: usize) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"2501010000 099INDX   0");
        buf.extend_from_slice(format!("{:>14}", "0.0000000E+00").as_bytes());
        buf.extend_from_slice(format!("{:>14}", "0.0000000E+00").as_bytes());
        // extended header
        buf.extend_from_slice(b"GDA1  0 0");
        for _ in 0..12 {
            buf.extend_from_slice(format!("{:>7.1}", 0.0).as_bytes());
        }
        buf.extend_from_slice(format!("{nx:>3}{ny:>3}{nz:>3}").as_bytes());
        buf.extend_from_slice(b" 2 108");
        buf
    }

    #[test]
    fn finds_grid_dimensions() {
        let buf = synthetic_index(360, 181, 24);
        let index = find_index(&buf).unwrap();
        assert_eq!(index.nx, 360);
        assert_eq!(index.ny, 181);
        assert_eq!(index.nz, 24);
        assert_eq!(index.offset, 0);
        assert_eq!(index.record_len(), LABEL_LEN + 360 * 181);
    }

    #[test]
    fn finds_index_past_leading_noise() {
        let mut buf = vec![0u8; 54];
        buf.extend_from_slice(&synthetic_index(16, 8, 24));
        let index = find_index(&buf).unwrap();
        assert_eq!(index.offset, 54);
    }

    #[test]
    fn missing_marker_is_an_error() {
        let err = find_index(b"no index record here").unwrap_err();
        assert!(matches!(err, ArchiveError::MissingIndex { searched: 20 }));
    }

    #[test]
    fn zero_dimension_is_rejected() {
        let buf = synthetic_index(0, 181, 24);
        let err = find_index(&buf).unwrap_err();
        assert!(matches!(err, ArchiveError::MalformedLabel { .. }));
    }
}
