//! Differential byte-grid decoding.
//!
//! Packed payloads store one unsigned byte per grid cell. Each byte is a
//! centered delta from the previously reconstructed cell:
//!
//! ```text
//! value = previous + (byte - 127) / 2^(7 - exponent)
//! ```
//!
//! The scan is row-major. The first cell of each row carries over from the
//! first cell of the previous row (not from the previous row's last cell),
//! and the very first cell starts from the label's first-value field.
//! Reconstruction is inherently sequential; the whole field must be decoded
//! before any cell can be read.

use crate::error::{ArchiveError, ArchiveResult};

/// A fully reconstructed 2-D field for one variable at one level.
#[derive(Debug, Clone)]
pub struct GridField {
    nx: usize,
    ny: usize,
    values: Vec<f64>,
}

impl GridField {
    /// Value at column `ix` (longitude index), row `iy` (latitude index).
    pub fn get(&self, ix: usize, iy: usize) -> Option<f64> {
        if ix >= self.nx || iy >= self.ny {
            return None;
        }
        Some(self.values[iy * self.nx + ix])
    }

    /// Grid dimensions as (nx, ny).
    pub fn dims(&self) -> (usize, usize) {
        (self.nx, self.ny)
    }
}

/// Reconstruct a full field from its packed payload.
///
/// `offset` is the payload's position in the archive, used only for error
/// reporting.
pub fn decode_field(
    packed: &[u8],
    nx: usize,
    ny: usize,
    exponent: i32,
    first_value: f64,
    offset: usize,
) -> ArchiveResult<GridField> {
    let cells = nx * ny;
    if packed.len() < cells {
        return Err(ArchiveError::Truncated {
            offset,
            needed: cells - packed.len(),
        });
    }

    let scale = 2.0_f64.powi(7 - exponent);
    let mut values = vec![0.0; cells];
    let mut previous = first_value;

    for iy in 0..ny {
        for ix in 0..nx {
            let byte = packed[iy * nx + ix] as f64;
            let value = previous + (byte - 127.0) / scale;
            values[iy * nx + ix] = value;
            previous = value;
        }
        // row-start carry: the next row chains from this row's first cell
        previous = values[iy * nx];
    }

    Ok(GridField { nx, ny, values })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_cell_seeds_from_first_value() {
        // exponent 7 -> scale 1, byte 127 -> delta 0
        let field = decode_field(&[127], 1, 1, 7, 42.5, 0).unwrap();
        assert_eq!(field.get(0, 0), Some(42.5));
    }

    #[test]
    fn deltas_chain_along_a_row() {
        // deltas +1, +2, -3 from a first value of 10
        let packed = [127, 128, 129, 124];
        let field = decode_field(&packed, 4, 1, 7, 10.0, 0).unwrap();
        assert_eq!(field.get(0, 0), Some(10.0));
        assert_eq!(field.get(1, 0), Some(11.0));
        assert_eq!(field.get(2, 0), Some(13.0));
        assert_eq!(field.get(3, 0), Some(10.0));
    }

    #[test]
    fn row_start_carries_from_previous_row_start() {
        // 2x2 grid: row 0 is [5, 105]; row 1 must chain from 5, not 105.
        let packed = [127, 227, 137, 127];
        let field = decode_field(&packed, 2, 2, 7, 5.0, 0).unwrap();
        assert_eq!(field.get(0, 0), Some(5.0));
        assert_eq!(field.get(1, 0), Some(105.0));
        assert_eq!(field.get(0, 1), Some(15.0));
        assert_eq!(field.get(1, 1), Some(15.0));
    }

    #[test]
    fn exponent_scales_deltas() {
        // exponent 9 -> scale 2^-2 -> each count is worth 4
        let packed = [127, 128];
        let field = decode_field(&packed, 2, 1, 9, 0.0, 0).unwrap();
        assert_eq!(field.get(1, 0), Some(4.0));

        // exponent 5 -> scale 2^2 -> each count is worth 0.25
        let field = decode_field(&packed, 2, 1, 5, 0.0, 0).unwrap();
        assert_eq!(field.get(1, 0), Some(0.25));
    }

    #[test]
    fn short_payload_is_an_error() {
        let err = decode_field(&[127, 127], 2, 2, 7, 0.0, 100).unwrap_err();
        assert!(matches!(
            err,
            ArchiveError::Truncated {
                offset: 100,
                needed: 2
            }
        ));
    }

    #[test]
    fn out_of_range_cell_is_none() {
        let field = decode_field(&[127], 1, 1, 7, 0.0, 0).unwrap();
        assert_eq!(field.get(1, 0), None);
        assert_eq!(field.get(0, 1), None);
    }
}
