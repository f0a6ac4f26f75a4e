//! Synthetic sounding-archive builder.
//!
//! Emits byte-exact ARL-style archives (50-byte ASCII labels, an `INDX`
//! record with extended header, differentially packed payloads) so decoder
//! tests can assert against hand-chosen grid values.

/// Length of the ASCII label preceding every payload.
const LABEL_LEN: usize = 50;

/// Length of the index record's extended header.
const EXTENDED_HEADER_LEN: usize = 108;

struct FieldSpec {
    keyword: String,
    level: usize,
    values: Vec<f64>,
}

/// Builds a single-time-block synthetic archive.
pub struct ArlArchiveBuilder {
    nx: usize,
    ny: usize,
    time_code: String,
    fields: Vec<FieldSpec>,
}

impl ArlArchiveBuilder {
    /// Create a builder for an `nx` x `ny` grid. The grid must hold at
    /// least the 108-byte extended index header.
    pub fn new(nx: usize, ny: usize) -> Self {
        assert!(
            nx * ny >= EXTENDED_HEADER_LEN,
            "grid too small for the index header"
        );
        Self {
            nx,
            ny,
            time_code: "25010100".to_string(),
            fields: Vec::new(),
        }
    }

    /// Override the default `yymmddhh` time code.
    pub fn with_time_code(mut self, time_code: &str) -> Self {
        assert_eq!(time_code.len(), 8, "time code must be yymmddhh");
        self.time_code = time_code.to_string();
        self
    }

    /// Add a field with explicit per-cell values (row-major, ny rows of nx).
    pub fn with_field(mut self, keyword: &str, level: usize, values: Vec<f64>) -> Self {
        assert_eq!(values.len(), self.nx * self.ny, "field size mismatch");
        self.fields.push(FieldSpec {
            keyword: keyword.to_string(),
            level,
            values,
        });
        self
    }

    /// Add a field holding the same value in every cell.
    pub fn with_constant_field(self, keyword: &str, level: usize, value: f64) -> Self {
        let values = vec![value; self.nx * self.ny];
        self.with_field(keyword, level, values)
    }

    /// Serialize the archive: index record first, then every field in
    /// insertion order.
    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.push_index_record(&mut out);
        for field in &self.fields {
            self.push_data_record(&mut out, field);
        }
        out
    }

    fn push_index_record(&self, out: &mut Vec<u8>) {
        push_label(out, &self.time_code, 0, "INDX", 0, 0.0);

        let mut header = Vec::with_capacity(EXTENDED_HEADER_LEN);
        header.extend_from_slice(b"GDA1  0 0");
        for _ in 0..12 {
            header.extend_from_slice(format!("{:>7.1}", 0.0).as_bytes());
        }
        header.extend_from_slice(format!("{:>3}{:>3}{:>3}", self.nx, self.ny, 24).as_bytes());
        header.extend_from_slice(b" 2 108");
        assert_eq!(header.len(), EXTENDED_HEADER_LEN);

        // the index payload occupies a full record slot; pad with spaces
        header.resize(self.nx * self.ny, b' ');
        out.extend_from_slice(&header);
    }

    fn push_data_record(&self, out: &mut Vec<u8>, field: &FieldSpec) {
        let (exponent, first, packed) = pack_field(&field.values, self.nx, self.ny);
        push_label(out, &self.time_code, field.level, &field.keyword, exponent, first);
        out.extend_from_slice(&packed);
    }

    /// Total length of one record (label + payload).
    pub fn record_len(&self) -> usize {
        LABEL_LEN + self.nx * self.ny
    }
}

fn push_label(
    out: &mut Vec<u8>,
    time_code: &str,
    level: usize,
    keyword: &str,
    exponent: i32,
    first: f64,
) {
    out.extend_from_slice(time_code.as_bytes());
    out.extend_from_slice(b" 0");
    out.extend_from_slice(format!("{level:>2}").as_bytes());
    out.extend_from_slice(b"99");
    out.extend_from_slice(format!("{keyword:<4}").as_bytes());
    out.extend_from_slice(format!("{exponent:>4}").as_bytes());
    let precision = 1.0 / 2.0_f64.powi(7 - exponent);
    out.extend_from_slice(format!("{:>14}", format!("{precision:.7E}")).as_bytes());
    out.extend_from_slice(format!("{:>14}", format!("{first:.7E}")).as_bytes());
}

/// Differentially pack a field, mirroring the decoder's scan order: deltas
/// chain along each row and the first cell of a row chains from the first
/// cell of the previous row. Returns (exponent, first value, payload).
fn pack_field(values: &[f64], nx: usize, ny: usize) -> (i32, f64, Vec<u8>) {
    let exponent = choose_exponent(values, nx, ny);
    let scale = 2.0_f64.powi(7 - exponent);

    let first = values[0];
    let mut packed = Vec::with_capacity(nx * ny);
    let mut previous = first;
    let mut row_first = first;

    for iy in 0..ny {
        for ix in 0..nx {
            let target = values[iy * nx + ix];
            let counts = ((target - previous) * scale).round().clamp(-127.0, 128.0);
            packed.push((counts + 127.0) as u8);
            let reconstructed = previous + counts / scale;
            if ix == 0 {
                row_first = reconstructed;
            }
            previous = reconstructed;
        }
        previous = row_first;
    }

    (exponent, first, packed)
}

/// Smallest exponent whose scale keeps every scan-order delta within one
/// byte.
fn choose_exponent(values: &[f64], nx: usize, ny: usize) -> i32 {
    let mut max_delta = 0.0_f64;
    let mut previous = values[0];
    let mut row_first = values[0];
    for iy in 0..ny {
        for ix in 0..nx {
            let value = values[iy * nx + ix];
            max_delta = max_delta.max((value - previous).abs());
            if ix == 0 {
                row_first = value;
            }
            previous = value;
        }
        previous = row_first;
    }

    for exponent in 0..=30 {
        if max_delta * 2.0_f64.powi(7 - exponent) <= 126.0 {
            return exponent;
        }
    }
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_are_fixed_length() {
        let builder = ArlArchiveBuilder::new(16, 8)
            .with_constant_field("PRSS", 0, 1013.0)
            .with_constant_field("TEMP", 1, 287.0);
        let archive = builder.build();
        assert_eq!(archive.len(), 3 * builder.record_len());
    }

    #[test]
    fn labels_carry_the_time_code() {
        let builder = ArlArchiveBuilder::new(16, 8).with_time_code("24070612");
        let archive = builder.build();
        assert_eq!(&archive[0..8], b"24070612");
        assert_eq!(&archive[14..18], b"INDX");
    }

    #[test]
    fn constant_fields_pack_to_zero_deltas() {
        let (exponent, first, packed) = pack_field(&[5.5; 128], 16, 8);
        assert_eq!(exponent, 0);
        assert_eq!(first, 5.5);
        assert!(packed.iter().all(|&b| b == 127));
    }

    #[test]
    fn integer_gradients_pack_exactly() {
        // row-major 4x2: value = 10*iy + ix
        let values: Vec<f64> = (0..2)
            .flat_map(|iy| (0..4).map(move |ix| (10 * iy + ix) as f64))
            .collect();
        let (exponent, first, packed) = pack_field(&values, 4, 2);
        let scale = 2.0_f64.powi(7 - exponent);

        // replay the decode to confirm losslessness
        let mut decoded = vec![0.0; 8];
        let mut previous = first;
        for iy in 0..2 {
            for ix in 0..4 {
                let value = previous + (packed[iy * 4 + ix] as f64 - 127.0) / scale;
                decoded[iy * 4 + ix] = value;
                previous = value;
            }
            previous = decoded[iy * 4];
        }
        for (d, v) in decoded.iter().zip(values.iter()) {
            assert!((d - v).abs() < 1e-12, "decoded {d} != packed {v}");
        }
    }
}
