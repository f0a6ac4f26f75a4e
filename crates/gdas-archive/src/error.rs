//! Error types for GDAS archive decoding.

use thiserror::Error;

/// Result type alias for archive decoding.
pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// Errors raised while decoding a packed sounding archive.
///
/// Every variant carries enough context (byte offsets, missing-field lists)
/// to diagnose a bad archive without re-running with extra instrumentation.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("index record marker not found in {searched}-byte buffer")]
    MissingIndex { searched: usize },

    #[error("archive truncated at offset {offset}: {needed} more bytes required")]
    Truncated { offset: usize, needed: usize },

    #[error("malformed record label at offset {offset}: {reason}")]
    MalformedLabel { offset: usize, reason: String },

    #[error("time code {time_code} not present in archive (searched from offset {offset})")]
    TimeNotFound { time_code: String, offset: usize },

    #[error(
        "incomplete sounding for time code {time_code}: \
         {missing:?} still missing after scanning {scanned} records"
    )]
    FieldsMissing {
        time_code: String,
        scanned: usize,
        missing: Vec<String>,
    },

    #[error("grid cell ({ix}, {iy}) outside {nx}x{ny} grid")]
    CellOutOfRange {
        ix: usize,
        iy: usize,
        nx: usize,
        ny: usize,
    },
}
