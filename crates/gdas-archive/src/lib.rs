//! GDAS sounding archive decoding.
//!
//! This crate decodes the packed archive format used by the GDAS global
//! reanalysis product: fixed-layout ASCII record labels interleaved with
//! differentially packed binary payloads. It extracts exactly the fields
//! needed to build one vertical sounding (pressure, geopotential height,
//! temperature, relative humidity at 24 levels) at one grid cell and time
//! code; it is not a general-purpose format library.

pub mod error;
pub mod index;
pub mod label;
pub mod sounding;
pub mod unpack;

pub use error::{ArchiveError, ArchiveResult};
pub use index::{find_index, IndexHeader};
pub use label::{parse_label, RecordLabel, VarKeyword, LABEL_LEN};
pub use sounding::{ArchiveReader, LevelSample, SoundingRecord, NUM_LEVELS, STD_LEVELS_HPA};
pub use unpack::{decode_field, GridField};
