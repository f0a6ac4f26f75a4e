//! Shared test utilities for the atmprof workspace.
//!
//! Provides a synthetic sounding-archive builder and plausible atmosphere
//! fixtures so parser and pipeline tests do not depend on real
//! (multi-hundred-megabyte) archive downloads.
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```

pub mod arl;
pub mod fixtures;

pub use arl::ArlArchiveBuilder;
pub use fixtures::isa_levels;
