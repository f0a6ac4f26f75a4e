//! Atmospheric profile modeling.
//!
//! Turns a decoded sounding into the data the downstream air-shower
//! simulator consumes: per-level physics (geometric altitude, density,
//! radio refractivity), a 5-layer exponential mass-overburden fit with
//! boundary continuity enforced by construction, a uniformly resampled
//! refractive-index profile with an underground extrapolation segment,
//! and the text serialization of all of it.
//!
//! Stages compose strictly forward on immutable values:
//!
//! ```text
//! SoundingRecord -> DerivedProfile -> LayeredFit -> Profile -> String
//! ```

pub mod constants;
pub mod error;
pub mod interpolate;
pub mod layers;
pub mod physics;
pub mod writer;

pub use error::{ModelError, ModelResult};
pub use interpolate::{resample, Profile, ProfileSample, SamplingOptions};
pub use layers::{fit_layers, LayeredFit, BOUNDARY_INDICES};
pub use physics::{derive_profile, DerivedProfile};
pub use writer::format_profile;
