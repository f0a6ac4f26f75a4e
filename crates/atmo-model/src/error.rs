//! Error types for profile derivation, fitting and interpolation.

use thiserror::Error;

/// Result type alias using ModelError.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while turning a sounding into a fitted profile.
///
/// Numerical failures carry the full offending value tables so a bad
/// sounding can be diagnosed post-mortem without re-running.
#[derive(Debug, Error)]
pub enum ModelError {
    // === Physical validity ===
    #[error("level {level} has non-positive absolute temperature {kelvin} K")]
    NonPositiveTemperature { level: usize, kelvin: f64 },

    #[error(
        "altitudes are not strictly monotonic after sorting \
         (position {position}): {altitudes_km:?}"
    )]
    NonMonotonicAltitude {
        position: usize,
        altitudes_km: Vec<f64>,
    },

    // === Numerical fit ===
    #[error("refractivity spline failed: {reason}")]
    SplineFailure {
        reason: String,
        altitudes_km: Vec<f64>,
        refractivities: Vec<f64>,
    },

    #[error(
        "layer {layer} two-point seed is degenerate: \
         ({lower_cm} cm, {lower_density} g/cm3) vs ({upper_cm} cm, {upper_density} g/cm3)"
    )]
    DegenerateSeed {
        layer: usize,
        lower_cm: f64,
        lower_density: f64,
        upper_cm: f64,
        upper_density: f64,
    },

    #[error("layer {layer} normal equation is singular at c = {scale_height_cm} cm")]
    SingularFit { layer: usize, scale_height_cm: f64 },

    #[error("layer {layer} fit did not converge within {iterations} iterations")]
    FitDiverged { layer: usize, iterations: usize },
}
