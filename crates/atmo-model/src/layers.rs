//! 5-layer mass-overburden model fit.
//!
//! The vertical density profile is parameterized the way air-shower
//! simulators expect it: four exponential layers
//! `T(h) = a + b * exp(-h / c)` topped by one linear layer
//! `T(h) = a - b * h / c`, where `T` is the mass overburden [g cm⁻²]
//! above altitude `h`. Density is the negative altitude derivative, so
//! each exponential layer contributes `rho(h) = b / c * exp(-h / c)`.
//!
//! The fit works in CORSIKA units: altitude cm, density g cm⁻³,
//! overburden g cm⁻².

use serde::Serialize;
use tracing::debug;

use crate::constants::*;
use crate::error::{ModelError, ModelResult};
use crate::physics::DerivedProfile;

/// Sorted-profile indices of the internal layer boundaries.
pub const BOUNDARY_INDICES: [usize; 3] = [10, 17, 23];

/// Gauss-Newton iteration cap per layer.
const MAX_ITERATIONS: usize = 200;

/// Relative step size below which the scale-height iteration has
/// converged.
const STEP_TOLERANCE: f64 = 1.0e-12;

/// A fitted 5-layer atmosphere.
#[derive(Debug, Clone, Serialize)]
pub struct LayeredFit {
    /// Layer boundary altitudes [cm]: 0, the three fitted boundaries,
    /// and the 100 km top.
    pub boundaries_cm: [f64; 5],
    /// Overburden offsets a [g cm⁻²].
    pub offset: [f64; 5],
    /// Overburden amplitudes b [g cm⁻²].
    pub amplitude: [f64; 5],
    /// Scale heights c [cm] (c₅ is the linear layer's slope scale).
    pub scale_height: [f64; 5],
    /// Root-mean-square relative density residual over the fitted samples.
    pub rms_residual: f64,
}

impl LayeredFit {
    /// Index of the layer containing altitude `h_cm`.
    fn layer_for(&self, h_cm: f64) -> usize {
        for layer in 1..5 {
            if h_cm < self.boundaries_cm[layer] {
                return layer - 1;
            }
        }
        4
    }

    /// Mass overburden [g cm⁻²] above altitude `h_cm`.
    pub fn overburden(&self, h_cm: f64) -> f64 {
        let i = self.layer_for(h_cm);
        if i == 4 {
            self.offset[4] - self.amplitude[4] * h_cm / self.scale_height[4]
        } else {
            self.offset[i] + self.amplitude[i] * (-h_cm / self.scale_height[i]).exp()
        }
    }

    /// Air density [g cm⁻³] at altitude `h_cm`.
    pub fn density(&self, h_cm: f64) -> f64 {
        let i = self.layer_for(h_cm);
        if i == 4 {
            self.amplitude[4] / self.scale_height[4]
        } else {
            self.amplitude[i] / self.scale_height[i] * (-h_cm / self.scale_height[i]).exp()
        }
    }
}

/// Fit the 5-layer model to a derived profile.
///
/// Layers 1-3 are fitted bottom-up with density continuity enforced by
/// construction (each layer's amplitude is derived from the density the
/// previous layer predicts at the shared boundary). The synthetic top
/// layer is solved in closed form against the fixed 100 km overburden,
/// and the offsets are then back-propagated top-down so the overburden
/// is continuous at every boundary. The solve order is load-bearing:
/// each offset depends on the layer above it.
pub fn fit_layers(profile: &DerivedProfile) -> ModelResult<LayeredFit> {
    let h_cm: Vec<f64> = profile.altitude_km.iter().map(|h| h * 1.0e5).collect();
    let rho = &profile.density;

    let mut offset = [0.0; 5];
    let mut amplitude = [0.0; 5];
    let mut scale_height = [0.0; 5];

    // bottom-up scale heights for the three data layers
    let mut pin_h = h_cm[0];
    let mut pin_rho = rho[0];
    let mut segment_start = 0;
    for (layer, &boundary) in BOUNDARY_INDICES.iter().enumerate() {
        let heights = &h_cm[segment_start..=boundary];
        let densities = &rho[segment_start..=boundary];

        let seed = two_point_scale_height(
            layer,
            h_cm[segment_start],
            rho[segment_start],
            h_cm[boundary],
            rho[boundary],
        )?;
        let c = refine_scale_height(layer, heights, densities, pin_h, pin_rho, seed)?;

        scale_height[layer] = c;
        amplitude[layer] = pin_rho * c * (pin_h / c).exp();
        debug!(layer, scale_height_cm = c, "fitted layer scale height");

        // next layer pins to this layer's density at the shared boundary
        pin_rho *= (-(h_cm[boundary] - pin_h) / c).exp();
        pin_h = h_cm[boundary];
        segment_start = boundary;
    }

    // synthetic top layer: two-point scale height against the vacuum
    // floor, amplitude from boundary continuity, offset from the fixed
    // total overburden at 100 km
    let c4 = two_point_scale_height(3, pin_h, pin_rho, TOP_ALTITUDE_CM, TOP_DENSITY)?;
    scale_height[3] = c4;
    amplitude[3] = pin_rho * c4 * (pin_h / c4).exp();
    offset[3] = TOP_OVERBURDEN - amplitude[3] * (-TOP_ALTITUDE_CM / c4).exp();

    // linear tail above 100 km, continuous with layer 4 at the top
    amplitude[4] = LINEAR_LAYER_B;
    scale_height[4] = LINEAR_LAYER_C;
    offset[4] = TOP_OVERBURDEN + LINEAR_LAYER_B * TOP_ALTITUDE_CM / LINEAR_LAYER_C;

    // top-down offset propagation: overburden continuity at each boundary
    for layer in (0..3).rev() {
        let boundary = h_cm[BOUNDARY_INDICES[layer]];
        let above = offset[layer + 1]
            + amplitude[layer + 1] * (-boundary / scale_height[layer + 1]).exp();
        offset[layer] = above - amplitude[layer] * (-boundary / scale_height[layer]).exp();
    }

    let fit = LayeredFit {
        boundaries_cm: [
            0.0,
            h_cm[BOUNDARY_INDICES[0]],
            h_cm[BOUNDARY_INDICES[1]],
            h_cm[BOUNDARY_INDICES[2]],
            TOP_ALTITUDE_CM,
        ],
        offset,
        amplitude,
        scale_height,
        rms_residual: 0.0,
    };

    // quality metric over the fitted samples, anchors excluded: the
    // surface sample is matched exactly by construction and the 100 km
    // point is synthetic
    let mut sum_sq = 0.0;
    let mut count = 0usize;
    for i in 1..h_cm.len() {
        let relative = (fit.density(h_cm[i]) - rho[i]) / rho[i];
        sum_sq += relative * relative;
        count += 1;
    }
    let rms_residual = (sum_sq / count as f64).sqrt();
    debug!(rms_residual, "layered fit complete");

    Ok(LayeredFit {
        rms_residual,
        ..fit
    })
}

/// Closed-form scale height through two (altitude, density) points:
/// the slope of log-density between them.
fn two_point_scale_height(
    layer: usize,
    lower_cm: f64,
    lower_density: f64,
    upper_cm: f64,
    upper_density: f64,
) -> ModelResult<f64> {
    let degenerate = || ModelError::DegenerateSeed {
        layer,
        lower_cm,
        lower_density,
        upper_cm,
        upper_density,
    };

    if lower_density <= 0.0 || upper_density <= 0.0 {
        return Err(degenerate());
    }
    let log_ratio = (lower_density / upper_density).ln();
    if log_ratio == 0.0 || !log_ratio.is_finite() {
        return Err(degenerate());
    }
    let c = (upper_cm - lower_cm) / log_ratio;
    if !c.is_finite() || c <= 0.0 {
        return Err(degenerate());
    }
    Ok(c)
}

/// Refine one layer's scale height by nonlinear least squares.
///
/// The model is `rho(h) = rho_pin * exp(-(h - h_pin) / c)` - the
/// amplitude is not a free parameter, it follows from the pinned
/// boundary density, which is what keeps the layers continuous. A
/// single-parameter Gauss-Newton step with Levenberg damping and the
/// analytic Jacobian is enough.
fn refine_scale_height(
    layer: usize,
    heights: &[f64],
    densities: &[f64],
    pin_h: f64,
    pin_rho: f64,
    seed: f64,
) -> ModelResult<f64> {
    let sum_sq = |c: f64| -> f64 {
        heights
            .iter()
            .zip(densities)
            .map(|(&h, &rho)| {
                let r = pin_rho * (-(h - pin_h) / c).exp() - rho;
                r * r
            })
            .sum()
    };

    let mut c = seed;
    let mut damping = 1.0e-3;
    let mut best = sum_sq(c);

    for _ in 0..MAX_ITERATIONS {
        let mut jtj = 0.0;
        let mut jtr = 0.0;
        for (&h, &rho) in heights.iter().zip(densities) {
            let model = pin_rho * (-(h - pin_h) / c).exp();
            let residual = model - rho;
            let jacobian = model * (h - pin_h) / (c * c);
            jtj += jacobian * jacobian;
            jtr += jacobian * residual;
        }

        if !jtj.is_finite() || jtj <= f64::MIN_POSITIVE {
            return Err(ModelError::SingularFit {
                layer,
                scale_height_cm: c,
            });
        }

        let step = -jtr / (jtj * (1.0 + damping));
        if step.abs() <= STEP_TOLERANCE * c.abs() {
            return Ok(c);
        }

        let candidate = c + step;
        if candidate > 0.0 && sum_sq(candidate) < best {
            best = sum_sq(candidate);
            c = candidate;
            damping = (damping * 0.1).max(1.0e-12);
        } else {
            damping *= 10.0;
            if damping > 1.0e12 {
                return Err(ModelError::FitDiverged {
                    layer,
                    iterations: MAX_ITERATIONS,
                });
            }
        }
    }

    Err(ModelError::FitDiverged {
        layer,
        iterations: MAX_ITERATIONS,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A profile following a single exponential with 8 km scale height.
    fn exponential_profile() -> DerivedProfile {
        let altitudes_km: Vec<f64> = (0..24).map(|i| i as f64 * 26.0 / 23.0).collect();
        let density: Vec<f64> = altitudes_km
            .iter()
            .map(|h| 1.225e-3 * (-h / 8.0).exp())
            .collect();
        let refractivity: Vec<f64> = density.iter().map(|rho| rho * 2.2e3).collect();
        DerivedProfile {
            ground_km: altitudes_km[0],
            altitude_km: altitudes_km,
            density,
            refractivity,
        }
    }

    #[test]
    fn recovers_a_pure_exponential_atmosphere() {
        let fit = fit_layers(&exponential_profile()).unwrap();

        // all three data layers see the same scale height (8 km)
        for layer in 0..3 {
            assert!(
                (fit.scale_height[layer] - 8.0e5).abs() < 1.0,
                "layer {layer}: c = {}",
                fit.scale_height[layer]
            );
        }
        assert!(fit.rms_residual < 1.0e-6);
    }

    #[test]
    fn density_is_continuous_at_every_boundary() {
        let fit = fit_layers(&exponential_profile()).unwrap();

        for &boundary in &fit.boundaries_cm[1..4] {
            let below = fit.density(boundary - 1.0e-3);
            let above = fit.density(boundary + 1.0e-3);
            assert!(
                ((below - above) / below).abs() < 1.0e-6,
                "density jump at {boundary} cm: {below} vs {above}"
            );
        }
    }

    #[test]
    fn overburden_is_continuous_at_every_boundary() {
        let fit = fit_layers(&exponential_profile()).unwrap();

        for &boundary in &fit.boundaries_cm[1..] {
            let below = fit.overburden(boundary - 1.0e-6);
            let above = fit.overburden(boundary + 1.0e-6);
            assert!(
                ((below - above) / below).abs() < 1.0e-9,
                "overburden jump at {boundary} cm: {below} vs {above}"
            );
        }
    }

    #[test]
    fn top_overburden_is_pinned() {
        let fit = fit_layers(&exponential_profile()).unwrap();

        let layer4 = fit.offset[3] + fit.amplitude[3] * (-TOP_ALTITUDE_CM / fit.scale_height[3]).exp();
        assert!((layer4 - TOP_OVERBURDEN).abs() < 1.0e-12);
        // the linear tail agrees at the boundary
        assert!((fit.overburden(TOP_ALTITUDE_CM) - TOP_OVERBURDEN).abs() < 1.0e-12);
    }

    #[test]
    fn boundary_densities_round_trip() {
        let profile = exponential_profile();
        let fit = fit_layers(&profile).unwrap();

        // on exact-exponential input the fitted boundary densities match
        // the measured ones
        for &index in &BOUNDARY_INDICES {
            let h_cm = profile.altitude_km[index] * 1.0e5;
            let fitted = fit.density(h_cm);
            let measured = profile.density[index];
            assert!(
                ((fitted - measured) / measured).abs() < 1.0e-9,
                "boundary {index}: fitted {fitted}, measured {measured}"
            );
        }
    }

    #[test]
    fn equal_boundary_densities_are_degenerate() {
        let mut profile = exponential_profile();
        // flatten the first layer: identical densities give a zero
        // log-slope and no usable seed
        for i in 0..=10 {
            profile.density[i] = 1.0e-3;
        }
        let err = fit_layers(&profile).unwrap_err();
        assert!(matches!(err, ModelError::DegenerateSeed { layer: 0, .. }));
    }

    #[test]
    fn noisy_profile_reports_its_misfit() {
        let mut profile = exponential_profile();
        // 1% density perturbation on an interior sample
        profile.density[5] *= 1.01;
        let fit = fit_layers(&profile).unwrap();
        assert!(fit.rms_residual > 1.0e-4);
        assert!(fit.rms_residual < 1.0e-2);
    }
}
