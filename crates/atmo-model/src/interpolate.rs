//! Refractivity interpolation and resampling.
//!
//! Refractivity falls off near-exponentially with altitude, so the
//! interpolation runs on log-refractivity: a degree-1 spline is fitted to
//! `ln(N)` vs altitude and evaluated by exponentiation. This keeps the
//! resampled values positive and behaves sanely when extrapolated past
//! either end of the data.

use serde::Serialize;

use crate::error::{ModelError, ModelResult};
use crate::layers::LayeredFit;
use crate::physics::DerivedProfile;

/// One resampled profile point.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ProfileSample {
    /// Altitude [m].
    pub altitude_m: f64,
    /// Radio refractive index (>= 1).
    pub refractive_index: f64,
}

/// The resampled profile: underground extrapolation first, then the
/// above-ground range, altitude strictly increasing throughout.
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub samples: Vec<ProfileSample>,
}

/// Resampling controls.
#[derive(Debug, Clone)]
pub struct SamplingOptions {
    /// Grid step [m].
    pub step_m: f64,
    /// Lowest altitude the underground grid should reach [m]. The actual
    /// floor is pushed down to the nearest step-aligned point below
    /// ground.
    pub min_height_m: f64,
    /// Highest altitude to tabulate [m]. Defaults to the top of the
    /// sounding data; anything higher is extrapolation the caller asked
    /// for.
    pub max_height_m: Option<f64>,
}

impl Default for SamplingOptions {
    fn default() -> Self {
        Self {
            step_m: 10.0,
            min_height_m: 0.0,
            max_height_m: None,
        }
    }
}

/// Degree-1 spline over (altitude [km], ln refractivity).
#[derive(Debug)]
struct LogLinearSpline {
    altitudes_km: Vec<f64>,
    log_values: Vec<f64>,
}

impl LogLinearSpline {
    fn new(altitudes_km: &[f64], refractivities: &[f64]) -> ModelResult<Self> {
        let failure = |reason: &str| ModelError::SplineFailure {
            reason: reason.to_string(),
            altitudes_km: altitudes_km.to_vec(),
            refractivities: refractivities.to_vec(),
        };

        if altitudes_km.len() != refractivities.len() {
            return Err(failure("altitude and refractivity tables differ in length"));
        }
        if altitudes_km.len() < 2 {
            return Err(failure("fewer than two knots"));
        }

        // the caller's table is usually sorted already, but geometric
        // conversion does not guarantee monotonic input order
        let mut knots: Vec<(f64, f64)> = altitudes_km
            .iter()
            .copied()
            .zip(refractivities.iter().copied())
            .collect();
        knots.sort_by(|a, b| a.0.total_cmp(&b.0));

        for pair in knots.windows(2) {
            if pair[1].0 <= pair[0].0 {
                return Err(failure("duplicate altitude knot"));
            }
        }

        let mut log_values = Vec::with_capacity(knots.len());
        for &(h, n) in &knots {
            if !n.is_finite() || n <= 0.0 {
                return Err(failure("refractivity must be positive and finite"));
            }
            if !h.is_finite() {
                return Err(failure("altitude must be finite"));
            }
            log_values.push(n.ln());
        }

        Ok(Self {
            altitudes_km: knots.iter().map(|k| k.0).collect(),
            log_values,
        })
    }

    /// Refractivity at `h_km`; linear in log space, end segments extend
    /// beyond the data range.
    fn eval(&self, h_km: f64) -> f64 {
        let n = self.altitudes_km.len();
        let segment = match self
            .altitudes_km
            .binary_search_by(|knot| knot.total_cmp(&h_km))
        {
            Ok(i) => i.min(n - 2),
            Err(0) => 0,
            Err(i) => (i - 1).min(n - 2),
        };

        let h0 = self.altitudes_km[segment];
        let h1 = self.altitudes_km[segment + 1];
        let l0 = self.log_values[segment];
        let l1 = self.log_values[segment + 1];
        let t = (h_km - h0) / (h1 - h0);
        (l0 + t * (l1 - l0)).exp()
    }
}

/// Resample the refractive-index profile on a uniform altitude grid.
///
/// Underground points scale the ground refractivity by the density ratio
/// of the fitted first layer, which is why this stage runs after
/// [`crate::layers::fit_layers`]. The underground grid is phase-aligned
/// with the ground point so the two segments join without a seam.
pub fn resample(
    profile: &DerivedProfile,
    fit: &LayeredFit,
    options: &SamplingOptions,
) -> ModelResult<Profile> {
    let spline = LogLinearSpline::new(&profile.altitude_km, &profile.refractivity)?;

    let step = options.step_m;
    let ground_m = profile.ground_km * 1000.0;
    let top_m = options
        .max_height_m
        .unwrap_or_else(|| profile.top_km() * 1000.0);

    let ground_refractivity = spline.eval(profile.ground_km);
    let c1_cm = fit.scale_height[0];

    let span_below = ground_m - options.min_height_m;
    let steps_below = if span_below > 0.0 {
        (span_below / step).ceil() as usize
    } else {
        0
    };
    let floor_m = ground_m - steps_below as f64 * step;

    let steps_above = if top_m > ground_m {
        ((top_m - ground_m) / step + 1.0e-9).floor() as usize
    } else {
        0
    };

    let mut samples = Vec::with_capacity(steps_below + steps_above + 1);

    // underground: ground refractivity scaled by the layer-1 density
    // ratio exp(-(h - ground) / c1); the b/c amplitude cancels
    for k in 0..steps_below {
        let h_m = floor_m + k as f64 * step;
        let ratio = (-(h_m - ground_m) * 100.0 / c1_cm).exp();
        samples.push(ProfileSample {
            altitude_m: h_m,
            refractive_index: index_from_refractivity(ground_refractivity * ratio),
        });
    }

    // ground and above, from the spline
    for k in 0..=steps_above {
        let h_m = ground_m + k as f64 * step;
        samples.push(ProfileSample {
            altitude_m: h_m,
            refractive_index: index_from_refractivity(spline.eval(h_m / 1000.0)),
        });
    }

    Ok(Profile { samples })
}

/// Working refractivity (N-units / 100) to refractive index.
fn index_from_refractivity(refractivity: f64) -> f64 {
    1.0 + 1.0e-4 * refractivity
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::fit_layers;

    /// Exponential atmosphere with an elevated ground (1.405 km).
    fn test_profile() -> DerivedProfile {
        let altitudes_km: Vec<f64> = (0..24).map(|i| 1.405 + i as f64 * 26.0 / 23.0).collect();
        let density: Vec<f64> = altitudes_km
            .iter()
            .map(|h| 1.225e-3 * (-h / 8.0).exp())
            .collect();
        let refractivity: Vec<f64> = altitudes_km.iter().map(|h| 3.2 * (-h / 8.0).exp()).collect();
        DerivedProfile {
            ground_km: altitudes_km[0],
            altitude_km: altitudes_km,
            density,
            refractivity,
        }
    }

    #[test]
    fn log_linear_spline_is_exact_on_exponentials() {
        let profile = test_profile();
        let spline =
            LogLinearSpline::new(&profile.altitude_km, &profile.refractivity).unwrap();

        // knots reproduce exactly
        for (h, n) in profile.altitude_km.iter().zip(&profile.refractivity) {
            assert!(((spline.eval(*h) - n) / n).abs() < 1.0e-12);
        }
        // interior points follow the exponential (linear in log space)
        let mid = 5.0;
        let expected = 3.2 * (-mid / 8.0_f64).exp();
        assert!(((spline.eval(mid) - expected) / expected).abs() < 1.0e-12);
        // extrapolation continues the end segments
        let below = spline.eval(0.0);
        let expected = 3.2;
        assert!(((below - expected) / expected).abs() < 1.0e-9);
    }

    #[test]
    fn duplicate_altitudes_carry_the_table_in_the_error() {
        let altitudes = vec![0.0, 1.0, 1.0, 2.0];
        let refractivities = vec![3.0, 2.5, 2.5, 2.0];
        let err = LogLinearSpline::new(&altitudes, &refractivities).unwrap_err();
        match err {
            ModelError::SplineFailure {
                altitudes_km,
                refractivities,
                ..
            } => {
                assert_eq!(altitudes_km.len(), 4);
                assert_eq!(refractivities.len(), 4);
            }
            other => panic!("expected SplineFailure, got {other:?}"),
        }
    }

    #[test]
    fn non_positive_refractivity_is_rejected() {
        let err = LogLinearSpline::new(&[0.0, 1.0], &[3.0, 0.0]).unwrap_err();
        assert!(matches!(err, ModelError::SplineFailure { .. }));
    }

    #[test]
    fn grid_is_strictly_increasing_with_no_seam() {
        let profile = test_profile();
        let fit = fit_layers(&profile).unwrap();
        let options = SamplingOptions::default();
        let result = resample(&profile, &fit, &options).unwrap();

        let ground_m = profile.ground_km * 1000.0;
        for pair in result.samples.windows(2) {
            let gap = pair[1].altitude_m - pair[0].altitude_m;
            assert!(
                (gap - options.step_m).abs() < 1.0e-6,
                "gap {gap} at {}",
                pair[0].altitude_m
            );
        }
        // the ground altitude itself is on the grid
        assert!(result
            .samples
            .iter()
            .any(|s| (s.altitude_m - ground_m).abs() < 1.0e-6));
        // underground points stay at or above the step-aligned floor
        assert!(result.samples[0].altitude_m >= options.min_height_m - options.step_m);
        assert!(result.samples[0].altitude_m < ground_m);
    }

    #[test]
    fn underground_scales_with_the_first_layer_density() {
        let profile = test_profile();
        let fit = fit_layers(&profile).unwrap();
        let result = resample(&profile, &fit, &SamplingOptions::default()).unwrap();

        let ground_m = profile.ground_km * 1000.0;
        let ground_index = result
            .samples
            .iter()
            .position(|s| (s.altitude_m - ground_m).abs() < 1.0e-6)
            .unwrap();
        let ground_n = result.samples[ground_index].refractive_index - 1.0;

        let below = &result.samples[ground_index - 1];
        let ratio =
            ((ground_m - below.altitude_m) * 100.0 / fit.scale_height[0]).exp();
        let expected = ground_n * ratio;
        assert!(
            (((below.refractive_index - 1.0) - expected) / expected).abs() < 1.0e-9,
            "underground scaling mismatch"
        );
        // denser air below ground bends harder
        assert!(below.refractive_index > result.samples[ground_index].refractive_index);
    }

    #[test]
    fn refractive_index_never_drops_below_one() {
        let profile = test_profile();
        let fit = fit_layers(&profile).unwrap();
        let options = SamplingOptions {
            max_height_m: Some(50_000.0), // well past the data top
            ..SamplingOptions::default()
        };
        let result = resample(&profile, &fit, &options).unwrap();

        assert!(result.samples.iter().all(|s| s.refractive_index >= 1.0));
        let last = result.samples.last().unwrap();
        assert!((last.altitude_m - 50_000.0).abs() < options.step_m);
    }

    #[test]
    fn caller_can_cap_the_resampled_range() {
        let profile = test_profile();
        let fit = fit_layers(&profile).unwrap();
        let options = SamplingOptions {
            step_m: 20.0,
            min_height_m: 1000.0,
            max_height_m: Some(3000.0),
        };
        let result = resample(&profile, &fit, &options).unwrap();

        let first = result.samples.first().unwrap();
        let last = result.samples.last().unwrap();
        assert!(first.altitude_m >= 1000.0 - options.step_m);
        assert!(last.altitude_m <= 3000.0 + 1.0e-6);
    }
}
