//! Per-level physics: sounding measurements to altitude, density and
//! radio refractivity.

use serde::Serialize;

use gdas_archive::SoundingRecord;

use crate::constants::*;
use crate::error::{ModelError, ModelResult};

/// Quantities derived from one sounding, sorted by altitude ascending.
///
/// Parallel arrays of 24 entries. Altitudes are strictly monotonic; this
/// is enforced at construction.
#[derive(Debug, Clone, Serialize)]
pub struct DerivedProfile {
    /// Geometric altitude [km].
    pub altitude_km: Vec<f64>,
    /// Air density [g cm⁻³].
    pub density: Vec<f64>,
    /// Radio refractivity in working units (N-units / 100).
    pub refractivity: Vec<f64>,
    /// Geometric altitude of the surface level [km].
    pub ground_km: f64,
}

impl DerivedProfile {
    /// Number of levels.
    pub fn len(&self) -> usize {
        self.altitude_km.len()
    }

    /// True when the profile holds no levels.
    pub fn is_empty(&self) -> bool {
        self.altitude_km.is_empty()
    }

    /// Highest tabulated altitude [km].
    pub fn top_km(&self) -> f64 {
        self.altitude_km.last().copied().unwrap_or_default()
    }
}

/// Derive altitude, density and refractivity for every level of a
/// sounding. Pure function; fails on non-physical input.
pub fn derive_profile(sounding: &SoundingRecord, latitude_deg: f64) -> ModelResult<DerivedProfile> {
    let phi = latitude_deg.to_radians();

    let mut entries: Vec<(f64, f64, f64)> = Vec::with_capacity(sounding.levels().len());
    for (level, sample) in sounding.levels().iter().enumerate() {
        if sample.temperature <= 0.0 {
            return Err(ModelError::NonPositiveTemperature {
                level,
                kelvin: sample.temperature,
            });
        }

        let altitude_km = geometric_altitude_m(sample.geopotential, phi) / 1000.0;
        let p_wet = vapor_pressure_pa(sample.temperature, sample.humidity);
        let p_dry = sample.pressure - p_wet;
        let density = air_density(sample.pressure, p_wet, sample.temperature);
        let refractivity = refractivity(p_dry / 100.0, p_wet / 100.0, sample.temperature);

        entries.push((altitude_km, density, refractivity));
    }

    let ground_km = entries[0].0;
    entries.sort_by(|a, b| a.0.total_cmp(&b.0));

    for (position, pair) in entries.windows(2).enumerate() {
        if pair[1].0 <= pair[0].0 {
            return Err(ModelError::NonMonotonicAltitude {
                position: position + 1,
                altitudes_km: entries.iter().map(|e| e.0).collect(),
            });
        }
    }

    Ok(DerivedProfile {
        altitude_km: entries.iter().map(|e| e.0).collect(),
        density: entries.iter().map(|e| e.1).collect(),
        refractivity: entries.iter().map(|e| e.2).collect(),
        ground_km,
    })
}

/// Geopotential height [m] to geometric altitude [m] at geodetic latitude
/// `phi` [rad].
pub fn geometric_altitude_m(geopotential_m: f64, phi: f64) -> f64 {
    let cos2 = (2.0 * phi).cos();
    (1.0 + ALTITUDE_K1 * cos2) * geopotential_m
        + (1.0 + ALTITUDE_K2 * cos2) * geopotential_m * geopotential_m / EFFECTIVE_EARTH_RADIUS
}

/// Partial pressure of water vapor [Pa] from the Magnus formula, with
/// separate coefficient sets above and below freezing.
pub fn vapor_pressure_pa(temperature_k: f64, humidity_percent: f64) -> f64 {
    let celsius = temperature_k - 273.15;
    let (a, b) = if celsius >= 0.0 { MAGNUS_WATER } else { MAGNUS_ICE };
    let saturation_hpa = MAGNUS_SCALE_HPA * 10.0_f64.powf(a * celsius / (b + celsius));
    humidity_percent / 100.0 * saturation_hpa * 100.0
}

/// Air density [g cm⁻³] from the ideal-gas law with a dry-air / water
/// vapor / CO₂ molar-mass mixture.
pub fn air_density(pressure_pa: f64, vapor_pa: f64, temperature_k: f64) -> f64 {
    let x_wet = vapor_pa / pressure_pa;
    let x_dry = 1.0 - x_wet - CO2_VOLUME_FRACTION;
    let molar_mass = x_dry * MOLAR_MASS_DRY_AIR
        + x_wet * MOLAR_MASS_WATER
        + CO2_VOLUME_FRACTION * MOLAR_MASS_CO2;
    let kg_per_m3 = pressure_pa * molar_mass / (GAS_CONSTANT * temperature_k);
    kg_per_m3 * 1e-3
}

/// Radio refractivity in working units (N-units / 100); pressures in hPa.
pub fn refractivity(p_dry_hpa: f64, p_wet_hpa: f64, temperature_k: f64) -> f64 {
    (REFRACTIVITY_K1 * p_dry_hpa / temperature_k
        + REFRACTIVITY_K2 * p_wet_hpa / temperature_k
        + REFRACTIVITY_K3 * p_wet_hpa / (temperature_k * temperature_k))
        / 100.0
}
