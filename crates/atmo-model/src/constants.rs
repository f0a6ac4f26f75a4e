//! Physical constants for the profile derivation and the layered fit.

/// Molar gas constant [J mol⁻¹ K⁻¹].
pub const GAS_CONSTANT: f64 = 8.31446;

/// Molar mass of dry air [kg mol⁻¹].
pub const MOLAR_MASS_DRY_AIR: f64 = 28.9644e-3;

/// Molar mass of water vapor [kg mol⁻¹].
pub const MOLAR_MASS_WATER: f64 = 18.016e-3;

/// Molar mass of carbon dioxide [kg mol⁻¹].
pub const MOLAR_MASS_CO2: f64 = 44.01e-3;

/// CO₂ volume fraction of the model atmosphere (385 ppm).
pub const CO2_VOLUME_FRACTION: f64 = 385.0e-6;

/// Geopotential-to-geometric conversion, linear latitude term.
pub const ALTITUDE_K1: f64 = 0.002644;

/// Geopotential-to-geometric conversion, quadratic latitude term.
pub const ALTITUDE_K2: f64 = 0.0089;

/// Effective Earth radius of the quadratic altitude term [m].
pub const EFFECTIVE_EARTH_RADIUS: f64 = 6_245_000.0;

/// Magnus saturation-pressure scale [hPa].
pub const MAGNUS_SCALE_HPA: f64 = 6.1078;

/// Magnus coefficients over water (t ≥ 0 °C): (a, b [°C]).
pub const MAGNUS_WATER: (f64, f64) = (7.5, 237.3);

/// Magnus coefficients over ice (t < 0 °C): (a, b [°C]).
pub const MAGNUS_ICE: (f64, f64) = (9.5, 265.5);

/// Radio refractivity, dry-pressure term [K hPa⁻¹].
pub const REFRACTIVITY_K1: f64 = 77.689;

/// Radio refractivity, wet-pressure term [K hPa⁻¹].
pub const REFRACTIVITY_K2: f64 = 71.2952;

/// Radio refractivity, wet-pressure quadratic-temperature term [K² hPa⁻¹].
pub const REFRACTIVITY_K3: f64 = 375_463.0;

/// Top boundary of the parameterized atmosphere [cm] (100 km).
pub const TOP_ALTITUDE_CM: f64 = 1.0e7;

/// Mass overburden pinned at the top boundary [g cm⁻²].
pub const TOP_OVERBURDEN: f64 = 0.01128292;

/// Assumed near-vacuum density at the top boundary [g cm⁻³].
pub const TOP_DENSITY: f64 = 1.0e-9;

/// Linear top-layer amplitude b₅ [g cm⁻²].
pub const LINEAR_LAYER_B: f64 = 1.0;

/// Linear top-layer scale c₅ [cm].
pub const LINEAR_LAYER_C: f64 = 1.0e9;
