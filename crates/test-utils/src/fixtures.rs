//! Plausible atmosphere fixtures.

/// Standard-atmosphere-like values for the 23 isobaric levels
/// (1000..20 hPa): geopotential heights [m], temperatures [K] and relative
/// humidities [%]. Heights follow the barometric formula, temperatures the
/// standard lapse rate with an isothermal stratosphere.
pub fn isa_levels() -> ([f64; 23], [f64; 23], [f64; 23]) {
    let heights = [
        111.0, 324.0, 540.0, 762.0, 988.0, 1457.0, 1949.0, 2466.0, 3012.0, 3591.0, 4206.0, 4865.0,
        5574.0, 6344.0, 7185.0, 8117.0, 9164.0, 10363.0, 11784.0, 13608.0, 16180.0, 20576.0,
        26481.0,
    ];
    let temperatures = [
        287.4, 286.0, 284.6, 283.2, 281.7, 278.7, 275.5, 272.1, 268.6, 264.8, 260.8, 256.5, 251.9,
        246.9, 241.4, 235.4, 228.6, 220.8, 216.65, 216.65, 216.65, 217.6, 221.5,
    ];
    let humidities = [
        50.0, 50.0, 50.0, 50.0, 50.0, 50.0, 50.0, 50.0, 50.0, 50.0, 50.0, 50.0, 50.0, 50.0, 50.0,
        50.0, 50.0, 50.0, 50.0, 20.0, 20.0, 20.0, 20.0,
    ];
    (heights, temperatures, humidities)
}
