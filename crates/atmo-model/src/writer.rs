//! Output serialization for the downstream shower simulator.
//!
//! Line-oriented text: a comment, the five layer-boundary altitudes in
//! centimeters, the a / b / c parameter rows, a column-header comment,
//! then one `altitude[m] refractive-index` line per profile sample.
//! Pure formatting; all numbers are derived upstream.

use crate::interpolate::Profile;
use crate::layers::LayeredFit;

/// Serialize a fitted atmosphere and its resampled profile.
///
/// `title` names the extraction (site, time code) in the header comment.
/// The same fit and profile always format to identical bytes.
pub fn format_profile(fit: &LayeredFit, profile: &Profile, title: &str) -> String {
    let mut out = String::new();

    out.push_str(&format!("# Atmospheric model {title}\n"));
    push_row(&mut out, &fit.boundaries_cm);
    push_row(&mut out, &fit.offset);
    push_row(&mut out, &fit.amplitude);
    push_row(&mut out, &fit.scale_height);
    out.push_str("# Altitude [m]   Refractive index\n");
    for sample in &profile.samples {
        out.push_str(&format!(
            "{} {}\n",
            sci(sample.altitude_m, 6),
            sci(sample.refractive_index, 8)
        ));
    }

    out
}

fn push_row(out: &mut String, values: &[f64; 5]) {
    let row: Vec<String> = values.iter().map(|v| sci(*v, 6)).collect();
    out.push_str(&row.join(" "));
    out.push('\n');
}

/// Fixed-width scientific notation: `std` does not zero-pad the exponent,
/// so normalize `1.5e7` into `1.500000e+07`.
fn sci(value: f64, precision: usize) -> String {
    let formatted = format!("{value:.precision$e}");
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => {
            let exp: i32 = exponent.parse().unwrap_or(0);
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{mantissa}e{sign}{:02}", exp.abs())
        }
        None => formatted,
    }
}
