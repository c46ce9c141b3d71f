//! Decimal rounding used when values leave the numeric domain.

/// Round `value` to `places` decimal digits, half away from zero.
pub fn round_to(value: f64, places: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let scale = 10f64.powi(places as i32);
    (value * scale).round() / scale
}

/// Shorthand for one decimal place, the precision of emitted window values.
pub fn round1(value: f64) -> f64 {
    round_to(value, 1)
}
