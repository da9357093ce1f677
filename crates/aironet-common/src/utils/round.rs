/// Rounds a value to `precision` decimal places, half away from zero.
///
/// Currency convention: 6 decimals for balance fields, 5 for a computed
/// per-tick reward.
pub fn fixed(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision as i32);
    (value * factor).round() / factor
}
