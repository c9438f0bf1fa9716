/// Tolerance used when comparing solver values.
pub const EPSILON: f64 = 1e-5;

/// Returns `value` rounded to the closest integer if it is within [`EPSILON`] of it.
pub fn as_integral(value: f64) -> Option<i64> {
    let rounded = value.round();
    if (value - rounded).abs() < EPSILON {
        Some(rounded as i64)
    } else {
        None
    }
}
