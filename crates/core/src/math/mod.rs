//! Small numeric helpers shared by the oscillator and modulation code.

/// Clamps `value` into `[0, 1]`. NaN collapses to `0.0` so that a bad input
/// from a collaborator can never leak downstream.
pub fn clamp_normalized(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Maps a unipolar `[0, 1]` value onto `[-1, 1]`.
pub fn to_bipolar(value: f64) -> f64 {
    value * 2.0 - 1.0
}

/// Maps a bipolar `[-1, 1]` value back onto `[0, 1]`.
pub fn to_unipolar(value: f64) -> f64 {
    (value + 1.0) * 0.5
}
