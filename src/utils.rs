//! Safe numeric conversions used when folding float metrics into reported values

/// Clamp and round an f32 into `[min, max]`; non-finite values map to `min`
#[must_use]
#[allow(clippy::cast_possible_truncation)] // Clamping ensures safe truncation
#[allow(clippy::cast_sign_loss)] // Clamped to a non-negative range first
pub fn f32_to_u8_clamp(value: f32, min: u8, max: u8) -> u8 {
    // Ensure min <= max
    let (min, max) = if min <= max { (min, max) } else { (max, min) };

    if !value.is_finite() {
        return min;
    }

    let clamped = value.round().clamp(f32::from(min), f32::from(max));
    (clamped as u8).clamp(min, max)
}

/// Milliseconds between two monotonic timestamps as f32, zero if `later` is not after `earlier`
#[must_use]
#[allow(clippy::cast_precision_loss)] // Frame gaps are far below f32's exact integer range
pub fn elapsed_ms(earlier: u64, later: u64) -> f32 {
    later.saturating_sub(earlier) as f32
}

/// Fraction `part / whole`, or `None` when the whole is zero
#[must_use]
#[allow(clippy::cast_precision_loss)] // Window sizes are small
pub fn ratio(part: usize, whole: usize) -> Option<f32> {
    (whole > 0).then(|| part as f32 / whole as f32)
}
