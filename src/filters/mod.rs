//! Signal filtering algorithms for smoothing joint angles.
//!
//! Filters are time-aware: every sample carries the time elapsed since the
//! previous one so the amount of smoothing does not depend on the frame rate.

/// Exponential filter for responsive smoothing
pub mod exponential;

use crate::Result;

/// Trait for all angle filters
pub trait AngleFilter: Send + Sync {
    /// Apply filter to a new sample taken `elapsed_ms` after the previous one
    fn apply(&mut self, value: f32, elapsed_ms: f32) -> f32;

    /// Reset filter state
    fn reset(&mut self);

    /// Get filter name
    fn name(&self) -> &str;
}

/// No-op filter that passes through values unchanged
pub struct NoFilter;

impl AngleFilter for NoFilter {
    fn apply(&mut self, value: f32, _elapsed_ms: f32) -> f32 {
        value
    }

    fn reset(&mut self) {}

    fn name(&self) -> &str {
        "NoFilter"
    }
}

/// Create an angle filter by type name
///
/// Accepts `none` and `exponential[:alpha]`.
pub fn create_filter(filter_type: &str, alpha: f32, reference_interval_ms: f32) -> Result<Box<dyn AngleFilter>> {
    let mut parts = filter_type.split(':');
    let name = parts.next().unwrap_or_default().to_lowercase();
    match name.as_str() {
        "none" | "nofilter" => Ok(Box::new(NoFilter)),
        "exponential" | "ema" => {
            let alpha = match parts.next() {
                Some(value) => value
                    .parse::<f32>()
                    .map_err(|e| crate::Error::ConfigError(format!("Invalid exponential alpha '{value}': {e}")))?,
                None => alpha,
            };
            if !(alpha > 0.0 && alpha <= 1.0) {
                return Err(crate::Error::ConfigError(format!(
                    "Exponential alpha must be in (0, 1], got {alpha}"
                )));
            }
            if !(reference_interval_ms > 0.0 && reference_interval_ms.is_finite()) {
                return Err(crate::Error::ConfigError(
                    "Reference interval must be positive".to_string(),
                ));
            }
            Ok(Box::new(
                exponential::ExponentialFilter::new(alpha).with_reference_interval(reference_interval_ms),
            ))
        }
        _ => Err(crate::Error::ConfigError(format!("Unknown filter type: {filter_type}"))),
    }
}
