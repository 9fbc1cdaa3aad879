use super::AngleFilter;
use crate::constants::DEFAULT_REFERENCE_INTERVAL_MS;

/// Exponential smoothing filter
///
/// `alpha` is the weight of a new sample arriving one reference interval after
/// the previous one. Other spacings use `1 - (1 - alpha)^(elapsed / reference)`,
/// so the filter has the same time constant at any frame rate.
pub struct ExponentialFilter {
    alpha: f32,
    reference_interval_ms: f32,
    last: Option<f32>,
}

impl ExponentialFilter {
    pub fn new(alpha: f32) -> Self {
        assert!(alpha > 0.0 && alpha <= 1.0, "Alpha must be in (0, 1]");
        Self {
            alpha,
            reference_interval_ms: DEFAULT_REFERENCE_INTERVAL_MS,
            last: None,
        }
    }

    #[must_use]
    pub fn with_reference_interval(mut self, reference_interval_ms: f32) -> Self {
        assert!(reference_interval_ms > 0.0, "Reference interval must be positive");
        self.reference_interval_ms = reference_interval_ms;
        self
    }

    /// Weight given to a sample arriving `elapsed_ms` after the previous one
    #[must_use]
    pub fn effective_alpha(&self, elapsed_ms: f32) -> f32 {
        if self.alpha >= 1.0 || !elapsed_ms.is_finite() {
            return 1.0;
        }
        let steps = (elapsed_ms / self.reference_interval_ms).max(0.0);
        1.0 - (1.0 - self.alpha).powf(steps)
    }
}

impl AngleFilter for ExponentialFilter {
    fn apply(&mut self, value: f32, elapsed_ms: f32) -> f32 {
        let filtered = match self.last {
            Some(last) => {
                let alpha = self.effective_alpha(elapsed_ms);
                alpha * value + (1.0 - alpha) * last
            }
            None => value,
        };

        self.last = Some(filtered);
        filtered
    }

    fn reset(&mut self) {
        self.last = None;
    }

    fn name(&self) -> &str {
        "ExponentialFilter"
    }
}
