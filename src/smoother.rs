//! Per-joint smoothing with confidence gating.
//!
//! Each joint owns an [`AngleFilter`]. A missing sample leaves the smoothed
//! value untouched and advances the joint's stale counter; once the counter
//! reaches the configured limit the joint is stale and its value is withheld
//! until a fresh sample arrives.

use crate::{
    config::SmoothingConfig,
    filters::{create_filter, AngleFilter},
    geometry::JointId,
    utils::elapsed_ms,
    Result,
};
use log::debug;

struct JointChannel {
    filter: Box<dyn AngleFilter>,
    value: Option<f32>,
    last_sample_at: Option<u64>,
    missed_frames: u32,
}

impl JointChannel {
    fn is_stale(&self, limit: u32) -> bool {
        self.missed_frames >= limit
    }
}

/// Exponential smoothing of every tracked joint angle
pub struct SignalSmoother {
    channels: Vec<JointChannel>,
    stale_frame_limit: u32,
}

impl SignalSmoother {
    /// Create a smoother with one filter per joint
    pub fn new(config: &SmoothingConfig) -> Result<Self> {
        let channels = JointId::ALL
            .iter()
            .map(|_| {
                Ok(JointChannel {
                    filter: create_filter(&config.filter, config.alpha, config.reference_interval_ms)?,
                    value: None,
                    last_sample_at: None,
                    missed_frames: 0,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            channels,
            stale_frame_limit: config.stale_frame_limit,
        })
    }

    /// Feed one frame's raw angle for `joint` (`None` when it could not be measured).
    ///
    /// Returns the smoothed angle, or `None` if the joint has no value yet or is stale.
    pub fn update(&mut self, joint: JointId, raw: Option<f32>, timestamp_ms: u64) -> Option<f32> {
        let limit = self.stale_frame_limit;
        let channel = &mut self.channels[joint.index()];

        match raw {
            Some(angle) => {
                let elapsed = channel
                    .last_sample_at
                    .map_or(0.0, |last| elapsed_ms(last, timestamp_ms));
                if channel.is_stale(limit) {
                    debug!("{} fresh again after {} missed frames", joint.label(), channel.missed_frames);
                }
                channel.value = Some(channel.filter.apply(angle, elapsed));
                channel.last_sample_at = Some(timestamp_ms);
                channel.missed_frames = 0;
            }
            None => {
                channel.missed_frames = channel.missed_frames.saturating_add(1);
                if channel.missed_frames == limit {
                    debug!("{} marked stale", joint.label());
                }
            }
        }

        self.value(joint)
    }

    /// Current smoothed angle for a joint, withheld while stale
    #[must_use]
    pub fn value(&self, joint: JointId) -> Option<f32> {
        let channel = &self.channels[joint.index()];
        if channel.is_stale(self.stale_frame_limit) {
            None
        } else {
            channel.value
        }
    }

    #[must_use]
    pub fn is_stale(&self, joint: JointId) -> bool {
        self.channels[joint.index()].is_stale(self.stale_frame_limit)
    }

    /// Joints currently excluded from evaluation
    #[must_use]
    pub fn stale_joints(&self) -> Vec<JointId> {
        JointId::ALL.into_iter().filter(|&joint| self.is_stale(joint)).collect()
    }

    /// Forget every smoothed value
    pub fn reset(&mut self) {
        for channel in &mut self.channels {
            channel.filter.reset();
            channel.value = None;
            channel.last_sample_at = None;
            channel.missed_frames = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn smoother(alpha: f32, limit: u32) -> SignalSmoother {
        SignalSmoother::new(&SmoothingConfig {
            alpha,
            stale_frame_limit: limit,
            ..SmoothingConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_first_sample_passes_through() {
        let mut s = smoother(0.3, 10);
        assert_eq!(s.update(JointId::LeftKnee, Some(170.0), 0), Some(170.0));
        assert_eq!(s.value(JointId::RightKnee), None);
    }

    #[test]
    fn test_smoothing_at_reference_rate() {
        let mut s = smoother(0.3, 10);
        s.update(JointId::LeftKnee, Some(100.0), 0);
        let config = SmoothingConfig::default();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let next = config.reference_interval_ms.round() as u64;
        let smoothed = s.update(JointId::LeftKnee, Some(200.0), next).unwrap();
        // 0.3 * 200 + 0.7 * 100, within the rounding of the frame interval
        assert!((smoothed - 130.0).abs() < 0.5);
    }

    #[test]
    fn test_missing_sample_holds_value() {
        let mut s = smoother(0.3, 10);
        s.update(JointId::LeftKnee, Some(120.0), 0);
        for i in 1..5 {
            assert_eq!(s.update(JointId::LeftKnee, None, i * 33), Some(120.0));
        }
        assert!(!s.is_stale(JointId::LeftKnee));
    }

    #[test]
    fn test_stale_after_limit_and_recovery() {
        let mut s = smoother(0.3, 3);
        s.update(JointId::LeftElbow, Some(90.0), 0);
        s.update(JointId::LeftElbow, None, 33);
        s.update(JointId::LeftElbow, None, 66);
        assert_eq!(s.update(JointId::LeftElbow, None, 99), None);
        assert!(s.is_stale(JointId::LeftElbow));
        assert_eq!(s.stale_joints(), vec![JointId::LeftElbow]);

        // A fresh sample resets the counter
        assert!(s.update(JointId::LeftElbow, Some(95.0), 132).is_some());
        assert!(!s.is_stale(JointId::LeftElbow));
        assert!(s.stale_joints().is_empty());
    }

    #[test]
    fn test_joints_are_independent() {
        let mut s = smoother(0.5, 10);
        s.update(JointId::LeftKnee, Some(100.0), 0);
        s.update(JointId::RightKnee, Some(10.0), 0);
        assert_eq!(s.value(JointId::LeftKnee), Some(100.0));
        assert_eq!(s.value(JointId::RightKnee), Some(10.0));
    }

    #[test]
    fn test_reset() {
        let mut s = smoother(0.3, 10);
        s.update(JointId::LeftKnee, Some(100.0), 0);
        s.reset();
        assert_eq!(s.value(JointId::LeftKnee), None);
        assert_eq!(s.update(JointId::LeftKnee, Some(42.0), 100), Some(42.0));
    }
}
