//! Form-quality score and feedback.
//!
//! The score starts at 100 and loses a fixed penalty per active posture issue
//! according to its severity. When the exercise has a target range of motion
//! and a range has been observed, the score is additionally capped by how much
//! of the target was reached. Feedback lines come from a fixed template set and
//! are always emitted in the same order.
//!
//! Stability is reported beside the score: it starts at 100 and loses up to 25
//! points for every tracked joint whose angle jumped by more than the
//! instability threshold between two frames.

use crate::{
    constants::{MAX_INSTABILITY_PENALTY, ROM_SCORE_CAP_FLOOR},
    exercise::ExerciseProfile,
    geometry::JointId,
    posture::PostureIssue,
    repetition::RangeOfMotion,
    utils::f32_to_u8_clamp,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Qualitative label for a score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionQuality {
    Poor,
    Fair,
    Good,
    Perfect,
}

impl ExecutionQuality {
    #[must_use]
    pub const fn from_score(score: u8) -> Self {
        match score {
            90..=u8::MAX => Self::Perfect,
            70..=89 => Self::Good,
            50..=69 => Self::Fair,
            _ => Self::Poor,
        }
    }
}

impl fmt::Display for ExecutionQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Poor => "poor",
            Self::Fair => "fair",
            Self::Good => "good",
            Self::Perfect => "perfect",
        };
        f.write_str(label)
    }
}

/// Per-frame conditions that produce feedback besides posture and range
#[derive(Debug, Clone, Default)]
pub struct FeedbackSignals<'a> {
    /// Dropped-frame rate over the detection window is above the limit
    pub no_detection: bool,
    /// The latest frame was below the visibility threshold
    pub low_confidence: bool,
    /// A stale-session warning was raised on the latest frame
    pub stale_warning: bool,
    pub stale_joints: &'a [JointId],
}

/// Folds posture issues and range of motion into a score and feedback
#[derive(Debug, Clone, Copy)]
pub struct ScoreAggregator {
    target_range: Option<f32>,
}

impl ScoreAggregator {
    #[must_use]
    pub fn new(profile: &ExerciseProfile) -> Self {
        Self {
            target_range: profile.target_range.filter(|target| *target > 0.0),
        }
    }

    /// Sum of severity weights of the active issues
    #[must_use]
    pub fn posture_penalty(issues: &[PostureIssue]) -> u32 {
        issues.iter().map(|issue| issue.severity.weight()).sum()
    }

    /// Fraction (0-1) of the target range reached, when both are known
    #[must_use]
    pub fn completeness(&self, range_of_motion: Option<&RangeOfMotion>) -> Option<f32> {
        let target = self.target_range?;
        let rom = range_of_motion?;
        let fraction = (rom.range / target).clamp(0.0, 1.0);
        fraction.is_finite().then_some(fraction)
    }

    /// Upper bound on the score imposed by range-of-motion completeness
    #[must_use]
    pub fn range_cap(&self, range_of_motion: Option<&RangeOfMotion>) -> Option<f32> {
        self.completeness(range_of_motion)
            .map(|fraction| ROM_SCORE_CAP_FLOOR + (100.0 - ROM_SCORE_CAP_FLOOR) * fraction)
    }

    /// Score in 0-100
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // Penalties are small integers
    pub fn score(&self, issues: &[PostureIssue], range_of_motion: Option<&RangeOfMotion>) -> u8 {
        let penalised = 100.0 - Self::posture_penalty(issues).min(100) as f32;
        let capped = match self.range_cap(range_of_motion) {
            Some(cap) => penalised.min(cap),
            None => penalised,
        };
        f32_to_u8_clamp(capped, 0, 100)
    }

    /// Stability in 0-100 from each joint's largest frame-to-frame change, `None` without changes
    #[must_use]
    pub fn stability(peak_changes: &[f32], threshold: f32) -> Option<u8> {
        if peak_changes.is_empty() {
            return None;
        }
        let penalty: f32 = peak_changes
            .iter()
            .filter(|&&change| change > threshold)
            .map(|change| (change / 2.0).min(MAX_INSTABILITY_PENALTY))
            .sum();
        Some(f32_to_u8_clamp(100.0 - penalty, 0, 100))
    }

    /// Feedback lines in fixed order
    #[must_use]
    pub fn feedback(
        &self,
        signals: &FeedbackSignals<'_>,
        issues: &[PostureIssue],
        range_of_motion: Option<&RangeOfMotion>,
    ) -> Vec<String> {
        let mut lines = Vec::new();

        if signals.no_detection {
            lines.push("No person detected, step into view of the camera".to_string());
        } else if signals.low_confidence {
            lines.push("Low detection confidence, make sure your whole body is visible".to_string());
        }

        if signals.stale_warning {
            lines.push("Tracking was interrupted, the current repetition was reset if unfinished".to_string());
        }

        for joint in signals.stale_joints {
            lines.push(format!("Lost track of the {}", joint.label()));
        }

        for issue in issues {
            lines.push(issue.issue_type.cue().to_string());
        }

        if let Some(fraction) = self.completeness(range_of_motion) {
            let line = if fraction >= 1.0 {
                "Full range of motion reached".to_string()
            } else if fraction >= 0.75 {
                "Almost full range of motion, go a little further".to_string()
            } else {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let percent = (fraction * 100.0).round() as u32;
                format!("Increase your range of motion ({percent}% of target)")
            };
            lines.push(line);
        }

        if issues.is_empty() && !signals.no_detection {
            lines.push("Posture looks good".to_string());
        }

        lines
    }
}
