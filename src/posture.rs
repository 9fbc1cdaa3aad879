//! Posture deviation detection.
//!
//! A fixed table of rules is evaluated on the raw landmarks of every frame.
//! A deviation has to persist for a number of consecutive frames before it is
//! reported, and a reported deviation is cleared only after it has been absent
//! for a number of consecutive frames.

use crate::{
    config::{PostureConfig, PostureThresholds, SeverityBands},
    constants::{MILD_PENALTY, MIN_SEGMENT_LENGTH, MODERATE_PENALTY, SEVERE_PENALTY},
    exercise::ExerciseType,
    geometry::{inclination_from_vertical, vertex_angle, JointId},
    landmarks::{BodyPart, Frame},
};
use log::{debug, info};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Kinds of posture deviation, in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostureIssueType {
    ForwardHead,
    RoundedShoulders,
    ShoulderAsymmetry,
    HipAsymmetry,
    KneeValgus,
    KneeVarus,
    ExcessiveTrunkLean,
    HipSag,
}

impl PostureIssueType {
    /// What was observed
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::ForwardHead => "Head is forward of the shoulders",
            Self::RoundedShoulders => "Shoulders are rounded forward",
            Self::ShoulderAsymmetry => "Shoulders are uneven",
            Self::HipAsymmetry => "Hips are uneven",
            Self::KneeValgus => "Knee is collapsing inward",
            Self::KneeVarus => "Knee is bowing outward",
            Self::ExcessiveTrunkLean => "Trunk is leaning too far",
            Self::HipSag => "Hips are sagging out of line",
        }
    }

    /// Corrective cue shown to the patient
    #[must_use]
    pub const fn cue(self) -> &'static str {
        match self {
            Self::ForwardHead => "Keep your head stacked over your shoulders",
            Self::RoundedShoulders => "Draw your shoulders back and down",
            Self::ShoulderAsymmetry => "Level your shoulders",
            Self::HipAsymmetry => "Keep your hips level",
            Self::KneeValgus => "Push your knees out over your toes",
            Self::KneeVarus => "Keep your knees in line with your feet",
            Self::ExcessiveTrunkLean => "Keep your chest up",
            Self::HipSag => "Brace your core and lift your hips",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Mild,
    Moderate,
    Severe,
}

impl Severity {
    /// Score penalty
    #[must_use]
    pub const fn weight(self) -> u32 {
        match self {
            Self::Mild => MILD_PENALTY,
            Self::Moderate => MODERATE_PENALTY,
            Self::Severe => SEVERE_PENALTY,
        }
    }

    /// Severity of a deviation of `magnitude`, `None` below the mild band
    #[must_use]
    pub fn classify(bands: &SeverityBands, magnitude: f32) -> Option<Self> {
        if magnitude >= bands.severe {
            Some(Self::Severe)
        } else if magnitude >= bands.moderate {
            Some(Self::Moderate)
        } else if magnitude >= bands.mild {
            Some(Self::Mild)
        } else {
            None
        }
    }
}

/// A confirmed posture deviation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostureIssue {
    pub issue_type: PostureIssueType,
    pub severity: Severity,
    pub first_detected_at: u64,
    pub last_detected_at: u64,
    /// Frames on which the deviation was observed since it was confirmed
    pub occurrence_count: u32,
    pub description: String,
}

/// Outcome of measuring one rule on one frame
#[derive(Debug, Clone, Copy, PartialEq)]
enum Measurement {
    Deviation(f32),
    /// Required landmarks not visible
    Unknown,
    /// Landmarks visible but the geometry is degenerate
    Anomaly,
}

impl From<Option<f32>> for Measurement {
    fn from(value: Option<f32>) -> Self {
        match value {
            Some(v) if v.is_finite() => Self::Deviation(v),
            _ => Self::Anomaly,
        }
    }
}

struct PostureRule {
    issue: PostureIssueType,
    applies_to: fn(ExerciseType) -> bool,
    depends_on: &'static [JointId],
    bands: fn(&PostureThresholds) -> SeverityBands,
    measure: fn(&Frame, f32) -> Measurement,
}

const RULE_COUNT: usize = 8;

static RULES: [PostureRule; RULE_COUNT] = [
    PostureRule {
        issue: PostureIssueType::ForwardHead,
        applies_to: ExerciseType::is_upright,
        depends_on: &[],
        bands: |t| t.forward_head,
        measure: forward_head,
    },
    PostureRule {
        issue: PostureIssueType::RoundedShoulders,
        applies_to: |e| {
            matches!(
                e,
                ExerciseType::LateralRaise
                    | ExerciseType::ShoulderPress
                    | ExerciseType::KneeFlexion
                    | ExerciseType::HipAbduction
            )
        },
        depends_on: &[JointId::LeftShoulder, JointId::RightShoulder],
        bands: |t| t.rounded_shoulders,
        measure: rounded_shoulders,
    },
    PostureRule {
        issue: PostureIssueType::ShoulderAsymmetry,
        applies_to: ExerciseType::is_upright,
        depends_on: &[JointId::LeftShoulder, JointId::RightShoulder],
        bands: |t| t.shoulder_asymmetry,
        measure: |frame, threshold| {
            level_difference(frame, BodyPart::LeftShoulder, BodyPart::RightShoulder, threshold)
        },
    },
    PostureRule {
        issue: PostureIssueType::HipAsymmetry,
        applies_to: ExerciseType::is_upright,
        depends_on: &[JointId::LeftHip, JointId::RightHip],
        bands: |t| t.hip_asymmetry,
        measure: |frame, threshold| level_difference(frame, BodyPart::LeftHip, BodyPart::RightHip, threshold),
    },
    PostureRule {
        issue: PostureIssueType::KneeValgus,
        applies_to: |e| matches!(e, ExerciseType::Squat | ExerciseType::Lunge),
        depends_on: &[JointId::LeftKnee, JointId::RightKnee],
        bands: |t| t.knee_valgus,
        measure: |frame, threshold| knee_deviation(frame, threshold, 1.0),
    },
    PostureRule {
        issue: PostureIssueType::KneeVarus,
        applies_to: |e| matches!(e, ExerciseType::Squat | ExerciseType::Lunge),
        depends_on: &[JointId::LeftKnee, JointId::RightKnee],
        bands: |t| t.knee_varus,
        measure: |frame, threshold| knee_deviation(frame, threshold, -1.0),
    },
    PostureRule {
        issue: PostureIssueType::ExcessiveTrunkLean,
        applies_to: ExerciseType::is_upright,
        depends_on: &[JointId::LeftHip, JointId::RightHip],
        bands: |t| t.trunk_lean,
        measure: trunk_lean,
    },
    PostureRule {
        issue: PostureIssueType::HipSag,
        applies_to: |e| !e.is_upright(),
        depends_on: &[JointId::LeftHip, JointId::RightHip],
        bands: |t| t.hip_sag,
        measure: hip_sag,
    },
];

fn shoulder_and_hip_midpoints(frame: &Frame, threshold: f32) -> Option<(Vector3<f32>, Vector3<f32>)> {
    let shoulders = frame.midpoint(BodyPart::LeftShoulder, BodyPart::RightShoulder, threshold)?;
    let hips = frame.midpoint(BodyPart::LeftHip, BodyPart::RightHip, threshold)?;
    Some((shoulders, hips))
}

fn torso_length(shoulders: &Vector3<f32>, hips: &Vector3<f32>) -> Option<f32> {
    let length = (shoulders - hips).norm();
    (length > MIN_SEGMENT_LENGTH && length.is_finite()).then_some(length)
}

/// Neck inclination from vertical, degrees
fn forward_head(frame: &Frame, threshold: f32) -> Measurement {
    let Some(shoulders) = frame.midpoint(BodyPart::LeftShoulder, BodyPart::RightShoulder, threshold) else {
        return Measurement::Unknown;
    };
    let Some(ears) = frame.midpoint(BodyPart::LeftEar, BodyPart::RightEar, threshold) else {
        return Measurement::Unknown;
    };
    inclination_from_vertical(&(ears - shoulders)).into()
}

/// Shoulder depth ahead of the hips relative to torso length
fn rounded_shoulders(frame: &Frame, threshold: f32) -> Measurement {
    let Some((shoulders, hips)) = shoulder_and_hip_midpoints(frame, threshold) else {
        return Measurement::Unknown;
    };
    // smaller z is closer to the camera
    torso_length(&shoulders, &hips)
        .map(|torso| (hips.z - shoulders.z) / torso)
        .into()
}

/// Vertical offset between a left/right pair relative to torso length
fn level_difference(frame: &Frame, left: BodyPart, right: BodyPart, threshold: f32) -> Measurement {
    let Some([l, r]) = frame.visible_positions([left, right], threshold) else {
        return Measurement::Unknown;
    };
    let Some((shoulders, hips)) = shoulder_and_hip_midpoints(frame, threshold) else {
        return Measurement::Unknown;
    };
    torso_length(&shoulders, &hips)
        .map(|torso| (l.y - r.y).abs() / torso)
        .into()
}

/// Worst frontal-plane shin deviation towards `medial_sign` (1 medial, -1 lateral), degrees
fn knee_deviation(frame: &Frame, threshold: f32, medial_sign: f32) -> Measurement {
    let Some(hips) = frame.midpoint(BodyPart::LeftHip, BodyPart::RightHip, threshold) else {
        return Measurement::Unknown;
    };

    let sides = [
        [BodyPart::LeftKnee, BodyPart::LeftAnkle],
        [BodyPart::RightKnee, BodyPart::RightAnkle],
    ];
    let mut worst: Option<f32> = None;
    for parts in sides {
        let Some([knee, ankle]) = frame.visible_positions(parts, threshold) else {
            continue;
        };
        let shin = knee - ankle;
        let length = shin.norm();
        if !(length > MIN_SEGMENT_LENGTH && length.is_finite()) {
            return Measurement::Anomaly;
        }
        let towards_midline = (hips.x - ankle.x).signum();
        let offset = shin.x * towards_midline * medial_sign;
        let deviation = (offset / length).clamp(-1.0, 1.0).asin().to_degrees().max(0.0);
        worst = Some(worst.map_or(deviation, |w| w.max(deviation)));
    }

    worst.map_or(Measurement::Unknown, Measurement::from_value)
}

/// Torso inclination from vertical, degrees
fn trunk_lean(frame: &Frame, threshold: f32) -> Measurement {
    let Some((shoulders, hips)) = shoulder_and_hip_midpoints(frame, threshold) else {
        return Measurement::Unknown;
    };
    inclination_from_vertical(&(shoulders - hips)).into()
}

/// Bend of the shoulder-hip-ankle line with the hips below it, degrees
fn hip_sag(frame: &Frame, threshold: f32) -> Measurement {
    let Some((shoulders, hips)) = shoulder_and_hip_midpoints(frame, threshold) else {
        return Measurement::Unknown;
    };
    let Some(ankles) = frame.midpoint(BodyPart::LeftAnkle, BodyPart::RightAnkle, threshold) else {
        return Measurement::Unknown;
    };
    let Some(angle) = vertex_angle(&shoulders, &hips, &ankles) else {
        return Measurement::Anomaly;
    };

    let line = ankles - shoulders;
    if line.x.abs() > MIN_SEGMENT_LENGTH {
        let t = (hips.x - shoulders.x) / line.x;
        let line_y = shoulders.y + t * line.y;
        // image y grows downwards; hips above the line are a pike, not a sag
        if hips.y < line_y {
            return Measurement::Deviation(0.0);
        }
    }
    Measurement::from_value(180.0 - angle)
}

impl Measurement {
    fn from_value(value: f32) -> Self {
        Some(value).into()
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct RuleTracker {
    streak: u32,
    streak_started_at: Option<u64>,
    misses: u32,
}

impl RuleTracker {
    fn break_streak(&mut self) {
        self.streak = 0;
        self.streak_started_at = None;
    }
}

/// Debounced evaluation of the posture rule table
#[derive(Debug, Clone)]
pub struct PostureClassifier {
    exercise: ExerciseType,
    visibility_threshold: f32,
    debounce_frames: u32,
    cooldown_frames: u32,
    thresholds: PostureThresholds,
    trackers: [RuleTracker; RULE_COUNT],
    active: BTreeMap<PostureIssueType, PostureIssue>,
}

impl PostureClassifier {
    #[must_use]
    pub fn new(exercise: ExerciseType, config: &PostureConfig, visibility_threshold: f32) -> Self {
        Self {
            exercise,
            visibility_threshold,
            debounce_frames: config.debounce_frames.max(1),
            cooldown_frames: config.cooldown_frames.max(1),
            thresholds: config.thresholds.clone(),
            trackers: [RuleTracker::default(); RULE_COUNT],
            active: BTreeMap::new(),
        }
    }

    /// Evaluate every applicable rule on `frame`, skipping rules that depend on a stale joint.
    ///
    /// Returns the number of rules whose geometry was degenerate.
    pub fn evaluate(&mut self, frame: &Frame, stale_joints: &[JointId]) -> u32 {
        let timestamp_ms = frame.timestamp_ms();
        let mut anomalies = 0;

        for (rule, tracker) in RULES.iter().zip(self.trackers.iter_mut()) {
            if !(rule.applies_to)(self.exercise) {
                continue;
            }
            if rule.depends_on.iter().any(|joint| stale_joints.contains(joint)) {
                tracker.break_streak();
                continue;
            }

            let magnitude = match (rule.measure)(frame, self.visibility_threshold) {
                Measurement::Deviation(value) => value,
                Measurement::Unknown => {
                    tracker.break_streak();
                    continue;
                }
                Measurement::Anomaly => {
                    anomalies += 1;
                    tracker.break_streak();
                    continue;
                }
            };

            match Severity::classify(&(rule.bands)(&self.thresholds), magnitude) {
                Some(severity) => {
                    tracker.misses = 0;
                    tracker.streak = tracker.streak.saturating_add(1);
                    let started_at = *tracker.streak_started_at.get_or_insert(timestamp_ms);

                    if let Some(issue) = self.active.get_mut(&rule.issue) {
                        if issue.severity != severity {
                            debug!("{:?} severity {:?} -> {:?}", rule.issue, issue.severity, severity);
                        }
                        issue.severity = severity;
                        issue.last_detected_at = timestamp_ms;
                        issue.occurrence_count = issue.occurrence_count.saturating_add(1);
                    } else if tracker.streak >= self.debounce_frames {
                        info!("Posture issue confirmed: {:?} ({:?}, {magnitude:.2})", rule.issue, severity);
                        self.active.insert(
                            rule.issue,
                            PostureIssue {
                                issue_type: rule.issue,
                                severity,
                                first_detected_at: started_at,
                                last_detected_at: timestamp_ms,
                                occurrence_count: 1,
                                description: rule.issue.description().to_string(),
                            },
                        );
                    }
                }
                None => {
                    tracker.break_streak();
                    if self.active.contains_key(&rule.issue) {
                        tracker.misses += 1;
                        if tracker.misses >= self.cooldown_frames {
                            debug!("Posture issue cleared: {:?}", rule.issue);
                            self.active.remove(&rule.issue);
                            tracker.misses = 0;
                        }
                    }
                }
            }
        }

        anomalies
    }

    /// Break every debounce streak without advancing cooldowns, for frames that could not be evaluated
    pub fn interrupt(&mut self) {
        for tracker in &mut self.trackers {
            tracker.break_streak();
        }
    }

    /// Active issues in rule order
    #[must_use]
    pub fn issues(&self) -> Vec<PostureIssue> {
        self.active.values().cloned().collect()
    }

    #[must_use]
    pub fn is_active(&self, issue: PostureIssueType) -> bool {
        self.active.contains_key(&issue)
    }
}
