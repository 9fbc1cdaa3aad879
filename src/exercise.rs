//! Exercise catalogue.
//!
//! Each exercise has a profile: the joints that drive repetition counting,
//! the angle those joints rest at, the direction the angle moves during the
//! working phase, the range of motion a full repetition should cover and how
//! long a controlled repetition takes.

use crate::{geometry::JointId, Error};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Supported exercises
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseType {
    #[default]
    Squat,
    Pushup,
    LateralRaise,
    Plank,
    Lunge,
    ShoulderPress,
    HipAbduction,
    KneeFlexion,
}

/// Direction the tracked angle moves away from rest during a repetition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionDirection {
    /// Angle decreases (knee bend in a squat)
    Flexion,
    /// Angle increases (arm raise)
    Extension,
}

impl MotionDirection {
    /// Distance of `angle` from `rest` in this direction; negative when past rest the other way
    #[must_use]
    pub fn excursion(self, rest: f32, angle: f32) -> f32 {
        match self {
            Self::Flexion => rest - angle,
            Self::Extension => angle - rest,
        }
    }
}

/// Per-exercise parameters
#[derive(Debug, Clone, PartialEq)]
pub struct ExerciseProfile {
    pub name: &'static str,
    /// Joints averaged into the tracked angle
    pub primary_joints: &'static [JointId],
    /// Angle of the primary joints at rest, degrees
    pub rest_angle: f32,
    pub direction: MotionDirection,
    /// Range of motion (degrees) a complete repetition covers; `None` for holds
    pub target_range: Option<f32>,
    /// Shortest and longest controlled repetition, ms
    pub tempo_ms: (u64, u64),
    /// Holds are scored but not counted
    pub counts_repetitions: bool,
}

const SQUAT: ExerciseProfile = ExerciseProfile {
    name: "Squat",
    primary_joints: &[JointId::LeftKnee, JointId::RightKnee],
    rest_angle: 170.0,
    direction: MotionDirection::Flexion,
    target_range: Some(80.0),
    tempo_ms: (1_000, 10_000),
    counts_repetitions: true,
};

const PUSHUP: ExerciseProfile = ExerciseProfile {
    name: "Push-up",
    primary_joints: &[JointId::LeftElbow, JointId::RightElbow],
    rest_angle: 165.0,
    direction: MotionDirection::Flexion,
    target_range: Some(70.0),
    tempo_ms: (800, 8_000),
    counts_repetitions: true,
};

const LATERAL_RAISE: ExerciseProfile = ExerciseProfile {
    name: "Lateral raise",
    primary_joints: &[JointId::LeftShoulder, JointId::RightShoulder],
    rest_angle: 15.0,
    direction: MotionDirection::Extension,
    target_range: Some(75.0),
    tempo_ms: (500, 5_000),
    counts_repetitions: true,
};

const PLANK: ExerciseProfile = ExerciseProfile {
    name: "Plank",
    primary_joints: &[JointId::LeftHip, JointId::RightHip],
    rest_angle: 175.0,
    direction: MotionDirection::Flexion,
    target_range: None,
    tempo_ms: (5_000, 120_000),
    counts_repetitions: false,
};

const LUNGE: ExerciseProfile = ExerciseProfile {
    name: "Lunge",
    primary_joints: &[JointId::LeftKnee, JointId::RightKnee],
    rest_angle: 170.0,
    direction: MotionDirection::Flexion,
    target_range: Some(80.0),
    tempo_ms: (800, 6_000),
    counts_repetitions: true,
};

const SHOULDER_PRESS: ExerciseProfile = ExerciseProfile {
    name: "Shoulder press",
    primary_joints: &[JointId::LeftElbow, JointId::RightElbow],
    rest_angle: 85.0,
    direction: MotionDirection::Extension,
    target_range: Some(80.0),
    tempo_ms: (800, 6_000),
    counts_repetitions: true,
};

const HIP_ABDUCTION: ExerciseProfile = ExerciseProfile {
    name: "Hip abduction",
    primary_joints: &[JointId::LeftHip],
    rest_angle: 175.0,
    direction: MotionDirection::Flexion,
    target_range: Some(35.0),
    tempo_ms: (500, 4_000),
    counts_repetitions: true,
};

const KNEE_FLEXION: ExerciseProfile = ExerciseProfile {
    name: "Knee flexion",
    primary_joints: &[JointId::LeftKnee],
    rest_angle: 170.0,
    direction: MotionDirection::Flexion,
    target_range: Some(90.0),
    tempo_ms: (1_000, 4_000),
    counts_repetitions: true,
};

impl ExerciseType {
    pub const ALL: [ExerciseType; 8] = [
        Self::Squat,
        Self::Pushup,
        Self::LateralRaise,
        Self::Plank,
        Self::Lunge,
        Self::ShoulderPress,
        Self::HipAbduction,
        Self::KneeFlexion,
    ];

    #[must_use]
    pub const fn profile(self) -> &'static ExerciseProfile {
        match self {
            Self::Squat => &SQUAT,
            Self::Pushup => &PUSHUP,
            Self::LateralRaise => &LATERAL_RAISE,
            Self::Plank => &PLANK,
            Self::Lunge => &LUNGE,
            Self::ShoulderPress => &SHOULDER_PRESS,
            Self::HipAbduction => &HIP_ABDUCTION,
            Self::KneeFlexion => &KNEE_FLEXION,
        }
    }

    /// Whether the body is upright (not horizontal) while performing the exercise
    #[must_use]
    pub const fn is_upright(self) -> bool {
        !matches!(self, Self::Plank | Self::Pushup)
    }

    const fn key(self) -> &'static str {
        match self {
            Self::Squat => "squat",
            Self::Pushup => "pushup",
            Self::LateralRaise => "lateral_raise",
            Self::Plank => "plank",
            Self::Lunge => "lunge",
            Self::ShoulderPress => "shoulder_press",
            Self::HipAbduction => "hip_abduction",
            Self::KneeFlexion => "knee_flexion",
        }
    }
}

impl fmt::Display for ExerciseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ExerciseType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|exercise| exercise.key() == normalized)
            .ok_or_else(|| Error::InvalidInput(format!("Unknown exercise type: {s}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_exercise_type() {
        assert_eq!("squat".parse::<ExerciseType>().unwrap(), ExerciseType::Squat);
        assert_eq!("Lateral-Raise".parse::<ExerciseType>().unwrap(), ExerciseType::LateralRaise);
        assert_eq!("knee flexion".parse::<ExerciseType>().unwrap(), ExerciseType::KneeFlexion);
        assert!("burpee".parse::<ExerciseType>().is_err());
    }

    #[test]
    fn test_display_round_trips() {
        for exercise in ExerciseType::ALL {
            assert_eq!(exercise.to_string().parse::<ExerciseType>().unwrap(), exercise);
        }
    }

    #[test]
    fn test_profiles_are_consistent() {
        for exercise in ExerciseType::ALL {
            let profile = exercise.profile();
            assert!(!profile.primary_joints.is_empty(), "{exercise} has no joints");
            assert!((0.0..=180.0).contains(&profile.rest_angle));
            assert_eq!(profile.counts_repetitions, profile.target_range.is_some());
            assert!(profile.tempo_ms.0 < profile.tempo_ms.1);
        }
    }

    #[test]
    fn test_excursion_direction() {
        assert_eq!(MotionDirection::Flexion.excursion(170.0, 100.0), 70.0);
        assert_eq!(MotionDirection::Extension.excursion(15.0, 90.0), 75.0);
        assert!(MotionDirection::Flexion.excursion(170.0, 175.0) < 0.0);
    }
}
