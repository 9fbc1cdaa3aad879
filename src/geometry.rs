//! Joint angle geometry.
//!
//! The angle at a joint is measured at the vertex landmark between the two
//! adjacent segments, using the normalized dot product:
//! `cos(θ) = (v1 · v2) / (|v1| × |v2|)`.

use crate::{
    constants::MIN_SEGMENT_LENGTH,
    landmarks::{BodyPart, Frame, Landmark},
};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Joints tracked by the engine, each named by its three-landmark triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JointId {
    /// shoulder - elbow - wrist
    LeftElbow,
    RightElbow,
    /// hip - shoulder - elbow
    LeftShoulder,
    RightShoulder,
    /// shoulder - hip - knee
    LeftHip,
    RightHip,
    /// hip - knee - ankle
    LeftKnee,
    RightKnee,
}

impl JointId {
    pub const COUNT: usize = 8;

    pub const ALL: [JointId; Self::COUNT] = [
        Self::LeftElbow,
        Self::RightElbow,
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::LeftHip,
        Self::RightHip,
        Self::LeftKnee,
        Self::RightKnee,
    ];

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The landmark triple `(a, vertex, c)` defining this joint
    #[must_use]
    pub const fn landmarks(self) -> [BodyPart; 3] {
        use BodyPart as B;
        match self {
            Self::LeftElbow => [B::LeftShoulder, B::LeftElbow, B::LeftWrist],
            Self::RightElbow => [B::RightShoulder, B::RightElbow, B::RightWrist],
            Self::LeftShoulder => [B::LeftHip, B::LeftShoulder, B::LeftElbow],
            Self::RightShoulder => [B::RightHip, B::RightShoulder, B::RightElbow],
            Self::LeftHip => [B::LeftShoulder, B::LeftHip, B::LeftKnee],
            Self::RightHip => [B::RightShoulder, B::RightHip, B::RightKnee],
            Self::LeftKnee => [B::LeftHip, B::LeftKnee, B::LeftAnkle],
            Self::RightKnee => [B::RightHip, B::RightKnee, B::RightAnkle],
        }
    }

    /// Human readable name used in feedback
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::LeftElbow => "left elbow",
            Self::RightElbow => "right elbow",
            Self::LeftShoulder => "left shoulder",
            Self::RightShoulder => "right shoulder",
            Self::LeftHip => "left hip",
            Self::RightHip => "right hip",
            Self::LeftKnee => "left knee",
            Self::RightKnee => "right knee",
        }
    }
}

/// A raw joint angle measured on one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointAngleSample {
    pub joint: JointId,
    /// Angle at the vertex, 0-180 degrees
    pub degrees: f32,
    /// Minimum confidence of the three contributing landmarks
    pub confidence: f32,
}

/// Why an angle could not be measured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AngleRejection {
    /// A landmark was below the visibility threshold
    LowConfidence,
    /// A segment had near-zero length or the arithmetic produced NaN/Inf
    Degenerate,
}

/// Angle in degrees at `b` between `b→a` and `b→c`, or the reason it cannot be measured
pub fn angle_between(a: &Landmark, b: &Landmark, c: &Landmark, visibility_threshold: f32) -> Result<f32, AngleRejection> {
    if ![a, b, c].iter().all(|lm| lm.is_visible(visibility_threshold)) {
        return Err(AngleRejection::LowConfidence);
    }
    vertex_angle(&a.position(), &b.position(), &c.position()).ok_or(AngleRejection::Degenerate)
}

/// Angle in degrees at `b`, or `None` for low confidence or degenerate geometry
#[must_use]
pub fn compute_angle(a: &Landmark, b: &Landmark, c: &Landmark, visibility_threshold: f32) -> Option<f32> {
    angle_between(a, b, c, visibility_threshold).ok()
}

/// Angle in degrees at vertex `b` formed by three points
#[must_use]
pub fn vertex_angle(a: &Vector3<f32>, b: &Vector3<f32>, c: &Vector3<f32>) -> Option<f32> {
    angle_of(&(a - b), &(c - b))
}

/// Angle in degrees between two vectors; `None` if either is (near) zero or non-finite
#[must_use]
pub fn angle_of(v1: &Vector3<f32>, v2: &Vector3<f32>) -> Option<f32> {
    let (n1, n2) = (v1.norm(), v2.norm());
    // NaN fails both comparisons
    if !(n1 > MIN_SEGMENT_LENGTH && n2 > MIN_SEGMENT_LENGTH) || !n1.is_finite() || !n2.is_finite() {
        return None;
    }
    let cos_angle = (v1.dot(v2) / (n1 * n2)).clamp(-1.0, 1.0);
    let degrees = cos_angle.acos().to_degrees();
    degrees.is_finite().then_some(degrees)
}

/// Inclination of a vector from the vertical axis in degrees (0 = upright)
#[must_use]
pub fn inclination_from_vertical(v: &Vector3<f32>) -> Option<f32> {
    // image y grows downwards, so "up" is -y
    angle_of(v, &Vector3::new(0.0, -1.0, 0.0))
}

/// Measure one joint on a frame
pub fn sample_joint(frame: &Frame, joint: JointId, visibility_threshold: f32) -> Result<JointAngleSample, AngleRejection> {
    let [a, b, c] = joint.landmarks().map(|part| frame.landmark(part));
    let degrees = angle_between(a, b, c, visibility_threshold)?;
    Ok(JointAngleSample {
        joint,
        degrees,
        confidence: a.confidence.min(b.confidence).min(c.confidence),
    })
}
