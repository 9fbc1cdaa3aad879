//! Body landmarks and the frame type delivered by the keypoint detector.
//!
//! A [`Frame`] always carries exactly [`BodyPart::COUNT`] landmarks indexed by
//! the closed [`BodyPart`] enumeration. Producers that hand over a
//! variable-length list go through [`RawFrame`], which is where a wrong
//! landmark count is rejected.

use crate::{constants::NUM_BODY_LANDMARKS, Error, Result};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::ops::Index;

/// Anatomical keypoints of the pose topology, in detector output order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyPart {
    Nose,
    LeftEyeInner,
    LeftEye,
    LeftEyeOuter,
    RightEyeInner,
    RightEye,
    RightEyeOuter,
    LeftEar,
    RightEar,
    MouthLeft,
    MouthRight,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftPinky,
    RightPinky,
    LeftIndex,
    RightIndex,
    LeftThumb,
    RightThumb,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
    LeftHeel,
    RightHeel,
    LeftFootIndex,
    RightFootIndex,
}

impl BodyPart {
    /// Number of body parts
    pub const COUNT: usize = NUM_BODY_LANDMARKS;

    /// All body parts in index order
    pub const ALL: [BodyPart; NUM_BODY_LANDMARKS] = [
        Self::Nose,
        Self::LeftEyeInner,
        Self::LeftEye,
        Self::LeftEyeOuter,
        Self::RightEyeInner,
        Self::RightEye,
        Self::RightEyeOuter,
        Self::LeftEar,
        Self::RightEar,
        Self::MouthLeft,
        Self::MouthRight,
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::LeftElbow,
        Self::RightElbow,
        Self::LeftWrist,
        Self::RightWrist,
        Self::LeftPinky,
        Self::RightPinky,
        Self::LeftIndex,
        Self::RightIndex,
        Self::LeftThumb,
        Self::RightThumb,
        Self::LeftHip,
        Self::RightHip,
        Self::LeftKnee,
        Self::RightKnee,
        Self::LeftAnkle,
        Self::RightAnkle,
        Self::LeftHeel,
        Self::RightHeel,
        Self::LeftFootIndex,
        Self::RightFootIndex,
    ];

    /// Position of this part in the landmark array
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// A detected keypoint
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    /// Horizontal position, normalized to the image width
    pub x: f32,
    /// Vertical position, normalized to the image height (grows downwards)
    pub y: f32,
    /// Depth relative to the hips; smaller is closer to the camera
    #[serde(default)]
    pub z: f32,
    /// Detection confidence (0.0-1.0)
    #[serde(alias = "visibility")]
    pub confidence: f32,
}

impl Landmark {
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32, confidence: f32) -> Self {
        Self { x, y, z, confidence }
    }

    /// Whether the landmark is confident enough to be measured
    #[must_use]
    pub fn is_visible(&self, threshold: f32) -> bool {
        self.confidence >= threshold
    }

    /// Position as a vector
    #[must_use]
    pub fn position(&self) -> Vector3<f32> {
        Vector3::new(self.x, self.y, self.z)
    }
}

/// One detector output: every landmark at a single instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFrame", into = "RawFrame")]
pub struct Frame {
    timestamp_ms: u64,
    landmarks: [Landmark; NUM_BODY_LANDMARKS],
    overall_confidence: f32,
}

impl Frame {
    /// Create a frame whose overall confidence is the mean landmark confidence
    #[must_use]
    pub fn new(timestamp_ms: u64, landmarks: [Landmark; NUM_BODY_LANDMARKS]) -> Self {
        let overall_confidence = mean_confidence(&landmarks);
        Self {
            timestamp_ms,
            landmarks,
            overall_confidence,
        }
    }

    /// Build a frame from a landmark slice, rejecting a slice of the wrong length
    pub fn from_slice(timestamp_ms: u64, landmarks: &[Landmark], overall_confidence: Option<f32>) -> Result<Self> {
        let landmarks: [Landmark; NUM_BODY_LANDMARKS] = landmarks.try_into().map_err(|_| {
            Error::InvalidInput(format!(
                "expected {NUM_BODY_LANDMARKS} landmarks, got {}",
                landmarks.len()
            ))
        })?;
        let frame = Self::new(timestamp_ms, landmarks);
        Ok(match overall_confidence {
            Some(confidence) => frame.with_overall_confidence(confidence),
            None => frame,
        })
    }

    /// Override the detector's overall confidence
    #[must_use]
    pub fn with_overall_confidence(mut self, confidence: f32) -> Self {
        self.overall_confidence = confidence;
        self
    }

    /// Replace a single landmark
    pub fn set_landmark(&mut self, part: BodyPart, landmark: Landmark) {
        self.landmarks[part.index()] = landmark;
    }

    #[must_use]
    pub fn timestamp_ms(&self) -> u64 {
        self.timestamp_ms
    }

    #[must_use]
    pub fn overall_confidence(&self) -> f32 {
        self.overall_confidence
    }

    #[must_use]
    pub fn landmarks(&self) -> &[Landmark; NUM_BODY_LANDMARKS] {
        &self.landmarks
    }

    #[must_use]
    pub fn landmark(&self, part: BodyPart) -> &Landmark {
        &self.landmarks[part.index()]
    }

    /// Midpoint of two landmarks, if both are visible
    #[must_use]
    pub fn midpoint(&self, a: BodyPart, b: BodyPart, threshold: f32) -> Option<Vector3<f32>> {
        let (la, lb) = (self.landmark(a), self.landmark(b));
        (la.is_visible(threshold) && lb.is_visible(threshold)).then(|| (la.position() + lb.position()) * 0.5)
    }

    /// Positions of the given parts, if all are visible
    #[must_use]
    pub fn visible_positions<const N: usize>(&self, parts: [BodyPart; N], threshold: f32) -> Option<[Vector3<f32>; N]> {
        if parts.iter().all(|&part| self.landmark(part).is_visible(threshold)) {
            Some(parts.map(|part| self.landmark(part).position()))
        } else {
            None
        }
    }
}

impl Index<BodyPart> for Frame {
    type Output = Landmark;

    fn index(&self, part: BodyPart) -> &Landmark {
        self.landmark(part)
    }
}

/// Frame as handed over by an external producer, before shape validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFrame {
    pub timestamp_ms: u64,
    pub landmarks: Vec<Landmark>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall_confidence: Option<f32>,
}

impl TryFrom<RawFrame> for Frame {
    type Error = Error;

    fn try_from(raw: RawFrame) -> Result<Self> {
        Frame::from_slice(raw.timestamp_ms, &raw.landmarks, raw.overall_confidence)
    }
}

impl From<Frame> for RawFrame {
    fn from(frame: Frame) -> Self {
        Self {
            timestamp_ms: frame.timestamp_ms,
            landmarks: frame.landmarks.to_vec(),
            overall_confidence: Some(frame.overall_confidence),
        }
    }
}

#[allow(clippy::cast_precision_loss)] // 33 landmarks
fn mean_confidence(landmarks: &[Landmark]) -> f32 {
    if landmarks.is_empty() {
        return 0.0;
    }
    landmarks.iter().map(|lm| lm.confidence).sum::<f32>() / landmarks.len() as f32
}
