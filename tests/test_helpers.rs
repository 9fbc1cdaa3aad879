//! Helper functions and utilities for tests
#![allow(dead_code)]

use movement_analysis::{
    AnalysisResult, BodyPart, Config, ExerciseSession, ExerciseType, Frame, Landmark, Result,
};

/// Landmark confidence used for well detected frames
pub const HIGH_CONFIDENCE: f32 = 0.95;

/// Landmark confidence used for dropped frames
pub const LOW_CONFIDENCE: f32 = 0.1;

const SHIN_LENGTH: f32 = 0.18;

fn lm(x: f32, y: f32, z: f32, confidence: f32) -> Landmark {
    Landmark::new(x, y, z, confidence)
}

/// Front view of an upright body with both knees bent to `knee_angle` degrees.
///
/// The shin swings forward (towards the camera, -z) as the knee bends, so the
/// frontal plane stays clean and only the knee angle changes.
pub fn pose_with_knee_angle(timestamp_ms: u64, knee_angle: f32, confidence: f32) -> Frame {
    let mut landmarks = [lm(0.5, 0.5, 0.0, confidence); BodyPart::COUNT];
    let mut set = |part: BodyPart, x: f32, y: f32, z: f32| {
        landmarks[part.index()] = lm(x, y, z, confidence);
    };

    set(BodyPart::Nose, 0.50, 0.15, 0.0);
    set(BodyPart::LeftEar, 0.46, 0.17, 0.0);
    set(BodyPart::RightEar, 0.54, 0.17, 0.0);
    set(BodyPart::LeftShoulder, 0.40, 0.30, 0.0);
    set(BodyPart::RightShoulder, 0.60, 0.30, 0.0);
    set(BodyPart::LeftElbow, 0.38, 0.45, 0.0);
    set(BodyPart::RightElbow, 0.62, 0.45, 0.0);
    set(BodyPart::LeftWrist, 0.37, 0.58, 0.0);
    set(BodyPart::RightWrist, 0.63, 0.58, 0.0);
    set(BodyPart::LeftHip, 0.44, 0.60, 0.0);
    set(BodyPart::RightHip, 0.56, 0.60, 0.0);
    set(BodyPart::LeftKnee, 0.44, 0.78, 0.0);
    set(BodyPart::RightKnee, 0.56, 0.78, 0.0);

    // knee->hip points straight up, knee->ankle is rotated by the knee angle
    let theta = knee_angle.to_radians();
    let ankle_dy = -SHIN_LENGTH * theta.cos();
    let ankle_dz = -SHIN_LENGTH * theta.sin();
    set(BodyPart::LeftAnkle, 0.44, 0.78 + ankle_dy, ankle_dz);
    set(BodyPart::RightAnkle, 0.56, 0.78 + ankle_dy, ankle_dz);
    set(BodyPart::LeftHeel, 0.44, 0.80 + ankle_dy, ankle_dz);
    set(BodyPart::RightHeel, 0.56, 0.80 + ankle_dy, ankle_dz);

    Frame::new(timestamp_ms, landmarks)
}

/// Standing pose with nearly straight knees
pub fn standing_pose(timestamp_ms: u64) -> Frame {
    pose_with_knee_angle(timestamp_ms, 170.0, HIGH_CONFIDENCE)
}

/// Frame whose landmarks are all below the visibility threshold
pub fn low_confidence_frame(timestamp_ms: u64) -> Frame {
    pose_with_knee_angle(timestamp_ms, 170.0, LOW_CONFIDENCE)
}

/// High-confidence frames tracing `angles`, spaced `interval_ms` apart from `start_ms`
pub fn squat_frames(angles: &[f32], start_ms: u64, interval_ms: u64) -> Vec<Frame> {
    angles
        .iter()
        .zip(0u64..)
        .map(|(&angle, i)| pose_with_knee_angle(start_ms + i * interval_ms, angle, HIGH_CONFIDENCE))
        .collect()
}

/// Knee angle of a 170° -> 30° -> 170° cosine cycle at time `t_ms`
pub fn cycle_angle(t_ms: u64, period_ms: u64) -> f32 {
    #[allow(clippy::cast_precision_loss)]
    let phase = (t_ms % period_ms) as f32 / period_ms as f32;
    100.0 + 70.0 * (2.0 * std::f32::consts::PI * phase).cos()
}

/// Timestamps of `duration_ms` sampled at `rate_hz`, both ends included
pub fn timestamps(duration_ms: u64, rate_hz: u64) -> Vec<u64> {
    (0..=duration_ms * rate_hz / 1000).map(|i| i * 1000 / rate_hz).collect()
}

/// Start a session with the default configuration
pub fn create_test_session(exercise: ExerciseType) -> Result<ExerciseSession> {
    ExerciseSession::start(exercise, Config::default())
}

/// Feed frames and return every snapshot
pub fn run_frames(session: &mut ExerciseSession, frames: &[Frame]) -> Result<Vec<AnalysisResult>> {
    frames.iter().map(|frame| session.process_frame(frame)).collect()
}

/// Assert that every float in a result is finite and consistent
pub fn assert_result_consistent(result: &AnalysisResult) {
    assert!(result.score <= 100);
    if let Some(rom) = result.range_of_motion {
        assert!(rom.min.is_finite() && rom.max.is_finite());
        assert!(rom.min <= rom.max, "min {} > max {}", rom.min, rom.max);
        assert!((rom.range - (rom.max - rom.min)).abs() < 1e-3);
    }
    assert!((0.0..=1.0).contains(&result.diagnostics.dropped_frame_rate));
    if let Some(stability) = result.stability {
        assert!(stability <= 100);
    }

    let logged = u32::try_from(result.repetitions.len()).unwrap();
    assert!(logged <= result.rep_count.unwrap_or(0));
    for pair in result.repetitions.windows(2) {
        assert_eq!(pair[1].number, pair[0].number + 1);
    }
    for rep in &result.repetitions {
        assert_eq!(rep.duration_ms, rep.completed_at_ms - rep.started_at_ms);
    }
}
