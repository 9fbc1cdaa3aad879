//! Repetition counting through full sessions

mod test_helpers;

use movement_analysis::{
    config::Config,
    repetition::{RepPhase, RepetitionDetector, TrackedAngle},
    ExerciseSession, ExerciseType,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use test_helpers::{create_test_session, cycle_angle, pose_with_knee_angle, squat_frames, timestamps, HIGH_CONFIDENCE};

const CYCLE_MS: u64 = 4000;
const CYCLES: u64 = 10;

fn count_reps_at_rate(rate_hz: u64) -> Option<u32> {
    let mut session = create_test_session(ExerciseType::Squat).unwrap();
    for ts in timestamps(CYCLE_MS * CYCLES, rate_hz) {
        let frame = pose_with_knee_angle(ts, cycle_angle(ts, CYCLE_MS), HIGH_CONFIDENCE);
        session.process_frame(&frame).unwrap();
    }
    session.stop().rep_count
}

#[test]
fn test_rate_independence() {
    assert_eq!(count_reps_at_rate(5), Some(10));
    assert_eq!(count_reps_at_rate(30), Some(10));
}

#[test]
fn test_intermediate_rates() {
    for rate in [10, 15, 24] {
        assert_eq!(count_reps_at_rate(rate), Some(10), "rate {rate} Hz");
    }
}

#[test]
fn test_noisy_signal_counts_each_rep_once() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut session = create_test_session(ExerciseType::Squat).unwrap();

    let period = 3000;
    let duration = 5 * period;
    for ts in timestamps(duration + 500, 30) {
        let clean = if ts <= duration {
            115.0 + 55.0 * cycle_phase_cos(ts, period)
        } else {
            170.0
        };
        let angle = clean + rng.gen_range(-3.0..3.0);
        session
            .process_frame(&pose_with_knee_angle(ts, angle, HIGH_CONFIDENCE))
            .unwrap();
    }

    assert_eq!(session.stop().rep_count, Some(5));
}

fn cycle_phase_cos(t_ms: u64, period_ms: u64) -> f32 {
    (cycle_angle(t_ms, period_ms) - 100.0) / 70.0
}

#[test]
fn test_rep_count_is_monotonic() {
    let mut session = create_test_session(ExerciseType::Squat).unwrap();
    let mut previous = 0;
    for ts in timestamps(3 * CYCLE_MS, 30) {
        let result = session
            .process_frame(&pose_with_knee_angle(ts, cycle_angle(ts, CYCLE_MS), HIGH_CONFIDENCE))
            .unwrap();
        let count = result.rep_count.unwrap();
        assert!(count == previous || count == previous + 1);
        previous = count;
    }
    assert_eq!(previous, 3);
}

#[test]
fn test_partial_rep_not_counted_at_stop() {
    let mut session = create_test_session(ExerciseType::Squat).unwrap();
    for frame in squat_frames(&[170.0, 130.0, 90.0, 60.0, 90.0, 130.0], 0, 200) {
        session.process_frame(&frame).unwrap();
    }
    assert_ne!(session.latest().diagnostics.phase, RepPhase::Neutral);

    let summary = session.stop();
    assert_eq!(summary.rep_count, Some(0));
    assert!(summary.range_of_motion.is_none());
    assert_eq!(summary.diagnostics.phase, RepPhase::Neutral);
}

#[test]
fn test_shallow_reps_are_not_counted() {
    let mut session = create_test_session(ExerciseType::Squat).unwrap();
    let angles: Vec<f32> = (0..20).map(|i| if i % 2 == 0 { 170.0 } else { 160.0 }).collect();
    for frame in squat_frames(&angles, 0, 200) {
        session.process_frame(&frame).unwrap();
    }
    assert_eq!(session.stop().rep_count, Some(0));
}

#[test]
fn test_range_of_motion_widens_over_reps() {
    let mut session = create_test_session(ExerciseType::Squat).unwrap();
    let shallow = [170.0, 130.0, 100.0, 130.0, 170.0, 170.0];
    let deep = [170.0, 120.0, 60.0, 120.0, 170.0, 170.0];

    let mut frames = squat_frames(&shallow, 0, 200);
    frames.extend(squat_frames(&deep, 1200, 200));
    let mut results = Vec::new();
    for frame in &frames {
        results.push(session.process_frame(frame).unwrap());
    }

    let after_first = &results[shallow.len() - 1];
    assert_eq!(after_first.rep_count, Some(1));
    assert!((after_first.range_of_motion.unwrap().min - 100.0).abs() < 0.01);

    let last = results.last().unwrap();
    assert_eq!(last.rep_count, Some(2));
    assert!((last.range_of_motion.unwrap().min - 60.0).abs() < 0.01);
    // 110 degrees of range against an 80 degree target
    assert_eq!(last.score, 100);
}

#[test]
fn test_shallow_range_caps_score() {
    let mut session = create_test_session(ExerciseType::Squat).unwrap();
    for frame in squat_frames(&[170.0, 150.0, 130.0, 150.0, 170.0, 170.0], 0, 200) {
        session.process_frame(&frame).unwrap();
    }
    let result = session.stop();
    assert_eq!(result.rep_count, Some(1));
    // 40 of 80 degrees reached
    assert_eq!(result.score, 75);
    assert!(result
        .feedback
        .iter()
        .any(|line| line.starts_with("Increase your range of motion")));
}

#[test]
fn test_extension_exercise_counts() {
    let config = Config::default();
    let profile = ExerciseType::ShoulderPress.profile();
    let mut detector = RepetitionDetector::new(profile, &config.repetition);
    let mut ts = 0;
    for _ in 0..3 {
        for angle in [85.0, 110.0, 140.0, 165.0, 140.0, 110.0, 85.0] {
            detector.update(
                Some(TrackedAngle {
                    raw: angle,
                    smoothed: angle,
                }),
                ts,
            );
            ts += 100;
        }
    }
    assert_eq!(detector.rep_count(), Some(3));
    let rom = detector.range_of_motion().unwrap();
    assert_eq!((rom.min, rom.max), (85.0, 165.0));
}

#[test]
fn test_rest_angle_from_config() {
    let mut config = Config::default();
    config.repetition.rest_angle = Some(150.0);
    let mut session = ExerciseSession::start(ExerciseType::Squat, config).unwrap();
    // Never returns within 5 degrees of the default 170 rest angle
    for frame in squat_frames(&[150.0, 110.0, 80.0, 110.0, 150.0, 150.0], 0, 200) {
        session.process_frame(&frame).unwrap();
    }
    assert_eq!(session.stop().rep_count, Some(1));
}
