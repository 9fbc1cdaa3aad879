//! Repetition counting with hysteresis.
//!
//! The detector follows the tracked angle as an excursion from the exercise's
//! rest angle. A repetition starts when the excursion passes the down
//! threshold, turns once it has fallen back from its peak by the hysteresis
//! band, and is confirmed on a later frame when the excursion returns under
//! the up threshold. Every decision uses the lesser excursion of the raw and
//! smoothed angles: the smoothed angle keeps noise from starting a repetition,
//! the raw angle keeps filter lag from holding one open after the body is back
//! at rest. Range-of-motion extremes are taken from the raw angle.

use crate::{
    config::RepetitionConfig,
    exercise::{ExerciseProfile, MotionDirection},
};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Detector phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepPhase {
    #[default]
    Neutral,
    /// Moving away from rest
    InRepDown,
    /// Returning towards rest
    InRepUp,
    /// No usable angle; the phase before the pause is kept aside
    Paused,
}

/// Observed angular extremes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeOfMotion {
    pub min: f32,
    pub max: f32,
    pub range: f32,
}

impl RangeOfMotion {
    #[must_use]
    pub fn at(angle: f32) -> Self {
        Self {
            min: angle,
            max: angle,
            range: 0.0,
        }
    }

    /// Widen to include `angle`
    pub fn include(&mut self, angle: f32) {
        self.min = self.min.min(angle);
        self.max = self.max.max(angle);
        self.range = self.max - self.min;
    }

    /// Widen to include another range
    pub fn merge(&mut self, other: &Self) {
        self.include(other.min);
        self.include(other.max);
    }
}

/// Duration of a repetition against the exercise's controlled tempo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tempo {
    TooFast,
    Controlled,
    TooSlow,
}

impl Tempo {
    /// Classify `duration_ms` against the inclusive `(shortest, longest)` bounds
    #[must_use]
    pub fn classify(duration_ms: u64, (shortest, longest): (u64, u64)) -> Self {
        if duration_ms < shortest {
            Self::TooFast
        } else if duration_ms > longest {
            Self::TooSlow
        } else {
            Self::Controlled
        }
    }
}

/// One confirmed repetition
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RepetitionRecord {
    /// 1-based position in the session
    pub number: u32,
    /// Timestamp of the frame that started the repetition
    pub started_at_ms: u64,
    pub completed_at_ms: u64,
    pub duration_ms: u64,
    /// Raw extremes of this repetition
    pub range: RangeOfMotion,
    pub tempo: Tempo,
}

/// Tracked angle for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackedAngle {
    pub raw: f32,
    pub smoothed: f32,
}

/// What a detector update did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepEvent {
    Unchanged,
    /// A full cycle was confirmed
    Completed,
    /// An in-progress repetition was dropped after a long pause
    Discarded,
}

/// Hysteresis state machine over one tracked angle
#[derive(Debug, Clone)]
pub struct RepetitionDetector {
    rest_angle: f32,
    direction: MotionDirection,
    down_threshold: f32,
    up_threshold: f32,
    grace_ms: u64,
    tempo_ms: (u64, u64),
    counts_repetitions: bool,

    phase: RepPhase,
    resume_phase: RepPhase,
    paused_since: Option<u64>,
    last_sample_at: Option<u64>,
    started_at: Option<u64>,

    rep_count: u32,
    peak_excursion: f32,
    /// Raw extremes since the last confirmed repetition
    window: Option<RangeOfMotion>,
    range: Option<RangeOfMotion>,
    log: VecDeque<RepetitionRecord>,
    log_capacity: usize,
}

impl RepetitionDetector {
    #[must_use]
    pub fn new(profile: &ExerciseProfile, config: &RepetitionConfig) -> Self {
        let log_capacity = config.log_capacity.max(1);
        Self {
            rest_angle: config.rest_angle.unwrap_or(profile.rest_angle),
            direction: profile.direction,
            down_threshold: config.hysteresis_down_threshold,
            up_threshold: config.hysteresis_up_threshold,
            grace_ms: config.grace_ms,
            tempo_ms: profile.tempo_ms,
            counts_repetitions: profile.counts_repetitions,
            phase: RepPhase::Neutral,
            resume_phase: RepPhase::Neutral,
            paused_since: None,
            last_sample_at: None,
            started_at: None,
            rep_count: 0,
            peak_excursion: 0.0,
            window: None,
            range: None,
            log: VecDeque::with_capacity(log_capacity),
            log_capacity,
        }
    }

    /// Feed one frame's tracked angle, `None` when it could not be measured
    pub fn update(&mut self, angle: Option<TrackedAngle>, timestamp_ms: u64) -> RepEvent {
        let Some(angle) = angle else {
            let since = self.last_sample_at.unwrap_or(timestamp_ms);
            self.pause(since);
            return RepEvent::Unchanged;
        };

        let mut event = RepEvent::Unchanged;
        if self.phase == RepPhase::Paused {
            event = self.resume(timestamp_ms);
        }
        self.last_sample_at = Some(timestamp_ms);

        if !self.counts_repetitions {
            self.range.get_or_insert_with(|| RangeOfMotion::at(angle.raw)).include(angle.raw);
            return event;
        }

        self.window.get_or_insert_with(|| RangeOfMotion::at(angle.raw)).include(angle.raw);

        if self.step(angle, timestamp_ms) {
            RepEvent::Completed
        } else {
            event
        }
    }

    /// Freeze in `Paused`, counting the grace window from `since`
    pub fn pause(&mut self, since: u64) {
        if self.phase == RepPhase::Paused {
            return;
        }
        debug!("Repetition detector paused in {:?}", self.phase);
        self.resume_phase = self.phase;
        self.phase = RepPhase::Paused;
        self.paused_since = Some(since);
    }

    /// Drop an unfinished repetition. Returns whether one was in progress.
    pub fn finalize(&mut self) -> bool {
        let discarded = self.is_mid_rep();
        if discarded {
            debug!("Unfinished repetition dropped at stop");
            self.reset_cycle();
        }
        discarded
    }

    #[must_use]
    pub fn phase(&self) -> RepPhase {
        self.phase
    }

    /// Confirmed repetitions; `None` for exercises that are not counted
    #[must_use]
    pub fn rep_count(&self) -> Option<u32> {
        self.counts_repetitions.then_some(self.rep_count)
    }

    /// Session-wide range of motion over confirmed repetitions (every sample for holds)
    #[must_use]
    pub fn range_of_motion(&self) -> Option<RangeOfMotion> {
        self.range
    }

    /// The most recent confirmed repetitions, oldest first
    pub fn repetitions(&self) -> impl Iterator<Item = &RepetitionRecord> {
        self.log.iter()
    }

    /// Whether a repetition has started and not yet completed
    #[must_use]
    pub fn is_mid_rep(&self) -> bool {
        let phase = if self.phase == RepPhase::Paused {
            self.resume_phase
        } else {
            self.phase
        };
        matches!(phase, RepPhase::InRepDown | RepPhase::InRepUp)
    }

    fn resume(&mut self, timestamp_ms: u64) -> RepEvent {
        let paused_for = self
            .paused_since
            .map_or(0, |since| timestamp_ms.saturating_sub(since));
        self.paused_since = None;

        if paused_for > self.grace_ms && matches!(self.resume_phase, RepPhase::InRepDown | RepPhase::InRepUp) {
            warn!("Repetition discarded after a {paused_for} ms pause");
            self.reset_cycle();
            return RepEvent::Discarded;
        }

        debug!("Repetition detector resumed in {:?}", self.resume_phase);
        self.phase = self.resume_phase;
        RepEvent::Unchanged
    }

    fn reset_cycle(&mut self) {
        self.phase = RepPhase::Neutral;
        self.resume_phase = RepPhase::Neutral;
        self.peak_excursion = 0.0;
        self.started_at = None;
        self.window = None;
    }

    /// Advance the state machine; returns true when a repetition completes
    fn step(&mut self, angle: TrackedAngle, timestamp_ms: u64) -> bool {
        let excursion = self.direction.excursion(self.rest_angle, angle.smoothed);
        let settled = excursion.min(self.direction.excursion(self.rest_angle, angle.raw));
        let band = self.down_threshold - self.up_threshold;

        match self.phase {
            RepPhase::Neutral => {
                if settled > self.down_threshold {
                    debug!("Repetition started at {:.1}°", angle.smoothed);
                    self.phase = RepPhase::InRepDown;
                    self.peak_excursion = excursion;
                    self.started_at = Some(timestamp_ms);
                }
                false
            }
            RepPhase::InRepDown => {
                self.peak_excursion = self.peak_excursion.max(excursion);
                if settled < self.peak_excursion - band {
                    debug!("Repetition turning at peak excursion {:.1}°", self.peak_excursion);
                    self.phase = RepPhase::InRepUp;
                }
                false
            }
            RepPhase::InRepUp => {
                if settled < self.up_threshold {
                    self.complete(angle.raw, timestamp_ms);
                    true
                } else {
                    if settled > self.peak_excursion {
                        debug!("Repetition deepened again");
                        self.peak_excursion = settled;
                        self.phase = RepPhase::InRepDown;
                    }
                    false
                }
            }
            // resume() always leaves Paused before a step
            RepPhase::Paused => false,
        }
    }

    fn complete(&mut self, raw: f32, timestamp_ms: u64) {
        self.rep_count += 1;
        let started_at = self.started_at.unwrap_or(timestamp_ms);
        let window = self.window.unwrap_or_else(|| RangeOfMotion::at(raw));
        match self.range.as_mut() {
            Some(range) => range.merge(&window),
            None => self.range = Some(window),
        }

        let duration_ms = timestamp_ms.saturating_sub(started_at);
        let record = RepetitionRecord {
            number: self.rep_count,
            started_at_ms: started_at,
            completed_at_ms: timestamp_ms,
            duration_ms,
            range: window,
            tempo: Tempo::classify(duration_ms, self.tempo_ms),
        };
        if self.log.len() >= self.log_capacity {
            self.log.pop_front();
        }
        self.log.push_back(record);

        info!(
            "Repetition {} complete in {duration_ms} ms ({:?}, peak excursion {:.1}°)",
            self.rep_count, record.tempo, self.peak_excursion
        );
        self.reset_cycle();
        self.window = Some(RangeOfMotion::at(raw));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exercise::ExerciseType;

    fn detector(exercise: ExerciseType) -> RepetitionDetector {
        RepetitionDetector::new(exercise.profile(), &RepetitionConfig::default())
    }

    fn same(angle: f32) -> Option<TrackedAngle> {
        Some(TrackedAngle {
            raw: angle,
            smoothed: angle,
        })
    }

    fn feed(detector: &mut RepetitionDetector, angles: &[f32], start: u64) -> u64 {
        let mut ts = start;
        for &angle in angles {
            detector.update(same(angle), ts);
            ts += 100;
        }
        ts
    }

    #[test]
    fn test_single_cycle() {
        let mut d = detector(ExerciseType::Squat);
        feed(&mut d, &[170.0, 150.0, 120.0, 90.0], 0);
        assert_eq!(d.phase(), RepPhase::InRepDown);
        d.update(same(120.0), 400);
        assert_eq!(d.phase(), RepPhase::InRepUp);
        assert_eq!(d.update(same(168.0), 500), RepEvent::Completed);
        assert_eq!(d.rep_count(), Some(1));
        assert_eq!(d.phase(), RepPhase::Neutral);

        let rom = d.range_of_motion().unwrap();
        assert_eq!(rom.min, 90.0);
        assert_eq!(rom.max, 170.0);
        assert_eq!(rom.range, 80.0);
    }

    #[test]
    fn test_shallow_dip_is_not_a_rep() {
        let mut d = detector(ExerciseType::Squat);
        feed(&mut d, &[170.0, 160.0, 156.0, 160.0, 170.0], 0);
        assert_eq!(d.rep_count(), Some(0));
        assert_eq!(d.phase(), RepPhase::Neutral);
        assert!(d.range_of_motion().is_none());
    }

    #[test]
    fn test_jitter_near_bottom_does_not_double_count() {
        let mut d = detector(ExerciseType::Squat);
        feed(&mut d, &[170.0, 130.0, 90.0, 95.0, 88.0, 96.0, 90.0, 130.0, 169.0], 0);
        assert_eq!(d.rep_count(), Some(1));
    }

    #[test]
    fn test_extension_exercise() {
        let mut d = detector(ExerciseType::LateralRaise);
        feed(&mut d, &[15.0, 40.0, 80.0, 90.0, 60.0, 30.0, 16.0], 0);
        assert_eq!(d.rep_count(), Some(1));
        assert_eq!(d.range_of_motion().unwrap().max, 90.0);
    }

    #[test]
    fn test_short_pause_resumes_phase() {
        let mut d = detector(ExerciseType::Squat);
        feed(&mut d, &[170.0, 120.0, 90.0], 0);
        d.update(None, 300);
        assert_eq!(d.phase(), RepPhase::Paused);
        assert!(d.is_mid_rep());
        assert_eq!(d.update(same(110.0), 700), RepEvent::Unchanged);
        assert_eq!(d.phase(), RepPhase::InRepUp);
        assert_eq!(d.update(same(170.0), 800), RepEvent::Completed);
    }

    #[test]
    fn test_long_pause_discards_rep() {
        let mut d = detector(ExerciseType::Squat);
        feed(&mut d, &[170.0, 120.0, 90.0], 0);
        d.update(None, 300);
        assert_eq!(d.update(same(170.0), 2000), RepEvent::Discarded);
        assert_eq!(d.phase(), RepPhase::Neutral);
        assert_eq!(d.rep_count(), Some(0));
        assert!(d.range_of_motion().is_none());
    }

    #[test]
    fn test_long_pause_at_rest_is_harmless() {
        let mut d = detector(ExerciseType::Squat);
        d.update(same(170.0), 0);
        d.pause(0);
        assert_eq!(d.update(same(170.0), 5000), RepEvent::Unchanged);
        assert_eq!(d.phase(), RepPhase::Neutral);
    }

    #[test]
    fn test_finalize_drops_partial_rep() {
        let mut d = detector(ExerciseType::Squat);
        feed(&mut d, &[170.0, 120.0], 0);
        assert!(d.finalize());
        assert_eq!(d.rep_count(), Some(0));
        assert!(!d.finalize());
    }

    #[test]
    fn test_hold_tracks_range_without_counting() {
        let mut d = detector(ExerciseType::Plank);
        feed(&mut d, &[175.0, 170.0, 178.0], 0);
        assert_eq!(d.rep_count(), None);
        let rom = d.range_of_motion().unwrap();
        assert_eq!((rom.min, rom.max), (170.0, 178.0));
    }

    #[test]
    fn test_completion_waits_for_the_return_phase() {
        let mut d = detector(ExerciseType::Squat);
        d.update(same(170.0), 0);
        d.update(same(90.0), 100);
        assert_eq!(d.phase(), RepPhase::InRepDown);

        // Straight back to rest only turns the repetition
        assert_eq!(d.update(same(170.0), 200), RepEvent::Unchanged);
        assert_eq!(d.phase(), RepPhase::InRepUp);
        assert_eq!(d.update(same(170.0), 300), RepEvent::Completed);
    }

    #[test]
    fn test_lagging_smoothed_angle_does_not_hold_rep_open() {
        let mut d = detector(ExerciseType::Squat);
        feed(&mut d, &[170.0, 120.0, 60.0], 0);
        let lagging = |raw: f32, smoothed: f32| Some(TrackedAngle { raw, smoothed });

        d.update(lagging(120.0, 90.0), 300);
        assert_eq!(d.phase(), RepPhase::InRepUp);
        assert_eq!(d.update(lagging(170.0, 130.0), 400), RepEvent::Completed);

        // Still catching up, but the body is at rest
        d.update(lagging(170.0, 150.0), 500);
        assert_eq!(d.phase(), RepPhase::Neutral);
        assert_eq!(d.rep_count(), Some(1));
    }

    #[test]
    fn test_raw_spike_does_not_start_rep() {
        let mut d = detector(ExerciseType::Squat);
        d.update(same(170.0), 0);
        d.update(Some(TrackedAngle { raw: 120.0, smoothed: 160.0 }), 100);
        assert_eq!(d.phase(), RepPhase::Neutral);
    }

    #[test]
    fn test_repetition_log() {
        let mut d = detector(ExerciseType::Squat);
        // 300 ms from start to finish, then 1100 ms
        feed(&mut d, &[170.0, 120.0, 90.0, 130.0, 170.0], 0);
        let slow = [
            170.0, 150.0, 120.0, 100.0, 90.0, 90.0, 100.0, 110.0, 130.0, 150.0, 160.0, 165.0, 166.0, 170.0,
        ];
        feed(&mut d, &slow, 500);

        let log: Vec<_> = d.repetitions().copied().collect();
        assert_eq!(log.len(), 2);
        assert_eq!((log[0].number, log[0].started_at_ms, log[0].completed_at_ms), (1, 100, 400));
        assert_eq!(log[0].tempo, Tempo::TooFast);
        assert_eq!((log[0].range.min, log[0].range.max), (90.0, 170.0));

        assert_eq!(log[1].number, 2);
        assert_eq!(log[1].duration_ms, 1100);
        assert_eq!(log[1].tempo, Tempo::Controlled);
    }

    #[test]
    fn test_repetition_log_is_bounded() {
        let config = RepetitionConfig {
            log_capacity: 2,
            ..RepetitionConfig::default()
        };
        let mut d = RepetitionDetector::new(ExerciseType::Squat.profile(), &config);
        let mut ts = 0;
        for _ in 0..3 {
            ts = feed(&mut d, &[170.0, 100.0, 130.0, 170.0], ts);
        }
        assert_eq!(d.rep_count(), Some(3));
        let numbers: Vec<u32> = d.repetitions().map(|rep| rep.number).collect();
        assert_eq!(numbers, vec![2, 3]);
    }

    #[test]
    fn test_tempo_classification() {
        let bounds = (1000, 10_000);
        assert_eq!(Tempo::classify(999, bounds), Tempo::TooFast);
        assert_eq!(Tempo::classify(1000, bounds), Tempo::Controlled);
        assert_eq!(Tempo::classify(10_000, bounds), Tempo::Controlled);
        assert_eq!(Tempo::classify(10_001, bounds), Tempo::TooSlow);
    }

    #[test]
    fn test_rest_angle_override() {
        let config = RepetitionConfig {
            rest_angle: Some(150.0),
            ..RepetitionConfig::default()
        };
        let mut d = RepetitionDetector::new(ExerciseType::Squat.profile(), &config);
        // 140 is already past the default entry line but not past 150 - 15
        d.update(same(140.0), 0);
        assert_eq!(d.phase(), RepPhase::Neutral);
        d.update(same(130.0), 100);
        assert_eq!(d.phase(), RepPhase::InRepDown);
    }
}
