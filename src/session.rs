//! Exercise session: the per-caller owner of all analysis state.
//!
//! A session is created for one exercise, fed frames in timestamp order and
//! stopped once. Every call returns an [`AnalysisResult`] snapshot. Malformed
//! frames are rejected with [`Error::InvalidInput`] before any state changes;
//! every other problem (low confidence, degenerate geometry, idle gaps) is
//! absorbed and reported through diagnostics and feedback.

use crate::{
    config::Config,
    error::Anomaly,
    exercise::ExerciseType,
    geometry::{sample_joint, AngleRejection, JointId},
    history::{AngleHistory, Statistics},
    landmarks::Frame,
    posture::{PostureClassifier, PostureIssue},
    repetition::{RangeOfMotion, RepEvent, RepPhase, RepetitionDetector, RepetitionRecord, TrackedAngle},
    score::{ExecutionQuality, FeedbackSignals, ScoreAggregator},
    smoother::SignalSmoother,
    utils::ratio,
    Error, Result,
};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Created,
    Active,
    Closed,
}

/// Health of the input stream
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostics {
    /// Frames skipped for low overall confidence
    pub dropped_frame_count: u32,
    /// Overall confidence of the latest frame
    pub last_confidence: Option<f32>,
    pub processed_frames: u32,
    /// Samples discarded for degenerate geometry
    pub arithmetic_anomalies: u32,
    pub stale_joints: Vec<JointId>,
    pub stale_warnings: u32,
    /// A stale-session warning was raised on the latest frame
    pub stale_warning: bool,
    /// Dropped-frame rate over the detection window
    pub dropped_frame_rate: f32,
    pub no_detection: bool,
    pub phase: RepPhase,
    /// Conditions absorbed while processing the latest frame
    pub anomalies: Vec<Anomaly>,
}

/// Snapshot returned by every session call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    /// Timestamp of the latest processed frame
    pub timestamp_ms: Option<u64>,
    pub exercise_type: ExerciseType,
    /// Form quality, 0-100
    pub score: u8,
    pub quality: ExecutionQuality,
    /// `None` for exercises that are held rather than repeated
    pub rep_count: Option<u32>,
    pub range_of_motion: Option<RangeOfMotion>,
    /// Most recent confirmed repetitions, oldest first
    pub repetitions: Vec<RepetitionRecord>,
    /// Steadiness of the tracked joints over the history window, 0-100
    pub stability: Option<u8>,
    pub posture_issues: Vec<PostureIssue>,
    pub feedback: Vec<String>,
    pub diagnostics: Diagnostics,
}

/// State of one exercise session
pub struct ExerciseSession {
    exercise: ExerciseType,
    config: Config,
    state: SessionState,
    joints: Vec<JointId>,

    smoother: SignalSmoother,
    detector: RepetitionDetector,
    posture: PostureClassifier,
    scorer: ScoreAggregator,
    history: AngleHistory,

    /// Rolling record of dropped (true) and usable (false) frames
    detections: VecDeque<bool>,
    started_at: Option<u64>,
    last_frame_at: Option<u64>,
    /// Start of the current run of dropped frames (the last usable frame when there is one)
    dropout_since: Option<u64>,
    dropout_warned: bool,
    dropped_frame_count: u32,
    processed_frames: u32,
    arithmetic_anomalies: u32,
    stale_warnings: u32,
    last_confidence: Option<f32>,
    frame_anomalies: Vec<Anomaly>,

    latest: AnalysisResult,
}

impl ExerciseSession {
    /// Create a session in the `Created` state. `exercise` takes precedence over `config.exercise_type`.
    pub fn new(exercise: ExerciseType, config: Config) -> Result<Self> {
        config.validate()?;

        let profile = exercise.profile();
        let joints = config.joints_for(exercise);
        let smoother = SignalSmoother::new(&config.smoothing)?;
        let detector = RepetitionDetector::new(profile, &config.repetition);
        let posture = PostureClassifier::new(exercise, &config.posture, config.visibility_threshold);
        let scorer = ScoreAggregator::new(profile);
        let history = AngleHistory::new(config.history_capacity);

        let mut session = Self {
            exercise,
            state: SessionState::Created,
            joints,
            smoother,
            detector,
            posture,
            scorer,
            history,
            detections: VecDeque::with_capacity(config.detection_window),
            started_at: None,
            last_frame_at: None,
            dropout_since: None,
            dropout_warned: false,
            dropped_frame_count: 0,
            processed_frames: 0,
            arithmetic_anomalies: 0,
            stale_warnings: 0,
            last_confidence: None,
            frame_anomalies: Vec::new(),
            latest: empty_result(exercise),
            config,
        };
        session.latest = session.snapshot();
        Ok(session)
    }

    /// Create and activate a session
    pub fn start(exercise: ExerciseType, config: Config) -> Result<Self> {
        let mut session = Self::new(exercise, config)?;
        session.activate();
        Ok(session)
    }

    /// Move a created session to `Active`
    pub fn activate(&mut self) {
        if self.state == SessionState::Created {
            info!("Session started: {} tracking {:?}", self.exercise, self.joints);
            self.state = SessionState::Active;
        }
    }

    /// Analyse one frame.
    ///
    /// Only active sessions change state; created and closed sessions return
    /// their current snapshot.
    pub fn process_frame(&mut self, frame: &Frame) -> Result<AnalysisResult> {
        if self.state != SessionState::Active {
            return Ok(self.latest.clone());
        }
        self.validate(frame)?;

        let timestamp_ms = frame.timestamp_ms();
        let confidence = frame.overall_confidence();
        let previous = self.last_frame_at;
        self.frame_anomalies.clear();

        if let Some(last) = previous {
            let gap = timestamp_ms - last;
            if gap > self.config.idle_timeout_ms {
                warn!("Session idle for {gap} ms, repetition tracking paused");
                self.detector.pause(last);
                self.raise_stale_warning();
            }
        }

        self.started_at.get_or_insert(timestamp_ms);
        self.last_frame_at = Some(timestamp_ms);
        self.processed_frames = self.processed_frames.saturating_add(1);
        self.last_confidence = Some(confidence);

        let usable = confidence >= self.config.visibility_threshold;
        if self.detections.len() >= self.config.detection_window {
            self.detections.pop_front();
        }
        self.detections.push_back(!usable);

        if usable {
            self.dropout_since = None;
            let dropout_warned = std::mem::take(&mut self.dropout_warned);
            if self.analyse(frame) == RepEvent::Discarded
                && !dropout_warned
                && !self.frame_anomalies.contains(&Anomaly::StaleSessionWarning)
            {
                self.raise_stale_warning();
            }
        } else {
            debug!("Frame {timestamp_ms} dropped: confidence {confidence:.2}");
            self.dropped_frame_count = self.dropped_frame_count.saturating_add(1);
            self.frame_anomalies.push(Anomaly::LowConfidenceFrame);
            for &joint in &self.joints {
                self.smoother.update(joint, None, timestamp_ms);
            }
            self.detector.update(None, timestamp_ms);
            self.posture.interrupt();

            let since = *self.dropout_since.get_or_insert(previous.unwrap_or(timestamp_ms));
            let dropout_ms = timestamp_ms - since;
            if !self.dropout_warned && dropout_ms > self.config.idle_timeout_ms {
                warn!("No usable frame for {dropout_ms} ms");
                self.dropout_warned = true;
                if !self.frame_anomalies.contains(&Anomaly::StaleSessionWarning) {
                    self.raise_stale_warning();
                }
            }
        }

        self.latest = self.snapshot();
        Ok(self.latest.clone())
    }

    /// Close the session and return the terminal result. Repeated calls return the same result.
    pub fn stop(&mut self) -> AnalysisResult {
        if self.state == SessionState::Closed {
            return self.latest.clone();
        }

        self.detector.finalize();
        self.state = SessionState::Closed;
        self.frame_anomalies.clear();
        self.latest = self.snapshot();

        let duration = match (self.started_at, self.last_frame_at) {
            (Some(start), Some(end)) => end - start,
            _ => 0,
        };
        info!(
            "Session stopped: {} after {} frames over {duration} ms, score {}, reps {:?}",
            self.exercise, self.processed_frames, self.latest.score, self.latest.rep_count
        );
        self.latest.clone()
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn exercise_type(&self) -> ExerciseType {
        self.exercise
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Joints averaged into the tracked angle
    #[must_use]
    pub fn joints(&self) -> &[JointId] {
        &self.joints
    }

    /// The most recent snapshot
    #[must_use]
    pub fn latest(&self) -> &AnalysisResult {
        &self.latest
    }

    #[must_use]
    pub fn history(&self) -> &AngleHistory {
        &self.history
    }

    /// Statistics of a joint's recent raw angles
    #[must_use]
    pub fn joint_statistics(&self, joint: JointId) -> Option<Statistics> {
        self.history.statistics(joint)
    }

    fn validate(&self, frame: &Frame) -> Result<()> {
        let timestamp_ms = frame.timestamp_ms();
        if let Some(last) = self.last_frame_at {
            if timestamp_ms <= last {
                warn!("Rejected frame: timestamp {timestamp_ms} not after {last}");
                return Err(Error::InvalidInput(format!(
                    "timestamp {timestamp_ms} is not after the previous frame at {last}"
                )));
            }
        }

        let valid_confidence = |c: f32| c.is_finite() && (0.0..=1.0).contains(&c);
        if !valid_confidence(frame.overall_confidence()) {
            warn!("Rejected frame {timestamp_ms}: overall confidence {}", frame.overall_confidence());
            return Err(Error::InvalidInput(format!(
                "overall confidence {} is outside [0, 1]",
                frame.overall_confidence()
            )));
        }
        if let Some((index, landmark)) = frame
            .landmarks()
            .iter()
            .enumerate()
            .find(|(_, landmark)| !valid_confidence(landmark.confidence))
        {
            warn!("Rejected frame {timestamp_ms}: landmark {index} confidence {}", landmark.confidence);
            return Err(Error::InvalidInput(format!(
                "landmark {index} confidence {} is outside [0, 1]",
                landmark.confidence
            )));
        }
        Ok(())
    }

    fn analyse(&mut self, frame: &Frame) -> RepEvent {
        let timestamp_ms = frame.timestamp_ms();
        let threshold = self.config.visibility_threshold;

        let mut raw_sum = 0.0;
        let mut smoothed_sum = 0.0;
        let mut measured = 0u16;
        let mut degenerate = 0u32;
        for &joint in &self.joints {
            let raw = match sample_joint(frame, joint, threshold) {
                Ok(sample) => {
                    self.history.push(timestamp_ms, sample);
                    Some(sample.degrees)
                }
                Err(AngleRejection::LowConfidence) => None,
                Err(AngleRejection::Degenerate) => {
                    debug!("Degenerate {} geometry at {timestamp_ms}", joint.label());
                    degenerate += 1;
                    None
                }
            };
            let smoothed = self.smoother.update(joint, raw, timestamp_ms);
            if let (Some(raw), Some(smoothed)) = (raw, smoothed) {
                raw_sum += raw;
                smoothed_sum += smoothed;
                measured += 1;
            }
        }

        let tracked = (measured > 0).then(|| {
            let n = f32::from(measured);
            TrackedAngle {
                raw: raw_sum / n,
                smoothed: smoothed_sum / n,
            }
        });

        let event = self.detector.update(tracked, timestamp_ms);

        let stale_joints = self.smoother.stale_joints();
        let anomalies = degenerate + self.posture.evaluate(frame, &stale_joints);
        for _ in 0..anomalies {
            self.record_arithmetic_anomaly();
        }
        event
    }

    fn raise_stale_warning(&mut self) {
        self.stale_warnings = self.stale_warnings.saturating_add(1);
        self.frame_anomalies.push(Anomaly::StaleSessionWarning);
    }

    fn record_arithmetic_anomaly(&mut self) {
        self.arithmetic_anomalies = self.arithmetic_anomalies.saturating_add(1);
        if !self.frame_anomalies.contains(&Anomaly::ArithmeticAnomaly) {
            self.frame_anomalies.push(Anomaly::ArithmeticAnomaly);
        }
    }

    /// Stability from the largest per-frame change of each tracked joint in the history window
    fn stability(&self) -> Option<u8> {
        let frame_ms = self.config.smoothing.reference_interval_ms;
        let peak_changes: Vec<f32> = self
            .joints
            .iter()
            .filter_map(|&joint| self.history.angular_speed(joint))
            .map(|speed| speed.max * frame_ms / 1000.0)
            .collect();
        ScoreAggregator::stability(&peak_changes, self.config.instability_threshold)
    }

    fn snapshot(&self) -> AnalysisResult {
        let dropped = self.detections.iter().filter(|&&dropped| dropped).count();
        let dropped_frame_rate = ratio(dropped, self.detections.len()).unwrap_or(0.0);
        let no_detection = !self.detections.is_empty() && dropped_frame_rate > self.config.no_detection_rate;
        let stale_warning = self.frame_anomalies.contains(&Anomaly::StaleSessionWarning);
        let stale_joints = self.smoother.stale_joints();

        let issues = self.posture.issues();
        let range_of_motion = self.detector.range_of_motion();
        let score = self.scorer.score(&issues, range_of_motion.as_ref());

        let signals = FeedbackSignals {
            no_detection,
            low_confidence: self.frame_anomalies.contains(&Anomaly::LowConfidenceFrame),
            stale_warning,
            stale_joints: &stale_joints,
        };
        let feedback = if self.processed_frames == 0 {
            Vec::new()
        } else {
            self.scorer.feedback(&signals, &issues, range_of_motion.as_ref())
        };

        AnalysisResult {
            timestamp_ms: self.last_frame_at,
            exercise_type: self.exercise,
            score,
            quality: ExecutionQuality::from_score(score),
            rep_count: self.detector.rep_count(),
            range_of_motion,
            repetitions: self.detector.repetitions().copied().collect(),
            stability: self.stability(),
            posture_issues: issues,
            feedback,
            diagnostics: Diagnostics {
                dropped_frame_count: self.dropped_frame_count,
                last_confidence: self.last_confidence,
                processed_frames: self.processed_frames,
                arithmetic_anomalies: self.arithmetic_anomalies,
                stale_joints,
                stale_warnings: self.stale_warnings,
                stale_warning,
                dropped_frame_rate,
                no_detection,
                phase: self.detector.phase(),
                anomalies: self.frame_anomalies.clone(),
            },
        }
    }
}

fn empty_result(exercise: ExerciseType) -> AnalysisResult {
    AnalysisResult {
        timestamp_ms: None,
        exercise_type: exercise,
        score: 100,
        quality: ExecutionQuality::Perfect,
        rep_count: None,
        range_of_motion: None,
        repetitions: Vec::new(),
        stability: None,
        posture_issues: Vec::new(),
        feedback: Vec::new(),
        diagnostics: Diagnostics {
            dropped_frame_count: 0,
            last_confidence: None,
            processed_frames: 0,
            arithmetic_anomalies: 0,
            stale_joints: Vec::new(),
            stale_warnings: 0,
            stale_warning: false,
            dropped_frame_rate: 0.0,
            no_detection: false,
            phase: RepPhase::Neutral,
            anomalies: Vec::new(),
        },
    }
}
