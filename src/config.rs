//! Configuration management for movement analysis sessions

use crate::{
    constants::{
        DEFAULT_COOLDOWN_FRAMES, DEFAULT_DEBOUNCE_FRAMES, DEFAULT_DETECTION_WINDOW, DEFAULT_HISTORY_CAPACITY,
        DEFAULT_HYSTERESIS_DOWN_THRESHOLD, DEFAULT_HYSTERESIS_UP_THRESHOLD, DEFAULT_IDLE_TIMEOUT_MS,
        DEFAULT_INSTABILITY_THRESHOLD, DEFAULT_NO_DETECTION_RATE, DEFAULT_PAUSE_GRACE_MS,
        DEFAULT_REFERENCE_INTERVAL_MS, DEFAULT_REP_LOG_CAPACITY, DEFAULT_SMOOTHING_ALPHA, DEFAULT_STALE_FRAME_LIMIT,
        DEFAULT_VISIBILITY_THRESHOLD,
    },
    exercise::ExerciseType,
    filters::create_filter,
    geometry::JointId,
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Exercise analysed when no exercise is passed to `start`
    pub exercise_type: ExerciseType,

    /// Joints averaged into the tracked angle; the exercise profile's joints when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub joints_of_interest: Option<Vec<JointId>>,

    /// Landmark confidence required for a measurement (0.0-1.0)
    pub visibility_threshold: f32,

    /// Frame gap after which the session is treated as idle
    pub idle_timeout_ms: u64,

    /// Number of joint angle samples kept in history
    pub history_capacity: usize,

    /// Rolling window (frames) for the dropped-frame rate
    pub detection_window: usize,

    /// Dropped-frame rate above which "no detection" is reported
    pub no_detection_rate: f32,

    /// Frame-to-frame joint angle change (degrees) treated as unstable
    pub instability_threshold: f32,

    /// Angle smoothing
    pub smoothing: SmoothingConfig,

    /// Repetition counting
    pub repetition: RepetitionConfig,

    /// Posture deviation detection
    pub posture: PostureConfig,
}

/// Angle smoothing parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Filter type (`exponential` or `none`)
    pub filter: String,

    /// Weight of a new sample at the reference frame interval
    pub alpha: f32,

    /// Consecutive missing samples before a joint is stale
    pub stale_frame_limit: u32,

    /// Frame interval `alpha` is defined for
    pub reference_interval_ms: f32,
}

/// Repetition detector parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepetitionConfig {
    /// Excursion from rest (degrees) that starts a repetition
    pub hysteresis_down_threshold: f32,

    /// Excursion from rest (degrees) under which a repetition completes
    pub hysteresis_up_threshold: f32,

    /// Time a paused detector may wait before an in-progress rep is discarded
    pub grace_ms: u64,

    /// Override of the exercise's rest angle
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rest_angle: Option<f32>,

    /// Completed repetitions kept in the session log
    pub log_capacity: usize,
}

/// Posture classifier parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostureConfig {
    /// Consecutive frames a deviation must persist before it is reported
    pub debounce_frames: u32,

    /// Consecutive clean frames before a reported deviation is cleared
    pub cooldown_frames: u32,

    /// Severity bands per rule
    pub thresholds: PostureThresholds,
}

/// Deviation magnitudes at which a rule reports mild, moderate and severe issues
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeverityBands {
    pub mild: f32,
    pub moderate: f32,
    pub severe: f32,
}

impl SeverityBands {
    #[must_use]
    pub const fn new(mild: f32, moderate: f32, severe: f32) -> Self {
        Self { mild, moderate, severe }
    }

    fn validate(&self, name: &str) -> Result<()> {
        let ordered = self.mild.is_finite()
            && self.moderate.is_finite()
            && self.severe.is_finite()
            && self.mild >= 0.0
            && self.mild <= self.moderate
            && self.moderate <= self.severe;
        if ordered {
            Ok(())
        } else {
            Err(Error::ConfigError(format!(
                "Posture thresholds for {name} must satisfy 0 <= mild <= moderate <= severe"
            )))
        }
    }
}

/// Per-rule severity bands. Angles are in degrees, ratios are relative to torso length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostureThresholds {
    pub forward_head: SeverityBands,
    pub rounded_shoulders: SeverityBands,
    pub shoulder_asymmetry: SeverityBands,
    pub hip_asymmetry: SeverityBands,
    pub knee_valgus: SeverityBands,
    pub knee_varus: SeverityBands,
    pub trunk_lean: SeverityBands,
    pub hip_sag: SeverityBands,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            exercise_type: ExerciseType::default(),
            joints_of_interest: None,
            visibility_threshold: DEFAULT_VISIBILITY_THRESHOLD,
            idle_timeout_ms: DEFAULT_IDLE_TIMEOUT_MS,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            detection_window: DEFAULT_DETECTION_WINDOW,
            no_detection_rate: DEFAULT_NO_DETECTION_RATE,
            instability_threshold: DEFAULT_INSTABILITY_THRESHOLD,
            smoothing: SmoothingConfig::default(),
            repetition: RepetitionConfig::default(),
            posture: PostureConfig::default(),
        }
    }
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            filter: "exponential".to_string(),
            alpha: DEFAULT_SMOOTHING_ALPHA,
            stale_frame_limit: DEFAULT_STALE_FRAME_LIMIT,
            reference_interval_ms: DEFAULT_REFERENCE_INTERVAL_MS,
        }
    }
}

impl Default for RepetitionConfig {
    fn default() -> Self {
        Self {
            hysteresis_down_threshold: DEFAULT_HYSTERESIS_DOWN_THRESHOLD,
            hysteresis_up_threshold: DEFAULT_HYSTERESIS_UP_THRESHOLD,
            grace_ms: DEFAULT_PAUSE_GRACE_MS,
            rest_angle: None,
            log_capacity: DEFAULT_REP_LOG_CAPACITY,
        }
    }
}

impl Default for PostureConfig {
    fn default() -> Self {
        Self {
            debounce_frames: DEFAULT_DEBOUNCE_FRAMES,
            cooldown_frames: DEFAULT_COOLDOWN_FRAMES,
            thresholds: PostureThresholds::default(),
        }
    }
}

impl Default for PostureThresholds {
    fn default() -> Self {
        Self {
            forward_head: SeverityBands::new(15.0, 25.0, 35.0),
            rounded_shoulders: SeverityBands::new(0.15, 0.25, 0.35),
            shoulder_asymmetry: SeverityBands::new(0.05, 0.10, 0.15),
            hip_asymmetry: SeverityBands::new(0.05, 0.10, 0.15),
            knee_valgus: SeverityBands::new(8.0, 15.0, 25.0),
            knee_varus: SeverityBands::new(8.0, 15.0, 25.0),
            trunk_lean: SeverityBands::new(35.0, 50.0, 65.0),
            hip_sag: SeverityBands::new(15.0, 25.0, 35.0),
        }
    }
}

impl PostureThresholds {
    fn validate(&self) -> Result<()> {
        self.forward_head.validate("forward_head")?;
        self.rounded_shoulders.validate("rounded_shoulders")?;
        self.shoulder_asymmetry.validate("shoulder_asymmetry")?;
        self.hip_asymmetry.validate("hip_asymmetry")?;
        self.knee_valgus.validate("knee_valgus")?;
        self.knee_varus.validate("knee_varus")?;
        self.trunk_lean.validate("trunk_lean")?;
        self.hip_sag.validate("hip_sag")
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::IoError(e.to_string()))?;

        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content =
            serde_yaml::to_string(self).map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content).map_err(|e| Error::IoError(e.to_string()))?;

        Ok(())
    }

    /// Joints averaged into the tracked angle for `exercise`
    #[must_use]
    pub fn joints_for(&self, exercise: ExerciseType) -> Vec<JointId> {
        match &self.joints_of_interest {
            Some(joints) => joints.clone(),
            None => exercise.profile().primary_joints.to_vec(),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        // Top level
        if !(0.0..=1.0).contains(&self.visibility_threshold) {
            return Err(Error::ConfigError(
                "Visibility threshold must be between 0.0 and 1.0".to_string(),
            ));
        }
        if self.idle_timeout_ms == 0 {
            return Err(Error::ConfigError("Idle timeout must be greater than 0".to_string()));
        }
        if self.history_capacity == 0 {
            return Err(Error::ConfigError("History capacity must be greater than 0".to_string()));
        }
        if self.detection_window == 0 {
            return Err(Error::ConfigError("Detection window must be greater than 0".to_string()));
        }
        if !(0.0..=1.0).contains(&self.no_detection_rate) {
            return Err(Error::ConfigError(
                "No-detection rate must be between 0.0 and 1.0".to_string(),
            ));
        }
        if !(self.instability_threshold.is_finite() && self.instability_threshold > 0.0) {
            return Err(Error::ConfigError(
                "Instability threshold must be a positive number of degrees".to_string(),
            ));
        }
        if let Some(joints) = &self.joints_of_interest {
            if joints.is_empty() {
                return Err(Error::ConfigError("Joints of interest must not be empty".to_string()));
            }
        }

        // Smoothing
        if self.smoothing.stale_frame_limit == 0 {
            return Err(Error::ConfigError("Stale frame limit must be greater than 0".to_string()));
        }
        create_filter(
            &self.smoothing.filter,
            self.smoothing.alpha,
            self.smoothing.reference_interval_ms,
        )?;

        // Repetition
        let rep = &self.repetition;
        if !(rep.hysteresis_down_threshold.is_finite() && rep.hysteresis_up_threshold.is_finite()) {
            return Err(Error::ConfigError("Hysteresis thresholds must be finite".to_string()));
        }
        if rep.hysteresis_up_threshold < 0.0 || rep.hysteresis_down_threshold <= rep.hysteresis_up_threshold {
            return Err(Error::ConfigError(
                "Hysteresis thresholds must satisfy down > up >= 0".to_string(),
            ));
        }
        if let Some(rest) = rep.rest_angle {
            if !(0.0..=180.0).contains(&rest) {
                return Err(Error::ConfigError("Rest angle must be between 0 and 180 degrees".to_string()));
            }
        }
        if rep.log_capacity == 0 {
            return Err(Error::ConfigError("Repetition log capacity must be greater than 0".to_string()));
        }

        // Posture
        if self.posture.debounce_frames == 0 {
            return Err(Error::ConfigError("Debounce frames must be greater than 0".to_string()));
        }
        if self.posture.cooldown_frames == 0 {
            return Err(Error::ConfigError("Cooldown frames must be greater than 0".to_string()));
        }
        self.posture.thresholds.validate()
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Movement Analysis Configuration

exercise_type: squat
visibility_threshold: 0.5
idle_timeout_ms: 1000
history_capacity: 120
detection_window: 30
no_detection_rate: 0.5
instability_threshold: 15.0

# Angle smoothing
smoothing:
  filter: "exponential"
  alpha: 0.3
  stale_frame_limit: 10
  reference_interval_ms: 33.333332

# Repetition counting (degrees of excursion from the rest angle)
repetition:
  hysteresis_down_threshold: 15.0
  hysteresis_up_threshold: 5.0
  grace_ms: 1000
  log_capacity: 50

# Posture deviations (provisional thresholds)
posture:
  debounce_frames: 5
  cooldown_frames: 5
  thresholds:
    forward_head: { mild: 15.0, moderate: 25.0, severe: 35.0 }
    rounded_shoulders: { mild: 0.15, moderate: 0.25, severe: 0.35 }
    shoulder_asymmetry: { mild: 0.05, moderate: 0.10, severe: 0.15 }
    hip_asymmetry: { mild: 0.05, moderate: 0.10, severe: 0.15 }
    knee_valgus: { mild: 8.0, moderate: 15.0, severe: 25.0 }
    knee_varus: { mild: 8.0, moderate: 15.0, severe: 25.0 }
    trunk_lean: { mild: 35.0, moderate: 50.0, severe: 65.0 }
    hip_sag: { mild: 15.0, moderate: 25.0, severe: 35.0 }
"#;
