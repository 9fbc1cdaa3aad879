//! Movement analysis library for real-time exercise tracking from body keypoints.
//!
//! The library consumes a stream of detected body-keypoint frames (the
//! 33-point `MediaPipe` pose topology) and turns them into:
//! - Joint angles computed from landmark triples
//! - Repetition counts from a hysteresis state machine
//! - Range of motion over completed repetitions, with a per-repetition log
//!   graded by tempo
//! - Debounced posture deviation alerts with severity
//! - A 0-100 form score with feedback text, and a 0-100 stability reading
//!
//! The analysis pipeline for each frame consists of:
//! 1. Geometry: raw angles for the exercise's joints of interest
//! 2. Smoothing: time-aware exponential filtering with stale-joint gating
//! 3. Repetition detection on the smoothed and raw angles
//! 4. Posture rules evaluated on the raw landmarks
//! 5. Score and feedback folded into an [`AnalysisResult`]
//!
//! Keypoint detection, capture, rendering and persistence are left to the caller.
//!
//! # Examples
//!
//! ## Basic Usage
//!
//! ```
//! use movement_analysis::{BodyPart, Config, ExerciseSession, ExerciseType, Frame, Landmark};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut session = ExerciseSession::start(ExerciseType::Squat, Config::default())?;
//!
//! // Frames normally come from a pose detector
//! let mut frame = Frame::new(0, [Landmark::new(0.5, 0.5, 0.0, 0.9); BodyPart::COUNT]);
//! frame.set_landmark(BodyPart::LeftHip, Landmark::new(0.44, 0.60, 0.0, 0.9));
//! frame.set_landmark(BodyPart::LeftKnee, Landmark::new(0.44, 0.78, 0.0, 0.9));
//! frame.set_landmark(BodyPart::LeftAnkle, Landmark::new(0.44, 0.96, 0.0, 0.9));
//!
//! let result = session.process_frame(&frame)?;
//! println!("Score: {} ({}), reps: {:?}", result.score, result.quality, result.rep_count);
//!
//! let summary = session.stop();
//! assert_eq!(session.stop(), summary);
//! # Ok(())
//! # }
//! ```
//!
//! ## Handle-based API
//!
//! ```
//! use movement_analysis::{Config, Engine, ExerciseType};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut engine = Engine::new();
//! let handle = engine.start(ExerciseType::LateralRaise, Config::default())?;
//! let summary = engine.stop(handle)?;
//! assert_eq!(summary.rep_count, Some(0));
//! # Ok(())
//! # }
//! ```
//!
//! ## Smoothing angles
//!
//! ```
//! use movement_analysis::filters::create_filter;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Exponential filter, alpha 0.3 at 30 frames per second
//! let mut filter = create_filter("exponential", 0.3, 1000.0 / 30.0)?;
//! filter.apply(170.0, 0.0);
//! let smoothed = filter.apply(100.0, 200.0);
//! println!("Smoothed: {smoothed:.1}°");
//! # Ok(())
//! # }
//! ```

/// Body landmarks, frames and frame decoding
pub mod landmarks;

/// Joint angle geometry
pub mod geometry;

/// Signal filtering algorithms for smoothing joint angles
pub mod filters;

/// Per-joint smoothing with stale detection
pub mod smoother;

/// Exercise catalogue
pub mod exercise;

/// Repetition counting
pub mod repetition;

/// Posture deviation rules
pub mod posture;

/// Form score and feedback
pub mod score;

/// Bounded joint angle history
pub mod history;

/// Exercise session state
pub mod session;

/// Handle-based session registry
pub mod engine;

/// Numeric helpers
pub mod utils;

/// Error types and result handling
pub mod error;

/// Constants used throughout the library
pub mod constants;

/// Configuration management
pub mod config;

pub use config::Config;
pub use engine::{Engine, SessionHandle};
pub use error::{Error, Result};
pub use exercise::ExerciseType;
pub use landmarks::{BodyPart, Frame, Landmark, RawFrame};
pub use session::{AnalysisResult, ExerciseSession};
