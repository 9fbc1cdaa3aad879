//! Error types for the movement analysis library.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed frame: wrong landmark count, non-increasing timestamp or
    /// out-of-range confidence
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// No session is registered under the given handle
    #[error("Unknown session: {0}")]
    UnknownSession(u64),

    /// Generic I/O error with description
    #[error("I/O error: {0}")]
    IoError(String),
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Conditions absorbed inside a session instead of being returned as errors.
///
/// They are only visible through the diagnostics and feedback of an
/// [`AnalysisResult`](crate::session::AnalysisResult).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anomaly {
    /// Frame skipped because its overall confidence was below the visibility threshold
    LowConfidenceFrame,
    /// Degenerate geometry or a non-finite intermediate value; the sample was discarded
    ArithmeticAnomaly,
    /// Extended idle or low-confidence period
    StaleSessionWarning,
}

impl std::fmt::Display for Anomaly {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::LowConfidenceFrame => "low confidence frame",
            Self::ArithmeticAnomaly => "arithmetic anomaly",
            Self::StaleSessionWarning => "stale session",
        };
        f.write_str(text)
    }
}
