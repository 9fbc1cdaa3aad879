//! Constants used throughout the library

/// Number of landmarks in the body topology (MediaPipe pose)
pub const NUM_BODY_LANDMARKS: usize = 33;

/// Minimum confidence for a landmark to take part in a measurement
pub const DEFAULT_VISIBILITY_THRESHOLD: f32 = 0.5;

/// Default exponential smoothing factor per reference frame interval
pub const DEFAULT_SMOOTHING_ALPHA: f32 = 0.3;

/// Frame interval the smoothing factor is expressed against (30 fps)
pub const DEFAULT_REFERENCE_INTERVAL_MS: f32 = 1000.0 / 30.0;

/// Consecutive frames without a valid sample before a joint is stale
pub const DEFAULT_STALE_FRAME_LIMIT: u32 = 10;

/// Hysteresis defaults in degrees of excursion from the rest angle
pub const DEFAULT_HYSTERESIS_DOWN_THRESHOLD: f32 = 15.0;
pub const DEFAULT_HYSTERESIS_UP_THRESHOLD: f32 = 5.0;

/// Time a paused detector may wait for confidence to return before discarding a rep
pub const DEFAULT_PAUSE_GRACE_MS: u64 = 1000;

/// Completed repetitions kept in the per-session log
pub const DEFAULT_REP_LOG_CAPACITY: usize = 50;

/// Frame-to-frame angle change (degrees) above which a joint counts as unstable
pub const DEFAULT_INSTABILITY_THRESHOLD: f32 = 15.0;

/// Largest stability penalty a single joint can cost
pub const MAX_INSTABILITY_PENALTY: f32 = 25.0;

/// Gap between frames after which the session is considered idle
pub const DEFAULT_IDLE_TIMEOUT_MS: u64 = 1000;

/// Posture debounce and cooldown defaults, in frames
pub const DEFAULT_DEBOUNCE_FRAMES: u32 = 5;
pub const DEFAULT_COOLDOWN_FRAMES: u32 = 5;

/// Capacity of the per-session joint angle history
pub const DEFAULT_HISTORY_CAPACITY: usize = 120;

/// Rolling window (frames) for the dropped-frame rate
pub const DEFAULT_DETECTION_WINDOW: usize = 30;

/// Dropped-frame rate above which the session reports "no detection"
pub const DEFAULT_NO_DETECTION_RATE: f32 = 0.5;

/// Score penalty per active posture issue
pub const MILD_PENALTY: u32 = 5;
pub const MODERATE_PENALTY: u32 = 15;
pub const SEVERE_PENALTY: u32 = 30;

/// Lowest score cap applied for a session with no usable range of motion
pub const ROM_SCORE_CAP_FLOOR: f32 = 50.0;

/// Segments shorter than this (relative units) are treated as degenerate
pub const MIN_SEGMENT_LENGTH: f32 = 1e-4;
