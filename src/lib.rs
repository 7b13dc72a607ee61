//! Cogdrift: longitudinal drift scoring for conversational speech indicators
//!
//! Pipeline: registry → calibration → deviation → cascade / temporal pattern
//! → differential → trajectory → weekly report.

pub mod config;
pub mod core;
pub mod error;
pub mod types;

pub use config::EngineConfig;
pub use error::{DriftError, Result};

// =============================================================================
// ALERT BANDS [C] - half-open, lower-severity side owns the boundary
// =============================================================================

/// composite >= -0.5 is GREEN
pub const ALERT_YELLOW: f64 = -0.5;

/// composite in [-1.0, -0.5) is YELLOW
pub const ALERT_ORANGE: f64 = -1.0;

/// composite in [-1.5, -1.0) is ORANGE, below is RED
pub const ALERT_RED: f64 = -1.5;

// =============================================================================
// CALIBRATION
// =============================================================================

/// Sessions folded into a baseline before it can complete
pub const CALIBRATION_TARGET_SESSIONS: usize = 14;

/// Hard ceiling on calibration extension
pub const CALIBRATION_MAX_SESSIONS: usize = 21;

/// Coefficient of variation above which an indicator is unstable
pub const HIGH_VARIANCE_CV: f64 = 0.5;

/// Share of unstable indicators that forces an extension
pub const HIGH_VARIANCE_EXTENSION_FRACTION: f64 = 0.2;

/// Lower bound on baseline spread used as a z denominator
pub const BASELINE_STD_FLOOR: f64 = 0.05;

// =============================================================================
// DEVIATION + CASCADE
// =============================================================================

/// |z| above this is reported as an outlier and winsorised
pub const OUTLIER_Z: f64 = 2.5;

/// Domain score below this counts as declined for cascade staging
pub const CASCADE_THRESHOLD: f64 = -0.5;

/// |semantic| must reach this share of |syntactic| for expected ordering
pub const CASCADE_ORDER_RATIO: f64 = 0.8;

/// Cascade confidence when ordering holds / does not hold
pub const CASCADE_CONFIDENCE_ORDERED: f64 = 0.8;
pub const CASCADE_CONFIDENCE_UNORDERED: f64 = 0.4;

// =============================================================================
// TEMPORAL PATTERN [C]
// =============================================================================

/// Minimum history for shape classification
pub const TEMPORAL_MIN_POINTS: usize = 4;

/// Share of declining steps required for monotonic decline (exclusive)
pub const MONOTONIC_RATIO: f64 = 0.6;

/// A step must fall by more than this to count as declining
pub const MONOTONIC_STEP: f64 = 0.05;

/// Rise/fall magnitude that makes a direction reversal
pub const EPISODIC_SWING: f64 = 0.1;

/// Reversals needed for an episodic pattern
pub const EPISODIC_MIN_REVERSALS: usize = 2;

/// Single-step fall that counts as acute
pub const ACUTE_DROP: f64 = 0.5;

/// Population std below which a series is stable
pub const STABLE_STD: f64 = 0.15;

// =============================================================================
// DIFFERENTIAL
// =============================================================================

/// Ceiling on differential confidence
pub const DIFFERENTIAL_MAX_CONFIDENCE: f64 = 0.95;

/// Below this confidence the secondary hypothesis shapes recommendations
pub const DIFFERENTIAL_LOW_CONFIDENCE: f64 = 0.5;

// =============================================================================
// FORECAST
// =============================================================================

/// Periods projected forward
pub const FORECAST_HORIZON: usize = 12;

/// Points needed before extrapolating
pub const FORECAST_MIN_POINTS: usize = 3;

/// Trailing window for the velocity fit
pub const FORECAST_WINDOW: usize = 4;

/// Projections never leave this band
pub const FORECAST_CLAMP: f64 = 5.0;

/// Confidence reported for flat-line forecasts
pub const FORECAST_FLAT_CONFIDENCE: f64 = 0.2;

// =============================================================================
// NARRATIVE
// =============================================================================

/// Deadline for the external narrative call
pub const NARRATIVE_TIMEOUT_SECS: u64 = 30;

/// Attempts against the narrative endpoint before giving up
pub const NARRATIVE_MAX_RETRIES: u32 = 2;

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = "1.0.0";
