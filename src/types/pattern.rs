//! Temporal pattern of a composite-score history

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "pattern", rename_all = "snake_case")]
pub enum TemporalPattern {
    /// Sustained step-by-step decline
    MonotonicDecline { decline_ratio: f64 },
    /// Repeated rise/fall reversals
    Episodic { reversals: usize },
    /// One large single-step drop; `index` is the position after the drop
    AcuteDrop { index: usize, magnitude: f64 },
    /// Low spread around a level
    Stable { std_dev: f64 },
    /// Nothing matched; raw series kept for manual review
    Unclear { series: Vec<f64> },
    /// Fewer points than the classifier needs
    InsufficientData { points: usize },
}

impl TemporalPattern {
    pub fn name(&self) -> &'static str {
        match self {
            TemporalPattern::MonotonicDecline { .. } => "monotonic_decline",
            TemporalPattern::Episodic { .. } => "episodic",
            TemporalPattern::AcuteDrop { .. } => "acute_drop",
            TemporalPattern::Stable { .. } => "stable",
            TemporalPattern::Unclear { .. } => "unclear",
            TemporalPattern::InsufficientData { .. } => "insufficient_data",
        }
    }

    pub fn is_classified(&self) -> bool {
        !matches!(
            self,
            TemporalPattern::Unclear { .. } | TemporalPattern::InsufficientData { .. }
        )
    }
}

impl std::fmt::Display for TemporalPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
