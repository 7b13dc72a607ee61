//! Trajectory forecast output

use serde::{Deserialize, Serialize};

use crate::types::{AlertLevel, ReasonCode};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    /// Predicted composite per future period, nearest first
    pub predictions: Vec<f64>,
    pub predicted_alert_at_horizon: AlertLevel,
    /// Composite change per period over the trailing window
    pub velocity: f64,
    /// Change in velocity; absent with short history
    pub acceleration: Option<f64>,
    /// Per-period damping applied to velocity
    pub damping: f64,
    pub model: String,
    pub confidence: f64,
    /// Set for flat-line forecasts
    pub reason: Option<ReasonCode>,
}

impl Trajectory {
    pub fn horizon(&self) -> usize {
        self.predictions.len()
    }

    pub fn at_horizon(&self) -> Option<f64> {
        self.predictions.last().copied()
    }

    pub fn is_flat(&self) -> bool {
        self.reason.is_some()
    }
}
