//! Deviation result and alert levels

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{Domain, ReasonCode};
use crate::{ALERT_ORANGE, ALERT_RED, ALERT_YELLOW};

/// Four-level alert thresholded on the composite score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    Green,
    Yellow,
    Orange,
    Red,
}

impl AlertLevel {
    pub const ALL: [AlertLevel; 4] = [
        AlertLevel::Green,
        AlertLevel::Yellow,
        AlertLevel::Orange,
        AlertLevel::Red,
    ];

    /// Half-open bands: -0.5 is green, -1.0 yellow, -1.5 orange
    pub fn from_composite(composite: f64) -> Self {
        if composite >= ALERT_YELLOW {
            AlertLevel::Green
        } else if composite >= ALERT_ORANGE {
            AlertLevel::Yellow
        } else if composite >= ALERT_RED {
            AlertLevel::Orange
        } else {
            AlertLevel::Red
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AlertLevel::Green => "green",
            AlertLevel::Yellow => "yellow",
            AlertLevel::Orange => "orange",
            AlertLevel::Red => "red",
        }
    }

    /// Worse than green
    pub fn is_elevated(&self) -> bool {
        *self != AlertLevel::Green
    }
}

impl std::fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name().to_uppercase())
    }
}

/// One scored period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviationResult {
    /// Indicator id -> oriented z (negative = declined)
    pub z_scores: BTreeMap<String, f64>,
    /// Domain -> weighted mean z; unmeasured domains are absent
    pub domain_scores: BTreeMap<Domain, f64>,
    /// Weighted mean of present domain scores
    pub composite: f64,
    pub alert_level: AlertLevel,
    /// Indicators with |z| beyond the outlier bound
    pub outliers: Vec<String>,
    pub measured_domains: usize,
    /// Measured indicators / registry size
    pub coverage: f64,
    /// Set when no domain could be scored
    pub reason: Option<ReasonCode>,
}

impl DeviationResult {
    /// False when no domain carried a value; the composite is then a placeholder
    pub fn is_measured(&self) -> bool {
        self.measured_domains > 0
    }

    pub fn domain(&self, domain: Domain) -> Option<f64> {
        self.domain_scores.get(&domain).copied()
    }

    pub fn z(&self, id: &str) -> Option<f64> {
        self.z_scores.get(id).copied()
    }

    /// Lowest domain score, if any domain was measured
    pub fn weakest_domain(&self) -> Option<(Domain, f64)> {
        self.domain_scores
            .iter()
            .map(|(d, s)| (*d, *s))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }
}
