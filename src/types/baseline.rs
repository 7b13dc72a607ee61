//! Per-patient calibrated reference

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Welford accumulator for one indicator
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RunningStats {
    pub count: u32,
    pub mean: f64,
    /// Sum of squared deviations from the running mean
    pub m2: f64,
}

impl RunningStats {
    pub fn push(&mut self, x: f64) {
        self.count += 1;
        let delta = x - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (x - self.mean);
    }

    /// Population standard deviation
    pub fn std_dev(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            (self.m2 / self.count as f64).max(0.0).sqrt()
        }
    }

    /// Coefficient of variation; zero spread is never unstable
    pub fn cv(&self) -> f64 {
        let sd = self.std_dev();
        if sd == 0.0 {
            0.0
        } else if self.mean.abs() < f64::EPSILON {
            f64::INFINITY
        } else {
            sd / self.mean.abs()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    pub patient_id: String,
    /// Indicator id -> calibrated reference value (mean)
    pub vector: BTreeMap<String, f64>,
    /// Indicator id -> accumulator behind `vector`
    pub stats: BTreeMap<String, RunningStats>,
    /// Sessions folded into the average
    pub sessions_used: usize,
    /// Sessions required before completion
    pub target_sessions: usize,
    /// Calibration finished; frozen from here on
    pub complete: bool,
    /// Indicators whose calibration spread exceeded the stability threshold
    pub high_variance: Vec<String>,
    /// Collect more calibration sessions before trusting deviations
    pub needs_extension: bool,
}

impl Baseline {
    pub fn new(patient_id: impl Into<String>, target_sessions: usize) -> Self {
        Self {
            patient_id: patient_id.into(),
            vector: BTreeMap::new(),
            stats: BTreeMap::new(),
            sessions_used: 0,
            target_sessions,
            complete: false,
            high_variance: Vec::new(),
            needs_extension: false,
        }
    }

    pub fn reference(&self, id: &str) -> Option<f64> {
        self.vector.get(id).copied()
    }

    pub fn spread(&self, id: &str) -> Option<f64> {
        self.stats.get(id).map(RunningStats::std_dev)
    }

    pub fn is_high_variance(&self, id: &str) -> bool {
        self.high_variance.iter().any(|h| h == id)
    }

    pub fn sessions_remaining(&self) -> usize {
        self.target_sessions.saturating_sub(self.sessions_used)
    }
}
