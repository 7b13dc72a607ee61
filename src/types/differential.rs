//! Differential diagnosis output

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::Condition;

/// Advisory tags attached to a differential result
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DifferentialFlag {
    /// Top two hypotheses are close
    LowConfidence,
    /// No rule fired; uniform distribution returned
    NoEvidence,
    /// A reported confounder may explain the change
    ConfounderPresent,
    /// Acute single-period drop; review for medical cause
    AcuteChange,
    /// Cascade fired with semantic decline trailing syntactic decline
    AtypicalCascadeOrder,
    /// Movement-disorder subtype rule re-routed evidence
    MovementSubtypeSuspected,
    /// Outlier indicators were winsorised this period
    OutlierIndicators,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifferentialResult {
    /// Condition -> probability; sums to 1.0 over every condition
    pub probabilities: BTreeMap<Condition, f64>,
    pub primary_hypothesis: Condition,
    pub secondary_hypothesis: Condition,
    /// min(top / second * 0.3, 0.95)
    pub confidence: f64,
    /// Condition -> rule firings in evaluation order
    pub evidence: BTreeMap<Condition, Vec<String>>,
    pub flags: Vec<DifferentialFlag>,
    pub recommendation: Vec<String>,
}

impl DifferentialResult {
    pub fn probability(&self, condition: Condition) -> f64 {
        self.probabilities.get(&condition).copied().unwrap_or(0.0)
    }

    pub fn has_flag(&self, flag: DifferentialFlag) -> bool {
        self.flags.contains(&flag)
    }

    pub fn evidence_for(&self, condition: Condition) -> &[String] {
        self.evidence
            .get(&condition)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
