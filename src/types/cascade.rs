//! Cascade staging output

use serde::{Deserialize, Serialize};

use crate::types::Domain;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadeStage {
    /// 1..=3
    pub stage: u8,
    pub domains_involved: Vec<Domain>,
    /// Semantic decline does not trail syntactic decline
    pub order_preserved: bool,
    pub confidence: f64,
}

/// Ordered stages detected on one deviation result; empty when none fired
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CascadeState {
    pub stages: Vec<CascadeStage>,
}

impl CascadeState {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn detected(&self) -> bool {
        !self.stages.is_empty()
    }

    /// Deepest stage reached, 0 when none
    pub fn depth(&self) -> u8 {
        self.stages.last().map(|s| s.stage).unwrap_or(0)
    }

    pub fn deepest(&self) -> Option<&CascadeStage> {
        self.stages.last()
    }

    /// Confidence of the deepest stage, 0 when none
    pub fn confidence(&self) -> f64 {
        self.stages.last().map(|s| s.confidence).unwrap_or(0.0)
    }

    pub fn order_preserved(&self) -> bool {
        self.stages.last().map(|s| s.order_preserved).unwrap_or(true)
    }
}
