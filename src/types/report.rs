//! Period input, weekly report and the narrative-service contract

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{
    AlertLevel, Baseline, CascadeState, Condition, Confounders, DeviationResult,
    DifferentialResult, Domain, IndicatorVector, TemporalPattern, Trajectory,
};

/// One conversation session as delivered by the extraction service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionInput {
    pub session_id: String,
    pub patient_id: String,
    pub indicators: IndicatorVector,
    #[serde(default)]
    pub confounders: Confounders,
}

/// A previously reported period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub period: String,
    pub composite: f64,
    pub alert_level: AlertLevel,
}

/// Everything the orchestrator needs for one (patient, period)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodInput {
    pub patient_id: String,
    /// ISO week key, e.g. 2026-W42
    pub period: String,
    pub baseline: Baseline,
    pub sessions: Vec<SessionInput>,
    /// Earlier periods, oldest first, not including `period`
    #[serde(default)]
    pub history: Vec<HistoryPoint>,
}

/// Change against the most recent earlier period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorComparison {
    pub previous_period: String,
    pub previous_composite: f64,
    pub previous_alert: AlertLevel,
    pub delta: f64,
}

/// The numeric half of a report; identical inputs give identical values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmicReport {
    pub patient_id: String,
    pub period: String,
    pub sessions_analyzed: usize,
    pub deviation: DeviationResult,
    pub cascade: CascadeState,
    pub temporal_pattern: TemporalPattern,
    pub differential: DifferentialResult,
    pub trajectory: Trajectory,
    /// Composite series used for pattern and forecast, newest last
    pub composite_history: Vec<f64>,
    pub prior: Option<PriorComparison>,
}

impl AlgorithmicReport {
    pub fn alert_level(&self) -> AlertLevel {
        self.deviation.alert_level
    }

    pub fn composite(&self) -> f64 {
        self.deviation.composite
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NarrativeSource {
    /// Text came from the narrative service
    Generated,
    /// Deterministic template text; `reason` says why
    Fallback { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeSection {
    pub family_text: String,
    pub clinician_text: String,
    pub next_focus: Vec<String>,
    pub confidence_narrative: String,
    pub source: NarrativeSource,
}

/// Immutable record per (patient, period)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyReport {
    pub algorithmic: AlgorithmicReport,
    pub narrative: NarrativeSection,
    /// Narrative is templated, not generated
    pub algorithmic_only: bool,
    /// SHA-256 over the algorithmic section
    pub fingerprint: String,
    pub generated_at: DateTime<Utc>,
}

impl WeeklyReport {
    pub fn patient_id(&self) -> &str {
        &self.algorithmic.patient_id
    }

    pub fn period(&self) -> &str {
        &self.algorithmic.period
    }

    /// Trend point for later periods; none when nothing was measured
    pub fn history_point(&self) -> Option<HistoryPoint> {
        if !self.algorithmic.deviation.is_measured() {
            return None;
        }
        Some(HistoryPoint {
            period: self.algorithmic.period.clone(),
            composite: self.algorithmic.composite(),
            alert_level: self.algorithmic.alert_level(),
        })
    }
}

/// What a period yields
#[derive(Debug, Clone, PartialEq)]
pub enum PeriodOutcome {
    Report(Box<AlgorithmicReport>),
    /// Baseline not finished; no deviations are computed
    CalibrationPending {
        sessions_used: usize,
        target_sessions: usize,
        needs_extension: bool,
    },
    /// Period had no sessions
    NoSessions,
    /// Sessions arrived but no domain carried a value (R203)
    NothingMeasured { sessions_analyzed: usize },
}

/// What a full weekly run yields; serialized for API callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WeeklyOutcome {
    Report(Box<WeeklyReport>),
    CalibrationPending {
        sessions_used: usize,
        target_sessions: usize,
        needs_extension: bool,
    },
    NoSessions,
    NothingMeasured { sessions_analyzed: usize },
}

impl WeeklyOutcome {
    pub fn report(&self) -> Option<&WeeklyReport> {
        match self {
            WeeklyOutcome::Report(r) => Some(r),
            _ => None,
        }
    }
}

// =============================================================================
// NARRATIVE CONTRACT
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeCascadeStage {
    pub stage: u8,
    pub domains: Vec<Domain>,
    pub order_preserved: bool,
}

/// Complete input handed to the external narrative service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeRequest {
    pub patient_id: String,
    pub period: String,
    pub composite: f64,
    pub alert_level: AlertLevel,
    pub domain_scores: BTreeMap<Domain, f64>,
    pub cascade: Vec<NarrativeCascadeStage>,
    pub temporal_pattern: String,
    pub probabilities: BTreeMap<Condition, f64>,
    pub primary_hypothesis: Condition,
    pub confidence: f64,
    pub evidence: BTreeMap<Condition, Vec<String>>,
    pub trajectory: Vec<f64>,
    pub predicted_alert_at_horizon: AlertLevel,
    pub prior: Option<PriorComparison>,
}

impl NarrativeRequest {
    pub fn from_report(report: &AlgorithmicReport) -> Self {
        Self {
            patient_id: report.patient_id.clone(),
            period: report.period.clone(),
            composite: report.deviation.composite,
            alert_level: report.deviation.alert_level,
            domain_scores: report.deviation.domain_scores.clone(),
            cascade: report
                .cascade
                .stages
                .iter()
                .map(|s| NarrativeCascadeStage {
                    stage: s.stage,
                    domains: s.domains_involved.clone(),
                    order_preserved: s.order_preserved,
                })
                .collect(),
            temporal_pattern: report.temporal_pattern.name().to_string(),
            probabilities: report.differential.probabilities.clone(),
            primary_hypothesis: report.differential.primary_hypothesis,
            confidence: report.differential.confidence,
            evidence: report.differential.evidence.clone(),
            trajectory: report.trajectory.predictions.clone(),
            predicted_alert_at_horizon: report.trajectory.predicted_alert_at_horizon,
            prior: report.prior.clone(),
        }
    }
}

/// Structured answer expected back from the narrative service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeResponse {
    pub family_text: String,
    pub clinician_text: String,
    #[serde(default)]
    pub next_focus: Vec<String>,
    pub confidence_narrative: String,
}

impl NarrativeResponse {
    /// Every text field must carry content
    pub fn schema_violation(&self) -> Option<&'static str> {
        if self.family_text.trim().is_empty() {
            Some("family_text empty")
        } else if self.clinician_text.trim().is_empty() {
            Some("clinician_text empty")
        } else if self.confidence_narrative.trim().is_empty() {
            Some("confidence_narrative empty")
        } else if self.next_focus.iter().any(|f| f.trim().is_empty()) {
            Some("next_focus contains empty entry")
        } else {
            None
        }
    }
}
