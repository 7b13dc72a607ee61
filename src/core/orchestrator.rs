//! Weekly Orchestrator
//!
//! `compute` is the pure half: validation plus the five scoring stages. It
//! can be served on its own. `run` adds the only suspend point (the narrative
//! call, under a deadline) and persistence. A failed or slow narrative never
//! fails the period; it only swaps in templated text.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::core::cascade::CascadeDetector;
use crate::core::deviation::DeviationScorer;
use crate::core::differential::{DifferentialEngine, DifferentialInput};
use crate::core::narrative::{self, NarrativeError, NarrativeService};
use crate::core::store::{self, ReportStore};
use crate::core::temporal::TemporalClassifier;
use crate::core::trajectory::TrajectoryForecaster;
use crate::core::validate;
use crate::error::{DriftError, Result};
use crate::types::{
    AlgorithmicReport, Confounders, DifferentialFlag, HistoryPoint, IndicatorVector,
    NarrativeRequest, NarrativeSection, NarrativeSource, PeriodInput, PeriodOutcome,
    PriorComparison, ReasonCode, WeeklyOutcome, WeeklyReport,
};

pub struct WeeklyOrchestrator {
    scorer: DeviationScorer,
    cascade: CascadeDetector,
    temporal: TemporalClassifier,
    differential: DifferentialEngine,
    forecaster: TrajectoryForecaster,
    narrative: Arc<dyn NarrativeService>,
    store: Arc<dyn ReportStore>,
    narrative_timeout: Duration,
}

impl WeeklyOrchestrator {
    pub fn new(
        config: &EngineConfig,
        narrative: Arc<dyn NarrativeService>,
        store: Arc<dyn ReportStore>,
    ) -> Self {
        Self {
            scorer: DeviationScorer::new(config.outlier_z),
            cascade: CascadeDetector::new(),
            temporal: TemporalClassifier::new(),
            differential: DifferentialEngine::new(),
            forecaster: TrajectoryForecaster::new(config.forecast.clone()),
            narrative,
            store,
            narrative_timeout: config.narrative.timeout(),
        }
    }

    /// Override the narrative deadline
    pub fn with_narrative_timeout(mut self, timeout: Duration) -> Self {
        self.narrative_timeout = timeout;
        self
    }

    pub fn store(&self) -> &Arc<dyn ReportStore> {
        &self.store
    }

    /// Pure scoring for one (patient, period)
    pub fn compute(&self, input: &PeriodInput) -> Result<PeriodOutcome> {
        validate::patient_id(&input.patient_id)?;
        validate::period(&input.period)?;
        validate::sessions(&input.patient_id, &input.sessions)?;
        if input.baseline.patient_id != input.patient_id {
            return Err(DriftError::validation(
                ReasonCode::R108_PATIENT_MISMATCH,
                format!("baseline is for {}", input.baseline.patient_id),
            ));
        }

        if input.sessions.is_empty() {
            debug!(
                patient_id = %input.patient_id,
                period = %input.period,
                reason = ReasonCode::R107_EMPTY_SESSION_BATCH.code(),
                "nothing to score"
            );
            return Ok(PeriodOutcome::NoSessions);
        }
        if !input.baseline.complete {
            info!(
                patient_id = %input.patient_id,
                sessions_used = input.baseline.sessions_used,
                reason = ReasonCode::R202_BASELINE_INCOMPLETE.code(),
                "period skipped"
            );
            return Ok(PeriodOutcome::CalibrationPending {
                sessions_used: input.baseline.sessions_used,
                target_sessions: input.baseline.target_sessions,
                needs_extension: input.baseline.needs_extension,
            });
        }

        let vectors: Vec<IndicatorVector> =
            input.sessions.iter().map(|s| s.indicators.clone()).collect();
        let folded = IndicatorVector::fold_mean(&vectors);
        let mut confounders = Confounders::none();
        for s in &input.sessions {
            confounders.merge(&s.confounders);
        }

        let deviation = self.scorer.score(&folded, &input.baseline);
        if !deviation.is_measured() {
            // An unmeasured week is absent, not a return to baseline
            warn!(
                patient_id = %input.patient_id,
                period = %input.period,
                sessions = input.sessions.len(),
                reason = ReasonCode::R203_NO_MEASURED_DOMAINS.code(),
                "no domain measured, period not scored"
            );
            return Ok(PeriodOutcome::NothingMeasured {
                sessions_analyzed: input.sessions.len(),
            });
        }
        let cascade = self.cascade.detect(&deviation.domain_scores);

        // Earlier periods only; a recompute must not see its own old result
        let mut history: Vec<&HistoryPoint> = input
            .history
            .iter()
            .filter(|h| h.period < input.period)
            .collect();
        history.sort_by(|a, b| a.period.cmp(&b.period));

        let mut composite_history: Vec<f64> = history.iter().map(|h| h.composite).collect();
        composite_history.push(deviation.composite);

        let temporal_pattern = self.temporal.classify(&composite_history);
        let differential = self.differential.diagnose(&DifferentialInput {
            deviation: &deviation,
            cascade: &cascade,
            pattern: &temporal_pattern,
            confounders: &confounders,
        });
        if differential.has_flag(DifferentialFlag::NoEvidence) {
            debug!(
                patient_id = %input.patient_id,
                reason = ReasonCode::R205_NO_EVIDENCE.code(),
                "uniform differential"
            );
        }
        let trajectory = self
            .forecaster
            .forecast(&composite_history, &differential, &cascade);

        let prior = history.last().map(|h| PriorComparison {
            previous_period: h.period.clone(),
            previous_composite: h.composite,
            previous_alert: h.alert_level,
            delta: deviation.composite - h.composite,
        });

        info!(
            patient_id = %input.patient_id,
            period = %input.period,
            composite = deviation.composite,
            alert = %deviation.alert_level,
            primary = %differential.primary_hypothesis,
            pattern = %temporal_pattern,
            "period scored"
        );

        Ok(PeriodOutcome::Report(Box::new(AlgorithmicReport {
            patient_id: input.patient_id.clone(),
            period: input.period.clone(),
            sessions_analyzed: input.sessions.len(),
            deviation,
            cascade,
            temporal_pattern,
            differential,
            trajectory,
            composite_history,
            prior,
        })))
    }

    /// Score, narrate, persist
    pub async fn run(&self, input: &PeriodInput) -> Result<WeeklyOutcome> {
        match self.compute(input)? {
            PeriodOutcome::Report(algorithmic) => {
                let report = self.publish(*algorithmic).await?;
                Ok(WeeklyOutcome::Report(Box::new(report)))
            }
            PeriodOutcome::CalibrationPending {
                sessions_used,
                target_sessions,
                needs_extension,
            } => Ok(WeeklyOutcome::CalibrationPending {
                sessions_used,
                target_sessions,
                needs_extension,
            }),
            PeriodOutcome::NoSessions => Ok(WeeklyOutcome::NoSessions),
            PeriodOutcome::NothingMeasured { sessions_analyzed } => {
                Ok(WeeklyOutcome::NothingMeasured { sessions_analyzed })
            }
        }
    }

    /// Attach a narrative to a computed report and store it
    pub async fn publish(&self, algorithmic: AlgorithmicReport) -> Result<WeeklyReport> {
        let narrative = self.narrate(&algorithmic).await;
        let algorithmic_only = narrative.source != NarrativeSource::Generated;

        let report = WeeklyReport {
            fingerprint: store::fingerprint(&algorithmic)?,
            algorithmic,
            narrative,
            algorithmic_only,
            generated_at: Utc::now(),
        };
        self.store.save(&report)?;
        Ok(report)
    }

    async fn narrate(&self, report: &AlgorithmicReport) -> NarrativeSection {
        let request = NarrativeRequest::from_report(report);
        let start = Instant::now();
        let outcome = tokio::time::timeout(self.narrative_timeout, self.narrative.generate(&request))
            .await
            .unwrap_or(Err(NarrativeError::Timeout))
            .and_then(|response| match response.schema_violation() {
                Some(v) => Err(NarrativeError::InvalidSchema(v.to_string())),
                None => Ok(response),
            });
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(response) => {
                info!(period = %report.period, elapsed_ms, "narrative generated");
                response.into()
            }
            Err(e) => {
                warn!(
                    patient_id = %report.patient_id,
                    period = %report.period,
                    elapsed_ms,
                    error = %e,
                    "narrative unavailable, using templated text"
                );
                narrative::fallback(report, &e)
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
