//! Baseline Calibrator: personal reference from the first sessions
//!
//! Calibration is additive. Each session refines the running mean/variance of
//! every measured indicator; nothing is discarded. Once complete the baseline
//! is frozen and later drift is measured against it.

use tracing::{debug, info, warn};

use crate::config::CalibrationConfig;
use crate::types::{Baseline, IndicatorVector, ReasonCode};

#[derive(Debug, Clone, Default)]
pub struct BaselineCalibrator {
    config: CalibrationConfig,
}

impl BaselineCalibrator {
    pub fn new(config: CalibrationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CalibrationConfig {
        &self.config
    }

    /// Start an empty baseline for a patient
    pub fn start(&self, patient_id: impl Into<String>) -> Baseline {
        Baseline::new(patient_id, self.config.target_sessions)
    }

    /// Fold one calibration session into the baseline.
    ///
    /// Returns `R201_BASELINE_FROZEN` (and leaves the baseline untouched)
    /// when calibration is already complete.
    pub fn add_session(
        &self,
        baseline: &mut Baseline,
        session: &IndicatorVector,
    ) -> Result<(), ReasonCode> {
        if baseline.complete {
            return Err(ReasonCode::R201_BASELINE_FROZEN);
        }

        for (id, value) in session.measured() {
            let stats = baseline.stats.entry(id.to_string()).or_default();
            stats.push(value);
            baseline.vector.insert(id.to_string(), stats.mean);
        }
        baseline.sessions_used += 1;

        self.refresh_status(baseline);
        debug!(
            patient_id = %baseline.patient_id,
            sessions_used = baseline.sessions_used,
            complete = baseline.complete,
            "calibration session folded"
        );
        Ok(())
    }

    /// Build a baseline from an ordered run of calibration sessions
    pub fn calibrate(&self, patient_id: impl Into<String>, sessions: &[IndicatorVector]) -> Baseline {
        let mut baseline = self.start(patient_id);
        for session in sessions {
            if self.add_session(&mut baseline, session).is_err() {
                break;
            }
        }
        baseline
    }

    fn refresh_status(&self, baseline: &mut Baseline) {
        baseline.high_variance = baseline
            .stats
            .iter()
            .filter(|(_, s)| s.count >= 2 && s.cv() > self.config.high_variance_cv)
            .map(|(id, _)| id.clone())
            .collect();

        if baseline.sessions_used < self.config.target_sessions {
            baseline.needs_extension = false;
            return;
        }

        let measured = baseline.stats.len();
        if measured == 0 {
            // Nothing to freeze; stay open past the session cap until a value arrives
            baseline.needs_extension = true;
            warn!(
                patient_id = %baseline.patient_id,
                sessions_used = baseline.sessions_used,
                reason = ReasonCode::R202_BASELINE_INCOMPLETE.code(),
                "no indicator measured during calibration"
            );
            return;
        }
        let unstable_fraction = baseline.high_variance.len() as f64 / measured as f64;
        let unstable = unstable_fraction > self.config.extension_fraction;
        baseline.needs_extension = unstable;

        if !unstable || baseline.sessions_used >= self.config.max_sessions {
            baseline.complete = true;
            info!(
                patient_id = %baseline.patient_id,
                sessions_used = baseline.sessions_used,
                high_variance = baseline.high_variance.len(),
                needs_extension = baseline.needs_extension,
                "baseline complete"
            );
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
