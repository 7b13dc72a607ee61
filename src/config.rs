//! Runtime configuration
//!
//! Defaults come from the constants in `lib.rs`; a JSON file may override
//! any subset, and CLI flags override the file.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::DriftError;
use crate::types::Condition;
use crate::{
    CALIBRATION_MAX_SESSIONS, CALIBRATION_TARGET_SESSIONS, FORECAST_HORIZON,
    FORECAST_MIN_POINTS, FORECAST_WINDOW, HIGH_VARIANCE_CV, HIGH_VARIANCE_EXTENSION_FRACTION,
    NARRATIVE_MAX_RETRIES, NARRATIVE_TIMEOUT_SECS, OUTLIER_Z,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CalibrationConfig {
    pub target_sessions: usize,
    pub max_sessions: usize,
    pub high_variance_cv: f64,
    pub extension_fraction: f64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            target_sessions: CALIBRATION_TARGET_SESSIONS,
            max_sessions: CALIBRATION_MAX_SESSIONS,
            high_variance_cv: HIGH_VARIANCE_CV,
            extension_fraction: HIGH_VARIANCE_EXTENSION_FRACTION,
        }
    }
}

/// Extrapolation policy for the trajectory forecaster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForecastPolicy {
    pub horizon: usize,
    pub min_points: usize,
    pub window: usize,
    /// Per-period velocity multiplier by primary hypothesis (1.0 = undamped)
    pub damping: BTreeMap<Condition, f64>,
}

impl ForecastPolicy {
    pub fn damping_for(&self, condition: Condition) -> f64 {
        self.damping.get(&condition).copied().unwrap_or(1.0)
    }
}

impl Default for ForecastPolicy {
    fn default() -> Self {
        let damping = [
            (Condition::Neurodegenerative, 1.0),
            (Condition::MovementDisorder, 0.95),
            (Condition::Msa, 0.95),
            (Condition::Psp, 0.95),
            (Condition::Depressive, 0.85),
            (Condition::GriefDistress, 0.80),
            (Condition::MedicationEffect, 0.70),
            (Condition::NormalAging, 0.50),
        ]
        .into_iter()
        .collect();
        Self {
            horizon: FORECAST_HORIZON,
            min_points: FORECAST_MIN_POINTS,
            window: FORECAST_WINDOW,
            damping,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NarrativeConfig {
    /// Endpoint of the narrative service; none means templated text only
    pub endpoint: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl NarrativeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Share of the deadline one HTTP attempt may use, so retries fit inside it
    pub fn attempt_timeout(&self) -> Duration {
        self.timeout() / (self.max_retries + 1)
    }
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_secs: NARRATIVE_TIMEOUT_SECS,
            max_retries: NARRATIVE_MAX_RETRIES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub calibration: CalibrationConfig,
    pub outlier_z: f64,
    pub forecast: ForecastPolicy,
    pub narrative: NarrativeConfig,
    pub report_dir: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            calibration: CalibrationConfig::default(),
            outlier_z: OUTLIER_Z,
            forecast: ForecastPolicy::default(),
            narrative: NarrativeConfig::default(),
            report_dir: "./reports".to_string(),
        }
    }
}

impl EngineConfig {
    /// Load a JSON config file; absent fields keep their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DriftError> {
        let json = std::fs::read_to_string(path)?;
        let config: EngineConfig = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), DriftError> {
        let c = &self.calibration;
        if c.target_sessions == 0 {
            return Err(DriftError::Config("calibration.target_sessions must be > 0".into()));
        }
        if c.max_sessions < c.target_sessions {
            return Err(DriftError::Config(
                "calibration.max_sessions must be >= target_sessions".into(),
            ));
        }
        if c.high_variance_cv <= 0.0 || !(0.0..=1.0).contains(&c.extension_fraction) {
            return Err(DriftError::Config("calibration variance thresholds out of range".into()));
        }
        if self.outlier_z <= 0.0 {
            return Err(DriftError::Config("outlier_z must be > 0".into()));
        }
        let f = &self.forecast;
        if f.horizon == 0 {
            return Err(DriftError::Config("forecast.horizon must be > 0".into()));
        }
        if f.window < 2 || f.min_points < 2 {
            return Err(DriftError::Config("forecast.window and min_points must be >= 2".into()));
        }
        if let Some((c, d)) = f.damping.iter().find(|(_, d)| !(0.0..=1.0).contains(*d)) {
            return Err(DriftError::Config(format!("forecast.damping.{} = {} outside [0,1]", c, d)));
        }
        if self.narrative.timeout_secs == 0 {
            return Err(DriftError::Config("narrative.timeout_secs must be > 0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"forecast": {{"horizon": 6}}, "report_dir": "/tmp/r"}}"#).unwrap();
        let config = EngineConfig::from_file(file.path()).unwrap();
        assert_eq!(config.forecast.horizon, 6);
        assert_eq!(config.forecast.window, FORECAST_WINDOW);
        assert_eq!(config.calibration.target_sessions, CALIBRATION_TARGET_SESSIONS);
        assert_eq!(config.report_dir, "/tmp/r");
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = serde_json::from_str::<EngineConfig>(r#"{"horizon": 6}"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_attempts_share_the_narrative_deadline() {
        let narrative = NarrativeConfig::default();
        assert_eq!(narrative.attempt_timeout(), Duration::from_secs(10));
        assert!(narrative.attempt_timeout() * (narrative.max_retries + 1) <= narrative.timeout());

        let single = NarrativeConfig {
            max_retries: 0,
            ..NarrativeConfig::default()
        };
        assert_eq!(single.attempt_timeout(), single.timeout());
    }

    #[test]
    fn test_damping_out_of_range_rejected() {
        let mut config = EngineConfig::default();
        config.forecast.damping.insert(Condition::Depressive, 1.4);
        assert!(matches!(config.validate(), Err(DriftError::Config(_))));
    }
}
