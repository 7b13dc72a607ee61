//! Temporal Pattern Classifier
//!
//! Checks run in severity order and the first match wins: a series that is
//! both mildly monotonic and mildly episodic is reported as monotonic.

use crate::types::TemporalPattern;
use crate::{
    ACUTE_DROP, EPISODIC_MIN_REVERSALS, EPISODIC_SWING, MONOTONIC_RATIO, MONOTONIC_STEP,
    STABLE_STD, TEMPORAL_MIN_POINTS,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct TemporalClassifier;

impl TemporalClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify a composite history, oldest first
    pub fn classify(&self, series: &[f64]) -> TemporalPattern {
        if series.len() < TEMPORAL_MIN_POINTS {
            return TemporalPattern::InsufficientData {
                points: series.len(),
            };
        }

        let steps: Vec<f64> = series.windows(2).map(|w| w[1] - w[0]).collect();

        // 1. Monotonic decline
        let declining = steps.iter().filter(|d| **d < -MONOTONIC_STEP).count();
        let decline_ratio = declining as f64 / steps.len() as f64;
        if decline_ratio > MONOTONIC_RATIO {
            return TemporalPattern::MonotonicDecline { decline_ratio };
        }

        // 2. Episodic: rise then fall (or fall then rise) inside 3 samples
        let reversals = steps
            .windows(2)
            .filter(|w| {
                (w[0] > EPISODIC_SWING && w[1] < -EPISODIC_SWING)
                    || (w[0] < -EPISODIC_SWING && w[1] > EPISODIC_SWING)
            })
            .count();
        if reversals >= EPISODIC_MIN_REVERSALS {
            return TemporalPattern::Episodic { reversals };
        }

        // 3. Acute drop
        if let Some((i, step)) = steps.iter().enumerate().find(|(_, d)| **d < -ACUTE_DROP) {
            return TemporalPattern::AcuteDrop {
                index: i + 1,
                magnitude: -step,
            };
        }

        // 4. Stable
        let std_dev = population_std(series);
        if std_dev < STABLE_STD {
            return TemporalPattern::Stable { std_dev };
        }

        TemporalPattern::Unclear {
            series: series.to_vec(),
        }
    }
}

fn population_std(series: &[f64]) -> f64 {
    let n = series.len() as f64;
    let mean = series.iter().sum::<f64>() / n;
    (series.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n).sqrt()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(series: &[f64]) -> TemporalPattern {
        TemporalClassifier::new().classify(series)
    }

    #[test]
    fn test_short_history() {
        assert_eq!(
            classify(&[0.0, -0.1, -0.2]),
            TemporalPattern::InsufficientData { points: 3 }
        );
    }

    #[test]
    fn test_monotonic_decline() {
        let p = classify(&[0.0, -0.2, -0.4, -0.6, -0.8]);
        assert_eq!(p, TemporalPattern::MonotonicDecline { decline_ratio: 1.0 });
    }

    #[test]
    fn test_monotonic_beats_episodic() {
        // 4 of 6 steps decline (0.67) and there are two reversals
        let p = classify(&[0.0, -0.3, -0.1, -0.4, -0.2, -0.5, -0.8]);
        assert_eq!(p.name(), "monotonic_decline");
    }

    #[test]
    fn test_episodic() {
        let p = classify(&[0.0, 0.3, 0.0, 0.3, 0.0]);
        assert_eq!(p, TemporalPattern::Episodic { reversals: 3 });
    }

    #[test]
    fn test_acute_drop_index_and_magnitude() {
        let p = classify(&[0.0, 0.0, 0.02, -0.7, -0.7]);
        match p {
            TemporalPattern::AcuteDrop { index, magnitude } => {
                assert_eq!(index, 3);
                assert!((magnitude - 0.72).abs() < 1e-9);
            }
            other => panic!("expected acute drop, got {}", other),
        }
    }

    #[test]
    fn test_stable_scenario_series() {
        let p = classify(&[0.1, 0.0, -0.1, 0.05, -0.05, 0.02]);
        assert_eq!(p.name(), "stable");
    }

    #[test]
    fn test_unclear_keeps_series() {
        let series = [0.0, 0.4, 0.45, 0.1];
        // no reversal, no acute drop, std > 0.15
        assert_eq!(
            classify(&series),
            TemporalPattern::Unclear {
                series: series.to_vec()
            }
        );
    }
}
