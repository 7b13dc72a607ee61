//! Deviation Scorer: direction-oriented z-scores against a personal baseline
//!
//! Negative always means "moved the way decline moves". Domains with no
//! measured member are left out of the composite entirely, so a sparse
//! session never reads as near-baseline.

use std::collections::BTreeMap;

use crate::core::registry;
use crate::types::{
    AlertLevel, Baseline, DeviationResult, Direction, Domain, IndicatorVector, ReasonCode,
};
use crate::{BASELINE_STD_FLOOR, OUTLIER_Z};

#[derive(Debug, Clone, Copy)]
pub struct DeviationScorer {
    outlier_z: f64,
}

impl Default for DeviationScorer {
    fn default() -> Self {
        Self { outlier_z: OUTLIER_Z }
    }
}

impl DeviationScorer {
    pub fn new(outlier_z: f64) -> Self {
        Self { outlier_z }
    }

    /// Score one (possibly period-folded) vector. Callers must only pass a
    /// complete baseline.
    pub fn score(&self, vector: &IndicatorVector, baseline: &Baseline) -> DeviationResult {
        let mut z_scores = BTreeMap::new();
        let mut outliers = Vec::new();
        // domain -> (sum of weight * z, sum of weight)
        let mut sums: BTreeMap<Domain, (f64, f64)> = BTreeMap::new();

        for (id, value) in vector.measured() {
            let Some(def) = registry::get(id) else { continue };
            let Some(mean) = baseline.reference(id) else { continue };
            let spread = baseline.spread(id).unwrap_or(0.0).max(BASELINE_STD_FLOOR);

            let mut z = (value - mean) / spread;
            if def.decline_polarity() == Direction::IncreasesWithDecline {
                z = -z;
            }
            // -0.0 would serialize differently from 0.0
            let z = if z == 0.0 { 0.0 } else { z };

            let clipped = if z.abs() > self.outlier_z {
                outliers.push(id.to_string());
                z.clamp(-self.outlier_z, self.outlier_z)
            } else {
                z
            };
            z_scores.insert(id.to_string(), z);

            let entry = sums.entry(def.domain).or_insert((0.0, 0.0));
            entry.0 += def.base_weight * clipped;
            entry.1 += def.base_weight;
        }

        let domain_scores: BTreeMap<Domain, f64> = sums
            .into_iter()
            .filter(|(_, (_, w))| *w > 0.0)
            .map(|(d, (s, w))| (d, s / w))
            .collect();

        let (num, den) = domain_scores
            .iter()
            .fold((0.0, 0.0), |(n, d), (domain, score)| {
                (n + domain.weight() * score, d + domain.weight())
            });
        let (composite, reason) = if den > 0.0 {
            (num / den, None)
        } else {
            (0.0, Some(ReasonCode::R203_NO_MEASURED_DOMAINS))
        };

        DeviationResult {
            measured_domains: domain_scores.len(),
            coverage: z_scores.len() as f64 / registry::len() as f64,
            alert_level: AlertLevel::from_composite(composite),
            z_scores,
            domain_scores,
            composite,
            outliers,
            reason,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
