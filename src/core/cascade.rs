//! Cascade Detector
//!
//! Stages build on each other: lexical+semantic, then syntactic, then
//! temporal. The first unmet stage stops detection, and a domain that was not
//! measured this period never satisfies a stage.

use std::collections::BTreeMap;

use crate::types::{CascadeStage, CascadeState, Domain};
use crate::{
    CASCADE_CONFIDENCE_ORDERED, CASCADE_CONFIDENCE_UNORDERED, CASCADE_ORDER_RATIO,
    CASCADE_THRESHOLD,
};

/// Domains each stage requires, cumulative
const STAGES: [&[Domain]; 3] = [
    &[Domain::Lexical, Domain::Semantic],
    &[Domain::Lexical, Domain::Semantic, Domain::Syntactic],
    &[Domain::Lexical, Domain::Semantic, Domain::Syntactic, Domain::Temporal],
];

#[derive(Debug, Clone, Copy, Default)]
pub struct CascadeDetector;

impl CascadeDetector {
    pub fn new() -> Self {
        Self
    }

    pub fn detect(&self, domain_scores: &BTreeMap<Domain, f64>) -> CascadeState {
        let declined =
            |d: &Domain| matches!(domain_scores.get(d), Some(s) if *s < CASCADE_THRESHOLD);

        let order_preserved = match (
            domain_scores.get(&Domain::Semantic),
            domain_scores.get(&Domain::Syntactic),
        ) {
            (Some(sem), Some(syn)) => sem.abs() >= syn.abs() * CASCADE_ORDER_RATIO,
            _ => true,
        };
        let confidence = if order_preserved {
            CASCADE_CONFIDENCE_ORDERED
        } else {
            CASCADE_CONFIDENCE_UNORDERED
        };

        let mut stages = Vec::new();
        for (i, required) in STAGES.iter().enumerate() {
            if !required.iter().all(|d| declined(d)) {
                break;
            }
            stages.push(CascadeStage {
                stage: (i + 1) as u8,
                domains_involved: required.to_vec(),
                order_preserved,
                confidence,
            });
        }
        CascadeState { stages }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(pairs: &[(Domain, f64)]) -> BTreeMap<Domain, f64> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_no_stage_without_lexical_and_semantic() {
        let s = scores(&[
            (Domain::Lexical, -0.4),
            (Domain::Semantic, -1.0),
            (Domain::Syntactic, -1.0),
            (Domain::Temporal, -1.0),
        ]);
        let state = CascadeDetector::new().detect(&s);
        assert!(!state.detected());
        assert_eq!(state.depth(), 0);
    }

    #[test]
    fn test_threshold_is_strict() {
        let s = scores(&[(Domain::Lexical, -0.5), (Domain::Semantic, -0.9)]);
        assert!(!CascadeDetector::new().detect(&s).detected());
    }

    #[test]
    fn test_stage_three_all_declined() {
        let s = scores(&[
            (Domain::Lexical, -0.8),
            (Domain::Semantic, -0.9),
            (Domain::Syntactic, -0.7),
            (Domain::Temporal, -0.6),
        ]);
        let state = CascadeDetector::new().detect(&s);
        assert_eq!(state.depth(), 3);
        assert_eq!(state.stages.len(), 3);
        assert_eq!(state.deepest().unwrap().domains_involved.len(), 4);
    }

    #[test]
    fn test_missing_domain_stops_staging() {
        let s = scores(&[
            (Domain::Lexical, -0.8),
            (Domain::Semantic, -0.9),
            (Domain::Temporal, -0.9),
        ]);
        let state = CascadeDetector::new().detect(&s);
        assert_eq!(state.depth(), 1);
    }

    #[test]
    fn test_atypical_order_lowers_confidence() {
        // |sem| 0.6 < |syn| 1.0 * 0.8
        let s = scores(&[
            (Domain::Lexical, -0.8),
            (Domain::Semantic, -0.6),
            (Domain::Syntactic, -1.0),
        ]);
        let state = CascadeDetector::new().detect(&s);
        assert_eq!(state.depth(), 2);
        assert!(!state.order_preserved());
        assert_eq!(state.confidence(), CASCADE_CONFIDENCE_UNORDERED);
    }
}
