//! Differential Diagnosis Engine
//!
//! An ordered list of independent rules, each adding a fixed weight to one or
//! more condition scores and recording why. Scores are then normalised into a
//! probability distribution over every condition. Pure: same inputs, same
//! bytes out.

use std::collections::{BTreeMap, BTreeSet};

use crate::core::registry::{self, ids};
use crate::types::{
    CascadeState, Condition, ConfounderFlag, Confounders, DeviationResult, DifferentialFlag,
    DifferentialResult, Domain, TemporalPattern,
};
use crate::{DIFFERENTIAL_LOW_CONFIDENCE, DIFFERENTIAL_MAX_CONFIDENCE};

/// z below this counts as an abnormal indicator or domain
const DECLINED: f64 = -0.5;

/// z at or above this counts as preserved
const PRESERVED: f64 = -0.3;

/// Everything one differential evaluation looks at
#[derive(Debug, Clone, Copy)]
pub struct DifferentialInput<'a> {
    pub deviation: &'a DeviationResult,
    pub cascade: &'a CascadeState,
    pub pattern: &'a TemporalPattern,
    pub confounders: &'a Confounders,
}

/// Raw rule output before normalisation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleScores {
    pub scores: BTreeMap<Condition, f64>,
    pub evidence: BTreeMap<Condition, Vec<String>>,
    pub flags: BTreeSet<DifferentialFlag>,
}

impl RuleScores {
    fn new() -> Self {
        Self {
            scores: Condition::ALL.iter().map(|c| (*c, 0.0)).collect(),
            ..Self::default()
        }
    }

    fn add(&mut self, condition: Condition, weight: f64, why: impl Into<String>) {
        *self.scores.entry(condition).or_insert(0.0) += weight;
        self.evidence.entry(condition).or_default().push(why.into());
    }

    pub fn score(&self, condition: Condition) -> f64 {
        self.scores.get(&condition).copied().unwrap_or(0.0)
    }

    pub fn total(&self) -> f64 {
        self.scores.values().map(|s| s.max(0.0)).sum()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DifferentialEngine;

impl DifferentialEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn diagnose(&self, input: &DifferentialInput<'_>) -> DifferentialResult {
        let rules = self.evaluate(input);
        self.normalise(rules)
    }

    /// Run every rule in order
    pub fn evaluate(&self, input: &DifferentialInput<'_>) -> RuleScores {
        let mut r = RuleScores::new();
        let dev = input.deviation;
        let z = |id: &str| dev.z(id);
        let below = |id: &str, t: f64| matches!(dev.z(id), Some(v) if v < t);

        // Cascade
        if input.cascade.detected() {
            let conf = input.cascade.confidence();
            r.add(
                Condition::Neurodegenerative,
                0.25 * conf,
                format!(
                    "cascade stage {} (confidence {:.2})",
                    input.cascade.depth(),
                    conf
                ),
            );
            if !input.cascade.order_preserved() {
                r.flags.insert(DifferentialFlag::AtypicalCascadeOrder);
            }
        }

        // Referential coherence: strongest neuro/depressive discriminator
        if let Some(v) = z(ids::SEM_REF_COHERENCE) {
            if v < DECLINED {
                r.add(
                    Condition::Neurodegenerative,
                    0.20,
                    format!("referential coherence reduced (z={:.2})", v),
                );
            } else if v > -0.2 {
                r.add(
                    Condition::Depressive,
                    0.15,
                    format!("referential coherence preserved (z={:.2})", v),
                );
                r.add(
                    Condition::NormalAging,
                    0.10,
                    format!("referential coherence preserved (z={:.2})", v),
                );
            }
        }

        // Free vs cued recall
        if let (Some(free), Some(cued)) = (z(ids::MEM_FREE_RECALL), z(ids::MEM_CUED_RECALL)) {
            if free < DECLINED {
                let cue_benefit = cued - free;
                if cue_benefit > 0.3 {
                    r.add(
                        Condition::Depressive,
                        0.20,
                        format!("retrieval, not storage, deficit (cue benefit {:.2})", cue_benefit),
                    );
                } else if cue_benefit < 0.15 {
                    r.add(
                        Condition::Neurodegenerative,
                        0.20,
                        format!("storage deficit (cue benefit {:.2})", cue_benefit),
                    );
                }
            }
        }

        // Affective language
        if below(ids::AFF_SELF_PRONOUN, DECLINED) {
            r.add(Condition::Depressive, 0.15, "elevated self-referential pronoun use");
        }
        if below(ids::AFF_NEG_VALENCE, DECLINED) {
            r.add(Condition::Depressive, 0.15, "elevated negative-valence language");
        }

        // Temporal shape
        match input.pattern {
            TemporalPattern::MonotonicDecline { decline_ratio } => r.add(
                Condition::Neurodegenerative,
                0.15,
                format!("monotonic decline ({:.0}% of steps)", decline_ratio * 100.0),
            ),
            TemporalPattern::Episodic { reversals } => r.add(
                Condition::Depressive,
                0.20,
                format!("episodic course ({} reversals)", reversals),
            ),
            TemporalPattern::AcuteDrop { magnitude, .. } => {
                r.add(
                    Condition::MedicationEffect,
                    0.25,
                    format!("acute drop of {:.2}", magnitude),
                );
                r.flags.insert(DifferentialFlag::AcuteChange);
            }
            TemporalPattern::Stable { .. } => {
                r.add(Condition::NormalAging, 0.25, "stable course")
            }
            TemporalPattern::Unclear { .. } | TemporalPattern::InsufficientData { .. } => {}
        }

        if let Some(v) = z(ids::SEM_IDEA_DENSITY) {
            if v < DECLINED {
                r.add(
                    Condition::Neurodegenerative,
                    0.15,
                    format!("idea density reduced (z={:.2})", v),
                );
            }
        }

        // Fluency-dominant decline with preserved content
        if let (Some(tmp), Some(sem), Some(lex)) = (
            dev.domain(Domain::Temporal),
            dev.domain(Domain::Semantic),
            dev.domain(Domain::Lexical),
        ) {
            if tmp < DECLINED && sem > PRESERVED && lex > PRESERVED {
                r.add(
                    Condition::MovementDisorder,
                    0.20,
                    "fluency decline with preserved semantic and lexical content",
                );
            }
        }

        let conf = input.confounders;
        if conf.has(ConfounderFlag::MedicationChange) {
            r.add(Condition::MedicationEffect, 0.20, "reported medication change");
        }
        if conf.has(ConfounderFlag::EmotionalDistress) {
            r.add(Condition::GriefDistress, 0.15, "reported emotional distress");
        }

        // Global stability
        if !dev.domain_scores.is_empty() && dev.domain_scores.values().all(|s| *s >= PRESERVED) {
            r.add(Condition::NormalAging, 0.30, "all domains within normal variation");
        }

        self.movement_rules(dev, &mut r);

        if conf.has(ConfounderFlag::PoorSleep) {
            r.add(Condition::Depressive, 0.10, "reported poor sleep");
        }
        if conf.has(ConfounderFlag::AcuteIllness) {
            r.add(Condition::MedicationEffect, 0.10, "reported acute illness");
        }
        if conf.has(ConfounderFlag::RecentBereavement) {
            r.add(Condition::GriefDistress, 0.20, "reported recent bereavement");
        }

        if below(ids::TMP_RESPONSE_LATENCY, DECLINED) && below(ids::AFF_ENGAGEMENT, DECLINED) {
            r.add(
                Condition::Depressive,
                0.10,
                "slowed responses with flattened engagement",
            );
        }

        if let (Some(mem), Some(dis)) = (dev.domain(Domain::Memory), dev.domain(Domain::Discourse))
        {
            if mem < DECLINED && dis >= PRESERVED {
                r.add(
                    Condition::Neurodegenerative,
                    0.10,
                    "memory decline with preserved discourse",
                );
            }
        }

        if !conf.is_empty() {
            r.flags.insert(DifferentialFlag::ConfounderPresent);
        }
        if !dev.outliers.is_empty() {
            r.flags.insert(DifferentialFlag::OutlierIndicators);
        }
        r
    }

    /// Movement-disorder sentinels, then subtype re-routing on top of them
    fn movement_rules(&self, dev: &DeviationResult, r: &mut RuleScores) {
        let trio: Vec<&str> = registry::sentinels(Condition::MovementDisorder)
            .map(|d| d.id)
            .collect();
        let trio_below = !trio.is_empty()
            && trio
                .iter()
                .all(|id| matches!(dev.z(id), Some(v) if v < DECLINED));
        if !trio_below {
            return;
        }
        r.add(
            Condition::MovementDisorder,
            0.30,
            "monopitch, reduced harmonics and slowed diadochokinesis",
        );

        let msa = below_all(dev, &[(ids::ACU_VOCAL_TREMOR, DECLINED), (ids::ACU_SHIMMER, DECLINED)])
            && below_all(dev, &[(ids::PDM_RHYTHM_IRREG, -1.0)]);
        if msa {
            r.add(Condition::Msa, 0.20, "vocal tremor, shimmer and severe rhythm irregularity");
            r.add(Condition::MovementDisorder, -0.10, "evidence re-routed to MSA subtype");
            r.flags.insert(DifferentialFlag::MovementSubtypeSuspected);
        }

        let psp = below_all(
            dev,
            &[(ids::PDM_ARTIC_PRECISION, -1.0), (ids::TMP_SPEECH_RATE, -1.0)],
        );
        if psp {
            r.add(Condition::Psp, 0.20, "severe articulatory imprecision with slowed speech rate");
            r.add(Condition::MovementDisorder, -0.10, "evidence re-routed to PSP subtype");
            r.flags.insert(DifferentialFlag::MovementSubtypeSuspected);
        }
    }

    fn normalise(&self, rules: RuleScores) -> DifferentialResult {
        let RuleScores {
            scores,
            evidence,
            mut flags,
        } = rules;
        let total: f64 = scores.values().map(|s| s.max(0.0)).sum();

        let mut probabilities: BTreeMap<Condition, f64> = if total > 0.0 {
            scores
                .iter()
                .map(|(c, s)| (*c, s.max(0.0) / total))
                .collect()
        } else {
            flags.insert(DifferentialFlag::NoEvidence);
            let p = 1.0 / Condition::ALL.len() as f64;
            Condition::ALL.iter().map(|c| (*c, p)).collect()
        };

        let ranked = rank(&probabilities);
        let (primary, secondary) = (ranked[0], ranked[1]);

        let residual = 1.0 - probabilities.values().sum::<f64>();
        if residual != 0.0 {
            if let Some(p) = probabilities.get_mut(&primary) {
                *p = (*p + residual).clamp(0.0, 1.0);
            }
        }

        let top = probabilities[&primary];
        let second = probabilities[&secondary];
        let confidence = if second > 0.0 {
            (top / second * 0.3).min(DIFFERENTIAL_MAX_CONFIDENCE)
        } else {
            DIFFERENTIAL_MAX_CONFIDENCE
        };
        if confidence < DIFFERENTIAL_LOW_CONFIDENCE {
            flags.insert(DifferentialFlag::LowConfidence);
        }

        let mut recommendation: Vec<String> =
            recommendations(primary).iter().map(|s| s.to_string()).collect();
        if confidence < DIFFERENTIAL_LOW_CONFIDENCE && secondary != primary {
            recommendation.extend(recommendations(secondary).iter().map(|s| s.to_string()));
        }
        if flags.contains(&DifferentialFlag::AcuteChange) {
            recommendation.push("Review for an acute medical cause of the sudden change".into());
        }
        if flags.contains(&DifferentialFlag::ConfounderPresent) {
            recommendation.push("Re-assess once the reported confounders have resolved".into());
        }

        DifferentialResult {
            probabilities,
            primary_hypothesis: primary,
            secondary_hypothesis: secondary,
            confidence,
            evidence,
            flags: flags.into_iter().collect(),
            recommendation,
        }
    }
}

fn below_all(dev: &DeviationResult, checks: &[(&str, f64)]) -> bool {
    checks
        .iter()
        .all(|(id, t)| matches!(dev.z(id), Some(v) if v < *t))
}

/// Conditions by probability, highest first; enum order breaks ties
fn rank(probabilities: &BTreeMap<Condition, f64>) -> Vec<Condition> {
    let mut ranked: Vec<(Condition, f64)> = probabilities.iter().map(|(c, p)| (*c, *p)).collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked.into_iter().map(|(c, _)| c).collect()
}

fn recommendations(condition: Condition) -> &'static [&'static str] {
    match condition {
        Condition::Neurodegenerative => &[
            "Refer for formal cognitive assessment",
            "Increase memory-probing conversation topics next period",
        ],
        Condition::Depressive => &[
            "Screen for depressive symptoms (PHQ-9 or equivalent)",
            "Check sleep, appetite and social contact",
        ],
        Condition::MovementDisorder => &[
            "Refer for neurological motor examination",
            "Add sustained-vowel and diadochokinetic tasks next period",
        ],
        Condition::Msa => &[
            "Refer to a movement-disorder specialist; pattern suggests an atypical parkinsonism",
        ],
        Condition::Psp => &[
            "Refer to a movement-disorder specialist; check gaze and balance",
        ],
        Condition::NormalAging => &["Continue routine monitoring"],
        Condition::MedicationEffect => &[
            "Review recent medication changes with the prescriber",
        ],
        Condition::GriefDistress => &[
            "Offer bereavement or emotional support resources",
            "Re-evaluate after the acute distress period",
        ],
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AlertLevel, CascadeStage};

    fn deviation(z: &[(&str, f64)], domains: &[(Domain, f64)]) -> DeviationResult {
        DeviationResult {
            z_scores: z.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            domain_scores: domains.iter().copied().collect(),
            composite: 0.0,
            alert_level: AlertLevel::Green,
            outliers: vec![],
            measured_domains: domains.len(),
            coverage: 0.0,
            reason: None,
        }
    }

    fn run(
        dev: &DeviationResult,
        pattern: &TemporalPattern,
        confounders: &Confounders,
    ) -> (RuleScores, DifferentialResult) {
        let cascade = CascadeState::none();
        let input = DifferentialInput {
            deviation: dev,
            cascade: &cascade,
            pattern,
            confounders,
        };
        let engine = DifferentialEngine::new();
        (engine.evaluate(&input), engine.diagnose(&input))
    }

    fn sum(result: &DifferentialResult) -> f64 {
        result.probabilities.values().sum()
    }

    #[test]
    fn test_no_evidence_is_uniform() {
        let dev = deviation(&[], &[]);
        let (_, result) = run(
            &dev,
            &TemporalPattern::InsufficientData { points: 1 },
            &Confounders::none(),
        );
        assert_eq!(result.probabilities.len(), 8);
        assert!(result.probabilities.values().all(|p| *p == 0.125));
        assert_eq!(sum(&result), 1.0);
        assert!(result.has_flag(DifferentialFlag::NoEvidence));
        assert!(result.has_flag(DifferentialFlag::LowConfidence));
        assert_eq!(result.primary_hypothesis, Condition::Neurodegenerative);
        assert_eq!(result.secondary_hypothesis, Condition::Depressive);
        assert!((result.confidence - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_ref_coherence_splits_neuro_from_depressive() {
        let low = deviation(&[(ids::SEM_REF_COHERENCE, -0.9)], &[]);
        let (r, _) = run(&low, &TemporalPattern::InsufficientData { points: 0 }, &Confounders::none());
        assert_eq!(r.score(Condition::Neurodegenerative), 0.20);

        let kept = deviation(&[(ids::SEM_REF_COHERENCE, 0.0)], &[]);
        let (r, _) = run(&kept, &TemporalPattern::InsufficientData { points: 0 }, &Confounders::none());
        assert_eq!(r.score(Condition::Depressive), 0.15);
        assert_eq!(r.score(Condition::NormalAging), 0.10);
        assert_eq!(r.score(Condition::Neurodegenerative), 0.0);
    }

    #[test]
    fn test_cue_benefit() {
        let retrieval = deviation(&[(ids::MEM_FREE_RECALL, -1.0), (ids::MEM_CUED_RECALL, -0.2)], &[]);
        let (r, _) = run(&retrieval, &TemporalPattern::InsufficientData { points: 0 }, &Confounders::none());
        assert_eq!(r.score(Condition::Depressive), 0.20);

        let storage = deviation(&[(ids::MEM_FREE_RECALL, -1.0), (ids::MEM_CUED_RECALL, -0.95)], &[]);
        let (r, _) = run(&storage, &TemporalPattern::InsufficientData { points: 0 }, &Confounders::none());
        assert_eq!(r.score(Condition::Neurodegenerative), 0.20);
    }

    #[test]
    fn test_pattern_weights() {
        let dev = deviation(&[], &[]);
        let none = Confounders::none();
        let (r, _) = run(&dev, &TemporalPattern::MonotonicDecline { decline_ratio: 0.8 }, &none);
        assert_eq!(r.score(Condition::Neurodegenerative), 0.15);
        let (r, _) = run(&dev, &TemporalPattern::Episodic { reversals: 2 }, &none);
        assert_eq!(r.score(Condition::Depressive), 0.20);
        let (r, result) = run(&dev, &TemporalPattern::AcuteDrop { index: 3, magnitude: 0.7 }, &none);
        assert_eq!(r.score(Condition::MedicationEffect), 0.25);
        assert!(result.has_flag(DifferentialFlag::AcuteChange));
        let (r, _) = run(&dev, &TemporalPattern::Stable { std_dev: 0.05 }, &none);
        assert_eq!(r.score(Condition::NormalAging), 0.25);
    }

    #[test]
    fn test_global_stability_rule() {
        let dev = deviation(&[], &[(Domain::Lexical, -0.1), (Domain::Semantic, 0.2)]);
        let (r, _) = run(&dev, &TemporalPattern::Unclear { series: vec![] }, &Confounders::none());
        assert_eq!(r.score(Condition::NormalAging), 0.30);

        let dev = deviation(&[], &[(Domain::Lexical, -0.31)]);
        let (r, _) = run(&dev, &TemporalPattern::Unclear { series: vec![] }, &Confounders::none());
        assert_eq!(r.score(Condition::NormalAging), 0.0);
    }

    #[test]
    fn test_confounder_rules_and_flag() {
        let dev = deviation(&[], &[]);
        let conf = Confounders::none()
            .with(ConfounderFlag::MedicationChange)
            .with(ConfounderFlag::RecentBereavement)
            .with(ConfounderFlag::EmotionalDistress);
        let (r, result) = run(&dev, &TemporalPattern::InsufficientData { points: 0 }, &conf);
        assert_eq!(r.score(Condition::MedicationEffect), 0.20);
        assert!((r.score(Condition::GriefDistress) - 0.35).abs() < 1e-12);
        assert!(result.has_flag(DifferentialFlag::ConfounderPresent));
        assert_eq!(result.primary_hypothesis, Condition::GriefDistress);
        assert_eq!(result.secondary_hypothesis, Condition::MedicationEffect);
    }

    #[test]
    fn test_movement_trio_and_msa_reroute() {
        let trio = [
            (ids::ACU_F0_SD, -0.8),
            (ids::ACU_HNR, -0.7),
            (ids::PDM_DDK_RATE, -0.9),
        ];
        let dev = deviation(&trio, &[]);
        let (r, _) = run(&dev, &TemporalPattern::InsufficientData { points: 0 }, &Confounders::none());
        assert_eq!(r.score(Condition::MovementDisorder), 0.30);
        assert_eq!(r.score(Condition::Msa), 0.0);

        let mut msa = trio.to_vec();
        msa.extend([
            (ids::ACU_VOCAL_TREMOR, -0.6),
            (ids::ACU_SHIMMER, -0.6),
            (ids::PDM_RHYTHM_IRREG, -1.2),
        ]);
        let dev = deviation(&msa, &[]);
        let (r, result) = run(&dev, &TemporalPattern::InsufficientData { points: 0 }, &Confounders::none());
        assert!((r.score(Condition::MovementDisorder) - 0.20).abs() < 1e-12);
        assert_eq!(r.score(Condition::Msa), 0.20);
        assert!(result.has_flag(DifferentialFlag::MovementSubtypeSuspected));
    }

    #[test]
    fn test_subtype_needs_base_trio() {
        let dev = deviation(
            &[(ids::PDM_ARTIC_PRECISION, -2.0), (ids::TMP_SPEECH_RATE, -2.0)],
            &[],
        );
        let (r, _) = run(&dev, &TemporalPattern::InsufficientData { points: 0 }, &Confounders::none());
        assert_eq!(r.score(Condition::Psp), 0.0);
    }

    #[test]
    fn test_cascade_weight_scales_with_confidence() {
        let dev = deviation(&[], &[]);
        let cascade = CascadeState {
            stages: vec![CascadeStage {
                stage: 1,
                domains_involved: vec![Domain::Lexical, Domain::Semantic],
                order_preserved: false,
                confidence: 0.4,
            }],
        };
        let pattern = TemporalPattern::InsufficientData { points: 0 };
        let confounders = Confounders::none();
        let input = DifferentialInput {
            deviation: &dev,
            cascade: &cascade,
            pattern: &pattern,
            confounders: &confounders,
        };
        let r = DifferentialEngine::new().evaluate(&input);
        assert!((r.score(Condition::Neurodegenerative) - 0.10).abs() < 1e-12);
        assert!(r.flags.contains(&DifferentialFlag::AtypicalCascadeOrder));
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let dev = deviation(
            &[(ids::SEM_REF_COHERENCE, -0.7), (ids::SEM_IDEA_DENSITY, -0.8), (ids::AFF_NEG_VALENCE, -0.6)],
            &[(Domain::Temporal, -0.7), (Domain::Semantic, -0.1), (Domain::Lexical, 0.0)],
        );
        let conf = Confounders::none().with(ConfounderFlag::PoorSleep);
        let (_, result) = run(&dev, &TemporalPattern::Episodic { reversals: 2 }, &conf);
        assert!((sum(&result) - 1.0).abs() < 1e-12);
        assert!(result.probabilities.values().all(|p| (0.0..=1.0).contains(p)));
        assert!(result.confidence <= DIFFERENTIAL_MAX_CONFIDENCE);
    }

    #[test]
    fn test_single_condition_gets_max_confidence() {
        let dev = deviation(&[], &[]);
        let conf = Confounders::none().with(ConfounderFlag::MedicationChange);
        let (_, result) = run(&dev, &TemporalPattern::InsufficientData { points: 0 }, &conf);
        assert_eq!(result.primary_hypothesis, Condition::MedicationEffect);
        assert_eq!(result.probability(Condition::MedicationEffect), 1.0);
        assert_eq!(result.confidence, DIFFERENTIAL_MAX_CONFIDENCE);
        assert!(!result.has_flag(DifferentialFlag::LowConfidence));
    }
}
