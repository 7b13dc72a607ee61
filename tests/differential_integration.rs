//! Integration tests for temporal classification, differential ranking and
//! the trajectory forecast built on top of them

use cogdrift::config::{CalibrationConfig, ForecastPolicy};
use cogdrift::core::{
    BaselineCalibrator, CascadeDetector, DeviationScorer, DifferentialEngine, DifferentialInput,
    TemporalClassifier, TrajectoryForecaster,
};
use cogdrift::types::{
    AlertLevel, CascadeState, Condition, Confounders, DifferentialFlag, Domain, IndicatorVector,
    TemporalPattern,
};

#[test]
fn scenario_b_stable_history_supports_normal_aging() {
    let history = [0.1, 0.0, -0.1, 0.05, -0.05, 0.02];
    let pattern = TemporalClassifier::new().classify(&history);
    assert_eq!(pattern.name(), "stable");
    let TemporalPattern::Stable { std_dev } = pattern else {
        panic!("expected stable, got {:?}", pattern);
    };
    assert!(std_dev < 0.15);

    // Current period sits on the baseline, so every domain is within -0.3
    let baseline = BaselineCalibrator::new(CalibrationConfig::default())
        .calibrate("p1", &vec![IndicatorVector::uniform(0.55); 14]);
    let deviation = DeviationScorer::default().score(&IndicatorVector::uniform(0.55), &baseline);
    let cascade = CascadeDetector::new().detect(&deviation.domain_scores);
    let confounders = Confounders::none();
    let input = DifferentialInput {
        deviation: &deviation,
        cascade: &cascade,
        pattern: &pattern,
        confounders: &confounders,
    };

    let engine = DifferentialEngine::new();
    let rules = engine.evaluate(&input);
    let aging = rules.evidence.get(&Condition::NormalAging).unwrap();
    assert!(aging.iter().any(|e| e == "all domains within normal variation"));
    assert!(aging.iter().any(|e| e == "stable course"));
    // 0.25 stable course + 0.30 global stability + 0.10 coherence preserved
    assert!((rules.score(Condition::NormalAging) - 0.65).abs() < 1e-12);

    let result = engine.diagnose(&input);
    assert_eq!(result.primary_hypothesis, Condition::NormalAging);
    assert!((result.probabilities.values().sum::<f64>() - 1.0).abs() < 1e-9);
}

#[test]
fn scenario_d_no_evidence_gives_uniform_distribution() {
    let baseline = BaselineCalibrator::new(CalibrationConfig::default())
        .calibrate("p1", &vec![IndicatorVector::uniform(0.55); 14]);
    let deviation = DeviationScorer::default().score(&IndicatorVector::empty(), &baseline);
    assert!(deviation.domain_scores.is_empty());

    let cascade = CascadeState::none();
    let pattern = TemporalPattern::InsufficientData { points: 1 };
    let confounders = Confounders::none();
    let result = DifferentialEngine::new().diagnose(&DifferentialInput {
        deviation: &deviation,
        cascade: &cascade,
        pattern: &pattern,
        confounders: &confounders,
    });

    assert_eq!(result.probabilities.len(), Condition::ALL.len());
    let expected = 1.0 / Condition::ALL.len() as f64;
    assert!(result
        .probabilities
        .values()
        .all(|p| (p - expected).abs() < 1e-12));
    assert!(result.has_flag(DifferentialFlag::NoEvidence));
    assert!(result.confidence.is_finite());
}

#[test]
fn test_cascade_with_monotonic_decline_points_to_neurodegeneration() {
    let history = [0.0, -0.2, -0.4, -0.6, -0.8];
    let pattern = TemporalClassifier::new().classify(&history);
    assert_eq!(pattern.name(), "monotonic_decline");

    let deviation = cogdrift::types::DeviationResult {
        z_scores: Default::default(),
        domain_scores: [
            (Domain::Lexical, -0.9),
            (Domain::Semantic, -1.0),
            (Domain::Syntactic, -0.8),
        ]
        .into_iter()
        .collect(),
        composite: -0.9,
        alert_level: AlertLevel::Yellow,
        outliers: vec![],
        measured_domains: 3,
        coverage: 0.1,
        reason: None,
    };
    let cascade = CascadeDetector::new().detect(&deviation.domain_scores);
    assert_eq!(cascade.depth(), 2);

    let confounders = Confounders::none();
    let result = DifferentialEngine::new().diagnose(&DifferentialInput {
        deviation: &deviation,
        cascade: &cascade,
        pattern: &pattern,
        confounders: &confounders,
    });
    assert_eq!(result.primary_hypothesis, Condition::Neurodegenerative);
    assert!(result.probability(Condition::Neurodegenerative) > 0.99);
    assert_eq!(result.confidence, 0.95);
    assert!(!result.recommendation.is_empty());

    // Ordered cascade at depth 2 keeps the trend undamped
    let trajectory = TrajectoryForecaster::new(ForecastPolicy::default())
        .forecast(&history, &result, &cascade);
    assert_eq!(trajectory.damping, 1.0);
    assert_eq!(trajectory.predictions.len(), 12);
    assert_eq!(trajectory.predicted_alert_at_horizon, AlertLevel::Red);
    assert!(trajectory
        .predictions
        .windows(2)
        .all(|w| w[1] <= w[0]));
    assert!(trajectory.predictions.iter().all(|p| *p >= -5.0));
}

#[test]
fn test_probabilities_always_sum_to_one() {
    let patterns = [
        TemporalPattern::Stable { std_dev: 0.01 },
        TemporalPattern::Episodic { reversals: 3 },
        TemporalPattern::AcuteDrop {
            index: 2,
            magnitude: 0.8,
        },
        TemporalPattern::Unclear { series: vec![] },
    ];
    let deviation = cogdrift::types::DeviationResult {
        z_scores: Default::default(),
        domain_scores: [(Domain::Temporal, -0.9), (Domain::Lexical, 0.1)]
            .into_iter()
            .collect(),
        composite: -0.3,
        alert_level: AlertLevel::Green,
        outliers: vec![],
        measured_domains: 2,
        coverage: 0.05,
        reason: None,
    };
    let cascade = CascadeState::none();
    let confounders = Confounders::none();
    for pattern in &patterns {
        let result = DifferentialEngine::new().diagnose(&DifferentialInput {
            deviation: &deviation,
            cascade: &cascade,
            pattern,
            confounders: &confounders,
        });
        let sum: f64 = result.probabilities.values().sum();
        assert!((sum - 1.0).abs() < 1e-9, "{}: sum {}", pattern.name(), sum);
        assert!(result.confidence <= 0.95);
        assert_ne!(result.primary_hypothesis, result.secondary_hypothesis);
    }
}
