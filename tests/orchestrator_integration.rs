//! Integration tests for the weekly run: narrative deadline and fallback,
//! persistence and recompute behaviour

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use pretty_assertions::assert_eq;

use cogdrift::config::CalibrationConfig;
use cogdrift::core::{
    registry, BaselineCalibrator, JsonFileStore, MemoryStore, NarrativeError, NarrativeService,
    OfflineNarrative, ReportStore, WeeklyOrchestrator,
};
use cogdrift::types::{
    AlertLevel, Baseline, Confounders, Direction, HistoryPoint, IndicatorVector, NarrativeRequest,
    NarrativeResponse, NarrativeSource, PeriodInput, SessionInput, WeeklyOutcome,
};
use cogdrift::EngineConfig;

/// Answers only after `delay`
struct SlowNarrative {
    delay: Duration,
}

impl NarrativeService for SlowNarrative {
    fn generate<'a>(
        &'a self,
        _request: &'a NarrativeRequest,
    ) -> BoxFuture<'a, Result<NarrativeResponse, NarrativeError>> {
        Box::pin(async move {
            tokio::time::sleep(self.delay).await;
            Ok(good_response())
        })
    }
}

/// Answers immediately with a fixed response, counting calls
struct FixedNarrative {
    response: NarrativeResponse,
    calls: AtomicUsize,
}

impl FixedNarrative {
    fn new(response: NarrativeResponse) -> Self {
        Self {
            response,
            calls: AtomicUsize::new(0),
        }
    }
}

impl NarrativeService for FixedNarrative {
    fn generate<'a>(
        &'a self,
        request: &'a NarrativeRequest,
    ) -> BoxFuture<'a, Result<NarrativeResponse, NarrativeError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut response = self.response.clone();
        if !response.clinician_text.is_empty() {
            response.clinician_text = format!("{} ({})", response.clinician_text, request.period);
        }
        Box::pin(async move { Ok(response) })
    }
}

fn good_response() -> NarrativeResponse {
    NarrativeResponse {
        family_text: "Conversation this week looked much like usual.".to_string(),
        clinician_text: "No domain outside normal variation".to_string(),
        next_focus: vec!["Keep the usual topics".to_string()],
        confidence_narrative: "High confidence in stability.".to_string(),
    }
}

fn baseline() -> Baseline {
    BaselineCalibrator::new(CalibrationConfig::default())
        .calibrate("p1", &vec![IndicatorVector::uniform(0.55); 14])
}

fn input(period: &str, value: f64) -> PeriodInput {
    PeriodInput {
        patient_id: "p1".to_string(),
        period: period.to_string(),
        baseline: baseline(),
        sessions: vec![SessionInput {
            session_id: format!("s-{}", period),
            patient_id: "p1".to_string(),
            indicators: IndicatorVector::uniform(value),
            confounders: Confounders::none(),
        }],
        history: vec![],
    }
}

fn orchestrator(narrative: Arc<dyn NarrativeService>, store: Arc<dyn ReportStore>) -> WeeklyOrchestrator {
    WeeklyOrchestrator::new(&EngineConfig::default(), narrative, store)
}

#[tokio::test]
async fn scenario_e_narrative_timeout_yields_algorithmic_only_report() {
    let store = Arc::new(MemoryStore::new());
    let orch = orchestrator(
        Arc::new(SlowNarrative {
            delay: Duration::from_secs(5),
        }),
        store.clone(),
    )
    .with_narrative_timeout(Duration::from_millis(50));

    let outcome = orch.run(&input("2026-W43", 0.55)).await.unwrap();
    let report = outcome.report().expect("report produced");

    assert!(report.algorithmic_only);
    assert_eq!(
        report.narrative.source,
        NarrativeSource::Fallback {
            reason: "timeout".to_string()
        }
    );
    assert!(!report.narrative.family_text.trim().is_empty());
    assert!(!report.narrative.clinician_text.trim().is_empty());
    assert!(!report.narrative.confidence_narrative.trim().is_empty());
    assert_eq!(report.algorithmic.period, "2026-W43");
    assert_eq!(store.len(), 1);

    // Templated text is deterministic
    let again = orch.run(&input("2026-W43", 0.55)).await.unwrap();
    let again = again.report().unwrap();
    assert_eq!(again.narrative, report.narrative);
    assert_eq!(again.fingerprint, report.fingerprint);
}

#[tokio::test]
async fn test_generated_narrative_is_used_when_valid() {
    let narrative = Arc::new(FixedNarrative::new(good_response()));
    let orch = orchestrator(narrative.clone(), Arc::new(MemoryStore::new()));

    let outcome = orch.run(&input("2026-W43", 0.55)).await.unwrap();
    let report = outcome.report().unwrap();

    assert!(!report.algorithmic_only);
    assert_eq!(report.narrative.source, NarrativeSource::Generated);
    assert_eq!(
        report.narrative.clinician_text,
        "No domain outside normal variation (2026-W43)"
    );
    assert_eq!(narrative.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_invalid_narrative_falls_back() {
    let mut bad = good_response();
    bad.family_text = "   ".to_string();
    let orch = orchestrator(
        Arc::new(FixedNarrative::new(bad)),
        Arc::new(MemoryStore::new()),
    );

    let outcome = orch.run(&input("2026-W43", 0.55)).await.unwrap();
    let report = outcome.report().unwrap();

    assert!(report.algorithmic_only);
    assert_eq!(
        report.narrative.source,
        NarrativeSource::Fallback {
            reason: "invalid_schema".to_string()
        }
    );
    assert!(!report.narrative.family_text.trim().is_empty());
}

#[tokio::test]
async fn test_calibration_pending_skips_narrative_and_store() {
    let narrative = Arc::new(FixedNarrative::new(good_response()));
    let store = Arc::new(MemoryStore::new());
    let orch = orchestrator(narrative.clone(), store.clone());

    let mut inp = input("2026-W43", 0.55);
    inp.baseline = BaselineCalibrator::new(CalibrationConfig::default())
        .calibrate("p1", &vec![IndicatorVector::uniform(0.55); 3]);

    let outcome = orch.run(&inp).await.unwrap();
    assert_eq!(
        outcome,
        WeeklyOutcome::CalibrationPending {
            sessions_used: 3,
            target_sessions: 14,
            needs_extension: false,
        }
    );
    assert_eq!(narrative.calls.load(Ordering::SeqCst), 0);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_file_store_recompute_overwrites_and_feeds_history() {
    let tmp = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonFileStore::new(tmp.path()));
    let orch = orchestrator(Arc::new(OfflineNarrative), store.clone());

    orch.run(&input("2026-W41", 0.55)).await.unwrap();
    let first = orch.run(&input("2026-W42", 0.55)).await.unwrap();
    let second = orch.run(&input("2026-W42", 0.55)).await.unwrap();
    assert_eq!(
        first.report().unwrap().fingerprint,
        second.report().unwrap().fingerprint
    );

    let history = store.history("p1").unwrap();
    let periods: Vec<&str> = history.iter().map(|h| h.period.as_str()).collect();
    assert_eq!(periods, vec!["2026-W41", "2026-W42"]);

    let files = std::fs::read_dir(tmp.path().join("p1")).unwrap().count();
    assert_eq!(files, 2);

    // Next period sees both earlier ones
    let mut next = input("2026-W43", 0.55);
    next.history = history;
    let outcome = orch.run(&next).await.unwrap();
    let report = outcome.report().unwrap();
    assert_eq!(report.algorithmic.composite_history.len(), 3);
    assert_eq!(
        report.algorithmic.prior.as_ref().unwrap().previous_period,
        "2026-W42"
    );

    let loaded = store.load("p1", "2026-W43").unwrap().unwrap();
    assert_eq!(loaded.fingerprint, report.fingerprint);
    assert_eq!(loaded.narrative, report.narrative);
}

#[tokio::test]
async fn test_invalid_period_rejected_before_scoring() {
    let orch = orchestrator(Arc::new(OfflineNarrative), Arc::new(MemoryStore::new()));
    let err = orch.run(&input("2026-43", 0.55)).await.unwrap_err();
    assert_eq!(
        err.reason(),
        Some(cogdrift::types::ReasonCode::R106_INVALID_PERIOD)
    );
}

/// Every indicator moved 0.1 in its decline direction
fn declined() -> IndicatorVector {
    let mut v = IndicatorVector::empty();
    for def in registry::all() {
        let value = match def.decline_polarity() {
            Direction::IncreasesWithDecline => 0.65,
            _ => 0.45,
        };
        v.set(def.id, Some(value)).unwrap();
    }
    v
}

fn declining_history() -> Vec<HistoryPoint> {
    [
        ("2026-W40", -0.6),
        ("2026-W41", -0.9),
        ("2026-W42", -1.2),
        ("2026-W43", -1.5),
    ]
    .into_iter()
    .map(|(period, composite)| HistoryPoint {
        period: period.to_string(),
        composite,
        alert_level: AlertLevel::from_composite(composite),
    })
    .collect()
}

#[tokio::test]
async fn test_unmeasured_week_does_not_read_as_recovery() {
    let narrative = Arc::new(FixedNarrative::new(good_response()));
    let store = Arc::new(MemoryStore::new());
    let orch = orchestrator(narrative.clone(), store.clone());

    let mut blank = input("2026-W44", 0.55);
    blank.sessions[0].indicators = IndicatorVector::empty();
    blank.history = declining_history();

    let outcome = orch.run(&blank).await.unwrap();
    assert_eq!(
        outcome,
        WeeklyOutcome::NothingMeasured {
            sessions_analyzed: 1
        }
    );
    assert_eq!(narrative.calls.load(Ordering::SeqCst), 0);
    assert!(store.is_empty());
    assert!(store.history("p1").unwrap().is_empty());

    // The next measured week trends from the real points only
    let mut next = input("2026-W45", 0.55);
    next.sessions[0].indicators = declined();
    next.history = declining_history();
    let outcome = orch.run(&next).await.unwrap();
    let report = outcome.report().unwrap();
    let series = &report.algorithmic.composite_history;
    assert_eq!(series.len(), 5);
    assert_eq!(&series[..4], &[-0.6, -0.9, -1.2, -1.5]);
    assert!(series[4] < -1.5);
    assert!(report.algorithmic.trajectory.velocity < 0.0);
    assert_ne!(report.algorithmic.alert_level(), AlertLevel::Green);
    assert_eq!(
        report.algorithmic.prior.as_ref().unwrap().previous_period,
        "2026-W43"
    );
}

#[tokio::test]
async fn test_store_history_skips_unmeasured_reports() {
    let store = Arc::new(MemoryStore::new());
    let orch = orchestrator(Arc::new(OfflineNarrative), store.clone());
    let outcome = orch.run(&input("2026-W41", 0.55)).await.unwrap();

    // A report persisted before unmeasured weeks were withheld
    let mut legacy = outcome.report().unwrap().clone();
    legacy.algorithmic.period = "2026-W42".to_string();
    legacy.algorithmic.deviation.domain_scores.clear();
    legacy.algorithmic.deviation.measured_domains = 0;
    assert!(legacy.history_point().is_none());
    store.save(&legacy).unwrap();

    let tmp = tempfile::tempdir().unwrap();
    let files = JsonFileStore::new(tmp.path());
    files.save(outcome.report().unwrap()).unwrap();
    files.save(&legacy).unwrap();

    for history in [store.history("p1").unwrap(), files.history("p1").unwrap()] {
        let periods: Vec<&str> = history.iter().map(|h| h.period.as_str()).collect();
        assert_eq!(periods, vec!["2026-W41"]);
    }
}
