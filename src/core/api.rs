//! HTTP API for Cogdrift
//!
//! Endpoints:
//! - GET /health - Health check
//! - GET /registry - Indicator catalog
//! - POST /patient/:id/session - Submit one session (calibration or scoring)
//! - GET /patient/:id/baseline - Current baseline
//! - POST /patient/:id/period/:period - Run the weekly report on queued sessions
//! - GET /patient/:id/period/:period - Stored weekly report

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::core::calibrator::BaselineCalibrator;
use crate::core::narrative::NarrativeService;
use crate::core::orchestrator::WeeklyOrchestrator;
use crate::core::registry;
use crate::core::store::ReportStore;
use crate::core::validate;
use crate::error::DriftError;
use crate::types::{
    Baseline, Confounders, IndicatorDefinition, IndicatorVector, PeriodInput, ReasonCode,
    SessionInput, WeeklyOutcome, WeeklyReport,
};

/// Per-patient state held by the server
#[derive(Debug, Clone)]
pub struct PatientState {
    pub baseline: Baseline,
    /// Sessions received after calibration, waiting for the next period run
    pub pending: Vec<SessionInput>,
}

/// App state
pub struct AppState {
    pub patients: RwLock<HashMap<String, PatientState>>,
    pub calibrator: BaselineCalibrator,
    pub orchestrator: WeeklyOrchestrator,
}

impl AppState {
    pub fn new(
        config: &EngineConfig,
        narrative: Arc<dyn NarrativeService>,
        store: Arc<dyn ReportStore>,
    ) -> Self {
        Self {
            patients: RwLock::new(HashMap::new()),
            calibrator: BaselineCalibrator::new(config.calibration.clone()),
            orchestrator: WeeklyOrchestrator::new(config, narrative, store),
        }
    }
}

/// Submit session request
#[derive(Debug, Deserialize)]
pub struct AddSessionRequest {
    pub session_id: String,
    pub indicators: BTreeMap<String, Option<f64>>,
    #[serde(default)]
    pub confounders: BTreeMap<String, bool>,
}

/// Submit session response
#[derive(Debug, Serialize, Deserialize)]
pub struct AddSessionResponse {
    pub patient_id: String,
    pub session_id: String,
    /// Session went into the baseline rather than the period queue
    pub calibration: bool,
    pub sessions_used: usize,
    pub target_sessions: usize,
    pub baseline_complete: bool,
    pub needs_extension: bool,
    pub queued: usize,
}

/// Health response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub patients: usize,
    pub indicators: usize,
}

/// Error body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    Drift(DriftError),
}

impl From<DriftError> for ApiError {
    fn from(e: DriftError) -> Self {
        ApiError::Drift(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::NotFound(what) => (StatusCode::NOT_FOUND, "NOT_FOUND".to_string(), what),
            ApiError::Drift(e) => match e.reason() {
                Some(reason) => (StatusCode::BAD_REQUEST, reason.code().to_string(), e.to_string()),
                None => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL".to_string(),
                    e.to_string(),
                ),
            },
        };
        (status, Json(ErrorResponse { code, message })).into_response()
    }
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/registry", get(get_registry))
        .route("/patient/:id/session", post(add_session))
        .route("/patient/:id/baseline", get(get_baseline))
        .route("/patient/:id/period/:period", post(run_period).get(get_report))
        .with_state(state)
}

/// Health check endpoint
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let patients = state.patients.read().await;
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
        patients: patients.len(),
        indicators: registry::len(),
    })
}

async fn get_registry() -> Json<&'static [IndicatorDefinition]> {
    Json(registry::all())
}

/// Fold a session into calibration, or queue it once the baseline is frozen
async fn add_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<AddSessionRequest>,
) -> Result<Json<AddSessionResponse>, ApiError> {
    validate::patient_id(&id)?;
    let indicators = IndicatorVector::parse_strict(req.indicators)?;
    let confounders = Confounders::parse(req.confounders)?;

    let mut patients = state.patients.write().await;
    let patient = patients.entry(id.clone()).or_insert_with(|| PatientState {
        baseline: state.calibrator.start(id.clone()),
        pending: Vec::new(),
    });

    let calibration = match state.calibrator.add_session(&mut patient.baseline, &indicators) {
        Ok(()) => true,
        Err(ReasonCode::R201_BASELINE_FROZEN) => {
            patient.pending.push(SessionInput {
                session_id: req.session_id.clone(),
                patient_id: id.clone(),
                indicators,
                confounders,
            });
            false
        }
        Err(reason) => {
            warn!(patient_id = %id, reason = reason.code(), "calibration rejected session");
            return Err(DriftError::validation(reason, "session not accepted for calibration").into());
        }
    };

    info!(
        patient_id = %id,
        session_id = %req.session_id,
        calibration,
        queued = patient.pending.len(),
        "session accepted"
    );

    Ok(Json(AddSessionResponse {
        patient_id: id,
        session_id: req.session_id,
        calibration,
        sessions_used: patient.baseline.sessions_used,
        target_sessions: patient.baseline.target_sessions,
        baseline_complete: patient.baseline.complete,
        needs_extension: patient.baseline.needs_extension,
        queued: patient.pending.len(),
    }))
}

async fn get_baseline(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Baseline>, ApiError> {
    let patients = state.patients.read().await;
    let patient = patients
        .get(&id)
        .ok_or_else(|| ApiError::NotFound(format!("patient {}", id)))?;
    Ok(Json(patient.baseline.clone()))
}

/// Run the weekly report over the queued sessions
async fn run_period(
    State(state): State<Arc<AppState>>,
    Path((id, period)): Path<(String, String)>,
) -> Result<Json<WeeklyOutcome>, ApiError> {
    validate::patient_id(&id)?;
    validate::period(&period)?;

    let (baseline, sessions) = {
        let patients = state.patients.read().await;
        let patient = patients
            .get(&id)
            .ok_or_else(|| ApiError::NotFound(format!("patient {}", id)))?;
        (patient.baseline.clone(), patient.pending.clone())
    };
    let history = state.orchestrator.store().history(&id)?;

    let input = PeriodInput {
        patient_id: id.clone(),
        period,
        baseline,
        sessions,
        history,
    };
    let outcome = state.orchestrator.run(&input).await?;

    let consumed = matches!(
        outcome,
        WeeklyOutcome::Report(_) | WeeklyOutcome::NothingMeasured { .. }
    );
    if consumed {
        let done: Vec<&str> = input.sessions.iter().map(|s| s.session_id.as_str()).collect();
        let mut patients = state.patients.write().await;
        if let Some(patient) = patients.get_mut(&id) {
            patient
                .pending
                .retain(|s| !done.contains(&s.session_id.as_str()));
        }
    }
    Ok(Json(outcome))
}

async fn get_report(
    State(state): State<Arc<AppState>>,
    Path((id, period)): Path<(String, String)>,
) -> Result<Json<WeeklyReport>, ApiError> {
    let report = state
        .orchestrator
        .store()
        .load(&id, &period)?
        .ok_or_else(|| ApiError::NotFound(format!("report {}/{}", id, period)))?;
    Ok(Json(report))
}

/// Run the API server
pub async fn run_server(addr: &str, state: Arc<AppState>) -> Result<(), Box<dyn std::error::Error>> {
    let router = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "cogdrift API listening");
    println!("Cogdrift API running on {}", addr);
    println!("  GET  /health                       - Health check");
    println!("  GET  /registry                     - Indicator catalog");
    println!("  POST /patient/:id/session          - Submit session");
    println!("  GET  /patient/:id/baseline         - Baseline");
    println!("  POST /patient/:id/period/:period   - Run weekly report");
    println!("  GET  /patient/:id/period/:period   - Stored report");
    axum::serve(listener, router).await?;
    Ok(())
}
