//! Core engines for Cogdrift

pub mod registry;
pub mod validate;
pub mod calibrator;
pub mod deviation;
pub mod cascade;
pub mod temporal;
pub mod differential;
pub mod trajectory;
pub mod narrative;
pub mod store;
pub mod orchestrator;
pub mod api;

pub use calibrator::BaselineCalibrator;
pub use deviation::DeviationScorer;
pub use cascade::CascadeDetector;
pub use temporal::TemporalClassifier;
pub use differential::{DifferentialEngine, DifferentialInput, RuleScores};
pub use trajectory::TrajectoryForecaster;
pub use narrative::{HttpNarrativeService, NarrativeError, NarrativeService, OfflineNarrative};
pub use store::{fingerprint, JsonFileStore, MemoryStore, ReportStore};
pub use orchestrator::WeeklyOrchestrator;
pub use api::{create_router, run_server, AppState};
