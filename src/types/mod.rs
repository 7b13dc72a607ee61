//! Core types for Cogdrift

mod baseline;
mod cascade;
mod deviation;
mod differential;
mod domain;
mod indicator;
mod pattern;
mod reason;
mod report;
mod trajectory;

pub use baseline::{Baseline, RunningStats};
pub use cascade::{CascadeStage, CascadeState};
pub use deviation::{AlertLevel, DeviationResult};
pub use differential::{DifferentialFlag, DifferentialResult};
pub use domain::{Condition, Domain};
pub use indicator::{
    Channel, ConfounderFlag, Confounders, Direction, IndicatorDefinition, IndicatorVector,
};
pub use pattern::TemporalPattern;
pub use reason::ReasonCode;
pub use report::{
    AlgorithmicReport, HistoryPoint, NarrativeCascadeStage, NarrativeRequest, NarrativeResponse,
    NarrativeSection, NarrativeSource, PeriodInput, PeriodOutcome, PriorComparison,
    SessionInput, WeeklyOutcome, WeeklyReport,
};
pub use trajectory::Trajectory;
