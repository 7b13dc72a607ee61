//! Crate error type

use thiserror::Error;

use crate::types::ReasonCode;

pub type Result<T> = std::result::Result<T, DriftError>;

#[derive(Error, Debug)]
pub enum DriftError {
    /// Input rejected at the boundary
    #[error("{reason}: {detail}")]
    Validation { reason: ReasonCode, detail: String },

    /// Configuration missing or inconsistent
    #[error("Configuration error: {0}")]
    Config(String),

    /// Report store failure
    #[error("Storage error: {0}")]
    Store(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DriftError {
    pub fn validation(reason: ReasonCode, detail: impl Into<String>) -> Self {
        DriftError::Validation {
            reason,
            detail: detail.into(),
        }
    }

    /// Reason code when this is a validation error
    pub fn reason(&self) -> Option<ReasonCode> {
        match self {
            DriftError::Validation { reason, .. } => Some(*reason),
            _ => None,
        }
    }
}
