//! Reason codes for rejected input and insufficient-data outcomes
//!
//! R1xx codes reject input at the boundary. R2xx codes describe a result
//! computed on too little data; they travel inside results, not as errors.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(non_camel_case_types)]
pub enum ReasonCode {
    // =========================================================================
    // R1xx: Input validation
    // =========================================================================
    /// Indicator id not present in the registry
    R101_UNKNOWN_INDICATOR,
    /// NaN or infinite indicator value
    R102_NON_FINITE_VALUE,
    /// Value outside [0,1] under strict parsing
    R103_VALUE_OUT_OF_RANGE,
    /// Confounder flag name not recognised
    R104_UNKNOWN_CONFOUNDER,
    /// Patient id malformed
    R105_INVALID_PATIENT_ID,
    /// Period key malformed (expected YYYY-Www)
    R106_INVALID_PERIOD,
    /// Batch holds no sessions
    R107_EMPTY_SESSION_BATCH,
    /// Session belongs to another patient
    R108_PATIENT_MISMATCH,

    // =========================================================================
    // R2xx: Insufficient data
    // =========================================================================
    /// Calibration already complete; baseline is frozen
    R201_BASELINE_FROZEN,
    /// Calibration not finished; deviations are not trustworthy
    R202_BASELINE_INCOMPLETE,
    /// Session measured no indicator the baseline knows
    R203_NO_MEASURED_DOMAINS,
    /// History too short for the requested analysis
    R204_SHORT_HISTORY,
    /// No differential rule fired
    R205_NO_EVIDENCE,
}

impl ReasonCode {
    /// Get the code string (for logging)
    pub fn code(&self) -> &'static str {
        match self {
            Self::R101_UNKNOWN_INDICATOR => "R101_UNKNOWN_INDICATOR",
            Self::R102_NON_FINITE_VALUE => "R102_NON_FINITE_VALUE",
            Self::R103_VALUE_OUT_OF_RANGE => "R103_VALUE_OUT_OF_RANGE",
            Self::R104_UNKNOWN_CONFOUNDER => "R104_UNKNOWN_CONFOUNDER",
            Self::R105_INVALID_PATIENT_ID => "R105_INVALID_PATIENT_ID",
            Self::R106_INVALID_PERIOD => "R106_INVALID_PERIOD",
            Self::R107_EMPTY_SESSION_BATCH => "R107_EMPTY_SESSION_BATCH",
            Self::R108_PATIENT_MISMATCH => "R108_PATIENT_MISMATCH",
            Self::R201_BASELINE_FROZEN => "R201_BASELINE_FROZEN",
            Self::R202_BASELINE_INCOMPLETE => "R202_BASELINE_INCOMPLETE",
            Self::R203_NO_MEASURED_DOMAINS => "R203_NO_MEASURED_DOMAINS",
            Self::R204_SHORT_HISTORY => "R204_SHORT_HISTORY",
            Self::R205_NO_EVIDENCE => "R205_NO_EVIDENCE",
        }
    }

    /// Get human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::R101_UNKNOWN_INDICATOR => "Unknown indicator id",
            Self::R102_NON_FINITE_VALUE => "Indicator value is not finite",
            Self::R103_VALUE_OUT_OF_RANGE => "Indicator value outside [0,1]",
            Self::R104_UNKNOWN_CONFOUNDER => "Unknown confounder flag",
            Self::R105_INVALID_PATIENT_ID => "Invalid patient id",
            Self::R106_INVALID_PERIOD => "Invalid period key",
            Self::R107_EMPTY_SESSION_BATCH => "No sessions supplied",
            Self::R108_PATIENT_MISMATCH => "Session belongs to another patient",
            Self::R201_BASELINE_FROZEN => "Baseline already complete",
            Self::R202_BASELINE_INCOMPLETE => "Baseline calibration incomplete",
            Self::R203_NO_MEASURED_DOMAINS => "No domain measured this period",
            Self::R204_SHORT_HISTORY => "History too short",
            Self::R205_NO_EVIDENCE => "No differential rule fired",
        }
    }

    /// Is this a boundary rejection (as opposed to an insufficient-data note)?
    pub fn is_rejection(&self) -> bool {
        self.code().starts_with("R1")
    }
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.description())
    }
}
