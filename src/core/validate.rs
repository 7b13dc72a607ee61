//! Identifier checks at the input boundary

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::DriftError;
use crate::types::{ReasonCode, SessionInput};

lazy_static! {
    static ref RE_PATIENT_ID: Regex = Regex::new(r"^[A-Za-z0-9_-]{1,64}$").unwrap();

    // ISO week key: 2026-W01 .. 2026-W53
    static ref RE_PERIOD: Regex = Regex::new(r"^\d{4}-W(0[1-9]|[1-4]\d|5[0-3])$").unwrap();
}

pub fn patient_id(id: &str) -> Result<(), DriftError> {
    if RE_PATIENT_ID.is_match(id) {
        Ok(())
    } else {
        Err(DriftError::validation(ReasonCode::R105_INVALID_PATIENT_ID, id))
    }
}

pub fn period(key: &str) -> Result<(), DriftError> {
    if RE_PERIOD.is_match(key) {
        Ok(())
    } else {
        Err(DriftError::validation(ReasonCode::R106_INVALID_PERIOD, key))
    }
}

/// Period key for a date, e.g. 2026-W42
pub fn period_for(date: chrono::NaiveDate) -> String {
    use chrono::Datelike;
    let week = date.iso_week();
    format!("{}-W{:02}", week.year(), week.week())
}

/// Every session must belong to `patient`
pub fn sessions(patient: &str, sessions: &[SessionInput]) -> Result<(), DriftError> {
    for s in sessions {
        if s.patient_id != patient {
            return Err(DriftError::validation(
                ReasonCode::R108_PATIENT_MISMATCH,
                format!("session {} is for {}", s.session_id, s.patient_id),
            ));
        }
    }
    Ok(())
}
