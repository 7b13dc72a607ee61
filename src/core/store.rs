//! Report persistence
//!
//! One record per (patient, period). Saving the same key again overwrites,
//! so recomputing a period never duplicates it.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::core::validate;
use crate::error::{DriftError, Result};
use crate::types::{AlgorithmicReport, HistoryPoint, WeeklyReport};

pub trait ReportStore: Send + Sync {
    /// Insert or overwrite the report for its (patient, period)
    fn save(&self, report: &WeeklyReport) -> Result<()>;

    fn load(&self, patient_id: &str, period: &str) -> Result<Option<WeeklyReport>>;

    /// Stored periods for a patient, oldest first
    fn history(&self, patient_id: &str) -> Result<Vec<HistoryPoint>>;
}

// =============================================================================
// JSON FILES
// =============================================================================

/// `<dir>/<patient>/<period>.json`
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, patient_id: &str, period: &str) -> Result<PathBuf> {
        // ids end up in file paths
        validate::patient_id(patient_id)?;
        validate::period(period)?;
        Ok(self.dir.join(patient_id).join(format!("{}.json", period)))
    }
}

impl ReportStore for JsonFileStore {
    fn save(&self, report: &WeeklyReport) -> Result<()> {
        let path = self.path_for(report.patient_id(), report.period())?;
        let json = serde_json::to_string_pretty(report)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, json)?;
        info!(path = %path.display(), "report saved");
        Ok(())
    }

    fn load(&self, patient_id: &str, period: &str) -> Result<Option<WeeklyReport>> {
        let path = self.path_for(patient_id, period)?;
        if !path.exists() {
            return Ok(None);
        }
        let json = std::fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&json)?))
    }

    fn history(&self, patient_id: &str) -> Result<Vec<HistoryPoint>> {
        validate::patient_id(patient_id)?;
        let dir = self.dir.join(patient_id);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut points = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let json = std::fs::read_to_string(&path)?;
            let report: WeeklyReport = serde_json::from_str(&json)?;
            points.extend(report.history_point());
        }
        // ISO week keys sort chronologically as strings
        points.sort_by(|a, b| a.period.cmp(&b.period));
        debug!(patient_id, periods = points.len(), "history loaded");
        Ok(points)
    }
}

// =============================================================================
// IN MEMORY
// =============================================================================

#[derive(Debug, Default)]
pub struct MemoryStore {
    reports: RwLock<BTreeMap<(String, String), WeeklyReport>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.reports.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> DriftError {
    DriftError::Store("report store lock poisoned".to_string())
}

impl ReportStore for MemoryStore {
    fn save(&self, report: &WeeklyReport) -> Result<()> {
        let key = (report.patient_id().to_string(), report.period().to_string());
        self.reports.write().map_err(poisoned)?.insert(key, report.clone());
        Ok(())
    }

    fn load(&self, patient_id: &str, period: &str) -> Result<Option<WeeklyReport>> {
        let reports = self.reports.read().map_err(poisoned)?;
        Ok(reports
            .get(&(patient_id.to_string(), period.to_string()))
            .cloned())
    }

    fn history(&self, patient_id: &str) -> Result<Vec<HistoryPoint>> {
        let reports = self.reports.read().map_err(poisoned)?;
        Ok(reports
            .iter()
            .filter(|((p, _), _)| p == patient_id)
            .filter_map(|(_, r)| r.history_point())
            .collect())
    }
}

// =============================================================================
// FINGERPRINT
// =============================================================================

/// Hex SHA-256 over the serialized algorithmic section
pub fn fingerprint(report: &AlgorithmicReport) -> Result<String> {
    let bytes = serde_json::to_vec(report)?;
    Ok(sha256(&bytes)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect())
}

fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ReasonCode;

    #[test]
    fn test_sha256_known_vector() {
        let hex: String = sha256(b"abc").iter().map(|b| format!("{:02x}", b)).collect();
        assert_eq!(
            hex,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_file_store_rejects_traversal() {
        let tmp = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(tmp.path());
        let err = store.load("../other", "2026-W43").unwrap_err();
        assert_eq!(err.reason(), Some(ReasonCode::R105_INVALID_PATIENT_ID));
    }

    #[test]
    fn test_missing_report_is_none() {
        let tmp = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(tmp.path());
        assert!(store.load("p1", "2026-W43").unwrap().is_none());
        assert!(store.history("p1").unwrap().is_empty());
        assert!(MemoryStore::new().load("p1", "2026-W43").unwrap().is_none());
    }
}
