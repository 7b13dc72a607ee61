//! Indicator definitions, per-session indicator vectors and confounders

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::registry;
use crate::error::DriftError;
use crate::types::{Condition, Domain, ReasonCode};

/// How an indicator moves as the monitored condition progresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    IncreasesWithDecline,
    DecreasesWithDecline,
    Unaffected,
    Variable,
}

impl Direction {
    /// Has a definite sign (increase or decrease)
    pub fn is_definite(&self) -> bool {
        matches!(
            self,
            Direction::IncreasesWithDecline | Direction::DecreasesWithDecline
        )
    }
}

/// Where the external extraction service gets the value from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Text,
    Audio,
    MicroTask,
    Derived,
}

/// Immutable catalog entry
#[derive(Debug, Clone, Copy, Serialize)]
pub struct IndicatorDefinition {
    pub id: &'static str,
    pub name: &'static str,
    pub domain: Domain,
    pub channel: Channel,
    /// Evidence weight inside its domain (0-1)
    pub base_weight: f64,
    /// Direction per base condition, indexed by `Condition::direction_column`
    pub directions: [Direction; 6],
    /// Published effect sizes (Cohen's d) where known
    pub effect_sizes: &'static [(Condition, f64)],
    /// Conditions for which this indicator is a high-specificity marker
    pub sentinel_for: &'static [Condition],
}

impl IndicatorDefinition {
    pub const fn new(
        id: &'static str,
        name: &'static str,
        domain: Domain,
        channel: Channel,
        base_weight: f64,
        directions: [Direction; 6],
    ) -> Self {
        Self {
            id,
            name,
            domain,
            channel,
            base_weight,
            directions,
            effect_sizes: &[],
            sentinel_for: &[],
        }
    }

    pub const fn with_effects(self, effect_sizes: &'static [(Condition, f64)]) -> Self {
        Self {
            effect_sizes,
            ..self
        }
    }

    pub const fn sentinel(self, sentinel_for: &'static [Condition]) -> Self {
        Self {
            sentinel_for,
            ..self
        }
    }

    pub fn direction(&self, condition: Condition) -> Direction {
        self.directions[condition.direction_column()]
    }

    pub fn effect_size(&self, condition: Condition) -> Option<f64> {
        self.effect_sizes
            .iter()
            .find(|(c, _)| *c == condition)
            .map(|(_, d)| *d)
    }

    /// Direction used to orient z-scores so that negative means decline.
    ///
    /// Neurodegenerative column when definite, else the first definite
    /// column, else decreases-with-decline.
    pub fn decline_polarity(&self) -> Direction {
        let primary = self.direction(Condition::Neurodegenerative);
        if primary.is_definite() {
            return primary;
        }
        self.directions
            .iter()
            .copied()
            .find(Direction::is_definite)
            .unwrap_or(Direction::DecreasesWithDecline)
    }

    pub fn is_sentinel_for(&self, condition: Condition) -> bool {
        self.sentinel_for.contains(&condition)
    }
}

// =============================================================================
// INDICATOR VECTOR
// =============================================================================

/// One session's measurements: every registry id, `None` when not measured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, Option<f64>>",
    into = "BTreeMap<String, Option<f64>>"
)]
pub struct IndicatorVector {
    values: BTreeMap<String, Option<f64>>,
}

impl IndicatorVector {
    /// Vector with every indicator unmeasured
    pub fn empty() -> Self {
        Self {
            values: registry::ids()
                .map(|id| (id.to_string(), None))
                .collect(),
        }
    }

    /// Vector with every indicator set to the same value (clamped)
    pub fn uniform(value: f64) -> Self {
        let value = value.clamp(0.0, 1.0);
        Self {
            values: registry::ids()
                .map(|id| (id.to_string(), Some(value)))
                .collect(),
        }
    }

    /// Accept extraction-service output.
    ///
    /// Unknown ids and non-finite values are rejected; finite values outside
    /// [0,1] are clamped; ids the service left out are filled with `None`.
    pub fn from_extraction(raw: BTreeMap<String, Option<f64>>) -> Result<Self, DriftError> {
        Self::build(raw, false)
    }

    /// Accept a manually submitted vector; out-of-range values are rejected.
    pub fn parse_strict(raw: BTreeMap<String, Option<f64>>) -> Result<Self, DriftError> {
        Self::build(raw, true)
    }

    fn build(raw: BTreeMap<String, Option<f64>>, strict: bool) -> Result<Self, DriftError> {
        let mut vector = Self::empty();
        for (id, value) in raw {
            if !registry::contains(&id) {
                return Err(DriftError::validation(ReasonCode::R101_UNKNOWN_INDICATOR, id));
            }
            let value = match value {
                None => None,
                Some(v) if !v.is_finite() => {
                    return Err(DriftError::validation(
                        ReasonCode::R102_NON_FINITE_VALUE,
                        id,
                    ));
                }
                Some(v) if (0.0..=1.0).contains(&v) => Some(v),
                Some(v) if strict => {
                    return Err(DriftError::validation(
                        ReasonCode::R103_VALUE_OUT_OF_RANGE,
                        format!("{}={}", id, v),
                    ));
                }
                Some(v) => {
                    warn!(indicator = %id, value = v, "extraction value clamped to [0,1]");
                    Some(v.clamp(0.0, 1.0))
                }
            };
            vector.values.insert(id, value);
        }
        Ok(vector)
    }

    /// Set one indicator; unknown ids are rejected, values clamped.
    pub fn set(&mut self, id: &str, value: Option<f64>) -> Result<(), DriftError> {
        if !registry::contains(id) {
            return Err(DriftError::validation(ReasonCode::R101_UNKNOWN_INDICATOR, id));
        }
        let value = match value {
            Some(v) if !v.is_finite() => {
                return Err(DriftError::validation(ReasonCode::R102_NON_FINITE_VALUE, id));
            }
            other => other.map(|v| v.clamp(0.0, 1.0)),
        };
        self.values.insert(id.to_string(), value);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<f64> {
        self.values.get(id).copied().flatten()
    }

    /// Measured (id, value) pairs in id order
    pub fn measured(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values
            .iter()
            .filter_map(|(id, v)| v.map(|v| (id.as_str(), v)))
    }

    pub fn measured_count(&self) -> usize {
        self.values.values().filter(|v| v.is_some()).count()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Per-indicator mean of non-null values across several vectors
    pub fn fold_mean(vectors: &[IndicatorVector]) -> IndicatorVector {
        let mut out = Self::empty();
        for id in registry::ids() {
            let values: Vec<f64> = vectors.iter().filter_map(|v| v.get(id)).collect();
            if !values.is_empty() {
                let mean = values.iter().sum::<f64>() / values.len() as f64;
                out.values.insert(id.to_string(), Some(mean));
            }
        }
        out
    }
}

impl TryFrom<BTreeMap<String, Option<f64>>> for IndicatorVector {
    type Error = DriftError;

    fn try_from(raw: BTreeMap<String, Option<f64>>) -> Result<Self, Self::Error> {
        Self::from_extraction(raw)
    }
}

impl From<IndicatorVector> for BTreeMap<String, Option<f64>> {
    fn from(v: IndicatorVector) -> Self {
        v.values
    }
}

impl Default for IndicatorVector {
    fn default() -> Self {
        Self::empty()
    }
}

// =============================================================================
// CONFOUNDERS
// =============================================================================

/// Situational factors reported alongside a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfounderFlag {
    MedicationChange,
    EmotionalDistress,
    PoorSleep,
    AcuteIllness,
    RecentBereavement,
    HearingDifficulty,
}

impl ConfounderFlag {
    pub const ALL: [ConfounderFlag; 6] = [
        ConfounderFlag::MedicationChange,
        ConfounderFlag::EmotionalDistress,
        ConfounderFlag::PoorSleep,
        ConfounderFlag::AcuteIllness,
        ConfounderFlag::RecentBereavement,
        ConfounderFlag::HearingDifficulty,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ConfounderFlag::MedicationChange => "medication_change",
            ConfounderFlag::EmotionalDistress => "emotional_distress",
            ConfounderFlag::PoorSleep => "poor_sleep",
            ConfounderFlag::AcuteIllness => "acute_illness",
            ConfounderFlag::RecentBereavement => "recent_bereavement",
            ConfounderFlag::HearingDifficulty => "hearing_difficulty",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.name() == name)
    }
}

/// Set of confounders reported true for a session (or a whole period)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, bool>", into = "BTreeMap<String, bool>")]
pub struct Confounders {
    active: BTreeSet<ConfounderFlag>,
}

impl Confounders {
    pub fn none() -> Self {
        Self::default()
    }

    /// Parse named boolean flags; unknown names are rejected.
    pub fn parse(raw: BTreeMap<String, bool>) -> Result<Self, DriftError> {
        let mut active = BTreeSet::new();
        for (name, on) in raw {
            let flag = ConfounderFlag::from_name(&name).ok_or_else(|| {
                DriftError::validation(ReasonCode::R104_UNKNOWN_CONFOUNDER, name.clone())
            })?;
            if on {
                active.insert(flag);
            }
        }
        Ok(Self { active })
    }

    pub fn with(mut self, flag: ConfounderFlag) -> Self {
        self.active.insert(flag);
        self
    }

    pub fn has(&self, flag: ConfounderFlag) -> bool {
        self.active.contains(&flag)
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = ConfounderFlag> + '_ {
        self.active.iter().copied()
    }

    /// Union across sessions of a period
    pub fn merge(&mut self, other: &Confounders) {
        self.active.extend(other.active.iter().copied());
    }
}

impl TryFrom<BTreeMap<String, bool>> for Confounders {
    type Error = DriftError;

    fn try_from(raw: BTreeMap<String, bool>) -> Result<Self, Self::Error> {
        Self::parse(raw)
    }
}

impl From<Confounders> for BTreeMap<String, bool> {
    fn from(c: Confounders) -> Self {
        ConfounderFlag::ALL
            .iter()
            .map(|f| (f.name().to_string(), c.has(*f)))
            .collect()
    }
}
