//! Domains and candidate conditions
//!
//! Both sets are closed: every iteration over them is exhaustive.

use serde::{Deserialize, Serialize};

/// The nine linguistic/acoustic domains an indicator can belong to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Lexical,
    Syntactic,
    Semantic,
    Temporal,
    Memory,
    Discourse,
    Affective,
    Acoustic,
    PdMotor,
}

impl Domain {
    pub const ALL: [Domain; 9] = [
        Domain::Lexical,
        Domain::Syntactic,
        Domain::Semantic,
        Domain::Temporal,
        Domain::Memory,
        Domain::Discourse,
        Domain::Affective,
        Domain::Acoustic,
        Domain::PdMotor,
    ];

    /// Composite weight (sum over all domains = 1.0)
    pub fn weight(&self) -> f64 {
        match self {
            Domain::Lexical => 0.17,
            Domain::Syntactic => 0.10,
            Domain::Semantic => 0.20,
            Domain::Temporal => 0.12,
            Domain::Memory => 0.15,
            Domain::Discourse => 0.08,
            Domain::Affective => 0.05,
            Domain::Acoustic => 0.08,
            Domain::PdMotor => 0.05,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Domain::Lexical => "lexical",
            Domain::Syntactic => "syntactic",
            Domain::Semantic => "semantic",
            Domain::Temporal => "temporal",
            Domain::Memory => "memory",
            Domain::Discourse => "discourse",
            Domain::Affective => "affective",
            Domain::Acoustic => "acoustic",
            Domain::PdMotor => "pd_motor",
        }
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Candidate explanations for an observed drift
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// Primary neurodegenerative (Alzheimer-type) decline
    Neurodegenerative,
    /// Depressive episode
    Depressive,
    /// Movement disorder (Parkinson-type)
    MovementDisorder,
    /// Movement-disorder subtype: multiple system atrophy
    Msa,
    /// Movement-disorder subtype: progressive supranuclear palsy
    Psp,
    /// Expected age-related change
    NormalAging,
    /// Medication side effect
    MedicationEffect,
    /// Grief or acute emotional distress
    GriefDistress,
}

impl Condition {
    pub const ALL: [Condition; 8] = [
        Condition::Neurodegenerative,
        Condition::Depressive,
        Condition::MovementDisorder,
        Condition::Msa,
        Condition::Psp,
        Condition::NormalAging,
        Condition::MedicationEffect,
        Condition::GriefDistress,
    ];

    /// Conditions that carry their own direction column in the registry
    pub const BASE: [Condition; 6] = [
        Condition::Neurodegenerative,
        Condition::Depressive,
        Condition::MovementDisorder,
        Condition::NormalAging,
        Condition::MedicationEffect,
        Condition::GriefDistress,
    ];

    /// Column in the registry direction table; subtypes read their parent's
    pub fn direction_column(&self) -> usize {
        match self {
            Condition::Neurodegenerative => 0,
            Condition::Depressive => 1,
            Condition::MovementDisorder | Condition::Msa | Condition::Psp => 2,
            Condition::NormalAging => 3,
            Condition::MedicationEffect => 4,
            Condition::GriefDistress => 5,
        }
    }

    pub fn is_movement_family(&self) -> bool {
        matches!(
            self,
            Condition::MovementDisorder | Condition::Msa | Condition::Psp
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            Condition::Neurodegenerative => "neurodegenerative",
            Condition::Depressive => "depressive",
            Condition::MovementDisorder => "movement_disorder",
            Condition::Msa => "msa",
            Condition::Psp => "psp",
            Condition::NormalAging => "normal_aging",
            Condition::MedicationEffect => "medication_effect",
            Condition::GriefDistress => "grief_distress",
        }
    }

    /// Plain-language label for family-facing text
    pub fn label(&self) -> &'static str {
        match self {
            Condition::Neurodegenerative => "a memory-related cognitive change",
            Condition::Depressive => "low mood",
            Condition::MovementDisorder => "a motor-speech change",
            Condition::Msa => "an atypical motor-speech change",
            Condition::Psp => "an atypical motor-speech change",
            Condition::NormalAging => "ordinary age-related variation",
            Condition::MedicationEffect => "a medication effect",
            Condition::GriefDistress => "emotional strain",
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
