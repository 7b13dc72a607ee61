//! Indicator registry: static catalog of every measurable indicator
//!
//! Direction columns: [neurodegenerative, depressive, movement, aging,
//! medication, grief]. Movement subtypes read the movement column.
//! Effect sizes are Cohen's d from the speech-biomarker literature.

use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::types::Direction::{
    DecreasesWithDecline as D, IncreasesWithDecline as I, Unaffected as U, Variable as V,
};
use crate::types::{Channel, Condition, Domain, IndicatorDefinition};

use Channel::{Audio, Derived, MicroTask, Text};
use Domain::*;

/// Ids the differential rules read directly
pub mod ids {
    pub const SEM_REF_COHERENCE: &str = "SEM_REF_COHERENCE";
    pub const SEM_IDEA_DENSITY: &str = "SEM_IDEA_DENSITY";
    pub const MEM_FREE_RECALL: &str = "MEM_FREE_RECALL";
    pub const MEM_CUED_RECALL: &str = "MEM_CUED_RECALL";
    pub const AFF_SELF_PRONOUN: &str = "AFF_SELF_PRONOUN";
    pub const AFF_NEG_VALENCE: &str = "AFF_NEG_VALENCE";
    pub const AFF_ENGAGEMENT: &str = "AFF_ENGAGEMENT";
    pub const TMP_RESPONSE_LATENCY: &str = "TMP_RESPONSE_LATENCY";
    pub const TMP_SPEECH_RATE: &str = "TMP_SPEECH_RATE";
    pub const ACU_F0_SD: &str = "ACU_F0_SD";
    pub const ACU_HNR: &str = "ACU_HNR";
    pub const ACU_SHIMMER: &str = "ACU_SHIMMER";
    pub const ACU_VOCAL_TREMOR: &str = "ACU_VOCAL_TREMOR";
    pub const PDM_DDK_RATE: &str = "PDM_DDK_RATE";
    pub const PDM_RHYTHM_IRREG: &str = "PDM_RHYTHM_IRREG";
    pub const PDM_ARTIC_PRECISION: &str = "PDM_ARTIC_PRECISION";
}

const fn def(
    id: &'static str,
    name: &'static str,
    domain: Domain,
    channel: Channel,
    base_weight: f64,
    directions: [crate::types::Direction; 6],
) -> IndicatorDefinition {
    IndicatorDefinition::new(id, name, domain, channel, base_weight, directions)
}

const NEURO: Condition = Condition::Neurodegenerative;
const DEP: Condition = Condition::Depressive;
const MOV: Condition = Condition::MovementDisorder;

static INDICATORS: &[IndicatorDefinition] = &[
    // =========================================================================
    // LEXICAL (13)
    // =========================================================================
    def("LEX_TTR", "Type-token ratio", Lexical, Text, 0.8, [D, U, U, D, D, U])
        .with_effects(&[(NEURO, 0.62)]),
    def("LEX_BRUNET", "Brunet's index", Lexical, Text, 0.7, [I, U, U, I, I, U]),
    def("LEX_HONORE", "Honore's statistic", Lexical, Text, 0.7, [D, U, U, D, D, U]),
    def("LEX_CONTENT_DENSITY", "Content-word density", Lexical, Text, 0.8, [D, D, U, U, D, U])
        .with_effects(&[(NEURO, 0.71)]),
    def("LEX_WORD_FREQ", "Mean word frequency", Lexical, Text, 0.6, [I, U, U, I, U, U]),
    def("LEX_PRONOUN_NOUN", "Pronoun-to-noun ratio", Lexical, Text, 0.9, [I, U, U, U, U, U])
        .with_effects(&[(NEURO, 0.85)]),
    def("LEX_LIGHT_VERB", "Light-verb ratio", Lexical, Text, 0.5, [I, U, U, U, U, U]),
    def("LEX_GENERIC_SUBST", "Generic substitutes (thing, stuff)", Lexical, Text, 0.7, [I, U, U, U, I, U]),
    def("LEX_WORD_FINDING", "Word-finding difficulty markers", Lexical, Text, 1.0, [I, U, U, I, I, U])
        .with_effects(&[(NEURO, 0.94)]),
    def("LEX_NOUN_RATE", "Noun rate", Lexical, Text, 0.6, [D, U, U, U, U, U]),
    def("LEX_AGE_OF_ACQ", "Mean age of acquisition", Lexical, Text, 0.5, [D, U, U, U, U, U]),
    def("LEX_CONCRETENESS", "Mean word concreteness", Lexical, Text, 0.4, [I, U, U, U, U, U]),
    def("LEX_VOCAB_SHRINKAGE", "Vocabulary shrinkage vs history", Lexical, Derived, 0.6, [I, V, U, U, U, U]),
    // =========================================================================
    // SYNTACTIC (9)
    // =========================================================================
    def("SYN_MLU", "Mean length of utterance", Syntactic, Text, 0.8, [D, D, U, U, D, U]),
    def("SYN_SUBORD", "Subordination index", Syntactic, Text, 0.8, [D, U, U, U, U, U])
        .with_effects(&[(NEURO, 0.58)]),
    def("SYN_EMBED_DEPTH", "Clause embedding depth", Syntactic, Text, 0.7, [D, U, U, D, U, U]),
    def("SYN_YNGVE", "Mean Yngve depth", Syntactic, Text, 0.6, [D, U, U, D, U, U]),
    def("SYN_DEP_DISTANCE", "Mean dependency distance", Syntactic, Text, 0.6, [D, U, U, D, U, U]),
    def("SYN_FRAGMENT_RATE", "Sentence fragment rate", Syntactic, Text, 0.7, [I, U, U, U, I, U]),
    def("SYN_PASSIVE", "Passive construction rate", Syntactic, Text, 0.4, [D, U, U, U, U, U]),
    def("SYN_AGREEMENT_ERR", "Agreement error rate", Syntactic, Text, 0.6, [I, U, U, U, U, U]),
    def("SYN_COMPLEX_RATIO", "Complex sentence ratio", Syntactic, Text, 0.7, [D, U, U, D, U, U]),
    // =========================================================================
    // SEMANTIC (9)
    // =========================================================================
    def("SEM_IDEA_DENSITY", "Propositional idea density", Semantic, Text, 1.0, [D, U, U, U, U, U])
        .with_effects(&[(NEURO, 1.12)])
        .sentinel(&[NEURO]),
    def("SEM_REF_COHERENCE", "Referential coherence", Semantic, Text, 1.0, [D, U, U, U, U, U])
        .with_effects(&[(NEURO, 1.05)])
        .sentinel(&[NEURO]),
    def("SEM_LOCAL_COHERENCE", "Local coherence", Semantic, Text, 0.8, [D, D, U, U, D, U]),
    def("SEM_GLOBAL_COHERENCE", "Global coherence", Semantic, Text, 0.8, [D, U, U, U, D, U]),
    def("SEM_EMPTY_SPEECH", "Empty speech rate", Semantic, Text, 0.7, [I, U, U, U, U, U]),
    def("SEM_CIRCUMLOCUTION", "Circumlocution rate", Semantic, Text, 0.6, [I, U, U, I, U, U]),
    def("SEM_PARAPHASIA", "Semantic paraphasia rate", Semantic, Text, 0.8, [I, U, U, U, U, U]),
    def("SEM_INFO_UNITS", "Information units per minute", Semantic, Text, 0.9, [D, D, D, U, D, U])
        .with_effects(&[(NEURO, 0.88)]),
    def("SEM_EMBEDDING_DRIFT", "Semantic embedding drift vs history", Semantic, Derived, 0.5, [I, V, U, U, V, V]),
    // =========================================================================
    // TEMPORAL (10)
    // =========================================================================
    def("TMP_SPEECH_RATE", "Speech rate", Temporal, Audio, 0.8, [D, D, D, D, D, U])
        .sentinel(&[Condition::Psp]),
    def("TMP_ARTIC_RATE", "Articulation rate", Temporal, Audio, 0.7, [D, U, D, D, D, U]),
    def("TMP_PAUSE_RATE", "Pause rate", Temporal, Audio, 0.8, [I, I, I, I, I, U])
        .with_effects(&[(NEURO, 0.74)]),
    def("TMP_PAUSE_DURATION", "Mean pause duration", Temporal, Audio, 0.8, [I, I, I, I, U, U]),
    def("TMP_FILLED_PAUSES", "Filled pause rate", Temporal, Text, 0.6, [I, U, U, U, U, U]),
    def("TMP_RESPONSE_LATENCY", "Response latency", Temporal, Audio, 0.7, [I, I, I, I, I, I])
        .with_effects(&[(DEP, 0.66)]),
    def("TMP_PHONATION_RATIO", "Phonation-time ratio", Temporal, Audio, 0.6, [D, D, D, U, U, U]),
    def("TMP_FALSE_STARTS", "False start rate", Temporal, Text, 0.5, [I, U, I, U, U, U]),
    def("TMP_REPETITIONS", "Word repetition rate", Temporal, Text, 0.5, [I, U, I, U, U, U]),
    def("TMP_LONG_PAUSE_RATIO", "Long-pause ratio (>2s)", Temporal, Audio, 0.7, [I, I, U, U, I, U]),
    // =========================================================================
    // MEMORY (9)
    // =========================================================================
    def("MEM_FREE_RECALL", "Free recall score", Memory, MicroTask, 1.0, [D, D, U, U, D, D])
        .with_effects(&[(NEURO, 1.30), (DEP, 0.55)]),
    def("MEM_CUED_RECALL", "Cued recall score", Memory, MicroTask, 0.9, [D, U, U, U, U, U])
        .with_effects(&[(NEURO, 1.10)]),
    def("MEM_RECOGNITION", "Recognition score", Memory, MicroTask, 0.7, [D, U, U, U, U, U]),
    def("MEM_TEMPORAL_ORIENT", "Temporal orientation", Memory, Text, 0.8, [D, U, U, U, D, U]),
    def("MEM_EPISODIC_DETAIL", "Episodic detail richness", Memory, Text, 0.8, [D, D, U, D, U, D]),
    def("MEM_INTRUSIONS", "Recall intrusions", Memory, MicroTask, 0.7, [I, U, U, U, U, U]),
    def("MEM_REPEATED_STORIES", "Repeated stories across sessions", Memory, Derived, 0.9, [I, U, U, U, U, U])
        .sentinel(&[NEURO]),
    def("MEM_PROSPECTIVE", "Prospective memory task", Memory, MicroTask, 0.6, [D, D, U, U, D, U]),
    def("MEM_DELAYED_RECALL", "Delayed recall score", Memory, MicroTask, 1.0, [D, U, U, U, D, U])
        .with_effects(&[(NEURO, 1.40)]),
    // =========================================================================
    // DISCOURSE (8)
    // =========================================================================
    def("DIS_TOPIC_MAINTENANCE", "Topic maintenance", Discourse, Text, 0.8, [D, U, U, U, D, U]),
    def("DIS_TANGENTIALITY", "Tangentiality", Discourse, Text, 0.7, [I, U, U, U, I, U]),
    def("DIS_TURN_TAKING", "Turn-taking appropriateness", Discourse, Text, 0.5, [D, D, U, U, U, U]),
    def("DIS_NARRATIVE_STRUCT", "Narrative structure completeness", Discourse, Text, 0.8, [D, U, U, U, U, U]),
    def("DIS_QUESTION_RESPONSE", "Question-response relevance", Discourse, Text, 0.7, [D, U, U, U, D, U]),
    def("DIS_SELF_CORRECTION", "Self-correction rate", Discourse, Text, 0.4, [V, U, U, I, U, U]),
    def("DIS_PERSEVERATION", "Perseveration", Discourse, Text, 0.7, [I, U, U, U, U, U]),
    def("DIS_SHARED_REFERENCE", "Shared-reference use", Discourse, Text, 0.5, [D, U, U, U, U, U]),
    // =========================================================================
    // AFFECTIVE (9)
    // =========================================================================
    def("AFF_SELF_PRONOUN", "Self-referential pronoun rate", Affective, Text, 0.8, [U, I, U, U, U, I])
        .with_effects(&[(DEP, 0.72)])
        .sentinel(&[DEP]),
    def("AFF_NEG_VALENCE", "Negative valence", Affective, Text, 0.8, [U, I, U, U, U, I])
        .with_effects(&[(DEP, 0.81)])
        .sentinel(&[DEP]),
    def("AFF_POS_VALENCE", "Positive valence", Affective, Text, 0.6, [U, D, U, U, U, D]),
    def("AFF_ABSOLUTIST", "Absolutist word rate", Affective, Text, 0.6, [U, I, U, U, U, U]),
    def("AFF_HOPELESSNESS", "Hopelessness markers", Affective, Text, 0.7, [U, I, U, U, U, I]),
    def("AFF_ENGAGEMENT", "Conversational engagement", Affective, Text, 0.7, [D, D, U, U, D, D]),
    def("AFF_ANHEDONIA", "Anhedonia markers", Affective, Text, 0.6, [U, I, U, U, U, U]),
    def("AFF_SOCIAL_REF", "Social references", Affective, Text, 0.5, [D, D, U, U, U, V]),
    def("AFF_LOSS_THEMES", "Loss and bereavement themes", Affective, Text, 0.5, [U, V, U, U, U, I])
        .sentinel(&[Condition::GriefDistress]),
    // =========================================================================
    // ACOUSTIC (10)
    // =========================================================================
    def("ACU_F0_MEAN", "Mean fundamental frequency", Acoustic, Audio, 0.3, [V, V, V, V, V, V]),
    def("ACU_F0_SD", "F0 variability (monopitch)", Acoustic, Audio, 0.9, [U, D, D, D, U, U])
        .with_effects(&[(MOV, 1.08), (DEP, 0.50)])
        .sentinel(&[MOV]),
    def("ACU_JITTER", "Jitter", Acoustic, Audio, 0.6, [U, U, I, I, U, U]),
    def("ACU_SHIMMER", "Shimmer", Acoustic, Audio, 0.6, [U, U, I, I, V, U])
        .sentinel(&[Condition::Msa]),
    def("ACU_HNR", "Harmonics-to-noise ratio", Acoustic, Audio, 0.8, [U, U, D, D, U, U])
        .with_effects(&[(MOV, 0.90)])
        .sentinel(&[MOV]),
    def("ACU_CPP", "Cepstral peak prominence", Acoustic, Audio, 0.7, [U, U, D, D, U, U]),
    def("ACU_INTENSITY_SD", "Loudness variability (monoloudness)", Acoustic, Audio, 0.7, [U, D, D, U, U, U]),
    def("ACU_VOCAL_TREMOR", "Vocal tremor index", Acoustic, Audio, 0.7, [U, U, I, U, V, U])
        .sentinel(&[Condition::Msa]),
    def("ACU_SPECTRAL_TILT", "Spectral tilt", Acoustic, Audio, 0.3, [U, V, V, V, U, U]),
    def("ACU_MFCC_DRIFT", "MFCC profile drift vs history", Acoustic, Derived, 0.4, [U, V, I, U, V, U]),
    // =========================================================================
    // PD MOTOR (8)
    // =========================================================================
    def("PDM_DDK_RATE", "Diadochokinetic rate", PdMotor, MicroTask, 1.0, [U, U, D, D, D, U])
        .with_effects(&[(MOV, 1.21)])
        .sentinel(&[MOV]),
    def("PDM_DDK_REGULARITY", "Diadochokinetic regularity", PdMotor, MicroTask, 0.8, [U, U, D, U, U, U]),
    def("PDM_VOT", "Voice onset time", PdMotor, Audio, 0.5, [U, U, I, V, U, U]),
    def("PDM_ARTIC_PRECISION", "Articulatory precision", PdMotor, Audio, 0.9, [U, U, D, U, D, U])
        .sentinel(&[Condition::Psp]),
    def("PDM_VOWEL_SPACE", "Vowel space area", PdMotor, Audio, 0.8, [U, U, D, U, U, U])
        .with_effects(&[(MOV, 0.95)]),
    def("PDM_FESTINATION", "Speech festination", PdMotor, Audio, 0.6, [U, U, I, U, U, U]),
    def("PDM_PPE", "Pitch period entropy", PdMotor, Audio, 0.6, [U, U, I, I, U, U]),
    def("PDM_RHYTHM_IRREG", "Rhythm irregularity", PdMotor, MicroTask, 0.7, [U, U, I, U, U, U])
        .sentinel(&[Condition::Msa]),
];

lazy_static! {
    static ref INDEX: HashMap<&'static str, usize> = INDICATORS
        .iter()
        .enumerate()
        .map(|(i, d)| (d.id, i))
        .collect();
}

/// Every indicator in catalog order
pub fn all() -> &'static [IndicatorDefinition] {
    INDICATORS
}

pub fn len() -> usize {
    INDICATORS.len()
}

pub fn get(id: &str) -> Option<&'static IndicatorDefinition> {
    INDEX.get(id).map(|&i| &INDICATORS[i])
}

pub fn contains(id: &str) -> bool {
    INDEX.contains_key(id)
}

pub fn ids() -> impl Iterator<Item = &'static str> {
    INDICATORS.iter().map(|d| d.id)
}

pub fn in_domain(domain: Domain) -> impl Iterator<Item = &'static IndicatorDefinition> {
    INDICATORS.iter().filter(move |d| d.domain == domain)
}

pub fn by_channel(channel: Channel) -> impl Iterator<Item = &'static IndicatorDefinition> {
    INDICATORS.iter().filter(move |d| d.channel == channel)
}

/// High-specificity markers for one condition
pub fn sentinels(condition: Condition) -> impl Iterator<Item = &'static IndicatorDefinition> {
    INDICATORS
        .iter()
        .filter(move |d| d.is_sentinel_for(condition))
}

// =============================================================================
// TESTS
// =============================================================================
