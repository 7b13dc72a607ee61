//! Narrative generation: the external service contract and the templated
//! fallback used whenever that service cannot be relied on.

use std::time::Duration;

use futures_util::future::BoxFuture;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::NarrativeConfig;
use crate::types::{
    AlertLevel, AlgorithmicReport, Condition, Domain, NarrativeRequest, NarrativeResponse,
    NarrativeSection, NarrativeSource,
};

/// Pause between retries, multiplied by the attempt number
const RETRY_DELAY_MS: u64 = 500;

#[derive(Debug, Error)]
pub enum NarrativeError {
    #[error("narrative service timed out")]
    Timeout,
    #[error("narrative transport error: {0}")]
    Transport(String),
    #[error("narrative service returned HTTP {0}")]
    Status(u16),
    #[error("narrative response failed schema check: {0}")]
    InvalidSchema(String),
    #[error("no narrative service configured")]
    Unavailable,
}

impl NarrativeError {
    /// Short tag stored in the report's fallback source
    pub fn tag(&self) -> String {
        match self {
            NarrativeError::Timeout => "timeout".to_string(),
            NarrativeError::Transport(_) => "transport_error".to_string(),
            NarrativeError::Status(code) => format!("http_{}", code),
            NarrativeError::InvalidSchema(_) => "invalid_schema".to_string(),
            NarrativeError::Unavailable => "unavailable".to_string(),
        }
    }
}

/// External narrative collaborator
pub trait NarrativeService: Send + Sync {
    fn generate<'a>(
        &'a self,
        request: &'a NarrativeRequest,
    ) -> BoxFuture<'a, Result<NarrativeResponse, NarrativeError>>;
}

/// No service configured; every request falls back to templates
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineNarrative;

impl NarrativeService for OfflineNarrative {
    fn generate<'a>(
        &'a self,
        _request: &'a NarrativeRequest,
    ) -> BoxFuture<'a, Result<NarrativeResponse, NarrativeError>> {
        Box::pin(async { Err(NarrativeError::Unavailable) })
    }
}

/// JSON POST to a narrative endpoint with bounded retries
#[derive(Debug, Clone)]
pub struct HttpNarrativeService {
    client: reqwest::Client,
    endpoint: String,
    max_retries: u32,
}

impl HttpNarrativeService {
    pub fn new(endpoint: impl Into<String>, config: &NarrativeConfig) -> Result<Self, NarrativeError> {
        let client = reqwest::Client::builder()
            .timeout(config.attempt_timeout())
            .build()
            .map_err(|e| NarrativeError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            max_retries: config.max_retries,
        })
    }

    /// Service from config, or the offline stand-in when no endpoint is set
    pub fn from_config(config: &NarrativeConfig) -> Result<Box<dyn NarrativeService>, NarrativeError> {
        match &config.endpoint {
            Some(url) => Ok(Box::new(Self::new(url.clone(), config)?)),
            None => Ok(Box::new(OfflineNarrative)),
        }
    }

    async fn post_once(&self, request: &NarrativeRequest) -> Result<NarrativeResponse, NarrativeError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NarrativeError::Timeout
                } else {
                    NarrativeError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(NarrativeError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| NarrativeError::Transport(e.to_string()))?;
        let parsed: NarrativeResponse = serde_json::from_str(&body)
            .map_err(|e| NarrativeError::InvalidSchema(e.to_string()))?;
        if let Some(violation) = parsed.schema_violation() {
            return Err(NarrativeError::InvalidSchema(violation.to_string()));
        }
        Ok(parsed)
    }
}

impl NarrativeService for HttpNarrativeService {
    fn generate<'a>(
        &'a self,
        request: &'a NarrativeRequest,
    ) -> BoxFuture<'a, Result<NarrativeResponse, NarrativeError>> {
        Box::pin(async move {
            let mut attempt = 0;
            loop {
                match self.post_once(request).await {
                    Ok(response) => return Ok(response),
                    // Retry only failures that another attempt could fix
                    Err(e @ (NarrativeError::Transport(_) | NarrativeError::Timeout))
                        if attempt < self.max_retries =>
                    {
                        attempt += 1;
                        warn!(error = %e, attempt, "narrative request failed, retrying");
                        tokio::time::sleep(Duration::from_millis(RETRY_DELAY_MS * attempt as u64))
                            .await;
                    }
                    Err(NarrativeError::Status(code)) if code >= 500 && attempt < self.max_retries => {
                        attempt += 1;
                        warn!(status = code, attempt, "narrative service error, retrying");
                        tokio::time::sleep(Duration::from_millis(RETRY_DELAY_MS * attempt as u64))
                            .await;
                    }
                    Err(e) => return Err(e),
                }
            }
        })
    }
}

impl From<NarrativeResponse> for NarrativeSection {
    fn from(r: NarrativeResponse) -> Self {
        NarrativeSection {
            family_text: r.family_text,
            clinician_text: r.clinician_text,
            next_focus: r.next_focus,
            confidence_narrative: r.confidence_narrative,
            source: NarrativeSource::Generated,
        }
    }
}

// =============================================================================
// TEMPLATED FALLBACK
// =============================================================================

/// Deterministic narrative built only from the algorithmic results
pub fn fallback(report: &AlgorithmicReport, reason: &NarrativeError) -> NarrativeSection {
    let alert = report.alert_level();
    let primary = report.differential.primary_hypothesis;
    debug!(
        patient_id = %report.patient_id,
        period = %report.period,
        reason = %reason.tag(),
        "using templated narrative"
    );

    NarrativeSection {
        family_text: family_text(alert, primary),
        clinician_text: clinician_text(report),
        next_focus: next_focus(report),
        confidence_narrative: confidence_text(report.differential.confidence),
        source: NarrativeSource::Fallback {
            reason: reason.tag(),
        },
    }
}

fn family_text(alert: AlertLevel, primary: Condition) -> String {
    match alert {
        AlertLevel::Green => format!(
            "Conversations this week looked much like their usual pattern. \
             Nothing stands out; the closest explanation for small changes is {}.",
            primary.label()
        ),
        AlertLevel::Yellow => format!(
            "Conversations this week showed some small changes from the usual pattern. \
             This is worth keeping an eye on; the most likely explanation is {}.",
            primary.label()
        ),
        AlertLevel::Orange => format!(
            "Conversations this week showed clear changes from the usual pattern. \
             We suggest talking with their doctor; the pattern is most consistent with {}.",
            primary.label()
        ),
        AlertLevel::Red => format!(
            "Conversations this week showed marked changes from the usual pattern. \
             Please arrange a medical review soon; the pattern is most consistent with {}.",
            primary.label()
        ),
    }
}

fn clinician_text(report: &AlgorithmicReport) -> String {
    let diff = &report.differential;
    let mut text = format!(
        "Composite {:.2} ({}), {} of 9 domains measured. Primary hypothesis {} (p={:.2}), \
         secondary {} (p={:.2}), confidence {:.2}. Temporal pattern: {}.",
        report.composite(),
        report.alert_level(),
        report.deviation.measured_domains,
        diff.primary_hypothesis,
        diff.probability(diff.primary_hypothesis),
        diff.secondary_hypothesis,
        diff.probability(diff.secondary_hypothesis),
        diff.confidence,
        report.temporal_pattern,
    );
    if report.cascade.detected() {
        text.push_str(&format!(
            " Cascade stage {} ({}).",
            report.cascade.depth(),
            if report.cascade.order_preserved() {
                "expected order"
            } else {
                "atypical order"
            }
        ));
    }
    if let Some(prior) = &report.prior {
        text.push_str(&format!(
            " Change since {}: {:+.2}.",
            prior.previous_period, prior.delta
        ));
    }
    text.push_str(&format!(
        " Forecast at horizon: {} ({}).",
        report.trajectory.predicted_alert_at_horizon, report.trajectory.model
    ));
    text
}

fn next_focus(report: &AlgorithmicReport) -> Vec<String> {
    let weakest = report
        .deviation
        .weakest_domain()
        .filter(|(_, score)| *score < 0.0)
        .map(|(d, _)| d);
    match weakest {
        Some(domain) => vec![
            focus_hint(domain).to_string(),
            "Keep session length and time of day consistent".to_string(),
        ],
        None => vec!["Continue the usual mix of conversation topics".to_string()],
    }
}

fn focus_hint(domain: Domain) -> &'static str {
    match domain {
        Domain::Lexical => "Invite open description tasks (pictures, places) to sample vocabulary",
        Domain::Syntactic => "Encourage longer narrative answers to sample sentence structure",
        Domain::Semantic => "Ask for retellings of familiar stories to check content coherence",
        Domain::Temporal => "Allow unhurried turns and note pauses and speaking rate",
        Domain::Memory => "Revisit recent events and include the recall micro-task",
        Domain::Discourse => "Use multi-step topics to follow topic maintenance",
        Domain::Affective => "Check in on mood, sleep and recent events",
        Domain::Acoustic => "Include a sustained-vowel task in a quiet setting",
        Domain::PdMotor => "Include the diadochokinetic (pa-ta-ka) task",
    }
}

fn confidence_text(confidence: f64) -> String {
    let band = if confidence >= 0.8 {
        "high"
    } else if confidence >= 0.5 {
        "moderate"
    } else {
        "low"
    };
    format!(
        "Differential confidence is {} ({:.2}); this report is algorithmic only.",
        band, confidence
    )
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_tags() {
        assert_eq!(NarrativeError::Timeout.tag(), "timeout");
        assert_eq!(NarrativeError::Status(503).tag(), "http_503");
        assert_eq!(
            NarrativeError::InvalidSchema("x".into()).tag(),
            "invalid_schema"
        );
    }

    #[test]
    fn test_family_text_varies_by_alert_and_condition() {
        let green = family_text(AlertLevel::Green, Condition::NormalAging);
        let red = family_text(AlertLevel::Red, Condition::NormalAging);
        let red_dep = family_text(AlertLevel::Red, Condition::Depressive);
        assert_ne!(green, red);
        assert_ne!(red, red_dep);
        assert!(red_dep.contains("low mood"));
    }

    #[test]
    fn test_confidence_bands() {
        assert!(confidence_text(0.95).contains("high"));
        assert!(confidence_text(0.6).contains("moderate"));
        assert!(confidence_text(0.3).contains("low"));
    }

    #[tokio::test]
    async fn test_offline_is_unavailable() {
        let req = NarrativeRequest {
            patient_id: "p1".into(),
            period: "2026-W43".into(),
            composite: 0.0,
            alert_level: AlertLevel::Green,
            domain_scores: Default::default(),
            cascade: vec![],
            temporal_pattern: "stable".into(),
            probabilities: Default::default(),
            primary_hypothesis: Condition::NormalAging,
            confidence: 0.9,
            evidence: Default::default(),
            trajectory: vec![],
            predicted_alert_at_horizon: AlertLevel::Green,
            prior: None,
        };
        let err = OfflineNarrative.generate(&req).await.unwrap_err();
        assert!(matches!(err, NarrativeError::Unavailable));
    }
}
