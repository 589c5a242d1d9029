use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::health;
use crate::models::{
    EngagementSnapshot, HealthScoreResult, LeadRecord, LifeEventRecord, TouchpointRecord,
};

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

/// Strategy seam for health scoring. Implementations never fail: the
/// generative path degrades to the deterministic algorithm instead.
#[async_trait]
pub trait HealthScorer: Send + Sync {
    async fn score(
        &self,
        lead: &LeadRecord,
        touchpoints: &[TouchpointRecord],
        life_events: &[LifeEventRecord],
    ) -> HealthScoreResult;

    fn name(&self) -> &'static str;
}

pub struct DeterministicScorer;

#[async_trait]
impl HealthScorer for DeterministicScorer {
    async fn score(
        &self,
        lead: &LeadRecord,
        touchpoints: &[TouchpointRecord],
        life_events: &[LifeEventRecord],
    ) -> HealthScoreResult {
        health::compute_health_score(lead, touchpoints, life_events)
    }

    fn name(&self) -> &'static str {
        "deterministic"
    }
}

#[derive(Debug, Clone)]
pub struct GenerativeSettings {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

/// Scores through an OpenAI-compatible chat-completions backend constrained
/// to emit the `HealthScoreResult` JSON shape. Any transport error, malformed
/// payload, or out-of-range field rejects the substitute and falls back to
/// the deterministic algorithm.
pub struct GenerativeScorer {
    client: reqwest::Client,
    settings: GenerativeSettings,
}

#[derive(Debug, Error)]
pub enum GenerativeError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend returned {status}: {body}")]
    Backend {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("response carried no choices")]
    EmptyResponse,
    #[error("malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: i32 },
    #[error("retention_actions is empty")]
    NoActions,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

impl GenerativeScorer {
    pub fn new(settings: GenerativeSettings) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("failed to build HTTP client for generative scorer")?;
        Ok(Self { client, settings })
    }

    async fn request_score(
        &self,
        lead: &LeadRecord,
        snapshot: &EngagementSnapshot,
    ) -> Result<HealthScoreResult, GenerativeError> {
        let url = format!(
            "{}/chat/completions",
            self.settings.base_url.trim_end_matches('/')
        );
        let payload = json!({
            "model": self.settings.model,
            "max_tokens": 1000,
            "temperature": 0.3,
            "messages": [{
                "role": "user",
                "content": build_prompt(lead, snapshot),
            }],
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.settings.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GenerativeError::Backend { status, body });
        }

        let completion: ChatCompletionResponse = response.json().await?;
        let content = completion
            .choices
            .first()
            .map(|choice| choice.message.content.as_str())
            .ok_or(GenerativeError::EmptyResponse)?;

        let result = parse_generated_payload(content)?;
        validate(&result)?;
        Ok(result)
    }
}

#[async_trait]
impl HealthScorer for GenerativeScorer {
    async fn score(
        &self,
        lead: &LeadRecord,
        touchpoints: &[TouchpointRecord],
        life_events: &[LifeEventRecord],
    ) -> HealthScoreResult {
        let snapshot = health::snapshot(touchpoints, life_events);
        match self.request_score(lead, &snapshot).await {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    lead = %lead.email,
                    "generative scorer rejected, falling back to deterministic"
                );
                health::score_from_snapshot(lead, &snapshot)
            }
        }
    }

    fn name(&self) -> &'static str {
        "generative"
    }
}

/// Selects the scoring strategy once at startup. `SCORER_MODE=generative`
/// requires `GROQ_API_KEY`; everything else is deterministic.
pub fn scorer_from_env() -> anyhow::Result<Box<dyn HealthScorer>> {
    match std::env::var("SCORER_MODE").as_deref() {
        Ok("generative") => {
            let api_key = std::env::var("GROQ_API_KEY")
                .context("GROQ_API_KEY must be set when SCORER_MODE=generative")?;
            let base_url = std::env::var("GROQ_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
            let model =
                std::env::var("GROQ_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
            let scorer = GenerativeScorer::new(GenerativeSettings {
                api_key,
                base_url,
                model,
            })?;
            Ok(Box::new(scorer))
        }
        _ => Ok(Box::new(DeterministicScorer)),
    }
}

fn build_prompt(lead: &LeadRecord, snapshot: &EngagementSnapshot) -> String {
    format!(
        "You are an insurance policy health analyst. Score this customer's churn risk.\n\
         \n\
         CUSTOMER: {name} ({insurance_type} policy, current provider: {provider})\n\
         ENGAGEMENT: {touchpoints} touchpoints; recent sentiments: {sentiments}; \
         recent intents: {intents}; unaddressed life events: {unaddressed}\n\
         \n\
         Weight sub-scores 25% engagement, 30% satisfaction, 20% usage, 25% payment.\n\
         Return ONLY a JSON object with these fields:\n\
         {{\"health_score\": <0-100>, \"churn_risk\": \"low|medium|high\", \
         \"churn_probability\": <0-100>, \"days_to_predicted_churn\": <days>, \
         \"engagement_score\": <0-100>, \"satisfaction_score\": <0-100>, \
         \"usage_score\": <0-100>, \"payment_score\": <0-100>, \
         \"reasoning\": \"<brief>\", \"retention_actions\": [\"<action>\", ...], \
         \"priority\": \"low|medium|high\"}}",
        name = lead.full_name,
        insurance_type = lead.insurance_type,
        provider = lead.current_provider.as_deref().unwrap_or("unknown"),
        touchpoints = snapshot.touchpoint_count,
        sentiments = join_or(&snapshot.recent_sentiments, "none"),
        intents = join_or(&snapshot.recent_intents, "none"),
        unaddressed = snapshot.unaddressed_life_events,
    )
}

fn join_or(labels: &[String], fallback: &str) -> String {
    if labels.is_empty() {
        fallback.to_string()
    } else {
        labels.join(", ")
    }
}

/// Parses a generated substitute, tolerating a single surrounding markdown
/// fence. Anything else malformed is rejected.
pub fn parse_generated_payload(content: &str) -> Result<HealthScoreResult, serde_json::Error> {
    serde_json::from_str(strip_fence(content))
}

fn strip_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Range checks a substitute result before accepting it in place of the
/// deterministic algorithm.
pub fn validate(result: &HealthScoreResult) -> Result<(), ValidationError> {
    let bounded = [
        ("health_score", result.health_score),
        ("churn_probability", result.churn_probability),
        ("engagement_score", result.engagement_score),
        ("satisfaction_score", result.satisfaction_score),
        ("usage_score", result.usage_score),
        ("payment_score", result.payment_score),
    ];
    for (field, value) in bounded {
        if !(0..=100).contains(&value) {
            return Err(ValidationError::OutOfRange { field, value });
        }
    }
    if result.days_to_predicted_churn < 0 {
        return Err(ValidationError::OutOfRange {
            field: "days_to_predicted_churn",
            value: result.days_to_predicted_churn,
        });
    }
    if result.retention_actions.is_empty() {
        return Err(ValidationError::NoActions);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn sample_lead() -> LeadRecord {
        LeadRecord {
            id: Uuid::new_v4(),
            full_name: "Sam Ortiz".to_string(),
            email: "sam.ortiz@example.com".to_string(),
            phone: "+15550122".to_string(),
            insurance_type: "auto".to_string(),
            current_provider: None,
        }
    }

    const VALID_PAYLOAD: &str = r#"{
        "health_score": 82,
        "churn_risk": "low",
        "churn_probability": 12,
        "days_to_predicted_churn": 120,
        "engagement_score": 80,
        "satisfaction_score": 85,
        "usage_score": 78,
        "payment_score": 90,
        "reasoning": "steady engagement",
        "retention_actions": ["Maintain current engagement level"],
        "priority": "low"
    }"#;

    #[test]
    fn accepts_well_formed_payload() {
        let result = parse_generated_payload(VALID_PAYLOAD).expect("payload parses");
        assert_eq!(result.health_score, 82);
        assert!(validate(&result).is_ok());
    }

    #[test]
    fn accepts_fenced_payload() {
        let fenced = format!("```json\n{VALID_PAYLOAD}\n```");
        let result = parse_generated_payload(&fenced).expect("fenced payload parses");
        assert_eq!(result.churn_probability, 12);
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(parse_generated_payload("not json at all").is_err());
        assert!(parse_generated_payload("{\"health_score\": 80}").is_err());
    }

    #[test]
    fn rejects_unknown_risk_label() {
        let payload = VALID_PAYLOAD.replace("\"low\"", "\"catastrophic\"");
        assert!(parse_generated_payload(&payload).is_err());
    }

    #[test]
    fn rejects_out_of_range_scores() {
        let mut result = parse_generated_payload(VALID_PAYLOAD).expect("payload parses");
        result.health_score = 150;
        assert!(matches!(
            validate(&result),
            Err(ValidationError::OutOfRange {
                field: "health_score",
                ..
            })
        ));

        result.health_score = 80;
        result.churn_probability = -5;
        assert!(validate(&result).is_err());
    }

    #[test]
    fn rejects_empty_action_list() {
        let mut result = parse_generated_payload(VALID_PAYLOAD).expect("payload parses");
        result.retention_actions.clear();
        assert!(matches!(validate(&result), Err(ValidationError::NoActions)));
    }

    #[test]
    fn deterministic_output_always_validates() {
        let lead = sample_lead();
        let result = health::compute_health_score(&lead, &[], &[]);
        assert!(validate(&result).is_ok());
    }

    #[tokio::test]
    async fn deterministic_scorer_matches_core_algorithm() {
        let lead = sample_lead();
        let scorer = DeterministicScorer;
        let scored = scorer.score(&lead, &[], &[]).await;
        let direct = health::compute_health_score(&lead, &[], &[]);
        assert_eq!(scored.health_score, direct.health_score);
        assert_eq!(scored.retention_actions, direct.retention_actions);
    }

    #[tokio::test]
    async fn generative_scorer_falls_back_when_backend_unreachable() {
        let lead = sample_lead();
        let scorer = GenerativeScorer::new(GenerativeSettings {
            api_key: "test-key".to_string(),
            // Discard port on loopback; the connection is refused immediately.
            base_url: "http://127.0.0.1:9".to_string(),
            model: DEFAULT_MODEL.to_string(),
        })
        .expect("client builds");

        let scored = scorer.score(&lead, &[], &[]).await;
        let fallback = health::compute_health_score(&lead, &[], &[]);
        assert_eq!(scored.health_score, fallback.health_score);
        assert_eq!(scored.churn_risk, fallback.churn_risk);
    }
}
