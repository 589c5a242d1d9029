use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct LeadRecord {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub insurance_type: String,
    pub current_provider: Option<String>,
}

impl LeadRecord {
    pub fn first_name(&self) -> &str {
        self.full_name.split_whitespace().next().unwrap_or("there")
    }
}

/// History view consumed by the scoring core; fetched per lead, so it does
/// not carry row identifiers.
#[derive(Debug, Clone)]
pub struct TouchpointRecord {
    pub channel: String,
    pub direction: Option<String>,
    pub content: String,
    pub sentiment: Option<String>,
    pub intent: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct LifeEventRecord {
    pub event_type: String,
    pub description: Option<String>,
    pub outcome: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl LifeEventRecord {
    /// An event counts as unaddressed until a non-pending outcome is recorded.
    pub fn is_unaddressed(&self) -> bool {
        matches!(self.outcome.as_deref(), None | Some("pending"))
    }
}

/// Derived view of a lead's engagement history; never persisted.
#[derive(Debug, Clone)]
pub struct EngagementSnapshot {
    pub touchpoint_count: usize,
    pub recent_sentiments: Vec<String>,
    pub recent_intents: Vec<String>,
    pub unaddressed_life_events: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChurnRisk {
    Low,
    Medium,
    High,
}

impl ChurnRisk {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChurnRisk::Low => "low",
            ChurnRisk::Medium => "medium",
            ChurnRisk::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthScoreResult {
    pub health_score: i32,
    pub churn_risk: ChurnRisk,
    pub churn_probability: i32,
    pub days_to_predicted_churn: i32,
    pub engagement_score: i32,
    pub satisfaction_score: i32,
    pub usage_score: i32,
    pub payment_score: i32,
    pub reasoning: String,
    pub retention_actions: Vec<String>,
    pub priority: Priority,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShiftType {
    Initial,
    Stable,
    Positive,
    Negative,
    Lateral,
}

impl ShiftType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShiftType::Initial => "initial",
            ShiftType::Stable => "stable",
            ShiftType::Positive => "positive",
            ShiftType::Negative => "negative",
            ShiftType::Lateral => "lateral",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Significance {
    Low,
    Medium,
    High,
}

impl Significance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Significance::Low => "low",
            Significance::Medium => "medium",
            Significance::High => "high",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentShiftResult {
    pub shift_detected: bool,
    pub previous_intent: Option<String>,
    pub current_intent: String,
    pub shift_type: ShiftType,
    pub significance: Significance,
    pub message: String,
    pub previous_level: Option<f64>,
    pub current_level: Option<f64>,
}

/// Which outreach the customer is replying to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseDomain {
    LifeEvent,
    Occasion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyOutcome {
    Converted,
    Accepted,
    Declined,
    Pending,
}

impl ReplyOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplyOutcome::Converted => "converted",
            ReplyOutcome::Accepted => "accepted",
            ReplyOutcome::Declined => "declined",
            ReplyOutcome::Pending => "pending",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyIntent {
    Positive,
    Negative,
    Curious,
    Unclear,
}

impl ReplyIntent {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplyIntent::Positive => "positive",
            ReplyIntent::Negative => "negative",
            ReplyIntent::Curious => "curious",
            ReplyIntent::Unclear => "unclear",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReplyAnalysis {
    pub intent: ReplyIntent,
    pub confidence: f64,
    pub outcome: ReplyOutcome,
    pub next_action: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpportunityType {
    Upsell,
    Retention,
}

impl OpportunityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpportunityType::Upsell => "upsell",
            OpportunityType::Retention => "retention",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Opportunity {
    pub opportunity_type: OpportunityType,
    pub recommended_product: &'static str,
    pub estimated_value_monthly: i32,
    pub message: String,
}

/// Outreach derived from an opportunity plus the lead's current health.
#[derive(Debug, Clone)]
pub struct OutreachAction {
    pub action_type: &'static str,
    pub opportunity_type: OpportunityType,
    pub content: String,
    pub recommended_product: &'static str,
    pub estimated_value_monthly: i32,
    pub priority: Priority,
    pub timing: &'static str,
}
