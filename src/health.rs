use crate::models::{
    ChurnRisk, EngagementSnapshot, HealthScoreResult, LeadRecord, LifeEventRecord, Priority,
    ReplyOutcome, ResponseDomain, TouchpointRecord,
};

/// Only the most recent touchpoints feed the sentiment/intent window.
const RECENT_WINDOW: usize = 5;

/// No payment data source exists in scope; assume good standing.
const PAYMENT_SCORE: i32 = 90;

const DEFAULT_SUBSCORE: i32 = 75;

const GOOD_INTENTS: [&str; 2] = ["interested", "ready"];
const BAD_INTENTS: [&str; 2] = ["objecting", "lost"];

const DAYS_TO_PREDICTED_CHURN: i32 = 90;

pub fn snapshot(
    touchpoints: &[TouchpointRecord],
    life_events: &[LifeEventRecord],
) -> EngagementSnapshot {
    let start = touchpoints.len().saturating_sub(RECENT_WINDOW);
    let mut recent_sentiments = Vec::new();
    let mut recent_intents = Vec::new();

    for touchpoint in &touchpoints[start..] {
        if let Some(sentiment) = &touchpoint.sentiment {
            recent_sentiments.push(sentiment.clone());
        }
        if let Some(intent) = &touchpoint.intent {
            recent_intents.push(intent.clone());
        }
    }

    EngagementSnapshot {
        touchpoint_count: touchpoints.len(),
        recent_sentiments,
        recent_intents,
        unaddressed_life_events: life_events
            .iter()
            .filter(|event| event.is_unaddressed())
            .count(),
    }
}

pub fn compute_health_score(
    lead: &LeadRecord,
    touchpoints: &[TouchpointRecord],
    life_events: &[LifeEventRecord],
) -> HealthScoreResult {
    score_from_snapshot(lead, &snapshot(touchpoints, life_events))
}

pub fn score_from_snapshot(lead: &LeadRecord, snap: &EngagementSnapshot) -> HealthScoreResult {
    let engagement_score = ((snap.touchpoint_count as i64 * 10) + 50).min(100) as i32;
    let satisfaction_score = leaning_score(&snap.recent_sentiments, &["positive"], &["negative"]);
    let usage_score = leaning_score(&snap.recent_intents, &GOOD_INTENTS, &BAD_INTENTS);

    let blended = 0.25 * f64::from(engagement_score)
        + 0.30 * f64::from(satisfaction_score)
        + 0.20 * f64::from(usage_score)
        + 0.25 * f64::from(PAYMENT_SCORE);
    let health_score =
        (blended.round() as i32 - 10 * snap.unaddressed_life_events as i32).max(0);

    let (churn_risk, churn_probability) = churn_tier(health_score);

    HealthScoreResult {
        health_score,
        churn_risk,
        churn_probability,
        days_to_predicted_churn: DAYS_TO_PREDICTED_CHURN,
        engagement_score,
        satisfaction_score,
        usage_score,
        payment_score: PAYMENT_SCORE,
        reasoning: format!(
            "{} policy: {} interactions, {} sentiment signals, {} unaddressed life events",
            lead.insurance_type,
            snap.touchpoint_count,
            snap.recent_sentiments.len(),
            snap.unaddressed_life_events
        ),
        retention_actions: base_retention_actions(
            engagement_score,
            satisfaction_score,
            snap.unaddressed_life_events,
        ),
        priority: action_priority(health_score),
    }
}

/// Shifts a 75-point baseline by up to 25 points toward whichever way the
/// labeled window leans. Unlabeled windows keep the baseline.
fn leaning_score(labels: &[String], favorable: &[&str], unfavorable: &[&str]) -> i32 {
    if labels.is_empty() {
        return DEFAULT_SUBSCORE;
    }

    let favorable_count = labels
        .iter()
        .filter(|label| favorable.contains(&label.as_str()))
        .count() as f64;
    let unfavorable_count = labels
        .iter()
        .filter(|label| unfavorable.contains(&label.as_str()))
        .count() as f64;
    let ratio = (favorable_count - unfavorable_count) / labels.len() as f64;

    (f64::from(DEFAULT_SUBSCORE) + ratio * 25.0)
        .clamp(0.0, 100.0)
        .round() as i32
}

pub fn churn_tier(health_score: i32) -> (ChurnRisk, i32) {
    if health_score >= 80 {
        (ChurnRisk::Low, 15)
    } else if health_score >= 50 {
        (ChurnRisk::Medium, 35)
    } else {
        (ChurnRisk::High, 65)
    }
}

pub fn action_priority(health_score: i32) -> Priority {
    if health_score < 70 {
        Priority::High
    } else if health_score < 85 {
        Priority::Medium
    } else {
        Priority::Low
    }
}

fn base_retention_actions(
    engagement_score: i32,
    satisfaction_score: i32,
    unaddressed_life_events: usize,
) -> Vec<String> {
    let engagement_action = if engagement_score < 70 {
        "Increase engagement through personalized outreach"
    } else {
        "Maintain current engagement level"
    };
    let life_event_action = if unaddressed_life_events > 0 {
        "Address open life events with a tailored offer"
    } else {
        "Monitor for new life events"
    };
    let satisfaction_action = if satisfaction_score < 70 {
        "Improve satisfaction through proactive support"
    } else {
        "Continue excellent service"
    };

    vec![
        engagement_action.to_string(),
        life_event_action.to_string(),
        satisfaction_action.to_string(),
    ]
}

enum RiskRule {
    Unchanged,
    Force(ChurnRisk, i32),
    /// Re-tier from the adjusted score and bump probability up to a cap.
    Reassess {
        probability_bump: i32,
        probability_cap: i32,
    },
}

struct Adjustment {
    delta: i32,
    floor: i32,
    cap: i32,
    risk: RiskRule,
    actions: &'static [&'static str],
    priority: Priority,
    note: &'static str,
}

const SUSTAIN_ACTIONS: [&str; 3] = [
    "Continue excellent service",
    "Monitor for additional upsell opportunities",
    "Celebrate conversion with a thank you message",
];

const WIN_BACK_ACTIONS: [&str; 5] = [
    "Schedule follow-up call to understand concerns",
    "Offer alternative coverage options at lower price points",
    "Send educational content about product value",
    "Check in again in 30 days with a different approach",
    "Monitor for any signs of policy cancellation",
];

const NURTURE_ACTIONS: [&str; 4] = [
    "Send detailed product information",
    "Provide customer testimonials and case studies",
    "Offer to schedule a consultation call",
    "Follow up in 7 days if no response",
];

const OCCASION_SUSTAIN_ACTIONS: [&str; 3] = [
    "Continue celebrating milestones",
    "Monitor for additional engagement opportunities",
    "Maintain excellent service",
];

const OCCASION_RE_ENGAGE_ACTIONS: [&str; 3] = [
    "Try a different engagement approach",
    "Monitor customer satisfaction",
    "Check in with a personalized message",
];

fn adjustment_for(domain: ResponseDomain, outcome: ReplyOutcome) -> Option<Adjustment> {
    match (domain, outcome) {
        (ResponseDomain::LifeEvent, ReplyOutcome::Converted) => Some(Adjustment {
            delta: 20,
            floor: 0,
            cap: 95,
            risk: RiskRule::Force(ChurnRisk::Low, 5),
            actions: &SUSTAIN_ACTIONS,
            priority: Priority::Low,
            note: "Customer converted on a life event opportunity; engagement and satisfaction trending up.",
        }),
        (ResponseDomain::LifeEvent, ReplyOutcome::Declined) => Some(Adjustment {
            delta: -15,
            floor: 40,
            cap: 100,
            risk: RiskRule::Reassess {
                probability_bump: 20,
                probability_cap: 70,
            },
            actions: &WIN_BACK_ACTIONS,
            priority: Priority::High,
            note: "Customer declined a life event opportunity; may signal dissatisfaction or budget pressure.",
        }),
        (ResponseDomain::LifeEvent, ReplyOutcome::Pending) => Some(Adjustment {
            delta: -5,
            floor: 50,
            cap: 100,
            risk: RiskRule::Unchanged,
            actions: &NURTURE_ACTIONS,
            priority: Priority::Medium,
            note: "Customer response unclear; nurturing until intent firms up.",
        }),
        (ResponseDomain::Occasion, ReplyOutcome::Accepted) => Some(Adjustment {
            delta: 10,
            floor: 0,
            cap: 95,
            risk: RiskRule::Force(ChurnRisk::Low, 10),
            actions: &OCCASION_SUSTAIN_ACTIONS,
            priority: Priority::Low,
            note: "Customer engaged warmly with an occasion touch; loyalty strengthened.",
        }),
        (ResponseDomain::Occasion, ReplyOutcome::Declined) => Some(Adjustment {
            delta: -5,
            floor: 50,
            cap: 100,
            risk: RiskRule::Unchanged,
            actions: &OCCASION_RE_ENGAGE_ACTIONS,
            priority: Priority::Medium,
            note: "Customer passed on an occasion touch.",
        }),
        _ => None,
    }
}

/// Second stage applied after a customer replies to outreach. Kept separate
/// from the base computation: the base score must stay reproducible from
/// history alone.
pub fn apply_reply_adjustment(
    result: &mut HealthScoreResult,
    domain: ResponseDomain,
    outcome: ReplyOutcome,
) {
    let Some(adjustment) = adjustment_for(domain, outcome) else {
        return;
    };

    result.health_score =
        (result.health_score + adjustment.delta).clamp(adjustment.floor, adjustment.cap);

    match adjustment.risk {
        RiskRule::Unchanged => {}
        RiskRule::Force(risk, probability) => {
            result.churn_risk = risk;
            result.churn_probability = probability;
        }
        RiskRule::Reassess {
            probability_bump,
            probability_cap,
        } => {
            result.churn_risk = if result.health_score < 50 {
                ChurnRisk::High
            } else {
                ChurnRisk::Medium
            };
            result.churn_probability =
                (result.churn_probability + probability_bump).min(probability_cap);
        }
    }

    result.retention_actions = adjustment
        .actions
        .iter()
        .map(|action| action.to_string())
        .collect();
    result.priority = adjustment.priority;
    result.reasoning = format!("{} {}", adjustment.note, result.reasoning);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn sample_lead() -> LeadRecord {
        LeadRecord {
            id: Uuid::new_v4(),
            full_name: "Jordan Reyes".to_string(),
            email: "jordan.reyes@example.com".to_string(),
            phone: "+15550100".to_string(),
            insurance_type: "auto".to_string(),
            current_provider: Some("Geico".to_string()),
        }
    }

    fn touchpoint(
        days_ago: i64,
        sentiment: Option<&str>,
        intent: Option<&str>,
    ) -> TouchpointRecord {
        TouchpointRecord {
            channel: "sms".to_string(),
            direction: Some("inbound".to_string()),
            content: "touchpoint".to_string(),
            sentiment: sentiment.map(String::from),
            intent: intent.map(String::from),
            occurred_at: Utc::now() - Duration::days(days_ago),
        }
    }

    fn life_event(outcome: Option<&str>) -> LifeEventRecord {
        LifeEventRecord {
            event_type: "new_baby".to_string(),
            description: None,
            outcome: outcome.map(String::from),
            occurred_at: Utc::now() - Duration::days(2),
        }
    }

    #[test]
    fn empty_history_uses_defaults() {
        let lead = sample_lead();
        let result = compute_health_score(&lead, &[], &[]);

        assert_eq!(result.engagement_score, 50);
        assert_eq!(result.satisfaction_score, 75);
        assert_eq!(result.usage_score, 75);
        assert_eq!(result.payment_score, 90);
        assert_eq!(result.health_score, 73);
        assert_eq!(result.churn_risk, ChurnRisk::Medium);
        assert_eq!(result.churn_probability, 35);
        assert_eq!(result.days_to_predicted_churn, 90);
        assert_eq!(result.priority, Priority::Medium);
        assert_eq!(result.retention_actions.len(), 3);
    }

    #[test]
    fn scoring_is_idempotent() {
        let lead = sample_lead();
        let touchpoints = vec![
            touchpoint(3, Some("positive"), Some("interested")),
            touchpoint(1, Some("negative"), Some("objecting")),
        ];
        let events = vec![life_event(None)];

        let first = compute_health_score(&lead, &touchpoints, &events);
        let second = compute_health_score(&lead, &touchpoints, &events);
        assert_eq!(first.health_score, second.health_score);
        assert_eq!(first.retention_actions, second.retention_actions);
        assert_eq!(first.reasoning, second.reasoning);
    }

    #[test]
    fn positive_window_lifts_satisfaction() {
        let lead = sample_lead();
        let touchpoints: Vec<_> = (0..5)
            .map(|day| touchpoint(day, Some("positive"), None))
            .collect();

        let result = compute_health_score(&lead, &touchpoints, &[]);
        assert_eq!(result.satisfaction_score, 100);
        assert_eq!(result.engagement_score, 100);
        assert_eq!(result.usage_score, 75);
        // 0.25*100 + 0.30*100 + 0.20*75 + 0.25*90 = 92.5
        assert_eq!(result.health_score, 93);
        assert_eq!(result.churn_risk, ChurnRisk::Low);
        assert_eq!(result.churn_probability, 15);
    }

    #[test]
    fn negative_window_drags_satisfaction() {
        let lead = sample_lead();
        let touchpoints: Vec<_> = (0..4)
            .map(|day| touchpoint(day, Some("negative"), None))
            .collect();

        let result = compute_health_score(&lead, &touchpoints, &[]);
        assert_eq!(result.satisfaction_score, 50);
    }

    #[test]
    fn neutral_labels_dilute_the_lean() {
        let lead = sample_lead();
        let touchpoints = vec![
            touchpoint(4, Some("positive"), None),
            touchpoint(3, Some("neutral"), None),
            touchpoint(2, Some("neutral"), None),
            touchpoint(1, Some("neutral"), None),
        ];

        let result = compute_health_score(&lead, &touchpoints, &[]);
        // 75 + 25 * (1 - 0) / 4 = 81.25 -> 81
        assert_eq!(result.satisfaction_score, 81);
    }

    #[test]
    fn only_last_five_touchpoints_feed_the_window() {
        let lead = sample_lead();
        let mut touchpoints: Vec<_> = (0..5)
            .map(|day| touchpoint(10 + day, Some("negative"), None))
            .collect();
        touchpoints.extend((0..5).map(|day| touchpoint(day, Some("positive"), None)));

        let result = compute_health_score(&lead, &touchpoints, &[]);
        assert_eq!(result.satisfaction_score, 100);
        // Engagement still counts the full history.
        assert_eq!(result.engagement_score, 100);
    }

    #[test]
    fn unknown_intent_labels_are_neutral() {
        let lead = sample_lead();
        let touchpoints = vec![
            touchpoint(2, None, Some("window_shopping")),
            touchpoint(1, None, Some("ready")),
        ];

        let result = compute_health_score(&lead, &touchpoints, &[]);
        // 75 + 25 * (1 - 0) / 2 = 87.5 -> 88
        assert_eq!(result.usage_score, 88);
    }

    #[test]
    fn unaddressed_events_cost_ten_points_each() {
        let lead = sample_lead();
        let events = vec![
            life_event(None),
            life_event(Some("pending")),
            life_event(Some("converted")),
        ];

        let result = compute_health_score(&lead, &[], &events);
        assert_eq!(result.health_score, 73 - 20);
    }

    #[test]
    fn health_score_floors_at_zero() {
        let lead = sample_lead();
        let events: Vec<_> = (0..10).map(|_| life_event(None)).collect();

        let result = compute_health_score(&lead, &[], &events);
        assert_eq!(result.health_score, 0);
        assert_eq!(result.churn_risk, ChurnRisk::High);
    }

    #[test]
    fn tier_thresholds_sit_at_eighty_and_fifty() {
        assert_eq!(churn_tier(80), (ChurnRisk::Low, 15));
        assert_eq!(churn_tier(79), (ChurnRisk::Medium, 35));
        assert_eq!(churn_tier(50), (ChurnRisk::Medium, 35));
        assert_eq!(churn_tier(49), (ChurnRisk::High, 65));
        assert_eq!(churn_tier(0), (ChurnRisk::High, 65));
        assert_eq!(churn_tier(100), (ChurnRisk::Low, 15));
    }

    #[test]
    fn priority_thresholds_sit_at_seventy_and_eighty_five() {
        assert_eq!(action_priority(69), Priority::High);
        assert_eq!(action_priority(70), Priority::Medium);
        assert_eq!(action_priority(84), Priority::Medium);
        assert_eq!(action_priority(85), Priority::Low);
    }

    #[test]
    fn scores_stay_in_range_across_histories() {
        let lead = sample_lead();
        for touchpoint_count in 0..12 {
            for event_count in 0..6 {
                let touchpoints: Vec<_> = (0..touchpoint_count)
                    .map(|day| touchpoint(day, Some("negative"), Some("lost")))
                    .collect();
                let events: Vec<_> = (0..event_count)
                    .map(|_| life_event(None))
                    .collect();

                let result = compute_health_score(&lead, &touchpoints, &events);
                assert!((0..=100).contains(&result.health_score));
                assert!((0..=100).contains(&result.engagement_score));
                assert!((0..=100).contains(&result.satisfaction_score));
                assert!((0..=100).contains(&result.usage_score));
                assert!((0..=100).contains(&result.churn_probability));
                assert_eq!(result.retention_actions.len(), 3);
            }
        }
    }

    #[test]
    fn conversion_boost_caps_at_ninety_five() {
        let lead = sample_lead();
        for base in [0, 40, 73, 80, 94, 95] {
            let mut result = compute_health_score(&lead, &[], &[]);
            result.health_score = base;
            apply_reply_adjustment(
                &mut result,
                ResponseDomain::LifeEvent,
                ReplyOutcome::Converted,
            );
            assert_eq!(result.health_score, (base + 20).min(95));
            assert_eq!(result.churn_risk, ChurnRisk::Low);
            assert_eq!(result.churn_probability, 5);
            assert_eq!(result.retention_actions.len(), 3);
            assert_eq!(result.priority, Priority::Low);
        }
    }

    #[test]
    fn decline_floors_at_forty_and_retier() {
        let lead = sample_lead();
        let mut result = compute_health_score(&lead, &[], &[]);
        assert_eq!(result.health_score, 73);

        apply_reply_adjustment(
            &mut result,
            ResponseDomain::LifeEvent,
            ReplyOutcome::Declined,
        );
        assert_eq!(result.health_score, 58);
        assert_eq!(result.churn_risk, ChurnRisk::Medium);
        assert_eq!(result.churn_probability, 55);
        assert_eq!(result.retention_actions.len(), 5);
        assert_eq!(result.priority, Priority::High);
    }

    #[test]
    fn decline_below_fifty_goes_high_risk() {
        let lead = sample_lead();
        let mut result = compute_health_score(&lead, &[], &[]);
        result.health_score = 55;
        result.churn_probability = 65;

        apply_reply_adjustment(
            &mut result,
            ResponseDomain::LifeEvent,
            ReplyOutcome::Declined,
        );
        assert_eq!(result.health_score, 40);
        assert_eq!(result.churn_risk, ChurnRisk::High);
        assert_eq!(result.churn_probability, 70);
    }

    #[test]
    fn pending_reply_nudges_down_with_nurture_plan() {
        let lead = sample_lead();
        let mut result = compute_health_score(&lead, &[], &[]);
        let risk_before = result.churn_risk;
        let probability_before = result.churn_probability;

        apply_reply_adjustment(
            &mut result,
            ResponseDomain::LifeEvent,
            ReplyOutcome::Pending,
        );
        assert_eq!(result.health_score, 68);
        assert_eq!(result.churn_risk, risk_before);
        assert_eq!(result.churn_probability, probability_before);
        assert_eq!(result.retention_actions.len(), 4);
        assert_eq!(result.priority, Priority::Medium);
    }

    #[test]
    fn pending_reply_floors_at_fifty() {
        let lead = sample_lead();
        let mut result = compute_health_score(&lead, &[], &[]);
        result.health_score = 51;

        apply_reply_adjustment(
            &mut result,
            ResponseDomain::LifeEvent,
            ReplyOutcome::Pending,
        );
        assert_eq!(result.health_score, 50);
    }

    #[test]
    fn occasion_acceptance_is_a_smaller_boost() {
        let lead = sample_lead();
        let mut result = compute_health_score(&lead, &[], &[]);

        apply_reply_adjustment(&mut result, ResponseDomain::Occasion, ReplyOutcome::Accepted);
        assert_eq!(result.health_score, 83);
        assert_eq!(result.churn_risk, ChurnRisk::Low);
        assert_eq!(result.churn_probability, 10);
        assert_eq!(result.retention_actions.len(), 3);

        let mut near_cap = compute_health_score(&lead, &[], &[]);
        near_cap.health_score = 92;
        apply_reply_adjustment(&mut near_cap, ResponseDomain::Occasion, ReplyOutcome::Accepted);
        assert_eq!(near_cap.health_score, 95);
    }

    #[test]
    fn occasion_decline_keeps_risk_tier() {
        let lead = sample_lead();
        let mut result = compute_health_score(&lead, &[], &[]);
        let risk_before = result.churn_risk;

        apply_reply_adjustment(&mut result, ResponseDomain::Occasion, ReplyOutcome::Declined);
        assert_eq!(result.health_score, 68);
        assert_eq!(result.churn_risk, risk_before);
        assert_eq!(result.retention_actions.len(), 3);
        assert_eq!(result.priority, Priority::Medium);
    }

    #[test]
    fn unmapped_outcome_leaves_result_untouched() {
        let lead = sample_lead();
        let mut result = compute_health_score(&lead, &[], &[]);
        let before = result.clone();

        apply_reply_adjustment(&mut result, ResponseDomain::Occasion, ReplyOutcome::Pending);
        assert_eq!(result.health_score, before.health_score);
        assert_eq!(result.retention_actions, before.retention_actions);
        assert_eq!(result.priority, before.priority);
    }
}
