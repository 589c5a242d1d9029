use crate::models::{
    ChurnRisk, HealthScoreResult, LeadRecord, Opportunity, OpportunityType, OutreachAction,
    Priority,
};

/// Maps a life event to the product conversation worth opening. Unknown
/// event types fall back to a plain retention check-in.
pub fn analyze_life_event(event_type: &str, lead: &LeadRecord) -> Opportunity {
    let first_name = lead.first_name();

    match event_type {
        "new_baby" => Opportunity {
            opportunity_type: OpportunityType::Upsell,
            recommended_product: "umbrella_insurance",
            estimated_value_monthly: 25,
            message: format!(
                "Congrats on the new baby, {first_name}! As your family grows, have you thought \
                 about umbrella insurance? It adds an extra layer of liability protection beyond \
                 your regular policies. Would love to send you a quick quote - just let me know!"
            ),
        },
        "home_reno" => Opportunity {
            opportunity_type: OpportunityType::Upsell,
            recommended_product: "flood_coverage",
            estimated_value_monthly: 35,
            message: format!(
                "Congrats on the home project, {first_name}! Have you thought about adding flood \
                 coverage? It's not included in standard policies but can be a lifesaver. Want me \
                 to send over a quote?"
            ),
        },
        "teen_driver" => Opportunity {
            opportunity_type: OpportunityType::Upsell,
            recommended_product: "auto_upgrade",
            estimated_value_monthly: 75,
            message: format!(
                "Hey {first_name}, congrats on the teen driver! That's a big milestone. We have \
                 great coverage options for young drivers, including accident forgiveness. Want \
                 to review your policy to make sure you're covered?"
            ),
        },
        "job_change" => Opportunity {
            opportunity_type: OpportunityType::Retention,
            recommended_product: "policy_review",
            estimated_value_monthly: 0,
            message: format!(
                "Congrats on the new job, {first_name}! Life changes can affect your insurance \
                 needs. Want to do a quick policy review to make sure everything still fits?"
            ),
        },
        _ => Opportunity {
            opportunity_type: OpportunityType::Retention,
            recommended_product: "policy_review",
            estimated_value_monthly: 0,
            message: format!(
                "Hi {first_name}, I wanted to check in and see how things are going. Let me know \
                 if there's anything I can help with!"
            ),
        },
    }
}

/// SMS first for immediate engagement; priority tracks the current churn risk.
pub fn generate_retention_action(
    event_type: &str,
    lead: &LeadRecord,
    policy_health: &HealthScoreResult,
) -> OutreachAction {
    let opportunity = analyze_life_event(event_type, lead);

    OutreachAction {
        action_type: "sms",
        opportunity_type: opportunity.opportunity_type,
        content: opportunity.message,
        recommended_product: opportunity.recommended_product,
        estimated_value_monthly: opportunity.estimated_value_monthly,
        priority: if policy_health.churn_risk == ChurnRisk::High {
            Priority::High
        } else {
            Priority::Medium
        },
        timing: "immediate",
    }
}
