use std::fmt::Write;

use crate::models::{HealthScoreResult, LeadRecord, LifeEventRecord, TouchpointRecord};

pub struct ChannelSummary {
    pub channel: String,
    pub count: usize,
    pub inbound: usize,
}

pub fn summarize_by_channel(touchpoints: &[TouchpointRecord]) -> Vec<ChannelSummary> {
    let mut map: std::collections::HashMap<String, (usize, usize)> =
        std::collections::HashMap::new();

    for touchpoint in touchpoints {
        let entry = map.entry(touchpoint.channel.clone()).or_insert((0, 0));
        entry.0 += 1;
        if touchpoint.direction.as_deref() == Some("inbound") {
            entry.1 += 1;
        }
    }

    let mut summaries: Vec<ChannelSummary> = map
        .into_iter()
        .map(|(channel, (count, inbound))| ChannelSummary {
            channel,
            count,
            inbound,
        })
        .collect();

    summaries.sort_by(|a, b| b.count.cmp(&a.count).then(a.channel.cmp(&b.channel)));
    summaries
}

pub fn build_report(
    lead: &LeadRecord,
    health: &HealthScoreResult,
    touchpoints: &[TouchpointRecord],
    life_events: &[LifeEventRecord],
) -> String {
    let summaries = summarize_by_channel(touchpoints);

    let mut output = String::new();

    let _ = writeln!(output, "# Policy Health Report");
    let _ = writeln!(
        output,
        "Generated for {} ({}, {} policy)",
        lead.full_name, lead.email, lead.insurance_type
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Policy Health");
    let _ = writeln!(
        output,
        "- Health score {} / 100 ({} churn risk, {}% probability)",
        health.health_score,
        health.churn_risk.as_str(),
        health.churn_probability
    );
    let _ = writeln!(
        output,
        "- Sub-scores: engagement {}, satisfaction {}, usage {}, payment {}",
        health.engagement_score,
        health.satisfaction_score,
        health.usage_score,
        health.payment_score
    );
    let _ = writeln!(
        output,
        "- Priority {}; predicted churn horizon {} days",
        health.priority.as_str(),
        health.days_to_predicted_churn
    );
    let _ = writeln!(output, "- {}", health.reasoning);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Retention Actions");
    for action in &health.retention_actions {
        let _ = writeln!(output, "- {action}");
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Channel Mix");
    if summaries.is_empty() {
        let _ = writeln!(output, "No touchpoints recorded for this lead.");
    } else {
        for summary in summaries.iter() {
            let _ = writeln!(
                output,
                "- {}: {} touchpoints ({} inbound)",
                summary.channel, summary.count, summary.inbound
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Open Life Events");
    let open_events: Vec<_> = life_events
        .iter()
        .filter(|event| event.is_unaddressed())
        .collect();
    if open_events.is_empty() {
        let _ = writeln!(output, "No unaddressed life events.");
    } else {
        for event in open_events {
            let _ = writeln!(
                output,
                "- {} on {}: {}",
                event.event_type,
                event.occurred_at.date_naive(),
                event.description.as_deref().unwrap_or("(no description)")
            );
        }
    }

    let mut recent: Vec<&TouchpointRecord> = touchpoints.iter().collect();
    recent.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Touchpoint Notes");
    if recent.is_empty() {
        let _ = writeln!(output, "No touchpoints recorded for this lead.");
    } else {
        for touchpoint in recent.iter().take(5) {
            let _ = writeln!(
                output,
                "- {} ({}) on {}: {}",
                touchpoint.channel,
                touchpoint.intent.as_deref().unwrap_or("no intent"),
                touchpoint.occurred_at.date_naive(),
                touchpoint.content
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn sample_lead() -> LeadRecord {
        LeadRecord {
            id: Uuid::new_v4(),
            full_name: "Jordan Reyes".to_string(),
            email: "jordan.reyes@example.com".to_string(),
            phone: "+15550100".to_string(),
            insurance_type: "auto".to_string(),
            current_provider: None,
        }
    }

    fn touchpoint(days_ago: i64, channel: &str, inbound: bool) -> TouchpointRecord {
        TouchpointRecord {
            channel: channel.to_string(),
            direction: Some(if inbound { "inbound" } else { "outbound" }.to_string()),
            content: "note".to_string(),
            sentiment: None,
            intent: None,
            occurred_at: Utc::now() - Duration::days(days_ago),
        }
    }

    #[test]
    fn channel_mix_counts_and_sorts() {
        let touchpoints = vec![
            touchpoint(1, "sms", true),
            touchpoint(2, "sms", false),
            touchpoint(3, "call", true),
        ];

        let summaries = summarize_by_channel(&touchpoints);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].channel, "sms");
        assert_eq!(summaries[0].count, 2);
        assert_eq!(summaries[0].inbound, 1);
        assert_eq!(summaries[1].channel, "call");
    }

    #[test]
    fn report_covers_all_sections() {
        let lead = sample_lead();
        let touchpoints = vec![touchpoint(1, "sms", true)];
        let health = health::compute_health_score(&lead, &touchpoints, &[]);

        let report = build_report(&lead, &health, &touchpoints, &[]);
        assert!(report.contains("# Policy Health Report"));
        assert!(report.contains("## Policy Health"));
        assert!(report.contains("## Retention Actions"));
        assert!(report.contains("## Channel Mix"));
        assert!(report.contains("## Open Life Events"));
        assert!(report.contains("## Recent Touchpoint Notes"));
        assert!(report.contains("Jordan Reyes"));
    }

    #[test]
    fn empty_history_report_degrades_gracefully() {
        let lead = sample_lead();
        let health = health::compute_health_score(&lead, &[], &[]);

        let report = build_report(&lead, &health, &[], &[]);
        assert!(report.contains("No touchpoints recorded for this lead."));
        assert!(report.contains("No unaddressed life events."));
        assert!(report.contains("Health score 73 / 100"));
    }
}
