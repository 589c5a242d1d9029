use crate::models::{ReplyAnalysis, ReplyIntent, ReplyOutcome, ResponseDomain};

const POSITIVE_PATTERNS: [&str; 22] = [
    "yes",
    "yeah",
    "yep",
    "sure",
    "ok",
    "okay",
    "great",
    "perfect",
    "awesome",
    "sounds good",
    "interested",
    "lets do it",
    "do it",
    "go ahead",
    "sign me up",
    "im in",
    "count me in",
    "absolutely",
    "definitely",
    "for sure",
    "love to",
    "would love",
];

const NEGATIVE_PATTERNS: [&str; 10] = [
    "no",
    "nope",
    "not interested",
    "no thanks",
    "maybe later",
    "not now",
    "not right now",
    "pass",
    "decline",
    "not for me",
];

const INFO_PATTERNS: [&str; 12] = [
    "tell me more",
    "more info",
    "details",
    "how much",
    "what",
    "explain",
    "cost",
    "price",
    "coverage",
    "learn more",
    "info",
    "question",
];

const OCCASION_POSITIVE: [&str; 5] = ["yes", "thanks", "great", "awesome", "appreciate"];
const OCCASION_NEGATIVE: [&str; 2] = ["no", "not interested"];

/// Lowercase, strip punctuation, collapse whitespace. "Yes, let's do it!"
/// becomes "yes lets do it".
fn normalize(text: &str) -> String {
    let mut normalized = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch.is_alphanumeric() {
            for lower in ch.to_lowercase() {
                normalized.push(lower);
            }
        } else if ch.is_whitespace() && !normalized.ends_with(' ') {
            normalized.push(' ');
        }
    }
    normalized.trim().to_string()
}

/// Whole-word containment: the pattern must start and end on word boundaries,
/// so "ok" does not fire inside "brokerage".
fn contains_any(normalized: &str, patterns: &[&str]) -> bool {
    let padded = format!(" {normalized} ");
    patterns
        .iter()
        .any(|pattern| padded.contains(&format!(" {pattern} ")))
}

/// Classifies a customer's free-text reply to retention outreach. Precedence
/// is positive, then negative, then information-seeking; anything else is an
/// unclear pending reply. Total over arbitrary input.
pub fn classify_reply(domain: ResponseDomain, text: &str) -> ReplyAnalysis {
    match domain {
        ResponseDomain::LifeEvent => classify_life_event_reply(text),
        ResponseDomain::Occasion => classify_occasion_reply(text),
    }
}

fn classify_life_event_reply(text: &str) -> ReplyAnalysis {
    let normalized = normalize(text);

    if contains_any(&normalized, &POSITIVE_PATTERNS) {
        return ReplyAnalysis {
            intent: ReplyIntent::Positive,
            confidence: 0.95,
            outcome: ReplyOutcome::Converted,
            next_action: "confirm_and_process",
        };
    }

    if contains_any(&normalized, &NEGATIVE_PATTERNS) {
        return ReplyAnalysis {
            intent: ReplyIntent::Negative,
            confidence: 0.90,
            outcome: ReplyOutcome::Declined,
            next_action: "acknowledge_and_follow_up",
        };
    }

    if contains_any(&normalized, &INFO_PATTERNS) {
        return ReplyAnalysis {
            intent: ReplyIntent::Curious,
            confidence: 0.85,
            outcome: ReplyOutcome::Pending,
            next_action: "provide_details",
        };
    }

    ReplyAnalysis {
        intent: ReplyIntent::Unclear,
        confidence: 0.50,
        outcome: ReplyOutcome::Pending,
        next_action: "clarify",
    }
}

fn classify_occasion_reply(text: &str) -> ReplyAnalysis {
    let normalized = normalize(text);

    if contains_any(&normalized, &OCCASION_POSITIVE) {
        return ReplyAnalysis {
            intent: ReplyIntent::Positive,
            confidence: 0.90,
            outcome: ReplyOutcome::Accepted,
            next_action: "send_thanks",
        };
    }

    if contains_any(&normalized, &OCCASION_NEGATIVE) {
        return ReplyAnalysis {
            intent: ReplyIntent::Negative,
            confidence: 0.85,
            outcome: ReplyOutcome::Declined,
            next_action: "acknowledge",
        };
    }

    ReplyAnalysis {
        intent: ReplyIntent::Unclear,
        confidence: 0.50,
        outcome: ReplyOutcome::Pending,
        next_action: "clarify",
    }
}
