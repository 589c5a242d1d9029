use crate::models::{IntentShiftResult, ShiftType, Significance, TouchpointRecord};

/// Ordinal funnel position per intent label. Lower is earlier in the funnel;
/// `interested_but_objecting` sits between interested and ready.
pub fn intent_level(intent: &str) -> f64 {
    match intent {
        "lost" => 0.0,
        "browsing" => 1.0,
        "interested" => 2.0,
        "objecting" => 2.0,
        "interested_but_objecting" => 2.5,
        "ready" => 3.0,
        _ => 1.0,
    }
}

/// A jump of two or more tiers is worth waking someone up for.
const MAJOR_SHIFT_DELTA: f64 = 2.0;

pub fn detect_from_history(
    touchpoints: &[TouchpointRecord],
    current_intent: &str,
) -> IntentShiftResult {
    let intents: Vec<Option<&str>> = touchpoints
        .iter()
        .map(|touchpoint| touchpoint.intent.as_deref())
        .collect();
    detect_intent_shift(&intents, current_intent)
}

/// Classifies how a lead's intent moved relative to the most recent prior
/// touchpoint that carried an intent label. Pure snapshot over the ordered
/// history (oldest first); nothing is persisted.
pub fn detect_intent_shift(
    previous_intents: &[Option<&str>],
    current_intent: &str,
) -> IntentShiftResult {
    let previous_intent = previous_intents
        .iter()
        .rev()
        .copied()
        .find_map(|intent| intent.filter(|label| !label.is_empty()));

    let Some(previous_intent) = previous_intent else {
        return IntentShiftResult {
            shift_detected: false,
            previous_intent: None,
            current_intent: current_intent.to_string(),
            shift_type: ShiftType::Initial,
            significance: Significance::Low,
            message: "First touchpoint - establishing baseline intent".to_string(),
            previous_level: None,
            current_level: None,
        };
    };

    if previous_intent == current_intent {
        return IntentShiftResult {
            shift_detected: false,
            previous_intent: Some(previous_intent.to_string()),
            current_intent: current_intent.to_string(),
            shift_type: ShiftType::Stable,
            significance: Significance::Low,
            message: format!("Intent remains stable: {current_intent}"),
            previous_level: None,
            current_level: None,
        };
    }

    let previous_level = intent_level(previous_intent);
    let current_level = intent_level(current_intent);

    let (shift_type, significance, message) = if current_level > previous_level {
        if current_level - previous_level >= MAJOR_SHIFT_DELTA {
            (
                ShiftType::Positive,
                Significance::High,
                format!(
                    "Major positive shift: {previous_intent} -> {current_intent}. Lead is moving toward conversion."
                ),
            )
        } else {
            (
                ShiftType::Positive,
                Significance::Medium,
                format!("Positive shift: {previous_intent} -> {current_intent}. Lead is warming up."),
            )
        }
    } else if current_level < previous_level {
        if previous_level - current_level >= MAJOR_SHIFT_DELTA {
            (
                ShiftType::Negative,
                Significance::High,
                format!(
                    "Major negative shift: {previous_intent} -> {current_intent}. Immediate action needed."
                ),
            )
        } else {
            (
                ShiftType::Negative,
                Significance::Medium,
                format!("Negative shift: {previous_intent} -> {current_intent}. Re-engage soon."),
            )
        }
    } else {
        // Same tier, different label. Low significance by policy: a same-tier
        // relabeling is not alarming on its own.
        (
            ShiftType::Lateral,
            Significance::Low,
            format!("Lateral shift: {previous_intent} -> {current_intent}. Level unchanged."),
        )
    };

    IntentShiftResult {
        shift_detected: true,
        previous_intent: Some(previous_intent.to_string()),
        current_intent: current_intent.to_string(),
        shift_type,
        significance,
        message,
        previous_level: Some(previous_level),
        current_level: Some(current_level),
    }
}
