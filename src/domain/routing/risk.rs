//! Additive risk scoring for model tier escalation.
//!
//! Pure and deterministic given its inputs: no I/O, no clock, no state
//! carried across calls. "Early-conversation depth" only inspects the
//! immediate call's inputs.

use crate::domain::foundation::Confidence;

/// Score at or above which the router escalates.
pub const ESCALATION_THRESHOLD: f32 = 2.0;

/// Crisis confidence above which a smaller weight is added even when the
/// crisis flag itself is not set.
pub const CRISIS_CONFIDENCE_SIGNAL: f32 = 0.55;

/// Characters beyond which a message counts as unusually long.
const LONG_MESSAGE_CHARS: usize = 1200;

/// Minimum length for the early-conversation depth signal.
const EARLY_DEPTH_CHARS: usize = 600;

/// Phrases indicating acute, immediate risk.
static ACUTE_RISK_PHRASES: &[&str] = &[
    "panic attack",
    "can't breathe",
    "emergency",
    "crisis",
    "falling apart",
    "breaking down",
    "losing control",
];

/// Phrases indicating high-stakes life events.
static HIGH_STAKES_PHRASES: &[&str] = &[
    "divorce",
    "quit my job",
    "getting fired",
    "got fired",
    "bankruptcy",
    "custody",
    "relapse",
    "eviction",
    "affair",
];

/// Phrases indicating sustained distress when they recur across turns.
static SUSTAINED_DISTRESS_PHRASES: &[&str] = &[
    "exhausted",
    "burned out",
    "burnt out",
    "can't sleep",
    "overwhelmed",
    "anxious all the time",
    "dreading",
];

/// Explicit requests for blunt, direct coaching.
static BLUNT_REQUEST_PHRASES: &[&str] = &[
    "be honest",
    "be blunt",
    "don't sugarcoat",
    "tell me straight",
    "give it to me straight",
    "brutal honesty",
];

/// Words counted for emotional density in the early-depth signal.
static EMOTIONAL_WORDS: &[&str] = &[
    "feel", "afraid", "scared", "lost", "alone", "ashamed", "guilty",
    "hopeless", "terrified", "crying",
];

/// The computed risk score plus the reasons that contributed to it.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskScore {
    pub score: f32,
    pub reasons: Vec<String>,
}

impl RiskScore {
    /// Whether this score mandates the escalation tier.
    pub fn escalates(&self) -> bool {
        self.score >= ESCALATION_THRESHOLD
    }
}

fn count_hits(text_lower: &str, phrases: &[&str]) -> usize {
    phrases.iter().filter(|p| text_lower.contains(*p)).count()
}

/// Computes the additive risk score for one message.
///
/// `recent_user_messages` holds prior user turns, most recent first.
pub fn assess(
    message: &str,
    recent_user_messages: &[String],
    crisis_detected: bool,
    crisis_confidence: Confidence,
) -> RiskScore {
    let lower = message.to_lowercase();
    let mut score = 0.0f32;
    let mut reasons = Vec::new();

    if crisis_detected {
        score += 2.0;
        reasons.push("crisis detected".to_string());
    }

    if crisis_confidence.at_least(CRISIS_CONFIDENCE_SIGNAL) {
        score += 0.5;
        reasons.push("elevated crisis confidence".to_string());
    }

    let acute_hits = count_hits(&lower, ACUTE_RISK_PHRASES);
    if acute_hits > 0 {
        // Capped so one frantic message cannot dominate every other signal.
        let weight = (acute_hits.min(2) as f32) * 1.0;
        score += weight;
        reasons.push(format!("{} acute-risk phrase(s)", acute_hits));
    }

    let stakes_hits = count_hits(&lower, HIGH_STAKES_PHRASES);
    if stakes_hits >= 2 {
        score += 1.0;
        reasons.push(format!("{} high-stakes phrases", stakes_hits));
    } else if stakes_hits == 1 {
        score += 0.5;
        reasons.push("high-stakes phrase".to_string());
    }

    // Sustained distress counts only when it shows up in the current
    // message and at least one recent turn.
    let sustained_now = count_hits(&lower, SUSTAINED_DISTRESS_PHRASES) > 0;
    let sustained_before = recent_user_messages
        .iter()
        .any(|m| count_hits(&m.to_lowercase(), SUSTAINED_DISTRESS_PHRASES) > 0);
    if sustained_now && sustained_before {
        score += 1.0;
        reasons.push("sustained distress across turns".to_string());
    }

    if message.len() > LONG_MESSAGE_CHARS {
        score += 0.5;
        reasons.push("unusually long message".to_string());
    }

    if count_hits(&lower, BLUNT_REQUEST_PHRASES) > 0 {
        score += 0.5;
        reasons.push("explicit request for direct coaching".to_string());
    }

    // Early-conversation depth: a long, emotionally dense message within
    // the first two turns.
    let emotional_density = count_hits(&lower, EMOTIONAL_WORDS);
    if recent_user_messages.len() < 2 && message.len() > EARLY_DEPTH_CHARS && emotional_density >= 2
    {
        score += 1.0;
        reasons.push("early-conversation depth".to_string());
    }

    RiskScore { score, reasons }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_history() -> Vec<String> {
        vec![]
    }

    #[test]
    fn neutral_message_scores_zero() {
        let score = assess(
            "what should I cook for dinner",
            &no_history(),
            false,
            Confidence::zero(),
        );
        assert_eq!(score.score, 0.0);
        assert!(!score.escalates());
        assert!(score.reasons.is_empty());
    }

    #[test]
    fn crisis_flag_alone_escalates() {
        let score = assess("anything", &no_history(), true, Confidence::new(0.9).unwrap());
        assert!(score.escalates());
    }

    #[test]
    fn crisis_confidence_adds_small_weight_without_flag() {
        let score = assess("anything", &no_history(), false, Confidence::new(0.6).unwrap());
        assert_eq!(score.score, 0.5);
        assert!(!score.escalates());
    }

    #[test]
    fn high_stakes_weights_are_graduated() {
        let one = assess("thinking about divorce", &no_history(), false, Confidence::zero());
        assert_eq!(one.score, 0.5);

        let two = assess(
            "thinking about divorce and bankruptcy at once",
            &no_history(),
            false,
            Confidence::zero(),
        );
        assert_eq!(two.score, 1.0);
    }

    #[test]
    fn sustained_distress_requires_both_turns() {
        let only_now = assess(
            "I'm so overwhelmed",
            &vec!["we talked about my garden".to_string()],
            false,
            Confidence::zero(),
        );
        assert_eq!(only_now.score, 0.0);

        let both = assess(
            "I'm so overwhelmed",
            &vec!["I've been exhausted for weeks".to_string()],
            false,
            Confidence::zero(),
        );
        assert_eq!(both.score, 1.0);
    }

    #[test]
    fn acute_phrases_stack_up_to_escalation() {
        let score = assess(
            "I had a panic attack this morning and I feel like I'm falling apart",
            &no_history(),
            false,
            Confidence::zero(),
        );
        assert_eq!(score.score, 2.0);
        assert!(score.escalates());
    }

    #[test]
    fn early_depth_needs_length_and_emotion() {
        let long_emotional = format!(
            "I feel so lost and afraid about everything. {}",
            "More context about my situation. ".repeat(25)
        );
        let score = assess(&long_emotional, &no_history(), false, Confidence::zero());
        assert!(score.reasons.iter().any(|r| r == "early-conversation depth"));

        // Same message later in a conversation no longer counts.
        let history = vec!["turn one".to_string(), "turn two".to_string()];
        let later = assess(&long_emotional, &history, false, Confidence::zero());
        assert!(!later.reasons.iter().any(|r| r == "early-conversation depth"));
    }

    #[test]
    fn identical_inputs_give_identical_scores() {
        let history = vec!["I'm exhausted".to_string()];
        let a = assess("I'm overwhelmed, be honest with me", &history, false, Confidence::zero());
        let b = assess("I'm overwhelmed, be honest with me", &history, false, Confidence::zero());
        assert_eq!(a, b);
    }
}
