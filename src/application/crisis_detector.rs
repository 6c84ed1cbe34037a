//! Two-tier crisis detector.
//!
//! Tier 1 scans fixed phrase lists and short-circuits without any
//! classifier call. Tier 2 runs the safety classifier only when the
//! message (or the immediately preceding user turns) contains an
//! ambiguity phrase. Every failure path returns the safe default rather
//! than an error: a missed escalation is recoverable downstream, a
//! blocked coaching flow is not.

use std::sync::Arc;

use serde::Deserialize;

use crate::config::AppConfig;
use crate::domain::coaching::{
    contains_ambiguity_phrase, scan_tier_one, ChatRole, CrisisCategory, CrisisDetectionResult,
};
use crate::domain::foundation::Confidence;
use crate::domain::routing::safety_model;
use crate::ports::{AIProvider, CompletionRequest};

use super::timed_complete;

/// How many preceding user turns feed the ambiguity check and the tier-2
/// context window.
const CONTEXT_TURNS: usize = 2;

const SYSTEM_PROMPT: &str = "You are a safety classifier for a coaching chat product. \
Assess whether the user's latest message indicates an active mental-health \
crisis. Consider the preceding turns only as context. Respond with exactly \
one JSON object and nothing else:\n\
{\"crisis_detected\": bool, \"confidence\": number between 0 and 1, \
\"category\": one of \"self_harm\" | \"suicidal_ideation\" | \"abuse\" | \
\"severe_distress\" | \"none\", \"indicators\": array of short strings \
quoting the concerning language}";

/// The classifier's verdict, parsed strictly: a non-numeric confidence or
/// a missing field fails deserialization outright.
#[derive(Debug, Deserialize)]
struct Tier2Verdict {
    confidence: f32,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    indicators: Vec<String>,
}

/// Detects crisis signals in inbound messages.
pub struct CrisisDetector {
    provider: Arc<dyn AIProvider>,
    config: Arc<AppConfig>,
}

impl CrisisDetector {
    pub fn new(provider: Arc<dyn AIProvider>, config: Arc<AppConfig>) -> Self {
        Self { provider, config }
    }

    /// Classifies one message. `recent_user_messages` are the user's
    /// preceding turns, newest first.
    ///
    /// Never fails: classifier errors, timeouts and malformed verdicts all
    /// degrade to [`CrisisDetectionResult::none`].
    pub async fn detect(
        &self,
        message: &str,
        recent_user_messages: &[String],
    ) -> CrisisDetectionResult {
        // Tier 1: fixed phrases, no classifier call.
        if let Some((category, phrase)) = scan_tier_one(message) {
            tracing::info!(category = %category, "crisis keyword match");
            return CrisisDetectionResult::keyword_match(category, phrase);
        }

        let context: Vec<&String> = recent_user_messages.iter().take(CONTEXT_TURNS).collect();
        let ambiguous = contains_ambiguity_phrase(message)
            || context.iter().any(|m| contains_ambiguity_phrase(m));
        if !ambiguous {
            return CrisisDetectionResult::none();
        }

        // Tier 2: safety classifier on the ambiguous message.
        match self.classify(message, &context).await {
            Some(result) => result,
            None => CrisisDetectionResult::none(),
        }
    }

    async fn classify(&self, message: &str, context: &[&String]) -> Option<CrisisDetectionResult> {
        let safety = safety_model(&self.config.tiers);

        let mut request = CompletionRequest::new()
            .with_system_prompt(SYSTEM_PROMPT)
            .with_model(safety.model_id)
            .with_max_tokens(safety.max_output_tokens)
            .with_temperature(safety.temperature);

        // Oldest context first, current message last.
        for turn in context.iter().rev() {
            request = request.with_message(ChatRole::User, turn.as_str());
        }
        request = request.with_message(ChatRole::User, message);

        let content = match timed_complete(&self.provider, &self.config.ai, "crisis", request).await
        {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!(error = %err, "crisis classifier call failed, defaulting to no crisis");
                return None;
            }
        };

        let verdict: Tier2Verdict = match serde_json::from_str(content.trim()) {
            Ok(verdict) => verdict,
            Err(err) => {
                tracing::warn!(error = %err, "malformed crisis verdict, defaulting to no crisis");
                return None;
            }
        };

        let confidence = match Confidence::new(verdict.confidence) {
            Ok(confidence) => confidence,
            Err(_) => {
                tracing::warn!(
                    confidence = verdict.confidence,
                    "crisis verdict confidence out of range, defaulting to no crisis"
                );
                return None;
            }
        };

        let crisis_detected = confidence.at_least(self.config.thresholds.crisis_confidence);

        let category = match verdict.category.as_deref().map(CrisisCategory::parse_classifier) {
            Some(Some(category)) => category,
            // Unknown or missing category: the detection verdict stands,
            // classified as severe distress when detected.
            _ if crisis_detected => CrisisCategory::SevereDistress,
            _ => CrisisCategory::None,
        };

        let category = if crisis_detected {
            category
        } else {
            CrisisCategory::None
        };

        if crisis_detected {
            tracing::info!(category = %category, confidence = confidence.value(), "crisis detected by classifier");
        }

        Some(CrisisDetectionResult {
            crisis_detected,
            confidence,
            indicators: verdict.indicators,
            category,
        })
    }
}
