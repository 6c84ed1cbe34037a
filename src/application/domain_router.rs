//! Domain router: keeps the conversation assigned to one coaching domain.
//!
//! A keyword gate avoids classifier calls while the conversation stays on
//! topic; when a shift is plausible, a background-tier classifier call
//! decides, subject to hysteresis. Failures degrade to the general domain
//! at zero confidence.

use std::sync::Arc;

use serde::Deserialize;

use crate::config::AppConfig;
use crate::domain::coaching::{ChatRole, CoachingDomain};
use crate::domain::foundation::Confidence;
use crate::domain::routing::{background_model, BackgroundTask, DomainResult};
use crate::ports::{AIProvider, CompletionRequest};

use super::timed_complete;

/// How many preceding user turns feed the classifier prompt.
const CONTEXT_TURNS: usize = 3;

/// Confidence attached when the keyword gate keeps the current domain
/// without a classifier call.
const GATE_STAY_CONFIDENCE: f32 = 0.9;

const SYSTEM_PROMPT: &str = "You classify coaching conversation topics. \
Given the user's latest message and up to three preceding turns, pick the \
single best-fitting domain from: career, relationships, health, finances, \
personal_growth, family, purpose, general. Respond with exactly one JSON \
object and nothing else:\n\
{\"domain\": string, \"confidence\": number between 0 and 1}";

#[derive(Debug, Deserialize)]
struct DomainVerdict {
    domain: String,
    #[serde(default)]
    confidence: Option<serde_json::Value>,
}

/// Per-message routing input: where the conversation currently sits.
#[derive(Debug, Clone, Default)]
pub struct RoutingContext {
    /// The conversation's current domain, if one has been assigned.
    pub current_domain: Option<CoachingDomain>,
    /// The user's preceding turns, newest first.
    pub recent_turns: Vec<String>,
}

/// Routes each message to a coaching domain.
pub struct DomainRouter {
    provider: Arc<dyn AIProvider>,
    config: Arc<AppConfig>,
}

impl DomainRouter {
    pub fn new(provider: Arc<dyn AIProvider>, config: Arc<AppConfig>) -> Self {
        Self { provider, config }
    }

    /// Routes one message.
    ///
    /// Never fails: classifier errors and malformed verdicts degrade to
    /// the general domain at zero confidence.
    pub async fn route(&self, message: &str, ctx: &RoutingContext) -> DomainResult {
        let current = ctx.current_domain.filter(|d| *d != CoachingDomain::General);

        // Keyword gate: only consulted once a real domain is assigned.
        if let Some(current) = current {
            let lower = message.to_lowercase();

            if current.mentioned_in(&lower) {
                let confidence =
                    Confidence::new(GATE_STAY_CONFIDENCE).unwrap_or_else(|_| Confidence::zero());
                return DomainResult::new(current, confidence);
            }

            let other_domain_mentioned = CoachingDomain::ALL
                .iter()
                .filter(|d| **d != current && **d != CoachingDomain::General)
                .any(|d| d.mentioned_in(&lower));

            if !other_domain_mentioned {
                // No shift evidence; stay without spending a call.
                let confidence =
                    Confidence::new(GATE_STAY_CONFIDENCE).unwrap_or_else(|_| Confidence::zero());
                return DomainResult::new(current, confidence);
            }
        }

        let classified = self.classify(message, &ctx.recent_turns).await;
        self.apply_hysteresis(current, classified)
    }

    /// Applies the stay/switch thresholds against the current domain.
    fn apply_hysteresis(
        &self,
        current: Option<CoachingDomain>,
        classified: DomainResult,
    ) -> DomainResult {
        let Some(current) = current else {
            // No sticky domain yet; the classification stands as-is.
            return classified;
        };

        let thresholds = &self.config.thresholds;

        if classified.domain == current {
            if classified.confidence.at_least(thresholds.domain_stay_confidence) {
                classified
            } else {
                // Same domain but weak signal; stay, but invite grounding.
                classified.with_clarify(true)
            }
        } else if classified.confidence.at_least(thresholds.domain_switch_confidence) {
            classified
        } else {
            // Not confident enough to switch; the previous domain wins.
            DomainResult::new(current, classified.confidence)
        }
    }

    async fn classify(&self, message: &str, recent_turns: &[String]) -> DomainResult {
        let model = background_model(&self.config.tiers, BackgroundTask::DomainClassification);

        let mut request = CompletionRequest::new()
            .with_system_prompt(SYSTEM_PROMPT)
            .with_model(model.model_id)
            .with_max_tokens(model.max_output_tokens)
            .with_temperature(model.temperature);

        for turn in recent_turns.iter().take(CONTEXT_TURNS).rev() {
            request = request.with_message(ChatRole::User, turn.as_str());
        }
        request = request.with_message(ChatRole::User, message);

        let content = match timed_complete(&self.provider, &self.config.ai, "domain", request).await
        {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!(error = %err, "domain classifier call failed, falling back to general");
                return DomainResult::general_fallback();
            }
        };

        let verdict: DomainVerdict = match serde_json::from_str(content.trim()) {
            Ok(verdict) => verdict,
            Err(err) => {
                tracing::warn!(error = %err, "malformed domain verdict, falling back to general");
                return DomainResult::general_fallback();
            }
        };

        let Some(domain) = CoachingDomain::parse_classifier(&verdict.domain) else {
            tracing::warn!(domain = %verdict.domain, "unknown domain label, falling back to general");
            return DomainResult::general_fallback();
        };

        match verdict.confidence.as_ref().and_then(|v| v.as_f64()) {
            Some(value) => {
                // Out-of-range numeric confidence is coerced to the
                // midpoint; the domain label is kept.
                let confidence =
                    Confidence::new(value as f32).unwrap_or_else(|_| Confidence::midpoint());
                DomainResult::new(domain, confidence)
            }
            // Missing or non-numeric confidence: fall back to general and
            // ask the user to clarify.
            None => DomainResult::general_fallback().with_clarify(true),
        }
    }
}
