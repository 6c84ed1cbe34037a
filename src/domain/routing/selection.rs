//! Model tier selection.
//!
//! Pure given its inputs: the tier table comes from configuration, the
//! risk score from [`super::risk`], and nothing here performs I/O. Chat
//! selections are computed fresh every message and never cached, because
//! risk is message-specific. Background and safety selections are static
//! lookups.

use serde::{Deserialize, Serialize};

use crate::domain::coaching::CoachingDomain;
use crate::domain::foundation::Confidence;

use super::risk::{self, RiskScore};

/// Which routing path produced a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteTier {
    Primary,
    Escalation,
    Background,
    Safety,
}

/// The kind of session the message arrived in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    /// First-contact session; tighter budgets.
    Discovery,
    /// Ongoing coaching.
    Coaching,
}

/// Background/batch tasks with fixed model configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackgroundTask {
    PatternSynthesis,
    DomainClassification,
    PushNotification,
}

/// Fixed settings for one model tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierSettings {
    pub provider: String,
    pub model_id: String,
    pub max_output_tokens: u32,
    pub temperature: f32,
    pub input_budget_tokens: u32,
}

impl TierSettings {
    pub fn new(
        provider: impl Into<String>,
        model_id: impl Into<String>,
        max_output_tokens: u32,
        temperature: f32,
        input_budget_tokens: u32,
    ) -> Self {
        Self {
            provider: provider.into(),
            model_id: model_id.into(),
            max_output_tokens,
            temperature,
            input_budget_tokens,
        }
    }
}

/// The full tier table the router selects from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelTierSet {
    /// Standard tier for ongoing coaching.
    pub standard: TierSettings,
    /// Tighter-budget tier for first-contact/discovery sessions.
    pub discovery: TierSettings,
    /// Higher-capability tier for crisis or accumulated risk.
    pub escalation: TierSettings,
    /// Batch tasks: pattern synthesis, domain classification, push copy.
    pub background: TierSettings,
    /// The safety classifier itself.
    pub safety: TierSettings,
}

impl Default for ModelTierSet {
    fn default() -> Self {
        Self {
            standard: TierSettings::new("anthropic", "claude-sonnet-4-20250514", 1024, 0.7, 12_000),
            discovery: TierSettings::new("anthropic", "claude-sonnet-4-20250514", 768, 0.7, 6_000),
            escalation: TierSettings::new("anthropic", "claude-opus-4-20250514", 2048, 0.6, 20_000),
            background: TierSettings::new(
                "anthropic",
                "claude-3-5-haiku-20241022",
                1024,
                0.3,
                8_000,
            ),
            safety: TierSettings::new("anthropic", "claude-3-5-haiku-20241022", 256, 0.0, 4_000),
        }
    }
}

/// The outgoing model configuration for one message.
///
/// Computed fresh every message; never cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSelection {
    pub provider: String,
    pub model_id: String,
    pub max_output_tokens: u32,
    pub temperature: f32,
    pub input_budget_tokens: u32,
    pub route_tier: RouteTier,
    pub route_reason: String,
}

impl ModelSelection {
    fn from_tier(settings: &TierSettings, route_tier: RouteTier, reason: impl Into<String>) -> Self {
        Self {
            provider: settings.provider.clone(),
            model_id: settings.model_id.clone(),
            max_output_tokens: settings.max_output_tokens,
            temperature: settings.temperature,
            input_budget_tokens: settings.input_budget_tokens,
            route_tier,
            route_reason: reason.into(),
        }
    }
}

/// The domain router's verdict for one message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainResult {
    pub domain: CoachingDomain,
    pub confidence: Confidence,
    pub should_clarify: bool,
}

impl DomainResult {
    pub fn new(domain: CoachingDomain, confidence: Confidence) -> Self {
        Self {
            domain,
            confidence,
            should_clarify: false,
        }
    }

    /// The degraded fallback: general domain, zero confidence.
    pub fn general_fallback() -> Self {
        Self::new(CoachingDomain::General, Confidence::zero())
    }

    pub fn with_clarify(mut self, should_clarify: bool) -> Self {
        self.should_clarify = should_clarify;
        self
    }
}

/// Selects the chat model tier for one message.
///
/// Crisis detection or an accumulated risk score at the escalation
/// threshold routes to the escalation tier regardless of session mode;
/// otherwise the tier follows the session mode.
pub fn select_chat_model(
    tiers: &ModelTierSet,
    session_mode: SessionMode,
    message: &str,
    recent_user_messages: &[String],
    crisis_detected: bool,
    crisis_confidence: Confidence,
) -> ModelSelection {
    let score: RiskScore = risk::assess(
        message,
        recent_user_messages,
        crisis_detected,
        crisis_confidence,
    );

    if crisis_detected || score.escalates() {
        let reason = if score.reasons.is_empty() {
            "risk escalation".to_string()
        } else {
            format!("risk escalation: {}", score.reasons.join(", "))
        };
        return ModelSelection::from_tier(&tiers.escalation, RouteTier::Escalation, reason);
    }

    match session_mode {
        SessionMode::Discovery => ModelSelection::from_tier(
            &tiers.discovery,
            RouteTier::Primary,
            "discovery session",
        ),
        SessionMode::Coaching => ModelSelection::from_tier(
            &tiers.standard,
            RouteTier::Primary,
            "standard coaching",
        ),
    }
}

/// Fixed model configuration for a background/batch task.
pub fn background_model(tiers: &ModelTierSet, task: BackgroundTask) -> ModelSelection {
    let reason = match task {
        BackgroundTask::PatternSynthesis => "background: pattern synthesis",
        BackgroundTask::DomainClassification => "background: domain classification",
        BackgroundTask::PushNotification => "background: push notification",
    };
    ModelSelection::from_tier(&tiers.background, RouteTier::Background, reason)
}

/// Fixed model configuration for the safety classifier.
pub fn safety_model(tiers: &ModelTierSet) -> ModelSelection {
    ModelSelection::from_tier(&tiers.safety, RouteTier::Safety, "safety classifier")
}
