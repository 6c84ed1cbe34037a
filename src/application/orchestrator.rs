//! Per-message orchestration of the decision pipeline.
//!
//! Crisis detection runs first so its result can force the escalation
//! tier; domain routing and pattern summaries then run concurrently, and
//! the merged decision carries everything the response path needs.
//! Pattern re-synthesis is fire-and-forget: hosts call
//! [`Orchestrator::spawn_pattern_refresh`] after the response completes.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::domain::coaching::{ChatMessage, CoachingDomain, CrisisDetectionResult, PatternSummary};
use crate::domain::foundation::{SessionId, UserId};
use crate::domain::routing::{budget, select_chat_model, DomainResult, ModelSelection, SessionMode};
use crate::ports::{AIProvider, ConversationReader, PatternStore};

use super::{
    CrisisDetector, DomainRouter, PatternAnalyzer, PatternSynthesizer, RoutingContext,
};

/// How many recent user turns feed crisis context and risk scoring.
const RECENT_TURNS: usize = 3;

/// Everything the orchestrator knows about the message's surroundings.
#[derive(Debug, Clone)]
pub struct MessageContext {
    pub user_id: UserId,
    pub session_id: SessionId,
    pub session_mode: SessionMode,
    /// The conversation's current domain, if one has been assigned.
    pub current_domain: Option<CoachingDomain>,
}

/// The merged per-message decision.
#[derive(Debug, Clone)]
pub struct MessageDecision {
    pub crisis: CrisisDetectionResult,
    pub domain: DomainResult,
    pub model: ModelSelection,
    pub patterns: Vec<PatternSummary>,
}

impl MessageDecision {
    /// Assembles the outgoing prompt within the selected tier's input
    /// budget: the system message always survives, whole turns are kept
    /// newest first, and an oversized newest turn is truncated.
    pub fn budgeted_prompt(
        &self,
        system: &ChatMessage,
        turns: &[ChatMessage],
    ) -> Vec<ChatMessage> {
        budget::fit_to_budget(system, turns, self.model.input_budget_tokens)
    }
}

/// Runs the full decision pipeline for each inbound message.
pub struct Orchestrator {
    crisis_detector: Arc<CrisisDetector>,
    domain_router: Arc<DomainRouter>,
    synthesizer: Arc<PatternSynthesizer>,
    analyzer: Arc<PatternAnalyzer>,
    reader: Arc<dyn ConversationReader>,
    config: Arc<AppConfig>,
}

impl Orchestrator {
    /// Wires the pipeline from its ports and configuration.
    pub fn new(
        provider: Arc<dyn AIProvider>,
        store: Arc<dyn PatternStore>,
        reader: Arc<dyn ConversationReader>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            crisis_detector: Arc::new(CrisisDetector::new(provider.clone(), config.clone())),
            domain_router: Arc::new(DomainRouter::new(provider.clone(), config.clone())),
            synthesizer: Arc::new(PatternSynthesizer::new(
                provider,
                store.clone(),
                reader.clone(),
                config.clone(),
            )),
            analyzer: Arc::new(PatternAnalyzer::new(store, reader.clone(), config.clone())),
            reader,
            config,
        }
    }

    /// Decides how to handle one inbound message.
    ///
    /// Never fails: each stage degrades independently, so the worst case
    /// is a decision built entirely from safe defaults.
    pub async fn decide(&self, ctx: &MessageContext, message: &str) -> MessageDecision {
        let recent = match self
            .reader
            .recent_user_messages(&ctx.user_id, RECENT_TURNS)
            .await
        {
            Ok(messages) => messages,
            Err(err) => {
                tracing::warn!(user_id = %ctx.user_id, error = %err, "recent messages unavailable");
                Vec::new()
            }
        };

        // Crisis first: its verdict feeds model selection and cannot be
        // overridden by anything downstream.
        let crisis = self.crisis_detector.detect(message, &recent).await;

        let routing_ctx = RoutingContext {
            current_domain: ctx.current_domain,
            recent_turns: recent.clone(),
        };

        let (domain, patterns) = tokio::join!(
            self.domain_router.route(message, &routing_ctx),
            self.analyzer.generate_pattern_summary(&ctx.user_id),
        );

        let model = select_chat_model(
            &self.config.tiers,
            ctx.session_mode,
            message,
            &recent,
            crisis.crisis_detected,
            crisis.confidence,
        );

        tracing::info!(
            user_id = %ctx.user_id,
            session_id = %ctx.session_id,
            crisis = crisis.crisis_detected,
            domain = %domain.domain,
            tier = ?model.route_tier,
            "message decision"
        );

        MessageDecision {
            crisis,
            domain,
            model,
            patterns,
        }
    }

    /// Kicks off pattern re-synthesis in the background.
    ///
    /// Called after the response has been delivered; the foreground path
    /// never awaits it, and a panic or failure inside the task only logs.
    pub fn spawn_pattern_refresh(&self, user_id: UserId) {
        let synthesizer = self.synthesizer.clone();
        tokio::spawn(async move {
            let outcome = synthesizer.detect_cross_domain_patterns(&user_id).await;
            tracing::debug!(
                %user_id,
                patterns = outcome.patterns.len(),
                from_cache = outcome.from_cache,
                "background pattern refresh complete"
            );
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::MockAIProvider;
    use crate::adapters::store::{InMemoryConversationReader, InMemoryPatternStore};
    use crate::domain::coaching::{CoachingDomain, CrisisCategory};
    use crate::domain::routing::RouteTier;

    fn user() -> UserId {
        UserId::new("user-1").unwrap()
    }

    fn ctx() -> MessageContext {
        MessageContext {
            user_id: user(),
            session_id: SessionId::new(),
            session_mode: SessionMode::Coaching,
            current_domain: None,
        }
    }

    fn orchestrator(provider: MockAIProvider) -> Orchestrator {
        Orchestrator::new(
            Arc::new(provider),
            Arc::new(InMemoryPatternStore::new()),
            Arc::new(InMemoryConversationReader::new()),
            Arc::new(AppConfig::default()),
        )
    }

    #[tokio::test]
    async fn crisis_keyword_escalates_regardless_of_domain() {
        // Domain classifier would be consulted for the first message; a
        // queued verdict keeps it deterministic.
        let provider =
            MockAIProvider::new().with_response(r#"{"domain": "career", "confidence": 0.9}"#);
        let orchestrator = orchestrator(provider);

        let decision = orchestrator.decide(&ctx(), "I want to die").await;

        assert!(decision.crisis.crisis_detected);
        assert_eq!(decision.crisis.category, CrisisCategory::SuicidalIdeation);
        assert_eq!(decision.model.route_tier, RouteTier::Escalation);
    }

    #[tokio::test]
    async fn calm_message_routes_to_standard_tier() {
        let provider =
            MockAIProvider::new().with_response(r#"{"domain": "career", "confidence": 0.9}"#);
        let orchestrator = orchestrator(provider);

        let decision = orchestrator
            .decide(&ctx(), "thinking about asking for a promotion")
            .await;

        assert!(!decision.crisis.crisis_detected);
        assert_eq!(decision.domain.domain, CoachingDomain::Career);
        assert_eq!(decision.model.route_tier, RouteTier::Primary);
        assert!(decision.patterns.is_empty());
    }

    #[tokio::test]
    async fn every_stage_failing_still_yields_a_decision() {
        let provider =
            MockAIProvider::new().with_error_forever(crate::ports::AIError::unavailable("down"));
        let orchestrator = Orchestrator::new(
            Arc::new(provider),
            Arc::new(InMemoryPatternStore::new().with_outage()),
            Arc::new(InMemoryConversationReader::new().with_outage()),
            Arc::new(AppConfig::default()),
        );

        let decision = orchestrator.decide(&ctx(), "I feel hopeless about it all").await;

        assert!(!decision.crisis.crisis_detected);
        assert_eq!(decision.domain, DomainResult::general_fallback());
        assert!(decision.patterns.is_empty());
        // The message still gets a model: risk scoring is local.
        assert!(!decision.model.model_id.is_empty());
    }

    #[tokio::test]
    async fn budgeted_prompt_respects_the_selected_tier() {
        let provider =
            MockAIProvider::new().with_response(r#"{"domain": "career", "confidence": 0.9}"#);
        let orchestrator = orchestrator(provider);

        let decision = orchestrator.decide(&ctx(), "quick work question").await;

        let system = ChatMessage::system("You are a supportive coach.");
        let turns = vec![ChatMessage::user("x".repeat(200_000))];
        let prompt = decision.budgeted_prompt(&system, &turns);

        let total: u32 = prompt
            .iter()
            .map(|m| crate::domain::routing::budget::estimate_tokens(&m.content))
            .sum();
        assert!(total <= decision.model.input_budget_tokens);
    }

    #[tokio::test]
    async fn background_refresh_does_not_block_the_decision() {
        let provider =
            MockAIProvider::new().with_response(r#"{"domain": "career", "confidence": 0.9}"#);
        let orchestrator = orchestrator(provider);

        let decision = orchestrator.decide(&ctx(), "work stuff again").await;
        orchestrator.spawn_pattern_refresh(user());

        // The decision was already complete before the refresh ran.
        assert_eq!(decision.model.route_tier, RouteTier::Primary);
    }
}
