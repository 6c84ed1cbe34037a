//! End-to-end tests for the message decision pipeline, wired from the
//! public API with mock providers and in-memory stores.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use coach_compass::adapters::ai::MockAIProvider;
use coach_compass::adapters::store::{InMemoryConversationReader, InMemoryPatternStore};
use coach_compass::application::{MessageContext, Orchestrator, PatternSynthesizer, SurfaceGate};
use coach_compass::config::AppConfig;
use coach_compass::domain::coaching::{
    CachedPatternSet, ChatMessage, CoachingDomain, CrisisCategory, CrossDomainPattern,
    PatternEvidence,
};
use coach_compass::domain::foundation::{Confidence, SessionId, Timestamp, UserId};
use coach_compass::domain::routing::{RouteTier, SessionMode};
use coach_compass::ports::{DomainHistory, PatternStore};

fn user() -> UserId {
    UserId::new("user-1").unwrap()
}

fn context(current_domain: Option<CoachingDomain>) -> MessageContext {
    MessageContext {
        user_id: user(),
        session_id: SessionId::new(),
        session_mode: SessionMode::Coaching,
        current_domain,
    }
}

fn orchestrator_with(
    provider: MockAIProvider,
    store: Arc<InMemoryPatternStore>,
    reader: Arc<InMemoryConversationReader>,
) -> Orchestrator {
    Orchestrator::new(Arc::new(provider), store, reader, Arc::new(AppConfig::default()))
}

fn confirmed_pattern(theme: &str, evidence_count: usize) -> CrossDomainPattern {
    let evidence = (0..evidence_count)
        .map(|i| {
            let domain = if i % 2 == 0 {
                CoachingDomain::Career
            } else {
                CoachingDomain::Relationships
            };
            PatternEvidence::new(domain, format!("observation {i}"))
        })
        .collect();
    CrossDomainPattern::new(
        theme,
        [CoachingDomain::Career, CoachingDomain::Relationships],
        Confidence::new(0.9).unwrap(),
        evidence,
        "the same avoidance shows up at work and at home",
    )
    .unwrap()
}

#[tokio::test]
async fn crisis_keyword_escalates_without_any_classifier_call() {
    let provider = MockAIProvider::new();
    let counter = provider.call_counter();
    let orchestrator = orchestrator_with(
        provider,
        Arc::new(InMemoryPatternStore::new()),
        Arc::new(InMemoryConversationReader::new()),
    );

    // Current domain assigned and no foreign keywords, so the domain gate
    // stays silently; the crisis fast path needs no classifier either.
    let decision = orchestrator
        .decide(&context(Some(CoachingDomain::Career)), "I want to die")
        .await;

    assert!(decision.crisis.crisis_detected);
    assert_eq!(decision.crisis.category, CrisisCategory::SuicidalIdeation);
    assert_eq!(decision.crisis.confidence.value(), 0.9);
    assert_eq!(decision.model.route_tier, RouteTier::Escalation);
    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn kill_myself_is_categorized_as_self_harm() {
    let orchestrator = orchestrator_with(
        MockAIProvider::new(),
        Arc::new(InMemoryPatternStore::new()),
        Arc::new(InMemoryConversationReader::new()),
    );

    let decision = orchestrator
        .decide(
            &context(Some(CoachingDomain::Career)),
            "some days I think about how I could kill myself",
        )
        .await;

    assert_eq!(decision.crisis.category, CrisisCategory::SelfHarm);
    assert_eq!(decision.model.route_tier, RouteTier::Escalation);
}

#[tokio::test]
async fn domain_switch_below_threshold_keeps_previous_domain() {
    let provider =
        MockAIProvider::new().with_response(r#"{"domain": "relationships", "confidence": 0.80}"#);
    let orchestrator = orchestrator_with(
        provider,
        Arc::new(InMemoryPatternStore::new()),
        Arc::new(InMemoryConversationReader::new()),
    );

    let decision = orchestrator
        .decide(
            &context(Some(CoachingDomain::Career)),
            "my partner thinks I work too much",
        )
        .await;

    assert_eq!(decision.domain.domain, CoachingDomain::Career);
}

#[tokio::test]
async fn domain_switch_at_threshold_moves() {
    let provider =
        MockAIProvider::new().with_response(r#"{"domain": "relationships", "confidence": 0.85}"#);
    let orchestrator = orchestrator_with(
        provider,
        Arc::new(InMemoryPatternStore::new()),
        Arc::new(InMemoryConversationReader::new()),
    );

    let decision = orchestrator
        .decide(
            &context(Some(CoachingDomain::Career)),
            "my partner thinks I work too much",
        )
        .await;

    assert_eq!(decision.domain.domain, CoachingDomain::Relationships);
}

#[tokio::test]
async fn established_user_gets_pattern_summaries_in_the_decision() {
    let store = Arc::new(InMemoryPatternStore::new());
    store
        .replace_patterns(
            &user(),
            &CachedPatternSet::new(vec![confirmed_pattern("conflict avoidance", 4)], Timestamp::now()),
        )
        .await
        .unwrap();
    let reader = Arc::new(InMemoryConversationReader::new().with_session_count(8));

    let provider = MockAIProvider::new().with_response(r#"{"domain": "career", "confidence": 0.9}"#);
    let orchestrator = orchestrator_with(provider, store, reader);

    let decision = orchestrator
        .decide(&context(None), "I keep putting off the salary talk")
        .await;

    assert_eq!(decision.patterns.len(), 1);
    assert_eq!(decision.patterns[0].theme, "conflict avoidance");
}

#[tokio::test]
async fn new_user_gets_no_pattern_summaries() {
    let store = Arc::new(InMemoryPatternStore::new());
    store
        .replace_patterns(
            &user(),
            &CachedPatternSet::new(vec![confirmed_pattern("conflict avoidance", 4)], Timestamp::now()),
        )
        .await
        .unwrap();
    let reader = Arc::new(InMemoryConversationReader::new().with_session_count(2));

    let provider = MockAIProvider::new().with_response(r#"{"domain": "career", "confidence": 0.9}"#);
    let orchestrator = orchestrator_with(provider, store, reader);

    let decision = orchestrator.decide(&context(None), "hello again").await;

    assert!(decision.patterns.is_empty());
}

#[tokio::test]
async fn accumulated_risk_escalates_without_a_crisis_verdict() {
    let provider = MockAIProvider::new();
    let orchestrator = orchestrator_with(
        provider,
        Arc::new(InMemoryPatternStore::new()),
        Arc::new(InMemoryConversationReader::new()),
    );

    let decision = orchestrator
        .decide(
            &context(Some(CoachingDomain::Career)),
            "I had a panic attack before the meeting and everything is falling apart",
        )
        .await;

    assert!(!decision.crisis.crisis_detected);
    assert_eq!(decision.model.route_tier, RouteTier::Escalation);
}

#[tokio::test]
async fn total_backend_failure_still_produces_a_decision() {
    let provider =
        MockAIProvider::new().with_error_forever(coach_compass::ports::AIError::unavailable("down"));
    let orchestrator = orchestrator_with(
        provider,
        Arc::new(InMemoryPatternStore::new().with_outage()),
        Arc::new(InMemoryConversationReader::new().with_outage()),
    );

    let decision = orchestrator
        .decide(&context(None), "I feel hopeless about all of it")
        .await;

    assert!(!decision.crisis.crisis_detected);
    assert_eq!(decision.domain.domain, CoachingDomain::General);
    assert_eq!(decision.domain.confidence.value(), 0.0);
    assert!(decision.patterns.is_empty());
    assert!(!decision.model.model_id.is_empty());
}

#[tokio::test]
async fn budgeted_prompt_fits_the_selected_tier() {
    let provider = MockAIProvider::new().with_response(r#"{"domain": "career", "confidence": 0.9}"#);
    let orchestrator = orchestrator_with(
        provider,
        Arc::new(InMemoryPatternStore::new()),
        Arc::new(InMemoryConversationReader::new()),
    );

    let decision = orchestrator.decide(&context(None), "quick question").await;

    let system = ChatMessage::system("You are a supportive coach.");
    let turns: Vec<ChatMessage> = (0..50)
        .map(|i| ChatMessage::user(format!("turn {i}: {}", "words ".repeat(400))))
        .collect();
    let prompt = decision.budgeted_prompt(&system, &turns);

    let total: u32 = prompt
        .iter()
        .map(|m| coach_compass::domain::routing::budget::estimate_tokens(&m.content))
        .sum();
    assert!(total <= decision.model.input_budget_tokens);
    // Newest turn survives.
    assert!(prompt.last().unwrap().content.starts_with("turn 49"));
}

#[tokio::test]
async fn synthesis_persists_then_serves_from_cache() {
    let store = Arc::new(InMemoryPatternStore::new());
    let reader = Arc::new(InMemoryConversationReader::new().with_histories(vec![
        DomainHistory {
            domain: CoachingDomain::Career,
            message_count: 15,
            conversation_summaries: vec!["puts off the raise conversation".to_string()],
        },
        DomainHistory {
            domain: CoachingDomain::Relationships,
            message_count: 9,
            conversation_summaries: vec!["avoids conflict with partner".to_string()],
        },
    ]));

    let provider = MockAIProvider::new().with_response(
        r#"[{
            "theme": "conflict avoidance",
            "domains": ["career", "relationships"],
            "confidence": 0.9,
            "evidence": [
                {"domain": "career", "summary": "puts off the raise conversation"},
                {"domain": "relationships", "summary": "avoids conflict with partner"}
            ],
            "synthesis": "Avoids confrontation across life areas."
        }]"#,
    );
    let counter = provider.call_counter();
    let synthesizer = PatternSynthesizer::new(
        Arc::new(provider),
        store.clone(),
        reader,
        Arc::new(AppConfig::default()),
    );

    let first = synthesizer.detect_cross_domain_patterns(&user()).await;
    assert!(!first.from_cache);
    assert_eq!(first.patterns.len(), 1);
    assert_eq!(counter.load(Ordering::SeqCst), 1);

    // Second run within the TTL is served from the stored set.
    let second = synthesizer.detect_cross_domain_patterns(&user()).await;
    assert!(second.from_cache);
    assert_eq!(second.patterns, first.patterns);
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn surfacing_is_rate_limited_across_sessions_and_conversations() {
    let store = Arc::new(InMemoryPatternStore::new());
    let pattern = confirmed_pattern("conflict avoidance", 4);
    store
        .replace_patterns(
            &user(),
            &CachedPatternSet::new(vec![pattern.clone()], Timestamp::now()),
        )
        .await
        .unwrap();
    let reader = Arc::new(InMemoryConversationReader::new().with_conversation_count(10));

    let gate = SurfaceGate::new(store.clone(), reader, Arc::new(AppConfig::default()));
    let session = SessionId::new();

    // First surfacing in the session passes and stamps the pattern row.
    assert!(gate.try_surface(&user(), session, &pattern).await);
    // Same session: denied.
    assert!(!gate.try_surface(&user(), session, &pattern).await);

    // New session, but only the stamped conversation count so far: the
    // three-conversation gap denies the resurface.
    let stamped = store.load_patterns(&user()).await.unwrap().patterns[0].clone();
    assert_eq!(stamped.conversation_count_at_surface, Some(10));
    assert!(!gate.try_surface(&user(), SessionId::new(), &stamped).await);
}
