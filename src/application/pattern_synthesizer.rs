//! Cross-domain pattern synthesizer.
//!
//! Cache-first with a TTL: a fresh stored pattern set short-circuits the
//! expensive path. On a miss, conversation history is grouped by domain,
//! a background-tier classifier proposes candidate patterns, and the
//! survivors of the domain-count and confidence filters replace the
//! stored set wholesale. Every failure degrades to an empty result.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::config::AppConfig;
use crate::domain::coaching::{
    CachedPatternSet, ChatRole, CoachingDomain, CrossDomainPattern, PatternEvidence,
};
use crate::domain::foundation::{Confidence, SessionId, Timestamp, UserId};
use crate::domain::routing::{background_model, BackgroundTask};
use crate::ports::{AIProvider, CompletionRequest, ConversationReader, DomainHistory,
    PatternStore, StoreError};

use super::timed_complete;

const SYSTEM_PROMPT: &str = "You analyze coaching conversation history for recurring \
behavioral themes. Report only themes with evidence in at least two of the \
labeled life domains, and only when you are at least 85% confident. Respond \
with exactly one JSON array and nothing else. Each element:\n\
{\"theme\": short string, \"domains\": array of domain names, \
\"confidence\": number between 0 and 1, \"evidence\": array of \
{\"domain\": string, \"summary\": string}, \"synthesis\": one or two \
sentences connecting the evidence}\nIf no such theme exists, respond with [].";

/// The synthesizer's result for one user.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisOutcome {
    pub patterns: Vec<CrossDomainPattern>,
    /// Whether the result came from the stored set without re-analysis.
    pub from_cache: bool,
}

impl SynthesisOutcome {
    fn empty() -> Self {
        Self {
            patterns: Vec::new(),
            from_cache: false,
        }
    }

    fn cached(patterns: Vec<CrossDomainPattern>) -> Self {
        Self {
            patterns,
            from_cache: true,
        }
    }
}

/// Synthesizes cross-domain patterns from a user's coaching history.
pub struct PatternSynthesizer {
    provider: Arc<dyn AIProvider>,
    store: Arc<dyn PatternStore>,
    reader: Arc<dyn ConversationReader>,
    config: Arc<AppConfig>,
}

impl PatternSynthesizer {
    pub fn new(
        provider: Arc<dyn AIProvider>,
        store: Arc<dyn PatternStore>,
        reader: Arc<dyn ConversationReader>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            provider,
            store,
            reader,
            config,
        }
    }

    /// Returns the user's cross-domain patterns, re-analyzing when the
    /// stored set is missing or stale.
    ///
    /// Never fails: store outages, classifier errors and malformed output
    /// all degrade to an empty pattern list.
    pub async fn detect_cross_domain_patterns(&self, user_id: &UserId) -> SynthesisOutcome {
        let now = Timestamp::now();
        let ttl_hours = self.config.thresholds.pattern_ttl_hours;

        match self.store.load_patterns(user_id).await {
            Ok(set) if set.is_fresh(now, ttl_hours) => {
                return SynthesisOutcome::cached(set.patterns);
            }
            Ok(_) | Err(StoreError::NotFound) => {}
            Err(StoreError::Unavailable(message)) => {
                tracing::warn!(%user_id, %message, "pattern store unavailable, skipping synthesis");
                return SynthesisOutcome::empty();
            }
        }

        let histories = match self
            .reader
            .history_by_domain(
                user_id,
                self.config.thresholds.synthesis_min_messages,
                self.config.thresholds.synthesis_max_conversations,
            )
            .await
        {
            Ok(histories) => histories,
            Err(err) => {
                tracing::warn!(%user_id, error = %err, "history read failed, skipping synthesis");
                return SynthesisOutcome::empty();
            }
        };

        // Fewer than two domains with enough history cannot yield a
        // cross-domain pattern; cache the empty answer for the TTL.
        if histories.len() < self.config.thresholds.pattern_min_domains {
            self.persist(user_id, Vec::new(), now).await;
            return SynthesisOutcome::empty();
        }

        let patterns = match self.analyze(&histories).await {
            Some(patterns) => patterns,
            None => return SynthesisOutcome::empty(),
        };

        self.persist(user_id, patterns.clone(), now).await;

        SynthesisOutcome {
            patterns,
            from_cache: false,
        }
    }

    async fn persist(&self, user_id: &UserId, patterns: Vec<CrossDomainPattern>, now: Timestamp) {
        let set = CachedPatternSet::new(patterns, now);
        if let Err(err) = self.store.replace_patterns(user_id, &set).await {
            tracing::warn!(%user_id, error = %err, "failed to persist pattern set");
        }
    }

    async fn analyze(&self, histories: &[DomainHistory]) -> Option<Vec<CrossDomainPattern>> {
        let model = background_model(&self.config.tiers, BackgroundTask::PatternSynthesis);

        let request = CompletionRequest::new()
            .with_system_prompt(SYSTEM_PROMPT)
            .with_model(model.model_id)
            .with_max_tokens(model.max_output_tokens)
            .with_temperature(model.temperature)
            .with_message(ChatRole::User, render_histories(histories));

        let content =
            match timed_complete(&self.provider, &self.config.ai, "synthesis", request).await {
                Ok(content) => content,
                Err(err) => {
                    tracing::warn!(error = %err, "synthesis classifier call failed");
                    return None;
                }
            };

        let candidates: serde_json::Value = match serde_json::from_str(content.trim()) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(error = %err, "malformed synthesis output");
                return None;
            }
        };

        let items = candidates.as_array()?;
        let threshold = self.config.thresholds.pattern_confidence;

        // Row-level defensiveness: a malformed candidate is dropped, the
        // rest of the batch survives.
        let patterns = items
            .iter()
            .filter_map(|item| parse_candidate(item, threshold))
            .collect();

        Some(patterns)
    }
}

fn render_histories(histories: &[DomainHistory]) -> String {
    let mut out = String::from("Conversation history by life domain:\n");
    for history in histories {
        out.push_str(&format!(
            "\n## {} ({} messages)\n",
            history.domain, history.message_count
        ));
        for summary in &history.conversation_summaries {
            out.push_str("- ");
            out.push_str(summary);
            out.push('\n');
        }
    }
    out
}

/// Parses one candidate pattern, applying the domain-count and confidence
/// filters before anything can be persisted.
fn parse_candidate(item: &serde_json::Value, threshold: f32) -> Option<CrossDomainPattern> {
    let theme = item.get("theme")?.as_str()?;
    let synthesis = item.get("synthesis").and_then(|v| v.as_str()).unwrap_or("");

    let confidence = Confidence::new(item.get("confidence")?.as_f64()? as f32).ok()?;
    if !confidence.at_least(threshold) {
        return None;
    }

    let domains: Vec<CoachingDomain> = item
        .get("domains")?
        .as_array()?
        .iter()
        .filter_map(|d| d.as_str())
        .filter_map(CoachingDomain::parse_classifier)
        .collect();

    let evidence: Vec<PatternEvidence> = item
        .get("evidence")
        .and_then(|v| v.as_array())
        .map(|rows| {
            rows.iter()
                .filter_map(|row| {
                    let domain = CoachingDomain::parse_classifier(row.get("domain")?.as_str()?)?;
                    let summary = row.get("summary")?.as_str()?;
                    Some(PatternEvidence::new(domain, summary))
                })
                .collect()
        })
        .unwrap_or_default();

    // The constructor enforces the >= 2 distinct domain invariant.
    CrossDomainPattern::new(theme, domains, confidence, evidence, synthesis).ok()
}

/// Rate limiter for surfacing patterns to the user.
///
/// At most one pattern per session, and a theme only resurfaces after the
/// configured number of new conversations. Per-session state is held in
/// memory; the per-theme state lives on the stored pattern rows.
pub struct SurfaceGate {
    store: Arc<dyn PatternStore>,
    reader: Arc<dyn ConversationReader>,
    config: Arc<AppConfig>,
    surfaced_sessions: Mutex<HashSet<SessionId>>,
}

impl SurfaceGate {
    pub fn new(
        store: Arc<dyn PatternStore>,
        reader: Arc<dyn ConversationReader>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            store,
            reader,
            config,
            surfaced_sessions: Mutex::new(HashSet::new()),
        }
    }

    /// Decides whether `pattern` may be surfaced in `session_id` now, and
    /// records the surfacing when it may.
    ///
    /// Denies on any store failure; surfacing is an enhancement, never
    /// worth an error.
    pub async fn try_surface(
        &self,
        user_id: &UserId,
        session_id: SessionId,
        pattern: &CrossDomainPattern,
    ) -> bool {
        {
            let surfaced = self.surfaced_sessions.lock().expect("surface gate lock");
            if surfaced.contains(&session_id) {
                return false;
            }
        }

        let conversation_count = match self.reader.conversation_count(user_id).await {
            Ok(count) => count,
            Err(err) => {
                tracing::warn!(%user_id, error = %err, "conversation count unavailable, not surfacing");
                return false;
            }
        };

        if let Some(at_surface) = pattern.conversation_count_at_surface {
            let gap = conversation_count.saturating_sub(at_surface);
            if gap < self.config.thresholds.resurface_conversation_gap {
                return false;
            }
        }

        match self
            .store
            .record_surfaced(user_id, &pattern.theme, Timestamp::now(), conversation_count)
            .await
        {
            Ok(_) => {
                self.surfaced_sessions
                    .lock()
                    .expect("surface gate lock")
                    .insert(session_id);
                true
            }
            Err(err) => {
                tracing::warn!(%user_id, error = %err, "failed to record surfacing, not surfacing");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::MockAIProvider;
    use crate::adapters::store::{InMemoryConversationReader, InMemoryPatternStore};

    fn user() -> UserId {
        UserId::new("user-1").unwrap()
    }

    fn synthesizer(
        provider: MockAIProvider,
        store: Arc<InMemoryPatternStore>,
        reader: Arc<InMemoryConversationReader>,
    ) -> PatternSynthesizer {
        PatternSynthesizer::new(
            Arc::new(provider),
            store,
            reader,
            Arc::new(AppConfig::default()),
        )
    }

    fn two_domain_reader() -> Arc<InMemoryConversationReader> {
        Arc::new(InMemoryConversationReader::new().with_histories(vec![
            DomainHistory {
                domain: CoachingDomain::Career,
                message_count: 12,
                conversation_summaries: vec!["avoids asking for a raise".to_string()],
            },
            DomainHistory {
                domain: CoachingDomain::Relationships,
                message_count: 8,
                conversation_summaries: vec!["avoids hard conversations at home".to_string()],
            },
        ]))
    }

    fn valid_candidate_json() -> &'static str {
        r#"[{
            "theme": "conflict avoidance",
            "domains": ["career", "relationships"],
            "confidence": 0.9,
            "evidence": [
                {"domain": "career", "summary": "avoids asking for a raise"},
                {"domain": "relationships", "summary": "avoids hard conversations"}
            ],
            "synthesis": "Avoids confrontation in work and home life."
        }]"#
    }

    #[tokio::test]
    async fn fresh_cache_short_circuits_analysis() {
        let store = Arc::new(InMemoryPatternStore::new());
        let pattern = CrossDomainPattern::new(
            "conflict avoidance",
            [CoachingDomain::Career, CoachingDomain::Relationships],
            Confidence::new(0.9).unwrap(),
            vec![],
            "",
        )
        .unwrap();
        store
            .replace_patterns(
                &user(),
                &CachedPatternSet::new(vec![pattern], Timestamp::now().minus_hours(1)),
            )
            .await
            .unwrap();

        let provider = MockAIProvider::new();
        let counter = provider.call_counter();
        let synthesizer = synthesizer(provider, store, two_domain_reader());

        let outcome = synthesizer.detect_cross_domain_patterns(&user()).await;

        assert!(outcome.from_cache);
        assert_eq!(outcome.patterns.len(), 1);
        assert_eq!(counter.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn stale_cache_triggers_reanalysis_and_replacement() {
        let store = Arc::new(InMemoryPatternStore::new());
        let old = CrossDomainPattern::new(
            "old theme",
            [CoachingDomain::Health, CoachingDomain::Finances],
            Confidence::new(0.9).unwrap(),
            vec![],
            "",
        )
        .unwrap();
        store
            .replace_patterns(
                &user(),
                &CachedPatternSet::new(vec![old], Timestamp::now().minus_hours(25)),
            )
            .await
            .unwrap();

        let provider = MockAIProvider::new().with_response(valid_candidate_json());
        let synthesizer = synthesizer(provider, store.clone(), two_domain_reader());

        let outcome = synthesizer.detect_cross_domain_patterns(&user()).await;

        assert!(!outcome.from_cache);
        assert_eq!(outcome.patterns.len(), 1);
        assert_eq!(outcome.patterns[0].theme, "conflict avoidance");

        // Wholesale replacement: the old theme is gone from the store.
        let stored = store.load_patterns(&user()).await.unwrap();
        assert_eq!(stored.patterns.len(), 1);
        assert_eq!(stored.patterns[0].theme, "conflict avoidance");
    }

    #[tokio::test]
    async fn single_domain_history_yields_no_patterns_without_classifier_call() {
        let store = Arc::new(InMemoryPatternStore::new());
        let reader = Arc::new(InMemoryConversationReader::new().with_histories(vec![
            DomainHistory {
                domain: CoachingDomain::Career,
                message_count: 20,
                conversation_summaries: vec!["lots of career talk".to_string()],
            },
        ]));

        let provider = MockAIProvider::new();
        let counter = provider.call_counter();
        let synthesizer = synthesizer(provider, store.clone(), reader);

        let outcome = synthesizer.detect_cross_domain_patterns(&user()).await;

        assert!(outcome.patterns.is_empty());
        assert_eq!(counter.load(std::sync::atomic::Ordering::SeqCst), 0);
        // The empty answer is cached for the TTL.
        assert!(store.load_patterns(&user()).await.is_ok());
    }

    #[tokio::test]
    async fn low_confidence_and_single_domain_candidates_are_dropped() {
        let store = Arc::new(InMemoryPatternStore::new());
        let provider = MockAIProvider::new().with_response(
            r#"[
                {"theme": "weak", "domains": ["career", "health"], "confidence": 0.6,
                 "evidence": [], "synthesis": ""},
                {"theme": "narrow", "domains": ["career"], "confidence": 0.95,
                 "evidence": [], "synthesis": ""},
                {"theme": "solid", "domains": ["career", "relationships"], "confidence": 0.88,
                 "evidence": [], "synthesis": "holds up"}
            ]"#,
        );
        let synthesizer = synthesizer(provider, store, two_domain_reader());

        let outcome = synthesizer.detect_cross_domain_patterns(&user()).await;

        assert_eq!(outcome.patterns.len(), 1);
        assert_eq!(outcome.patterns[0].theme, "solid");
    }

    #[tokio::test]
    async fn malformed_classifier_output_degrades_to_empty() {
        let store = Arc::new(InMemoryPatternStore::new());
        let provider = MockAIProvider::new().with_response("here are some thoughts...");
        let synthesizer = synthesizer(provider, store, two_domain_reader());

        let outcome = synthesizer.detect_cross_domain_patterns(&user()).await;

        assert!(outcome.patterns.is_empty());
        assert!(!outcome.from_cache);
    }

    #[tokio::test]
    async fn store_outage_degrades_to_empty() {
        let store = Arc::new(InMemoryPatternStore::new().with_outage());
        let provider = MockAIProvider::new();
        let counter = provider.call_counter();
        let synthesizer = synthesizer(provider, store, two_domain_reader());

        let outcome = synthesizer.detect_cross_domain_patterns(&user()).await;

        assert!(outcome.patterns.is_empty());
        assert_eq!(counter.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn surface_gate_allows_once_per_session() {
        let store = Arc::new(InMemoryPatternStore::new());
        let reader = Arc::new(InMemoryConversationReader::new().with_conversation_count(10));
        let pattern = CrossDomainPattern::new(
            "conflict avoidance",
            [CoachingDomain::Career, CoachingDomain::Relationships],
            Confidence::new(0.9).unwrap(),
            vec![],
            "",
        )
        .unwrap();
        store
            .replace_patterns(
                &user(),
                &CachedPatternSet::new(vec![pattern.clone()], Timestamp::now()),
            )
            .await
            .unwrap();

        let gate = SurfaceGate::new(store, reader, Arc::new(AppConfig::default()));
        let session = SessionId::new();

        assert!(gate.try_surface(&user(), session, &pattern).await);
        assert!(!gate.try_surface(&user(), session, &pattern).await);

        // A different session may surface again.
        let other_session = SessionId::new();
        assert!(gate.try_surface(&user(), other_session, &pattern).await);
    }

    #[tokio::test]
    async fn surface_gate_enforces_conversation_gap() {
        let store = Arc::new(InMemoryPatternStore::new());
        let reader = Arc::new(InMemoryConversationReader::new().with_conversation_count(11));
        let mut pattern = CrossDomainPattern::new(
            "conflict avoidance",
            [CoachingDomain::Career, CoachingDomain::Relationships],
            Confidence::new(0.9).unwrap(),
            vec![],
            "",
        )
        .unwrap();
        pattern.last_surfaced_at = Some(Timestamp::now().minus_hours(2));
        pattern.conversation_count_at_surface = Some(10);

        let gate = SurfaceGate::new(store, reader, Arc::new(AppConfig::default()));

        // Only one new conversation since last surfacing; gap of 3 required.
        assert!(!gate.try_surface(&user(), SessionId::new(), &pattern).await);
    }

    #[tokio::test]
    async fn surface_gate_denies_on_store_failure() {
        let store = Arc::new(InMemoryPatternStore::new().with_outage());
        let reader = Arc::new(InMemoryConversationReader::new().with_conversation_count(10));
        let pattern = CrossDomainPattern::new(
            "conflict avoidance",
            [CoachingDomain::Career, CoachingDomain::Relationships],
            Confidence::new(0.9).unwrap(),
            vec![],
            "",
        )
        .unwrap();

        let gate = SurfaceGate::new(store, reader, Arc::new(AppConfig::default()));

        assert!(!gate.try_surface(&user(), SessionId::new(), &pattern).await);
    }
}
