//! Pattern analyzer: turns confirmed patterns into prompt-ready summaries.
//!
//! Purely aggregates already-persisted pattern rows with engagement
//! signals; no classifier call. Users with fewer than the minimum session
//! count get nothing, and cached summaries are reused until enough new
//! sessions have accumulated.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::domain::coaching::{CachedSummaries, CrossDomainPattern, PatternSummary};
use crate::domain::foundation::{Timestamp, UserId};
use crate::ports::{ConversationReader, PatternStore, StoreError};

/// Generates ranked pattern summaries for prompt enrichment.
pub struct PatternAnalyzer {
    store: Arc<dyn PatternStore>,
    reader: Arc<dyn ConversationReader>,
    config: Arc<AppConfig>,
}

impl PatternAnalyzer {
    pub fn new(
        store: Arc<dyn PatternStore>,
        reader: Arc<dyn ConversationReader>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            store,
            reader,
            config,
        }
    }

    /// Returns the user's top pattern summaries, newest analysis first.
    ///
    /// Never fails: store outages and missing rows degrade to an empty
    /// list.
    pub async fn generate_pattern_summary(&self, user_id: &UserId) -> Vec<PatternSummary> {
        let thresholds = &self.config.thresholds;

        let session_count = match self.reader.session_count(user_id).await {
            Ok(count) => count,
            Err(StoreError::NotFound) => 0,
            Err(err) => {
                tracing::warn!(%user_id, error = %err, "session count unavailable, skipping summaries");
                return Vec::new();
            }
        };

        if session_count < thresholds.summary_min_sessions {
            return Vec::new();
        }

        // Cached summaries are reused until enough new sessions accumulate.
        match self.store.load_summaries(user_id).await {
            Ok(cache)
                if session_count.saturating_sub(cache.session_count_at_analysis)
                    < thresholds.summary_refresh_sessions =>
            {
                return cache.summaries;
            }
            Ok(_) | Err(StoreError::NotFound) => {}
            Err(StoreError::Unavailable(message)) => {
                tracing::warn!(%user_id, %message, "summary cache unavailable, skipping summaries");
                return Vec::new();
            }
        }

        let (patterns, analyzed_at) = match self.store.load_patterns(user_id).await {
            Ok(set) => (set.patterns, set.analyzed_at),
            Err(StoreError::NotFound) => (Vec::new(), Timestamp::now()),
            Err(err) => {
                tracing::warn!(%user_id, error = %err, "pattern load failed, skipping summaries");
                return Vec::new();
            }
        };

        let engagement = match self.reader.engagement_counts(user_id).await {
            Ok(counts) => counts,
            Err(err) => {
                tracing::warn!(%user_id, error = %err, "engagement counts unavailable, ranking without them");
                Default::default()
            }
        };

        let mut ranked: Vec<(PatternSummary, u32)> = patterns
            .iter()
            .filter_map(|pattern| self.summarize(pattern, analyzed_at))
            .map(|summary| {
                let engagement = engagement.get(&summary.theme).copied().unwrap_or(0);
                (summary, engagement)
            })
            .collect();

        // Occurrence first, engagement breaks ties, recency breaks those.
        ranked.sort_by(|(a, ea), (b, eb)| {
            b.occurrence_count
                .cmp(&a.occurrence_count)
                .then(eb.cmp(ea))
                .then(b.last_seen_at.cmp(&a.last_seen_at))
        });

        let summaries: Vec<PatternSummary> = ranked
            .into_iter()
            .map(|(summary, _)| summary)
            .take(thresholds.summary_max_results)
            .collect();

        let cache = CachedSummaries {
            summaries: summaries.clone(),
            session_count_at_analysis: session_count,
            analyzed_at: Timestamp::now(),
        };
        if let Err(err) = self.store.save_summaries(user_id, &cache).await {
            tracing::warn!(%user_id, error = %err, "failed to cache summaries");
        }

        summaries
    }

    /// Converts one stored pattern into a summary, applying the occurrence
    /// and confidence read filters.
    fn summarize(
        &self,
        pattern: &CrossDomainPattern,
        analyzed_at: Timestamp,
    ) -> Option<PatternSummary> {
        let thresholds = &self.config.thresholds;

        let occurrence_count = (pattern.evidence.len() as u32).max(pattern.surface_count);
        if occurrence_count < thresholds.summary_min_occurrence {
            return None;
        }
        if !pattern.meets_confidence(thresholds.pattern_confidence) {
            return None;
        }

        Some(PatternSummary {
            theme: pattern.theme.clone(),
            occurrence_count,
            domains: pattern.domains.clone(),
            confidence: pattern.confidence,
            synthesis: pattern.synthesis.clone(),
            last_seen_at: pattern.last_surfaced_at.unwrap_or(analyzed_at),
        })
    }
}
