//! Cross-domain pattern and pattern summary value objects.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::domain::foundation::{Confidence, Timestamp, ValidationError};

use super::CoachingDomain;

/// One piece of evidence backing a pattern, tied to a single domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternEvidence {
    pub domain: CoachingDomain,
    pub summary: String,
}

impl PatternEvidence {
    pub fn new(domain: CoachingDomain, summary: impl Into<String>) -> Self {
        Self {
            domain,
            summary: summary.into(),
        }
    }
}

/// A behavioral theme with evidence drawn from at least two distinct
/// coaching domains for the same user.
///
/// Persisted per user; each full re-analysis replaces the prior set
/// wholesale, so no pattern identity survives a refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossDomainPattern {
    pub theme: String,
    pub domains: BTreeSet<CoachingDomain>,
    pub confidence: Confidence,
    pub evidence: Vec<PatternEvidence>,
    pub synthesis: String,
    /// How often this theme has been surfaced to the user. Informational;
    /// incremented best-effort by the surfacing rate limiter.
    pub surface_count: u32,
    pub last_surfaced_at: Option<Timestamp>,
    /// Total conversation count at the moment of last surfacing, used for
    /// the resurface gap.
    pub conversation_count_at_surface: Option<u32>,
}

impl CrossDomainPattern {
    /// Creates a pattern, enforcing the cross-domain invariant.
    ///
    /// A single-domain "pattern" is not cross-domain and is rejected here,
    /// before it can ever be persisted or surfaced.
    pub fn new(
        theme: impl Into<String>,
        domains: impl IntoIterator<Item = CoachingDomain>,
        confidence: Confidence,
        evidence: Vec<PatternEvidence>,
        synthesis: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let theme = theme.into();
        if theme.trim().is_empty() {
            return Err(ValidationError::empty_field("theme"));
        }

        let domains: BTreeSet<CoachingDomain> = domains.into_iter().collect();
        if domains.len() < 2 {
            return Err(ValidationError::invalid_format(
                "domains",
                format!("cross-domain pattern requires >= 2 distinct domains, got {}", domains.len()),
            ));
        }

        Ok(Self {
            theme,
            domains,
            confidence,
            evidence,
            synthesis: synthesis.into(),
            surface_count: 0,
            last_surfaced_at: None,
            conversation_count_at_surface: None,
        })
    }

    /// Checks the persistence confidence filter.
    pub fn meets_confidence(&self, threshold: f32) -> bool {
        self.confidence.at_least(threshold)
    }
}

/// A user's cached pattern set together with its analysis timestamp.
///
/// Considered fresh within a 24-hour TTL measured from `analyzed_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedPatternSet {
    pub patterns: Vec<CrossDomainPattern>,
    pub analyzed_at: Timestamp,
}

impl CachedPatternSet {
    pub fn new(patterns: Vec<CrossDomainPattern>, analyzed_at: Timestamp) -> Self {
        Self {
            patterns,
            analyzed_at,
        }
    }

    /// Checks whether the set is still within the TTL as of `now`.
    pub fn is_fresh(&self, now: Timestamp, ttl_hours: i64) -> bool {
        now.duration_since(&self.analyzed_at) < chrono::Duration::hours(ttl_hours)
    }
}

/// A prompt-ready summary of a confirmed pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternSummary {
    pub theme: String,
    pub occurrence_count: u32,
    pub domains: BTreeSet<CoachingDomain>,
    pub confidence: Confidence,
    pub synthesis: String,
    pub last_seen_at: Timestamp,
}

/// A user's cached summaries, stamped with the session count at analysis.
///
/// Stale once the user's session count has grown by the configured delta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedSummaries {
    pub summaries: Vec<PatternSummary>,
    pub session_count_at_analysis: u32,
    pub analyzed_at: Timestamp,
}
