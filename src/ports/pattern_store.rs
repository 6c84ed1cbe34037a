//! PatternStore port - row store capability for pattern persistence.
//!
//! The distinction between [`StoreError::NotFound`] and
//! [`StoreError::Unavailable`] is load-bearing: not-found means "no rows
//! yet", a legitimate empty state, while unavailable means a transient
//! failure the caller degrades gracefully from (and logs).

use async_trait::async_trait;

use crate::domain::coaching::{CachedPatternSet, CachedSummaries};
use crate::domain::foundation::{Timestamp, UserId};

/// Row store errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// No row exists for this key. A normal, expected outcome.
    #[error("not found")]
    NotFound,

    /// Transient failure (connection, timeout, server error).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }
}

/// Persistence for cross-domain patterns and their derived summaries.
#[async_trait]
pub trait PatternStore: Send + Sync {
    /// Loads the user's most recent cached pattern set.
    async fn load_patterns(&self, user_id: &UserId) -> Result<CachedPatternSet, StoreError>;

    /// Replaces the user's pattern set wholesale (delete-then-insert,
    /// never a partial merge). Callers must not assume any previous
    /// pattern identity survives.
    async fn replace_patterns(
        &self,
        user_id: &UserId,
        set: &CachedPatternSet,
    ) -> Result<(), StoreError>;

    /// Loads the user's cached pattern summaries.
    async fn load_summaries(&self, user_id: &UserId) -> Result<CachedSummaries, StoreError>;

    /// Saves the user's pattern summaries.
    async fn save_summaries(
        &self,
        user_id: &UserId,
        cache: &CachedSummaries,
    ) -> Result<(), StoreError>;

    /// Records that a theme was surfaced: increments its surface counter
    /// and stamps the surfacing time and conversation count.
    ///
    /// Implementations should use an atomic increment where the backing
    /// store offers one. A read-modify-write fallback is acceptable; the
    /// counter is informational, not a correctness gate, so the small
    /// race window is tolerated. Returns the new count.
    async fn record_surfaced(
        &self,
        user_id: &UserId,
        theme: &str,
        at: Timestamp,
        conversation_count: u32,
    ) -> Result<u32, StoreError>;
}
