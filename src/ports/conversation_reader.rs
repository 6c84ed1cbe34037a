//! ConversationReader port - read access to a user's coaching history.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::domain::coaching::CoachingDomain;
use crate::domain::foundation::UserId;

use super::StoreError;

/// A user's conversation history within one domain, pre-summarized for
/// classifier consumption.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainHistory {
    pub domain: CoachingDomain,
    /// Number of qualifying user messages in this domain.
    pub message_count: u32,
    /// One short summary per conversation, newest first.
    pub conversation_summaries: Vec<String>,
}

/// Read-side access to sessions and conversations.
#[async_trait]
pub trait ConversationReader: Send + Sync {
    /// Total completed sessions for the user.
    async fn session_count(&self, user_id: &UserId) -> Result<u32, StoreError>;

    /// Total conversations for the user.
    async fn conversation_count(&self, user_id: &UserId) -> Result<u32, StoreError>;

    /// The user's most recent messages, newest first, up to `limit`.
    async fn recent_user_messages(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<String>, StoreError>;

    /// Conversation history grouped by domain.
    ///
    /// Only domains with at least `min_messages` qualifying messages are
    /// returned, and each domain carries at most `max_conversations`
    /// conversation summaries (cost containment).
    async fn history_by_domain(
        &self,
        user_id: &UserId,
        min_messages: u32,
        max_conversations: usize,
    ) -> Result<Vec<DomainHistory>, StoreError>;

    /// Engagement counts per pattern theme (how often the user interacted
    /// with a surfaced pattern), used as a ranking tiebreaker.
    async fn engagement_counts(&self, user_id: &UserId)
        -> Result<HashMap<String, u32>, StoreError>;
}
