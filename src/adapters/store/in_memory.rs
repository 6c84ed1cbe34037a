//! In-memory implementations of the persistence ports.
//!
//! Back the test suite and local development. The pattern store keeps one
//! row map per concern behind a mutex; `record_surfaced` mutates the
//! pattern row under that single lock, so within one process the counter
//! increment is atomic. Both types can simulate an outage for resilience
//! tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::domain::coaching::{CachedPatternSet, CachedSummaries};
use crate::domain::foundation::{Timestamp, UserId};
use crate::ports::{ConversationReader, DomainHistory, PatternStore, StoreError};

/// In-memory pattern store.
#[derive(Debug, Default)]
pub struct InMemoryPatternStore {
    patterns: Mutex<HashMap<UserId, CachedPatternSet>>,
    summaries: Mutex<HashMap<UserId, CachedSummaries>>,
    outage: bool,
}

impl InMemoryPatternStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every call fail with [`StoreError::Unavailable`].
    pub fn with_outage(mut self) -> Self {
        self.outage = true;
        self
    }

    fn check_outage(&self) -> Result<(), StoreError> {
        if self.outage {
            return Err(StoreError::unavailable("simulated outage"));
        }
        Ok(())
    }
}

#[async_trait]
impl PatternStore for InMemoryPatternStore {
    async fn load_patterns(&self, user_id: &UserId) -> Result<CachedPatternSet, StoreError> {
        self.check_outage()?;
        self.patterns
            .lock()
            .expect("pattern store lock")
            .get(user_id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn replace_patterns(
        &self,
        user_id: &UserId,
        set: &CachedPatternSet,
    ) -> Result<(), StoreError> {
        self.check_outage()?;
        self.patterns
            .lock()
            .expect("pattern store lock")
            .insert(user_id.clone(), set.clone());
        Ok(())
    }

    async fn load_summaries(&self, user_id: &UserId) -> Result<CachedSummaries, StoreError> {
        self.check_outage()?;
        self.summaries
            .lock()
            .expect("summary store lock")
            .get(user_id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn save_summaries(
        &self,
        user_id: &UserId,
        cache: &CachedSummaries,
    ) -> Result<(), StoreError> {
        self.check_outage()?;
        self.summaries
            .lock()
            .expect("summary store lock")
            .insert(user_id.clone(), cache.clone());
        Ok(())
    }

    async fn record_surfaced(
        &self,
        user_id: &UserId,
        theme: &str,
        at: Timestamp,
        conversation_count: u32,
    ) -> Result<u32, StoreError> {
        self.check_outage()?;
        let mut patterns = self.patterns.lock().expect("pattern store lock");
        let set = patterns.get_mut(user_id).ok_or(StoreError::NotFound)?;
        let pattern = set
            .patterns
            .iter_mut()
            .find(|p| p.theme == theme)
            .ok_or(StoreError::NotFound)?;

        pattern.surface_count += 1;
        pattern.last_surfaced_at = Some(at);
        pattern.conversation_count_at_surface = Some(conversation_count);
        Ok(pattern.surface_count)
    }
}

/// In-memory conversation reader with scripted contents.
#[derive(Debug, Default)]
pub struct InMemoryConversationReader {
    session_count: u32,
    conversation_count: u32,
    /// Newest first.
    recent_messages: Vec<String>,
    histories: Vec<DomainHistory>,
    engagement: HashMap<String, u32>,
    outage: bool,
}

impl InMemoryConversationReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session_count(mut self, count: u32) -> Self {
        self.session_count = count;
        self
    }

    pub fn with_conversation_count(mut self, count: u32) -> Self {
        self.conversation_count = count;
        self
    }

    /// Sets the user's recent messages, newest first.
    pub fn with_recent_messages(mut self, messages: Vec<String>) -> Self {
        self.recent_messages = messages;
        self
    }

    pub fn with_histories(mut self, histories: Vec<DomainHistory>) -> Self {
        self.histories = histories;
        self
    }

    pub fn with_engagement(mut self, theme: impl Into<String>, count: u32) -> Self {
        self.engagement.insert(theme.into(), count);
        self
    }

    /// Makes every call fail with [`StoreError::Unavailable`].
    pub fn with_outage(mut self) -> Self {
        self.outage = true;
        self
    }

    fn check_outage(&self) -> Result<(), StoreError> {
        if self.outage {
            return Err(StoreError::unavailable("simulated outage"));
        }
        Ok(())
    }
}

#[async_trait]
impl ConversationReader for InMemoryConversationReader {
    async fn session_count(&self, _user_id: &UserId) -> Result<u32, StoreError> {
        self.check_outage()?;
        Ok(self.session_count)
    }

    async fn conversation_count(&self, _user_id: &UserId) -> Result<u32, StoreError> {
        self.check_outage()?;
        Ok(self.conversation_count)
    }

    async fn recent_user_messages(
        &self,
        _user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<String>, StoreError> {
        self.check_outage()?;
        Ok(self.recent_messages.iter().take(limit).cloned().collect())
    }

    async fn history_by_domain(
        &self,
        _user_id: &UserId,
        min_messages: u32,
        max_conversations: usize,
    ) -> Result<Vec<DomainHistory>, StoreError> {
        self.check_outage()?;
        Ok(self
            .histories
            .iter()
            .filter(|h| h.message_count >= min_messages)
            .map(|h| DomainHistory {
                domain: h.domain,
                message_count: h.message_count,
                conversation_summaries: h
                    .conversation_summaries
                    .iter()
                    .take(max_conversations)
                    .cloned()
                    .collect(),
            })
            .collect())
    }

    async fn engagement_counts(
        &self,
        _user_id: &UserId,
    ) -> Result<HashMap<String, u32>, StoreError> {
        self.check_outage()?;
        Ok(self.engagement.clone())
    }
}
