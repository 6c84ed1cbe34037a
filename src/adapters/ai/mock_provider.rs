//! Mock AI Provider for testing.
//!
//! Configurable mock implementation of the AIProvider port, allowing tests
//! to run without calling real AI APIs.
//!
//! # Features
//!
//! - Pre-configured responses, consumed in order
//! - Simulated delays for timeout testing
//! - Error injection for resilience testing
//! - Call tracking for verification
//!
//! # Example
//!
//! ```ignore
//! let provider = MockAIProvider::new()
//!     .with_response(r#"{"domain": "career", "confidence": 0.9}"#);
//!
//! let response = provider.complete(request).await?;
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{AIError, AIProvider, CompletionRequest, CompletionResponse, TokenUsage};

/// A configured mock response.
#[derive(Debug)]
enum MockResponse {
    /// Return a successful completion.
    Success { content: String, usage: TokenUsage },
    /// Return an error.
    Error(AIError),
}

/// Mock AI provider for testing.
///
/// Configurable to return specific responses, simulate delays, or inject
/// errors. Once the queue is drained, calls return the sticky error if one
/// is set, otherwise an empty completion.
#[derive(Debug, Clone)]
pub struct MockAIProvider {
    /// Pre-configured responses (consumed in order).
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    /// Error returned for every call once the queue is empty.
    sticky_error: Arc<Mutex<Option<AIError>>>,
    /// Simulated latency per request.
    delay: Duration,
    /// Number of completed calls.
    calls: Arc<AtomicUsize>,
    /// Call history for verification.
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl Default for MockAIProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAIProvider {
    /// Creates a new mock provider with default settings.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            sticky_error: Arc::new(Mutex::new(None)),
            delay: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Adds a successful response to the queue.
    pub fn with_response(self, content: impl Into<String>) -> Self {
        self.responses
            .lock()
            .expect("mock response lock")
            .push_back(MockResponse::Success {
                content: content.into(),
                usage: TokenUsage::new(100, 50),
            });
        self
    }

    /// Adds an error to the queue.
    pub fn with_error(self, error: AIError) -> Self {
        self.responses
            .lock()
            .expect("mock response lock")
            .push_back(MockResponse::Error(error));
        self
    }

    /// Makes every call fail with this error once the queue is drained.
    pub fn with_error_forever(self, error: AIError) -> Self {
        *self.sticky_error.lock().expect("mock error lock") = Some(error);
        self
    }

    /// Sets simulated latency per request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Returns a handle to the call counter.
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }

    /// Returns a copy of all requests seen so far.
    pub fn recorded_requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().expect("mock request lock").clone()
    }
}

#[async_trait]
impl AIProvider for MockAIProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .expect("mock request lock")
            .push(request);

        let next = self
            .responses
            .lock()
            .expect("mock response lock")
            .pop_front();

        match next {
            Some(MockResponse::Success { content, usage }) => Ok(CompletionResponse {
                content,
                usage,
                model: "mock-model-1".to_string(),
            }),
            Some(MockResponse::Error(error)) => Err(error),
            None => {
                if let Some(error) = self.sticky_error.lock().expect("mock error lock").clone() {
                    return Err(error);
                }
                Ok(CompletionResponse {
                    content: String::new(),
                    usage: TokenUsage::zero(),
                    model: "mock-model-1".to_string(),
                })
            }
        }
    }
}
