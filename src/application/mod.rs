//! Application layer: the four pipeline components and the orchestrator
//! that merges their outputs per inbound message.

mod crisis_detector;
mod domain_router;
mod orchestrator;
mod pattern_analyzer;
mod pattern_synthesizer;

pub use crisis_detector::CrisisDetector;
pub use domain_router::{DomainRouter, RoutingContext};
pub use orchestrator::{MessageContext, MessageDecision, Orchestrator};
pub use pattern_analyzer::PatternAnalyzer;
pub use pattern_synthesizer::{PatternSynthesizer, SurfaceGate, SynthesisOutcome};

use std::sync::Arc;
use std::time::Instant;

use crate::config::AiConfig;
use crate::ports::{AIError, AIProvider, CompletionRequest};

/// Issues a classifier call with a bounded timeout and slow-call logging.
///
/// Elapsed time beyond the configured anomaly threshold is logged as a
/// warning even when the call eventually succeeds.
pub(crate) async fn timed_complete(
    provider: &Arc<dyn AIProvider>,
    ai: &AiConfig,
    component: &'static str,
    request: CompletionRequest,
) -> Result<String, AIError> {
    let started = Instant::now();

    let result = tokio::time::timeout(ai.timeout(), provider.complete(request)).await;

    let elapsed = started.elapsed();
    if elapsed > ai.slow_call_warn() {
        tracing::warn!(
            component,
            elapsed_ms = elapsed.as_millis() as u64,
            "slow classifier call"
        );
    }

    match result {
        Ok(Ok(response)) => Ok(response.content),
        Ok(Err(err)) => Err(err),
        Err(_) => Err(AIError::Timeout {
            timeout_secs: ai.timeout_secs as u32,
        }),
    }
}
