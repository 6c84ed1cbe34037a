//! Ports - Interfaces for external collaborators.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the pipeline and the outside world. Adapters implement these ports.
//!
//! - `AIProvider` - classifier/generator capability
//! - `PatternStore` - row store for patterns, summaries and counters
//! - `ConversationReader` - read access to sessions and history

mod ai_provider;
mod conversation_reader;
mod pattern_store;

pub use ai_provider::{AIError, AIProvider, CompletionRequest, CompletionResponse, TokenUsage};
pub use conversation_reader::{ConversationReader, DomainHistory};
pub use pattern_store::{PatternStore, StoreError};
