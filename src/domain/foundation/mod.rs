//! Foundation value objects shared across the pipeline.

mod confidence;
mod errors;
mod ids;
mod timestamp;

pub use confidence::Confidence;
pub use errors::ValidationError;
pub use ids::{ConversationId, SessionId, UserId};
pub use timestamp::Timestamp;
