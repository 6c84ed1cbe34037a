//! Coaching data model: closed domain and crisis enumerations, pattern
//! value objects and the phrase tables behind the heuristic fast paths.

mod crisis;
mod domain;
mod message;
mod patterns;

pub use crisis::{
    contains_ambiguity_phrase, scan_tier_one, CrisisCategory, CrisisDetectionResult,
    AMBIGUITY_PHRASES, TIER_ONE_PHRASES,
};
pub use domain::CoachingDomain;
pub use message::{ChatMessage, ChatRole};
pub use patterns::{
    CachedPatternSet, CachedSummaries, CrossDomainPattern, PatternEvidence, PatternSummary,
};
