//! Pure model-routing logic: risk scoring, tier selection and token
//! budget enforcement. No I/O anywhere in this module.

pub mod budget;
pub mod risk;
mod selection;

pub use selection::{
    background_model, safety_model, select_chat_model, BackgroundTask, DomainResult,
    ModelSelection, ModelTierSet, RouteTier, SessionMode, TierSettings,
};
