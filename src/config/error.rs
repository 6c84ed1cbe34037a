//! Configuration error types.

use thiserror::Error;

/// Errors raised while loading configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

/// Errors raised by semantic validation of loaded configuration.
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("no AI provider configured (set COACH_COMPASS__AI__ANTHROPIC_API_KEY)")]
    NoAiProviderConfigured,

    #[error("threshold '{name}' must be within [{min}, {max}], got {actual}")]
    ThresholdOutOfRange {
        name: &'static str,
        min: f32,
        max: f32,
        actual: f32,
    },

    #[error("domain switch threshold ({switch}) must be >= stay threshold ({stay})")]
    SwitchBelowStay { switch: f32, stay: f32 },
}
