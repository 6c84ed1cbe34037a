//! Application configuration module
//!
//! Type-safe configuration loading from environment variables using the
//! `config` and `dotenvy` crates. Configuration is loaded with the
//! `COACH_COMPASS` prefix and nested values use double underscores as
//! separators. The lifecycle is load-once, read-many: construct one
//! [`AppConfig`] at process start and pass it by reference into each
//! component; call [`AppConfig::reload`] explicitly when settings change.
//!
//! # Example
//!
//! ```no_run
//! use coach_compass::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod ai;
mod error;
mod thresholds;

pub use ai::AiConfig;
pub use error::{ConfigError, ValidationError};
pub use thresholds::ThresholdConfig;

use serde::Deserialize;

use crate::domain::routing::ModelTierSet;

/// Root application configuration
///
/// Contains all configuration sections for the decision pipeline. Load
/// using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// AI provider configuration (API key, timeouts)
    #[serde(default)]
    pub ai: AiConfig,

    /// Pipeline thresholds and cache policies
    #[serde(default)]
    pub thresholds: ThresholdConfig,

    /// Per-tier model settings for the model router
    #[serde(default)]
    pub tiers: ModelTierSet,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with the `COACH_COMPASS` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    ///
    /// # Environment Variable Format
    ///
    /// - `COACH_COMPASS__AI__ANTHROPIC_API_KEY=...` -> `ai.anthropic_api_key`
    /// - `COACH_COMPASS__THRESHOLDS__CRISIS_CONFIDENCE=0.6`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into the expected
    /// types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("COACH_COMPASS")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Re-reads configuration from the environment in place.
    ///
    /// Explicit replacement for implicit module-level initialization; the
    /// previous values stay untouched if loading fails.
    pub fn reload(&mut self) -> Result<(), ConfigError> {
        *self = Self::load()?;
        Ok(())
    }

    /// Validate all configuration values
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.ai.validate()?;
        self.thresholds.validate()?;
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ai: AiConfig::default(),
            thresholds: ThresholdConfig::default(),
            tiers: ModelTierSet::default(),
        }
    }
}
