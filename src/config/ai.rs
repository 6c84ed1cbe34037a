//! AI provider configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// AI provider configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// Anthropic API key
    pub anthropic_api_key: Option<String>,

    /// Base URL for the API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds (full classifier call budget)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Elapsed seconds beyond which a classifier call is logged as an
    /// anomaly, well below the hard timeout
    #[serde(default = "default_slow_call_warn")]
    pub slow_call_warn_secs: u64,

    /// Maximum retries on transient failure
    #[serde(default = "default_retries")]
    pub max_retries: u32,
}

impl AiConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get the slow-call anomaly threshold as Duration
    pub fn slow_call_warn(&self) -> Duration {
        Duration::from_secs(self.slow_call_warn_secs)
    }

    /// Check if an API key is configured
    pub fn has_api_key(&self) -> bool {
        self.anthropic_api_key
            .as_ref()
            .is_some_and(|k| !k.is_empty())
    }

    /// Validate AI configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.has_api_key() {
            return Err(ValidationError::NoAiProviderConfigured);
        }
        Ok(())
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            anthropic_api_key: None,
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            slow_call_warn_secs: default_slow_call_warn(),
            max_retries: default_retries(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_slow_call_warn() -> u64 {
    3
}

fn default_retries() -> u32 {
    3
}
