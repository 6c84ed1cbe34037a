//! Pipeline threshold configuration.
//!
//! Every classifier-facing knob the pipeline recognizes, with the
//! documented defaults. Constructed once at process start and passed by
//! reference into each component.

use serde::Deserialize;

use super::error::ValidationError;

/// Confidence thresholds, session gates and cache policies.
#[derive(Debug, Clone, Deserialize)]
pub struct ThresholdConfig {
    /// Tier-2 crisis verdicts at or above this confidence count as a
    /// detected crisis. Deliberately below the classifier's own default
    /// decision boundary, to bias toward caution.
    #[serde(default = "default_crisis_confidence")]
    pub crisis_confidence: f32,

    /// Staying in the current domain requires at least this confidence.
    #[serde(default = "default_domain_stay")]
    pub domain_stay_confidence: f32,

    /// Switching to a different domain requires at least this confidence
    /// (hysteresis: higher than the stay threshold).
    #[serde(default = "default_domain_switch")]
    pub domain_switch_confidence: f32,

    /// Minimum confidence for a cross-domain pattern to be persisted.
    #[serde(default = "default_pattern_confidence")]
    pub pattern_confidence: f32,

    /// Minimum distinct domains for a pattern to count as cross-domain.
    #[serde(default = "default_pattern_min_domains")]
    pub pattern_min_domains: usize,

    /// Hours a synthesized pattern set stays fresh.
    #[serde(default = "default_pattern_ttl_hours")]
    pub pattern_ttl_hours: i64,

    /// Minimum qualifying messages for a domain to enter synthesis.
    #[serde(default = "default_synthesis_min_messages")]
    pub synthesis_min_messages: u32,

    /// Maximum conversations per domain fed to synthesis (cost containment).
    #[serde(default = "default_synthesis_max_conversations")]
    pub synthesis_max_conversations: usize,

    /// New conversations required before the same theme may resurface.
    #[serde(default = "default_resurface_gap")]
    pub resurface_conversation_gap: u32,

    /// Total sessions required before pattern summaries are generated.
    #[serde(default = "default_summary_min_sessions")]
    pub summary_min_sessions: u32,

    /// New sessions required before the summary cache is refreshed.
    #[serde(default = "default_summary_refresh_sessions")]
    pub summary_refresh_sessions: u32,

    /// Minimum occurrence count for a summary to be returned.
    #[serde(default = "default_summary_min_occurrence")]
    pub summary_min_occurrence: u32,

    /// Maximum summaries returned per user.
    #[serde(default = "default_summary_max_results")]
    pub summary_max_results: usize,
}

impl ThresholdConfig {
    /// Validate threshold configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (name, value) in [
            ("crisis_confidence", self.crisis_confidence),
            ("domain_stay_confidence", self.domain_stay_confidence),
            ("domain_switch_confidence", self.domain_switch_confidence),
            ("pattern_confidence", self.pattern_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ValidationError::ThresholdOutOfRange {
                    name,
                    min: 0.0,
                    max: 1.0,
                    actual: value,
                });
            }
        }

        if self.domain_switch_confidence < self.domain_stay_confidence {
            return Err(ValidationError::SwitchBelowStay {
                switch: self.domain_switch_confidence,
                stay: self.domain_stay_confidence,
            });
        }

        Ok(())
    }
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            crisis_confidence: default_crisis_confidence(),
            domain_stay_confidence: default_domain_stay(),
            domain_switch_confidence: default_domain_switch(),
            pattern_confidence: default_pattern_confidence(),
            pattern_min_domains: default_pattern_min_domains(),
            pattern_ttl_hours: default_pattern_ttl_hours(),
            synthesis_min_messages: default_synthesis_min_messages(),
            synthesis_max_conversations: default_synthesis_max_conversations(),
            resurface_conversation_gap: default_resurface_gap(),
            summary_min_sessions: default_summary_min_sessions(),
            summary_refresh_sessions: default_summary_refresh_sessions(),
            summary_min_occurrence: default_summary_min_occurrence(),
            summary_max_results: default_summary_max_results(),
        }
    }
}

fn default_crisis_confidence() -> f32 {
    0.6
}

fn default_domain_stay() -> f32 {
    0.7
}

fn default_domain_switch() -> f32 {
    0.85
}

fn default_pattern_confidence() -> f32 {
    0.85
}

fn default_pattern_min_domains() -> usize {
    2
}

fn default_pattern_ttl_hours() -> i64 {
    24
}

fn default_synthesis_min_messages() -> u32 {
    3
}

fn default_synthesis_max_conversations() -> usize {
    10
}

fn default_resurface_gap() -> u32 {
    3
}

fn default_summary_min_sessions() -> u32 {
    5
}

fn default_summary_refresh_sessions() -> u32 {
    3
}

fn default_summary_min_occurrence() -> u32 {
    3
}

fn default_summary_max_results() -> usize {
    3
}
