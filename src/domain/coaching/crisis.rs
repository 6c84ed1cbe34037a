//! Crisis classification types and phrase tables.
//!
//! Tier 1 of the crisis detector scans these fixed phrase lists; the first
//! match short-circuits with high confidence and the matching sub-list's
//! category. The ambiguity list triggers the tier-2 classifier call.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::Confidence;

/// Closed classification of safety-relevant distress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrisisCategory {
    SelfHarm,
    SuicidalIdeation,
    Abuse,
    SevereDistress,
    None,
}

impl CrisisCategory {
    /// Parses a classifier-emitted category name.
    ///
    /// Returns `None` for anything outside the closed set.
    pub fn parse_classifier(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "self_harm" => Some(Self::SelfHarm),
            "suicidal_ideation" => Some(Self::SuicidalIdeation),
            "abuse" => Some(Self::Abuse),
            "severe_distress" => Some(Self::SevereDistress),
            "none" => Some(Self::None),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SelfHarm => "self_harm",
            Self::SuicidalIdeation => "suicidal_ideation",
            Self::Abuse => "abuse",
            Self::SevereDistress => "severe_distress",
            Self::None => "none",
        }
    }
}

impl fmt::Display for CrisisCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of crisis detection for one message. Ephemeral, never persisted
/// by this subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrisisDetectionResult {
    pub crisis_detected: bool,
    pub confidence: Confidence,
    pub indicators: Vec<String>,
    pub category: CrisisCategory,
}

impl CrisisDetectionResult {
    /// The safe default: no crisis, zero confidence.
    ///
    /// Returned on every internal failure so the detector never blocks the
    /// coaching flow.
    pub fn none() -> Self {
        Self {
            crisis_detected: false,
            confidence: Confidence::zero(),
            indicators: Vec::new(),
            category: CrisisCategory::None,
        }
    }

    /// A tier-1 keyword match with the fixed fast-path confidence.
    pub fn keyword_match(category: CrisisCategory, indicator: impl Into<String>) -> Self {
        Self {
            crisis_detected: true,
            confidence: Confidence::new(0.9).expect("fixed fast-path confidence"),
            indicators: vec![indicator.into()],
            category,
        }
    }
}

/// Tier-1 phrase sub-lists, scanned in order. First match wins.
pub static TIER_ONE_PHRASES: Lazy<Vec<(CrisisCategory, &'static [&'static str])>> =
    Lazy::new(|| {
        vec![
            (
                CrisisCategory::SelfHarm,
                &[
                    "kill myself",
                    "hurt myself",
                    "cut myself",
                    "harm myself",
                    "self-harm",
                    "self harm",
                ][..],
            ),
            (
                CrisisCategory::SuicidalIdeation,
                &[
                    "want to die",
                    "end my life",
                    "suicide",
                    "suicidal",
                    "better off dead",
                    "no reason to live",
                    "don't want to be here anymore",
                ][..],
            ),
            (
                CrisisCategory::Abuse,
                &[
                    "he hits me",
                    "she hits me",
                    "they hit me",
                    "being abused",
                    "abusing me",
                    "afraid of my partner",
                    "afraid to go home",
                ][..],
            ),
        ]
    });

/// Broader ambiguity phrases that trigger the tier-2 classifier call.
pub static AMBIGUITY_PHRASES: &[&str] = &[
    "hopeless",
    "can't go on",
    "no point",
    "pointless",
    "worthless",
    "give up",
    "giving up",
    "empty inside",
    "what's the point",
    "can't take it",
    "can't do this anymore",
    "numb",
    "nothing matters",
];

/// Scans the tier-1 lists; returns the matched category and phrase.
///
/// Case-insensitive substring match, first match short-circuits.
pub fn scan_tier_one(message: &str) -> Option<(CrisisCategory, &'static str)> {
    let lower = message.to_lowercase();
    for (category, phrases) in TIER_ONE_PHRASES.iter() {
        for phrase in *phrases {
            if lower.contains(phrase) {
                return Some((*category, phrase));
            }
        }
    }
    None
}

/// Checks whether the text contains any ambiguity phrase.
pub fn contains_ambiguity_phrase(text: &str) -> bool {
    let lower = text.to_lowercase();
    AMBIGUITY_PHRASES.iter().any(|p| lower.contains(p))
}
