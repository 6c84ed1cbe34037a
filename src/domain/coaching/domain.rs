//! Coaching domain enumeration and keyword tables.
//!
//! The domain set is closed: classifier output that names anything else is
//! coerced to [`CoachingDomain::General`], never propagated. Keyword tables
//! back the domain router's cheap shift-detection gate and stay
//! deliberately small; they only need to catch obvious topic mentions, the
//! classifier handles the rest.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A coaching topic category. `General` is the neutral fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoachingDomain {
    Career,
    Relationships,
    Health,
    Finances,
    PersonalGrowth,
    Family,
    Purpose,
    General,
}

impl CoachingDomain {
    /// All domains, fallback last.
    pub const ALL: [CoachingDomain; 8] = [
        CoachingDomain::Career,
        CoachingDomain::Relationships,
        CoachingDomain::Health,
        CoachingDomain::Finances,
        CoachingDomain::PersonalGrowth,
        CoachingDomain::Family,
        CoachingDomain::Purpose,
        CoachingDomain::General,
    ];

    /// Parses a classifier-emitted domain name.
    ///
    /// Returns `None` for anything outside the closed set; callers coerce
    /// to [`CoachingDomain::General`].
    pub fn parse_classifier(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "career" => Some(Self::Career),
            "relationships" => Some(Self::Relationships),
            "health" => Some(Self::Health),
            "finances" => Some(Self::Finances),
            "personal_growth" => Some(Self::PersonalGrowth),
            "family" => Some(Self::Family),
            "purpose" => Some(Self::Purpose),
            "general" => Some(Self::General),
            _ => None,
        }
    }

    /// Canonical lowercase name, as sent to and expected from the classifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Career => "career",
            Self::Relationships => "relationships",
            Self::Health => "health",
            Self::Finances => "finances",
            Self::PersonalGrowth => "personal_growth",
            Self::Family => "family",
            Self::Purpose => "purpose",
            Self::General => "general",
        }
    }

    /// Keywords that signal this domain in user text.
    ///
    /// `General` carries no keywords; it is never inferred from the gate.
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Self::Career => &[
                "job", "career", "boss", "manager", "coworker", "promotion",
                "interview", "resume", "workplace", "salary negotiation",
            ],
            Self::Relationships => &[
                "partner", "boyfriend", "girlfriend", "husband", "wife",
                "dating", "relationship", "breakup", "marriage",
            ],
            Self::Health => &[
                "sleep", "exercise", "workout", "diet", "doctor", "energy",
                "tired", "health", "weight",
            ],
            Self::Finances => &[
                "money", "debt", "budget", "savings", "invest", "rent",
                "mortgage", "paycheck", "spending",
            ],
            Self::PersonalGrowth => &[
                "habit", "confidence", "procrastinat", "discipline",
                "self-esteem", "mindset", "goal setting", "learning",
            ],
            Self::Family => &[
                "kids", "children", "parenting", "my mom", "my dad",
                "parents", "sibling", "in-laws", "family",
            ],
            Self::Purpose => &[
                "purpose", "meaning", "fulfillment", "calling", "legacy",
                "direction in life", "what i really want",
            ],
            Self::General => &[],
        }
    }

    /// Checks whether any of this domain's keywords appear in the text.
    ///
    /// Expects text already lowercased by the caller.
    pub fn mentioned_in(&self, text_lower: &str) -> bool {
        self.keywords().iter().any(|kw| text_lower.contains(kw))
    }
}

impl fmt::Display for CoachingDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
