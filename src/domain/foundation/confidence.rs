//! Confidence value object, closed over [0.0, 1.0].

use serde::{Deserialize, Serialize};

use super::ValidationError;

/// A classifier confidence score, guaranteed to lie in [0.0, 1.0].
///
/// Construction is strict: out-of-range or non-finite values are rejected.
/// Components that must coerce out-of-range classifier output do so
/// explicitly (e.g. the domain router coerces to [`Confidence::midpoint`])
/// rather than silently clamping here.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Confidence(f32);

impl Confidence {
    /// Creates a confidence score, rejecting values outside [0.0, 1.0].
    pub fn new(value: f32) -> Result<Self, ValidationError> {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(ValidationError::out_of_range(
                "confidence",
                0.0,
                1.0,
                value as f64,
            ));
        }
        Ok(Self(value))
    }

    /// Zero confidence, the safe default on any failure.
    pub fn zero() -> Self {
        Self(0.0)
    }

    /// The neutral midpoint (0.5), used when coercing out-of-range
    /// classifier output.
    pub fn midpoint() -> Self {
        Self(0.5)
    }

    /// Full confidence.
    pub fn certain() -> Self {
        Self(1.0)
    }

    /// Returns the inner value.
    pub fn value(&self) -> f32 {
        self.0
    }

    /// Checks whether this confidence meets a threshold.
    pub fn at_least(&self, threshold: f32) -> bool {
        self.0 >= threshold
    }
}

impl Default for Confidence {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}
