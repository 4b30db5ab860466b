//! Confidence classification from retrieval similarity scores.
//!
//! Pure and total: the tier is derived only from the scores of one query's
//! retrieved candidates, with threshold rules applied in order.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Max-similarity floor for the HIGH tier.
pub const HIGH_MAX_SIMILARITY: f32 = 0.6;
/// Mean-similarity floor for the HIGH tier.
pub const HIGH_MEAN_SIMILARITY: f32 = 0.4;
/// Max-similarity floor for the MEDIUM tier.
pub const MEDIUM_MAX_SIMILARITY: f32 = 0.4;
/// Mean-similarity floor for the MEDIUM tier.
pub const MEDIUM_MEAN_SIMILARITY: f32 = 0.3;
/// Default max-similarity floor for the LOW tier (configurable).
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.3;

/// Discrete confidence bucket controlling how the pipeline hedges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
    Fallback,
}

impl ConfidenceTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceTier::High => "high",
            ConfidenceTier::Medium => "medium",
            ConfidenceTier::Low => "low",
            ConfidenceTier::Fallback => "fallback",
        }
    }

    /// Human-readable explanation used in reasoning traces.
    pub fn explanation(&self) -> &'static str {
        match self {
            ConfidenceTier::High => "Strong semantic match with multiple relevant courses",
            ConfidenceTier::Medium => "Good semantic match with some relevant courses",
            ConfidenceTier::Low => "Moderate semantic match, recommendations may be broad",
            ConfidenceTier::Fallback => "Limited semantic match, providing general guidance",
        }
    }
}

impl fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify similarity scores into a confidence tier. First match wins:
/// empty scores fall through to `Fallback`, then max/mean floors for
/// `High` and `Medium`, then `similarity_threshold` for `Low`.
pub fn classify_confidence(scores: &[f32], similarity_threshold: f32) -> ConfidenceTier {
    if scores.is_empty() {
        return ConfidenceTier::Fallback;
    }

    let max = scores.iter().copied().fold(f32::MIN, f32::max);
    let mean = scores.iter().sum::<f32>() / scores.len() as f32;

    if max >= HIGH_MAX_SIMILARITY && mean >= HIGH_MEAN_SIMILARITY {
        ConfidenceTier::High
    } else if max >= MEDIUM_MAX_SIMILARITY && mean >= MEDIUM_MEAN_SIMILARITY {
        ConfidenceTier::Medium
    } else if max >= similarity_threshold {
        ConfidenceTier::Low
    } else {
        ConfidenceTier::Fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_table() {
        assert_eq!(
            classify_confidence(&[], DEFAULT_SIMILARITY_THRESHOLD),
            ConfidenceTier::Fallback
        );
        assert_eq!(
            classify_confidence(&[0.65, 0.55], DEFAULT_SIMILARITY_THRESHOLD),
            ConfidenceTier::High
        );
        assert_eq!(
            classify_confidence(&[0.45, 0.35], DEFAULT_SIMILARITY_THRESHOLD),
            ConfidenceTier::Medium
        );
        assert_eq!(
            classify_confidence(&[0.35], DEFAULT_SIMILARITY_THRESHOLD),
            ConfidenceTier::Low
        );
        assert_eq!(
            classify_confidence(&[0.1], DEFAULT_SIMILARITY_THRESHOLD),
            ConfidenceTier::Fallback
        );
    }

    #[test]
    fn test_high_requires_both_floors() {
        // Max clears the HIGH floor but the mean does not.
        assert_eq!(
            classify_confidence(&[0.7, 0.05], DEFAULT_SIMILARITY_THRESHOLD),
            ConfidenceTier::Medium
        );
    }

    #[test]
    fn test_deterministic() {
        let scores = [0.82, 0.3];
        let first = classify_confidence(&scores, DEFAULT_SIMILARITY_THRESHOLD);
        for _ in 0..10 {
            assert_eq!(classify_confidence(&scores, DEFAULT_SIMILARITY_THRESHOLD), first);
        }
        assert_eq!(first, ConfidenceTier::High);
    }

    #[test]
    fn test_custom_threshold_widens_low() {
        assert_eq!(classify_confidence(&[0.25], 0.2), ConfidenceTier::Low);
        assert_eq!(classify_confidence(&[0.25], 0.3), ConfidenceTier::Fallback);
    }
}
