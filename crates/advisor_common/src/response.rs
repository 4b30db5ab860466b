//! Validated recommendation output returned to callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::course::CourseId;

/// Minimum length for a per-course justification.
pub const MIN_JUSTIFICATION_CHARS: usize = 50;
/// Minimum length for the response-level justification.
pub const MIN_OVERALL_JUSTIFICATION_CHARS: usize = 100;
/// Maximum number of recommendations returned for one query.
pub const MAX_RECOMMENDATIONS: usize = 5;

/// A single validated course recommendation.
///
/// Invariants (enforced by the output validator): the course id exists in
/// the catalog the pipeline was built against, the justification is at
/// least [`MIN_JUSTIFICATION_CHARS`] long, and the match score is in [0,1].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub course_id: CourseId,
    pub title: String,
    pub justification: String,
    pub match_score: f64,
    pub prerequisites_met: bool,
    pub difficulty_appropriate: bool,
}

/// The unit returned to callers: constructed once per query, immutable
/// once returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatedResponse {
    /// Original student query.
    pub query: String,
    /// Accepted recommendations, at most [`MAX_RECOMMENDATIONS`].
    pub recommendations: Vec<Recommendation>,
    /// Overall confidence in [0,1].
    pub overall_confidence: f64,
    /// Response-level reasoning, at least
    /// [`MIN_OVERALL_JUSTIFICATION_CHARS`] long.
    pub justification: String,
    /// Overall match quality in [0,1].
    pub match_score: f64,
    /// Whether the fallback synthesizer produced this response.
    pub fallback_triggered: bool,
    /// Whether every validation step passed.
    pub validation_passed: bool,
    /// Warnings accumulated while filtering and scoring.
    pub warnings: Vec<String>,
    /// Additional bookkeeping (counts, reasoning trace, request id).
    #[serde(default)]
    pub metadata: Map<String, Value>,
    pub generated_at: DateTime<Utc>,
}

impl ValidatedResponse {
    /// Insert a metadata entry, replacing any previous value for the key.
    pub fn with_metadata(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::course::CourseId;

    #[test]
    fn test_response_serializes_with_metadata() {
        let mut response = ValidatedResponse {
            query: "I like AI".to_string(),
            recommendations: vec![Recommendation {
                course_id: CourseId::parse("CS301").unwrap(),
                title: "Machine Learning".to_string(),
                justification: "Covers supervised and unsupervised learning with practical neural network projects.".to_string(),
                match_score: 0.85,
                prerequisites_met: true,
                difficulty_appropriate: true,
            }],
            overall_confidence: 0.85,
            justification: "x".repeat(MIN_OVERALL_JUSTIFICATION_CHARS),
            match_score: 0.85,
            fallback_triggered: false,
            validation_passed: true,
            warnings: vec![],
            metadata: Map::new(),
            generated_at: Utc::now(),
        };
        response
            .metadata
            .insert("validation_level".to_string(), Value::from("strict"));

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["recommendations"][0]["course_id"], "CS301");
        assert_eq!(json["metadata"]["validation_level"], "strict");
        assert_eq!(json["fallback_triggered"], false);
    }
}
