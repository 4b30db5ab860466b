//! Output guardrails: catalog membership, hallucination filtering,
//! structural constraints, confidence scoring, and the fallback decision.
//!
//! One response moves through FILTER -> SCORE -> DECISION; the result is
//! either an accepted `ValidatedResponse` or the fallback synthesizer's
//! output with the filtering history preserved.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{Map, Value};
use tracing::{info, warn};

use advisor_common::course::{CourseCatalog, COURSE_ID_RE, COURSE_ID_SCAN_RE};
use advisor_common::response::{
    Recommendation, ValidatedResponse, MAX_RECOMMENDATIONS, MIN_JUSTIFICATION_CHARS,
    MIN_OVERALL_JUSTIFICATION_CHARS,
};

use crate::fallback;
use crate::parser::ParsedResponse;

/// Phrases that flag an unrealistic claim in model output. A match adds a
/// warning but does not by itself reject the recommendation.
pub const UNREALISTIC_CLAIMS: &[&str] = &[
    "100% guaranteed",
    "perfect course",
    "never fails",
    "instant expertise",
    "no prerequisites needed",
];

/// Allowed spread between the stated overall confidence and the mean of
/// the individual match scores before a consistency warning is raised.
const CONFIDENCE_CONSISTENCY_SPREAD: f64 = 0.3;

/// Validates course identifiers and free text against the catalog.
pub struct CourseValidator {
    catalog: Arc<CourseCatalog>,
}

impl CourseValidator {
    pub fn new(catalog: Arc<CourseCatalog>) -> Self {
        info!("Initialized CourseValidator with {} valid courses", catalog.len());
        Self { catalog }
    }

    pub fn catalog(&self) -> &CourseCatalog {
        &self.catalog
    }

    /// Accept only identifiers present in the catalog.
    pub fn validate_course_id(&self, course_id: &str) -> Result<(), String> {
        if !COURSE_ID_RE.is_match(course_id) {
            return Err(format!(
                "Course ID '{}' must follow a format like 'CS101' or 'MATH301'",
                course_id
            ));
        }
        if !self.catalog.contains(course_id) {
            return Err(format!("Course ID '{}' not found in valid courses", course_id));
        }
        Ok(())
    }

    /// Scan free text for hallucinated identifiers and unrealistic claims.
    pub fn detect_hallucinated_content(&self, text: &str) -> Vec<String> {
        let mut issues = Vec::new();

        for m in COURSE_ID_SCAN_RE.find_iter(text) {
            let code = m.as_str();
            if !self.catalog.contains(code) {
                issues.push(format!("Potential hallucinated course ID: {}", code));
            }
        }

        let lowered = text.to_lowercase();
        for phrase in UNREALISTIC_CLAIMS {
            if lowered.contains(phrase) {
                issues.push(format!("Potentially unrealistic claim detected: {}", phrase));
            }
        }

        issues
    }
}

/// The complete output validation step, parameterized by the confidence
/// threshold below which the fallback synthesizer takes over.
pub struct OutputValidator {
    course_validator: CourseValidator,
    confidence_threshold: f64,
}

impl OutputValidator {
    pub fn new(catalog: Arc<CourseCatalog>, confidence_threshold: f64) -> Self {
        info!(
            "Initialized OutputValidator with confidence threshold: {}",
            confidence_threshold
        );
        Self {
            course_validator: CourseValidator::new(catalog),
            confidence_threshold,
        }
    }

    pub fn confidence_threshold(&self) -> f64 {
        self.confidence_threshold
    }

    pub fn course_validator(&self) -> &CourseValidator {
        &self.course_validator
    }

    /// Validate a parsed response against the catalog and constraints,
    /// using this validator's configured threshold.
    pub fn validate(&self, parsed: ParsedResponse, query: &str) -> ValidatedResponse {
        self.validate_with_threshold(parsed, query, self.confidence_threshold)
    }

    /// Validate with an explicit per-call confidence threshold.
    pub fn validate_with_threshold(
        &self,
        parsed: ParsedResponse,
        query: &str,
        confidence_threshold: f64,
    ) -> ValidatedResponse {
        let mut warnings: Vec<String> = Vec::new();
        let mut validation_passed = true;
        let original_count = parsed.recommendations.len();

        // FILTER: per-candidate catalog membership, structural constraints,
        // hallucination scan, justification floor.
        let mut accepted: Vec<Recommendation> = Vec::new();
        for raw in &parsed.recommendations {
            if let Err(reason) = self.course_validator.validate_course_id(&raw.course_id) {
                warnings.push(format!("Invalid course ID filtered: {}", raw.course_id));
                warn!("{}", reason);
                validation_passed = false;
                continue;
            }

            let match_score = raw.match_score.unwrap_or(0.5);
            if !(0.0..=1.0).contains(&match_score) {
                warnings.push(format!(
                    "Recommendation validation failed: match score {} for {} is out of [0,1]",
                    match_score, raw.course_id
                ));
                validation_passed = false;
                continue;
            }

            warnings.extend(
                self.course_validator
                    .detect_hallucinated_content(&raw.justification),
            );

            // Lenient policy: a too-short justification is extended with a
            // generic sentence instead of rejected.
            let justification = if raw.justification.len() >= MIN_JUSTIFICATION_CHARS {
                raw.justification.clone()
            } else {
                format!(
                    "Recommended course for your interests: {}. This course provides valuable \
                     knowledge and skills.",
                    raw.justification
                )
            };

            // Title comes from the catalog, not from the model.
            let Some(course) = self.course_validator.catalog().get(&raw.course_id) else {
                continue;
            };

            if accepted.len() >= MAX_RECOMMENDATIONS {
                warnings.push(format!(
                    "Recommendation limit reached, dropping extra entry: {}",
                    raw.course_id
                ));
                continue;
            }

            accepted.push(Recommendation {
                course_id: course.code.clone(),
                title: course.title.clone(),
                justification,
                match_score,
                prerequisites_met: raw.prerequisites_met,
                difficulty_appropriate: raw.difficulty_appropriate,
            });
        }

        // SCORE: overall confidence from the response, else the mean of the
        // accepted match scores, else zero.
        let mean_score = if accepted.is_empty() {
            None
        } else {
            Some(accepted.iter().map(|r| r.match_score).sum::<f64>() / accepted.len() as f64)
        };

        let mut overall_confidence = parsed
            .overall_confidence
            .or(mean_score)
            .unwrap_or(0.0);
        if !(0.0..=1.0).contains(&overall_confidence) {
            warnings.push(format!(
                "Overall confidence {} out of [0,1], clamping",
                overall_confidence
            ));
            overall_confidence = overall_confidence.clamp(0.0, 1.0);
        }

        if let Some(mean) = mean_score {
            if (overall_confidence - mean).abs() > CONFIDENCE_CONSISTENCY_SPREAD {
                // Warn, do not reject: the stated confidence disagrees with
                // the individual scores but the recommendations themselves
                // passed every check.
                warnings.push(format!(
                    "Overall confidence {:.2} inconsistent with mean match score {:.2}",
                    overall_confidence, mean
                ));
            }
        }

        let mut match_score = parsed.match_score.unwrap_or(overall_confidence);
        if !(0.0..=1.0).contains(&match_score) {
            warnings.push(format!("Match score {} out of [0,1], clamping", match_score));
            match_score = match_score.clamp(0.0, 1.0);
        }

        // DECISION: low confidence, nothing accepted, or a structural
        // failure all route to the synthesizer.
        let fallback_triggered = overall_confidence < confidence_threshold
            || accepted.is_empty()
            || !validation_passed;

        if fallback_triggered {
            let reason = if !validation_passed {
                "structural validation failed".to_string()
            } else if accepted.is_empty() {
                "no valid recommendations after filtering".to_string()
            } else {
                format!(
                    "confidence {:.2} below threshold {:.2}",
                    overall_confidence, confidence_threshold
                )
            };
            info!("Validation fell back: {}", reason);

            let mut response = fallback::synthesize(query, &reason);
            // Filtering history is preserved ahead of the fallback notice.
            warnings.extend(response.warnings.drain(..));
            response.warnings = warnings;
            response
                .metadata
                .insert("original_recommendation_count".to_string(), Value::from(original_count));
            response
                .metadata
                .insert("filtered_recommendation_count".to_string(), Value::from(0));
            return response;
        }

        // ACCEPT: pad the overall justification to its floor and assemble
        // the final response.
        let base_justification = if parsed.justification.trim().is_empty() {
            "No specific justification provided".to_string()
        } else {
            parsed.justification.clone()
        };
        let justification = if base_justification.len() >= MIN_OVERALL_JUSTIFICATION_CHARS {
            base_justification
        } else {
            format!(
                "{}. Based on the analysis of your query and available courses, these \
                 recommendations aim to provide relevant learning opportunities that align \
                 with your stated interests and academic goals.",
                base_justification
            )
        };

        let filtered_count = accepted.len();
        info!("Validation complete: {} valid recommendations", filtered_count);

        let mut metadata = Map::new();
        metadata.insert(
            "original_recommendation_count".to_string(),
            Value::from(original_count),
        );
        metadata.insert(
            "filtered_recommendation_count".to_string(),
            Value::from(filtered_count),
        );
        metadata.insert("validation_level".to_string(), Value::from("strict"));

        ValidatedResponse {
            query: query.to_string(),
            recommendations: accepted,
            overall_confidence,
            justification,
            match_score,
            fallback_triggered: false,
            validation_passed: true,
            warnings,
            metadata,
            generated_at: Utc::now(),
        }
    }
}
