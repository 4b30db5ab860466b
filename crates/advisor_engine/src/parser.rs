//! Best-effort extraction of structured data from raw LLM text.
//!
//! Never fails: a strict JSON parse is attempted first, then a lenient
//! field-by-field mapping, then regex extraction of course identifiers.
//! The result is always some [`ParsedResponse`], possibly empty.

use serde_json::Value;
use tracing::{info, warn};

use advisor_common::course::{CourseCatalog, COURSE_ID_SCAN_RE};
use advisor_common::response::MAX_RECOMMENDATIONS;

/// Match score assigned to recommendations synthesized from bare course
/// mentions in non-JSON text.
const EXTRACTED_MATCH_SCORE: f64 = 0.7;
/// Neutral response-level score when the model returned no usable JSON.
const NEUTRAL_MATCH_SCORE: f64 = 0.5;

/// One recommendation as the model produced it, before validation.
#[derive(Debug, Clone)]
pub struct RawRecommendation {
    pub course_id: String,
    pub title: Option<String>,
    pub justification: String,
    pub match_score: Option<f64>,
    pub prerequisites_met: bool,
    pub difficulty_appropriate: bool,
}

/// Loosely-typed pipeline-internal view of the model output. Field
/// validation happens in the output validator, not here.
#[derive(Debug, Clone, Default)]
pub struct ParsedResponse {
    pub recommendations: Vec<RawRecommendation>,
    pub overall_confidence: Option<f64>,
    pub justification: String,
    pub match_score: Option<f64>,
}

/// Locate the first balanced `{...}` substring, honoring JSON strings and
/// escapes so braces inside text do not break the scan.
fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match b {
            b'\\' if in_string => escaped = true,
            b'"' => in_string = !in_string,
            b'{' if !in_string => depth += 1,
            b'}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

fn value_to_recommendation(v: &Value) -> RawRecommendation {
    RawRecommendation {
        course_id: v
            .get("course_id")
            .and_then(|x| x.as_str())
            .unwrap_or_default()
            .to_string(),
        title: v
            .get("title")
            .and_then(|x| x.as_str())
            .map(|s| s.to_string()),
        justification: v
            .get("justification")
            .and_then(|x| x.as_str())
            .unwrap_or_default()
            .to_string(),
        match_score: v.get("match_score").and_then(|x| x.as_f64()),
        prerequisites_met: v
            .get("prerequisites_met")
            .and_then(|x| x.as_bool())
            .unwrap_or(true),
        difficulty_appropriate: v
            .get("difficulty_appropriate")
            .and_then(|x| x.as_bool())
            .unwrap_or(true),
    }
}

/// Map a decoded JSON value onto the response shape, tolerating missing
/// and null fields.
fn value_to_parsed(v: &Value) -> ParsedResponse {
    let recommendations = v
        .get("recommendations")
        .and_then(|r| r.as_array())
        .map(|arr| arr.iter().map(value_to_recommendation).collect())
        .unwrap_or_default();

    ParsedResponse {
        recommendations,
        overall_confidence: v.get("overall_confidence").and_then(|x| x.as_f64()),
        justification: v
            .get("justification")
            .and_then(|x| x.as_str())
            .unwrap_or_default()
            .to_string(),
        match_score: v.get("match_score").and_then(|x| x.as_f64()),
    }
}

/// Synthesize minimal recommendations from identifier-shaped tokens found
/// in free text. Only catalog-valid identifiers are kept, deduplicated in
/// order of first mention, at most [`MAX_RECOMMENDATIONS`].
fn extract_from_text(text: &str, catalog: &CourseCatalog) -> ParsedResponse {
    let mut recommendations = Vec::new();
    let mut seen = Vec::new();

    for m in COURSE_ID_SCAN_RE.find_iter(text) {
        if recommendations.len() >= MAX_RECOMMENDATIONS {
            break;
        }
        let code = m.as_str();
        if seen.contains(&code) {
            continue;
        }
        seen.push(code);

        if let Some(course) = catalog.get(code) {
            recommendations.push(RawRecommendation {
                course_id: code.to_string(),
                title: Some(course.title.clone()),
                justification: "Recommended based on content analysis".to_string(),
                match_score: Some(EXTRACTED_MATCH_SCORE),
                prerequisites_met: true,
                difficulty_appropriate: true,
            });
        }
    }

    ParsedResponse {
        recommendations,
        overall_confidence: None,
        justification: text.to_string(),
        match_score: Some(NEUTRAL_MATCH_SCORE),
    }
}

/// Parse raw LLM output. JSON first; on failure, pattern extraction
/// against the catalog. Total: always returns a response.
pub fn parse_response(raw_text: &str, catalog: &CourseCatalog) -> ParsedResponse {
    if let Some(json_text) = extract_json(raw_text) {
        match serde_json::from_str::<Value>(json_text) {
            Ok(v) => {
                info!("Parsed LLM response as JSON");
                return value_to_parsed(&v);
            }
            Err(e) => {
                warn!("JSON candidate did not decode ({}), using text extraction", e);
            }
        }
    }

    info!("No JSON found in LLM response, extracting course mentions");
    extract_from_text(raw_text, catalog)
}
