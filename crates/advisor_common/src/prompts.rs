//! Prompt text for the recommendation LLM call.
//!
//! The composer in `advisor_engine` stitches these together with the query,
//! the retrieved context block, and the confidence tier.

/// System message: pins the advisor role and the JSON output contract.
pub const ADVISOR_SYSTEM_PROMPT: &str = "You are a course advisor. Always respond with valid \
JSON containing course recommendations with required fields: course_id, title, justification, \
and match_score.";

/// The JSON shape the model must produce.
pub const RESPONSE_SCHEMA_EXAMPLE: &str = r#"{
  "recommendations": [
    {
      "course_id": "CS101",
      "title": "Course Title",
      "justification": "Detailed explanation of why this course is recommended (minimum 50 characters)",
      "match_score": 0.85,
      "prerequisites_met": true,
      "difficulty_appropriate": true
    }
  ],
  "overall_confidence": 0.80,
  "justification": "Overall reasoning for these recommendations (minimum 100 characters)",
  "match_score": 0.80
}"#;

/// Hard constraints appended after the schema.
pub const OUTPUT_CONSTRAINTS: &str = "IMPORTANT CONSTRAINTS:
- ONLY use course IDs that appear in the AVAILABLE COURSES context below
- Each justification must be at least 50 characters and specific to the course
- Match scores must be between 0.0 and 1.0
- Be honest about confidence levels
- If unsure, use lower match scores";

/// Appended when the confidence tier is FALLBACK: ask for general guidance
/// instead of invented courses.
pub const FALLBACK_ADDENDUM: &str = "NOTE: The similarity search returned limited relevant \
results. Acknowledge the low relevance and provide general, non-specific guidance. Do NOT \
invent courses; suggest the student refine their query with more specific interests, explore \
course categories that might align with their goals, and consider speaking with an academic \
advisor for personalized guidance.";
