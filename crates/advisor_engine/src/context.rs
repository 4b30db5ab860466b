//! Context block formatting for prompt injection.

use advisor_common::course::RetrievedCandidate;

/// Sentinel emitted when retrieval produced nothing.
pub const NO_RELEVANT_COURSES: &str = "No relevant courses found.";

/// Format retrieved candidates into the bounded context block injected
/// into the prompt. Deterministic: identical inputs yield identical text.
pub fn build_context(candidates: &[RetrievedCandidate], max_items: usize) -> String {
    if candidates.is_empty() {
        return NO_RELEVANT_COURSES.to_string();
    }

    let mut parts = vec!["RELEVANT COURSES FOUND:".to_string()];

    for (i, candidate) in candidates.iter().take(max_items).enumerate() {
        let course = &candidate.course;
        parts.push(format!(
            "\n{}. {} ({})\n   - Description: {}\n   - Credits: {} | Difficulty: {}/5\n   - Category: {} | Semester: {}\n   - Prerequisites: {}\n   - Relevance Score: {:.3}\n",
            i + 1,
            course.title,
            course.code,
            course.description,
            course.credits,
            course.difficulty,
            course.category,
            course.semester,
            course.prerequisites_display(),
            candidate.similarity,
        ));
    }

    parts.join("\n")
}
