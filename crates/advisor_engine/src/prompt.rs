//! Prompt composition: query + context + confidence tier -> prompt pair.

use advisor_common::prompts::{
    ADVISOR_SYSTEM_PROMPT, FALLBACK_ADDENDUM, OUTPUT_CONSTRAINTS, RESPONSE_SCHEMA_EXAMPLE,
};
use advisor_common::ConfidenceTier;

/// System and user prompt for one LLM call.
#[derive(Debug, Clone)]
pub struct ComposedPrompt {
    pub system: String,
    pub user: String,
}

/// Build the structured recommendation prompt. The user prompt carries the
/// output schema, the grounding constraints, the query, the retrieved
/// context, and the tier; on the FALLBACK tier an addendum asks for
/// general guidance instead of invented courses.
pub fn compose_prompt(query: &str, context: &str, tier: ConfidenceTier) -> ComposedPrompt {
    let mut user = format!(
        "You are an expert course advisor. Provide course recommendations in the following JSON format:\n\n{schema}\n\n{constraints}\n\nSTUDENT QUERY: \"{query}\"\n\nAVAILABLE COURSES:\n{context}\n\nCONFIDENCE LEVEL: {tier}\n",
        schema = RESPONSE_SCHEMA_EXAMPLE,
        constraints = OUTPUT_CONSTRAINTS,
        query = query,
        context = context,
        tier = tier,
    );

    if tier == ConfidenceTier::Fallback {
        user.push_str("\n");
        user.push_str(FALLBACK_ADDENDUM);
        user.push_str("\n");
    }

    user.push_str("\nProvide your response as valid JSON only:");

    ComposedPrompt {
        system: ADVISOR_SYSTEM_PROMPT.to_string(),
        user,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_carries_query_context_and_tier() {
        let prompt = compose_prompt(
            "I want to learn machine learning",
            "RELEVANT COURSES FOUND:\n1. Machine Learning (CS301)",
            ConfidenceTier::High,
        );

        assert!(prompt.system.contains("course advisor"));
        assert!(prompt.user.contains("I want to learn machine learning"));
        assert!(prompt.user.contains("Machine Learning (CS301)"));
        assert!(prompt.user.contains("CONFIDENCE LEVEL: high"));
        assert!(prompt.user.contains("\"course_id\""));
        assert!(prompt.user.contains("ONLY use course IDs"));
        assert!(!prompt.user.contains("limited relevant"));
    }

    #[test]
    fn test_fallback_tier_appends_addendum() {
        let prompt = compose_prompt("quantum blockchain", "No relevant courses found.", ConfidenceTier::Fallback);
        assert!(prompt.user.contains("CONFIDENCE LEVEL: fallback"));
        assert!(prompt.user.contains("Do NOT invent courses"));
    }

    #[test]
    fn test_deterministic() {
        let a = compose_prompt("q", "ctx", ConfidenceTier::Medium);
        let b = compose_prompt("q", "ctx", ConfidenceTier::Medium);
        assert_eq!(a.user, b.user);
        assert_eq!(a.system, b.system);
    }
}
