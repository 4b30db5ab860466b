//! Pipeline configuration.
//!
//! Configuration lives in a TOML file; every field has a serde default so a
//! partial file (or no file at all) yields a working configuration.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::confidence::DEFAULT_SIMILARITY_THRESHOLD;
use crate::error::AdvisorError;

/// Retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalSettings {
    /// Number of candidates fetched from the vector index.
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Minimum max-similarity for a non-fallback answer.
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,

    /// Maximum candidates rendered into the prompt context block.
    #[serde(default = "default_max_context_courses")]
    pub max_context_courses: usize,
}

fn default_top_k() -> usize {
    5
}

fn default_similarity_threshold() -> f32 {
    DEFAULT_SIMILARITY_THRESHOLD
}

fn default_max_context_courses() -> usize {
    5
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            similarity_threshold: default_similarity_threshold(),
            max_context_courses: default_max_context_courses(),
        }
    }
}

/// Output validation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationSettings {
    /// Minimum overall confidence for accepting recommendations.
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
}

fn default_confidence_threshold() -> f64 {
    0.6
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            confidence_threshold: default_confidence_threshold(),
        }
    }
}

/// Chat-completion collaborator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    /// Base URL of an OpenAI-compatible API.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Low temperature keeps the JSON output consistent.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_chat_timeout")]
    pub request_timeout_secs: u64,
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_chat_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_tokens() -> u32 {
    1500
}

fn default_chat_timeout() -> u64 {
    120
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            api_key_env: default_api_key_env(),
            chat_model: default_chat_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            request_timeout_secs: default_chat_timeout(),
        }
    }
}

/// Embedding collaborator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    #[serde(default = "default_embedding_model")]
    pub model: String,

    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,

    #[serde(default = "default_embedding_timeout")]
    pub request_timeout_secs: u64,
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_embedding_dimension() -> usize {
    1536
}

fn default_embedding_timeout() -> u64 {
    30
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            dimension: default_embedding_dimension(),
            request_timeout_secs: default_embedding_timeout(),
        }
    }
}

/// Data file locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSettings {
    #[serde(default = "default_courses_file")]
    pub courses_file: String,

    /// Cached course embeddings, so the index can be rebuilt without
    /// re-calling the embedding provider.
    #[serde(default = "default_embeddings_file")]
    pub embeddings_file: String,
}

fn default_courses_file() -> String {
    "data/courses.json".to_string()
}

fn default_embeddings_file() -> String {
    "data/course_embeddings.json".to_string()
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            courses_file: default_courses_file(),
            embeddings_file: default_embeddings_file(),
        }
    }
}

/// Top-level advisor configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdvisorConfig {
    #[serde(default)]
    pub retrieval: RetrievalSettings,
    #[serde(default)]
    pub validation: ValidationSettings,
    #[serde(default)]
    pub llm: LlmSettings,
    #[serde(default)]
    pub embedding: EmbeddingSettings,
    #[serde(default)]
    pub data: DataSettings,
}

impl AdvisorConfig {
    /// Load configuration from a TOML file.
    pub fn load_from(path: &Path) -> Result<Self, AdvisorError> {
        let raw = fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|e| AdvisorError::Config(e.to_string()))
    }

    /// Load configuration, falling back to defaults when the file is
    /// missing or unreadable.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load_from(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Could not load config from {}: {}, using defaults", path.display(), e);
                Self::default()
            }
        }
    }
}
