//! The guarded RAG pipeline.
//!
//! query -> retrieve -> classify confidence -> build context -> compose
//! prompt -> LLM -> parse -> validate -> accepted response or fallback.
//!
//! Only an invalid query crosses this boundary as an error. Retrieval and
//! gateway failures are absorbed into a fallback response, so callers
//! always see a well-formed `ValidatedResponse`.
//!
//! The catalog and the embedded index are shared immutably across
//! concurrent queries; every per-query intermediate (candidates, tier,
//! context, prompt, parsed output) is local to one call. Reloading the
//! catalog means building a fresh pipeline from a new snapshot.

use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info};
use uuid::Uuid;

use advisor_common::course::{CourseCatalog, RetrievedCandidate};
use advisor_common::{classify_confidence, AdvisorConfig, AdvisorError, ConfidenceTier, ValidatedResponse};

use crate::context::build_context;
use crate::embedding::EmbeddingProvider;
use crate::fallback;
use crate::llm::LlmGateway;
use crate::parser::parse_response;
use crate::prompt::compose_prompt;
use crate::retriever::Retriever;
use crate::store::CourseStore;
use crate::validator::OutputValidator;

/// One fully-wired recommendation pipeline over a catalog snapshot.
pub struct AdvisorPipeline {
    catalog: Arc<CourseCatalog>,
    retriever: Retriever,
    gateway: Arc<dyn LlmGateway>,
    validator: OutputValidator,
    config: AdvisorConfig,
}

impl AdvisorPipeline {
    /// Load the catalog from a store, embed it, and wire the pipeline.
    pub async fn build(
        config: AdvisorConfig,
        store: &dyn CourseStore,
        embedder: Arc<dyn EmbeddingProvider>,
        gateway: Arc<dyn LlmGateway>,
    ) -> Result<Self, AdvisorError> {
        let courses = store.load()?;
        Self::from_courses(config, courses, embedder, gateway).await
    }

    /// Like [`AdvisorPipeline::build`], but restore course embeddings from
    /// the configured cache file when possible. A missing or stale cache
    /// falls back to a fresh indexing pass, whose result is then cached.
    pub async fn build_with_embedding_cache(
        config: AdvisorConfig,
        store: &dyn CourseStore,
        embedder: Arc<dyn EmbeddingProvider>,
        gateway: Arc<dyn LlmGateway>,
    ) -> Result<Self, AdvisorError> {
        let courses = store.load()?;
        let catalog = Arc::new(CourseCatalog::new(courses)?);
        let mut retriever = Retriever::new(embedder, Arc::clone(&catalog));

        let cache_path = Path::new(&config.data.embeddings_file).to_path_buf();
        match retriever.load_embeddings(&cache_path, &config.embedding.model) {
            Ok(()) => info!("Reusing cached course embeddings from {}", cache_path.display()),
            Err(e) => {
                info!("Embedding cache unusable ({}), indexing catalog", e);
                retriever.index_catalog().await?;
                if let Err(e) = retriever.save_embeddings(&cache_path, &config.embedding.model) {
                    error!("Could not cache course embeddings: {}", e);
                }
            }
        }

        let validator =
            OutputValidator::new(Arc::clone(&catalog), config.validation.confidence_threshold);

        info!("Initialized AdvisorPipeline with {} courses", catalog.len());
        Ok(Self {
            catalog,
            retriever,
            gateway,
            validator,
            config,
        })
    }

    /// Wire the pipeline from an already-loaded course list.
    pub async fn from_courses(
        config: AdvisorConfig,
        courses: Vec<advisor_common::Course>,
        embedder: Arc<dyn EmbeddingProvider>,
        gateway: Arc<dyn LlmGateway>,
    ) -> Result<Self, AdvisorError> {
        let catalog = Arc::new(CourseCatalog::new(courses)?);
        let mut retriever = Retriever::new(embedder, Arc::clone(&catalog));
        retriever.index_catalog().await?;

        let validator =
            OutputValidator::new(Arc::clone(&catalog), config.validation.confidence_threshold);

        info!("Initialized AdvisorPipeline with {} courses", catalog.len());
        Ok(Self {
            catalog,
            retriever,
            gateway,
            validator,
            config,
        })
    }

    pub fn catalog(&self) -> &CourseCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &AdvisorConfig {
        &self.config
    }

    /// Cache the course embeddings for reuse across restarts.
    pub fn save_embeddings(&self, path: &Path) -> Result<(), AdvisorError> {
        self.retriever.save_embeddings(path, &self.config.embedding.model)
    }

    /// Process a query using the configured confidence threshold.
    pub async fn process_query(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<ValidatedResponse, AdvisorError> {
        self.process_query_with_threshold(query, top_k, self.config.validation.confidence_threshold)
            .await
    }

    /// Process a query with an explicit confidence threshold override.
    pub async fn process_query_with_threshold(
        &self,
        query: &str,
        top_k: usize,
        confidence_threshold: f64,
    ) -> Result<ValidatedResponse, AdvisorError> {
        let request_id = Uuid::new_v4();
        info!("[{}] Processing query: '{}'", request_id, query);

        // Retrieval. A blank query is a caller bug and propagates; any
        // other failure short-circuits to the synthesizer.
        let candidates = match self.retriever.retrieve(query, top_k).await {
            Ok(candidates) => candidates,
            Err(AdvisorError::InvalidQuery(msg)) => {
                return Err(AdvisorError::InvalidQuery(msg));
            }
            Err(AdvisorError::Retrieval(cause)) => {
                error!("[{}] Retrieval failed: {}", request_id, cause);
                let reason = format!("retrieval failure: {}", cause);
                return Ok(self.annotate(fallback::synthesize(query, &reason), request_id, None, &[]));
            }
            Err(e) => {
                error!("[{}] Retrieval failed: {}", request_id, e);
                let reason = format!("retrieval failure: {}", e);
                return Ok(self.annotate(fallback::synthesize(query, &reason), request_id, None, &[]));
            }
        };

        let scores: Vec<f32> = candidates.iter().map(|c| c.similarity).collect();
        let tier = classify_confidence(&scores, self.config.retrieval.similarity_threshold);
        info!("[{}] Confidence tier: {}", request_id, tier);

        let context = build_context(&candidates, self.config.retrieval.max_context_courses);
        let prompt = compose_prompt(query, &context, tier);

        let raw_text = match self.gateway.complete(&prompt.system, &prompt.user).await {
            Ok(text) => text,
            Err(e) => {
                error!("[{}] LLM call failed: {}", request_id, e);
                let reason = format!("llm failure: {}", e);
                return Ok(self.annotate(
                    fallback::synthesize(query, &reason),
                    request_id,
                    Some(tier),
                    &candidates,
                ));
            }
        };

        let parsed = parse_response(&raw_text, &self.catalog);
        let response =
            self.validator
                .validate_with_threshold(parsed, query, confidence_threshold);

        info!(
            "[{}] Pipeline complete: fallback={}, {} recommendations",
            request_id,
            response.fallback_triggered,
            response.recommendations.len()
        );
        Ok(self.annotate(response, request_id, Some(tier), &candidates))
    }

    /// Attach the per-request bookkeeping callers and operators rely on:
    /// request id, tier, retrieval order, and the reasoning trace.
    fn annotate(
        &self,
        mut response: ValidatedResponse,
        request_id: Uuid,
        tier: Option<ConfidenceTier>,
        candidates: &[RetrievedCandidate],
    ) -> ValidatedResponse {
        let scores: Vec<f32> = candidates.iter().map(|c| c.similarity).collect();
        let tier = tier.unwrap_or(ConfidenceTier::Fallback);

        response
            .metadata
            .insert("request_id".to_string(), Value::from(request_id.to_string()));
        response
            .metadata
            .insert("confidence_tier".to_string(), Value::from(tier.as_str()));
        response.metadata.insert(
            "retrieved_course_ids".to_string(),
            Value::from(
                candidates
                    .iter()
                    .map(|c| c.course.code.as_str())
                    .collect::<Vec<_>>(),
            ),
        );
        let reasoning = reasoning_trace(&response.query, tier, &scores);
        response
            .metadata
            .insert("reasoning".to_string(), Value::from(reasoning));
        response
    }
}

/// Human-readable trace of how the response was produced.
fn reasoning_trace(query: &str, tier: ConfidenceTier, scores: &[f32]) -> String {
    let mut parts = vec![
        format!("Query Analysis: Processed student interest in '{}'", query),
        format!("Vector Search: Found {} relevant courses", scores.len()),
    ];

    if !scores.is_empty() {
        let min = scores.iter().copied().fold(f32::MAX, f32::min);
        let max = scores.iter().copied().fold(f32::MIN, f32::max);
        let mean = scores.iter().sum::<f32>() / scores.len() as f32;
        parts.push(format!("Similarity Range: {:.3} - {:.3}", min, max));
        parts.push(format!("Average Similarity: {:.3}", mean));
    }

    parts.push(format!("Confidence Level: {} ({})", tier, tier.explanation()));
    parts.join(" | ")
}
