//! Embedding collaborator: text -> fixed-length vector.
//!
//! A failed embedding call is an error, never a zero vector; a zero vector
//! would silently defeat downstream similarity ranking.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use advisor_common::config::EmbeddingSettings;

/// Black-box embedding provider. Implementations must be deterministic
/// enough that identical text embeds to (nearly) identical vectors.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Length of the vectors this provider produces.
    fn dimension(&self) -> usize;
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
    encoding_format: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Embeddings over an OpenAI-compatible `/embeddings` endpoint.
pub struct HttpEmbeddings {
    http_client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
    dimension: usize,
}

impl HttpEmbeddings {
    pub fn new(settings: &EmbeddingSettings, api_base: &str, api_key: &str) -> Self {
        Self {
            http_client: reqwest::Client::builder()
                .timeout(Duration::from_secs(settings.request_timeout_secs))
                .build()
                .unwrap_or_default(),
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: settings.model.clone(),
            dimension: settings.dimension,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddings {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/embeddings", self.api_base);

        let request = EmbeddingRequest {
            model: &self.model,
            input: text,
            encoding_format: "float",
        };

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to send embedding request")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Embedding API returned error {}: {}", status, error_text);
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .context("Failed to parse embedding response")?;

        let embedding = parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .context("Embedding response contained no data")?;

        if embedding.len() != self.dimension {
            anyhow::bail!(
                "Embedding dimension mismatch: expected {}, got {}",
                self.dimension,
                embedding.len()
            );
        }

        info!("[>]  Embedded {} chars with {}", text.len(), self.model);
        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
