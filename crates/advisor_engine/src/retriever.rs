//! Retrieval: embed a query and return the closest catalog courses.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use advisor_common::course::{Course, CourseCatalog, RetrievedCandidate};
use advisor_common::AdvisorError;

use crate::embedding::EmbeddingProvider;
use crate::index::VectorIndex;

/// Compose the text a course is embedded under: title and description
/// first, then category and prerequisites for extra signal.
pub fn course_text(course: &Course) -> String {
    let mut parts = vec![
        format!("Course: {}", course.title),
        format!("Description: {}", course.description),
        format!("Category: {}", course.category),
    ];
    if !course.prerequisites.is_empty() {
        parts.push(format!("Prerequisites: {}", course.prerequisites_display()));
    }
    parts.join(" ")
}

/// Wrap a raw student query in a retrieval-oriented framing.
fn enhanced_query(query: &str) -> String {
    format!("Student interests: {}. Looking for relevant courses.", query)
}

/// Read-only retrieval over an embedded catalog. Failures from the
/// embedding provider or the index are not retried; they surface as
/// `AdvisorError::Retrieval` for the pipeline to absorb.
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    catalog: Arc<CourseCatalog>,
    index: VectorIndex,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, catalog: Arc<CourseCatalog>) -> Self {
        let dimension = embedder.dimension();
        Self {
            embedder,
            catalog,
            index: VectorIndex::new(dimension),
        }
    }

    pub fn catalog(&self) -> &CourseCatalog {
        &self.catalog
    }

    pub fn index_len(&self) -> usize {
        self.index.len()
    }

    /// Embed every catalog course into the index.
    pub async fn index_catalog(&mut self) -> Result<(), AdvisorError> {
        info!("Embedding {} courses", self.catalog.len());
        let mut index = VectorIndex::new(self.embedder.dimension());

        for course in self.catalog.courses() {
            let text = course_text(course);
            let vector = self
                .embedder
                .embed(&text)
                .await
                .map_err(|e| AdvisorError::Retrieval(format!("embedding '{}': {}", course.code, e)))?;
            index.add(course.code.as_str(), &vector)?;
        }

        self.index = index;
        info!("Indexed {} course embeddings", self.index.len());
        Ok(())
    }

    /// Cache course embeddings so a later run can skip the provider.
    pub fn save_embeddings(&self, path: &Path, model: &str) -> Result<(), AdvisorError> {
        self.index.save(path, model)
    }

    /// Restore course embeddings from a cache file. Entries must match the
    /// current catalog; a stale cache is rejected.
    pub fn load_embeddings(&mut self, path: &Path, model: &str) -> Result<(), AdvisorError> {
        let index = VectorIndex::load(path, model)?;
        if index.len() != self.catalog.len() {
            return Err(AdvisorError::Index(format!(
                "embedding cache has {} entries but the catalog has {}",
                index.len(),
                self.catalog.len()
            )));
        }
        self.index = index;
        Ok(())
    }

    /// Retrieve up to `k` candidates for a query, descending by similarity.
    pub async fn retrieve(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<RetrievedCandidate>, AdvisorError> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Err(AdvisorError::InvalidQuery(
                "query must not be empty or blank".to_string(),
            ));
        }
        if k == 0 {
            return Err(AdvisorError::InvalidQuery("k must be positive".to_string()));
        }

        let query_vector = self
            .embedder
            .embed(&enhanced_query(trimmed))
            .await
            .map_err(|e| AdvisorError::Retrieval(format!("query embedding: {}", e)))?;

        let hits = self
            .index
            .search(&query_vector, k)
            .map_err(|e| AdvisorError::Retrieval(e.to_string()))?;

        let mut candidates = Vec::with_capacity(hits.len());
        for (code, similarity) in hits {
            match self.catalog.get(&code) {
                Some(course) => candidates.push(RetrievedCandidate {
                    course: course.clone(),
                    similarity,
                }),
                None => warn!("Index returned unknown course id '{}'", code),
            }
        }

        info!("Retrieved {} candidates for query '{}'", candidates.len(), trimmed);
        Ok(candidates)
    }
}
