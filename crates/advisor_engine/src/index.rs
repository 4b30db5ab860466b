//! In-memory flat vector index with cosine-similarity search.
//!
//! Vectors are L2-normalized on insertion, so the inner product at search
//! time is the cosine similarity. Search is a brute-force scan: catalogs
//! are small and the scan is exact and deterministic.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use advisor_common::AdvisorError;

/// Serialized index contents, cached so the catalog does not have to be
/// re-embedded on every startup.
#[derive(Serialize, Deserialize)]
pub struct SavedEmbeddings {
    pub model: String,
    pub dimension: usize,
    pub ids: Vec<String>,
    /// Normalized vectors, parallel to `ids`.
    pub vectors: Vec<Vec<f32>>,
}

/// Flat cosine index over normalized vectors.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    dimension: usize,
    ids: Vec<String>,
    vectors: Vec<Vec<f32>>,
}

fn l2_norm(vector: &[f32]) -> f32 {
    vector.iter().map(|x| x * x).sum::<f32>().sqrt()
}

fn normalize(vector: &[f32]) -> Option<Vec<f32>> {
    let norm = l2_norm(vector);
    if norm == 0.0 || !norm.is_finite() {
        return None;
    }
    Some(vector.iter().map(|x| x / norm).collect())
}

impl VectorIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            ids: Vec::new(),
            vectors: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Add a vector under an id. The vector is normalized before storage.
    pub fn add(&mut self, id: &str, vector: &[f32]) -> Result<(), AdvisorError> {
        if vector.len() != self.dimension {
            return Err(AdvisorError::Index(format!(
                "dimension mismatch for '{}': expected {}, got {}",
                id,
                self.dimension,
                vector.len()
            )));
        }
        let normalized = normalize(vector).ok_or_else(|| {
            AdvisorError::Index(format!("zero-norm vector for '{}'", id))
        })?;
        self.ids.push(id.to_string());
        self.vectors.push(normalized);
        Ok(())
    }

    /// Return up to `k` (id, cosine similarity) pairs, descending by
    /// similarity. Ties keep insertion order (stable sort).
    pub fn search(&self, vector: &[f32], k: usize) -> Result<Vec<(String, f32)>, AdvisorError> {
        if vector.len() != self.dimension {
            return Err(AdvisorError::Index(format!(
                "query dimension mismatch: expected {}, got {}",
                self.dimension,
                vector.len()
            )));
        }
        let query = normalize(vector)
            .ok_or_else(|| AdvisorError::Index("zero-norm query vector".to_string()))?;

        let mut scored: Vec<(String, f32)> = self
            .ids
            .iter()
            .zip(&self.vectors)
            .map(|(id, stored)| {
                let dot: f32 = query.iter().zip(stored).map(|(a, b)| a * b).sum();
                (id.clone(), dot)
            })
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }

    /// Cache the index contents to a JSON file.
    pub fn save(&self, path: &Path, model: &str) -> Result<(), AdvisorError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let saved = SavedEmbeddings {
            model: model.to_string(),
            dimension: self.dimension,
            ids: self.ids.clone(),
            vectors: self.vectors.clone(),
        };
        fs::write(path, serde_json::to_string(&saved)?)?;
        info!("Saved {} embeddings to {}", self.ids.len(), path.display());
        Ok(())
    }

    /// Rebuild an index from a cache file. Fails if the cache was produced
    /// by a different embedding model.
    pub fn load(path: &Path, expected_model: &str) -> Result<Self, AdvisorError> {
        let raw = fs::read_to_string(path)?;
        let saved: SavedEmbeddings = serde_json::from_str(&raw)?;
        if saved.model != expected_model {
            return Err(AdvisorError::Index(format!(
                "embedding cache was built with model '{}', expected '{}'",
                saved.model, expected_model
            )));
        }
        if saved.ids.len() != saved.vectors.len() {
            return Err(AdvisorError::Index(
                "embedding cache ids and vectors are out of sync".to_string(),
            ));
        }
        info!("Loaded {} embeddings from {}", saved.ids.len(), path.display());
        Ok(Self {
            dimension: saved.dimension,
            ids: saved.ids,
            vectors: saved.vectors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_identical_vector_scores_one() {
        let mut index = VectorIndex::new(3);
        index.add("CS101", &[1.0, 2.0, 3.0]).unwrap();

        let hits = index.search(&[1.0, 2.0, 3.0], 1).unwrap();
        assert_eq!(hits[0].0, "CS101");
        assert_relative_eq!(hits[0].1, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_search_orders_descending() {
        let mut index = VectorIndex::new(2);
        index.add("far", &[0.0, 1.0]).unwrap();
        index.add("near", &[1.0, 0.1]).unwrap();

        let hits = index.search(&[1.0, 0.0], 2).unwrap();
        assert_eq!(hits[0].0, "near");
        assert_eq!(hits[1].0, "far");
        assert!(hits[0].1 > hits[1].1);
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let mut index = VectorIndex::new(2);
        index.add("first", &[1.0, 0.0]).unwrap();
        index.add("second", &[2.0, 0.0]).unwrap(); // same direction, same cosine

        let hits = index.search(&[1.0, 0.0], 2).unwrap();
        assert_eq!(hits[0].0, "first");
        assert_eq!(hits[1].0, "second");
    }

    #[test]
    fn test_truncates_to_k() {
        let mut index = VectorIndex::new(2);
        for (i, v) in [[1.0, 0.0], [0.9, 0.1], [0.0, 1.0]].iter().enumerate() {
            index.add(&format!("c{}", i), v).unwrap();
        }
        assert_eq!(index.search(&[1.0, 0.0], 2).unwrap().len(), 2);
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let mut index = VectorIndex::new(3);
        assert!(index.add("bad", &[1.0, 2.0]).is_err());
        index.add("ok", &[1.0, 0.0, 0.0]).unwrap();
        assert!(index.search(&[1.0, 0.0], 1).is_err());
    }

    #[test]
    fn test_zero_vector_rejected() {
        let mut index = VectorIndex::new(2);
        assert!(index.add("zero", &[0.0, 0.0]).is_err());
        index.add("ok", &[1.0, 0.0]).unwrap();
        assert!(index.search(&[0.0, 0.0], 1).is_err());
    }

    #[test]
    fn test_save_load_round_trip() {
        let mut index = VectorIndex::new(2);
        index.add("CS101", &[1.0, 0.0]).unwrap();
        index.add("CS301", &[0.0, 1.0]).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("embeddings.json");
        index.save(&path, "text-embedding-3-small").unwrap();

        let loaded = VectorIndex::load(&path, "text-embedding-3-small").unwrap();
        assert_eq!(loaded.len(), 2);
        let hits = loaded.search(&[0.0, 1.0], 1).unwrap();
        assert_eq!(hits[0].0, "CS301");

        assert!(VectorIndex::load(&path, "other-model").is_err());
    }
}
