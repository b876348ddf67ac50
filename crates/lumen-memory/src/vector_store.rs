use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum VectorStoreError {
    #[error("connection error: {0}")]
    Connection(String),
    #[error("collection error: {0}")]
    Collection(String),
    #[error("upsert error: {0}")]
    Upsert(String),
    #[error("search error: {0}")]
    Search(String),
    #[error("delete error: {0}")]
    Delete(String),
    #[error("vector dimension mismatch: collection expects {expected}, got {actual}")]
    Dimension { expected: u64, actual: u64 },
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Similarity metric a collection is created with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Distance {
    #[default]
    Cosine,
    Dot,
    Euclid,
}

impl Distance {
    /// Higher is more similar for every metric; `Euclid` scores are negated distances.
    #[must_use]
    pub fn score(self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Self::Cosine => cosine_similarity(a, b),
            Self::Dot => a.iter().zip(b.iter()).map(|(x, y)| x * y).sum(),
            Self::Euclid => -a
                .iter()
                .zip(b.iter())
                .map(|(x, y)| (x - y) * (x - y))
                .sum::<f32>()
                .sqrt(),
        }
    }
}

#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[derive(Debug, Clone)]
pub struct VectorPoint {
    pub id: u64,
    pub vector: Vec<f32>,
    pub payload: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct ScoredVectorPoint {
    pub id: u64,
    pub score: f32,
    pub payload: HashMap<String, serde_json::Value>,
}

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Named collections of `(id, vector, payload)` points with nearest-neighbour search.
///
/// `search` returns at most `limit` points ordered by descending score. Equal scores
/// are ordered by ascending point id in the in-memory store; other backends may differ.
pub trait VectorStore: Send + Sync {
    /// Drop any existing collection with this name and create an empty one.
    fn create_collection(
        &self,
        collection: &str,
        vector_size: u64,
        distance: Distance,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>>;

    fn collection_exists(&self, collection: &str) -> BoxFuture<'_, Result<bool, VectorStoreError>>;

    fn delete_collection(&self, collection: &str) -> BoxFuture<'_, Result<(), VectorStoreError>>;

    fn upsert(
        &self,
        collection: &str,
        points: Vec<VectorPoint>,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>>;

    fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u64,
    ) -> BoxFuture<'_, Result<Vec<ScoredVectorPoint>, VectorStoreError>>;

    fn delete_points(
        &self,
        collection: &str,
        ids: Vec<u64>,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>>;

    fn count(&self, collection: &str) -> BoxFuture<'_, Result<u64, VectorStoreError>>;
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn cosine_identical_is_one() {
        let a = [0.3, 0.4, 0.5];
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_zero_vector_is_zero() {
        assert!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]).abs() < f32::EPSILON);
    }

    #[test]
    fn euclid_prefers_closer_points() {
        let q = [0.0, 0.0];
        assert!(Distance::Euclid.score(&q, &[1.0, 0.0]) > Distance::Euclid.score(&q, &[3.0, 0.0]));
    }

    #[test]
    fn distance_deserializes_lowercase() {
        let d: Distance = serde_json::from_str("\"dot\"").unwrap();
        assert_eq!(d, Distance::Dot);
        assert_eq!(Distance::default(), Distance::Cosine);
    }

    proptest! {
        #[test]
        fn cosine_bounded(
            a in proptest::collection::vec(-100.0f32..100.0, 8),
            b in proptest::collection::vec(-100.0f32..100.0, 8),
        ) {
            let s = cosine_similarity(&a, &b);
            prop_assert!((-1.0001..=1.0001).contains(&s));
        }

        #[test]
        fn cosine_ignores_magnitude(
            a in proptest::collection::vec(0.1f32..10.0, 4),
            scale in 0.5f32..20.0,
        ) {
            let scaled: Vec<f32> = a.iter().map(|x| x * scale).collect();
            prop_assert!((cosine_similarity(&a, &scaled) - 1.0).abs() < 1e-4);
        }
    }
}
