//! Document list and vector index kept in lockstep.

use std::sync::Arc;

use lumen_memory::{Distance, Embedder, VectorPoint, VectorStore};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::document::Document;
use crate::domain::Domain;
use crate::error::ServiceError;

/// How the index is brought back in line after documents are removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteStrategy {
    /// Delete only the removed point ids.
    #[default]
    PerPoint,
    /// Drop the collection and re-embed every surviving document.
    Rebuild,
}

#[derive(Debug, Clone)]
struct Entry {
    id: u64,
    document: Document,
}

#[derive(Debug, Default)]
struct Corpus {
    entries: Vec<Entry>,
    next_id: u64,
}

impl Corpus {
    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

/// In-memory document list plus its vector index.
///
/// Every mutation holds the write guard across both the list and the index, so readers
/// never observe one without the other.
pub struct KnowledgeBase {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    collection: String,
    domain: Domain,
    distance: Distance,
    delete_strategy: DeleteStrategy,
    corpus: RwLock<Corpus>,
}

impl std::fmt::Debug for KnowledgeBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeBase")
            .field("collection", &self.collection)
            .field("domain", &self.domain)
            .field("embedder", &self.embedder.name())
            .field("distance", &self.distance)
            .field("delete_strategy", &self.delete_strategy)
            .finish_non_exhaustive()
    }
}

impl KnowledgeBase {
    #[must_use]
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        collection: impl Into<String>,
        domain: Domain,
    ) -> Self {
        Self {
            store,
            embedder,
            collection: collection.into(),
            domain,
            distance: Distance::default(),
            delete_strategy: DeleteStrategy::default(),
            corpus: RwLock::new(Corpus::default()),
        }
    }

    #[must_use]
    pub fn with_distance(mut self, distance: Distance) -> Self {
        self.distance = distance;
        self
    }

    #[must_use]
    pub fn with_delete_strategy(mut self, strategy: DeleteStrategy) -> Self {
        self.delete_strategy = strategy;
        self
    }

    #[must_use]
    pub fn domain(&self) -> Domain {
        self.domain
    }

    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Replace the corpus with `seed` and rebuild the index from it.
    ///
    /// Invalid seed documents are skipped with a warning. Returns the number loaded.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding or indexing fails; the previous corpus is kept.
    pub async fn bootstrap(&self, seed: Vec<Document>) -> Result<usize, ServiceError> {
        let mut corpus = self.corpus.write().await;

        let mut entries = Vec::with_capacity(seed.len());
        for document in seed {
            if !document.is_valid() {
                tracing::warn!(name = %document.name, "skipping invalid seed document");
                continue;
            }
            entries.push(Entry {
                id: corpus.allocate_id(),
                document,
            });
        }

        self.reindex(&corpus.entries, &entries).await?;
        let loaded = entries.len();
        corpus.entries = entries;
        tracing::info!(
            collection = %self.collection,
            documents = loaded,
            "knowledge base bootstrapped"
        );
        Ok(loaded)
    }

    /// Embed, index and append one document. Duplicate names are allowed.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` when `name` or `description` is blank; upstream errors when
    /// embedding or indexing fails, in which case the list is unchanged.
    pub async fn add(&self, document: Document) -> Result<Document, ServiceError> {
        if !document.is_valid() {
            return Err(ServiceError::InvalidRequest(format!(
                "Invalid {} data",
                self.domain.noun()
            )));
        }

        let mut corpus = self.corpus.write().await;
        let id = corpus.allocate_id();
        let point = self.to_point(id, &document).await?;
        self.store.upsert(&self.collection, vec![point]).await?;
        corpus.entries.push(Entry {
            id,
            document: document.clone(),
        });
        tracing::info!(id, name = %document.name, "document added");
        Ok(document)
    }

    /// Remove every document named `name`. Returns how many were removed; zero is not
    /// an error.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` when `name` is blank; upstream errors when the index update
    /// fails, in which case the list is unchanged.
    pub async fn remove(&self, name: &str) -> Result<usize, ServiceError> {
        if name.trim().is_empty() {
            return Err(ServiceError::InvalidRequest("No name provided".into()));
        }

        let mut corpus = self.corpus.write().await;
        let (removed, kept): (Vec<Entry>, Vec<Entry>) = corpus
            .entries
            .iter()
            .cloned()
            .partition(|e| e.document.name == name);
        if removed.is_empty() {
            tracing::debug!(name, "delete matched no documents");
            return Ok(0);
        }

        match self.delete_strategy {
            DeleteStrategy::PerPoint => {
                let ids = removed.iter().map(|e| e.id).collect();
                self.store.delete_points(&self.collection, ids).await?;
            }
            DeleteStrategy::Rebuild => self.reindex(&corpus.entries, &kept).await?,
        }
        corpus.entries = kept;
        tracing::info!(name, removed = removed.len(), "documents deleted");
        Ok(removed.len())
    }

    /// Drop the collection and re-embed every current document under its existing id.
    ///
    /// # Errors
    ///
    /// Returns an upstream error if embedding or indexing fails.
    pub async fn rebuild(&self) -> Result<(), ServiceError> {
        let corpus = self.corpus.write().await;
        self.reindex(&corpus.entries, &corpus.entries).await
    }

    /// Top-`k` documents for `query` with their similarity scores, best first.
    ///
    /// # Errors
    ///
    /// Returns an upstream error if embedding or search fails.
    pub async fn retrieve_scored(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<(Document, f32)>, ServiceError> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let _corpus = self.corpus.read().await;
        let vector = self.embedder.embed(query).await?;
        let hits = self
            .store
            .search(&self.collection, vector, k as u64)
            .await?;
        hits.into_iter()
            .map(|hit| -> Result<_, ServiceError> {
                Ok((Document::from_payload(hit.payload)?, hit.score))
            })
            .collect()
    }

    /// # Errors
    ///
    /// Returns an upstream error if embedding or search fails.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Document>, ServiceError> {
        let scored = self.retrieve_scored(query, k).await?;
        Ok(scored.into_iter().map(|(doc, _)| doc).collect())
    }

    /// First document whose name equals `name` exactly.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` when `name` is blank, `NotFound` when nothing matches.
    pub async fn lookup(&self, name: &str) -> Result<Document, ServiceError> {
        if name.trim().is_empty() {
            return Err(ServiceError::InvalidRequest("No name provided".into()));
        }
        let corpus = self.corpus.read().await;
        corpus
            .entries
            .iter()
            .find(|e| e.document.name == name)
            .map(|e| e.document.clone())
            .ok_or_else(|| ServiceError::NotFound(format!("{} not found", self.domain.noun())))
    }

    /// All documents in insertion order.
    pub async fn list(&self) -> Vec<Document> {
        let corpus = self.corpus.read().await;
        corpus.entries.iter().map(|e| e.document.clone()).collect()
    }

    pub async fn len(&self) -> usize {
        self.corpus.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Number of points currently held by the index.
    ///
    /// # Errors
    ///
    /// Returns an upstream error if the store cannot be queried.
    pub async fn indexed_len(&self) -> Result<u64, ServiceError> {
        let _corpus = self.corpus.read().await;
        Ok(self.store.count(&self.collection).await?)
    }

    async fn to_point(&self, id: u64, document: &Document) -> Result<VectorPoint, ServiceError> {
        let vector = self.embedder.embed(&document.description).await?;
        Ok(VectorPoint {
            id,
            vector,
            payload: document.to_payload()?,
        })
    }

    async fn to_points(&self, entries: &[Entry]) -> Result<Vec<VectorPoint>, ServiceError> {
        let mut points = Vec::with_capacity(entries.len());
        for entry in entries {
            points.push(self.to_point(entry.id, &entry.document).await?);
        }
        Ok(points)
    }

    async fn replace_index(&self, points: Vec<VectorPoint>) -> Result<(), ServiceError> {
        self.store
            .create_collection(
                &self.collection,
                self.embedder.dimension() as u64,
                self.distance,
            )
            .await?;
        if !points.is_empty() {
            self.store.upsert(&self.collection, points).await?;
        }
        Ok(())
    }

    /// Rebuild the index to hold exactly `target`. `current` is what it holds now and is
    /// put back if the new index cannot be written. Caller holds the write guard.
    async fn reindex(&self, current: &[Entry], target: &[Entry]) -> Result<(), ServiceError> {
        let points = self.to_points(target).await?;
        if let Err(e) = self.replace_index(points).await {
            tracing::error!(
                collection = %self.collection,
                error = %e,
                "index rebuild failed, restoring previous points"
            );
            if let Err(restore) = self.restore(current).await {
                tracing::error!(
                    collection = %self.collection,
                    error = %restore,
                    "failed to restore index"
                );
            }
            return Err(e);
        }
        tracing::debug!(
            collection = %self.collection,
            points = target.len(),
            "index rebuilt"
        );
        Ok(())
    }

    async fn restore(&self, entries: &[Entry]) -> Result<(), ServiceError> {
        let points = self.to_points(entries).await?;
        self.replace_index(points).await
    }
}
