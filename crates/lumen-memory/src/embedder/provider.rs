use lumen_llm::LlmProvider;

use crate::embedder::{Embedder, check_dimension};
use crate::error::MemoryError;
use crate::vector_store::BoxFuture;

/// Embedder backed by a remote provider's embeddings endpoint.
#[derive(Debug, Clone)]
pub struct ProviderEmbedder<P> {
    provider: P,
    dimension: usize,
}

impl<P: LlmProvider> ProviderEmbedder<P> {
    /// `dimension` must match what the provider's embedding model returns; mismatches
    /// are reported on every call rather than silently indexed.
    #[must_use]
    pub fn new(provider: P, dimension: usize) -> Self {
        Self {
            provider,
            dimension,
        }
    }

    /// Embed a short sample once and adopt the length the provider returns.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider call fails or yields an empty vector.
    pub async fn detect(provider: P) -> Result<Self, MemoryError> {
        let dimension = provider.embed("dimension check").await?.len();
        if dimension == 0 {
            return Err(MemoryError::Embedding(format!(
                "provider '{}' returned an empty embedding",
                provider.name()
            )));
        }
        tracing::info!(provider = provider.name(), dimension, "embedding dimension detected");
        Ok(Self::new(provider, dimension))
    }
}

impl<P: LlmProvider> Embedder for ProviderEmbedder<P> {
    fn embed(&self, text: &str) -> BoxFuture<'_, Result<Vec<f32>, MemoryError>> {
        let text = text.to_owned();
        Box::pin(async move {
            let vector = self.provider.embed(&text).await?;
            check_dimension(self.dimension, &vector)?;
            Ok(vector)
        })
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        self.provider.name()
    }
}
