//! Text-to-vector encoders.
//!
//! Every embedder reports a fixed [`Embedder::dimension`]; the vector index is created
//! with that size, so swapping embedders requires a rebuild.

#[cfg(feature = "candle")]
mod candle;
mod hash;
mod provider;

#[cfg(feature = "candle")]
pub use candle::CandleEmbedder;
pub use hash::HashEmbedder;
pub use provider::ProviderEmbedder;

use crate::error::MemoryError;
use crate::vector_store::BoxFuture;

pub trait Embedder: Send + Sync {
    /// Encode `text` into a vector of length [`Embedder::dimension`].
    fn embed(&self, text: &str) -> BoxFuture<'_, Result<Vec<f32>, MemoryError>>;

    fn dimension(&self) -> usize;

    fn name(&self) -> &str;
}

pub(crate) fn check_dimension(expected: usize, vector: &[f32]) -> Result<(), MemoryError> {
    if vector.len() == expected {
        Ok(())
    } else {
        Err(MemoryError::Dimension {
            expected,
            actual: vector.len(),
        })
    }
}
