//! Text embedders and nearest-neighbour vector index.

pub mod embedder;
pub mod error;
pub mod in_memory_store;
#[cfg(feature = "qdrant")]
pub mod qdrant;
pub mod vector_store;

pub use embedder::{Embedder, HashEmbedder, ProviderEmbedder};
pub use error::MemoryError;
pub use in_memory_store::InMemoryVectorStore;
#[cfg(feature = "qdrant")]
pub use qdrant::QdrantStore;
pub use vector_store::{BoxFuture, Distance, ScoredVectorPoint, VectorPoint, VectorStore, VectorStoreError};
