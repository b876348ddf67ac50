use lumen_llm::LlmError;
use lumen_memory::MemoryError;

/// Failure of a knowledge-base or chat operation.
///
/// `InvalidRequest` and `NotFound` carry caller-facing messages. `Llm` and `Memory`
/// are upstream failures whose details stay server-side.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("memory error: {0}")]
    Memory(#[from] MemoryError),
}

impl ServiceError {
    #[must_use]
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::Llm(_) | Self::Memory(_))
    }
}

impl From<lumen_memory::VectorStoreError> for ServiceError {
    fn from(e: lumen_memory::VectorStoreError) -> Self {
        Self::Memory(MemoryError::VectorStore(e))
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(e: serde_json::Error) -> Self {
        Self::Memory(MemoryError::Json(e))
    }
}
