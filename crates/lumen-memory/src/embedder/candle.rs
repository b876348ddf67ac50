use std::sync::Arc;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use tokenizers::Tokenizer;

use crate::embedder::{Embedder, check_dimension};
use crate::error::MemoryError;
use crate::vector_store::BoxFuture;

struct BertEncoder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
}

impl BertEncoder {
    fn load(repo_id: &str, device: &Device) -> Result<Self, MemoryError> {
        let api = hf_hub::api::sync::Api::new().map_err(|e| {
            MemoryError::Embedding(format!("failed to create HuggingFace API client: {e}"))
        })?;
        let repo = api.model(repo_id.to_owned());

        let fetch = |file: &str| {
            repo.get(file).map_err(|e| {
                MemoryError::Embedding(format!("failed to download {file} from {repo_id}: {e}"))
            })
        };
        let config_path = fetch("config.json")?;
        let tokenizer_path = fetch("tokenizer.json")?;
        let weights_path = fetch("model.safetensors")?;

        let config_str = std::fs::read_to_string(&config_path)
            .map_err(|e| MemoryError::Embedding(format!("failed to read BERT config: {e}")))?;
        let config: BertConfig = serde_json::from_str(&config_str)?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| MemoryError::Embedding(format!("failed to load tokenizer: {e}")))?;

        // SAFETY: file is a valid safetensors downloaded from hf-hub, not modified during
        // VarBuilder lifetime
        let vb =
            unsafe { VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, device)? };

        let model = BertModel::load(vb, &config)?;

        Ok(Self {
            model,
            tokenizer,
            device: device.clone(),
        })
    }

    fn encode(&self, text: &str) -> Result<Vec<f32>, MemoryError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| MemoryError::Embedding(format!("tokenizer encode failed: {e}")))?;

        let token_ids = encoding.get_ids();
        let token_type_ids: Vec<u32> = vec![0; token_ids.len()];

        let input_ids = Tensor::new(token_ids, &self.device)?.unsqueeze(0)?;
        let token_type_ids = Tensor::new(token_type_ids.as_slice(), &self.device)?.unsqueeze(0)?;

        let embeddings = self.model.forward(&input_ids, &token_type_ids, None)?;

        // Mean pooling over the sequence dimension
        let seq_len = embeddings.dim(1)?;
        let sum = embeddings.sum(1)?;
        let mean_pooled = (sum
            / f64::from(
                u32::try_from(seq_len)
                    .map_err(|e| MemoryError::Embedding(format!("sequence length overflow: {e}")))?,
            ))?;

        let norm = mean_pooled.sqr()?.sum_keepdim(1)?.sqrt()?;
        let normalized = mean_pooled.broadcast_div(&norm)?.squeeze(0)?;

        Ok(normalized.to_vec1::<f32>()?)
    }
}

/// Local sentence-embedding model (BERT family, e.g. `all-MiniLM-L6-v2`) run on CPU.
#[derive(Clone)]
pub struct CandleEmbedder {
    encoder: Arc<BertEncoder>,
    repo_id: String,
    dimension: usize,
}

impl std::fmt::Debug for CandleEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CandleEmbedder")
            .field("repo_id", &self.repo_id)
            .field("dimension", &self.dimension)
            .finish_non_exhaustive()
    }
}

impl CandleEmbedder {
    /// Download (or reuse the hf-hub cache of) `repo_id` and load it on the CPU.
    ///
    /// Blocking: call from `spawn_blocking` or before the runtime starts serving.
    ///
    /// # Errors
    ///
    /// Returns an error if model download or loading fails.
    pub fn load(repo_id: &str) -> Result<Self, MemoryError> {
        let encoder = BertEncoder::load(repo_id, &Device::Cpu)?;
        let dimension = encoder.encode("dimension check")?.len();
        tracing::info!(repo_id, dimension, "candle embedding model loaded");
        Ok(Self {
            encoder: Arc::new(encoder),
            repo_id: repo_id.to_owned(),
            dimension,
        })
    }
}

impl Embedder for CandleEmbedder {
    fn embed(&self, text: &str) -> BoxFuture<'_, Result<Vec<f32>, MemoryError>> {
        let encoder = Arc::clone(&self.encoder);
        let text = text.to_owned();
        Box::pin(async move {
            let vector = tokio::task::spawn_blocking(move || encoder.encode(&text))
                .await
                .map_err(|e| MemoryError::Embedding(format!("embedding task failed: {e}")))??;
            check_dimension(self.dimension, &vector)?;
            Ok(vector)
        })
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        &self.repo_id
    }
}
