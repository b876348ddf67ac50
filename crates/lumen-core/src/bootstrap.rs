//! Application bootstrap: config resolution, provider, embedder and index construction.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use lumen_llm::AnyProvider;
use lumen_llm::openai::OpenAiProvider;
use lumen_memory::{Embedder, HashEmbedder, InMemoryVectorStore, ProviderEmbedder, VectorStore};
use tokio::sync::watch;

use crate::chat::ChatService;
use crate::config::{Config, EmbeddingProviderKind, IndexBackend};
use crate::document::Document;
use crate::knowledge::KnowledgeBase;

/// Everything the HTTP layer needs, built from one [`Config`].
pub struct App {
    pub config: Config,
    pub knowledge: Arc<KnowledgeBase>,
    pub chat: Arc<ChatService<AnyProvider>>,
}

impl App {
    /// Build embedder, index and chat service around `provider`, then load the seed.
    ///
    /// # Errors
    ///
    /// Returns an error if any backend cannot be created or the seed cannot be indexed.
    pub async fn build(config: Config, provider: AnyProvider) -> anyhow::Result<Self> {
        config.validate()?;
        let embedder = create_embedder(&config, &provider).await?;
        let store = create_store(&config)?;

        let knowledge = KnowledgeBase::new(
            store,
            embedder,
            config.collection(),
            config.knowledge.domain,
        )
        .with_distance(config.index.distance)
        .with_delete_strategy(config.index.delete_strategy);
        let seed = load_seed(&config)?;
        knowledge
            .bootstrap(seed)
            .await
            .context("failed to index seed documents")?;

        let knowledge = Arc::new(knowledge);
        let chat = Arc::new(ChatService::new(
            provider,
            Arc::clone(&knowledge),
            config.index.top_k,
        ));
        Ok(Self {
            config,
            knowledge,
            chat,
        })
    }

    /// Build with the provider described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider or any backend cannot be created.
    pub async fn from_config(config: Config) -> anyhow::Result<Self> {
        let provider = create_provider(&config)?;
        Self::build(config, provider).await
    }
}

/// Priority: `--config` argument > `LUMEN_CONFIG` env > `config/default.toml`.
#[must_use]
pub fn resolve_config_path(cli: Option<&Path>) -> PathBuf {
    if let Some(path) = cli {
        return path.to_owned();
    }
    if let Ok(path) = std::env::var("LUMEN_CONFIG") {
        return PathBuf::from(path);
    }
    PathBuf::from("config/default.toml")
}

#[must_use]
pub fn build_shutdown() -> (watch::Sender<bool>, watch::Receiver<bool>) {
    watch::channel(false)
}

/// # Errors
///
/// Returns an error if no API key was resolved.
pub fn create_provider(config: &Config) -> anyhow::Result<AnyProvider> {
    let api_key = config
        .secrets
        .llm_api_key
        .as_ref()
        .context("LUMEN_LLM_API_KEY (or MISTRAL_API_KEY) must be set")?;
    let embedding_model = (config.embedding.provider == EmbeddingProviderKind::Llm)
        .then(|| config.llm.embedding_model.clone());
    let provider = OpenAiProvider::new(
        api_key.expose().to_owned(),
        config.llm.base_url.clone(),
        config.llm.model.clone(),
        config.llm.max_tokens,
        embedding_model,
    );
    tracing::info!(
        base_url = %config.llm.base_url,
        model = %config.llm.model,
        "completion provider configured"
    );
    Ok(provider.into())
}

/// # Errors
///
/// Returns an error if the configured embedder is unavailable in this build or fails
/// to load.
pub async fn create_embedder(
    config: &Config,
    provider: &AnyProvider,
) -> anyhow::Result<Arc<dyn Embedder>> {
    use lumen_llm::LlmProvider as _;

    let embedder: Arc<dyn Embedder> = match config.embedding.provider {
        EmbeddingProviderKind::Hash => Arc::new(HashEmbedder::new(config.embedding.dimension)?),
        EmbeddingProviderKind::Llm => {
            if !provider.supports_embeddings() {
                bail!("provider '{}' does not support embeddings", provider.name());
            }
            let embedder = ProviderEmbedder::detect(provider.clone())
                .await
                .context("failed to query embedding dimension")?;
            Arc::new(embedder)
        }
        #[cfg(feature = "candle")]
        EmbeddingProviderKind::Candle => {
            let repo_id = config.embedding.model.clone();
            let embedder = tokio::task::spawn_blocking(move || {
                lumen_memory::CandleEmbedder::load(&repo_id)
            })
            .await
            .context("embedding model loader panicked")??;
            Arc::new(embedder)
        }
        #[cfg(not(feature = "candle"))]
        EmbeddingProviderKind::Candle => {
            bail!("embedding.provider = \"candle\" requires the `candle` feature")
        }
    };
    tracing::info!(
        embedder = embedder.name(),
        dimension = embedder.dimension(),
        "embedder ready"
    );
    Ok(embedder)
}

/// # Errors
///
/// Returns an error if the configured backend is unavailable in this build or cannot
/// be reached.
pub fn create_store(config: &Config) -> anyhow::Result<Arc<dyn VectorStore>> {
    match config.index.backend {
        IndexBackend::Memory => Ok(Arc::new(InMemoryVectorStore::new())),
        #[cfg(feature = "qdrant")]
        IndexBackend::Qdrant => {
            let store = lumen_memory::QdrantStore::new(&config.index.qdrant_url)
                .context("failed to create qdrant client")?;
            tracing::info!(url = %config.index.qdrant_url, "using qdrant index");
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "qdrant"))]
        IndexBackend::Qdrant => bail!("index.backend = \"qdrant\" requires the `qdrant` feature"),
    }
}

/// Seed documents: the JSON array at `knowledge.seed_path`, or the domain's built-ins.
///
/// # Errors
///
/// Returns an error if the seed file cannot be read or is not a JSON array.
pub fn load_seed(config: &Config) -> anyhow::Result<Vec<Document>> {
    let Some(path) = config.knowledge.seed_path.as_deref() else {
        return Ok(config.knowledge.domain.seed_documents());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read seed file {}", path.display()))?;
    let values: Vec<serde_json::Value> = serde_json::from_str(&content)
        .with_context(|| format!("seed file {} is not a JSON array", path.display()))?;

    let total = values.len();
    let documents: Vec<Document> = values.into_iter().filter_map(Document::from_json).collect();
    if documents.len() < total {
        tracing::warn!(
            path = %path.display(),
            skipped = total - documents.len(),
            "seed entries without name or description were skipped"
        );
    }
    Ok(documents)
}
