use super::{Config, EmbeddingProviderKind, IndexBackend, Secret};

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("LUMEN_LLM_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Ok(v) = std::env::var("LUMEN_LLM_MODEL") {
            self.llm.model = v;
        }
        if let Ok(v) = std::env::var("LUMEN_EMBEDDING_PROVIDER") {
            match serde_json::from_value::<EmbeddingProviderKind>(serde_json::Value::String(
                v.clone(),
            )) {
                Ok(kind) => self.embedding.provider = kind,
                Err(_) => tracing::warn!("ignoring invalid LUMEN_EMBEDDING_PROVIDER value: {v}"),
            }
        }
        if let Ok(v) = std::env::var("LUMEN_INDEX_BACKEND") {
            match serde_json::from_value::<IndexBackend>(serde_json::Value::String(v.clone())) {
                Ok(backend) => self.index.backend = backend,
                Err(_) => tracing::warn!("ignoring invalid LUMEN_INDEX_BACKEND value: {v}"),
            }
        }
        if let Ok(v) = std::env::var("LUMEN_QDRANT_URL") {
            self.index.qdrant_url = v;
        }
        if let Ok(v) = std::env::var("LUMEN_INDEX_TOP_K")
            && let Ok(k) = v.parse::<usize>()
        {
            self.index.top_k = k;
        }
        if let Ok(v) = std::env::var("LUMEN_DOMAIN") {
            match v.parse() {
                Ok(domain) => self.knowledge.domain = domain,
                Err(e) => tracing::warn!("ignoring invalid LUMEN_DOMAIN value: {e}"),
            }
        }
        if let Ok(v) = std::env::var("LUMEN_ROUTE_PREFIX") {
            self.knowledge.route_prefix = Some(v);
        }
        if let Ok(v) = std::env::var("LUMEN_GATEWAY_BIND") {
            self.gateway.bind = v;
        }
        if let Ok(v) = std::env::var("LUMEN_GATEWAY_PORT")
            && let Ok(port) = v.parse::<u16>()
        {
            self.gateway.port = port;
        }
    }

    /// Read the completion API key. `LUMEN_LLM_API_KEY` wins over `MISTRAL_API_KEY`.
    pub(crate) fn resolve_secrets(&mut self) {
        self.secrets.llm_api_key = ["LUMEN_LLM_API_KEY", "MISTRAL_API_KEY"]
            .into_iter()
            .filter_map(|key| std::env::var(key).ok())
            .find(|v| !v.trim().is_empty())
            .map(Secret::new);
    }
}
