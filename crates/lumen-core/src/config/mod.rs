mod env;
mod types;

#[cfg(test)]
mod tests;

pub use types::*;

use std::path::Path;

use anyhow::{Context, bail};

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str::<Self>(&content).context("failed to parse config file")?
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        config.resolve_secrets();
        Ok(config)
    }

    /// Reject values that would make the service unusable.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid setting.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.index.top_k == 0 {
            bail!("index.top_k must be at least 1");
        }
        if self.embedding.dimension == 0 {
            bail!("embedding.dimension must be positive");
        }
        if self.gateway.max_body_size == 0 {
            bail!("gateway.max_body_size must be positive");
        }
        let prefix = self.route_prefix();
        if prefix.is_empty()
            || prefix == "health"
            || !prefix
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            bail!("knowledge.route_prefix '{prefix}' must be a single path segment other than 'health'");
        }
        Ok(())
    }

    /// Route segment for the document endpoints, without slashes.
    #[must_use]
    pub fn route_prefix(&self) -> String {
        self.knowledge
            .route_prefix
            .as_deref()
            .map(|p| p.trim_matches('/'))
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| self.knowledge.domain.default_route_prefix())
            .to_owned()
    }

    #[must_use]
    pub fn collection(&self) -> String {
        self.index
            .collection
            .as_deref()
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| self.knowledge.domain.default_collection())
            .to_owned()
    }
}
