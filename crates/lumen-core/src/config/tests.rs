use std::io::Write;

use serial_test::serial;

use super::*;
use crate::domain::Domain;
use crate::knowledge::DeleteStrategy;

const ENV_KEYS: [&str; 13] = [
    "LUMEN_LLM_BASE_URL",
    "LUMEN_LLM_MODEL",
    "LUMEN_LLM_API_KEY",
    "MISTRAL_API_KEY",
    "LUMEN_EMBEDDING_PROVIDER",
    "LUMEN_INDEX_BACKEND",
    "LUMEN_QDRANT_URL",
    "LUMEN_INDEX_TOP_K",
    "LUMEN_DOMAIN",
    "LUMEN_ROUTE_PREFIX",
    "LUMEN_GATEWAY_BIND",
    "LUMEN_GATEWAY_PORT",
    "LUMEN_CONFIG",
];

fn clear_env() {
    for key in ENV_KEYS {
        unsafe { std::env::remove_var(key) };
    }
}

fn write_config(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn defaults_when_file_missing() {
    let config = Config::default();
    assert_eq!(config.llm.base_url, "https://api.mistral.ai/v1");
    assert_eq!(config.llm.model, "open-mistral-7b");
    assert_eq!(config.llm.max_tokens, 1024);
    assert_eq!(config.embedding.provider, EmbeddingProviderKind::Hash);
    assert_eq!(config.embedding.dimension, 384);
    assert_eq!(config.index.backend, IndexBackend::Memory);
    assert_eq!(config.index.top_k, 3);
    assert_eq!(config.index.delete_strategy, DeleteStrategy::PerPoint);
    assert_eq!(config.knowledge.domain, Domain::MentalHealth);
    assert_eq!(config.gateway.port, 5000);
    assert!(config.secrets.llm_api_key.is_none());
}

#[test]
#[serial]
fn load_missing_file_uses_defaults() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config.gateway.port, 5000);
    assert_eq!(config.route_prefix(), "resources");
    assert_eq!(config.collection(), "mental_health_resources");
}

#[test]
#[serial]
fn load_parses_all_sections() {
    clear_env();
    let file = write_config(
        r#"
[llm]
base_url = "http://localhost:8080/v1"
model = "tiny"

[embedding]
provider = "llm"
dimension = 1024

[index]
collection = "shelf"
top_k = 5
delete_strategy = "rebuild"
distance = "dot"

[knowledge]
domain = "books"

[gateway]
port = 8088
"#,
    );
    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.llm.base_url, "http://localhost:8080/v1");
    assert_eq!(config.llm.model, "tiny");
    assert_eq!(config.llm.max_tokens, 1024);
    assert_eq!(config.embedding.provider, EmbeddingProviderKind::Llm);
    assert_eq!(config.embedding.dimension, 1024);
    assert_eq!(config.index.top_k, 5);
    assert_eq!(config.index.delete_strategy, DeleteStrategy::Rebuild);
    assert_eq!(config.index.distance, lumen_memory::Distance::Dot);
    assert_eq!(config.knowledge.domain, Domain::Books);
    assert_eq!(config.route_prefix(), "chat");
    assert_eq!(config.collection(), "shelf");
    assert_eq!(config.gateway.port, 8088);
    assert_eq!(config.gateway.bind, "127.0.0.1");
}

#[test]
#[serial]
fn load_rejects_malformed_toml() {
    clear_env();
    let file = write_config("[index\ntop_k = ");
    assert!(Config::load(file.path()).is_err());
}

#[test]
#[serial]
fn env_overrides_file_values() {
    clear_env();
    let file = write_config("[gateway]\nport = 7000\n");
    unsafe {
        std::env::set_var("LUMEN_GATEWAY_PORT", "7100");
        std::env::set_var("LUMEN_DOMAIN", "books");
        std::env::set_var("LUMEN_INDEX_TOP_K", "4");
        std::env::set_var("LUMEN_ROUTE_PREFIX", "library");
        std::env::set_var("LUMEN_EMBEDDING_PROVIDER", "llm");
    }
    let config = Config::load(file.path()).unwrap();
    clear_env();

    assert_eq!(config.gateway.port, 7100);
    assert_eq!(config.knowledge.domain, Domain::Books);
    assert_eq!(config.index.top_k, 4);
    assert_eq!(config.route_prefix(), "library");
    assert_eq!(config.embedding.provider, EmbeddingProviderKind::Llm);
}

#[test]
#[serial]
fn invalid_env_values_are_ignored() {
    clear_env();
    unsafe {
        std::env::set_var("LUMEN_GATEWAY_PORT", "not-a-port");
        std::env::set_var("LUMEN_DOMAIN", "poetry");
        std::env::set_var("LUMEN_INDEX_BACKEND", "sqlite");
    }
    let config = Config::load(std::path::Path::new("/nonexistent/lumen.toml")).unwrap();
    clear_env();

    assert_eq!(config.gateway.port, 5000);
    assert_eq!(config.knowledge.domain, Domain::MentalHealth);
    assert_eq!(config.index.backend, IndexBackend::Memory);
}

#[test]
#[serial]
fn api_key_prefers_lumen_variable() {
    clear_env();
    unsafe {
        std::env::set_var("MISTRAL_API_KEY", "fallback");
    }
    let config = Config::load(std::path::Path::new("/nonexistent/lumen.toml")).unwrap();
    assert_eq!(config.secrets.llm_api_key.as_ref().unwrap().expose(), "fallback");

    unsafe {
        std::env::set_var("LUMEN_LLM_API_KEY", "primary");
    }
    let config = Config::load(std::path::Path::new("/nonexistent/lumen.toml")).unwrap();
    clear_env();
    assert_eq!(config.secrets.llm_api_key.as_ref().unwrap().expose(), "primary");
}

#[test]
fn secret_is_redacted() {
    let secret = Secret::new("sk-very-secret");
    assert_eq!(format!("{secret:?}"), "[REDACTED]");
    assert_eq!(secret.to_string(), "[REDACTED]");
}

#[test]
fn validate_rejects_bad_values() {
    let mut config = Config::default();
    assert!(config.validate().is_ok());

    config.index.top_k = 0;
    assert!(config.validate().is_err());
    config.index.top_k = 3;

    config.embedding.dimension = 0;
    assert!(config.validate().is_err());
    config.embedding.dimension = 384;

    config.knowledge.route_prefix = Some("health".into());
    assert!(config.validate().is_err());

    config.knowledge.route_prefix = Some("a/b".into());
    assert!(config.validate().is_err());

    config.knowledge.route_prefix = Some("/books/".into());
    assert!(config.validate().is_ok());
    assert_eq!(config.route_prefix(), "books");
}

#[test]
fn empty_overrides_fall_back_to_domain_defaults() {
    let mut config = Config::default();
    config.knowledge.domain = Domain::Books;
    config.knowledge.route_prefix = Some(String::new());
    config.index.collection = Some(String::new());
    assert_eq!(config.route_prefix(), "chat");
    assert_eq!(config.collection(), "book_knowledge");
}

#[test]
fn print_round_trips_through_toml() {
    let config = Config::default();
    let rendered = toml::to_string_pretty(&config).unwrap();
    assert!(rendered.contains("[gateway]"));
    let back: Config = toml::from_str(&rendered).unwrap();
    assert_eq!(back.gateway.port, config.gateway.port);
    assert_eq!(back.knowledge.domain, config.knowledge.domain);
}
