//! Configuration, document knowledge base, retrieval and chat orchestration.

pub mod bootstrap;
pub mod chat;
pub mod config;
pub mod document;
pub mod domain;
pub mod error;
pub mod knowledge;

pub use chat::ChatService;
pub use config::Config;
pub use document::Document;
pub use domain::Domain;
pub use error::ServiceError;
pub use knowledge::KnowledgeBase;
