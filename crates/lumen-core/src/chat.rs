use std::sync::Arc;

use lumen_llm::{LlmProvider, Message};

use crate::document::Document;
use crate::domain::Domain;
use crate::error::ServiceError;
use crate::knowledge::KnowledgeBase;

/// Retrieval-augmented chat: top-k documents are rendered into a context message
/// ahead of the user's input.
pub struct ChatService<P> {
    provider: P,
    knowledge: Arc<KnowledgeBase>,
    top_k: usize,
}

impl<P: std::fmt::Debug> std::fmt::Debug for ChatService<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatService")
            .field("provider", &self.provider)
            .field("top_k", &self.top_k)
            .finish_non_exhaustive()
    }
}

impl<P: LlmProvider> ChatService<P> {
    #[must_use]
    pub fn new(provider: P, knowledge: Arc<KnowledgeBase>, top_k: usize) -> Self {
        Self {
            provider,
            knowledge,
            top_k,
        }
    }

    #[must_use]
    pub fn provider(&self) -> &P {
        &self.provider
    }

    #[must_use]
    pub fn knowledge(&self) -> &Arc<KnowledgeBase> {
        &self.knowledge
    }

    /// Answer `user_input` grounded in the closest documents.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` for blank input (nothing is retrieved or sent). Retrieval or
    /// completion failures are returned as-is; there is no context-free fallback.
    pub async fn respond(&self, user_input: &str) -> Result<String, ServiceError> {
        if user_input.trim().is_empty() {
            return Err(ServiceError::InvalidRequest("No user input provided".into()));
        }

        let context = self.knowledge.retrieve(user_input, self.top_k).await?;
        tracing::debug!(
            retrieved = context.len(),
            provider = self.provider.name(),
            "sending chat completion"
        );
        let messages = build_messages(self.knowledge.domain(), &context, user_input);
        let reply = self.provider.chat(&messages).await?;
        Ok(reply)
    }
}

fn build_messages(domain: Domain, context: &[Document], user_input: &str) -> Vec<Message> {
    let lines: Vec<String> = context.iter().map(Document::context_line).collect();
    vec![
        Message::system(domain.system_prompt()),
        Message::system(format!("{}\n{}", domain.context_heading(), lines.join("\n"))),
        Message::user(user_input),
    ]
}
