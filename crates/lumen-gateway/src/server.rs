use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use lumen_core::{ChatService, KnowledgeBase};
use lumen_llm::AnyProvider;
use tokio::sync::watch;

use crate::error::GatewayError;
use crate::router::build_router;

#[derive(Clone)]
pub(crate) struct AppState {
    pub chat: Arc<ChatService<AnyProvider>>,
    pub knowledge: Arc<KnowledgeBase>,
    pub started_at: Instant,
}

pub struct GatewayServer {
    addr: SocketAddr,
    route_prefix: String,
    max_body_size: usize,
    chat: Arc<ChatService<AnyProvider>>,
    shutdown_rx: watch::Receiver<bool>,
}

impl GatewayServer {
    #[must_use]
    pub fn new(
        bind: &str,
        port: u16,
        chat: Arc<ChatService<AnyProvider>>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        let addr: SocketAddr = format!("{bind}:{port}").parse().unwrap_or_else(|e| {
            tracing::warn!("invalid bind '{bind}': {e}, falling back to 127.0.0.1:{port}");
            SocketAddr::from(([127, 0, 0, 1], port))
        });

        if bind == "0.0.0.0" {
            tracing::warn!("gateway binding to 0.0.0.0, reachable from all interfaces");
        }

        let route_prefix = chat.knowledge().domain().default_route_prefix().to_owned();
        Self {
            addr,
            route_prefix,
            max_body_size: 1_048_576,
            chat,
            shutdown_rx,
        }
    }

    /// Path segment for the document endpoints, e.g. `resources` for `/resources`.
    #[must_use]
    pub fn with_route_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.route_prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn with_max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = size;
        self
    }

    /// The fully layered router, without binding a socket.
    #[must_use]
    pub fn router(&self) -> Router {
        let state = AppState {
            knowledge: Arc::clone(self.chat.knowledge()),
            chat: Arc::clone(&self.chat),
            started_at: Instant::now(),
        };
        build_router(state, &self.route_prefix, self.max_body_size)
    }

    /// Start the HTTP gateway server.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind or encounters a fatal I/O error.
    pub async fn serve(self) -> Result<(), GatewayError> {
        let router = self.router();

        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|e| GatewayError::Bind(self.addr.to_string(), e))?;
        tracing::info!(
            prefix = %self.route_prefix,
            "gateway listening on {}",
            self.addr
        );

        let mut shutdown_rx = self.shutdown_rx;
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                while !*shutdown_rx.borrow_and_update() {
                    if shutdown_rx.changed().await.is_err() {
                        std::future::pending::<()>().await;
                    }
                }
                tracing::info!("gateway shutting down");
            })
            .await
            .map_err(|e| GatewayError::Server(format!("{e}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use lumen_core::Domain;
    use lumen_llm::mock::MockProvider;
    use lumen_memory::{HashEmbedder, InMemoryVectorStore};

    use super::*;

    fn chat(domain: Domain) -> Arc<ChatService<AnyProvider>> {
        let kb = KnowledgeBase::new(
            Arc::new(InMemoryVectorStore::new()),
            Arc::new(HashEmbedder::new(32).unwrap()),
            "test",
            domain,
        );
        Arc::new(ChatService::new(
            MockProvider::default().into(),
            Arc::new(kb),
            3,
        ))
    }

    #[test]
    fn server_builder_chain() {
        let (_stx, srx) = watch::channel(false);
        let server = GatewayServer::new("127.0.0.1", 5000, chat(Domain::MentalHealth), srx)
            .with_route_prefix("library")
            .with_max_body_size(512);

        assert_eq!(server.route_prefix, "library");
        assert_eq!(server.max_body_size, 512);
    }

    #[test]
    fn route_prefix_defaults_to_domain() {
        let (_stx, srx) = watch::channel(false);
        let server = GatewayServer::new("127.0.0.1", 5000, chat(Domain::Books), srx);
        assert_eq!(server.route_prefix, "chat");
    }

    #[test]
    fn server_invalid_bind_fallback() {
        let (_stx, srx) = watch::channel(false);
        let server = GatewayServer::new("not_an_ip", 9999, chat(Domain::MentalHealth), srx);
        assert_eq!(server.addr.port(), 9999);
    }

    #[tokio::test]
    async fn serve_stops_on_shutdown_signal() {
        let (stx, srx) = watch::channel(false);
        let server = GatewayServer::new("127.0.0.1", 0, chat(Domain::MentalHealth), srx);
        let handle = tokio::spawn(server.serve());
        stx.send(true).unwrap();
        handle.await.unwrap().unwrap();
    }
}
