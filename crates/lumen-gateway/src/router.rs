use axum::Router;
use axum::routing::{get, post};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use super::handlers::{
    add_handler, chat_handler, delete_handler, health_handler, list_handler, lookup_handler,
};
use super::server::AppState;

/// `POST /chat` always answers chat. When the document prefix is also `chat`, the
/// document routes share that path and adding is only available through `PUT`.
pub(crate) fn build_router(state: AppState, route_prefix: &str, max_body_size: usize) -> Router {
    let documents = get(lookup_handler)
        .put(add_handler)
        .delete(delete_handler);
    let document_path = format!("/{route_prefix}");

    let api = if route_prefix == "chat" {
        Router::new().route("/chat", documents.post(chat_handler))
    } else {
        Router::new()
            .route("/chat", post(chat_handler))
            .route(&document_path, documents.post(add_handler))
    };

    Router::new()
        .route("/health", get(health_handler))
        .merge(api)
        .route(&format!("{document_path}/all"), get(list_handler))
        .layer(RequestBodyLimitLayer::new(max_body_size))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Instant;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use lumen_core::{ChatService, Domain, KnowledgeBase};
    use lumen_llm::mock::MockProvider;
    use lumen_memory::{HashEmbedder, InMemoryVectorStore};
    use tower::ServiceExt;

    use super::*;

    async fn test_state(domain: Domain, provider: MockProvider) -> AppState {
        let kb = KnowledgeBase::new(
            Arc::new(InMemoryVectorStore::new()),
            Arc::new(HashEmbedder::new(128).unwrap()),
            domain.default_collection(),
            domain,
        );
        kb.bootstrap(domain.seed_documents()).await.unwrap();
        let kb = Arc::new(kb);
        AppState {
            chat: Arc::new(ChatService::new(provider.into(), Arc::clone(&kb), 3)),
            knowledge: kb,
            started_at: Instant::now(),
        }
    }

    async fn make_router(domain: Domain, provider: MockProvider) -> (Router, AppState) {
        let state = test_state(domain, provider).await;
        let router = build_router(
            state.clone(),
            domain.default_route_prefix(),
            1_048_576,
        );
        (router, state)
    }

    fn json_request(method: &str, uri: &str, body: &serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap()
    }

    async fn send(app: Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let (app, _) = make_router(Domain::MentalHealth, MockProvider::default()).await;
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let (status, json) = send(app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert_eq!(json["documents"], 3);
    }

    #[tokio::test]
    async fn chat_returns_completion() {
        let mock = MockProvider::with_responses(vec!["Breathe slowly.".into()]);
        let (app, _) = make_router(Domain::MentalHealth, mock.clone()).await;
        let (status, json) = send(
            app,
            json_request(
                "POST",
                "/chat",
                &serde_json::json!({"user_input": "I feel anxious"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["response"], "Breathe slowly.");
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn chat_without_input_is_rejected_before_provider() {
        let mock = MockProvider::default();
        let (app, _) = make_router(Domain::MentalHealth, mock.clone()).await;
        for body in [serde_json::json!({}), serde_json::json!({"user_input": ""})] {
            let (status, json) = send(app.clone(), json_request("POST", "/chat", &body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(json["error"], "No user input provided");
        }
        let req = Request::builder()
            .method("POST")
            .uri("/chat")
            .body(Body::from("not json"))
            .unwrap();
        let (status, _) = send(app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn chat_upstream_failure_is_generic_500() {
        let (app, _) = make_router(Domain::Books, MockProvider::failing()).await;
        let (status, json) = send(
            app,
            json_request("POST", "/chat", &serde_json::json!({"user_input": "hi"})),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json, serde_json::json!({"error": "Internal server error"}));
    }

    #[tokio::test]
    async fn add_resource() {
        let (app, state) = make_router(Domain::MentalHealth, MockProvider::default()).await;
        let doc = serde_json::json!({
            "name": "Journaling",
            "description": "Writing down your thoughts to process emotions.",
            "category": "Exercise"
        });
        let (status, json) = send(app, json_request("POST", "/resources", &doc)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Resource added");
        assert_eq!(json["resource"], doc);
        assert_eq!(state.knowledge.len().await, 4);
    }

    #[tokio::test]
    async fn add_invalid_resource_leaves_list_unchanged() {
        let (app, state) = make_router(Domain::MentalHealth, MockProvider::default()).await;
        for body in [
            serde_json::json!({"name": "Journaling"}),
            serde_json::json!({"description": "No name"}),
            serde_json::json!("just a string"),
        ] {
            let (status, json) =
                send(app.clone(), json_request("POST", "/resources", &body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(json["error"], "Invalid resource data");
        }
        assert_eq!(state.knowledge.len().await, 3);
    }

    #[tokio::test]
    async fn delete_resource() {
        let (app, state) = make_router(Domain::MentalHealth, MockProvider::default()).await;
        let (status, json) = send(
            app.clone(),
            json_request(
                "DELETE",
                "/resources",
                &serde_json::json!({"name": "Calm Music"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Resource 'Calm Music' deleted.");
        assert_eq!(state.knowledge.len().await, 2);

        let (status, json) = send(
            app,
            json_request("DELETE", "/resources", &serde_json::json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "No name provided");
    }

    #[tokio::test]
    async fn books_lookup_by_input() {
        let (app, _) = make_router(Domain::Books, MockProvider::default()).await;
        let req = Request::builder()
            .uri("/chat?input=Pride%20and%20Prejudice")
            .body(Body::empty())
            .unwrap();
        let (status, json) = send(app.clone(), req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["author"], "Jane Austen");
        assert_eq!(json["year"], 1813);

        let req = Request::builder()
            .uri("/chat?input=Dune")
            .body(Body::empty())
            .unwrap();
        let (status, json) = send(app.clone(), req).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "chat not found");

        let req = Request::builder().uri("/chat").body(Body::empty()).unwrap();
        let (status, json) = send(app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "No name provided");
    }

    #[tokio::test]
    async fn books_add_via_put_and_chat_via_post_share_path() {
        let mock = MockProvider::default();
        let (app, state) = make_router(Domain::Books, mock.clone()).await;
        let doc = serde_json::json!({
            "name": "Dune",
            "description": "Politics and prophecy on a desert planet.",
            "author": "Frank Herbert",
            "year": 1965
        });
        let (status, json) = send(app.clone(), json_request("PUT", "/chat", &doc)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Chat added");
        assert_eq!(json["chat"]["name"], "Dune");
        assert_eq!(state.knowledge.len().await, 4);

        let (status, _) = send(
            app,
            json_request("POST", "/chat", &serde_json::json!({"user_input": "desert"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(mock.call_count(), 1);
        assert_eq!(state.knowledge.len().await, 4);
    }

    #[tokio::test]
    async fn book_with_untyped_year_is_stored_verbatim() {
        let (app, state) = make_router(Domain::Books, MockProvider::default()).await;
        let doc = serde_json::json!({
            "name": "Beowulf",
            "description": "An Old English epic.",
            "year": "c. 1000"
        });
        let (status, json) = send(app.clone(), json_request("PUT", "/chat", &doc)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["chat"], doc);
        assert_eq!(state.knowledge.len().await, 4);

        let req = Request::builder()
            .uri("/chat?name=Beowulf")
            .body(Body::empty())
            .unwrap();
        let (status, json) = send(app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["year"], "c. 1000");
    }

    #[tokio::test]
    async fn list_documents() {
        let (app, _) = make_router(Domain::MentalHealth, MockProvider::default()).await;
        let req = Request::builder()
            .uri("/resources/all")
            .body(Body::empty())
            .unwrap();
        let (status, json) = send(app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json.as_array().unwrap().len(), 3);
        assert_eq!(json[0]["name"], "Mindful Breathing");
    }

    #[tokio::test]
    async fn custom_prefix_routes() {
        let state = test_state(Domain::Books, MockProvider::default()).await;
        let app = build_router(state, "library", 1_048_576);
        let doc = serde_json::json!({"name": "Emma", "description": "Matchmaking."});
        let (status, json) = send(app.clone(), json_request("POST", "/library", &doc)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["chat"]["name"], "Emma");

        let req = Request::builder()
            .uri("/library?name=Emma")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(app, req).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn body_size_limit() {
        let state = test_state(Domain::MentalHealth, MockProvider::default()).await;
        let app = build_router(state, "resources", 64);
        let oversized = vec![b'a'; 128];
        let req = Request::builder()
            .method("POST")
            .uri("/resources")
            .header("content-type", "application/json")
            .body(Body::from(oversized))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
