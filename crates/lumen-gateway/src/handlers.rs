use std::collections::HashMap;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use lumen_core::{Document, ServiceError};

use super::error::ApiError;
use super::server::AppState;

#[derive(serde::Serialize)]
struct ChatResponse {
    response: String,
}

#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    documents: usize,
}

/// Parse a request body leniently: anything that is not valid JSON reads as `null`,
/// so handlers report their usual "missing field" message.
fn parse_body(body: &Bytes) -> serde_json::Value {
    serde_json::from_slice(body).unwrap_or(serde_json::Value::Null)
}

fn string_field(body: &serde_json::Value, field: &str) -> String {
    body.get(field)
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default()
        .to_owned()
}

pub(crate) async fn chat_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let user_input = string_field(&parse_body(&body), "user_input");
    let response = state.chat.respond(&user_input).await?;
    Ok(Json(ChatResponse { response }))
}

pub(crate) async fn add_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let domain = state.knowledge.domain();
    let document = Document::from_json(parse_body(&body)).ok_or_else(|| {
        ServiceError::InvalidRequest(format!("Invalid {} data", domain.noun()))
    })?;
    let document = state.knowledge.add(document).await?;

    let mut response = serde_json::Map::new();
    response.insert(
        "message".into(),
        format!("{} added", domain.noun_title()).into(),
    );
    response.insert(
        domain.noun().into(),
        serde_json::to_value(&document).map_err(ServiceError::from)?,
    );
    Ok(Json(serde_json::Value::Object(response)))
}

pub(crate) async fn delete_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let name = string_field(&parse_body(&body), "name");
    state.knowledge.remove(&name).await?;
    let message = format!(
        "{} '{name}' deleted.",
        state.knowledge.domain().noun_title()
    );
    Ok(Json(serde_json::json!({ "message": message })))
}

pub(crate) async fn lookup_handler(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
    let name = params
        .get("input")
        .or_else(|| params.get("name"))
        .map_or("", String::as_str);
    let document = state.knowledge.lookup(name).await?;
    Ok(Json(document))
}

pub(crate) async fn list_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.knowledge.list().await)
}

pub(crate) async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: state.started_at.elapsed().as_secs(),
        documents: state.knowledge.len().await,
    })
}
