//! API route handlers for the gateway.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures::{Stream, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use ward_core::AppError;
use ward_knowledge::{AliasInput, ChatReply, ChunkInput};

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::server::AppState;

type ApiResult<T> = Result<T, ApiError>;

/// Body of the chat endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
}

/// Health check endpoint.
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// List every stored chunk.
pub async fn get_chunks(State(state): State<Arc<AppState>>) -> ApiResult<Json<serde_json::Value>> {
    let chunks = state.chat.list_chunks().await?;
    if chunks.is_empty() {
        return Ok(Json(serde_json::json!({
            "message": "No chunks available",
            "chunks": [],
        })));
    }
    Ok(Json(serde_json::json!({ "chunks": chunks })))
}

/// List every stored alias.
pub async fn get_alias(State(state): State<Arc<AppState>>) -> ApiResult<Json<serde_json::Value>> {
    let aliases = state.chat.list_aliases().await?;
    if aliases.is_empty() {
        return Ok(Json(serde_json::json!({
            "message": "No alias available",
            "alias": [],
        })));
    }
    Ok(Json(serde_json::json!({ "alias": aliases })))
}

pub async fn create_alias(
    State(state): State<Arc<AppState>>,
    ApiJson(input): ApiJson<AliasInput>,
) -> ApiResult<(StatusCode, Json<serde_json::Value>)> {
    let created = state.chat.create_alias(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "Alias created successfully",
            "data": created,
        })),
    ))
}

pub async fn delete_alias(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    state.chat.delete_alias(&id).await?;
    Ok(Json(serde_json::json!({ "message": "Alias deleted successfully" })))
}

pub async fn update_chunk(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<ChunkInput>,
) -> ApiResult<Json<serde_json::Value>> {
    let chunk = state.chat.update_chunk(&id, input).await?;
    Ok(Json(serde_json::json!({
        "message": "Chunk updated successfully",
        "data": [chunk],
    })))
}

pub async fn update_alias(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<AliasInput>,
) -> ApiResult<Json<serde_json::Value>> {
    let alias = state.chat.update_alias(&id, input).await?;
    Ok(Json(serde_json::json!({
        "message": "Alias updated successfully",
        "data": [alias],
    })))
}

/// Answer a message in one response.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<ChatRequest>,
) -> ApiResult<Json<ChatReply>> {
    let reply = state.chat.answer(&request.message).await?;
    Ok(Json(reply))
}

/// Answer a message as server-sent events.
///
/// Each event carries one JSON object: `{"log": ..}` while the query is
/// routed, then a final `{"replies": [..]}` or `{"error": ".."}`.
pub async fn chat_stream(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<ChatRequest>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, axum::Error>> + Send>> {
    if request.message.trim().is_empty() {
        return Err(AppError::Validation("Message cannot be empty".to_string()).into());
    }

    let events = state
        .chat
        .clone()
        .stream(request.message)
        .map(|event| Event::default().json_data(event));

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
