//! Chat HTTP handlers. Every endpoint requires a session.
//!
//! Endpoints:
//! - GET    /chats               - List the caller's chats
//! - POST   /chats               - Create a chat
//! - GET    /chats/{id}          - A chat with its messages
//! - PUT    /chats/{id}          - Rename a chat
//! - DELETE /chats/{id}          - Delete a chat and its messages
//! - POST   /chats/{id}/messages - Run a chat turn
//!
//! Chats owned by someone else are indistinguishable from missing ones.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::http::error::AppError;
use crate::http::extractors::auth::CurrentUser;
use crate::http::extractors::json::{ApiJson, OptionalApiJson};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateChatRequest {
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateChatRequest {
    pub title: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendMessageRequest {
    pub message: String,
    /// Optional free-form context forwarded to the generation provider.
    #[serde(default)]
    pub context: Option<serde_json::Map<String, serde_json::Value>>,
}

/// An unparsable id cannot name an existing chat.
fn parse_chat_id(id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id).map_err(|_| AppError::Chat(palaver_types::error::ChatError::NotFound))
}

/// GET /chats
pub async fn list_chats(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let chats = state.chat_service.list_chats(&user.id).await?;
    Ok(Json(json!({ "chats": chats })))
}

/// POST /chats
pub async fn create_chat(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    OptionalApiJson(body): OptionalApiJson<CreateChatRequest>,
) -> Result<impl IntoResponse, AppError> {
    let title = body.unwrap_or_default().title;
    let chat = state.chat_service.create_chat(&user.id, title).await?;
    Ok((StatusCode::CREATED, Json(json!({ "chat": chat }))))
}

/// GET /chats/{id}
pub async fn get_chat(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let chat_id = parse_chat_id(&id)?;
    let chat = state.chat_service.get_chat(&user.id, &chat_id).await?;
    Ok(Json(json!({ "chat": chat })))
}

/// PUT /chats/{id}
pub async fn update_chat(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateChatRequest>,
) -> Result<impl IntoResponse, AppError> {
    let chat_id = parse_chat_id(&id)?;
    let chat = state
        .chat_service
        .update_chat_title(&user.id, &chat_id, &body.title)
        .await?;
    Ok(Json(json!({ "chat": chat })))
}

/// DELETE /chats/{id}
pub async fn delete_chat(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let chat_id = parse_chat_id(&id)?;
    state.chat_service.delete_chat(&user.id, &chat_id).await?;
    Ok(Json(json!({ "success": true })))
}

/// POST /chats/{id}/messages
///
/// The turn runs on its own tracked task: if the client disconnects, this
/// handler's future is dropped but the turn still finishes persisting both
/// messages, and shutdown waits for it.
pub async fn send_message(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<SendMessageRequest>,
) -> Result<impl IntoResponse, AppError> {
    let chat_id = parse_chat_id(&id)?;
    let service = state.chat_service.clone();
    let owner = user.id;

    let turn = state
        .turns
        .spawn(async move {
            service
                .send_message(&owner, &chat_id, &body.message, body.context)
                .await
        })
        .await
        .map_err(|e| AppError::Internal(format!("chat turn task failed: {e}")))??;

    Ok(Json(turn))
}
