//! Application error type mapping to HTTP status codes.
//!
//! Every error body has the shape `{"error": <message>, "code": <CODE>}`.
//! Storage failures are logged here and answered with a generic message.

use axum::Json;
use axum::http::StatusCode;
use axum::http::header::SET_COOKIE;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use palaver_types::error::{AuthError, ChatError};

use crate::http::cookie::clearing_cookie;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Login and session resolution errors.
    Auth(AuthError),
    /// Chat errors.
    Chat(ChatError),
    /// Malformed request body or parameters.
    BadRequest(String),
    /// The session's user no longer exists (`GET /auth/me` only).
    UserNotFound,
    /// Unknown route or resource.
    NotFound(String),
    /// Generic internal error.
    Internal(String),
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        AppError::Auth(e)
    }
}

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        AppError::Chat(e)
    }
}

impl AppError {
    /// Status, machine code, and client-facing message.
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Auth(AuthError::Unauthenticated) | AppError::Auth(AuthError::UserGone) => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHENTICATED",
                "Not authenticated".to_string(),
            ),
            AppError::Auth(AuthError::InvalidCredential(_)) => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIAL",
                "Invalid token".to_string(),
            ),
            AppError::Auth(AuthError::KeysUnavailable(_)) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "IDENTITY_PROVIDER_UNAVAILABLE",
                "Identity provider unavailable".to_string(),
            ),
            AppError::Auth(AuthError::BadRequest(msg)) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone())
            }
            AppError::Auth(AuthError::Storage(_)) | AppError::Chat(ChatError::StorageUnavailable(_)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORAGE_UNAVAILABLE",
                "Storage unavailable".to_string(),
            ),
            AppError::Chat(ChatError::EmptyMessage) => (
                StatusCode::BAD_REQUEST,
                "EMPTY_MESSAGE",
                "Message cannot be empty".to_string(),
            ),
            AppError::Chat(ChatError::NotFound) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                "Chat not found".to_string(),
            ),
            AppError::Chat(ChatError::BadRequest(msg)) | AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone())
            }
            AppError::UserNotFound => (
                StatusCode::NOT_FOUND,
                "USER_NOT_FOUND",
                "User not found".to_string(),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Auth(AuthError::Internal(_)) | AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal server error".to_string(),
            ),
        }
    }

    /// Whether the response should remove a stale session cookie.
    fn clears_session(&self) -> bool {
        matches!(
            self,
            AppError::Auth(AuthError::Unauthenticated)
                | AppError::Auth(AuthError::UserGone)
                | AppError::UserNotFound
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), code, error = ?self, "Request failed");
        }

        let body = Json(json!({ "error": message, "code": code }));
        if self.clears_session() {
            (status, [(SET_COOKIE, clearing_cookie())], body).into_response()
        } else {
            (status, body).into_response()
        }
    }
}
