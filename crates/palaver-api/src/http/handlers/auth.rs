//! Authentication HTTP handlers.
//!
//! Endpoints:
//! - POST /auth/{provider} - Exchange a provider ID token for a session
//! - POST /auth/logout     - End the current session
//! - GET  /auth/me         - The signed-in user

use axum::Json;
use axum::extract::{Path, State};
use axum::http::header::SET_COOKIE;
use axum::response::IntoResponse;
use serde::Deserialize;
use serde_json::json;

use palaver_types::error::AuthError;

use crate::http::cookie::clearing_cookie;
use crate::http::error::AppError;
use crate::http::extractors::auth::SessionToken;
use crate::http::extractors::json::ApiJson;
use crate::state::AppState;

/// Request body for login.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    /// Provider ID token. A missing token is reported by the service.
    #[serde(default)]
    pub token: String,
}

/// POST /auth/{provider}
pub async fn login(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = state.auth_service.login(&provider, &body.token).await?;

    let cookie = state.cookies.session_cookie(&outcome.session_token);
    Ok((
        [(SET_COOKIE, cookie)],
        Json(json!({
            "user": outcome.user,
            "session_token": outcome.session_token,
        })),
    ))
}

/// POST /auth/logout
pub async fn logout(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
) -> Result<impl IntoResponse, AppError> {
    state.auth_service.logout(token.as_deref()).await?;
    Ok(([(SET_COOKIE, clearing_cookie())], Json(json!({ "success": true }))))
}

/// GET /auth/me
///
/// Unlike the chat endpoints, a session whose user has disappeared answers
/// 404 here.
pub async fn me(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
) -> Result<impl IntoResponse, AppError> {
    let token = token.ok_or(AuthError::Unauthenticated)?;
    let user = state
        .auth_service
        .resolve(&token)
        .await
        .map_err(|e| match e {
            AuthError::UserGone => AppError::UserNotFound,
            other => AppError::Auth(other),
        })?;

    Ok(Json(json!({ "user": user })))
}
