//! Session authentication extractors.
//!
//! The session token is read from the `palaver_session` cookie, else from
//! `Authorization: Bearer <token>`, and resolved through `AuthService`.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use palaver_types::error::AuthError;
use palaver_types::user::User;

use crate::http::cookie::session_token;
use crate::http::error::AppError;
use crate::state::AppState;

/// The user behind the request's session. Extraction fails with 401 when
/// the token is missing, unknown, expired, or its user is gone.
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers).ok_or(AuthError::Unauthenticated)?;
        let user = state.auth_service.resolve(&token).await?;
        Ok(CurrentUser(user))
    }
}

/// The raw session token, if the request carries one. Never rejects.
pub struct SessionToken(pub Option<String>);

impl<S: Send + Sync> FromRequestParts<S> for SessionToken {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(SessionToken(session_token(&parts.headers)))
    }
}
