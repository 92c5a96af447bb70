//! Health check endpoint.

use axum::Json;
use axum::extract::State;
use serde_json::{Value, json};

use palaver_types::identity::IdentityProviderKind;

use crate::state::AppState;

/// GET /health
///
/// Unauthenticated. Reports which optional providers are configured.
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "ok": true,
        "geminiEnabled": state.chat_service.generation().enabled(),
        "googleAuthEnabled": state.auth_service.provider_enabled(IdentityProviderKind::Google),
        "firebaseEnabled": state.auth_service.provider_enabled(IdentityProviderKind::Firebase),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
