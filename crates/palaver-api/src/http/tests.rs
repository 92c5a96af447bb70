//! Router-level tests: real SQLite store, fake identity verifier, stub
//! generation.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, Method, Request, StatusCode};
use http_body_util::BodyExt;
use secrecy::SecretString;
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::sync::Notify;
use tower::ServiceExt;

use palaver_core::identity::box_verifier::BoxIdentityVerifier;
use palaver_core::identity::registry::VerifierRegistry;
use palaver_core::identity::verifier::IdentityVerifier;
use palaver_core::llm::box_provider::BoxLlmProvider;
use palaver_core::llm::generation::GenerationClient;
use palaver_core::llm::provider::LlmProvider;
use palaver_infra::sqlite::pool::DatabasePool;
use palaver_types::error::IdentityError;
use palaver_types::identity::{IdentityProviderKind, VerifiedIdentity};
use palaver_types::llm::{GenerationRequest, LlmError};

use crate::http::router::{build_router, cors_layer};
use crate::state::AppState;

/// Accepts `valid:<sub>`; `keys-down` simulates an unreachable key endpoint.
struct FakeGoogle;

impl IdentityVerifier for FakeGoogle {
    fn provider(&self) -> IdentityProviderKind {
        IdentityProviderKind::Google
    }

    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, IdentityError> {
        if token == "keys-down" {
            return Err(IdentityError::KeysUnavailable("connection refused".into()));
        }
        let sub = token
            .strip_prefix("valid:")
            .ok_or_else(|| IdentityError::InvalidCredential("bad signature".into()))?;
        Ok(VerifiedIdentity {
            provider: IdentityProviderKind::Google,
            external_id: sub.to_string(),
            email: format!("{sub}@example.com"),
            display_name: sub.to_uppercase(),
            avatar_url: None,
        })
    }
}

/// Signals when a generation starts, then takes a while to answer.
struct SlowProvider {
    started: Arc<Notify>,
}

impl LlmProvider for SlowProvider {
    fn name(&self) -> &str {
        "slow"
    }

    async fn complete(&self, request: &GenerationRequest) -> Result<String, LlmError> {
        self.started.notify_one();
        tokio::time::sleep(Duration::from_millis(200)).await;
        Ok(format!("slow reply to {}", request.latest_user_message().unwrap_or("")))
    }
}

struct TestApp {
    router: Router,
    state: AppState,
    _dir: TempDir,
}

struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Value,
}

async fn test_pool() -> (DatabasePool, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("api.db").display());
    (DatabasePool::new(&url).await.unwrap(), dir)
}

async fn test_app() -> TestApp {
    test_app_with(GenerationClient::stub()).await
}

async fn test_app_with(generation: GenerationClient) -> TestApp {
    let (pool, dir) = test_pool().await;

    let mut verifiers = VerifierRegistry::new();
    verifiers.register(BoxIdentityVerifier::new(FakeGoogle));

    let state = AppState::assemble(
        pool,
        verifiers,
        generation,
        &SecretString::from("test-session-secret".to_string()),
        24,
        false,
    )
    .unwrap();
    let router = build_router(state.clone(), cors_layer(&[]));

    TestApp {
        router,
        state,
        _dir: dir,
    }
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        TestResponse {
            status,
            headers,
            body,
        }
    }

    async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    async fn raw_json(&self, method: Method, uri: &str, token: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// Log in as `sub` and return the session token.
    async fn login(&self, sub: &str) -> String {
        let resp = self
            .call(
                Method::POST,
                "/auth/google",
                None,
                Some(json!({ "token": format!("valid:{sub}") })),
            )
            .await;
        assert_eq!(resp.status, StatusCode::OK, "{:?}", resp.body);
        resp.body["session_token"].as_str().unwrap().to_string()
    }

    async fn create_chat(&self, token: &str) -> String {
        let resp = self.call(Method::POST, "/chats", Some(token), None).await;
        assert_eq!(resp.status, StatusCode::CREATED);
        resp.body["chat"]["id"].as_str().unwrap().to_string()
    }

    async fn message_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM messages")
            .fetch_one(&self.state.db_pool.reader)
            .await
            .unwrap()
    }
}

fn set_cookie(resp: &TestResponse) -> &str {
    resp.headers.get(SET_COOKIE).unwrap().to_str().unwrap()
}

// ---------------------------------------------------------------------------
// Health and routing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_health_reports_enabled_providers() {
    let app = test_app().await;
    let resp = app.call(Method::GET, "/health", None, None).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["ok"], true);
    assert_eq!(resp.body["geminiEnabled"], false);
    assert_eq!(resp.body["googleAuthEnabled"], true);
    assert_eq!(resp.body["firebaseEnabled"], false);
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let app = test_app().await;
    let resp = app.call(Method::GET, "/nope", None, None).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.body["code"], "NOT_FOUND");
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_login_sets_cookie_and_me_accepts_it() {
    let app = test_app().await;
    let resp = app
        .call(
            Method::POST,
            "/auth/google",
            None,
            Some(json!({ "token": "valid:alice" })),
        )
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["user"]["email"], "alice@example.com");
    assert_eq!(resp.body["user"]["external_id"], "alice");
    let token = resp.body["session_token"].as_str().unwrap();
    let cookie = set_cookie(&resp);
    assert!(cookie.starts_with(&format!("palaver_session={token};")));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Max-Age=86400"));

    let request = Request::builder()
        .uri("/auth/me")
        .header(COOKIE, format!("theme=dark; palaver_session={token}"))
        .body(Body::empty())
        .unwrap();
    let me = app.send(request).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["user"]["id"], resp.body["user"]["id"]);
}

#[tokio::test]
async fn test_repeat_login_reuses_user() {
    let app = test_app().await;
    let first = app.login("alice").await;
    let second = app.login("alice").await;
    assert_ne!(first, second);

    let a = app.call(Method::GET, "/auth/me", Some(&first), None).await;
    let b = app.call(Method::GET, "/auth/me", Some(&second), None).await;
    assert_eq!(a.body["user"]["id"], b.body["user"]["id"]);
}

#[tokio::test]
async fn test_login_failures() {
    let app = test_app().await;

    let resp = app
        .call(Method::POST, "/auth/google", None, Some(json!({ "token": "forged" })))
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.body["code"], "INVALID_CREDENTIAL");

    let resp = app
        .call(Method::POST, "/auth/google", None, Some(json!({ "token": "keys-down" })))
        .await;
    assert_eq!(resp.status, StatusCode::SERVICE_UNAVAILABLE);

    let resp = app
        .call(Method::POST, "/auth/google", None, Some(json!({})))
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.body["error"], "No token provided");

    let resp = app
        .call(Method::POST, "/auth/firebase", None, Some(json!({ "token": "valid:a" })))
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);

    let resp = app
        .call(Method::POST, "/auth/github", None, Some(json!({ "token": "valid:a" })))
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);

    let resp = app
        .call(
            Method::POST,
            "/auth/google",
            None,
            Some(json!({ "token": "valid:a", "admin": true })),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.body["code"], "BAD_REQUEST");

    // Nothing was persisted for the failed attempts.
    let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&app.state.db_pool.reader)
        .await
        .unwrap();
    assert_eq!(users, 0);
}

#[tokio::test]
async fn test_me_without_session_is_401() {
    let app = test_app().await;
    let resp = app.call(Method::GET, "/auth/me", None, None).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.body["code"], "UNAUTHENTICATED");

    let resp = app.call(Method::GET, "/auth/me", Some("made-up"), None).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_ends_session() {
    let app = test_app().await;
    let token = app.login("alice").await;

    let resp = app.call(Method::POST, "/auth/logout", Some(&token), None).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["success"], true);
    assert!(set_cookie(&resp).contains("Max-Age=0"));

    let resp = app.call(Method::GET, "/auth/me", Some(&token), None).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);

    // Logging out without a session still succeeds.
    let resp = app.call(Method::POST, "/auth/logout", None, None).await;
    assert_eq!(resp.status, StatusCode::OK);
}

#[tokio::test]
async fn test_session_of_deleted_user() {
    let app = test_app().await;
    let token = app.login("alice").await;
    let other = app.login("alice").await;

    sqlx::query("DELETE FROM users")
        .execute(&app.state.db_pool.writer)
        .await
        .unwrap();

    let resp = app.call(Method::GET, "/auth/me", Some(&token), None).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.body["code"], "USER_NOT_FOUND");
    assert!(set_cookie(&resp).contains("Max-Age=0"));

    // The session was invalidated.
    let resp = app.call(Method::GET, "/auth/me", Some(&token), None).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);

    // Chat endpoints answer 401 for the same condition.
    let resp = app.call(Method::GET, "/chats", Some(&other), None).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Chats
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_chat_endpoints_require_session() {
    let app = test_app().await;
    for (method, uri) in [
        (Method::GET, "/chats"),
        (Method::POST, "/chats"),
        (Method::GET, "/chats/0190c5d2-0000-7000-8000-000000000000"),
        (Method::DELETE, "/chats/0190c5d2-0000-7000-8000-000000000000"),
    ] {
        let resp = app.call(method, uri, None, None).await;
        assert_eq!(resp.status, StatusCode::UNAUTHORIZED, "{uri}");
    }
}

#[tokio::test]
async fn test_example_turn() {
    let app = test_app().await;
    let token = app.login("alice").await;

    let resp = app.call(Method::POST, "/chats", Some(&token), None).await;
    assert_eq!(resp.status, StatusCode::CREATED);
    assert_eq!(resp.body["chat"]["title"], "New Chat");
    let id = resp.body["chat"]["id"].as_str().unwrap().to_string();

    let resp = app
        .call(
            Method::POST,
            &format!("/chats/{id}/messages"),
            Some(&token),
            Some(json!({ "message": "Explain recursion" })),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["user_message"]["role"], "user");
    assert_eq!(resp.body["user_message"]["content"], "Explain recursion");
    assert_eq!(resp.body["ai_message"]["role"], "model");
    assert_eq!(resp.body["ai_message"]["chat_id"], id.as_str());
    assert!(
        resp.body["ai_message"]["content"]
            .as_str()
            .unwrap()
            .starts_with("[Stub Response]")
    );

    let resp = app.call(Method::GET, &format!("/chats/{id}"), Some(&token), None).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["chat"]["title"], "Explain recursion");
    let roles: Vec<&str> = resp.body["chat"]["messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["role"].as_str().unwrap())
        .collect();
    assert_eq!(roles, vec!["user", "model"]);

    // A second turn keeps the derived title.
    app.call(
        Method::POST,
        &format!("/chats/{id}/messages"),
        Some(&token),
        Some(json!({ "message": "And tail recursion?" })),
    )
    .await;
    let resp = app.call(Method::GET, &format!("/chats/{id}"), Some(&token), None).await;
    assert_eq!(resp.body["chat"]["title"], "Explain recursion");
    assert_eq!(resp.body["chat"]["messages"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_long_first_message_truncates_title() {
    let app = test_app().await;
    let token = app.login("alice").await;
    let id = app.create_chat(&token).await;
    let message = "a".repeat(60);

    app.call(
        Method::POST,
        &format!("/chats/{id}/messages"),
        Some(&token),
        Some(json!({ "message": message })),
    )
    .await;

    let resp = app.call(Method::GET, &format!("/chats/{id}"), Some(&token), None).await;
    assert_eq!(
        resp.body["chat"]["title"].as_str().unwrap(),
        format!("{}...", "a".repeat(50))
    );
}

#[tokio::test]
async fn test_create_chat_with_title() {
    let app = test_app().await;
    let token = app.login("alice").await;

    let resp = app
        .call(Method::POST, "/chats", Some(&token), Some(json!({ "title": "Rust" })))
        .await;
    assert_eq!(resp.status, StatusCode::CREATED);
    assert_eq!(resp.body["chat"]["title"], "Rust");

    let resp = app.raw_json(Method::POST, "/chats", &token, "{not json").await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_empty_message_persists_nothing() {
    let app = test_app().await;
    let token = app.login("alice").await;
    let id = app.create_chat(&token).await;

    for message in ["", "   \n\t"] {
        let resp = app
            .call(
                Method::POST,
                &format!("/chats/{id}/messages"),
                Some(&token),
                Some(json!({ "message": message })),
            )
            .await;
        assert_eq!(resp.status, StatusCode::BAD_REQUEST);
        assert_eq!(resp.body["code"], "EMPTY_MESSAGE");
    }
    assert_eq!(app.message_count().await, 0);
}

#[tokio::test]
async fn test_send_message_body_validation() {
    let app = test_app().await;
    let token = app.login("alice").await;
    let id = app.create_chat(&token).await;
    let uri = format!("/chats/{id}/messages");

    let resp = app
        .call(Method::POST, &uri, Some(&token), Some(json!({ "text": "hi" })))
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);

    let resp = app.raw_json(Method::POST, &uri, &token, "not json").await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);

    let resp = app
        .call(
            Method::POST,
            &uri,
            Some(&token),
            Some(json!({ "message": "hi", "context": { "level": "beginner" } })),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(app.message_count().await, 2);
}

#[tokio::test]
async fn test_stub_replies_are_deterministic() {
    let app = test_app().await;
    let token = app.login("alice").await;

    let mut replies = Vec::new();
    for _ in 0..2 {
        let id = app.create_chat(&token).await;
        let resp = app
            .call(
                Method::POST,
                &format!("/chats/{id}/messages"),
                Some(&token),
                Some(json!({ "message": "What is a monad?" })),
            )
            .await;
        replies.push(resp.body["ai_message"]["content"].clone());
    }
    assert_eq!(replies[0], replies[1]);
}

#[tokio::test]
async fn test_foreign_chat_is_not_found() {
    let app = test_app().await;
    let alice = app.login("alice").await;
    let bob = app.login("bob").await;
    let id = app.create_chat(&alice).await;
    let uri = format!("/chats/{id}");

    let resp = app.call(Method::GET, &uri, Some(&bob), None).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.body["error"], "Chat not found");

    let resp = app
        .call(Method::PUT, &uri, Some(&bob), Some(json!({ "title": "mine" })))
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);

    let resp = app
        .call(
            Method::POST,
            &format!("{uri}/messages"),
            Some(&bob),
            Some(json!({ "message": "hi" })),
        )
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);

    let resp = app.call(Method::DELETE, &uri, Some(&bob), None).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);

    // Untouched for the owner.
    let resp = app.call(Method::GET, &uri, Some(&alice), None).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["chat"]["title"], "New Chat");
    assert_eq!(app.message_count().await, 0);

    let resp = app.call(Method::GET, "/chats", Some(&bob), None).await;
    assert_eq!(resp.body["chats"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_malformed_chat_id_is_not_found() {
    let app = test_app().await;
    let token = app.login("alice").await;
    let resp = app.call(Method::GET, "/chats/not-a-uuid", Some(&token), None).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_chat_title() {
    let app = test_app().await;
    let token = app.login("alice").await;
    let id = app.create_chat(&token).await;
    let uri = format!("/chats/{id}");

    let resp = app
        .call(Method::PUT, &uri, Some(&token), Some(json!({ "title": "  " })))
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);

    let resp = app
        .call(Method::PUT, &uri, Some(&token), Some(json!({ "title": "Recursion notes" })))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["chat"]["title"], "Recursion notes");

    // A renamed chat keeps its title after the first turn.
    app.call(
        Method::POST,
        &format!("{uri}/messages"),
        Some(&token),
        Some(json!({ "message": "Explain recursion" })),
    )
    .await;
    let resp = app.call(Method::GET, &uri, Some(&token), None).await;
    assert_eq!(resp.body["chat"]["title"], "Recursion notes");
}

#[tokio::test]
async fn test_list_chats_most_recent_first() {
    let app = test_app().await;
    let token = app.login("alice").await;
    let first = app.create_chat(&token).await;
    let second = app.create_chat(&token).await;

    app.call(
        Method::POST,
        &format!("/chats/{first}/messages"),
        Some(&token),
        Some(json!({ "message": "bump" })),
    )
    .await;

    let resp = app.call(Method::GET, "/chats", Some(&token), None).await;
    assert_eq!(resp.status, StatusCode::OK);
    let chats = resp.body["chats"].as_array().unwrap();
    assert_eq!(chats.len(), 2);
    assert_eq!(chats[0]["id"], first.as_str());
    assert_eq!(chats[0]["message_count"], 2);
    assert_eq!(chats[1]["id"], second.as_str());
    assert_eq!(chats[1]["message_count"], 0);
}

#[tokio::test]
async fn test_delete_chat_removes_messages() {
    let app = test_app().await;
    let token = app.login("alice").await;
    let id = app.create_chat(&token).await;
    let uri = format!("/chats/{id}");

    app.call(
        Method::POST,
        &format!("{uri}/messages"),
        Some(&token),
        Some(json!({ "message": "hello" })),
    )
    .await;
    assert_eq!(app.message_count().await, 2);

    let resp = app.call(Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["success"], true);
    assert_eq!(app.message_count().await, 0);

    let resp = app.call(Method::GET, &uri, Some(&token), None).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    let resp = app.call(Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_turn_completes_after_client_disconnects() {
    let started = Arc::new(Notify::new());
    let generation = GenerationClient::new(
        BoxLlmProvider::new(SlowProvider {
            started: started.clone(),
        }),
        Duration::from_secs(5),
    );
    let app = test_app_with(generation).await;
    let token = app.login("alice").await;
    let id = app.create_chat(&token).await;

    let request = Request::builder()
        .method(Method::POST)
        .uri(format!("/chats/{id}/messages"))
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "message": "Explain recursion" }).to_string()))
        .unwrap();

    // The client goes away once generation is under way.
    let pending = app.router.clone().oneshot(request);
    tokio::select! {
        _ = pending => panic!("turn answered before generation started"),
        _ = started.notified() => {}
    }

    app.state.turns.close();
    app.state.turns.wait().await;

    let roles: Vec<String> =
        sqlx::query_scalar("SELECT role FROM messages ORDER BY created_at ASC, id ASC")
            .fetch_all(&app.state.db_pool.reader)
            .await
            .unwrap();
    assert_eq!(roles, vec!["user", "model"]);

    let resp = app.call(Method::GET, &format!("/chats/{id}"), Some(&token), None).await;
    assert_eq!(resp.body["chat"]["title"], "Explain recursion");
    assert_eq!(
        resp.body["chat"]["messages"][1]["content"],
        "slow reply to Explain recursion"
    );
}

#[tokio::test]
async fn test_assemble_rejects_out_of_range_session_lifetime() {
    for hours in [0, u32::MAX] {
        let (pool, _dir) = test_pool().await;
        let result = AppState::assemble(
            pool,
            VerifierRegistry::new(),
            GenerationClient::stub(),
            &SecretString::from("test-session-secret".to_string()),
            hours,
            false,
        );
        assert!(result.is_err(), "{hours} accepted");
    }
}
