//! Application state wiring all services together.
//!
//! Services are generic over repository and token traits; AppState pins
//! them to the concrete infra implementations.

use std::sync::Arc;

use anyhow::{Context, anyhow, bail};
use secrecy::{ExposeSecret, SecretString};
use tokio_util::task::TaskTracker;

use palaver_core::auth::service::AuthService;
use palaver_core::chat::service::ChatService;
use palaver_core::identity::registry::VerifierRegistry;
use palaver_core::llm::generation::GenerationClient;
use palaver_infra::crypto::session_token::HmacSessionTokens;
use palaver_infra::identity::verifier_registry;
use palaver_infra::llm::generation_client;
use palaver_infra::sqlite::chat::SqliteChatRepository;
use palaver_infra::sqlite::pool::DatabasePool;
use palaver_infra::sqlite::session::SqliteSessionRepository;
use palaver_infra::sqlite::user::SqliteUserRepository;
use palaver_types::config::{
    DEFAULT_DATABASE_URL, DEV_SESSION_SECRET, MAX_SESSION_TTL_HOURS, ServerConfig,
};

use crate::http::cookie::CookieSettings;

/// Concrete type aliases for the service generics pinned to infra implementations.
pub type ConcreteAuthService =
    AuthService<SqliteUserRepository, SqliteSessionRepository, HmacSessionTokens>;

pub type ConcreteChatService = ChatService<SqliteChatRepository>;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<ConcreteAuthService>,
    pub chat_service: Arc<ConcreteChatService>,
    pub db_pool: DatabasePool,
    pub cookies: CookieSettings,
    /// Detached chat turns; drained on shutdown before the pool closes.
    pub turns: TaskTracker,
}

impl AppState {
    /// Connect to the database and wire services from `config`.
    pub async fn init(config: &ServerConfig) -> anyhow::Result<Self> {
        if config.database_url == DEFAULT_DATABASE_URL {
            tracing::warn!(
                url = DEFAULT_DATABASE_URL,
                "DATABASE_URL not set, using local development database"
            );
        }
        if config.session_secret.expose_secret() == DEV_SESSION_SECRET {
            tracing::warn!("SESSION_SECRET not set, using the development secret");
        }

        let db_pool = DatabasePool::new(&config.database_url)
            .await
            .context("failed to open database")?;

        let generation = generation_client(&config.generation);
        tracing::info!(
            provider = generation.provider_name(),
            "text generation configured"
        );

        Self::assemble(
            db_pool,
            verifier_registry(&config.identity),
            generation,
            &config.session_secret,
            config.session_ttl_hours,
            config.secure_cookies,
        )
    }

    /// Wire services over an open pool.
    pub fn assemble(
        db_pool: DatabasePool,
        verifiers: VerifierRegistry,
        generation: GenerationClient,
        session_secret: &SecretString,
        session_ttl_hours: u32,
        secure_cookies: bool,
    ) -> anyhow::Result<Self> {
        if !(1..=MAX_SESSION_TTL_HOURS).contains(&session_ttl_hours) {
            bail!(
                "session lifetime must be between 1 and {MAX_SESSION_TTL_HOURS} hours, got {session_ttl_hours}"
            );
        }

        let tokens = HmacSessionTokens::new(session_secret.expose_secret().as_bytes())
            .map_err(|_| anyhow!("session secret is not a usable HMAC key"))?;
        let session_ttl = chrono::Duration::hours(i64::from(session_ttl_hours));

        let auth_service = AuthService::new(
            SqliteUserRepository::new(db_pool.clone()),
            SqliteSessionRepository::new(db_pool.clone()),
            tokens,
            verifiers,
            session_ttl,
        );
        let chat_service = ChatService::new(SqliteChatRepository::new(db_pool.clone()), generation);

        Ok(Self {
            auth_service: Arc::new(auth_service),
            chat_service: Arc::new(chat_service),
            db_pool,
            cookies: CookieSettings {
                secure: secure_cookies,
                max_age_secs: session_ttl.num_seconds(),
            },
            turns: TaskTracker::new(),
        })
    }
}
