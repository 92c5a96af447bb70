//! `palaver serve`: configure and run the REST API server.

use std::time::Duration;

use clap::Args;
use secrecy::SecretString;

use palaver_infra::sqlite::session::SqliteSessionRepository;
use palaver_types::config::{
    DEFAULT_DATABASE_URL, DEFAULT_MODEL_NAME, DEV_SESSION_SECRET, GenerationConfig,
    IdentityConfig, MAX_SESSION_TTL_HOURS, ServerConfig,
};

use crate::http::router::{build_router, cors_layer};
use crate::state::AppState;

const PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Interface to bind.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, short, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// sqlx SQLite connection URL.
    #[arg(long, env = "DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
    pub database_url: String,

    /// Key for hashing session tokens at rest.
    #[arg(long, env = "SESSION_SECRET", default_value = DEV_SESSION_SECRET, hide_env_values = true, hide_default_value = true)]
    pub session_secret: String,

    /// Session lifetime in hours (at most ten years).
    #[arg(
        long,
        env = "SESSION_TTL_HOURS",
        default_value_t = 168,
        value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_SESSION_TTL_HOURS))
    )]
    pub session_ttl_hours: u32,

    /// Google OAuth client id. Google login is disabled without it.
    #[arg(long, env = "GOOGLE_OAUTH_CLIENT_ID")]
    pub google_client_id: Option<String>,

    /// Firebase project id. Firebase login is disabled without it.
    #[arg(long, env = "FIREBASE_PROJECT_ID")]
    pub firebase_project_id: Option<String>,

    /// Gemini API key. Replies come from the offline stub without it.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    /// Gemini model name.
    #[arg(long, env = "MODEL_NAME", default_value = DEFAULT_MODEL_NAME)]
    pub model_name: String,

    /// Upper bound on one generation call.
    #[arg(long, env = "GENERATION_TIMEOUT_SECS", default_value_t = 60)]
    pub generation_timeout_secs: u64,

    /// Comma-separated allowed origins. Any origin when unset.
    #[arg(long, env = "CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Vec<String>,

    /// Mark the session cookie `Secure`.
    #[arg(long, env = "SECURE_COOKIES")]
    pub secure_cookies: bool,
}

impl ServeArgs {
    /// Build the server configuration. Blank optional values count as unset.
    pub fn into_config(self) -> ServerConfig {
        ServerConfig {
            host: self.host,
            port: self.port,
            database_url: self.database_url,
            session_secret: SecretString::from(self.session_secret),
            session_ttl_hours: self.session_ttl_hours,
            identity: IdentityConfig {
                google_client_id: non_blank(self.google_client_id),
                firebase_project_id: non_blank(self.firebase_project_id),
            },
            generation: GenerationConfig {
                api_key: non_blank(self.gemini_api_key).map(SecretString::from),
                model_name: self.model_name,
                timeout_secs: self.generation_timeout_secs,
            },
            cors_origins: self
                .cors_origins
                .into_iter()
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect(),
            secure_cookies: self.secure_cookies,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Run the server until Ctrl+C or SIGTERM.
pub async fn run(args: ServeArgs) -> anyhow::Result<()> {
    let config = args.into_config();
    let state = AppState::init(&config).await?;

    let purge = tokio::spawn(purge_sessions(SqliteSessionRepository::new(
        state.db_pool.clone(),
    )));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    println!();
    println!(
        "  {} Palaver API listening on {}",
        console::style("⚡").bold(),
        console::style(format!("http://{addr}")).cyan()
    );
    println!(
        "  {} generation: {}   google: {}   firebase: {}",
        console::style("·").dim(),
        state.chat_service.generation().provider_name(),
        enabled_label(config.identity.google_client_id.is_some()),
        enabled_label(config.identity.firebase_project_id.is_some()),
    );
    println!("  {}", console::style("Press Ctrl+C to stop").dim());

    let db_pool = state.db_pool.clone();
    let turns = state.turns.clone();
    let router = build_router(state, cors_layer(&config.cors_origins));

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    purge.abort();

    turns.close();
    if !turns.is_empty() {
        tracing::info!(pending = turns.len(), "waiting for in-flight chat turns");
    }
    turns.wait().await;

    db_pool.close().await;
    println!("\n  Server stopped.");
    Ok(())
}

fn enabled_label(enabled: bool) -> console::StyledObject<&'static str> {
    if enabled {
        console::style("on").green()
    } else {
        console::style("off").dim()
    }
}

/// Hourly removal of expired sessions.
async fn purge_sessions(sessions: SqliteSessionRepository) {
    let mut interval = tokio::time::interval(PURGE_INTERVAL);
    loop {
        interval.tick().await;
        match sessions.purge_expired().await {
            Ok(0) => {}
            Ok(purged) => tracing::info!(purged, "purged expired sessions"),
            Err(e) => tracing::warn!(error = %e, "failed to purge expired sessions"),
        }
    }
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
