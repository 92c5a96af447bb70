//! Server configuration types for Palaver.
//!
//! `ServerConfig` is assembled once at process start (from CLI flags and
//! environment variables) and handed to the service constructors. Optional
//! provider settings switch features on: an absent Gemini key selects stub
//! generation, an absent client/project id disables that identity provider.

use secrecy::SecretString;

/// Fallback database used for local development when `DATABASE_URL` is unset.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://./dev.db?mode=rwc";

/// Session signing secret used when none is configured. Never use in production.
pub const DEV_SESSION_SECRET: &str = "dev-secret-key";

/// Longest accepted session lifetime (ten years).
pub const MAX_SESSION_TTL_HOURS: u32 = 87_600;

/// Default Gemini model.
pub const DEFAULT_MODEL_NAME: &str = "gemini-1.5-flash";

/// Top-level configuration for the Palaver server.
#[derive(Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// sqlx connection URL for the SQLite store.
    pub database_url: String,
    /// Key for hashing session tokens before they are stored.
    pub session_secret: SecretString,
    /// Session lifetime, `1..=MAX_SESSION_TTL_HOURS`.
    pub session_ttl_hours: u32,
    pub identity: IdentityConfig,
    pub generation: GenerationConfig,
    /// Allowed CORS origins; empty means any origin.
    pub cors_origins: Vec<String>,
    /// Mark the session cookie `Secure`.
    pub secure_cookies: bool,
}

/// Identity provider settings.
#[derive(Debug, Clone, Default)]
pub struct IdentityConfig {
    /// Google OAuth client id (the expected `aud` of Google ID tokens).
    pub google_client_id: Option<String>,
    /// Firebase project id (the expected `aud` of Firebase ID tokens).
    pub firebase_project_id: Option<String>,
}

/// Text-generation provider settings.
#[derive(Debug)]
pub struct GenerationConfig {
    pub api_key: Option<SecretString>,
    pub model_name: String,
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model_name: DEFAULT_MODEL_NAME.to_string(),
            timeout_secs: 60,
        }
    }
}

impl GenerationConfig {
    /// Whether a real provider credential is configured.
    pub fn provider_enabled(&self) -> bool {
        self.api_key.is_some()
    }
}
