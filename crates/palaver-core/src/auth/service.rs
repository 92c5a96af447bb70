//! Authentication service: login, session resolution, and logout.

use chrono::Duration;
use palaver_types::error::{AuthError, IdentityError, RepositoryError};
use palaver_types::identity::{IdentityProviderKind, VerifiedIdentity};
use palaver_types::session::Session;
use palaver_types::time;
use palaver_types::user::{User, UserId};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::auth::token::SessionTokens;
use crate::identity::registry::VerifierRegistry;
use crate::repository::session::SessionRepository;
use crate::repository::user::UserRepository;

/// A successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: User,
    /// Plaintext session token, returned to the client exactly once.
    pub session_token: String,
    pub session: Session,
}

/// Service owning the single identity strategy: verified provider token at
/// login, opaque server-side session afterwards.
///
/// Generic over the repository and token traits to maintain clean
/// architecture -- palaver-core never depends on palaver-infra.
pub struct AuthService<U: UserRepository, S: SessionRepository, T: SessionTokens> {
    users: U,
    sessions: S,
    tokens: T,
    verifiers: VerifierRegistry,
    session_ttl: Duration,
}

impl<U: UserRepository, S: SessionRepository, T: SessionTokens> AuthService<U, S, T> {
    pub fn new(
        users: U,
        sessions: S,
        tokens: T,
        verifiers: VerifierRegistry,
        session_ttl: Duration,
    ) -> Self {
        Self {
            users,
            sessions,
            tokens,
            verifiers,
            session_ttl,
        }
    }

    /// Whether logins through `provider` are configured.
    pub fn provider_enabled(&self, provider: IdentityProviderKind) -> bool {
        self.verifiers.is_enabled(provider)
    }

    /// Verify a provider token, find or create the user, and open a session.
    ///
    /// `provider` is the raw path segment (e.g. "google"). Verification
    /// failures surface as `InvalidCredential`; nothing is persisted for them.
    pub async fn login(&self, provider: &str, token: &str) -> Result<LoginOutcome, AuthError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::BadRequest("No token provided".to_string()));
        }

        let kind: IdentityProviderKind = provider.parse().map_err(AuthError::BadRequest)?;
        let verifier = self
            .verifiers
            .get(kind)
            .ok_or_else(|| IdentityError::ProviderDisabled(kind.to_string()))?;

        let identity = verifier.verify(token).await.inspect_err(|e| {
            debug!(provider = %kind, error = %e, "identity token rejected");
        })?;

        let now = time::now();
        let expires_at = now.checked_add_signed(self.session_ttl).ok_or_else(|| {
            AuthError::Internal(format!(
                "session lifetime of {}h is out of range",
                self.session_ttl.num_hours()
            ))
        })?;

        let user = self.find_or_create_user(identity).await?;

        let session_token = self.tokens.generate();
        let session = Session {
            id: Uuid::now_v7(),
            token_hash: self.tokens.hash(&session_token),
            user_id: user.id,
            created_at: now,
            expires_at,
        };
        self.sessions.create_session(&session).await?;

        info!(user_id = %user.id, provider = %kind, session_id = %session.id, "User logged in");

        Ok(LoginOutcome {
            user,
            session_token,
            session,
        })
    }

    /// Resolve a session token to its user.
    ///
    /// - Unknown or expired token: `Unauthenticated` (expired rows are deleted).
    /// - Session whose user no longer exists: the session is deleted and
    ///   `UserGone` is returned.
    pub async fn resolve(&self, session_token: &str) -> Result<User, AuthError> {
        let hash = self.tokens.hash(session_token);
        let session = self
            .sessions
            .find_by_token_hash(&hash)
            .await?
            .ok_or(AuthError::Unauthenticated)?;

        if session.is_expired(time::now()) {
            debug!(session_id = %session.id, "Session expired");
            self.sessions.delete_session(&session.id).await?;
            return Err(AuthError::Unauthenticated);
        }

        match self.users.get_user(&session.user_id).await? {
            Some(user) => Ok(user),
            None => {
                warn!(
                    session_id = %session.id,
                    user_id = %session.user_id,
                    "Session references a missing user, invalidating"
                );
                self.sessions.delete_session(&session.id).await?;
                Err(AuthError::UserGone)
            }
        }
    }

    /// End the session identified by `session_token`, if any.
    pub async fn logout(&self, session_token: Option<&str>) -> Result<(), AuthError> {
        let Some(token) = session_token else {
            return Ok(());
        };

        let hash = self.tokens.hash(token);
        if let Some(session) = self.sessions.find_by_token_hash(&hash).await? {
            self.sessions.delete_session(&session.id).await?;
            info!(session_id = %session.id, user_id = %session.user_id, "User logged out");
        }
        Ok(())
    }

    async fn find_or_create_user(&self, identity: VerifiedIdentity) -> Result<User, AuthError> {
        if let Some(user) = self.users.find_by_external_id(&identity.external_id).await? {
            return Ok(user);
        }

        let user = User {
            id: UserId::new(),
            external_id: identity.external_id,
            email: identity.email,
            display_name: identity.display_name,
            avatar_url: identity.avatar_url,
            created_at: time::now(),
        };

        match self.users.create_user(&user).await {
            Ok(created) => {
                info!(user_id = %created.id, "User created on first login");
                Ok(created)
            }
            // A concurrent first login won the insert; use its row.
            Err(RepositoryError::Conflict(_)) => self
                .users
                .find_by_external_id(&user.external_id)
                .await?
                .ok_or(AuthError::Storage(RepositoryError::NotFound)),
            Err(e) => Err(e.into()),
        }
    }
}
