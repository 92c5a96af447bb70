use thiserror::Error;

/// Errors from repository operations (used by trait definitions in palaver-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors from identity token verification.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Malformed, expired, wrongly signed, or wrong issuer/audience.
    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    /// The provider's signing keys could not be fetched.
    #[error("identity provider keys unavailable: {0}")]
    KeysUnavailable(String),

    #[error("identity provider '{0}' is not configured")]
    ProviderDisabled(String),
}

/// Errors from login and request identity resolution.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No valid session accompanies the request.
    #[error("not authenticated")]
    Unauthenticated,

    /// The session pointed at a user that no longer exists. The session has
    /// been invalidated.
    #[error("user not found")]
    UserGone,

    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    #[error("identity provider keys unavailable: {0}")]
    KeysUnavailable(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("storage error: {0}")]
    Storage(#[from] RepositoryError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<IdentityError> for AuthError {
    fn from(e: IdentityError) -> Self {
        match e {
            IdentityError::InvalidCredential(msg) => AuthError::InvalidCredential(msg),
            IdentityError::KeysUnavailable(msg) => AuthError::KeysUnavailable(msg),
            IdentityError::ProviderDisabled(provider) => {
                AuthError::BadRequest(format!("identity provider '{provider}' is not configured"))
            }
        }
    }
}

/// Errors from chat operations.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,

    /// Used uniformly for "does not exist" and "not owned by the caller".
    #[error("chat not found")]
    NotFound,

    #[error("{0}")]
    BadRequest(String),

    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl From<RepositoryError> for ChatError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => ChatError::NotFound,
            other => ChatError::StorageUnavailable(other.to_string()),
        }
    }
}
